use benchjudge_model::{PLACEHOLDER_CREDENTIAL, ProviderTag, wire_model};
use std::collections::HashMap;
use std::time::Duration;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> =
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_prefix_routing() {
    assert_eq!(ProviderTag::from_model("gpt-4o-mini"), ProviderTag::OpenAi);
    assert_eq!(ProviderTag::from_model("gemini/gemini-1.5-pro"), ProviderTag::Gemini);
    assert_eq!(ProviderTag::from_model("claude-3-5-sonnet"), ProviderTag::Anthropic);
    assert_eq!(ProviderTag::from_model("command-r-plus"), ProviderTag::Cohere);
    assert_eq!(ProviderTag::from_model("llm-jp/llm-jp-13b"), ProviderTag::SelfHosted);
    assert_eq!(ProviderTag::from_model(""), ProviderTag::SelfHosted);
}

#[test]
fn test_credentials_by_provider() {
    let lookup = env(&[
        ("OPENAI_API_KEY", "sk-openai"),
        ("GEMINI_API_KEY", "g-key"),
        ("ANTHROPIC_API_KEY", "a-key"),
        ("COHERE_API_KEY", "c-key"),
    ]);

    let credential = |model: &str| ProviderTag::from_model(model).policy().credential_with(&lookup);
    assert_eq!(credential("gpt-4o").as_deref(), Some("sk-openai"));
    assert_eq!(credential("gemini-pro").as_deref(), Some("g-key"));
    assert_eq!(credential("claude-3-opus").as_deref(), Some("a-key"));
    assert_eq!(credential("command-r").as_deref(), Some("c-key"));
    assert_eq!(credential("local/qwen").as_deref(), Some(PLACEHOLDER_CREDENTIAL));
}

#[test]
fn test_unset_credential_is_none() {
    let lookup = env(&[]);
    assert_eq!(ProviderTag::OpenAi.policy().credential_with(&lookup), None);
    assert_eq!(
        ProviderTag::SelfHosted.policy().credential_with(&lookup).as_deref(),
        Some("EMPTY")
    );
}

#[test]
fn test_cooldowns() {
    let cooldown = |model: &str| ProviderTag::from_model(model).policy().cooldown_for(model);
    assert_eq!(cooldown("gpt-4o"), Duration::ZERO);
    assert_eq!(cooldown("gemini/gemini-2.0-flash"), Duration::from_secs(10));
    assert_eq!(cooldown("gemini/gemini-1.5-pro"), Duration::from_secs(25));
    assert_eq!(cooldown("claude-3-haiku"), Duration::from_secs(10));
    assert_eq!(cooldown("command-r"), Duration::from_secs(5));
    assert_eq!(cooldown("my-model"), Duration::ZERO);
}

#[test]
fn test_only_gemini_relaxes_safety() {
    for tag in ProviderTag::all() {
        let settings = tag.policy().safety_settings();
        if tag == ProviderTag::Gemini {
            let settings = settings.expect("gemini carries safety settings");
            assert_eq!(settings.len(), 4);
            assert!(settings.iter().all(|s| s.threshold == "BLOCK_NONE"));
        } else {
            assert!(settings.is_none(), "{tag} should not carry safety settings");
        }
    }
}

#[test]
fn test_wire_model_strips_known_prefix_only() {
    assert_eq!(wire_model("gemini/gemini-1.5-pro"), "gemini-1.5-pro");
    assert_eq!(wire_model("gpt-4o"), "gpt-4o");
    assert_eq!(wire_model("llm-jp/llm-jp-13b"), "llm-jp/llm-jp-13b");
    assert_eq!(wire_model("gemini/"), "gemini/");
}

#[test]
fn test_default_base_urls() {
    assert_eq!(ProviderTag::SelfHosted.policy().default_base_url, "http://localhost:8000/v1");
    assert!(ProviderTag::OpenAi.policy().default_base_url.starts_with("https://"));
}
