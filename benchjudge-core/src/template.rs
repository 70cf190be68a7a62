use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Matches `{{`, `}}` or a `{identifier}` placeholder, in that priority.
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid regex pattern")
    })
}

/// Renders a benchmark prompt template.
///
/// Supported syntax:
/// - `{name}` - replaced by `vars["name"]`; kept literally if `name` is not supplied
/// - `{{` / `}}` - literal braces
///
/// Any other brace is copied through unchanged.
///
/// # Examples
///
/// ```
/// use benchjudge_core::render_template;
/// use std::collections::HashMap;
///
/// let vars = HashMap::from([("question", "1+1?"), ("answer", "2")]);
/// let out = render_template("Q: {question} A: {answer} {{json}}", &vars);
/// assert_eq!(out, "Q: 1+1? A: 2 {json}");
/// ```
pub fn render_template(template: &str, vars: &HashMap<&str, &str>) -> String {
    let regex = get_placeholder_regex();
    let mut result = String::with_capacity(template.len());
    let mut last_end = 0;

    for captures in regex.captures_iter(template) {
        let whole = captures.get(0).expect("capture group 0 always exists");
        result.push_str(&template[last_end..whole.start()]);

        match whole.as_str() {
            "{{" => result.push('{'),
            "}}" => result.push('}'),
            literal => {
                let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
                match vars.get(name) {
                    Some(value) => result.push_str(value),
                    None => result.push_str(literal),
                }
            }
        }

        last_end = whole.end();
    }

    result.push_str(&template[last_end..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_regex_prefers_escapes() {
        let regex = get_placeholder_regex();
        let found: Vec<_> = regex.find_iter("{{x}}").map(|m| m.as_str()).collect();
        assert_eq!(found, vec!["{{", "}}"]);
    }

    #[test]
    fn test_non_identifier_braces_untouched() {
        let vars = HashMap::new();
        assert_eq!(render_template("{1abc} { spaced }", &vars), "{1abc} { spaced }");
    }
}
