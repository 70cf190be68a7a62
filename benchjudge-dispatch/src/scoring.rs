//! Score extraction from judge replies and exact-match answers
//!
//! Both paths look for a `[[...]]` group. The group is greedy: it runs from
//! the first `[[` on a line to the last `]]` on that line, so
//! `[[3]] and [[5]]` yields the inner text `3]] and [[5`.
//!
//! Digits are Unicode decimal digits, so a full-width `[[８]]` scores 8.

use regex::Regex;
use std::sync::OnceLock;

/// Code point of the zero in each supported run of ten decimal digits.
const DIGIT_ZEROS: [u32; 27] = [
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0xFF10,
    0x1D7CE, 0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6,
];

fn bracket_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[(.+)\]\]").expect("valid bracket regex"))
}

fn digits_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid digits regex"))
}

/// Inner text of the greedy bracket group, if any.
pub fn bracket_group(text: &str) -> Option<&str> {
    bracket_regex().captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

fn first_digit_run(text: &str) -> Option<&str> {
    digits_regex().find(text).map(|m| m.as_str())
}

fn decimal_value(c: char) -> Option<u32> {
    let code = u32::from(c);
    DIGIT_ZEROS.iter().find_map(|&zero| code.checked_sub(zero).filter(|v| *v < 10))
}

/// `digits` rewritten with ASCII digits, or `None` if any char is not a
/// supported decimal digit.
pub fn normalize_digits(digits: &str) -> Option<String> {
    digits.chars().map(|c| decimal_value(c).and_then(|d| char::from_digit(d, 10))).collect()
}

fn parse_digits(digits: &str) -> Option<i64> {
    normalize_digits(digits)?.parse::<i64>().ok()
}

/// Point awarded by a judge reply.
///
/// The first digit run inside the bracket group wins. When that yields 0 (or
/// nothing) and the whole reply is digits, the reply itself is the point.
/// Anything else scores 0; a malformed reply is never an error.
pub fn extract_judge_point(reply: &str) -> i64 {
    let point = bracket_group(reply).and_then(first_digit_run).and_then(parse_digits).unwrap_or(0);

    if point == 0 && !reply.is_empty() && reply.chars().all(|c| decimal_value(c).is_some()) {
        return parse_digits(reply).unwrap_or(0);
    }
    point
}

/// Value an exact-match answer commits to: the first digit run inside its
/// bracket group in ASCII digits, without leading zeros. `None` when there is
/// no such value.
pub fn exact_match_value(text: &str) -> Option<String> {
    let digits = bracket_group(text).and_then(first_digit_run).and_then(normalize_digits)?;
    let trimmed = digits.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() })
}

/// 1 when the extracted value equals `expected` as a string, else 0.
///
/// An answer without a value compares as the string `null`.
pub fn exact_match_point(text: &str, expected: Option<&str>) -> i64 {
    let Some(expected) = expected else {
        return 0;
    };
    let value = exact_match_value(text);
    i64::from(value.as_deref().unwrap_or("null") == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_judge_point_from_brackets() {
        assert_eq!(extract_judge_point("評価: 良い [[8]]"), 8);
        assert_eq!(extract_judge_point("[[score: 6 / 10]]"), 6);
        assert_eq!(extract_judge_point("[[10]]"), 10);
    }

    #[test]
    fn test_judge_point_is_greedy() {
        assert_eq!(extract_judge_point("[[3]] then [[5]]"), 3);
        assert_eq!(bracket_group("[[3]] then [[5]]"), Some("3]] then [[5"));
    }

    #[test]
    fn test_judge_point_numeric_fallback() {
        assert_eq!(extract_judge_point("7"), 7);
        assert_eq!(extract_judge_point("[[0]]"), 0);
        assert_eq!(extract_judge_point("no brackets 7"), 0);
        assert_eq!(extract_judge_point(" 7"), 0);
        assert_eq!(extract_judge_point(""), 0);
    }

    #[test]
    fn test_judge_point_malformed() {
        assert_eq!(extract_judge_point("[[excellent]]"), 0);
        assert_eq!(extract_judge_point("[8]"), 0);
        assert_eq!(extract_judge_point("[[\n8]]"), 0);
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(exact_match_value("答えは [[12]] です"), Some("12".to_string()));
        assert_eq!(exact_match_value("[[007]]"), Some("7".to_string()));
        assert_eq!(exact_match_value("[[none]]"), None);
        assert_eq!(exact_match_value("12"), None);

        assert_eq!(exact_match_point("[[12]]", Some("12")), 1);
        assert_eq!(exact_match_point("[[13]]", Some("12")), 0);
        assert_eq!(exact_match_point("[[12]]", None), 0);
        assert_eq!(exact_match_point("no answer", Some("12")), 0);
        assert_eq!(exact_match_point("no answer", Some("null")), 1);
    }

    #[test]
    fn test_full_width_digits() {
        assert_eq!(extract_judge_point("評価: [[８]]"), 8);
        assert_eq!(extract_judge_point("[[１０]]"), 10);
        assert_eq!(extract_judge_point("７"), 7);
        assert_eq!(extract_judge_point("[[０]]"), 0);

        assert_eq!(exact_match_value("答えは [[０１２]]"), Some("12".to_string()));
        assert_eq!(exact_match_point("答えは [[１２]]", Some("12")), 1);
    }

    #[test]
    fn test_other_decimal_scripts() {
        assert_eq!(normalize_digits("٣٤"), Some("34".to_string()));
        assert_eq!(extract_judge_point("[[५]]"), 5);
        assert_eq!(normalize_digits("3a"), None);
        assert_eq!(normalize_digits("²"), None);
    }

    fn full_width(n: u64) -> String {
        n.to_string()
            .chars()
            .map(|c| char::from_u32(u32::from(c) - 0x30 + 0xFF10).unwrap())
            .collect()
    }

    proptest! {
        #[test]
        fn prop_full_width_bracketed_number_is_extracted(n in 1u64..1_000_000) {
            let reply = format!("評価: [[{}]]", full_width(n));
            prop_assert_eq!(extract_judge_point(&reply), n as i64);
            prop_assert_eq!(extract_judge_point(&full_width(n)), n as i64);
            let expected = n.to_string();
            prop_assert_eq!(exact_match_point(&reply, Some(expected.as_str())), 1);
        }

        #[test]
        fn prop_bracketed_number_is_extracted(n in 1i64..1_000_000, prefix in "[a-z ]{0,20}") {
            let reply = format!("{prefix}[[{n}]]");
            prop_assert_eq!(extract_judge_point(&reply), n);
        }

        #[test]
        fn prop_point_is_never_negative(reply in "\\PC{0,64}") {
            prop_assert!(extract_judge_point(&reply) >= 0);
        }

        #[test]
        fn prop_exact_match_accepts_own_value(n in 0u32..100_000) {
            let expected = n.to_string();
            let answer = format!("answer: [[{n}]]");
            prop_assert_eq!(exact_match_point(&answer, Some(&expected)), 1);
        }
    }
}
