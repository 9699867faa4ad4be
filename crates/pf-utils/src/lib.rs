//! Shared text heuristics and error types for Promptfolio.

use thiserror::Error;

/// Result type for shared helpers.
pub type UtilsResult<T> = Result<T, UtilsError>;

/// Shared error variants for cross-crate helpers.
#[derive(Debug, Error)]
pub enum UtilsError {
    /// A parsing error occurred.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Find the first run of exactly `len` ASCII digits, bounded by non-digits.
pub fn find_digit_run(input: &str, len: usize) -> Option<&str> {
    let bytes = input.as_bytes();
    let mut start = None;
    for (index, byte) in bytes.iter().enumerate() {
        match (byte.is_ascii_digit(), start) {
            (true, None) => start = Some(index),
            (false, Some(begin)) => {
                if index - begin == len {
                    return Some(&input[begin..index]);
                }
                start = None;
            }
            _ => {}
        }
    }
    match start {
        Some(begin) if bytes.len() - begin == len => Some(&input[begin..]),
        _ => None,
    }
}

/// Parse the first run of exactly `len` digits as a number.
pub fn parse_digit_run(input: &str, len: usize) -> UtilsResult<u64> {
    let run = find_digit_run(input, len)
        .ok_or_else(|| UtilsError::Parse(format!("no {len}-digit run in {input}")))?;
    run.parse()
        .map_err(|err: std::num::ParseIntError| UtilsError::Parse(err.to_string()))
}

/// Whether the character is a hiragana, katakana, or CJK ideograph.
pub fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{3040}'..='\u{309F}'
        | '\u{30A0}'..='\u{30FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF66}'..='\u{FF9F}')
}

/// Whether the text contains at least one CJK character.
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// Whether the text contains two consecutive spaces, the usual mark of indentation.
pub fn contains_double_space(text: &str) -> bool {
    text.contains("  ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_run_requires_exact_length() {
        assert_eq!(
            find_digit_run("generated_image_1750667345592.jpg", 13),
            Some("1750667345592")
        );
        assert_eq!(find_digit_run("imagen_3_0_generate_002_1750744873728", 13), Some("1750744873728"));
        assert_eq!(find_digit_run("img_17506673455921.jpg", 13), None);
        assert_eq!(find_digit_run("img_123.jpg", 13), None);
    }

    #[test]
    fn digit_run_parses_value() {
        assert_eq!(parse_digit_run("1750667345592", 13).unwrap(), 1_750_667_345_592);
        assert!(matches!(parse_digit_run("none", 13), Err(UtilsError::Parse(_))));
    }

    #[test]
    fn cjk_detection_covers_kana_and_ideographs() {
        assert!(contains_cjk("ひらがな"));
        assert!(contains_cjk("カタカナ"));
        assert!(contains_cjk("漢字"));
        assert!(!contains_cjk("plain ascii text"));
    }

    #[test]
    fn double_space_detection() {
        assert!(contains_double_space("key:\n  value"));
        assert!(!contains_double_space("one space only"));
    }
}
