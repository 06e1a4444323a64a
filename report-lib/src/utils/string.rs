use regex::Regex;
use std::sync::LazyLock;

static ILLEGAL_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/:*?"<>|+\\\s]"#).expect("valid file name pattern"));

/// Replace control characters with spaces and collapse runs of whitespace.
///
/// Used to compare sheet labels that were typed with stray line breaks.
pub fn collapse_whitespace(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Short heading title for the table of contents.
///
/// Only the first line is kept, cut before a full-width opening parenthesis.
/// ASCII parentheses are preserved.
pub fn toc_title(name: &str) -> String {
    let first_line = name.split('\n').next().unwrap_or_default();
    let before_paren = first_line.split('（').next().unwrap_or_default();
    return before_paren.trim().to_string();
}

/// Remove every occurrence of each phrase, then trim.
pub fn strip_phrases(text: &str, phrases: &[String]) -> String {
    let mut stripped = text.to_string();
    for phrase in phrases {
        stripped = stripped.replace(phrase.as_str(), "").trim().to_string();
    }
    stripped
}

/// Drop legal-form suffixes from a manufacturer name.
pub fn simplify_company_name(name: &str, suffixes: &[String]) -> String {
    let mut simplified = name.to_string();
    for suffix in suffixes {
        simplified = simplified.replace(suffix.as_str(), "");
    }
    simplified
}

/// Replace characters that are not allowed in file names with '-'.
pub fn sanitize_file_name(name: &str) -> String {
    ILLEGAL_FILE_CHARS.replace_all(name, "-").into_owned()
}
