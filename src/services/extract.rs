//! Fenced code-block extraction from model output.

use regex::Regex;

use crate::domain::models::Language;

/// Pull the first fenced code block for `language` out of raw model text.
///
/// Matches ` ```<tag>\n … ``` ` across newlines and returns the trimmed
/// block content. The Python pattern accepts the tag as optional; without a
/// detected language only a bare fence matches. When nothing matches, the
/// whole input is returned trimmed. The extracted content is not validated.
pub fn extract_code(raw: &str, language: Option<Language>) -> String {
    let pattern = match language {
        Some(Language::Python) => r"(?s)```(?:python)?\n(.*?)```".to_string(),
        Some(lang) => format!(r"(?s)```{}\n(.*?)```", regex::escape(lang.fence_tag())),
        None => r"(?s)```\n(.*?)```".to_string(),
    };

    // The pattern is assembled from fixed tags; compilation cannot fail.
    let re = Regex::new(&pattern).unwrap();
    match re.captures(raw).and_then(|caps| caps.get(1)) {
        Some(block) => block.as_str().trim().to_string(),
        None => raw.trim().to_string(),
    }
}
