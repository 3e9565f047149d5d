//! Prompt construction and response validation for the category oracle
//!
//! Oracle output is free text. It is only trusted once it names one of the
//! ids that were offered in the prompt.

/// Result of checking raw oracle output against the allowed ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleVerdict {
    /// The response named an allowed id (canonical spelling)
    Valid(String),
    /// Anything else, with the raw text kept for logging
    Invalid(String),
}

impl OracleVerdict {
    pub fn category_id(&self) -> Option<&str> {
        match self {
            OracleVerdict::Valid(id) => Some(id),
            OracleVerdict::Invalid(_) => None,
        }
    }
}

/// Build the categorization prompt for a merchant, quoted as typed
pub fn category_prompt(merchant: &str, allowed: &[&str]) -> String {
    format!(
        "Categorize this merchant: \"{}\". Choose the best fit from these IDs: {}. Return ONLY the ID.",
        merchant,
        allowed.join(", ")
    )
}

/// Validate an oracle response against the closed id enumeration
///
/// Surrounding whitespace, quotes, backticks and a trailing period are
/// ignored, as is letter case. Everything else must match exactly.
pub fn parse_category_response(response: &str, allowed: &[&str]) -> OracleVerdict {
    let cleaned = response
        .trim()
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '.'));

    match allowed.iter().find(|id| id.eq_ignore_ascii_case(cleaned)) {
        Some(id) => OracleVerdict::Valid(id.to_string()),
        None => OracleVerdict::Invalid(truncate(response.trim(), 200)),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}
