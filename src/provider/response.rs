use crate::scoring::RawScores;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Reply of a score provider: raw scores plus optional narrative feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub scores: RawScores,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_improvement: Option<String>,
}

/// Parse a provider reply, tolerating a surrounding markdown code fence.
pub fn parse_response(text: &str) -> Result<ProviderResponse> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        anyhow::bail!("Provider response is empty");
    }
    serde_json::from_str(body).context("Failed to parse provider response as score JSON")
}

/// Remove a leading ```lang fence and trailing ``` if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Language tag, whether or not a newline follows it
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.trim().trim_end_matches("```").trim()
}
