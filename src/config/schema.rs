use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of deck characters forwarded to the model.
pub const DEFAULT_PROMPT_MAX_CHARS: usize = 8000;

/// Application configuration. Every field is optional.
///
/// Example YAML:
/// ```yaml
/// rubric: ~/decks/rubric.yaml
/// reports_dir: ~/decks/reports
/// prompt:
///   max_chars: 12000
///   closing_line: "Book a review call for a detailed walkthrough."
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Custom rubric file; the built-in rubric is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric: Option<PathBuf>,

    /// Where stored reports are written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports_dir: Option<PathBuf>,

    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PromptConfig {
    /// Deck text beyond this many characters is cut off.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Sentence the model is asked to end its improvement analysis with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_line: Option<String>,
}

fn default_max_chars() -> usize {
    DEFAULT_PROMPT_MAX_CHARS
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_PROMPT_MAX_CHARS,
            closing_line: None,
        }
    }
}
