use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Marker meaning "this subfactor does not apply". Compared case-insensitively.
pub const SKIP_SENTINEL: &str = "none";

/// A single raw subfactor score as handed over by the score provider.
///
/// Deserializes from any JSON value so that one malformed subfactor does not
/// reject the whole payload: it only fails if its category is evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum RawScore {
    /// Numeric score, expected in [0, 100].
    Value(f64),
    /// The skip sentinel.
    Skip,
    /// Anything else, kept verbatim for error reporting.
    Invalid(String),
}

/// Subfactor name -> raw score, for one category.
pub type SubfactorScores = HashMap<String, RawScore>;

/// Category name -> subfactor scores.
pub type RawScores = HashMap<String, SubfactorScores>;

pub fn is_skip_sentinel(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case(SKIP_SENTINEL)
}

impl fmt::Display for RawScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawScore::Value(v) => write!(f, "{}", v),
            RawScore::Skip => write!(f, "{}", SKIP_SENTINEL),
            RawScore::Invalid(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<Value> for RawScore {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(v) => RawScore::Value(v),
                None => RawScore::Invalid(n.to_string()),
            },
            Value::String(s) if is_skip_sentinel(&s) => RawScore::Skip,
            Value::String(s) => RawScore::Invalid(s),
            other => RawScore::Invalid(other.to_string()),
        }
    }
}

impl From<RawScore> for Value {
    fn from(score: RawScore) -> Self {
        match score {
            RawScore::Value(v) => Value::from(v),
            RawScore::Skip => Value::String(SKIP_SENTINEL.to_string()),
            RawScore::Invalid(s) => Value::String(s),
        }
    }
}
