use crate::scoring::{CategoryScore, Interpretation, ScoreReport};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who submitted a deck. Decides which folder its reports land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Uploader {
    #[default]
    Admin,
    User,
}

impl Uploader {
    pub fn folder_name(&self) -> &'static str {
        match self {
            Uploader::Admin => "admin_pitchdecks",
            Uploader::User => "user_pitchdecks",
        }
    }
}

impl fmt::Display for Uploader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uploader::Admin => write!(f, "admin"),
            Uploader::User => write!(f, "user"),
        }
    }
}

/// A scored deck as persisted on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub filename: String,
    /// Local time formatted as `%Y%m%d_%H%M%S`, so it sorts lexically.
    pub timestamp: String,
    pub overall_percentage: f64,
    pub interpretation: Interpretation,
    #[serde(default)]
    pub overall_improvement: Option<String>,
    pub detailed_scorecard: Vec<CategoryScore>,
}

impl StoredReport {
    pub fn new(
        filename: String,
        timestamp: String,
        report: &ScoreReport,
        overall_improvement: Option<String>,
    ) -> Self {
        Self {
            filename,
            timestamp,
            overall_percentage: report.overall_percentage,
            interpretation: report.interpretation,
            overall_improvement,
            detailed_scorecard: report.categories.clone(),
        }
    }
}
