//! Boundary with the language model that produces raw subfactor scores.
//!
//! The scoring core never talks to a model directly. It consumes a
//! [`ProviderResponse`] from any [`ScoreSource`].

mod prompt;
mod response;

pub use prompt::build_prompt;
pub use response::{parse_response, ProviderResponse};

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Anything that can hand over a provider reply.
pub trait ScoreSource {
    fn fetch(&self) -> Result<ProviderResponse>;
}

/// A reply previously captured to a file, or read from stdin when the path is `-`.
#[derive(Debug, Clone)]
pub struct ResponseFile {
    path: PathBuf,
}

impl ResponseFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }
}

impl ScoreSource for ResponseFile {
    fn fetch(&self) -> Result<ProviderResponse> {
        let text = if self.is_stdin() {
            read_stdin()?
        } else {
            std::fs::read_to_string(&self.path).with_context(|| {
                format!("Failed to read provider response: {}", self.path.display())
            })?
        };
        tracing::debug!(bytes = text.len(), "read provider response");
        parse_response(&text)
    }
}

/// Read a text file, or stdin when `path` is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        return read_stdin();
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read from stdin")?;
    Ok(text)
}
