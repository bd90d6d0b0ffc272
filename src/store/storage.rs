use super::types::{StoredReport, Uploader};
use crate::scoring::ScoreReport;
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::NaiveDateTime;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Timestamp format used in report files and their names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Folder holding one uploader's reports.
pub fn uploader_dir(reports_dir: &Path, uploader: Uploader) -> PathBuf {
    reports_dir.join(uploader.folder_name())
}

/// Replace every character outside `[A-Za-z0-9_.-]` with `_` and drop the extension.
pub fn sanitize_deck_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match Path::new(&safe).file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => "deck".to_string(),
    }
}

/// Save a scored deck as pretty JSON, atomically.
///
/// The file is named `<sanitized deck>_<timestamp>.json` inside the uploader
/// folder, which is created if missing. Returns the written path.
pub fn save_report(
    reports_dir: &Path,
    uploader: Uploader,
    deck_name: &str,
    report: &ScoreReport,
    overall_improvement: Option<String>,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let dir = uploader_dir(reports_dir, uploader);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create reports directory at {}", dir.display()))?;

    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
    let filename = format!("{}_{}.json", sanitize_deck_name(deck_name), timestamp);
    let path = dir.join(&filename);

    let stored = StoredReport::new(filename, timestamp, report, overall_improvement);

    let mut file = AtomicWriteFile::open(&path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, &stored).context("Failed to serialize report")?;
    file.commit().context("Failed to save report")?;

    tracing::debug!(path = %path.display(), "saved report");
    Ok(path)
}

/// Load every stored report for an uploader, oldest first.
///
/// A missing folder yields an empty list. Files that cannot be read or parsed
/// are skipped with a warning.
pub fn list_reports(reports_dir: &Path, uploader: Uploader) -> Result<Vec<StoredReport>> {
    let dir = uploader_dir(reports_dir, uploader);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&dir)
        .with_context(|| format!("Failed to list reports in {}", dir.display()))?;

    let mut reports = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match load_report(&path) {
            Ok(report) => reports.push(report),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping stored report"),
        }
    }

    reports.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.filename.cmp(&b.filename))
    });
    Ok(reports)
}

fn load_report(path: &Path) -> Result<StoredReport> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open report at {}", path.display()))?;
    serde_json::from_reader(file).context("Failed to parse stored report")
}
