pub mod storage;
pub mod types;

pub use storage::{list_reports, sanitize_deck_name, save_report, uploader_dir, TIMESTAMP_FORMAT};
pub use types::{StoredReport, Uploader};
