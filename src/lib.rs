pub mod config;
pub mod error;
pub mod output;
pub mod provider;
pub mod rubric;
pub mod scoring;
pub mod store;
pub mod telemetry;
