pub mod client;
pub mod config;
pub mod errors;
pub mod events;
pub mod export;
pub mod progress;
pub mod reconciler;
pub mod render;
pub mod session;
pub mod ui;

// Wire and domain types live in the shared crate.
pub use kollab_common::{AnalysisRecord, Issue, OverallStatus, StatusCounts, TaskStatus};
