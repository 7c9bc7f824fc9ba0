//! Shared domain types for the Kollab analysis client.
//!
//! The backend returns loosely shaped JSON: any field may be missing, `null`,
//! or carry free text where an enum is expected. Every type here normalises
//! on the way in, so consumers always see fully populated values.

pub mod model;
pub mod status;

pub use model::{AnalysisRecord, FinalReport, Initiative, Issue, Plan, RecordMetadata};
pub use status::{Criticality, OverallStatus, StatusCounts, TaskStatus};
