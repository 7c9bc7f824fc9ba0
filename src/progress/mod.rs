//! Weighted multi-stage progress for a server-driven analysis run.
//!
//! The server never sends structured stage boundaries, only free-text log
//! lines. Each line is classified against ordered keyword groups; a match
//! completes the corresponding stage. The displayed percentage is always
//! recomputed from the completed set, never incremented.

mod stage;
mod tracker;

pub use stage::{Stage, StageConfig, default_stages};
pub use tracker::{Classification, ProgressTracker};
