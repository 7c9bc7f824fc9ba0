//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                                   |
//! |-----------------|-----------------------------------------------------|
//! | `analyze`       | `Analyze`                                          |
//! | `ticket`        | `Show`, `Task`, `TicketStatus`, `Export`           |
//! | `config`        | `Config`                                           |

pub mod analyze;
pub mod config;
pub mod ticket;

pub use analyze::{AnalyzeArgs, cmd_analyze};
pub use config::cmd_config;
pub use ticket::{cmd_export, cmd_show, cmd_task, cmd_ticket_status};
