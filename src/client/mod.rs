//! Backend API client.
//!
//! [`AnalysisApi`] is the seam between the reconciler/session logic and the
//! network: [`HttpClient`] talks to the real backend, tests substitute
//! in-memory fakes.

mod http;
mod upload;

pub use http::{HttpClient, RouteFamily};
pub use upload::{DEFAULT_QUERY, PreparedUpload, UploadRequest};

use async_trait::async_trait;
use kollab_common::{AnalysisRecord, FinalReport, OverallStatus, StatusCounts, TaskStatus};
use serde::{Deserialize, Serialize};

use crate::errors::ClientError;

/// Result of `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeResponse {
    /// `None` when the server answered without a report.
    pub report: Option<FinalReport>,
    pub saved: bool,
    pub ticket_id: Option<String>,
}

impl AnalyzeResponse {
    /// Ticket id of the stored analysis, only when the save succeeded.
    pub fn saved_ticket(&self) -> Option<&str> {
        if self.saved {
            self.ticket_id.as_deref().filter(|t| !t.is_empty())
        } else {
            None
        }
    }
}

/// Body of a task status change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatusUpdate {
    pub company_id: String,
    pub ticket_id: String,
    pub task_index: usize,
    pub status: TaskStatus,
}

/// Server acknowledgement of a task status change.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskStatusAck {
    #[serde(default)]
    pub overall_status: Option<OverallStatus>,
    #[serde(default)]
    pub counts: Option<StatusCounts>,
}

/// Operations the dashboard needs from the backend.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Upload a feedback file and run the full analysis.
    async fn analyze(&self, upload: PreparedUpload) -> Result<AnalyzeResponse, ClientError>;

    /// Fetch a stored analysis.
    async fn fetch_analysis(
        &self,
        company_id: &str,
        ticket_id: &str,
    ) -> Result<AnalysisRecord, ClientError>;

    /// Change the status of one task, addressed by position.
    async fn update_task_status(
        &self,
        update: &TaskStatusUpdate,
    ) -> Result<TaskStatusAck, ClientError>;

    /// Change the ticket-level status.
    async fn update_analysis_status(
        &self,
        company_id: &str,
        ticket_id: &str,
        status: OverallStatus,
    ) -> Result<(), ClientError>;
}
