use async_trait::async_trait;
use kollab_common::{AnalysisRecord, FinalReport, OverallStatus};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{AnalysisApi, AnalyzeResponse, PreparedUpload, TaskStatusAck, TaskStatusUpdate};
use crate::errors::ClientError;

/// Which backend route family to address for stored analyses.
///
/// The backend exposes the same operations under `/api/...` (file storage)
/// and `/db/...` (database storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteFamily {
    #[default]
    Api,
    Db,
}

impl RouteFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Db => "db",
        }
    }
}

impl std::str::FromStr for RouteFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "db" => Ok(Self::Db),
            _ => Err(format!("Invalid route family '{}'. Valid values: api, db", s)),
        }
    }
}

// ── Wire envelopes ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AnalyzeBody {
    #[serde(default)]
    final_report: Option<FinalReport>,
    #[serde(default)]
    saved: Option<bool>,
    #[serde(default)]
    ticket_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct TaskStatusBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    ack: TaskStatusAck,
}

#[derive(Deserialize)]
struct StatusBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct AnalysisStatusRequest<'a> {
    company_id: &'a str,
    ticket_id: &'a str,
    status: OverallStatus,
}

/// Any failure signal in an otherwise parsed response.
fn check(status: StatusCode, success: bool, error: Option<String>) -> Result<(), ClientError> {
    if error.is_some() || !success || !status.is_success() {
        return Err(ClientError::api(error));
    }
    Ok(())
}

/// Read a JSON body regardless of HTTP status; the backend reports
/// application errors as `{error}` bodies on 4xx/5xx.
async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<(StatusCode, T), ClientError> {
    let status = resp.status();
    let body = resp.text().await.map_err(ClientError::Transport)?;
    match serde_json::from_str::<T>(&body) {
        Ok(parsed) => Ok((status, parsed)),
        Err(e) if status.is_success() => Err(ClientError::Decode(e.to_string())),
        Err(_) => Err(ClientError::api(Some(format!("Server returned {}", status)))),
    }
}

// ── Client ────────────────────────────────────────────────────────────

/// reqwest-backed [`AnalysisApi`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
    routes: RouteFamily,
}

impl HttpClient {
    pub fn new(base_url: Url, routes: RouteFamily) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            routes,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Decode(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl AnalysisApi for HttpClient {
    async fn analyze(&self, upload: PreparedUpload) -> Result<AnalyzeResponse, ClientError> {
        let url = self.endpoint(&["api", "analyze"])?;
        tracing::info!(%url, company_id = %upload.company_id, file = %upload.file_name, "submitting analysis");

        let file = Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = Form::new()
            .text("company_id", upload.company_id)
            .text("query", upload.query)
            .text(
                "save_analysis",
                if upload.save_analysis { "true" } else { "false" },
            )
            .part("file", file);

        let resp = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(ClientError::Transport)?;
        let (status, body): (_, AnalyzeBody) = read_json(resp).await?;
        if body.error.is_some() || !status.is_success() {
            return Err(ClientError::api(body.error));
        }

        Ok(AnalyzeResponse {
            report: body.final_report,
            saved: body.saved.unwrap_or(false),
            ticket_id: body.ticket_id,
        })
    }

    async fn fetch_analysis(
        &self,
        company_id: &str,
        ticket_id: &str,
    ) -> Result<AnalysisRecord, ClientError> {
        let url = self.endpoint(&[self.routes.as_str(), "analysis", company_id, ticket_id])?;
        tracing::debug!(%url, "fetching analysis");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ClientError::Transport)?;
        let (status, body): (_, DataEnvelope<AnalysisRecord>) = read_json(resp).await?;
        check(status, body.success, body.error)?;

        let mut record = body
            .data
            .ok_or_else(|| ClientError::Decode("response has no data".to_string()))?;
        if record.ticket_id.is_empty() {
            record.ticket_id = ticket_id.to_string();
        }
        Ok(record)
    }

    async fn update_task_status(
        &self,
        update: &TaskStatusUpdate,
    ) -> Result<TaskStatusAck, ClientError> {
        let url = self.endpoint(&[self.routes.as_str(), "task", "status"])?;
        tracing::debug!(%url, ticket_id = %update.ticket_id, task_index = update.task_index, status = %update.status, "updating task status");

        let resp = self
            .client
            .post(url)
            .json(update)
            .send()
            .await
            .map_err(ClientError::Transport)?;
        let (status, body): (_, TaskStatusBody) = read_json(resp).await?;
        check(status, body.success, body.error)?;
        Ok(body.ack)
    }

    async fn update_analysis_status(
        &self,
        company_id: &str,
        ticket_id: &str,
        status: OverallStatus,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&[self.routes.as_str(), "analysis", "status"])?;
        tracing::debug!(%url, ticket_id, %status, "updating ticket status");

        let resp = self
            .client
            .post(url)
            .json(&AnalysisStatusRequest {
                company_id,
                ticket_id,
                status,
            })
            .send()
            .await
            .map_err(ClientError::Transport)?;
        let (http_status, body): (_, StatusBody) = read_json(resp).await?;
        check(http_status, body.success, body.error)
    }
}
