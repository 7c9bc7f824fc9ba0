//! Typed error hierarchy for the Kollab client.
//!
//! - `ValidationError`: input rejected before any request is sent
//! - `ClientError`: transport and application failures from the backend
//! - `FetchError` / `UpdateError`: reconciler operations
//! - `SessionError`: a full upload-and-analyze run
//! - `StageConfigError`: progress stage configuration

use std::path::PathBuf;

use thiserror::Error;

/// Message shown when the backend reports failure without saying why.
pub const GENERIC_FAILURE: &str = "Unknown error";

/// Input problems caught before any network call.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Please select a file to analyze")]
    MissingFile,

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Please enter a Company ID")]
    MissingCompanyId,

    #[error("Please enter a Ticket ID")]
    MissingTicketId,
}

/// Failures talking to the analysis backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connection refused, reset, ...).
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered but reported failure (`success: false` or `error`).
    #[error("{message}")]
    Api { message: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ClientError {
    /// Application failure with the server's message, or the generic fallback.
    pub fn api(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        ClientError::Api { message }
    }
}

/// Errors from `StatusReconciler::load`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to load analysis: {0}")]
    Client(#[from] ClientError),

    /// A newer load replaced this one while it was in flight.
    #[error("Load of ticket {ticket_id} was superseded")]
    Superseded { ticket_id: String },
}

/// Errors from `StatusReconciler::set_task_status`.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("No analysis is open")]
    NoRecord,

    #[error("Task index {index} out of range ({len} tasks)")]
    InvalidTaskIndex { index: usize, len: usize },

    #[error("Failed to update task status: {0}")]
    Client(#[from] ClientError),

    /// The record was closed or replaced before the response arrived.
    #[error("Ticket {ticket_id} is no longer open")]
    Superseded { ticket_id: String },
}

/// Errors from a full analysis run.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("No final report data")]
    MissingReport,
}

/// Invalid progress stage configuration.
#[derive(Debug, Error, PartialEq)]
pub enum StageConfigError {
    #[error("At least one progress stage is required")]
    Empty,

    #[error("Stage '{id}' must have a positive weight")]
    ZeroWeight { id: String },

    #[error("Duplicate stage id '{id}'")]
    DuplicateId { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_error_api_uses_server_message() {
        let err = ClientError::api(Some("Analysis not found".into()));
        assert_eq!(err.to_string(), "Analysis not found");
    }

    #[test]
    fn client_error_api_falls_back_to_generic() {
        assert_eq!(ClientError::api(None).to_string(), GENERIC_FAILURE);
        assert_eq!(ClientError::api(Some("  ".into())).to_string(), GENERIC_FAILURE);
    }

    #[test]
    fn update_error_invalid_index_carries_bounds() {
        let err = UpdateError::InvalidTaskIndex { index: 7, len: 3 };
        match &err {
            UpdateError::InvalidTaskIndex { index, len } => {
                assert_eq!(*index, 7);
                assert_eq!(*len, 3);
            }
            _ => panic!("Expected InvalidTaskIndex"),
        }
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn fetch_error_converts_from_client_error() {
        let err: FetchError = ClientError::api(Some("boom".into())).into();
        match &err {
            FetchError::Client(ClientError::Api { message }) => assert_eq!(message, "boom"),
            _ => panic!("Expected FetchError::Client(Api)"),
        }
    }

    #[test]
    fn session_error_converts_from_validation() {
        let err: SessionError = ValidationError::MissingCompanyId.into();
        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::MissingCompanyId)
        ));
        assert_eq!(err.to_string(), "Please enter a Company ID");
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ValidationError::MissingFile);
        assert_std_error(&UpdateError::NoRecord);
        assert_std_error(&SessionError::MissingReport);
        assert_std_error(&StageConfigError::Empty);
    }
}
