use std::path::{Path, PathBuf};

use crate::errors::ValidationError;

/// Query sent when the user leaves the prompt blank.
pub const DEFAULT_QUERY: &str =
    "What are the key issues and actionable insights from this feedback?";

/// What the user asked to analyze, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub file: Option<PathBuf>,
    pub company_id: String,
    pub query: String,
    pub save_analysis: bool,
}

impl UploadRequest {
    pub fn new(file: impl Into<PathBuf>, company_id: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            company_id: company_id.into(),
            query: String::new(),
            save_analysis: true,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_save(mut self, save: bool) -> Self {
        self.save_analysis = save;
        self
    }

    /// Validate inputs and read the file. Nothing here touches the network.
    pub async fn prepare(&self) -> Result<PreparedUpload, ValidationError> {
        let path = self.file.as_deref().ok_or(ValidationError::MissingFile)?;
        let company_id = self.company_id.trim();
        if company_id.is_empty() {
            return Err(ValidationError::MissingCompanyId);
        }
        if !path.is_file() {
            return Err(ValidationError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ValidationError::FileUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let query = match self.query.trim() {
            "" => DEFAULT_QUERY.to_string(),
            q => q.to_string(),
        };

        Ok(PreparedUpload {
            file_name: file_name(path),
            bytes,
            company_id: company_id.to_string(),
            query,
            save_analysis: self.save_analysis,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string())
}

/// A validated upload, ready to be sent as multipart form data.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub company_id: String,
    pub query: String,
    pub save_analysis: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn feedback_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("feedback.csv");
        std::fs::write(&path, "id,comment\n1,Checkout is slow\n").unwrap();
        path
    }

    #[tokio::test]
    async fn test_prepare_applies_default_query() {
        let dir = TempDir::new().unwrap();
        let upload = UploadRequest::new(feedback_file(&dir), " acme ")
            .prepare()
            .await
            .unwrap();
        assert_eq!(upload.company_id, "acme");
        assert_eq!(upload.query, DEFAULT_QUERY);
        assert_eq!(upload.file_name, "feedback.csv");
        assert!(upload.save_analysis);
        assert!(!upload.bytes.is_empty());
    }

    #[tokio::test]
    async fn test_prepare_keeps_custom_query() {
        let dir = TempDir::new().unwrap();
        let upload = UploadRequest::new(feedback_file(&dir), "acme")
            .with_query("  Why do users churn?  ")
            .with_save(false)
            .prepare()
            .await
            .unwrap();
        assert_eq!(upload.query, "Why do users churn?");
        assert!(!upload.save_analysis);
    }

    #[tokio::test]
    async fn test_prepare_rejects_missing_file() {
        let request = UploadRequest {
            file: None,
            company_id: "acme".into(),
            query: String::new(),
            save_analysis: true,
        };
        assert!(matches!(
            request.prepare().await,
            Err(ValidationError::MissingFile)
        ));
    }

    #[tokio::test]
    async fn test_prepare_rejects_blank_company() {
        let dir = TempDir::new().unwrap();
        let request = UploadRequest::new(feedback_file(&dir), "   ");
        assert!(matches!(
            request.prepare().await,
            Err(ValidationError::MissingCompanyId)
        ));
    }

    #[tokio::test]
    async fn test_prepare_rejects_nonexistent_path() {
        let dir = TempDir::new().unwrap();
        let request = UploadRequest::new(dir.path().join("nope.csv"), "acme");
        assert!(matches!(
            request.prepare().await,
            Err(ValidationError::FileNotFound { .. })
        ));
    }
}
