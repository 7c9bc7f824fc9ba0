//! One upload-and-analyze run.
//!
//! A run validates the request, resets the progress tracker, submits the
//! upload and, while the request is in flight, feeds push events into the
//! status log and the tracker. Success force-completes the tracker; any
//! failure resets it for the next attempt.

mod log;

pub use log::{LogEntry, LogKind, StatusLog};

use std::sync::Arc;

use kollab_common::AnalysisRecord;
use tokio::sync::mpsc;

use crate::client::{AnalysisApi, UploadRequest};
use crate::errors::SessionError;
use crate::events::{EventKind, PushEvent};
use crate::progress::ProgressTracker;

/// Receives status-log lines as they are recorded.
pub trait RunObserver: Send + Sync {
    fn on_entry(&self, entry: &LogEntry, percentage: u8);

    /// Called once per run, after the last entry.
    fn on_finish(&self, _percentage: u8, _success: bool) {}
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub record: AnalysisRecord,
    /// Set only when the backend stored the analysis.
    pub saved_ticket: Option<String>,
    pub percentage: u8,
}

pub struct AnalysisSession {
    api: Arc<dyn AnalysisApi>,
    tracker: ProgressTracker,
    log: StatusLog,
    observer: Option<Arc<dyn RunObserver>>,
}

impl AnalysisSession {
    pub fn new(api: Arc<dyn AnalysisApi>, tracker: ProgressTracker) -> Self {
        Self {
            api,
            tracker,
            log: StatusLog::new(),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn log(&self) -> &StatusLog {
        &self.log
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn percentage(&self) -> u8 {
        self.tracker.percentage()
    }

    fn record(&mut self, kind: LogKind, message: impl Into<String>) {
        let percentage = self.tracker.percentage();
        let entry = self.log.push(kind, message);
        if let Some(observer) = &self.observer {
            observer.on_entry(entry, percentage);
        }
    }

    fn on_event(&mut self, event: PushEvent) {
        if event.drives_progress() {
            self.tracker.on_message(&event.message);
        }
        let kind = match event.kind {
            EventKind::Connected => LogKind::System,
            EventKind::Disconnected => LogKind::Error,
            EventKind::ScoutLog => LogKind::Scout,
            EventKind::AnalystLog => LogKind::Analyst,
            EventKind::Status | EventKind::OrchestratorLog => LogKind::Info,
        };
        self.record(kind, event.message);
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        self.tracker.reset();
        tracing::warn!(error = %err, "analysis run failed");
        self.record(LogKind::Error, format!("Error: {}", err));
        if let Some(observer) = &self.observer {
            observer.on_finish(0, false);
        }
        err
    }

    /// Run one analysis.
    ///
    /// `events` is the push-event feed for this run; it may close at any
    /// time without affecting the upload. Events already buffered when the
    /// response arrives are applied before the outcome.
    pub async fn run(
        &mut self,
        request: &UploadRequest,
        mut events: mpsc::Receiver<PushEvent>,
    ) -> Result<RunOutcome, SessionError> {
        self.log.clear();
        self.tracker.reset();

        let upload = match request.prepare().await {
            Ok(upload) => upload,
            Err(e) => return Err(self.fail(e.into())),
        };
        let company_id = upload.company_id.clone();
        let query = upload.query.clone();
        tracing::info!(file = %upload.file_name, %company_id, save = upload.save_analysis, "starting analysis run");
        self.record(LogKind::System, "Uploading and analyzing data...");

        let api = Arc::clone(&self.api);
        let response = api.analyze(upload);
        tokio::pin!(response);

        let mut feed_open = true;
        let response = loop {
            tokio::select! {
                biased;
                event = events.recv(), if feed_open => match event {
                    Some(event) => self.on_event(event),
                    None => feed_open = false,
                },
                response = &mut response => break response,
            }
        };
        while let Ok(event) = events.try_recv() {
            self.on_event(event);
        }

        let response = match response {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e.into())),
        };
        let saved_ticket = response.saved_ticket().map(str::to_string);
        let Some(report) = response.report else {
            return Err(self.fail(SessionError::MissingReport));
        };

        self.tracker.complete_all();
        let mut record = AnalysisRecord::from_report(report, saved_ticket.clone().unwrap_or_default());
        record.company_id = Some(company_id);
        record.query = Some(query);

        self.record(LogKind::System, "Analysis complete");
        if let Some(ticket) = &saved_ticket {
            self.record(LogKind::System, format!("Analysis saved as Ticket #{}", ticket));
        }
        let percentage = self.tracker.percentage();
        if let Some(observer) = &self.observer {
            observer.on_finish(percentage, true);
        }
        tracing::info!(issues = record.issues.len(), saved = ?saved_ticket, "analysis run finished");

        Ok(RunOutcome {
            record,
            saved_ticket,
            percentage,
        })
    }
}
