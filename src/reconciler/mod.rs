//! Status Reconciler: single owner of the open analysis record.
//!
//! Every surface that mirrors a ticket (task badges, status selectors,
//! ticket aggregate, counters) is a [`Surface`] observer; the reconciler is
//! the only writer. Two rules keep surfaces consistent across interleaved
//! network completions:
//!
//! - **Stale discard.** Each `load`, `adopt` and `close` bumps a generation
//!   counter. A response is committed only if the generation it was issued
//!   under is still current.
//! - **Recompute, don't increment.** [`StatusCounts`] are folded from the full
//!   issue array after every committed change.

mod surface;

pub use surface::{RecordingSurface, StatusControls, Surface, SurfaceEvent};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kollab_common::{AnalysisRecord, OverallStatus, StatusCounts, TaskStatus};

use crate::client::{AnalysisApi, TaskStatusUpdate};
use crate::errors::{FetchError, UpdateError, ValidationError};

struct OpenRecord {
    record: Arc<AnalysisRecord>,
    generation: u64,
}

#[derive(Default)]
struct State {
    generation: u64,
    open: Option<OpenRecord>,
}

/// Captured at request time, checked again at commit time.
struct Ticket {
    ticket_id: String,
    generation: u64,
}

pub struct StatusReconciler {
    api: Arc<dyn AnalysisApi>,
    company_id: String,
    state: Mutex<State>,
    surfaces: Mutex<Vec<Arc<dyn Surface>>>,
}

impl StatusReconciler {
    pub fn new(api: Arc<dyn AnalysisApi>, company_id: impl Into<String>) -> Self {
        Self {
            api,
            company_id: company_id.into(),
            state: Mutex::new(State::default()),
            surfaces: Mutex::new(Vec::new()),
        }
    }

    pub fn company_id(&self) -> &str {
        &self.company_id
    }

    pub fn subscribe(&self, surface: Arc<dyn Surface>) {
        self.surfaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(surface);
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fan an event out to every surface. Callers must not hold the state
    /// lock: surfaces are free to read the model from `notify`.
    fn emit(&self, event: SurfaceEvent) {
        let surfaces = self
            .surfaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for surface in surfaces {
            surface.notify(&event);
        }
    }

    /// The open record as of now. Cheap: shares the model until it next changes.
    pub fn snapshot(&self) -> Option<Arc<AnalysisRecord>> {
        self.state().open.as_ref().map(|o| Arc::clone(&o.record))
    }

    pub fn counts(&self) -> Option<StatusCounts> {
        self.state().open.as_ref().map(|o| o.record.counts())
    }

    pub fn overall_status(&self) -> Option<OverallStatus> {
        self.state().open.as_ref().map(|o| o.record.status)
    }

    /// Fetch a ticket and make it the open record.
    ///
    /// The previous record is dropped immediately. If another `load`,
    /// `adopt` or `close` happens while this fetch is in flight, its result
    /// is discarded and `FetchError::Superseded` is returned.
    pub async fn load(&self, ticket_id: &str) -> Result<Arc<AnalysisRecord>, FetchError> {
        let ticket_id = ticket_id.trim();
        if ticket_id.is_empty() {
            return Err(ValidationError::MissingTicketId.into());
        }

        let generation = {
            let mut state = self.state();
            state.generation += 1;
            state.open = None;
            state.generation
        };
        self.emit(SurfaceEvent::Loading {
            ticket_id: ticket_id.to_string(),
        });
        tracing::info!(ticket_id, generation, "loading analysis");

        let result = self
            .api
            .fetch_analysis(&self.company_id, ticket_id)
            .await
            .map(Arc::new);

        {
            let mut state = self.state();
            if state.generation != generation {
                tracing::info!(ticket_id, generation, current = state.generation, "discarding stale analysis response");
                return Err(FetchError::Superseded {
                    ticket_id: ticket_id.to_string(),
                });
            }
            if let Ok(record) = &result {
                state.open = Some(OpenRecord {
                    record: Arc::clone(record),
                    generation,
                });
            }
        }

        match result {
            Ok(record) => {
                let counts = record.counts();
                self.emit(SurfaceEvent::Loaded {
                    record: Arc::clone(&record),
                    counts,
                });
                tracing::info!(ticket_id, issues = record.issues.len(), "analysis loaded");
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(ticket_id, error = %e, "failed to load analysis");
                self.emit(SurfaceEvent::Error {
                    ticket_id: ticket_id.to_string(),
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Install a record that did not come from a fetch, e.g. the result of
    /// a finished analysis run. Supersedes any in-flight load.
    pub fn adopt(&self, record: AnalysisRecord) -> Arc<AnalysisRecord> {
        let record = Arc::new(record);
        {
            let mut state = self.state();
            state.generation += 1;
            state.open = Some(OpenRecord {
                record: Arc::clone(&record),
                generation: state.generation,
            });
        }
        self.emit(SurfaceEvent::Loaded {
            record: Arc::clone(&record),
            counts: record.counts(),
        });
        record
    }

    /// Drop the open record (panel or modal closed).
    pub fn close(&self) {
        {
            let mut state = self.state();
            state.generation += 1;
            state.open = None;
        }
        self.emit(SurfaceEvent::Cleared);
    }

    fn current_ticket(state: &State) -> Result<(Ticket, &AnalysisRecord), UpdateError> {
        let open = state.open.as_ref().ok_or(UpdateError::NoRecord)?;
        Ok((
            Ticket {
                ticket_id: open.record.ticket_id.clone(),
                generation: open.generation,
            },
            open.record.as_ref(),
        ))
    }

    /// Change one task's status.
    ///
    /// The model is only touched once the server confirms. On failure the
    /// model is unchanged and surfaces are told to restore the model's value.
    pub async fn set_task_status(
        &self,
        index: usize,
        status: TaskStatus,
    ) -> Result<StatusCounts, UpdateError> {
        let ticket = {
            let state = self.state();
            let (ticket, record) = Self::current_ticket(&state)?;
            if index >= record.issues.len() {
                return Err(UpdateError::InvalidTaskIndex {
                    index,
                    len: record.issues.len(),
                });
            }
            ticket
        };
        self.emit(SurfaceEvent::TaskStatusPending {
            ticket_id: ticket.ticket_id.clone(),
            index,
            requested: status,
        });

        let update = TaskStatusUpdate {
            company_id: self.company_id.clone(),
            ticket_id: ticket.ticket_id.clone(),
            task_index: index,
            status,
        };
        let result = self.api.update_task_status(&update).await;

        // Commit under the lock, notify after releasing it.
        let committed = {
            let mut state = self.state();
            let open = match state.open.as_mut() {
                Some(open) if open.generation == ticket.generation => open,
                _ => {
                    tracing::info!(ticket_id = %ticket.ticket_id, index, "task status response for a closed ticket");
                    return Err(UpdateError::Superseded {
                        ticket_id: ticket.ticket_id,
                    });
                }
            };
            match result {
                Ok(ack) => {
                    let record = Arc::make_mut(&mut open.record);
                    record.issues[index].status = status;
                    let counts = record.counts();
                    let overall = ack
                        .overall_status
                        .unwrap_or_else(|| counts.overall(record.status));
                    record.status = overall;
                    // The local tally is authoritative; server counts are only a cross-check.
                    if let Some(server_counts) = ack.counts.filter(|c| *c != counts) {
                        tracing::debug!(?server_counts, ?counts, "server counts differ from local tally");
                    }
                    Ok((counts, overall))
                }
                Err(e) => Err((e, open.record.issues[index].status)),
            }
        };

        match committed {
            Ok((counts, overall)) => {
                self.emit(SurfaceEvent::TaskStatusChanged {
                    ticket_id: ticket.ticket_id.clone(),
                    index,
                    status,
                    counts,
                    overall,
                });
                tracing::info!(ticket_id = %ticket.ticket_id, index, %status, "task status updated");
                Ok(counts)
            }
            Err((e, model_value)) => {
                tracing::warn!(ticket_id = %ticket.ticket_id, index, error = %e, "task status update failed, rolling back");
                self.emit(SurfaceEvent::TaskStatusRolledBack {
                    ticket_id: ticket.ticket_id.clone(),
                    index,
                    status: model_value,
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Change the ticket-level status.
    pub async fn set_overall_status(&self, status: OverallStatus) -> Result<(), UpdateError> {
        let ticket = {
            let state = self.state();
            Self::current_ticket(&state)?.0
        };

        let result = self
            .api
            .update_analysis_status(&self.company_id, &ticket.ticket_id, status)
            .await;

        {
            let mut state = self.state();
            let open = match state.open.as_mut() {
                Some(open) if open.generation == ticket.generation => open,
                _ => {
                    return Err(UpdateError::Superseded {
                        ticket_id: ticket.ticket_id,
                    });
                }
            };
            if result.is_ok() {
                Arc::make_mut(&mut open.record).status = status;
            }
        }

        match result {
            Ok(()) => {
                self.emit(SurfaceEvent::OverallStatusChanged {
                    ticket_id: ticket.ticket_id,
                    status,
                });
                Ok(())
            }
            Err(e) => {
                self.emit(SurfaceEvent::Error {
                    ticket_id: ticket.ticket_id,
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }
}
