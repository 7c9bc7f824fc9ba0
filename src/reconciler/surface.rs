use std::sync::{Arc, Mutex};

use kollab_common::{AnalysisRecord, OverallStatus, StatusCounts, TaskStatus};

/// Change notifications fanned out to every render surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// A fetch started; any previously shown record is gone.
    Loading { ticket_id: String },
    /// A record became the open one (fetched or adopted).
    Loaded {
        record: Arc<AnalysisRecord>,
        counts: StatusCounts,
    },
    /// A status change was requested; controls may show it optimistically.
    TaskStatusPending {
        ticket_id: String,
        index: usize,
        requested: TaskStatus,
    },
    /// The server confirmed a task status change.
    TaskStatusChanged {
        ticket_id: String,
        index: usize,
        status: TaskStatus,
        counts: StatusCounts,
        overall: OverallStatus,
    },
    /// A status change failed; `status` is the model's value to restore.
    TaskStatusRolledBack {
        ticket_id: String,
        index: usize,
        status: TaskStatus,
        message: String,
    },
    OverallStatusChanged {
        ticket_id: String,
        status: OverallStatus,
    },
    /// Terminal failure of a load or update, shown inline.
    Error { ticket_id: String, message: String },
    /// The panel or modal was closed.
    Cleared,
}

/// A read-only observer of the open analysis.
///
/// `notify` runs after the change is committed and the state lock is
/// released, so implementations may read the model (`snapshot`, `counts`).
pub trait Surface: Send + Sync {
    fn notify(&self, event: &SurfaceEvent);
}

/// Surface that keeps every event it sees. Handy for tests and for
/// replaying a session in the terminal.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<SurfaceEvent> {
        self.events().pop()
    }
}

impl Surface for RecordingSurface {
    fn notify(&self, event: &SurfaceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Displayed value of each task's status selector.
///
/// Mirrors what a dropdown would show: the requested value while a change
/// is in flight, the confirmed value afterwards, and the model's value after
/// a rollback.
#[derive(Debug, Default)]
pub struct StatusControls {
    displayed: Mutex<Vec<TaskStatus>>,
}

impl StatusControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn displayed(&self, index: usize) -> Option<TaskStatus> {
        self.displayed
            .lock()
            .ok()
            .and_then(|d| d.get(index).copied())
    }

    pub fn all(&self) -> Vec<TaskStatus> {
        self.displayed
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl Surface for StatusControls {
    fn notify(&self, event: &SurfaceEvent) {
        let Ok(mut displayed) = self.displayed.lock() else {
            return;
        };
        match event {
            SurfaceEvent::Loaded { record, .. } => {
                *displayed = record.issues.iter().map(|i| i.status).collect();
            }
            SurfaceEvent::TaskStatusPending {
                index, requested, ..
            } => {
                if let Some(slot) = displayed.get_mut(*index) {
                    *slot = *requested;
                }
            }
            SurfaceEvent::TaskStatusChanged { index, status, .. }
            | SurfaceEvent::TaskStatusRolledBack { index, status, .. } => {
                if let Some(slot) = displayed.get_mut(*index) {
                    *slot = *status;
                }
            }
            SurfaceEvent::Loading { .. } | SurfaceEvent::Cleared => displayed.clear(),
            SurfaceEvent::OverallStatusChanged { .. } | SurfaceEvent::Error { .. } => {}
        }
    }
}
