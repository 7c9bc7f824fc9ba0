use console::style;

use crate::reconciler::{Surface, SurfaceEvent};
use crate::render::{overall_badge, status_badge, status_counts, task_id};
use crate::ui::icons::{CHECK, CROSS, PENDING, TICKET};

/// Prints reconciler changes as they happen.
///
/// The full record is rendered by the command once a load completes; this
/// surface only reports the transitions in between.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    quiet: bool,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only errors and rollbacks are printed.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    /// Line for an event, or `None` when the event has nothing to say.
    pub fn describe(event: &SurfaceEvent) -> Option<String> {
        match event {
            SurfaceEvent::Loading { ticket_id } => Some(format!(
                "{}Loading ticket {}...",
                PENDING,
                style(ticket_id).cyan()
            )),
            SurfaceEvent::Loaded { .. } | SurfaceEvent::Cleared => None,
            SurfaceEvent::TaskStatusPending {
                index, requested, ..
            } => Some(format!(
                "{}Task {} → {}",
                PENDING,
                task_id(*index),
                status_badge(*requested)
            )),
            SurfaceEvent::TaskStatusChanged {
                index,
                status,
                counts,
                overall,
                ..
            } => Some(format!(
                "{}Task {} is now {}  {}  Ticket {}",
                CHECK,
                task_id(*index),
                status_badge(*status),
                status_counts(counts),
                overall_badge(*overall)
            )),
            SurfaceEvent::TaskStatusRolledBack {
                index,
                status,
                message,
                ..
            } => Some(format!(
                "{}Task {} stays {}: {}",
                CROSS,
                task_id(*index),
                status_badge(*status),
                style(message).red()
            )),
            SurfaceEvent::OverallStatusChanged { ticket_id, status } => Some(format!(
                "{}Ticket {} is now {}",
                TICKET,
                ticket_id,
                overall_badge(*status)
            )),
            SurfaceEvent::Error { ticket_id, message } => Some(format!(
                "{}Ticket {}: {}",
                CROSS,
                ticket_id,
                style(message).red()
            )),
        }
    }
}

impl Surface for TerminalSurface {
    fn notify(&self, event: &SurfaceEvent) {
        let loud = matches!(
            event,
            SurfaceEvent::Error { .. } | SurfaceEvent::TaskStatusRolledBack { .. }
        );
        if self.quiet && !loud {
            return;
        }
        if let Some(line) = Self::describe(event) {
            if loud {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        }
    }
}
