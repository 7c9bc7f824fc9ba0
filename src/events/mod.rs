//! Push events emitted by the backend during an analysis run.
//!
//! The backend speaks Socket.IO; only the text packets that carry
//! `status`, `scout_log`, `analyst_log` and `orchestrator_log` events are
//! of interest here. Plain JSON frames (`{"event": .., "data": {"message": ..}}`)
//! are accepted as well, which keeps test servers trivial.

mod feed;

pub use feed::{EventFeed, socket_io_url};

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `42` (message + event) with an optional `/namespace,` prefix.
static SOCKET_IO_EVENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^42(?:/[^,\[]*,)?(?:\d+)?(\[.*\])\s*$").unwrap());

/// Which channel a push event came in on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Status,
    ScoutLog,
    AnalystLog,
    OrchestratorLog,
    Connected,
    Disconnected,
}

impl EventKind {
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "status" => Some(Self::Status),
            "scout_log" => Some(Self::ScoutLog),
            "analyst_log" => Some(Self::AnalystLog),
            "orchestrator_log" => Some(Self::OrchestratorLog),
            _ => None,
        }
    }
}

/// A single push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    pub kind: EventKind,
    pub message: String,
}

impl PushEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connected() -> Self {
        Self::new(EventKind::Connected, "Connected to server")
    }

    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::new(EventKind::Disconnected, reason)
    }

    /// Whether the message text should be fed to the progress tracker.
    pub fn drives_progress(&self) -> bool {
        matches!(
            self.kind,
            EventKind::Status | EventKind::ScoutLog | EventKind::AnalystLog
        )
    }
}

#[derive(Deserialize)]
struct EventPayload {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct JsonFrame {
    event: String,
    #[serde(default)]
    data: Option<EventPayload>,
}

fn build(name: &str, payload: Option<EventPayload>) -> Option<PushEvent> {
    let kind = EventKind::from_event_name(name)?;
    let message = payload.and_then(|p| p.message).unwrap_or_default();
    Some(PushEvent::new(kind, message))
}

/// Decode one websocket text frame into a push event.
///
/// Returns `None` for control packets, unknown events and malformed frames.
pub fn decode_frame(text: &str) -> Option<PushEvent> {
    let text = text.trim();
    if let Some(caps) = SOCKET_IO_EVENT.captures(text) {
        let (name, payload): (String, Option<EventPayload>) =
            match serde_json::from_str::<(String, Option<EventPayload>)>(&caps[1]) {
                Ok(parsed) => parsed,
                Err(_) => {
                    // Events with no payload arrive as a one-element array.
                    let (name,): (String,) = serde_json::from_str(&caps[1]).ok()?;
                    (name, None)
                }
            };
        return build(&name, payload);
    }
    if text.starts_with('{') {
        let frame: JsonFrame = serde_json::from_str(text).ok()?;
        return build(&frame.event, frame.data);
    }
    None
}
