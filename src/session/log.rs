use chrono::{DateTime, Local};

/// Where a status-log line came from. Drives its colour in the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    System,
    Info,
    Scout,
    Analyst,
    Error,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Info => "info",
            Self::Scout => "scout",
            Self::Analyst => "analyst",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub kind: LogKind,
    pub message: String,
    pub at: DateTime<Local>,
}

impl LogEntry {
    pub fn new(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            at: Local::now(),
        }
    }

    /// `HH:MM:SS`, as shown in front of each line.
    pub fn timestamp(&self) -> String {
        self.at.format("%H:%M:%S").to_string()
    }
}

/// Append-only log of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct StatusLog {
    entries: Vec<LogEntry>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: LogKind, message: impl Into<String>) -> &LogEntry {
        self.entries.push(LogEntry::new(kind, message));
        let last = self.entries.len() - 1;
        &self.entries[last]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn messages(&self, kind: LogKind) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |e| e.kind == kind)
            .map(|e| e.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_filter() {
        let mut log = StatusLog::new();
        log.push(LogKind::System, "Connected to server");
        log.push(LogKind::Scout, "Scout agent started");
        log.push(LogKind::Scout, "Scout agent done");

        assert_eq!(log.entries().len(), 3);
        assert_eq!(log.messages(LogKind::Scout).count(), 2);
        assert_eq!(log.last().unwrap().message, "Scout agent done");

        log.clear();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_timestamp_format() {
        let entry = LogEntry::new(LogKind::Info, "x");
        let ts = entry.timestamp();
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.matches(':').count(), 2);
    }
}
