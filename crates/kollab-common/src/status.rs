use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::Issue;

/// Severity of an issue, matched case-insensitively against a fixed palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Criticality {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Criticality {
    pub const ALL: [Criticality; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Lowercase key used for badge styling and tab matching.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Lenient parse: unknown or empty text falls back to `Medium`.
    pub fn from_text(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for Criticality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Invalid criticality: {}", s)),
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Criticality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::from_text).unwrap_or_default())
    }
}

/// Workflow status of a single task (an issue seen from the dashboard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    New,
    Processing,
    Resolved,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [Self::New, Self::Processing, Self::Resolved];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Resolved => "resolved",
        }
    }

    /// Capitalised form shown on badges.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Processing => "Processing",
            Self::Resolved => "Resolved",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "processing" => Ok(Self::Processing),
            "resolved" => Ok(Self::Resolved),
            _ => Err(format!(
                "Invalid task status '{}'. Valid values: new, processing, resolved",
                s
            )),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default())
    }
}

/// Ticket-level aggregate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    #[default]
    New,
    Processing,
    Resolved,
    Failed,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Processing => "Processing",
            Self::Resolved => "Resolved",
            Self::Failed => "Failed",
        }
    }
}

impl FromStr for OverallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "processing" => Ok(Self::Processing),
            "resolved" => Ok(Self::Resolved),
            "failed" => Ok(Self::Failed),
            _ => Err(format!(
                "Invalid ticket status '{}'. Valid values: new, processing, resolved, failed",
                s
            )),
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OverallStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default())
    }
}

/// Per-status task tally. Always derived by folding over the full issue list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(default)]
    pub new: usize,
    #[serde(default)]
    pub processing: usize,
    #[serde(default)]
    pub resolved: usize,
}

impl StatusCounts {
    pub fn from_issues(issues: &[Issue]) -> Self {
        issues.iter().fold(Self::default(), |mut acc, issue| {
            match issue.status {
                TaskStatus::New => acc.new += 1,
                TaskStatus::Processing => acc.processing += 1,
                TaskStatus::Resolved => acc.resolved += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.new + self.processing + self.resolved
    }

    pub fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::New => self.new,
            TaskStatus::Processing => self.processing,
            TaskStatus::Resolved => self.resolved,
        }
    }

    /// Aggregate ticket status: all resolved, all new, otherwise processing.
    /// An empty ticket keeps `fallback`.
    pub fn overall(&self, fallback: OverallStatus) -> OverallStatus {
        let total = self.total();
        if total == 0 {
            fallback
        } else if self.resolved == total {
            OverallStatus::Resolved
        } else if self.new == total {
            OverallStatus::New
        } else {
            OverallStatus::Processing
        }
    }
}
