use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{Criticality, OverallStatus, StatusCounts, TaskStatus};

const UNTITLED_ISSUE: &str = "Untitled Issue";
const NO_DESCRIPTION: &str = "No description available";
const UNASSIGNED: &str = "Unassigned";
const NOT_SPECIFIED: &str = "Not specified";
const NO_SUMMARY: &str = "No summary available";
const UNTITLED_INITIATIVE: &str = "Untitled Initiative";

/// Missing, null and blank text all collapse to the same fallback.
fn text_or(raw: Option<String>, fallback: &str) -> String {
    match raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => fallback.to_string(),
    }
}

// ── Issue ────────────────────────────────────────────────────────────

/// One finding of an analysis. The dashboard also calls it a "task".
///
/// Issues have no stable id: identity is the position in
/// [`AnalysisRecord::issues`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawIssue")]
pub struct Issue {
    pub issue_type: String,
    pub description: String,
    pub criticality: Criticality,
    pub responsible_team: String,
    pub tags: Vec<String>,
    pub sources: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub resolution_strategy: String,
    pub timeline: String,
    pub status: TaskStatus,
}

impl Default for Issue {
    fn default() -> Self {
        RawIssue::default().into()
    }
}

#[derive(Default, Deserialize)]
struct RawIssue {
    issue_type: Option<String>,
    description: Option<String>,
    #[serde(default)]
    criticality: Criticality,
    responsible_team: Option<String>,
    tags: Option<Vec<String>>,
    sources: Option<Vec<String>>,
    recommended_actions: Option<Vec<String>>,
    resolution_strategy: Option<String>,
    timeline: Option<String>,
    #[serde(default)]
    status: TaskStatus,
}

impl From<RawIssue> for Issue {
    fn from(raw: RawIssue) -> Self {
        Self {
            issue_type: text_or(raw.issue_type, UNTITLED_ISSUE),
            description: text_or(raw.description, NO_DESCRIPTION),
            criticality: raw.criticality,
            responsible_team: text_or(raw.responsible_team, UNASSIGNED),
            tags: raw.tags.unwrap_or_default(),
            sources: raw.sources.unwrap_or_default(),
            recommended_actions: raw.recommended_actions.unwrap_or_default(),
            resolution_strategy: text_or(raw.resolution_strategy, NOT_SPECIFIED),
            timeline: text_or(raw.timeline, NOT_SPECIFIED),
            status: raw.status,
        }
    }
}

// ── Plan / Initiative ────────────────────────────────────────────────

/// Implementation plan split into three horizons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default, deserialize_with = "nullable_list")]
    pub immediate_actions: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub short_term_actions: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub long_term_actions: Vec<String>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.immediate_actions.is_empty()
            && self.short_term_actions.is_empty()
            && self.long_term_actions.is_empty()
    }
}

fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A recommendation spanning several teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawInitiative")]
pub struct Initiative {
    pub name: String,
    pub description: String,
    pub teams_involved: Vec<String>,
}

#[derive(Deserialize)]
struct RawInitiative {
    name: Option<String>,
    description: Option<String>,
    teams_involved: Option<Vec<String>>,
}

impl From<RawInitiative> for Initiative {
    fn from(raw: RawInitiative) -> Self {
        Self {
            name: text_or(raw.name, UNTITLED_INITIATIVE),
            description: text_or(raw.description, NO_DESCRIPTION),
            teams_involved: raw.teams_involved.unwrap_or_default(),
        }
    }
}

// ── Final report ─────────────────────────────────────────────────────

/// The `final_report` object produced by an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFinalReport")]
pub struct FinalReport {
    pub executive_summary: String,
    pub issues: Vec<Issue>,
    pub implementation_plan: Plan,
    pub cross_team_initiatives: Vec<Initiative>,
}

impl Default for FinalReport {
    fn default() -> Self {
        RawFinalReport::default().into()
    }
}

#[derive(Default, Deserialize)]
struct RawFinalReport {
    executive_summary: Option<String>,
    issues: Option<Vec<Issue>>,
    implementation_plan: Option<Plan>,
    cross_team_initiatives: Option<Vec<Initiative>>,
}

impl From<RawFinalReport> for FinalReport {
    fn from(raw: RawFinalReport) -> Self {
        Self {
            executive_summary: text_or(raw.executive_summary, NO_SUMMARY),
            issues: raw.issues.unwrap_or_default(),
            implementation_plan: raw.implementation_plan.unwrap_or_default(),
            cross_team_initiatives: raw.cross_team_initiatives.unwrap_or_default(),
        }
    }
}

// ── Analysis record ──────────────────────────────────────────────────

/// Storage timestamps, unix seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

/// A full analysis as displayed in the detail panel or modal.
///
/// Serialises in the stored shape (`final_report` nested) so an exported
/// file can be fed back to anything that reads the backend's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredAnalysis", into = "StoredAnalysis")]
pub struct AnalysisRecord {
    /// Empty for a run that was not saved.
    pub ticket_id: String,
    pub company_id: Option<String>,
    pub query: Option<String>,
    pub status: OverallStatus,
    pub metadata: RecordMetadata,
    pub executive_summary: String,
    pub issues: Vec<Issue>,
    pub implementation_plan: Plan,
    pub cross_team_initiatives: Vec<Initiative>,
}

#[derive(Serialize, Deserialize)]
struct StoredAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ticket_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(default)]
    status: OverallStatus,
    #[serde(default)]
    metadata: Option<RecordMetadata>,
    #[serde(default)]
    final_report: Option<FinalReport>,
}

impl From<StoredAnalysis> for AnalysisRecord {
    fn from(stored: StoredAnalysis) -> Self {
        let mut record = Self::from_report(
            stored.final_report.unwrap_or_default(),
            stored.ticket_id.unwrap_or_default(),
        );
        record.company_id = stored.company_id;
        record.query = stored.query;
        record.status = stored.status;
        record.metadata = stored.metadata.unwrap_or_default();
        record
    }
}

impl From<AnalysisRecord> for StoredAnalysis {
    fn from(record: AnalysisRecord) -> Self {
        Self {
            ticket_id: (!record.ticket_id.is_empty()).then_some(record.ticket_id),
            company_id: record.company_id,
            query: record.query,
            status: record.status,
            metadata: Some(record.metadata),
            final_report: Some(FinalReport {
                executive_summary: record.executive_summary,
                issues: record.issues,
                implementation_plan: record.implementation_plan,
                cross_team_initiatives: record.cross_team_initiatives,
            }),
        }
    }
}

impl AnalysisRecord {
    /// Build a record from a freshly produced report, e.g. the result of an
    /// upload. The ticket-level status starts out derived from the tasks.
    pub fn from_report(report: FinalReport, ticket_id: impl Into<String>) -> Self {
        let status = StatusCounts::from_issues(&report.issues).overall(OverallStatus::New);
        Self {
            ticket_id: ticket_id.into(),
            company_id: None,
            query: None,
            status,
            metadata: RecordMetadata::default(),
            executive_summary: report.executive_summary,
            issues: report.issues,
            implementation_plan: report.implementation_plan,
            cross_team_initiatives: report.cross_team_initiatives,
        }
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::from_issues(&self.issues)
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .saved_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_defaults_fill_missing_fields() {
        let issue: Issue = serde_json::from_value(json!({})).unwrap();
        assert_eq!(issue.issue_type, "Untitled Issue");
        assert_eq!(issue.description, "No description available");
        assert_eq!(issue.responsible_team, "Unassigned");
        assert_eq!(issue.resolution_strategy, "Not specified");
        assert_eq!(issue.timeline, "Not specified");
        assert_eq!(issue.criticality, Criticality::Medium);
        assert_eq!(issue.status, TaskStatus::New);
        assert!(issue.tags.is_empty());
    }

    #[test]
    fn test_issue_nulls_and_blanks_take_defaults() {
        let issue: Issue = serde_json::from_value(json!({
            "issue_type": null,
            "description": "   ",
            "tags": null,
            "criticality": "HIGH",
            "status": "resolved"
        }))
        .unwrap();
        assert_eq!(issue.issue_type, "Untitled Issue");
        assert_eq!(issue.description, "No description available");
        assert!(issue.tags.is_empty());
        assert_eq!(issue.criticality, Criticality::High);
        assert_eq!(issue.status, TaskStatus::Resolved);
    }

    #[test]
    fn test_record_parses_stored_shape() {
        let record: AnalysisRecord = serde_json::from_value(json!({
            "ticket_id": "acme_1700000000",
            "company_id": "acme",
            "status": "processing",
            "metadata": { "saved_at": 1700000000 },
            "final_report": {
                "executive_summary": "Checkout is slow",
                "issues": [
                    { "issue_type": "Bug", "criticality": "High", "status": "new" },
                    { "issue_type": "UX", "status": "resolved" }
                ],
                "implementation_plan": { "immediate_actions": ["Profile checkout"] },
                "cross_team_initiatives": [ { "teams_involved": ["web", "infra"] } ]
            }
        }))
        .unwrap();

        assert_eq!(record.ticket_id, "acme_1700000000");
        assert_eq!(record.status, OverallStatus::Processing);
        assert_eq!(record.issues.len(), 2);
        assert_eq!(record.implementation_plan.immediate_actions.len(), 1);
        assert_eq!(record.cross_team_initiatives[0].name, "Untitled Initiative");
        assert!(record.saved_at().is_some());
    }

    #[test]
    fn test_record_missing_report_is_empty() {
        let record: AnalysisRecord = serde_json::from_value(json!({ "ticket_id": "t" })).unwrap();
        assert_eq!(record.executive_summary, "No summary available");
        assert!(record.issues.is_empty());
        assert!(record.implementation_plan.is_empty());
    }

    #[test]
    fn test_export_shape_reparses_identically() {
        let record: AnalysisRecord = serde_json::from_value(json!({
            "ticket_id": "abc123",
            "query": "What hurts?",
            "final_report": {
                "executive_summary": "X",
                "issues": [ { "issue_type": "Bug", "criticality": "high", "tags": ["perf"] } ],
                "implementation_plan": {},
                "cross_team_initiatives": []
            }
        }))
        .unwrap();

        let text = serde_json::to_string_pretty(&record).unwrap();
        let back: AnalysisRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_from_report_derives_status() {
        let report = FinalReport {
            issues: vec![Issue {
                status: TaskStatus::Resolved,
                ..Issue::default()
            }],
            ..FinalReport::default()
        };
        let record = AnalysisRecord::from_report(report, "");
        assert_eq!(record.status, OverallStatus::Resolved);
        assert!(record.ticket_id.is_empty());
    }
}
