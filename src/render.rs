//! Text projections of an analysis record.
//!
//! Every function here is pure: it reads a record (or a piece of one) and
//! returns a string for the terminal. Nothing holds on to the record, so a
//! re-render after a status change always reflects the live model.

use std::fmt;
use std::str::FromStr;

use console::{StyledObject, style};
use kollab_common::{
    AnalysisRecord, Criticality, Initiative, Issue, OverallStatus, Plan, StatusCounts, TaskStatus,
};

// ── Filtering ────────────────────────────────────────────────────────

/// Criticality tab of the issue list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CriticalityTab {
    #[default]
    All,
    Low,
    Medium,
    High,
    Critical,
}

impl CriticalityTab {
    pub const ALL: [CriticalityTab; 5] = [
        Self::All,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn matches(&self, criticality: Criticality) -> bool {
        match self {
            Self::All => true,
            Self::Low => criticality == Criticality::Low,
            Self::Medium => criticality == Criticality::Medium,
            Self::High => criticality == Criticality::High,
            Self::Critical => criticality == Criticality::Critical,
        }
    }
}

impl fmt::Display for CriticalityTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CriticalityTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!(
                "Invalid tab '{}'. Valid values: all, low, medium, high, critical",
                s
            )),
        }
    }
}

/// Tab plus free-text search over issue type, description and position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub tab: CriticalityTab,
    pub search: String,
}

impl IssueFilter {
    pub fn new(tab: CriticalityTab, search: impl Into<String>) -> Self {
        Self {
            tab,
            search: search.into(),
        }
    }

    pub fn matches(&self, index: usize, issue: &Issue) -> bool {
        if !self.tab.matches(issue.criticality) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        issue.issue_type.to_lowercase().contains(&needle)
            || issue.description.to_lowercase().contains(&needle)
            || task_id(index).contains(&needle)
    }

    /// Matching issues with their positional index into the record.
    pub fn apply<'a>(&self, issues: &'a [Issue]) -> Vec<(usize, &'a Issue)> {
        issues
            .iter()
            .enumerate()
            .filter(|(i, issue)| self.matches(*i, issue))
            .collect()
    }
}

/// Display id of a task. Position is the only identity a task has.
pub fn task_id(index: usize) -> String {
    format!("#{}", index)
}

// ── Badges ───────────────────────────────────────────────────────────

pub fn criticality_badge(criticality: Criticality) -> StyledObject<String> {
    let text = format!("[{}]", criticality.as_str());
    match criticality {
        Criticality::Low => style(text).green(),
        Criticality::Medium => style(text).yellow(),
        Criticality::High => style(text).red(),
        Criticality::Critical => style(text).red().bold().reverse(),
    }
}

pub fn status_badge(status: TaskStatus) -> StyledObject<String> {
    let text = format!("[{}]", status.label());
    match status {
        TaskStatus::New => style(text).blue(),
        TaskStatus::Processing => style(text).yellow(),
        TaskStatus::Resolved => style(text).green(),
    }
}

pub fn overall_badge(status: OverallStatus) -> StyledObject<String> {
    let text = format!("[{}]", status.label());
    match status {
        OverallStatus::New => style(text).blue(),
        OverallStatus::Processing => style(text).yellow(),
        OverallStatus::Resolved => style(text).green(),
        OverallStatus::Failed => style(text).red(),
    }
}

fn bullets(out: &mut String, items: &[String], indent: &str) {
    for item in items {
        out.push_str(&format!("{}• {}\n", indent, item));
    }
}

// ── Issues ───────────────────────────────────────────────────────────

/// Full card for one issue, as in the results panel.
pub fn issue_card(index: usize, issue: &Issue) -> String {
    let mut out = format!(
        "{} {} {} {}\n",
        style(task_id(index)).dim(),
        style(&issue.issue_type).bold(),
        criticality_badge(issue.criticality),
        status_badge(issue.status),
    );
    out.push_str(&format!("  {}\n", issue.description));
    out.push_str(&format!("  {} {}\n", style("Team:").bold(), issue.responsible_team));
    if !issue.tags.is_empty() {
        let tags: Vec<String> = issue
            .tags
            .iter()
            .map(|t| style(format!("#{}", t)).cyan().to_string())
            .collect();
        out.push_str(&format!("  {}\n", tags.join(" ")));
    }
    if !issue.sources.is_empty() {
        out.push_str(&format!("  {}\n", style("User Reports:").bold()));
        bullets(&mut out, &issue.sources, "    ");
    }
    if !issue.recommended_actions.is_empty() {
        out.push_str(&format!("  {}\n", style("Recommended Actions:").bold()));
        bullets(&mut out, &issue.recommended_actions, "    ");
    }
    out.push_str(&format!(
        "  {} {}\n",
        style("Resolution Strategy:").bold(),
        issue.resolution_strategy
    ));
    out.push_str(&format!("  {} {}\n", style("Timeline:").bold(), issue.timeline));
    out
}

/// Filtered issue cards, or the empty-state line for the active tab.
pub fn issue_list(record: &AnalysisRecord, filter: &IssueFilter) -> String {
    let matching = filter.apply(&record.issues);
    if matching.is_empty() {
        return format!("No {} priority issues found\n", filter.tab);
    }
    matching
        .into_iter()
        .map(|(i, issue)| issue_card(i, issue))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per task with its status badge, for the ticket detail view.
pub fn task_list(record: &AnalysisRecord) -> String {
    if record.issues.is_empty() {
        return "No tasks found\n".to_string();
    }
    let mut out = String::new();
    for (i, issue) in record.issues.iter().enumerate() {
        out.push_str(&format!(
            "{} {} {} {} {}\n",
            style(format!("{:>4}", task_id(i))).dim(),
            status_badge(issue.status),
            criticality_badge(issue.criticality),
            issue.issue_type,
            style(format!("({})", issue.responsible_team)).dim(),
        ));
    }
    out
}

pub fn status_counts(counts: &StatusCounts) -> String {
    format!(
        "{} {}  {} {}  {} {}",
        style("New").blue(),
        counts.new,
        style("Processing").yellow(),
        counts.processing,
        style("Resolved").green(),
        counts.resolved,
    )
}

// ── Plan and initiatives ─────────────────────────────────────────────

pub fn implementation_plan(plan: &Plan) -> String {
    if plan.is_empty() {
        return "No implementation plan available\n".to_string();
    }
    let sections = [
        ("Immediate Actions", &plan.immediate_actions),
        ("Short Term Actions (1-4 weeks)", &plan.short_term_actions),
        ("Long Term Actions (1-3 months)", &plan.long_term_actions),
    ];
    let mut out = String::new();
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("{}\n", style(title).bold().underlined()));
        bullets(&mut out, items, "  ");
    }
    out
}

pub fn initiatives(initiatives: &[Initiative]) -> String {
    if initiatives.is_empty() {
        return "No cross-team initiatives found\n".to_string();
    }
    let mut out = String::new();
    for initiative in initiatives {
        out.push_str(&format!("{}\n", style(&initiative.name).bold()));
        out.push_str(&format!("  {}\n", initiative.description));
        if !initiative.teams_involved.is_empty() {
            out.push_str(&format!(
                "  {} {}\n",
                style("Teams:").dim(),
                initiative.teams_involved.join(", ")
            ));
        }
    }
    out
}

// ── Whole record ─────────────────────────────────────────────────────

fn heading(title: &str) -> String {
    format!("\n{}\n", style(title).bold().cyan())
}

/// Everything the detail panel shows, top to bottom.
pub fn record_view(record: &AnalysisRecord, filter: &IssueFilter) -> String {
    let title = if record.ticket_id.is_empty() {
        "Analysis (unsaved)".to_string()
    } else {
        format!("Analysis #{}", record.ticket_id)
    };
    let mut out = format!("{} {}\n", style(title).bold(), overall_badge(record.status));
    if let Some(query) = &record.query {
        out.push_str(&format!("{} {}\n", style("Query:").dim(), query));
    }
    if let Some(saved) = record.saved_at() {
        out.push_str(&format!(
            "{} {}\n",
            style("Saved:").dim(),
            saved.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    out.push_str(&format!("{}\n", status_counts(&record.counts())));

    out.push_str(&heading("Executive Summary"));
    out.push_str(&format!("{}\n", record.executive_summary));

    let tab_label = if filter.tab == CriticalityTab::All {
        "Issues".to_string()
    } else {
        format!("Issues ({})", filter.tab)
    };
    out.push_str(&heading(&tab_label));
    out.push_str(&issue_list(record, filter));

    out.push_str(&heading("Implementation Plan"));
    out.push_str(&implementation_plan(&record.implementation_plan));

    out.push_str(&heading("Cross-Team Initiatives"));
    out.push_str(&initiatives(&record.cross_team_initiatives));
    out
}
