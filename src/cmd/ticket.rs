//! Stored-ticket commands: `kollab show`, `task`, `ticket-status` and `export`.

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Select, theme::ColorfulTheme};
use std::path::Path;
use std::sync::Arc;

use kollab::config::KollabConfig;
use kollab::errors::{UpdateError, ValidationError};
use kollab::reconciler::StatusReconciler;
use kollab::render::{
    CriticalityTab, IssueFilter, record_view, status_counts, task_id, task_list,
};
use kollab::ui::TerminalSurface;
use kollab::ui::icons::EXPORT;
use kollab_common::{Issue, OverallStatus, TaskStatus};

fn reconciler(config: &KollabConfig, surface: TerminalSurface) -> Result<StatusReconciler> {
    let company_id = config
        .company_id()
        .ok_or(ValidationError::MissingCompanyId)?;
    let client = config.http_client()?;
    let reconciler = StatusReconciler::new(Arc::new(client), company_id);
    reconciler.subscribe(Arc::new(surface));
    Ok(reconciler)
}

pub async fn cmd_show(
    config: &KollabConfig,
    ticket: &str,
    tab: CriticalityTab,
    search: Option<&str>,
    tasks_only: bool,
) -> Result<()> {
    let reconciler = reconciler(config, TerminalSurface::quiet())?;
    let record = reconciler
        .load(ticket)
        .await
        .with_context(|| format!("Failed to load ticket {}", ticket))?;

    if tasks_only {
        print!("{}", task_list(&record));
        println!();
        println!("{}", status_counts(&record.counts()));
    } else {
        let filter = IssueFilter::new(tab, search.unwrap_or_default());
        println!("{}", record_view(&record, &filter));
    }
    Ok(())
}

fn prompt_status(index: usize, issue: &Issue) -> Result<TaskStatus> {
    let labels: Vec<&str> = TaskStatus::ALL.iter().map(|s| s.label()).collect();
    let current = TaskStatus::ALL
        .iter()
        .position(|s| *s == issue.status)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Status for {} {}", task_id(index), issue.issue_type))
        .items(&labels)
        .default(current)
        .interact()
        .context("No STATUS given and no terminal to prompt on")?;

    Ok(TaskStatus::ALL[selection])
}

pub async fn cmd_task(
    config: &KollabConfig,
    ticket: &str,
    index: usize,
    status: Option<TaskStatus>,
) -> Result<()> {
    let reconciler = reconciler(config, TerminalSurface::new())?;
    let record = reconciler
        .load(ticket)
        .await
        .with_context(|| format!("Failed to load ticket {}", ticket))?;

    let issue = record
        .issues
        .get(index)
        .ok_or(UpdateError::InvalidTaskIndex {
            index,
            len: record.issues.len(),
        })?;
    let status = match status {
        Some(status) => status,
        None => prompt_status(index, issue)?,
    };
    if status == issue.status {
        println!(
            "Task {} is already {}",
            task_id(index),
            style(status.label()).bold()
        );
        return Ok(());
    }

    reconciler
        .set_task_status(index, status)
        .await
        .context("Failed to update task status")?;
    Ok(())
}

pub async fn cmd_ticket_status(
    config: &KollabConfig,
    ticket: &str,
    status: OverallStatus,
) -> Result<()> {
    let reconciler = reconciler(config, TerminalSurface::new())?;
    reconciler
        .load(ticket)
        .await
        .with_context(|| format!("Failed to load ticket {}", ticket))?;
    reconciler
        .set_overall_status(status)
        .await
        .context("Failed to update ticket status")?;
    Ok(())
}

pub async fn cmd_export(config: &KollabConfig, ticket: &str, out: &Path) -> Result<()> {
    let reconciler = reconciler(config, TerminalSurface::quiet())?;
    let record = reconciler
        .load(ticket)
        .await
        .with_context(|| format!("Failed to load ticket {}", ticket))?;
    let path = kollab::export::write(&record, out)?;
    println!("{}Exported to {}", EXPORT, path.display());
    Ok(())
}
