//! Upload-and-analyze command (`kollab analyze`).

use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use kollab::client::UploadRequest;
use kollab::config::KollabConfig;
use kollab::events::{EventFeed, PushEvent};
use kollab::render::{IssueFilter, record_view};
use kollab::session::AnalysisSession;
use kollab::ui::AnalysisUi;
use kollab::ui::icons::{EXPORT, LINK, SAVED};

/// How long to wait for the push-event connection before running without it.
const FEED_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct AnalyzeArgs {
    pub file: PathBuf,
    pub query: Option<String>,
    pub save: bool,
    pub open: bool,
    pub export: Option<PathBuf>,
}

fn closed_feed() -> mpsc::Receiver<PushEvent> {
    let (_tx, rx) = mpsc::channel(1);
    rx
}

/// Subscribe to live progress. A run works without it, the bar just jumps
/// to 100% at the end.
async fn connect_feed(config: &KollabConfig) -> mpsc::Receiver<PushEvent> {
    let url = match config.events_ws_url() {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "live progress unavailable");
            return closed_feed();
        }
    };
    match tokio::time::timeout(FEED_CONNECT_TIMEOUT, EventFeed::connect(&url)).await {
        Ok(Ok(events)) => events,
        Ok(Err(e)) => {
            tracing::warn!(error = %format!("{:#}", e), "live progress unavailable");
            closed_feed()
        }
        Err(_) => {
            tracing::warn!(%url, "timed out connecting to event stream");
            closed_feed()
        }
    }
}

pub async fn cmd_analyze(config: &KollabConfig, args: AnalyzeArgs) -> Result<()> {
    let company_id = config.company_id().unwrap_or_default();
    let query = args.query.clone().unwrap_or_else(|| config.query());
    let request = UploadRequest::new(args.file.clone(), company_id.clone())
        .with_query(query)
        .with_save(args.save && config.save_analysis());

    let ui = Arc::new(if console::Term::stdout().is_term() {
        AnalysisUi::new()
    } else {
        AnalysisUi::hidden()
    });
    let client = config.http_client()?;
    let mut session =
        AnalysisSession::new(Arc::new(client), config.tracker()?).with_observer(ui.clone());

    let file_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| args.file.display().to_string());
    ui.start(&file_name);

    let events = connect_feed(config).await;
    let outcome = session
        .run(&request, events)
        .await
        .context("Analysis failed")?;

    println!();
    println!("{}", record_view(&outcome.record, &IssueFilter::default()));

    let dashboard = config.dashboard_url(&company_id)?;
    if let Some(ticket) = &outcome.saved_ticket {
        println!(
            "{}Analysis saved as Ticket #{}",
            SAVED,
            style(ticket).green().bold()
        );
        println!("{}View dashboard: {}", LINK, style(dashboard.as_str()).cyan());
    }

    if let Some(dir) = &args.export {
        let path = kollab::export::write(&outcome.record, dir)?;
        println!("{}Exported to {}", EXPORT, path.display());
    }

    if args.open
        && let Err(e) = open::that(dashboard.as_str())
    {
        eprintln!("Failed to open browser: {}", e);
    }

    Ok(())
}
