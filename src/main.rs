use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use kollab::config::{CliOverrides, KollabConfig};
use kollab::render::CriticalityTab;
use kollab_common::{OverallStatus, TaskStatus};

mod cmd;

#[derive(Parser)]
#[command(name = "kollab")]
#[command(version, about = "Upload customer feedback for analysis and track the resulting tasks")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Backend URL. Overrides kollab.toml and KOLLAB_SERVER_URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Company ID. Overrides kollab.toml and KOLLAB_COMPANY_ID
    #[arg(long, global = true)]
    pub company: Option<String>,

    /// Path to kollab.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a feedback file and run the analysis with live progress
    Analyze {
        /// CSV or JSON feedback file
        file: PathBuf,

        /// Question for the analysts (defaults to a general review)
        #[arg(short, long)]
        query: Option<String>,

        /// Do not store the result as a ticket
        #[arg(long)]
        no_save: bool,

        /// Open the company dashboard in the browser when done
        #[arg(long)]
        open: bool,

        /// Also write the result as JSON into this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Show a stored analysis
    Show {
        ticket: String,

        /// Criticality tab: all, low, medium, high, critical
        #[arg(long, default_value = "all")]
        tab: CriticalityTab,

        /// Filter issues by title, description or task id
        #[arg(short, long)]
        search: Option<String>,

        /// Only list tasks with their status
        #[arg(long)]
        tasks: bool,
    },
    /// Change the status of one task
    Task {
        ticket: String,

        /// Task position as shown by `kollab show` (e.g. 0 for #0)
        index: usize,

        /// new, processing or resolved. Prompts when omitted
        status: Option<TaskStatus>,
    },
    /// Set the ticket-level status
    TicketStatus {
        ticket: String,

        /// new, processing, resolved or failed
        status: OverallStatus,
    },
    /// Write a stored analysis to analysis-<ticket>.json
    Export {
        ticket: String,

        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// View, create or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the resolved configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default kollab.toml in the current directory
    Init,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };
    // Logs go to stderr so progress bars on stdout stay intact.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let overrides = CliOverrides {
        server_url: cli.server.clone(),
        company_id: cli.company.clone(),
    };
    let config_path = cli.config.as_deref();

    let load = || KollabConfig::load(config_path, overrides.clone());

    match &cli.command {
        Commands::Analyze {
            file,
            query,
            no_save,
            open,
            export,
        } => {
            cmd::cmd_analyze(
                &load()?,
                cmd::AnalyzeArgs {
                    file: file.clone(),
                    query: query.clone(),
                    save: !*no_save,
                    open: *open,
                    export: export.clone(),
                },
            )
            .await?
        }
        Commands::Show {
            ticket,
            tab,
            search,
            tasks,
        } => cmd::cmd_show(&load()?, ticket, *tab, search.as_deref(), *tasks).await?,
        Commands::Task {
            ticket,
            index,
            status,
        } => cmd::cmd_task(&load()?, ticket, *index, *status).await?,
        Commands::TicketStatus { ticket, status } => {
            cmd::cmd_ticket_status(&load()?, ticket, *status).await?
        }
        Commands::Export { ticket, out } => cmd::cmd_export(&load()?, ticket, out).await?,
        Commands::Config { command } => {
            cmd::cmd_config(config_path, overrides.clone(), command.clone())?
        }
    }

    Ok(())
}
