//! Configuration view and validation commands (`kollab config`).

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::super::ConfigCommands;

pub fn cmd_config(
    config_path: Option<&Path>,
    overrides: kollab::config::CliOverrides,
    command: Option<ConfigCommands>,
) -> Result<()> {
    use kollab::config::{CONFIG_FILE, KollabConfig, KollabToml};

    match command {
        None | Some(ConfigCommands::Show) => {
            let config = KollabConfig::load(config_path, overrides)?;

            println!();
            println!("Kollab Configuration");
            println!("====================");
            println!();

            match &config.path {
                Some(path) => println!("Config file: {}", path.display()),
                None => {
                    println!("No {} found, using defaults.", CONFIG_FILE);
                    println!("Run 'kollab config init' to create one.");
                }
            }
            println!();

            // Effective values (file, env and CLI layers merged)
            println!("[server]");
            println!("  base_url = \"{}\"", config.server_url());
            println!("  events_url = \"{}\"", config.events_url());
            println!("  routes = \"{}\"", config.routes().as_str());
            println!();

            println!("[defaults]");
            match config.company_id() {
                Some(company) => println!("  company_id = \"{}\"", company),
                None => println!("  company_id = (not set)"),
            }
            println!("  query = \"{}\"", config.query());
            println!("  save_analysis = {}", config.save_analysis());
            println!();

            println!("[progress]");
            for stage in &config.toml.progress.stages {
                println!(
                    "  {:<10} {:>3}%  {}",
                    stage.id,
                    stage.weight,
                    stage.keywords.join(", ")
                );
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let config = KollabConfig::load(config_path, overrides)?;
            let report = config.validate();

            if report.warnings.is_empty() && report.errors.is_empty() {
                println!("Configuration is valid.");
            }
            if !report.warnings.is_empty() {
                println!("Configuration warnings:");
                for warning in &report.warnings {
                    println!("  - {}", warning);
                }
            }
            if !report.errors.is_empty() {
                println!("Configuration errors:");
                for error in &report.errors {
                    println!("  - {}", error);
                }
            }
            println!();

            if !report.is_valid() {
                anyhow::bail!("Configuration has {} error(s)", report.errors.len());
            }
        }
        Some(ConfigCommands::Init) => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
            if path.exists() {
                println!("{} already exists at {}", CONFIG_FILE, path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            KollabToml::default().save(&path)?;

            println!("Created {} at {}", CONFIG_FILE, path.display());
            println!();
            println!("You can now customize:");
            println!("  - [server] base_url, events_url, routes");
            println!("  - [defaults] company_id, query, save_analysis");
            println!("  - [[progress.stages]] to retune the progress bar");
            println!();
        }
    }

    Ok(())
}
