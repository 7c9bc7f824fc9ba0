//! Layered configuration for the Kollab client.
//!
//! Values are resolved file → environment → CLI, later layers winning.
//! The file is `kollab.toml`, looked up at `--config`, then in the working
//! directory, then in the user config directory (`~/.config/kollab/`).
//! A `.env` file in the working directory is loaded into the environment
//! before the environment layer is read.
//!
//! ```toml
//! [server]
//! base_url = "http://localhost:5000"
//! events_url = "http://localhost:5000"
//! routes = "db"
//!
//! [defaults]
//! company_id = "acme"
//! query = "What are users most frustrated by?"
//! save_analysis = true
//!
//! [[progress.stages]]
//! id = "upload"
//! weight = 10
//! keywords = ["Processing file", "File processed", "Retrieving data"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::{DEFAULT_QUERY, HttpClient, RouteFamily};
use crate::events::socket_io_url;
use crate::progress::{ProgressTracker, StageConfig, default_stages};

pub const CONFIG_FILE: &str = "kollab.toml";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

pub const ENV_SERVER_URL: &str = "KOLLAB_SERVER_URL";
pub const ENV_EVENTS_URL: &str = "KOLLAB_EVENTS_URL";
pub const ENV_COMPANY_ID: &str = "KOLLAB_COMPANY_ID";

// ── File layer ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Push-event endpoint; defaults to the server URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_url: Option<String>,
    #[serde(default)]
    pub routes: RouteFamily,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default = "default_save_analysis")]
    pub save_analysis: bool,
}

fn default_save_analysis() -> bool {
    true
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            company_id: None,
            query: None,
            save_analysis: default_save_analysis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSection {
    #[serde(default = "default_stages")]
    pub stages: Vec<StageConfig>,
}

impl Default for ProgressSection {
    fn default() -> Self {
        Self {
            stages: default_stages(),
        }
    }
}

/// Parsed `kollab.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KollabToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub defaults: DefaultsSection,
    #[serde(default)]
    pub progress: ProgressSection,
}

impl KollabToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse kollab.toml")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize kollab.toml")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

/// Where `kollab.toml` lives, if anywhere.
///
/// An explicit path is returned as is so a missing file is reported rather
/// than silently skipped.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("kollab").join(CONFIG_FILE))
        .filter(|path| path.is_file())
}

// ── Environment and CLI layers ───────────────────────────────────────

/// Values taken from `KOLLAB_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub server_url: Option<String>,
    pub events_url: Option<String>,
    pub company_id: Option<String>,
}

impl EnvOverrides {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            server_url: var(ENV_SERVER_URL),
            events_url: var(ENV_EVENTS_URL),
            company_id: var(ENV_COMPANY_ID),
        }
    }
}

/// Global flags that override configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub server_url: Option<String>,
    pub company_id: Option<String>,
}

// ── Resolved configuration ───────────────────────────────────────────

/// Outcome of [`KollabConfig::validate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct KollabConfig {
    /// File the file layer came from, if any.
    pub path: Option<PathBuf>,
    pub toml: KollabToml,
    pub env: EnvOverrides,
    pub cli: CliOverrides,
}

impl KollabConfig {
    /// Resolve all layers for a CLI invocation.
    pub fn load(explicit: Option<&Path>, cli: CliOverrides) -> Result<Self> {
        let path = find_config_file(explicit);
        let toml = match &path {
            Some(path) => KollabToml::load(path)?,
            None => KollabToml::default(),
        };
        tracing::debug!(path = ?path, "configuration file resolved");
        Ok(Self {
            path,
            toml,
            env: EnvOverrides::from_env(),
            cli,
        })
    }

    fn pick(layers: [Option<&String>; 3]) -> Option<String> {
        layers
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Server URL (CLI → env → file → default).
    pub fn server_url(&self) -> String {
        Self::pick([
            self.cli.server_url.as_ref(),
            self.env.server_url.as_ref(),
            self.toml.server.base_url.as_ref(),
        ])
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    /// Push-event URL (env → file → server URL).
    pub fn events_url(&self) -> String {
        Self::pick([
            self.env.events_url.as_ref(),
            self.toml.server.events_url.as_ref(),
            None,
        ])
        .unwrap_or_else(|| self.server_url())
    }

    /// Company id (CLI → env → file). `None` when nothing is configured.
    pub fn company_id(&self) -> Option<String> {
        Self::pick([
            self.cli.company_id.as_ref(),
            self.env.company_id.as_ref(),
            self.toml.defaults.company_id.as_ref(),
        ])
    }

    pub fn query(&self) -> String {
        self.toml
            .defaults
            .query
            .clone()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_QUERY.to_string())
    }

    pub fn save_analysis(&self) -> bool {
        self.toml.defaults.save_analysis
    }

    pub fn routes(&self) -> RouteFamily {
        self.toml.server.routes
    }

    pub fn base_url(&self) -> Result<Url> {
        let raw = self.server_url();
        let url = Url::parse(&raw).with_context(|| format!("Invalid server URL: {}", raw))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => anyhow::bail!("Unsupported server URL scheme '{}' in {}", other, raw),
        }
    }

    /// Web dashboard for a company, `{server}/dashboard/{company}`.
    pub fn dashboard_url(&self, company_id: &str) -> Result<Url> {
        let mut url = self.base_url()?;
        let raw = url.to_string();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Server URL cannot be a base: {}", raw))?
            .pop_if_empty()
            .extend(["dashboard", company_id.trim()]);
        Ok(url)
    }

    pub fn events_ws_url(&self) -> Result<Url> {
        socket_io_url(&self.events_url())
    }

    pub fn http_client(&self) -> Result<HttpClient> {
        Ok(HttpClient::new(self.base_url()?, self.routes()))
    }

    pub fn tracker(&self) -> Result<ProgressTracker> {
        ProgressTracker::new(self.toml.progress.stages.clone())
            .context("Invalid [progress] configuration")
    }

    pub fn validate(&self) -> Validation {
        let mut report = Validation::default();

        if let Err(e) = self.base_url() {
            report.errors.push(format!("{:#}", e));
        }
        if let Err(e) = self.events_ws_url() {
            report.errors.push(format!("{:#}", e));
        }
        if let Err(e) = ProgressTracker::new(self.toml.progress.stages.clone()) {
            report.errors.push(format!("[progress] {}", e));
        }
        for stage in &self.toml.progress.stages {
            if stage.keywords.iter().all(|k| k.trim().is_empty()) {
                report.warnings.push(format!(
                    "Stage '{}' has no keywords and will only complete when a run finishes",
                    stage.id
                ));
            }
        }
        if self.company_id().is_none() {
            report.warnings.push(format!(
                "No company id configured: set [defaults] company_id, {} or pass --company",
                ENV_COMPANY_ID
            ));
        }

        report
    }
}
