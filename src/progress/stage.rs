use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::StageConfigError;

/// Static description of one pipeline stage, as written in `kollab.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub id: String,
    pub weight: u32,
    /// Substrings that mark this stage as reached. Case-sensitive.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl StageConfig {
    pub fn new(id: &str, weight: u32, keywords: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            weight,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn matches(&self, message: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && message.contains(k.as_str()))
    }
}

/// Upload 10 / Scout 45 / Analyst 45, keyed on the backend's status wording.
pub fn default_stages() -> Vec<StageConfig> {
    vec![
        StageConfig::new(
            "upload",
            10,
            &["Processing file", "File processed", "Retrieving data"],
        ),
        StageConfig::new("scout", 45, &["Scout", "scout"]),
        StageConfig::new("analyst", 45, &["Analyst", "analyst"]),
    ]
}

/// Check a stage list before a tracker is built from it.
pub(crate) fn validate(configs: &[StageConfig]) -> Result<(), StageConfigError> {
    if configs.is_empty() {
        return Err(StageConfigError::Empty);
    }
    let mut seen = HashSet::new();
    for config in configs {
        if config.weight == 0 {
            return Err(StageConfigError::ZeroWeight {
                id: config.id.clone(),
            });
        }
        if !seen.insert(config.id.as_str()) {
            return Err(StageConfigError::DuplicateId {
                id: config.id.clone(),
            });
        }
    }
    Ok(())
}

/// Runtime state of a stage within one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub config: StageConfig,
    pub completed: bool,
}

impl Stage {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn weight(&self) -> u32 {
        self.config.weight
    }
}
