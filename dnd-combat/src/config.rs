//! Encounter configuration.

use crate::condition::ReapplyPolicy;
use crate::dice::DieType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Table rules for one encounter.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```
/// use dnd_combat::{EncounterConfig, ReapplyPolicy};
///
/// let config = EncounterConfig::from_json_str(r#"{ "reapply_policy": "stack" }"#).unwrap();
/// assert_eq!(config.reapply_policy, ReapplyPolicy::Stack);
/// assert!(config.critical_rules);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// How a repeat application of a present condition is handled.
    pub reapply_policy: ReapplyPolicy,

    /// Die rolled for engine-controlled initiative.
    pub initiative_die: DieType,

    /// Natural 20 always hits (and doubles damage dice), natural 1 always misses.
    pub critical_rules: bool,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            reapply_policy: ReapplyPolicy::Refresh,
            initiative_die: DieType::D20,
            critical_rules: true,
        }
    }
}

impl EncounterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn with_reapply_policy(mut self, policy: ReapplyPolicy) -> Self {
        self.reapply_policy = policy;
        self
    }

    pub fn with_initiative_die(mut self, die: DieType) -> Self {
        self.initiative_die = die;
        self
    }

    pub fn with_critical_rules(mut self, enabled: bool) -> Self {
        self.critical_rules = enabled;
        self
    }
}
