//! Configuration types.
//!
//! Hosts hand the guard a flat key/value document (the plugin config).
//! Rule collections arrive as raw JSON text and are parsed later by the
//! loader; delay settings are read once here.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rules::RuleRole;

/// Text used when a rule collection key is missing.
pub const EMPTY_RULES: &str = "[]";

/// Default lower bound for the post-match delay, in seconds.
const DEFAULT_DELAY_MIN_SECONDS: f64 = 1.0;

/// Default upper bound for the post-match delay, in seconds.
const DEFAULT_DELAY_MAX_SECONDS: f64 = 3.0;

/// Somewhere raw rule text can be looked up by key.
pub trait ConfigSource: Send + Sync {
    /// Return the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Raw rule text for a role, defaulting to an empty array.
    fn rules_json(&self, role: RuleRole) -> String {
        self.get(role.config_key())
            .unwrap_or_else(|| EMPTY_RULES.to_string())
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Delay applied after a reported-error match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayConfig {
    pub enabled: bool,
    pub min_seconds: f64,
    pub max_seconds: f64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_seconds: DEFAULT_DELAY_MIN_SECONDS,
            max_seconds: DEFAULT_DELAY_MAX_SECONDS,
        }
    }
}

/// Guard configuration, shaped like the host's plugin config document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Whether a reported-error match delays delivery.
    pub delay_enabled: bool,
    /// Lower bound of the random delay.
    pub delay_min_seconds: f64,
    /// Upper bound of the random delay.
    pub delay_max_seconds: f64,
    /// Raw JSON for the silent rule set.
    pub silent_replacement_mappings_json: Option<String>,
    /// Raw JSON for the reported rule set.
    pub error_mappings_json: Option<String>,
    /// Raw JSON for the fallback rule set.
    pub fallback_mappings_json: Option<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            delay_enabled: false,
            delay_min_seconds: DEFAULT_DELAY_MIN_SECONDS,
            delay_max_seconds: DEFAULT_DELAY_MAX_SECONDS,
            silent_replacement_mappings_json: None,
            error_mappings_json: None,
            fallback_mappings_json: None,
        }
    }
}

impl GuardConfig {
    /// Build a config from `IMMERSIVE_*` environment variables.
    ///
    /// Unparseable numbers and booleans fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let delay_enabled = std::env::var("IMMERSIVE_DELAY_ENABLED")
            .ok()
            .and_then(|s| parse_bool(&s))
            .unwrap_or(defaults.delay_enabled);

        let delay_min_seconds: f64 = std::env::var("IMMERSIVE_DELAY_MIN_SECONDS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.delay_min_seconds);

        let delay_max_seconds: f64 = std::env::var("IMMERSIVE_DELAY_MAX_SECONDS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.delay_max_seconds);

        Self {
            delay_enabled,
            delay_min_seconds,
            delay_max_seconds,
            silent_replacement_mappings_json: std::env::var("IMMERSIVE_SILENT_MAPPINGS_JSON").ok(),
            error_mappings_json: std::env::var("IMMERSIVE_ERROR_MAPPINGS_JSON").ok(),
            fallback_mappings_json: std::env::var("IMMERSIVE_FALLBACK_MAPPINGS_JSON").ok(),
        }
    }

    /// Parse a plugin config document. Unknown keys are ignored.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config)
    }

    /// Read and parse a plugin config document from disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Delay settings snapshot.
    pub fn delay(&self) -> DelayConfig {
        DelayConfig {
            enabled: self.delay_enabled,
            min_seconds: self.delay_min_seconds,
            max_seconds: self.delay_max_seconds,
        }
    }
}

impl ConfigSource for GuardConfig {
    fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "silent_replacement_mappings_json" => &self.silent_replacement_mappings_json,
            "error_mappings_json" => &self.error_mappings_json,
            "fallback_mappings_json" => &self.fallback_mappings_json,
            _ => return None,
        };
        value.clone()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
