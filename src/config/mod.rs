//! Typed queue configuration.
//!
//! Loaded from environment variables or a TOML file. Every setting is
//! optional; a value that is present but malformed fails fast.

use std::hash::Hash;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::merge::MergePolicy;
use crate::queue::{BoxedMerge, UniqueQueue};
use crate::telemetry::TelemetryConfig;

pub const POLICY_VAR: &str = "UNIQ_QUEUE_MERGE_POLICY";
pub const CAPACITY_VAR: &str = "UNIQ_QUEUE_INITIAL_CAPACITY";
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    pub policy: MergePolicy,
    pub initial_capacity: usize,
    pub log_level: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            policy: MergePolicy::RetainNew,
            initial_capacity: 0,
            log_level: "info".to_string(),
        }
    }
}

/// Top-level TOML wrapper.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    queue: QueueConfig,
}

impl QueueConfig {
    /// Load configuration from environment variables.
    ///
    /// In local dev, use [`QueueConfig::from_dotenv`] to pick up a `.env`
    /// file first.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let policy = match optional_var(POLICY_VAR) {
            Some(raw) => raw.parse()?,
            None => defaults.policy,
        };

        let initial_capacity = match optional_var(CAPACITY_VAR) {
            Some(raw) => raw.trim().parse().map_err(|e| {
                Error::Config(format!("{CAPACITY_VAR} must be a non-negative integer: {e}"))
            })?,
            None => defaults.initial_capacity,
        };

        Ok(Self {
            policy,
            initial_capacity,
            log_level: optional_var(LOG_LEVEL_VAR).unwrap_or(defaults.log_level),
        })
    }

    /// Load a `.env` file if one exists, then read the environment.
    pub fn from_dotenv() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load variables from a specific env file, then read the environment.
    ///
    /// Variables already set in the process take precedence over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        dotenvy::from_path(path)
            .map_err(|e| Error::Config(format!("bad env file {}: {e}", path.display())))?;
        Self::from_env()
    }

    /// Parse the `[queue]` table of a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| Error::Config(format!("bad queue config: {e}")))?;
        Ok(file.queue)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("bad queue config {}: {e}", path.display())))?;
        Ok(file.queue)
    }

    /// Build an empty queue with the configured policy and capacity.
    pub fn build_queue<K, V>(&self) -> UniqueQueue<K, V>
    where
        K: Eq + Hash + Clone,
        V: 'static,
    {
        let policy = self.policy;
        let merge: BoxedMerge<V> = Box::new(move |old, new| policy.merge(old, new));
        UniqueQueue::with_capacity(self.initial_capacity, merge)
    }
}

impl From<&QueueConfig> for TelemetryConfig {
    fn from(config: &QueueConfig) -> Self {
        Self {
            log_level: Some(config.log_level.clone()),
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
