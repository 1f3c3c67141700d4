// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine configuration, loaded from an optional TOML file

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// What the session does when its AI collaborator fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineFailurePolicy {
    /// Leave the turn stalled; the bot's clock keeps running
    Stall,
    /// Resign the bot's seat immediately
    Forfeit,
}

/// Engine-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long terminal sessions stay resident before eviction, in seconds
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    /// Policy applied when the AI move provider is unavailable
    #[serde(default = "default_failure_policy")]
    pub engine_failure_policy: EngineFailurePolicy,
    /// Buffer size for session event broadcast channels
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_retention_secs() -> u64 {
    300
}

fn default_failure_policy() -> EngineFailurePolicy {
    EngineFailurePolicy::Stall
}

fn default_event_buffer() -> usize {
    100
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
            engine_failure_policy: default_failure_policy(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl EngineConfig {
    /// Retention window as a duration
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}
