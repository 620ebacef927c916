//! Engine configuration, loaded from `wirestate.json`.
//!
//! Every field has a default, so a missing or partial file is fine.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::entities::TriggerKind;
use crate::synth::settle::SettlePolicy;

/// Config file name looked up by `paths::config_file`
pub const CONFIG_FILE: &str = "wirestate.json";

/// Default namespace when the request names no group
pub const DEFAULT_NAMESPACE: &str = "State Machine Variables";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Namespace used when the inbound message has no first element type
    pub default_namespace: String,
    /// Polls per cell between allocation and binding
    pub settle_attempts: u32,
    /// Sleep between polls
    pub settle_interval_ms: u64,
    /// Event kind of synthesized reactions
    pub trigger: TriggerKind,
    /// Retry a refused reaction with a single write
    pub minimal_fallback: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            settle_attempts: 20,
            settle_interval_ms: 25,
            trigger: TriggerKind::Click,
            minimal_fallback: true,
        }
    }
}

impl SynthConfig {
    pub fn settle_policy(&self) -> SettlePolicy {
        SettlePolicy {
            attempts: self.settle_attempts,
            interval: Duration::from_millis(self.settle_interval_ms),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse config JSON")
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = Self::from_json(&json)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
