// src/config.rs

use crate::error::ConfigError;
use crate::types::{Lane, LaneId};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub lanes: Vec<Lane>,
    pub primary_lane: LaneId,
    #[serde(default)]
    pub timing: TimingConfig,
    pub serial: SerialConfig,
    pub probe: ProbeConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Added on top of the clamped green formula. Deployments wanting a
    /// longer floor set this instead of patching the formula.
    #[serde(default)]
    pub green_bias_secs: u64,
    /// How long to hold all-red before re-sampling when no traffic is seen.
    #[serde(default = "default_cooldown_secs")]
    pub all_red_cooldown_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            green_bias_secs: 0,
            all_red_cooldown_secs: default_cooldown_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Recorded per-lane count traces for the replay probe. Each sample advances
/// the trace by one entry; an exhausted trace rewinds, like a looped feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub traces: BTreeMap<LaneId, Vec<u32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Keep polling the probes once per second while a lane holds green.
    /// Display only; the active selection is never re-decided mid-dwell.
    #[serde(default = "default_true")]
    pub poll_during_green: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            poll_during_green: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default)]
    pub save: bool,
    #[serde(default = "default_events_path")]
    pub path: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            save: false,
            path: default_events_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_cooldown_secs() -> u64 {
    1
}

fn default_baud_rate() -> u32 {
    9_600
}

fn default_true() -> bool {
    true
}

fn default_events_path() -> String {
    "out/cycles.jsonl".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading config file {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Startup-only validation. Any failure here refuses to start the loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lanes.is_empty() {
            return Err(ConfigError::NoLanes);
        }

        let mut seen = BTreeSet::new();
        for lane in &self.lanes {
            if !seen.insert(lane.id) {
                return Err(ConfigError::DuplicateLane(lane.id));
            }
        }

        if !seen.contains(&self.primary_lane) {
            return Err(ConfigError::PrimaryNotConfigured(self.primary_lane));
        }

        Ok(())
    }

    pub fn lane_name(&self, id: LaneId) -> Option<&str> {
        self.lanes
            .iter()
            .find(|lane| lane.id == id)
            .map(|lane| lane.name.as_str())
    }
}
