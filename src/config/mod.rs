// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Configuration module

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::detection::DetectorConfig;
use crate::error::ConfigError;
use crate::video::SourceConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Log level
    pub log_level: String,

    /// Loop timing and simulation settings
    pub monitor: MonitorConfig,

    /// Sensor definitions, evaluated in this order on every poll
    pub sensors: Vec<SensorDefinition>,

    /// Detector selection
    pub detector: DetectorConfig,

    /// Frame source selection
    pub source: SourceConfig,

    /// Database configuration
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "HomeWatch".to_string(),
            log_level: "info".to_string(),
            monitor: MonitorConfig::default(),
            sensors: default_sensors(),
            detector: DetectorConfig::default(),
            source: SourceConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration text.
    ///
    /// Never fails: every section that is missing or malformed is replaced by
    /// its default and a warning is logged, so startup always proceeds.
    pub fn from_toml_str(content: &str) -> Self {
        let table: toml::Table = match content.parse() {
            Ok(table) => table,
            Err(e) => {
                warn!("Malformed configuration ({}); using built-in defaults", e);
                return Self::default();
            }
        };

        let defaults = Self::default();
        Self {
            app_name: string_field(&table, "app_name").unwrap_or(defaults.app_name),
            log_level: string_field(&table, "log_level").unwrap_or(defaults.log_level),
            monitor: section(&table, "monitor"),
            sensors: sensor_section(&table),
            detector: section(&table, "detector"),
            source: section(&table, "source"),
            database: section(&table, "database"),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content);
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load configuration, falling back to defaults on any failure.
    ///
    /// A missing file is created with the defaults so it can be edited later.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No configuration at {:?}; using defaults", path);
            let config = Self::default();
            if let Err(e) = config.save(path) {
                warn!("Could not write default configuration to {:?}: {}", path, e);
            }
            return config;
        }

        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Could not read configuration {:?} ({}); using defaults", path, e);
                Self::default()
            }
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("homewatch"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

fn string_field(table: &toml::Table, key: &str) -> Option<String> {
    match table.get(key) {
        None => None,
        Some(toml::Value::String(s)) => Some(s.clone()),
        Some(other) => {
            warn!(
                "Configuration key `{}` must be a string, got {}; using default",
                key,
                other.type_str()
            );
            None
        }
    }
}

fn section<T: DeserializeOwned + Default>(table: &toml::Table, key: &str) -> T {
    match table.get(key) {
        None => T::default(),
        Some(value) => match value.clone().try_into::<T>() {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Invalid [{}] section ({}); using defaults", key, e);
                T::default()
            }
        },
    }
}

fn sensor_section(table: &toml::Table) -> Vec<SensorDefinition> {
    let Some(value) = table.get("sensors") else {
        info!("No sensors configured; using built-in default sensor set");
        return default_sensors();
    };

    let definitions: Vec<SensorDefinition> = match value.clone().try_into() {
        Ok(definitions) => definitions,
        Err(e) => {
            warn!("Malformed sensor definitions ({}); using built-in default sensor set", e);
            return default_sensors();
        }
    };

    match validate_sensors(&definitions) {
        Ok(()) => definitions,
        Err(e) => {
            warn!("{}; using built-in default sensor set", e);
            default_sensors()
        }
    }
}

/// Check a sensor list for the invariants the sensor set relies on
pub fn validate_sensors(definitions: &[SensorDefinition]) -> Result<(), ConfigError> {
    if definitions.is_empty() {
        return Err(ConfigError::Invalid("sensor list is empty".to_string()));
    }

    let mut seen = HashSet::new();
    for def in definitions {
        if def.name.trim().is_empty() {
            return Err(ConfigError::Invalid("sensor name must not be empty".to_string()));
        }
        if !seen.insert(def.name.as_str()) {
            return Err(ConfigError::Invalid(format!("duplicate sensor name `{}`", def.name)));
        }
        if !(0.0..=1.0).contains(&def.trigger_probability) {
            return Err(ConfigError::Invalid(format!(
                "sensor `{}` trigger_probability {} is outside [0, 1]",
                def.name, def.trigger_probability
            )));
        }
        if def.open_state_label.is_empty() || def.closed_label() == def.open_state_label {
            return Err(ConfigError::Invalid(format!(
                "sensor `{}` needs two distinct state labels",
                def.name
            )));
        }
        if def.initial_state != def.open_state_label && def.initial_state != def.closed_label() {
            return Err(ConfigError::Invalid(format!(
                "sensor `{}` initial_state `{}` is neither `{}` nor `{}`",
                def.name,
                def.initial_state,
                def.closed_label(),
                def.open_state_label
            )));
        }
    }

    Ok(())
}

/// Declarative description of one sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDefinition {
    /// Unique sensor name
    pub name: String,

    /// Chance per poll that the sensor changes state
    pub trigger_probability: f64,

    /// State label at startup
    pub initial_state: String,

    /// Critical sensors alert regardless of the armed state
    #[serde(default)]
    pub critical: bool,

    /// Label of the triggered state ("open", "smoke detected")
    pub open_state_label: String,

    /// Label of the resting state; defaults to `initial_state`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_state_label: Option<String>,
}

impl SensorDefinition {
    /// Sensor with distinct resting and triggered labels
    pub fn new(name: &str, trigger_probability: f64, closed: &str, open: &str) -> Self {
        Self {
            name: name.to_string(),
            trigger_probability,
            initial_state: closed.to_string(),
            critical: false,
            open_state_label: open.to_string(),
            closed_state_label: Some(closed.to_string()),
        }
    }

    /// Mark the sensor critical
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Resting-state label
    pub fn closed_label(&self) -> &str {
        match &self.closed_state_label {
            Some(label) => label,
            None if self.initial_state != self.open_state_label => &self.initial_state,
            None => "closed",
        }
    }

    /// Whether the sensor starts in its triggered state
    pub fn starts_open(&self) -> bool {
        self.initial_state == self.open_state_label
    }
}

/// Built-in sensor set used when configuration is absent or unusable
pub fn default_sensors() -> Vec<SensorDefinition> {
    vec![
        SensorDefinition::new("Front Door", 0.05, "closed", "open"),
        SensorDefinition::new("Back Door", 0.05, "closed", "open"),
        SensorDefinition::new("Living Room Window", 0.03, "closed", "open"),
        SensorDefinition::new("Hallway Motion", 0.1, "clear", "motion detected"),
        SensorDefinition::new("Smoke Detector", 0.01, "clear", "smoke detected").critical(),
    ]
}

/// Monitoring loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between sensor polls
    pub sensor_interval_ms: u64,

    /// Delay after a faulted sensor poll
    pub sensor_backoff_ms: u64,

    /// Per-frame processing budget (frame-rate ceiling)
    pub frame_budget_ms: u64,

    /// Re-analysis cadence for a static image
    pub static_frame_delay_ms: u64,

    /// Delay before retrying an unavailable frame source
    pub source_retry_ms: u64,

    /// Chance that an open sensor resets to its resting state when triggered
    pub reset_probability: f64,

    /// Seed for the simulation RNG; random when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,

    /// Annotated frames buffered per subscriber
    pub frame_channel_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sensor_interval_ms: 2000,
            sensor_backoff_ms: 5000,
            frame_budget_ms: 100,
            static_frame_delay_ms: 1000,
            source_retry_ms: 2000,
            reset_probability: 0.95,
            rng_seed: None,
            frame_channel_capacity: 16,
        }
    }
}

impl MonitorConfig {
    /// Wait between sensor polls
    pub fn sensor_interval(&self) -> Duration {
        Duration::from_millis(self.sensor_interval_ms)
    }

    /// Wait after a faulted poll
    pub fn sensor_backoff(&self) -> Duration {
        Duration::from_millis(self.sensor_backoff_ms)
    }

    /// Minimum time per detection iteration
    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    /// Extra wait after a static image frame
    pub fn static_frame_delay(&self) -> Duration {
        Duration::from_millis(self.static_frame_delay_ms)
    }

    /// Wait before reopening sources when none deliver
    pub fn source_retry(&self) -> Duration {
        Duration::from_millis(self.source_retry_ms)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database path
    pub path: PathBuf,

    /// Retention period in days
    pub retention_days: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/events.db"),
            retention_days: 30,
        }
    }
}
