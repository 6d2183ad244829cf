//! Configuration loading from TOML files
//!
//! Config file is selected via the --config command line argument,
//! defaulting to config/dev.toml. A missing or unparsable file falls
//! back to built-in defaults with a warning.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Payload shape for end-of-touch emissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitMode {
    /// pushBubble(x, y, radius, station_id) on end_touch
    Coordinates,
    /// vote_start(station_id) / vote_end(station_id) transition pair
    IdOnly,
}

/// Policy for duplicate (source, choice) pairs in the station file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Load fails; duplicate keys indicate corrupt configuration
    Reject,
    /// Last record wins, logged per overwritten key
    Overwrite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationsConfig {
    #[serde(default = "default_stations_file")]
    pub file: String,
    #[serde(default = "default_on_duplicate")]
    pub on_duplicate: DuplicatePolicy,
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self { file: default_stations_file(), on_duplicate: default_on_duplicate() }
    }
}

fn default_stations_file() -> String {
    "config/stations.json".to_string()
}

fn default_on_duplicate() -> DuplicatePolicy {
    DuplicatePolicy::Reject
}

#[derive(Debug, Clone, Deserialize)]
pub struct TouchConfig {
    /// Touch duration at which the radius saturates
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u64,
    /// Radius for a zero-length touch (pixels)
    #[serde(default = "default_min_radius")]
    pub min_radius: f64,
    /// Radius for a saturated touch (pixels)
    #[serde(default = "default_max_radius")]
    pub max_radius: f64,
    #[serde(default = "default_emit_mode")]
    pub emit_mode: EmitMode,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            max_duration_ms: default_max_duration_ms(),
            min_radius: default_min_radius(),
            max_radius: default_max_radius(),
            emit_mode: default_emit_mode(),
        }
    }
}

fn default_max_duration_ms() -> u64 {
    5000
}

fn default_min_radius() -> f64 {
    5.0
}

fn default_max_radius() -> f64 {
    15.0
}

fn default_emit_mode() -> EmitMode {
    EmitMode::Coordinates
}

#[derive(Debug, Clone, Deserialize)]
pub struct UdpConfig {
    /// Station firmware sends datagrams to this port
    #[serde(default = "default_udp_port")]
    pub port: u16,
    #[serde(default = "default_udp_enabled")]
    pub enabled: bool,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self { port: default_udp_port(), enabled: default_udp_enabled() }
    }
}

fn default_udp_port() -> u16 {
    3333
}

fn default_udp_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeatsConfig {
    /// A source with no beat for this long is reported stale
    #[serde(default = "default_beat_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_beat_check_interval_secs")]
    pub check_interval_secs: u64,
}

impl Default for BeatsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_beat_timeout_ms(),
            check_interval_secs: default_beat_check_interval_secs(),
        }
    }
}

fn default_beat_timeout_ms() -> u64 {
    15000
}

fn default_beat_check_interval_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteLogConfig {
    /// File path for the touch event log (JSONL format)
    #[serde(default = "default_vote_log_file")]
    pub file: String,
}

impl Default for VoteLogConfig {
    fn default() -> Self {
        Self { file: default_vote_log_file() }
    }
}

fn default_vote_log_file() -> String {
    "votelog.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmitConfig {
    /// Enable the emit channel and bubble writer
    #[serde(default = "default_emit_enabled")]
    pub enabled: bool,
    /// File path for emitted bubbles (JSONL format)
    #[serde(default = "default_emit_file")]
    pub file: String,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self { enabled: default_emit_enabled(), file: default_emit_file() }
    }
}

fn default_emit_enabled() -> bool {
    true
}

fn default_emit_file() -> String {
    "bubbles.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub stations: StationsConfig,
    #[serde(default)]
    pub touch: TouchConfig,
    #[serde(default)]
    pub udp: UdpConfig,
    #[serde(default)]
    pub beats: BeatsConfig,
    #[serde(default)]
    pub vote_log: VoteLogConfig,
    #[serde(default)]
    pub emit: EmitConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    stations_file: String,
    on_duplicate: DuplicatePolicy,
    max_duration_ms: u64,
    min_radius: f64,
    max_radius: f64,
    emit_mode: EmitMode,
    udp_port: u16,
    udp_enabled: bool,
    beat_timeout_ms: u64,
    beat_check_interval_secs: u64,
    vote_log_file: String,
    emit_enabled: bool,
    emit_file: String,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stations_file: default_stations_file(),
            on_duplicate: default_on_duplicate(),
            max_duration_ms: default_max_duration_ms(),
            min_radius: default_min_radius(),
            max_radius: default_max_radius(),
            emit_mode: default_emit_mode(),
            udp_port: default_udp_port(),
            udp_enabled: default_udp_enabled(),
            beat_timeout_ms: default_beat_timeout_ms(),
            beat_check_interval_secs: default_beat_check_interval_secs(),
            vote_log_file: default_vote_log_file(),
            emit_enabled: default_emit_enabled(),
            emit_file: default_emit_file(),
            metrics_interval_secs: default_metrics_interval(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self {
            stations_file: toml_config.stations.file,
            on_duplicate: toml_config.stations.on_duplicate,
            max_duration_ms: toml_config.touch.max_duration_ms,
            min_radius: toml_config.touch.min_radius,
            max_radius: toml_config.touch.max_radius,
            emit_mode: toml_config.touch.emit_mode,
            udp_port: toml_config.udp.port,
            udp_enabled: toml_config.udp.enabled,
            beat_timeout_ms: toml_config.beats.timeout_ms,
            beat_check_interval_secs: toml_config.beats.check_interval_secs,
            vote_log_file: toml_config.vote_log.file,
            emit_enabled: toml_config.emit.enabled,
            emit_file: toml_config.emit.file,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn stations_file(&self) -> &str {
        &self.stations_file
    }

    pub fn on_duplicate(&self) -> DuplicatePolicy {
        self.on_duplicate
    }

    pub fn max_duration_ms(&self) -> u64 {
        self.max_duration_ms
    }

    pub fn min_radius(&self) -> f64 {
        self.min_radius
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    pub fn emit_mode(&self) -> EmitMode {
        self.emit_mode
    }

    pub fn udp_port(&self) -> u16 {
        self.udp_port
    }

    pub fn udp_enabled(&self) -> bool {
        self.udp_enabled
    }

    pub fn beat_timeout_ms(&self) -> u64 {
        self.beat_timeout_ms
    }

    pub fn beat_check_interval_secs(&self) -> u64 {
        self.beat_check_interval_secs
    }

    pub fn vote_log_file(&self) -> &str {
        &self.vote_log_file
    }

    pub fn emit_enabled(&self) -> bool {
        self.emit_enabled
    }

    pub fn emit_file(&self) -> &str {
        &self.emit_file
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to shorten the saturation window
    #[cfg(test)]
    pub fn with_max_duration_ms(mut self, ms: u64) -> Self {
        self.max_duration_ms = ms;
        self
    }

    /// Builder method for tests to select the emit mode
    #[cfg(test)]
    pub fn with_emit_mode(mut self, mode: EmitMode) -> Self {
        self.emit_mode = mode;
        self
    }

    /// Builder method for tests to redirect the vote log
    #[cfg(test)]
    pub fn with_vote_log_file(mut self, file: &str) -> Self {
        self.vote_log_file = file.to_string();
        self
    }
}
