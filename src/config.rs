// src/config.rs
//! Configuration file handling

use crate::{
    error::{GeofenceError, Result},
    geofence::Waypoint,
    gps::sampler::SamplerSettings,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeofenceConfig {
    pub gps_port: Option<String>,
    pub gps_baudrate: u32,
    pub notify_port: Option<String>, // stdout when unset
    pub notify_baudrate: u32,
    pub sample_count: usize,
    pub attempt_timeout_ms: u64,
    pub total_timeout_ms: u64,
    pub attempt_pause_ms: u64,
    pub cycle_interval_ms: u64,
    pub waypoints: Vec<Waypoint>,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            gps_port: None,
            gps_baudrate: 9600,
            notify_port: None,
            notify_baudrate: 9600,
            sample_count: 5,
            attempt_timeout_ms: 3_000,
            total_timeout_ms: 20_000,
            attempt_pause_ms: 200,
            cycle_interval_ms: 2_000,
            waypoints: Vec::new(),
        }
    }
}

impl GeofenceConfig {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            log::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit path; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GeofenceError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            GeofenceError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from an explicit path, using defaults when the file is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `$HOME/.config/gps-geofence/config.json`
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| GeofenceError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gps-geofence")
            .join("config.json"))
    }

    /// Check values the rest of the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if self.sample_count == 0 {
            return Err(GeofenceError::Config("sample_count must be at least 1".to_string()));
        }

        if self.total_timeout_ms == 0 || self.attempt_timeout_ms == 0 {
            return Err(GeofenceError::Config("timeouts must be non-zero".to_string()));
        }

        let mut names = HashSet::new();
        for wp in &self.waypoints {
            if wp.name.trim().is_empty() {
                return Err(GeofenceError::Config("waypoint name must not be empty".to_string()));
            }
            if !names.insert(wp.name.as_str()) {
                return Err(GeofenceError::Config(format!("duplicate waypoint name: {}", wp.name)));
            }
            if !(wp.radius_m.is_finite() && wp.radius_m > 0.0) {
                return Err(GeofenceError::Config(format!(
                    "waypoint {}: radius_m must be positive, got {}",
                    wp.name, wp.radius_m
                )));
            }
            if !(-90.0..=90.0).contains(&wp.lat) || !(-180.0..=180.0).contains(&wp.lon) {
                return Err(GeofenceError::Config(format!(
                    "waypoint {}: coordinates out of range ({}, {})",
                    wp.name, wp.lat, wp.lon
                )));
            }
        }

        Ok(())
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            sample_count: self.sample_count,
            attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
            total_timeout: Duration::from_millis(self.total_timeout_ms),
            attempt_pause: Duration::from_millis(self.attempt_pause_ms),
        }
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    /// Update GPS serial port settings
    pub fn update_gps_serial(&mut self, port: String, baudrate: Option<u32>) {
        self.gps_port = Some(port);
        if let Some(baudrate) = baudrate {
            self.gps_baudrate = baudrate;
        }
    }

    /// Update notification serial port settings
    pub fn update_notify_serial(&mut self, port: String, baudrate: Option<u32>) {
        self.notify_port = Some(port);
        if let Some(baudrate) = baudrate {
            self.notify_baudrate = baudrate;
        }
    }
}
