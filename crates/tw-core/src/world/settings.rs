//! Engine settings
//!
//! Simulation parameters shared by every operation of a world. Loaded from
//! JSON; missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MIN_ACTIVE_SPEED, OBJ_EXPAND, SIZEOFFREE};

/// Tunable engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Speed magnitude above which an object is processed every tick
    pub min_active_speed: f32,
    /// Records added to the arena per expansion
    pub pool_batch: usize,
    /// Upper bound on the ring index free-spot searches may reach
    pub max_search_ring: usize,
    /// Panic on contract violations instead of logging them
    pub strict: bool,
    /// Scrub freed slots and never hand them out again
    pub memory_debug: bool,
    /// Clamp applied to strength before weight-limit lookups
    pub max_stat: i8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_active_speed: MIN_ACTIVE_SPEED,
            pool_batch: OBJ_EXPAND,
            max_search_ring: SIZEOFFREE,
            strict: false,
            memory_debug: false,
            max_stat: 30,
        }
    }
}

/// Settings loading error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid value '{value}' for setting '{name}'")]
    InvalidValue { name: &'static str, value: String },
}

impl Settings {
    /// Parse settings from a JSON document
    pub fn from_json(contents: &str) -> Result<Self, SettingsError> {
        let settings: Settings =
            serde_json::from_str(contents).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        Self::from_json(&contents)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.min_active_speed >= 0.0) {
            return Err(SettingsError::InvalidValue {
                name: "min_active_speed",
                value: self.min_active_speed.to_string(),
            });
        }
        if self.pool_batch == 0 {
            return Err(SettingsError::InvalidValue {
                name: "pool_batch",
                value: self.pool_batch.to_string(),
            });
        }
        if self.max_search_ring == 0 || self.max_search_ring > SIZEOFFREE {
            return Err(SettingsError::InvalidValue {
                name: "max_search_ring",
                value: self.max_search_ring.to_string(),
            });
        }
        if self.max_stat <= 0 {
            return Err(SettingsError::InvalidValue {
                name: "max_stat",
                value: self.max_stat.to_string(),
            });
        }
        Ok(())
    }
}
