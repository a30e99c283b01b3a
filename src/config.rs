use crate::channel::Channel;
use crate::error::HardwareError;
use crate::registers::{Joystick, JoystickParseError, JoystickPort};
use crate::state::HardwareState;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_FLUSH_PERIOD_MS: u64 = 50;
const DEFAULT_DEEP_EVERY: u64 = 100;
const DEFAULT_SNAPSHOT_CHANNEL_CAPACITY: usize = 256;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("joystick port {port}: {source}")]
    Port {
        port: usize,
        #[source]
        source: HardwareError,
    },

    #[error("joystick on port {port}: {source}")]
    Joystick {
        port: usize,
        #[source]
        source: JoystickParseError,
    },
}

/// A joystick preset in the compact joystick format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoystickPreset {
    pub port: usize,
    pub compact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Snapshot publisher cadence.
    pub flush_period_ms: u64,
    /// Every N-th publish is a deep export.
    pub deep_every: u64,
    pub snapshot_channel_capacity: usize,
    pub joysticks: Vec<JoystickPreset>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            flush_period_ms: DEFAULT_FLUSH_PERIOD_MS,
            deep_every: DEFAULT_DEEP_EVERY,
            snapshot_channel_capacity: DEFAULT_SNAPSHOT_CHANNEL_CAPACITY,
            joysticks: Vec::new(),
        }
    }
}

impl EmulatorConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn flush_period(&self) -> Duration {
        Duration::from_millis(self.flush_period_ms.max(1))
    }

    /// Parses every joystick preset, failing on the first bad one.
    pub fn joystick_presets(&self) -> Result<Vec<(JoystickPort, Joystick)>, ConfigError> {
        self.joysticks
            .iter()
            .map(|preset| {
                let port = JoystickPort::new(preset.port).map_err(|source| ConfigError::Port {
                    port: preset.port,
                    source,
                })?;
                let joystick = Joystick::deserialize(&preset.compact).map_err(|source| ConfigError::Joystick {
                    port: preset.port,
                    source,
                })?;
                Ok((port, joystick))
            })
            .collect()
    }

    /// Installs the joystick presets. Nothing is written unless all parse.
    pub fn apply_joysticks(&self, state: &mut HardwareState) -> Result<usize, ConfigError> {
        let presets = self.joystick_presets()?;
        let count = presets.len();
        if count > 0 {
            let joysticks = state.joysticks_mut();
            for (port, joystick) in presets {
                joysticks.set(port, joystick);
            }
        }
        Ok(count)
    }
}
