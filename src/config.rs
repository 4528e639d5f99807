use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Runtime settings of a simulation session, read from a TOML file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,
    #[serde(default = "default_tick_pause_ms")]
    pub tick_pause_ms: u64,
    #[serde(default)]
    pub fire_animation_ms: u64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cycle_interval_ms: default_cycle_interval_ms(),
            tick_pause_ms: default_tick_pause_ms(),
            fire_animation_ms: 0,
            seed: None,
        }
    }
}

impl Settings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(settings)
    }

    /// Simulated time added per tick.
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    /// Wall-clock pause at the end of every tick.
    pub fn tick_pause(&self) -> Duration {
        Duration::from_millis(self.tick_pause_ms)
    }

    pub fn fire_animation(&self) -> Duration {
        Duration::from_millis(self.fire_animation_ms)
    }

    /// Settings for tests and batch runs: no pacing, no animation.
    pub fn headless(cycle_interval: Duration) -> Self {
        Self {
            cycle_interval_ms: cycle_interval.as_millis() as u64,
            tick_pause_ms: 0,
            fire_animation_ms: 0,
            seed: None,
        }
    }
}

// 0.01 s scan cycle and 50 ms pacing of the editor's simulator.
fn default_cycle_interval_ms() -> u64 {
    10
}

fn default_tick_pause_ms() -> u64 {
    50
}
