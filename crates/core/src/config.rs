//! Runtime configuration
//!
//! Knobs for the scheduler and the standalone runner, loaded from a TOML
//! file. Every field has a default, so a partial (or absent) file is fine;
//! [`RuntimeConfig::load_or_create`] writes the default file on first run.
//!
//! # Example
//!
//! ```ignore
//! use tickloop_core::RuntimeConfig;
//!
//! let config = RuntimeConfig::load_or_create("tickloop.toml").unwrap_or_default();
//! let scheduler = tickloop_core::Scheduler::with_config(config);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write the config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Frames per second the standalone runner paces itself at
    pub target_frame_rate: u32,

    /// Seconds per fixed-update step driven by the runner
    pub fixed_timestep: f32,

    /// Upper bound on fixed-update steps per frame, so a long stall cannot
    /// trigger an unbounded catch-up burst
    pub max_fixed_steps: u32,

    /// An update tick slower than this is logged as a warning
    pub slow_tick_warn_ms: u64,

    /// Initial capacity of the delay handle live set
    pub delay_capacity: usize,

    /// Initial capacity of the main-thread task queue buffers
    pub queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            target_frame_rate: 60,
            fixed_timestep: 0.02,
            max_fixed_steps: 8,
            slow_tick_warn_ms: 1,
            delay_capacity: 64,
            queue_capacity: 64,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, writing a default file first if none exists
    pub fn load_or_create(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            tracing::info!("Created default config at {}", path.display());
            return Ok(config);
        }
        Self::load(path)
    }

    /// Write the configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: RuntimeConfig = toml::from_str("slow_tick_warn_ms = 5").unwrap();
        assert_eq!(config.slow_tick_warn_ms, 5);
        assert_eq!(config.max_fixed_steps, RuntimeConfig::default().max_fixed_steps);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let mut config = RuntimeConfig::default();
        config.fixed_timestep = 0.01;
        config.delay_capacity = 256;

        let text = toml::to_string_pretty(&config).unwrap();
        let back: RuntimeConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.fixed_timestep, 0.01);
        assert_eq!(back.delay_capacity, 256);
    }

    #[test]
    fn test_load_or_create_writes_the_default_file() {
        let dir = std::env::temp_dir().join("tickloop-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("runtime.toml");
        let _ = std::fs::remove_file(&path);

        let created = RuntimeConfig::load_or_create(&path).unwrap();
        assert!(path.exists());

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded.delay_capacity, created.delay_capacity);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = std::env::temp_dir().join("tickloop-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.toml");
        std::fs::write(&path, "fixed_timestep = \"fast\"").unwrap();

        match RuntimeConfig::load(&path) {
            Err(ConfigError::Parse(_)) => {}
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }

        let _ = std::fs::remove_file(&path);
    }
}
