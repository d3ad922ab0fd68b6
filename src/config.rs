//! Botmeter configuration.

use crate::meter::scheduler::DEFAULT_TICK_INTERVAL;
use crate::store::file::STATE_FILE_NAME;
use crate::MeterError;
use chrono::{FixedOffset, Offset, Utc};
use std::path::PathBuf;
use std::time::Duration;

const ENV_STATE_PATH: &str = "BOTMETER_STATE_PATH";
const ENV_NAMESPACE: &str = "BOTMETER_NAMESPACE";
const ENV_TICK_SECS: &str = "BOTMETER_TICK_SECS";
const ENV_UTC_OFFSET_MINUTES: &str = "BOTMETER_UTC_OFFSET_MINUTES";

/// Configuration for the metrics service.
#[derive(Debug, Clone)]
pub struct MeterConfig {
    /// Namespace directory under the platform data dir.
    /// Ignored when `state_path` is set.
    pub namespace: String,

    /// Explicit location of the state record.
    pub state_path: Option<PathBuf>,

    /// How often the scheduler checks for a window boundary.
    pub tick_interval: Duration,

    /// Offset whose midnight starts a new day.
    pub utc_offset: FixedOffset,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            namespace: "botmeter".to_string(),
            state_path: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            utc_offset: Utc.fix(),
        }
    }
}

impl MeterConfig {
    /// Build a configuration from defaults overridden by environment:
    ///
    /// - `BOTMETER_STATE_PATH`: explicit state file
    /// - `BOTMETER_NAMESPACE`: data-dir namespace
    /// - `BOTMETER_TICK_SECS`: scheduler interval in seconds
    /// - `BOTMETER_UTC_OFFSET_MINUTES`: day boundary offset, e.g. `180`
    pub fn from_env() -> Result<Self, MeterError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MeterError> {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_STATE_PATH) {
            config.state_path = Some(PathBuf::from(path));
        }
        if let Some(namespace) = lookup(ENV_NAMESPACE) {
            config.namespace = namespace;
        }
        if let Some(secs) = lookup(ENV_TICK_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                MeterError::ConfigError(format!("{} must be an integer: {}", ENV_TICK_SECS, e))
            })?;
            config.tick_interval = Duration::from_secs(secs);
        }
        if let Some(minutes) = lookup(ENV_UTC_OFFSET_MINUTES) {
            let minutes: i32 = minutes.trim().parse().map_err(|e| {
                MeterError::ConfigError(format!(
                    "{} must be an integer: {}",
                    ENV_UTC_OFFSET_MINUTES, e
                ))
            })?;
            config.utc_offset = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    MeterError::ConfigError(format!(
                        "{} out of range: {}",
                        ENV_UTC_OFFSET_MINUTES, minutes
                    ))
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), MeterError> {
        if self.state_path.is_none() && self.namespace.trim().is_empty() {
            return Err(MeterError::ConfigError(
                "namespace cannot be empty without an explicit state_path".to_string(),
            ));
        }
        if self
            .state_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(MeterError::ConfigError(
                "state_path cannot be empty".to_string(),
            ));
        }
        if self.tick_interval.is_zero() {
            return Err(MeterError::ConfigError(
                "tick_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Where the state record lives.
    pub fn resolve_state_path(&self) -> Result<PathBuf, MeterError> {
        if let Some(path) = &self.state_path {
            return Ok(path.clone());
        }
        let base_dir = dirs::data_dir().ok_or_else(|| {
            MeterError::ConfigError("Could not find data directory".to_string())
        })?;
        Ok(base_dir.join(&self.namespace).join(STATE_FILE_NAME))
    }
}
