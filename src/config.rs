#![allow(missing_docs)]

use serde::Deserialize;

use crate::error::{Result, SnapshotError};
use crate::model::EpochMs;

pub const DEFAULT_SAMPLING_INTERVAL_MS: EpochMs = 5_000;
pub const DEFAULT_EXPIRY_HORIZON_MS: EpochMs = 600_000;
pub const DEFAULT_ROTATION_INTERVAL_MS: EpochMs = 30_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sampling_interval_ms: EpochMs,
    pub expiry_horizon_ms: EpochMs,
    pub rotation_interval_ms: EpochMs,
    pub max_buffer_rows: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            expiry_horizon_ms: DEFAULT_EXPIRY_HORIZON_MS,
            rotation_interval_ms: DEFAULT_ROTATION_INTERVAL_MS,
            max_buffer_rows: None,
        }
    }
}

impl Config {
    pub fn production() -> Self {
        Self {
            sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            expiry_horizon_ms: DEFAULT_EXPIRY_HORIZON_MS,
            rotation_interval_ms: DEFAULT_ROTATION_INTERVAL_MS,
            max_buffer_rows: Some(1 << 20),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            max_buffer_rows: None,
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)
            .map_err(|e| SnapshotError::InvalidArgument(format!("bad config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sampling_interval_ms <= 0 {
            return Err(SnapshotError::InvalidArgument(
                "sampling_interval_ms must be positive".into(),
            ));
        }
        if self.expiry_horizon_ms < self.sampling_interval_ms {
            return Err(SnapshotError::InvalidArgument(
                "expiry_horizon_ms must cover at least one window".into(),
            ));
        }
        if self.rotation_interval_ms < self.sampling_interval_ms {
            return Err(SnapshotError::InvalidArgument(
                "rotation_interval_ms must cover at least one window".into(),
            ));
        }
        if self.max_buffer_rows == Some(0) {
            return Err(SnapshotError::InvalidArgument(
                "max_buffer_rows must be nonzero when set".into(),
            ));
        }
        Ok(())
    }

    /// Aligns a wall-clock instant down to the start of its window.
    pub fn window_start_for(&self, now_ms: EpochMs) -> EpochMs {
        now_ms - now_ms.rem_euclid(self.sampling_interval_ms)
    }
}
