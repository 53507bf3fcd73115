//! Engine configuration.

use crate::frame::DEFAULT_FRAME_PADDING;
use crate::history::DEFAULT_HISTORY_DEPTH;
use crate::shapes::{DEFAULT_PLACEMENT_MARGIN, DEFAULT_PLACEMENT_SPACING};
use crate::storage::RetryPolicy;
use crate::viewport::DEFAULT_GRID_SPACING;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DEBOUNCE_MS: u64 = 2000;
const DEFAULT_AUTOSAVE_SECS: u64 = 30;
const DEFAULT_RETRY_BASE_MS: u64 = 1000;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Environment variable naming the document directory.
pub const DATA_DIR_ENV: &str = "INKBOARD_DATA_DIR";

/// Tunables for editing and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Quiet period after an edit before the canvas is saved.
    pub debounce_ms: u64,
    /// Interval of the forced save of unsaved changes.
    pub autosave_secs: u64,
    /// First retry delay; doubled on each further attempt.
    pub retry_base_ms: u64,
    pub max_retries: u32,
    pub history_depth: usize,
    pub frame_padding: f64,
    pub placement_spacing: f64,
    pub placement_margin: f64,
    pub grid_spacing: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            autosave_secs: DEFAULT_AUTOSAVE_SECS,
            retry_base_ms: DEFAULT_RETRY_BASE_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            history_depth: DEFAULT_HISTORY_DEPTH,
            frame_padding: DEFAULT_FRAME_PADDING,
            placement_spacing: DEFAULT_PLACEMENT_SPACING,
            placement_margin: DEFAULT_PLACEMENT_MARGIN,
            grid_spacing: DEFAULT_GRID_SPACING,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `INKBOARD_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            debounce_ms: env_parse("INKBOARD_DEBOUNCE_MS", defaults.debounce_ms),
            autosave_secs: env_parse("INKBOARD_AUTOSAVE_SECS", defaults.autosave_secs),
            retry_base_ms: env_parse("INKBOARD_RETRY_BASE_MS", defaults.retry_base_ms),
            max_retries: env_parse("INKBOARD_MAX_RETRIES", defaults.max_retries),
            history_depth: env_parse("INKBOARD_HISTORY_DEPTH", defaults.history_depth),
            frame_padding: env_parse("INKBOARD_FRAME_PADDING", defaults.frame_padding),
            placement_spacing: env_parse("INKBOARD_PLACEMENT_SPACING", defaults.placement_spacing),
            placement_margin: env_parse("INKBOARD_PLACEMENT_MARGIN", defaults.placement_margin),
            grid_spacing: env_parse("INKBOARD_GRID_SPACING", defaults.grid_spacing),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(self.retry_base_ms), self.max_retries)
    }
}

/// Directory holding canvas documents: `INKBOARD_DATA_DIR`, else the
/// platform data directory, else the working directory.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .map(|d| d.join("inkboard").join("canvases"))
        .unwrap_or_else(|| PathBuf::from(".inkboard"))
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.debounce(), Duration::from_secs(2));
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.history_depth, 50);
        assert!((config.frame_padding - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_env_parse_missing_returns_default() {
        let value: usize = env_parse("__INKBOARD_TEST_MISSING_KEY__", 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"debounceMs": 500}"#).unwrap();
        assert_eq!(config.debounce_ms, 500);
        assert_eq!(config.autosave_secs, 30);
    }
}
