//! Worker configuration.
//!
//! Defaults reproduce the classic demo: repaint every 100 ms with opaque red,
//! and burn CPU with `fibonacci(42)` when the host posts `"slowDown"`.

use crate::{Rgba, WorkerError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_REPAINT_INTERVAL_MS: u32 = 100;
pub const DEFAULT_LOAD_DEPTH: u32 = 42;
pub const DEFAULT_LOAD_SENTINEL: &str = "slowDown";
/// Largest depth whose `fib(n) = 1 (n <= 1)` value fits in a `u64`.
pub const MAX_LOAD_DEPTH: u32 = 92;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Period of the repaint timer.
    pub repaint_interval_ms: u32,
    /// Solid color painted on every tick.
    pub fill_color: Rgba,
    /// Argument passed to the naive Fibonacci when simulating load.
    pub load_depth: u32,
    /// Exact string payload that triggers load simulation.
    pub load_sentinel: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            repaint_interval_ms: DEFAULT_REPAINT_INTERVAL_MS,
            fill_color: Rgba::RED,
            load_depth: DEFAULT_LOAD_DEPTH,
            load_sentinel: DEFAULT_LOAD_SENTINEL.to_string(),
        }
    }
}

impl WorkerConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, WorkerError> {
        let config: WorkerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WorkerError> {
        if self.repaint_interval_ms == 0 {
            return Err(WorkerError::InvalidConfig(
                "repaint_interval_ms must be positive".to_string(),
            ));
        }
        if self.load_depth > MAX_LOAD_DEPTH {
            return Err(WorkerError::InvalidConfig(format!(
                "load_depth {} overflows u64, max is {MAX_LOAD_DEPTH}",
                self.load_depth
            )));
        }
        if self.load_sentinel.is_empty() {
            return Err(WorkerError::InvalidConfig(
                "load_sentinel must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn repaint_interval(&self) -> Duration {
        Duration::from_millis(self.repaint_interval_ms as u64)
    }

    pub fn with_repaint_interval_ms(mut self, ms: u32) -> Self {
        self.repaint_interval_ms = ms;
        self
    }

    pub fn with_fill_color(mut self, color: Rgba) -> Self {
        self.fill_color = color;
        self
    }

    pub fn with_load_depth(mut self, depth: u32) -> Self {
        self.load_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_demo() {
        let config = WorkerConfig::default();
        assert_eq!(config.repaint_interval(), Duration::from_millis(100));
        assert_eq!(config.fill_color, Rgba::RED);
        assert_eq!(config.load_depth, 42);
        assert_eq!(config.load_sentinel, "slowDown");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = WorkerConfig::from_json(r##"{"fill_color": "#00ff00", "load_depth": 20}"##)
            .unwrap();
        assert_eq!(config.fill_color, Rgba::rgb(0, 0xff, 0));
        assert_eq!(config.load_depth, 20);
        assert_eq!(config.repaint_interval_ms, 100);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = WorkerConfig::from_json(r#"{"repaint_interval_ms": 0}"#).unwrap_err();
        assert!(matches!(err, WorkerError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_depth_limited_to_u64_range() {
        assert!(WorkerConfig::default()
            .with_load_depth(MAX_LOAD_DEPTH)
            .validate()
            .is_ok());

        let err = WorkerConfig::from_json(r#"{"load_depth": 93}"#).unwrap_err();
        assert!(matches!(err, WorkerError::InvalidConfig(_)));
    }

    #[test]
    fn test_bad_color_is_a_parse_error() {
        let err = WorkerConfig::from_json(r#"{"fill_color": "red"}"#).unwrap_err();
        assert!(matches!(err, WorkerError::Config(_)));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = WorkerConfig::default().with_load_depth(10);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r##""fill_color":"#ff0000""##));
        assert_eq!(WorkerConfig::from_json(&json).unwrap(), config);
    }
}
