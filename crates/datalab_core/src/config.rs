//! Shared bounds and validators for demo settings.
//!
//! Sliders clamp on the UI side too, but nothing here trusts that: every
//! settings record is re-validated before it reaches a controller.

use crate::error::{DemoError, Result};
use serde::{Deserialize, Serialize};

pub const LEARNING_RATE_MIN: f64 = 0.01;
pub const LEARNING_RATE_MAX: f64 = 0.5;

/// Upper bound on steps for convergence-driven auto-play.
pub const DEFAULT_AUTOPLAY_CAP: usize = 1000;
pub const DEFAULT_INTERVAL_MS: f64 = 500.0;

pub fn finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DemoError::invalid(name, value, "must be finite"))
    }
}

pub fn learning_rate(value: f64) -> Result<f64> {
    finite("learning_rate", value)?;
    if !(LEARNING_RATE_MIN..=LEARNING_RATE_MAX).contains(&value) {
        return Err(DemoError::invalid(
            "learning_rate",
            value,
            "must lie in [0.01, 0.5]",
        ));
    }
    Ok(value)
}

pub fn positive(name: &'static str, value: f64) -> Result<f64> {
    finite(name, value)?;
    if value <= 0.0 {
        return Err(DemoError::invalid(name, value, "must be positive"));
    }
    Ok(value)
}

pub fn non_zero_count(name: &'static str, value: usize) -> Result<usize> {
    if value == 0 {
        return Err(DemoError::invalid(name, 0.0, "must be at least one"));
    }
    Ok(value)
}

pub fn all_finite(name: &'static str, values: &[f64]) -> Result<()> {
    for &value in values {
        finite(name, value)?;
    }
    Ok(())
}

/// Cadence and bound for a timed auto-play run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoPlaySettings {
    pub interval_ms: f64,
    pub max_steps: usize,
}

impl Default for AutoPlaySettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            max_steps: DEFAULT_AUTOPLAY_CAP,
        }
    }
}

impl AutoPlaySettings {
    pub fn validate(&self) -> Result<()> {
        positive("interval_ms", self.interval_ms)?;
        non_zero_count("max_steps", self.max_steps)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learning_rate_bounds_are_inclusive() {
        assert!(learning_rate(0.01).is_ok());
        assert!(learning_rate(0.5).is_ok());
        assert!(learning_rate(0.009).is_err());
        assert!(learning_rate(0.51).is_err());
        assert!(learning_rate(f64::NAN).is_err());
    }

    #[test]
    fn autoplay_settings_reject_negative_interval() {
        let settings = AutoPlaySettings {
            interval_ms: -10.0,
            max_steps: 5,
        };
        assert!(matches!(
            settings.validate(),
            Err(DemoError::InvalidHyperparameter {
                name: "interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn autoplay_settings_fill_missing_fields_with_defaults() {
        let settings: AutoPlaySettings =
            serde_json::from_str(r#"{ "interval_ms": 250.0 }"#).expect("settings");
        assert_eq!(settings.interval_ms, 250.0);
        assert_eq!(settings.max_steps, DEFAULT_AUTOPLAY_CAP);
        assert!(settings.validate().is_ok());
    }
}
