use crate::error::{ReservationError, Result};
use chrono::Duration;

/// Default length of a hold.
pub const DEFAULT_HOLD_MINUTES: i64 = 30;
/// Longest accepted hold, one year.
pub const MAX_HOLD_MINUTES: i64 = 365 * 24 * 60;
/// Default delay between two expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Tunables of the reservation engine and its sweeper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// How long a pending reservation holds its item.
    pub hold_duration: Duration,
    /// Delay between two expiry sweeps.
    pub sweep_interval: std::time::Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hold_duration: Duration::minutes(DEFAULT_HOLD_MINUTES),
            sweep_interval: std::time::Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl EngineConfig {
    /// Builds a config from whole minutes and seconds, as taken from the CLI.
    pub fn from_parts(hold_minutes: i64, sweep_interval_secs: u64) -> Result<Self> {
        let hold_duration = Duration::try_minutes(hold_minutes).ok_or_else(|| {
            ReservationError::ConfigError(format!(
                "Hold of {} minutes is out of range",
                hold_minutes
            ))
        })?;
        let config = Self {
            hold_duration,
            sweep_interval: std::time::Duration::from_secs(sweep_interval_secs),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hold_duration <= Duration::zero() {
            return Err(ReservationError::ConfigError(
                "Hold duration must be positive".to_string(),
            ));
        }
        if self.hold_duration > Duration::minutes(MAX_HOLD_MINUTES) {
            return Err(ReservationError::ConfigError(format!(
                "Hold duration must not exceed {} minutes",
                MAX_HOLD_MINUTES
            )));
        }
        if self.sweep_interval.is_zero() {
            return Err(ReservationError::ConfigError(
                "Sweep interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hold_is_thirty_minutes() {
        let config = EngineConfig::default();
        assert_eq!(config.hold_duration, Duration::minutes(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_parts_rejects_non_positive_values() {
        assert!(matches!(
            EngineConfig::from_parts(0, 60),
            Err(ReservationError::ConfigError(_))
        ));
        assert!(matches!(
            EngineConfig::from_parts(-5, 60),
            Err(ReservationError::ConfigError(_))
        ));
        assert!(matches!(
            EngineConfig::from_parts(30, 0),
            Err(ReservationError::ConfigError(_))
        ));
        assert_eq!(
            EngineConfig::from_parts(15, 5).unwrap().hold_duration,
            Duration::minutes(15)
        );
    }

    #[test]
    fn test_from_parts_rejects_oversized_hold() {
        assert!(matches!(
            EngineConfig::from_parts(i64::MAX, 60),
            Err(ReservationError::ConfigError(_))
        ));
        assert!(matches!(
            EngineConfig::from_parts(1_000_000_000_000, 60),
            Err(ReservationError::ConfigError(_))
        ));
        assert!(matches!(
            EngineConfig::from_parts(MAX_HOLD_MINUTES + 1, 60),
            Err(ReservationError::ConfigError(_))
        ));
        assert!(EngineConfig::from_parts(MAX_HOLD_MINUTES, 60).is_ok());
    }
}
