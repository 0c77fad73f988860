use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("refresh_throttle_secs cannot be 0")]
    ZeroThrottleWindow,
}

fn default_refresh_throttle_secs() -> u64 {
    30
}

/// Session layer configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Minimum interval between refresh triggers for one session
    #[serde(default = "default_refresh_throttle_secs")]
    pub refresh_throttle_secs: u64,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.refresh_throttle_secs == 0 {
            return Err(ValidationError::ZeroThrottleWindow);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            refresh_throttle_secs: default_refresh_throttle_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let config: SessionConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.refresh_throttle_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_throttle_window_is_rejected() {
        let config: SessionConfig = serde_yaml::from_str("refresh_throttle_secs: 0").unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::ZeroThrottleWindow
        ));
    }
}
