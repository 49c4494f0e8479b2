use std::time::Duration;

use crate::ConfigError;

// football-data free tier allows 10 requests per minute
const MAX_REQUESTS: usize = 8;
const WINDOW: Duration = Duration::from_secs(60);
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(65);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorConfig {
    pub max_requests: usize,
    pub window: Duration,
    /// Applied when the remote side signals quota exhaustion without a retry hint.
    /// Always longer than `window`, so the window is empty once the cooldown ends.
    pub default_cooldown: Duration,
}

impl GovernorConfig {
    pub fn new(
        max_requests: usize,
        window: Duration,
        default_cooldown: Duration,
    ) -> Result<GovernorConfig, ConfigError> {
        if max_requests == 0 {
            return Err(ConfigError::ZeroMaxRequests);
        }

        if window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }

        if default_cooldown <= window {
            return Err(ConfigError::CooldownTooShort {
                cooldown: default_cooldown,
                window,
            });
        }

        Ok(GovernorConfig {
            max_requests,
            window,
            default_cooldown,
        })
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        GovernorConfig {
            max_requests: MAX_REQUESTS,
            window: WINDOW,
            default_cooldown: DEFAULT_COOLDOWN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let default = GovernorConfig::default();
        let validated =
            GovernorConfig::new(default.max_requests, default.window, default.default_cooldown);

        assert_eq!(validated, Ok(default));
    }

    #[test]
    fn test_rejects_zero_values() {
        assert_eq!(
            GovernorConfig::new(0, WINDOW, DEFAULT_COOLDOWN),
            Err(ConfigError::ZeroMaxRequests)
        );
        assert_eq!(
            GovernorConfig::new(1, Duration::ZERO, DEFAULT_COOLDOWN),
            Err(ConfigError::ZeroWindow)
        );
    }

    #[test]
    fn test_cooldown_must_exceed_window() {
        let res = GovernorConfig::new(5, Duration::from_secs(60), Duration::from_secs(60));

        assert!(matches!(res, Err(ConfigError::CooldownTooShort { .. })));
    }
}
