//! Bot configuration.

use std::env;
use std::time::Duration;

use crate::error::{BotError, Result};

/// Tunables for sessions and payment checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// How long an idle session entry lives.
    pub session_ttl: Duration,
    /// Delay before the first (and each following) scheduled status check.
    pub payment_check_delay: Duration,
    /// Age after which a payment still reported as `unknown` is expired.
    pub payment_expiry: Duration,
    /// How often the worker looks for due checks.
    pub payment_check_poll: Duration,
    /// Scheduled checks per payment before the worker gives up.
    pub payment_max_checks: i64,
    /// Send welcome videos to returning users as well.
    pub welcome_videos_for_returning: bool,
    /// Amount stored on a provisional vote before a tier is chosen.
    pub placeholder_amount: i64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(3600),
            payment_check_delay: Duration::from_secs(60),
            payment_expiry: Duration::from_secs(300),
            payment_check_poll: Duration::from_secs(5),
            payment_max_checks: 10,
            welcome_videos_for_returning: false,
            placeholder_amount: 1000,
        }
    }
}

impl BotConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional:
    /// - `SESSION_TTL_SECS` (default: 3600)
    /// - `PAYMENT_CHECK_DELAY_SECS` (default: 60)
    /// - `PAYMENT_EXPIRY_SECS` (default: 300)
    /// - `PAYMENT_CHECK_POLL_SECS` (default: 5)
    /// - `PAYMENT_MAX_CHECKS` (default: 10)
    /// - `WELCOME_VIDEOS_FOR_RETURNING` (default: false)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            session_ttl: secs_var("SESSION_TTL_SECS", defaults.session_ttl)?,
            payment_check_delay: secs_var("PAYMENT_CHECK_DELAY_SECS", defaults.payment_check_delay)?,
            payment_expiry: secs_var("PAYMENT_EXPIRY_SECS", defaults.payment_expiry)?,
            payment_check_poll: secs_var("PAYMENT_CHECK_POLL_SECS", defaults.payment_check_poll)?,
            payment_max_checks: match env::var("PAYMENT_MAX_CHECKS") {
                Ok(raw) => parse_number("PAYMENT_MAX_CHECKS", &raw)? as i64,
                Err(_) => defaults.payment_max_checks,
            },
            welcome_videos_for_returning: env::var("WELCOME_VIDEOS_FOR_RETURNING")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.welcome_videos_for_returning),
            placeholder_amount: defaults.placeholder_amount,
        })
    }
}

fn secs_var(name: &str, default: Duration) -> Result<Duration> {
    match env::var(name) {
        Ok(raw) => parse_number(name, &raw).map(Duration::from_secs),
        Err(_) => Ok(default),
    }
}

pub(crate) fn parse_number(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| BotError::Configuration(format!("{} must be a whole number, got '{}'", name, raw)))
}

/// Interpret a boolean-ish environment value.
pub fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert_eq!(config.payment_check_delay, Duration::from_secs(60));
        assert_eq!(config.payment_expiry, Duration::from_secs(300));
        assert_eq!(config.payment_max_checks, 10);
        assert_eq!(config.placeholder_amount, 1000);
        assert!(!config.welcome_videos_for_returning);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("X", " 90 ").unwrap(), 90);
        assert!(matches!(
            parse_number("X", "soon"),
            Err(BotError::Configuration(_))
        ));
        assert!(parse_number("X", "-1").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
