//! Runtime configuration
//!
//! Read from the process environment, with `.env` loaded first if present.
//!
//! | Variable | Default |
//! |---|---|
//! | `RATE_LIMIT_DEFAULT_MAX` | 10 |
//! | `RATE_LIMIT_DEFAULT_WINDOW_MS` | 3600000 |
//! | `RATE_LIMIT_MAX_BUCKETS` | 100000 (0 = unbounded) |
//! | `RATE_LIMIT_CLEANUP_INTERVAL_SECS` | 300 (0 = no background cleanup) |

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::rate_limit::RateLimitPolicy;

const DEFAULT_MAX_BUCKETS: usize = 100_000;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// Rate limiter settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    pub default_policy: RateLimitPolicy,
    pub max_buckets: Option<usize>,
    pub cleanup_interval: Option<Duration>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            default_policy: RateLimitPolicy::DEFAULT,
            max_buckets: Some(DEFAULT_MAX_BUCKETS),
            cleanup_interval: Some(Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS)),
        }
    }
}

impl AccessConfig {
    /// Load `.env` (current dir, then parent) and read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_path("../.env");
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings from an env file without touching the process environment
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let vars = dotenvy::from_path_iter(path)?.collect::<Result<HashMap<_, _>, _>>()?;
        Self::from_lookup(|var| vars.get(var).cloned())
    }

    /// Build from any variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_requests = parse_var(&lookup, "RATE_LIMIT_DEFAULT_MAX")?
            .unwrap_or(defaults.default_policy.max_requests);
        let window = parse_var::<u64, _>(&lookup, "RATE_LIMIT_DEFAULT_WINDOW_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.default_policy.window);

        let max_buckets = match parse_var::<usize, _>(&lookup, "RATE_LIMIT_MAX_BUCKETS")? {
            Some(0) => None,
            Some(n) => Some(n),
            None => defaults.max_buckets,
        };

        let cleanup_interval =
            match parse_var::<u64, _>(&lookup, "RATE_LIMIT_CLEANUP_INTERVAL_SECS")? {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.cleanup_interval,
            };

        Ok(Self {
            default_policy: RateLimitPolicy::new(max_requests, window),
            max_buckets,
            cleanup_interval,
        })
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AccessConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AccessConfig::default());
        assert_eq!(config.default_policy.max_requests, 10);
        assert_eq!(config.default_policy.window, Duration::from_millis(3_600_000));
    }

    #[test]
    fn test_overrides_and_zero_disables() {
        let config = AccessConfig::from_lookup(lookup_from(&[
            ("RATE_LIMIT_DEFAULT_MAX", "25"),
            ("RATE_LIMIT_DEFAULT_WINDOW_MS", "60000"),
            ("RATE_LIMIT_MAX_BUCKETS", "0"),
            ("RATE_LIMIT_CLEANUP_INTERVAL_SECS", "0"),
        ]))
        .unwrap();

        assert_eq!(
            config.default_policy,
            RateLimitPolicy::new(25, Duration::from_secs(60))
        );
        assert_eq!(config.max_buckets, None);
        assert_eq!(config.cleanup_interval, None);
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let err = AccessConfig::from_lookup(lookup_from(&[("RATE_LIMIT_DEFAULT_MAX", "ten")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "RATE_LIMIT_DEFAULT_MAX",
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "invalid value for RATE_LIMIT_DEFAULT_MAX: \"ten\""
        );
    }

    #[test]
    fn test_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "RATE_LIMIT_MAX_BUCKETS=500").unwrap();
        writeln!(file, "RATE_LIMIT_CLEANUP_INTERVAL_SECS=30").unwrap();

        let config = AccessConfig::from_env_file(&path).unwrap();
        assert_eq!(config.max_buckets, Some(500));
        assert_eq!(config.cleanup_interval, Some(Duration::from_secs(30)));
        assert_eq!(config.default_policy, RateLimitPolicy::DEFAULT);
    }

    #[test]
    fn test_missing_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AccessConfig::from_env_file(&dir.path().join("missing.env")).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile(_)));
    }
}
