//! Environment-driven configuration, loaded once at process start via
//! `dotenvy` (matching the teacher's `DB::new` convention of reading
//! `DATABASE_URL` straight from the environment).

use crate::error::ConfigError;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Seconds per track to ingest; `None` (unset or `-1`) means the full
    /// track (spec.md §6 `fingerprint_limit`).
    pub fingerprint_limit: Option<u32>,
    /// Input sample rate the DSP pipeline expects after decode/resample.
    pub target_sample_rate: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let fingerprint_limit = match env::var("FINGERPRINT_LIMIT_SECS") {
            Ok(raw) => parse_fingerprint_limit(&raw).map_err(|_| ConfigError::InvalidValue {
                key: "FINGERPRINT_LIMIT_SECS".to_string(),
                value: raw,
            })?,
            Err(_) => None,
        };

        let target_sample_rate = match env::var("TARGET_SAMPLE_RATE") {
            Ok(raw) => raw.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                key: "TARGET_SAMPLE_RATE".to_string(),
                value: raw,
            })?,
            Err(_) => 44_100,
        };

        Ok(Self {
            database_url,
            fingerprint_limit,
            target_sample_rate,
        })
    }
}

/// `-1` means "full track" (spec.md §6), same as leaving the variable unset.
fn parse_fingerprint_limit(raw: &str) -> Result<Option<u32>, std::num::ParseIntError> {
    match raw.parse::<i64>()? {
        -1 => Ok(None),
        secs => Ok(Some(secs.max(0) as u32)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_limit_of_minus_one_means_full_track() {
        assert_eq!(parse_fingerprint_limit("-1").unwrap(), None);
    }

    #[test]
    fn fingerprint_limit_parses_positive_seconds() {
        assert_eq!(parse_fingerprint_limit("30").unwrap(), Some(30));
    }

    #[test]
    fn missing_database_url_is_a_config_error() {
        // SAFETY: test-only, single-threaded env mutation scoped to this test.
        unsafe {
            env::remove_var("DATABASE_URL");
        }
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::MissingVar(_))
        ));
    }
}
