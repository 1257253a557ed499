//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into core services. The intent is to avoid reading
//! process-wide environment variables during request handling, which can lead
//! to inconsistent behaviour in multi-threaded runtimes and test harnesses.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;

use crate::{ClinicError, ClinicResult};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    age_refresh_time: NaiveTime,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(data_dir: PathBuf, age_refresh_time: NaiveTime) -> Self {
        Self {
            data_dir,
            age_refresh_time,
        }
    }

    /// Root directory of the document store.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Local wall-clock time at which the daily age-refresh job runs.
    pub fn age_refresh_time(&self) -> NaiveTime {
        self.age_refresh_time
    }
}

/// The default daily run time for the age-refresh job (midnight).
pub fn default_age_refresh_time() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 0, 0).expect("midnight is a valid time of day")
}

/// Parse the age-refresh run time from an optional `HH:MM` string value.
///
/// If `value` is `None` or empty/whitespace, returns the default (midnight).
///
/// # Errors
///
/// Returns [`ClinicError::Validation`] if the value is present but not a
/// valid `HH:MM` time.
pub fn age_refresh_time_from_env_value(value: Option<String>) -> ClinicResult<NaiveTime> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(default_age_refresh_time()),
        Some(v) => NaiveTime::parse_from_str(&v, "%H:%M").map_err(|_| {
            ClinicError::Validation(format!(
                "age refresh time must be HH:MM (24-hour clock), got '{v}'"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_blank_value_falls_back_to_midnight() {
        assert_eq!(
            age_refresh_time_from_env_value(None).expect("default"),
            default_age_refresh_time()
        );
        assert_eq!(
            age_refresh_time_from_env_value(Some("   ".into())).expect("default"),
            default_age_refresh_time()
        );
    }

    #[test]
    fn parses_valid_wall_clock_times() {
        let time = age_refresh_time_from_env_value(Some("02:30".into())).expect("valid");
        assert_eq!(time, NaiveTime::from_hms_opt(2, 30, 0).expect("valid time"));
    }

    #[test]
    fn rejects_malformed_times() {
        assert!(age_refresh_time_from_env_value(Some("25:00".into())).is_err());
        assert!(age_refresh_time_from_env_value(Some("midnight".into())).is_err());
    }
}
