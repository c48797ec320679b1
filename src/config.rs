use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Clinic Follow-up";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Address the HTTP adapter binds to unless `FOLLOWUP_BIND_ADDR` is set.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";

/// Upper bound for every day-count threshold (config and request parameters).
pub const MAX_DAY_SPAN: i64 = 36_500;

/// Fallback tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "warn,clinic_followup_lib=info,clinic_followup=info"
}

/// Get the application data directory (platform data dir, `.` as last resort)
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clinic-followup")
}

/// Get the visit database path (`FOLLOWUP_DB_PATH` overrides)
pub fn database_path() -> PathBuf {
    std::env::var_os("FOLLOWUP_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| app_data_dir().join("followup.db"))
}

/// Get the HTTP bind address (`FOLLOWUP_BIND_ADDR` overrides)
pub fn bind_addr() -> String {
    std::env::var("FOLLOWUP_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Thresholds and keyword lists driving the follow-up analytics.
/// Every field has a default, so a partial JSON file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowUpConfig {
    /// Minimum visits for a patient to count as recurring.
    pub default_min_visits: u32,
    /// Days without a visit after which a patient counts as inactive.
    pub default_inactivity_days: i64,
    /// Staleness above `average interval × overdue_factor` is overdue.
    pub overdue_factor: f64,
    /// Staleness above `average interval × near_interval_factor` is due soon.
    pub near_interval_factor: f64,
    /// A projected visit this many days out (or fewer) gets a reminder.
    pub projection_window_days: i64,
    pub top_services_limit: usize,
    /// Lower-case fragments marking a maintenance service (cleanings).
    pub maintenance_keywords: Vec<String>,
    /// Lower-case fragments marking an ongoing treatment (orthodontics).
    pub ongoing_treatment_keywords: Vec<String>,
}

impl Default for FollowUpConfig {
    fn default() -> Self {
        Self {
            default_min_visits: 3,
            default_inactivity_days: 90,
            overdue_factor: 1.5,
            near_interval_factor: 0.8,
            projection_window_days: 14,
            top_services_limit: 3,
            maintenance_keywords: vec![
                "cleaning".into(),
                "hygiene".into(),
                "prophylaxis".into(),
            ],
            ongoing_treatment_keywords: vec![
                "orthodont".into(),
                "braces".into(),
                "aligner".into(),
            ],
        }
    }
}

impl FollowUpConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, overridden by the file named in `FOLLOWUP_CONFIG` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os("FOLLOWUP_CONFIG") {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_min_visits == 0 {
            return Err(ConfigError::Invalid("default_min_visits must be at least 1".into()));
        }
        if self.default_inactivity_days < 0 || self.projection_window_days < 0 {
            return Err(ConfigError::Invalid("day counts must not be negative".into()));
        }
        if self.default_inactivity_days > MAX_DAY_SPAN || self.projection_window_days > MAX_DAY_SPAN
        {
            return Err(ConfigError::Invalid(format!(
                "day counts must not exceed {MAX_DAY_SPAN}"
            )));
        }
        if !(self.near_interval_factor > 0.0) {
            return Err(ConfigError::Invalid("near_interval_factor must be positive".into()));
        }
        if !(self.overdue_factor > self.near_interval_factor) {
            return Err(ConfigError::Invalid(
                "overdue_factor must exceed near_interval_factor".into(),
            ));
        }
        if self.top_services_limit == 0 {
            return Err(ConfigError::Invalid("top_services_limit must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn app_data_dir_is_namespaced() {
        assert!(app_data_dir().ends_with("clinic-followup"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn defaults_are_valid() {
        let config = FollowUpConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_min_visits, 3);
        assert_eq!(config.default_inactivity_days, 90);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = FollowUpConfig::from_json(r#"{"projection_window_days": 21}"#).unwrap();
        assert_eq!(config.projection_window_days, 21);
        assert_eq!(config.overdue_factor, 1.5);
        assert_eq!(config.maintenance_keywords, FollowUpConfig::default().maintenance_keywords);
    }

    #[test]
    fn inverted_factors_rejected() {
        let err = FollowUpConfig::from_json(r#"{"overdue_factor": 0.5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn oversized_day_counts_rejected() {
        for raw in [
            r#"{"projection_window_days": 9223372036854775807}"#,
            r#"{"default_inactivity_days": 100000000}"#,
        ] {
            let err = FollowUpConfig::from_json(raw).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{raw}");
        }
        let at_cap = format!(r#"{{"default_inactivity_days": {MAX_DAY_SPAN}}}"#);
        assert!(FollowUpConfig::from_json(&at_cap).is_ok());
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            FollowUpConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"default_min_visits": 5}}"#).unwrap();
        let config = FollowUpConfig::load(file.path()).unwrap();
        assert_eq!(config.default_min_visits, 5);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = FollowUpConfig::load(Path::new("/nonexistent/followup.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
