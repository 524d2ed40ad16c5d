//! Drift configuration loaded from TOML.
//!
//! Every section and field is optional; anything omitted takes its default.
//!
//! ```toml
//! [engine]
//! lookback_hours = 24
//! max_snapshots = 10
//!
//! [rules]
//! breaking_categories = ["STRUCTURAL_DRIFT", "CAPABILITY_DRIFT"]
//! breaking_min_severity = "HIGH"
//!
//! [schedule]
//! critical_types = ["pipeline", "workflow", "ai_worker"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::snapshot::SnapshotType;
use crate::summary::DriftRules;

/// Longest accepted snapshot lookback, ten years.
pub const MAX_LOOKBACK_HOURS: u32 = 24 * 365 * 10;
/// Longest accepted pattern window, ten years.
pub const MAX_PATTERN_WINDOW_DAYS: u32 = 365 * 10;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub engine: EngineConfig,
    pub rules: DriftRules,
    pub schedule: ScheduleConfig,
    pub manual: ManualConfig,
}

/// Snapshot resolution window used when a request names no explicit pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lookback_hours: u32,
    pub max_snapshots: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 24,
            max_snapshots: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Types covered by the hourly sweep
    pub critical_types: Vec<SnapshotType>,
    /// Upper bound on jobs running at once; further starts are rejected
    pub max_active_jobs: usize,
    /// Trailing window examined by the weekly pattern sweep
    pub pattern_window_days: u32,
    /// Analyses retained for pattern analysis, oldest evicted first
    pub history_capacity: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            critical_types: vec![
                SnapshotType::Pipeline,
                SnapshotType::Workflow,
                SnapshotType::AiWorker,
            ],
            max_active_jobs: 8,
            pattern_window_days: 7,
            history_capacity: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualConfig {
    pub max_tracked_requests: usize,
    /// Terminal requests older than this are purged
    pub completed_retention_secs: u64,
}

impl Default for ManualConfig {
    fn default() -> Self {
        Self {
            max_tracked_requests: 1000,
            completed_retention_secs: 3600,
        }
    }
}

impl DriftConfig {
    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// `ExErrorKind::Config` when the TOML is invalid or a value fails
    /// validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DriftConfig = toml::from_str(content).map_err(|e| {
            ExError::new(ExErrorKind::Config)
                .with_op("load_config")
                .with_message(format!("TOML parse error: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// `ExErrorKind::Io` when the file cannot be read, otherwise as
    /// [`DriftConfig::from_toml_str`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("load_config")
                .with_message(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Check value ranges. Callers that edit a loaded config re-run this.
    ///
    /// # Errors
    ///
    /// `ExErrorKind::Config` naming the first offending value.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(ExError::new(ExErrorKind::Config)
                .with_op("load_config")
                .with_message(message))
        };
        if self.engine.lookback_hours == 0 {
            return invalid("engine.lookback_hours must be positive");
        }
        if self.engine.lookback_hours > MAX_LOOKBACK_HOURS {
            return invalid("engine.lookback_hours exceeds ten years");
        }
        if self.engine.max_snapshots < 2 {
            return invalid("engine.max_snapshots must be at least 2");
        }
        if self.schedule.max_active_jobs == 0 {
            return invalid("schedule.max_active_jobs must be positive");
        }
        if self.schedule.pattern_window_days == 0
            || self.schedule.pattern_window_days > MAX_PATTERN_WINDOW_DAYS
        {
            return invalid("schedule.pattern_window_days must be between 1 and 3650");
        }
        if self.schedule.critical_types.is_empty() {
            return invalid("schedule.critical_types cannot be empty");
        }
        if self.manual.max_tracked_requests == 0 {
            return invalid("manual.max_tracked_requests must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::change::{DriftCategory, DriftSeverity};

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = DriftConfig::from_toml_str("").unwrap();
        assert_eq!(config, DriftConfig::default());
        assert_eq!(config.engine.lookback_hours, 24);
        assert_eq!(config.schedule.critical_types.len(), 3);
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let config = DriftConfig::from_toml_str(
            r#"
            [engine]
            lookback_hours = 48

            [rules]
            breaking_categories = ["CONFIG_DRIFT"]
            breaking_min_severity = "CRITICAL"

            [schedule]
            critical_types = ["calendar"]
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.lookback_hours, 48);
        assert_eq!(config.engine.max_snapshots, 10);
        assert_eq!(config.rules.breaking_categories, vec![DriftCategory::ConfigDrift]);
        assert_eq!(config.rules.breaking_min_severity, DriftSeverity::Critical);
        assert_eq!(config.rules.review_change_count, 25);
        assert_eq!(config.schedule.critical_types, vec![SnapshotType::Calendar]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = DriftConfig::from_toml_str("[engine]\nmax_snapshots = 1\n").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);

        let err = DriftConfig::from_toml_str("[schedule]\ncritical_types = [\"invoice\"]\n")
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }

    #[test]
    fn test_out_of_range_windows_are_rejected() {
        let err = DriftConfig::from_toml_str("[engine]\nlookback_hours = 4294967295\n")
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
        assert!(err.message().contains("lookback_hours"));

        let err = DriftConfig::from_toml_str("[schedule]\npattern_window_days = 4294967295\n")
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);

        let mut config = DriftConfig::default();
        config.engine.lookback_hours = MAX_LOOKBACK_HOURS;
        assert!(config.validate().is_ok());
        config.engine.lookback_hours += 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = DriftConfig::from_file(Path::new("/nonexistent/driftwatch.toml")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Io);
    }
}
