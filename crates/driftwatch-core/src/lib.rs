//! Driftwatch Core - pure drift analysis kernel
//!
//! This crate provides the synchronous half of drift detection:
//! - Snapshot, change and analysis models
//! - The comparator set, one keyed entity differ per configuration domain
//! - The drift classifier assigning category and severity to each change
//! - Summary statistics, risk assessment and change digests
//! - Configuration, error and logging facilities shared by the other crates
//!
//! Nothing here performs I/O beyond reading a configuration file; snapshot
//! retrieval, auditing and scheduling live in `driftwatch-engine`.

pub mod classify;
pub mod compare;
pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod render;
pub mod summary;

// Re-export commonly used types
pub use classify::{classify, classify_all, classify_change, Classification};
pub use compare::{compare, CompareContext, Comparator};
pub use config::{DriftConfig, EngineConfig, ManualConfig, ScheduleConfig};
pub use errors::{DriftError, ExError, ExErrorKind, Result};
pub use model::{
    AnalysisStage, ChangeType, DriftAnalysisResult, DriftCategory, DriftChange,
    DriftDetectionRequest, DriftDetectionResponse, DriftFailure, DriftOutcome, DriftSeverity,
    RawChange, Snapshot, SnapshotType,
};
pub use render::render_human_summary;
pub use summary::{changes_digest, summarize, DriftRules, DriftSummary};
