//! Driftwatch Engine - async orchestration layer
//!
//! Wires the pure analysis kernel in `driftwatch-core` to its collaborators:
//! - [`DriftDetectionEngine`] resolves snapshot pairs, runs comparison,
//!   classification and summary, and emits audit and metrics side effects
//! - [`trigger::ScheduledTrigger`] runs the daily, hourly and weekly sweeps
//! - [`trigger::ManualTrigger`] accepts and tracks on-demand requests
//! - [`ports`] defines the snapshot store, tenant directory, audit, metrics
//!   and alert seams, with in-memory implementations in [`memory`]

pub mod engine;
pub mod memory;
pub mod ports;
pub mod trigger;

pub use engine::DriftDetectionEngine;
pub use memory::{InMemorySnapshotStore, RecordingAlerts, RecordingAuditSink, RecordingMetrics};
pub use ports::{
    AlertSink, AuditSink, CriticalDriftAlert, Details, MetricsRecorder, NoopAlertSink,
    SnapshotQuery, SnapshotStore, TenantAccount, TenantDirectory, TracingAlertSink,
    TracingAuditSink,
};
pub use trigger::{
    JobInfo, ManualDriftRequest, ManualDriftResponse, ManualRequestRecord, ManualRequestStatus,
    ManualTrigger, ManualTypeResult, PatternReport, Priority, ScheduledTrigger, SweepEntry,
    SweepEntryOutcome, SweepKind, SweepReport, SweepStatus, CANCELLED_REASON,
};
