//! Collaborator ports consumed by the engine and trigger layer.
//!
//! Snapshot retrieval and tenant discovery are async and fallible. Audit,
//! metrics and alerting are fire-and-forget side channels: they return
//! nothing, so a failing sink can never change an analysis outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use driftwatch_core::errors::Result;
use driftwatch_core::{DriftSeverity, Snapshot, SnapshotType};
use driftwatch_core_types::{AnalysisId, CorrelationId, RunId};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Flat detail map carried by audit events and metric records.
pub type Details = Map<String, Value>;

/// Filter for [`SnapshotStore::query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotQuery {
    pub tenant_id: String,
    pub external_account_id: String,
    pub snapshot_type: SnapshotType,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub limit: usize,
}

/// Read access to captured snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Fetch one snapshot by id; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Implementations report transport or storage failures as
    /// `ExErrorKind::ExternalService`.
    async fn retrieve(&self, snapshot_id: &str) -> Result<Option<Snapshot>>;

    /// Snapshots matching `query`, at most `query.limit` of them.
    ///
    /// # Errors
    ///
    /// As [`SnapshotStore::retrieve`].
    async fn query(&self, query: &SnapshotQuery) -> Result<Vec<Snapshot>>;
}

/// One (tenant, external account) pair known to the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TenantAccount {
    pub tenant_id: String,
    pub external_account_id: String,
}

impl TenantAccount {
    pub fn new(tenant_id: impl Into<String>, external_account_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            external_account_id: external_account_id.into(),
        }
    }
}

/// Source of "all known tenants" for scheduled sweeps.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// # Errors
    ///
    /// Implementations report lookup failures as `ExErrorKind::ExternalService`.
    async fn list_tenants(&self) -> Result<Vec<TenantAccount>>;
}

pub trait AuditSink: Send + Sync {
    fn log_event(&self, event_name: &str, details: &Details, source: &str, tenant_id: &str);
}

pub trait MetricsRecorder: Send + Sync {
    fn record(&self, details: &Details);
}

/// Escalation raised when a sweep finds `CRITICAL` drift.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalDriftAlert {
    pub run_id: RunId,
    pub sweep_kind: String,
    pub tenant_id: String,
    pub external_account_id: String,
    pub snapshot_type: SnapshotType,
    pub analysis_id: AnalysisId,
    pub correlation_id: CorrelationId,
    pub max_severity: DriftSeverity,
    pub critical_changes: usize,
    pub has_breaking_changes: bool,
    pub risk_text: String,
}

pub trait AlertSink: Send + Sync {
    fn critical_drift(&self, alert: &CriticalDriftAlert);
}

/// Writes audit events to the `tracing` pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn log_event(&self, event_name: &str, details: &Details, source: &str, tenant_id: &str) {
        let details = Value::Object(details.clone());
        info!(
            audit.event = event_name,
            audit.source = source,
            tenant_id = tenant_id,
            audit.details = %details,
            "audit event"
        );
    }
}

/// Drops every alert.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAlertSink;

impl AlertSink for NoopAlertSink {
    fn critical_drift(&self, _: &CriticalDriftAlert) {}
}

/// Emits every alert as a `WARN` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn critical_drift(&self, alert: &CriticalDriftAlert) {
        warn!(
            run_id = %alert.run_id,
            sweep_kind = %alert.sweep_kind,
            tenant_id = %alert.tenant_id,
            snapshot_type = %alert.snapshot_type,
            analysis_id = %alert.analysis_id,
            critical_changes = alert.critical_changes,
            "critical drift detected: {}",
            alert.risk_text
        );
    }
}
