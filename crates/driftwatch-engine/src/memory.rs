//! In-memory collaborator implementations.
//!
//! `InMemorySnapshotStore` backs the CLI and tests; the `Recording*` sinks
//! keep every call so tests can assert on side effects.
//!
//! ## Limitations
//!
//! - No persistence: everything is lost when the process exits
//! - Single-process only

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use dashmap::DashMap;
use driftwatch_core::errors::Result;
use driftwatch_core::Snapshot;

use crate::ports::{
    AlertSink, AuditSink, CriticalDriftAlert, Details, MetricsRecorder, SnapshotQuery,
    SnapshotStore, TenantAccount, TenantDirectory,
};

/// Snapshot store keyed by snapshot id. Also serves as the tenant
/// directory: every (tenant, account) pair with a stored snapshot is known.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: DashMap<String, Snapshot>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a snapshot.
    pub fn insert(&self, snapshot: Snapshot) {
        self.snapshots.insert(snapshot.snapshot_id.clone(), snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl FromIterator<Snapshot> for InMemorySnapshotStore {
    fn from_iter<I: IntoIterator<Item = Snapshot>>(iter: I) -> Self {
        let store = Self::new();
        for snapshot in iter {
            store.insert(snapshot);
        }
        store
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn retrieve(&self, snapshot_id: &str) -> Result<Option<Snapshot>> {
        Ok(self.snapshots.get(snapshot_id).map(|s| s.value().clone()))
    }

    async fn query(&self, query: &SnapshotQuery) -> Result<Vec<Snapshot>> {
        let mut matches: Vec<Snapshot> = self
            .snapshots
            .iter()
            .filter(|entry| {
                let s = entry.value();
                s.tenant_id == query.tenant_id
                    && s.external_account_id == query.external_account_id
                    && s.snapshot_type == query.snapshot_type
                    && s.captured_at >= query.from
                    && s.captured_at <= query.to
            })
            .map(|entry| entry.value().clone())
            .collect();
        // Newest first, so truncation keeps the most recent captures.
        matches.sort_by(|a, b| {
            b.captured_at
                .cmp(&a.captured_at)
                .then_with(|| b.snapshot_id.cmp(&a.snapshot_id))
        });
        matches.truncate(query.limit);
        Ok(matches)
    }
}

#[async_trait]
impl TenantDirectory for InMemorySnapshotStore {
    async fn list_tenants(&self) -> Result<Vec<TenantAccount>> {
        let tenants: BTreeSet<TenantAccount> = self
            .snapshots
            .iter()
            .map(|entry| TenantAccount::new(&entry.tenant_id, &entry.external_account_id))
            .collect();
        Ok(tenants.into_iter().collect())
    }
}

/// One recorded audit call.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub event_name: String,
    pub details: Details,
    pub source: String,
    pub tenant_id: String,
}

#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditRecord>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditRecord> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events whose details carry `correlation_id`.
    pub fn for_correlation(&self, correlation_id: &str) -> Vec<AuditRecord> {
        self.events()
            .into_iter()
            .filter(|e| {
                e.details.get("correlation_id").and_then(|v| v.as_str()) == Some(correlation_id)
            })
            .collect()
    }
}

impl AuditSink for RecordingAuditSink {
    fn log_event(&self, event_name: &str, details: &Details, source: &str, tenant_id: &str) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(AuditRecord {
                event_name: event_name.to_string(),
                details: details.clone(),
                source: source.to_string(),
                tenant_id: tenant_id.to_string(),
            });
    }
}

#[derive(Debug, Default)]
pub struct RecordingMetrics {
    records: Mutex<Vec<Details>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Details> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MetricsRecorder for RecordingMetrics {
    fn record(&self, details: &Details) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(details.clone());
    }
}

#[derive(Debug, Default)]
pub struct RecordingAlerts {
    alerts: Mutex<Vec<CriticalDriftAlert>>,
}

impl RecordingAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<CriticalDriftAlert> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AlertSink for RecordingAlerts {
    fn critical_drift(&self, alert: &CriticalDriftAlert) {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(alert.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use driftwatch_core::SnapshotType;
    use serde_json::json;

    fn snap(id: &str, tenant: &str, minutes_ago: i64) -> Snapshot {
        Snapshot {
            snapshot_id: id.to_string(),
            tenant_id: tenant.to_string(),
            external_account_id: "acct".to_string(),
            snapshot_type: SnapshotType::Pipeline,
            captured_at: Utc::now() - Duration::minutes(minutes_ago),
            payload: json!({}),
        }
    }

    #[tokio::test]
    async fn test_query_returns_newest_first_within_limit() {
        let store: InMemorySnapshotStore = vec![
            snap("s1", "t1", 30),
            snap("s2", "t1", 20),
            snap("s3", "t1", 10),
            snap("other", "t2", 5),
        ]
        .into_iter()
        .collect();

        let now = Utc::now();
        let found = store
            .query(&SnapshotQuery {
                tenant_id: "t1".to_string(),
                external_account_id: "acct".to_string(),
                snapshot_type: SnapshotType::Pipeline,
                from: now - Duration::hours(1),
                to: now,
                limit: 2,
            })
            .await
            .unwrap();

        let ids: Vec<&str> = found.iter().map(|s| s.snapshot_id.as_str()).collect();
        assert_eq!(ids, vec!["s3", "s2"]);
    }

    #[tokio::test]
    async fn test_list_tenants_is_sorted_and_distinct() {
        let store: InMemorySnapshotStore =
            vec![snap("a", "t2", 3), snap("b", "t1", 2), snap("c", "t2", 1)]
                .into_iter()
                .collect();
        let tenants = store.list_tenants().await.unwrap();
        assert_eq!(
            tenants,
            vec![TenantAccount::new("t1", "acct"), TenantAccount::new("t2", "acct")]
        );
    }

    #[tokio::test]
    async fn test_retrieve_missing_is_none() {
        let store = InMemorySnapshotStore::new();
        assert!(store.retrieve("nope").await.unwrap().is_none());
    }
}
