//! Shared fixtures for engine and trigger integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use driftwatch_core::{DriftConfig, Snapshot, SnapshotType};
use driftwatch_engine::{
    DriftDetectionEngine, InMemorySnapshotStore, MetricsRecorder, RecordingAlerts,
    RecordingAuditSink, RecordingMetrics,
};
use serde_json::{json, Value};

pub struct Harness {
    pub store: Arc<InMemorySnapshotStore>,
    pub audit: Arc<RecordingAuditSink>,
    pub metrics: Arc<RecordingMetrics>,
    pub alerts: Arc<RecordingAlerts>,
    pub engine: Arc<DriftDetectionEngine>,
    pub config: DriftConfig,
}

pub fn harness() -> Harness {
    harness_with(DriftConfig::default())
}

pub fn harness_with(config: DriftConfig) -> Harness {
    let store = Arc::new(InMemorySnapshotStore::new());
    let audit = Arc::new(RecordingAuditSink::new());
    let metrics = Arc::new(RecordingMetrics::new());
    let engine = Arc::new(DriftDetectionEngine::new(
        store.clone(),
        audit.clone(),
        Some(metrics.clone() as Arc<dyn MetricsRecorder>),
        &config,
    ));
    Harness {
        store,
        audit,
        metrics,
        alerts: Arc::new(RecordingAlerts::new()),
        engine,
        config,
    }
}

/// Snapshot captured `minutes_ago` minutes before now.
pub fn snapshot(
    id: &str,
    tenant: &str,
    ty: SnapshotType,
    minutes_ago: i64,
    payload: Value,
) -> Snapshot {
    Snapshot {
        snapshot_id: id.to_string(),
        tenant_id: tenant.to_string(),
        external_account_id: format!("{}-acct", tenant),
        snapshot_type: ty,
        captured_at: Utc::now() - Duration::minutes(minutes_ago),
        payload,
    }
}

pub fn pipeline_before() -> Value {
    json!({"pipelines": [{"id": "P", "name": "Sales", "stages": [
        {"id": "A", "name": "Lead"},
        {"id": "B", "name": "Qualified"},
        {"id": "C", "name": "Won"}
    ]}]})
}

pub fn pipeline_after() -> Value {
    json!({"pipelines": [{"id": "P", "name": "Sales", "stages": [
        {"id": "A", "name": "Lead"},
        {"id": "C", "name": "Closed Won"}
    ]}]})
}

/// Seed the canonical pipeline pair for `tenant` as `<tenant>-p1` / `<tenant>-p2`.
pub fn seed_pipeline_pair(store: &InMemorySnapshotStore, tenant: &str) {
    store.insert(snapshot(
        &format!("{}-p1", tenant),
        tenant,
        SnapshotType::Pipeline,
        30,
        pipeline_before(),
    ));
    store.insert(snapshot(
        &format!("{}-p2", tenant),
        tenant,
        SnapshotType::Pipeline,
        10,
        pipeline_after(),
    ));
}

/// Seed an AI-worker pair whose capability list grows.
pub fn seed_capability_growth(store: &InMemorySnapshotStore, tenant: &str) {
    store.insert(snapshot(
        &format!("{}-w1", tenant),
        tenant,
        SnapshotType::AiWorker,
        30,
        json!({"ai_workers": [{"id": "W", "capabilities": ["qualification"]}]}),
    ));
    store.insert(snapshot(
        &format!("{}-w2", tenant),
        tenant,
        SnapshotType::AiWorker,
        10,
        json!({"ai_workers": [{"id": "W", "capabilities": ["qualification", "scheduling"]}]}),
    ));
}

/// Seed a pipeline pair whose payloads the comparator rejects.
pub fn seed_malformed_pipeline(store: &InMemorySnapshotStore, tenant: &str) {
    store.insert(snapshot(
        &format!("{}-bad1", tenant),
        tenant,
        SnapshotType::Pipeline,
        30,
        json!({"pipelines": "not-a-list"}),
    ));
    store.insert(snapshot(
        &format!("{}-bad2", tenant),
        tenant,
        SnapshotType::Pipeline,
        10,
        json!({"pipelines": []}),
    ));
}
