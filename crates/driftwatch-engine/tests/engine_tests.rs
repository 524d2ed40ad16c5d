//! Drift Detection Engine integration tests.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use common::*;
use driftwatch_core::{
    AnalysisStage, DriftConfig, DriftDetectionRequest, DriftSeverity, ExErrorKind, SnapshotType,
};
use driftwatch_core_types::schema::{
    AUDIT_ANALYSIS_COMPLETED, AUDIT_ANALYSIS_FAILED, AUDIT_SOURCE_ENGINE,
};
use driftwatch_engine::{DriftDetectionEngine, InMemorySnapshotStore, RecordingAuditSink};
use serde_json::{json, Value};

fn pipeline_request(tenant: &str) -> DriftDetectionRequest {
    DriftDetectionRequest::latest(tenant, format!("{}-acct", tenant), SnapshotType::Pipeline)
}

#[tokio::test]
async fn test_removed_stage_and_rename_are_detected() {
    let h = harness();
    seed_pipeline_pair(&h.store, "t1");

    let response = h.engine.analyze_drift(pipeline_request("t1")).await;
    let result = response.result().unwrap();

    assert_eq!(result.before_snapshot_id, "t1-p1");
    assert_eq!(result.after_snapshot_id, "t1-p2");
    assert_eq!(result.summary.total_changes, 2);
    assert_eq!(result.summary.max_severity, DriftSeverity::High);
    assert!(result.summary.has_breaking_changes);
    assert!(result.summary.requires_review);
}

#[tokio::test]
async fn test_every_request_audits_exactly_once() {
    let h = harness();
    seed_pipeline_pair(&h.store, "t1");

    let ok = h.engine.analyze_drift(pipeline_request("t1")).await;
    let failed = h.engine.analyze_drift(pipeline_request("nobody")).await;
    assert!(ok.is_success());
    assert!(!failed.is_success());

    let ok_events = h.audit.for_correlation(ok.correlation_id.as_str());
    assert_eq!(ok_events.len(), 1);
    assert_eq!(ok_events[0].event_name, AUDIT_ANALYSIS_COMPLETED);
    assert_eq!(ok_events[0].source, AUDIT_SOURCE_ENGINE);
    assert_eq!(ok_events[0].tenant_id, "t1");
    assert_eq!(ok_events[0].details["total_changes"], json!(2));

    let failed_events = h.audit.for_correlation(failed.correlation_id.as_str());
    assert_eq!(failed_events.len(), 1);
    assert_eq!(failed_events[0].event_name, AUDIT_ANALYSIS_FAILED);
    assert_eq!(failed_events[0].source, AUDIT_SOURCE_ENGINE);
    assert_eq!(
        failed_events[0].details["stage"],
        json!(AnalysisStage::ResolvingSnapshots.as_str())
    );

    assert_eq!(h.audit.events().len(), 2);
}

#[tokio::test]
async fn test_metrics_record_success_and_failure() {
    let h = harness();
    seed_pipeline_pair(&h.store, "t1");

    h.engine.analyze_drift(pipeline_request("t1")).await;
    h.engine.analyze_drift(pipeline_request("nobody")).await;

    let records = h.metrics.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["success"], json!(true));
    assert_eq!(records[0]["tenant_id"], json!("t1"));
    assert_eq!(records[0]["max_severity"], json!("HIGH"));
    assert_eq!(records[1]["success"], json!(false));
    assert_eq!(records[1]["max_severity"], Value::Null);
}

#[tokio::test]
async fn test_engine_without_metrics_still_audits() {
    let store = Arc::new(InMemorySnapshotStore::new());
    seed_pipeline_pair(&store, "t1");
    let audit = Arc::new(RecordingAuditSink::new());
    let engine = DriftDetectionEngine::new(store, audit.clone(), None, &DriftConfig::default());

    let response = engine.analyze_drift(pipeline_request("t1")).await;
    assert!(response.is_success());
    assert_eq!(audit.events().len(), 1);
}

#[tokio::test]
async fn test_reversed_explicit_pair_is_non_chronological() {
    let h = harness();
    seed_pipeline_pair(&h.store, "t1");

    let request = pipeline_request("t1").with_snapshots("t1-p2", "t1-p1");
    let response = h.engine.analyze_drift(request).await;

    let failure = response.failure().unwrap();
    assert_eq!(failure.kind(), ExErrorKind::NonChronological);
    assert_eq!(failure.stage, AnalysisStage::ResolvingSnapshots);
}

#[tokio::test]
async fn test_snapshot_from_another_tenant_is_rejected() {
    let h = harness();
    seed_pipeline_pair(&h.store, "t1");
    seed_pipeline_pair(&h.store, "t2");

    let request = pipeline_request("t1").with_snapshots("t1-p1", "t2-p2");
    let response = h.engine.analyze_drift(request).await;

    assert_eq!(
        response.failure().map(|f| f.kind()),
        Some(ExErrorKind::SnapshotMismatch)
    );
}

#[tokio::test]
async fn test_snapshot_type_mismatch_is_rejected() {
    let h = harness();
    seed_pipeline_pair(&h.store, "t1");
    seed_capability_growth(&h.store, "t1");

    let request = pipeline_request("t1").with_snapshots("t1-p1", "t1-w2");
    let response = h.engine.analyze_drift(request).await;

    assert_eq!(
        response.failure().map(|f| f.kind()),
        Some(ExErrorKind::SnapshotMismatch)
    );
}

#[tokio::test]
async fn test_unknown_snapshot_id_is_not_found() {
    let h = harness();
    seed_pipeline_pair(&h.store, "t1");

    let request = pipeline_request("t1").with_snapshots("t1-p1", "missing");
    let response = h.engine.analyze_drift(request).await;

    let failure = response.failure().unwrap();
    assert_eq!(failure.kind(), ExErrorKind::NotFound);
    assert!(failure.message().contains("missing"));
}

#[tokio::test]
async fn test_missing_tenant_fails_fast() {
    let h = harness();
    let response = h
        .engine
        .analyze_drift(DriftDetectionRequest::latest("  ", "acct", SnapshotType::Pipeline))
        .await;
    assert_eq!(
        response.failure().map(|f| f.kind()),
        Some(ExErrorKind::InvalidInput)
    );
}

#[tokio::test]
async fn test_repeated_explicit_pair_is_deterministic() {
    let h = harness();
    seed_pipeline_pair(&h.store, "t1");

    let first = h
        .engine
        .analyze_drift(pipeline_request("t1").with_snapshots("t1-p1", "t1-p2"))
        .await
        .into_result()
        .unwrap();
    let second = h
        .engine
        .analyze_drift(pipeline_request("t1").with_snapshots("t1-p1", "t1-p2"))
        .await
        .into_result()
        .unwrap();

    assert_ne!(first.analysis_id, second.analysis_id);
    assert_ne!(first.correlation_id, second.correlation_id);
    assert_eq!(first.changes, second.changes);
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.changes_digest, second.changes_digest);
}

#[tokio::test]
async fn test_malformed_payload_fails_while_comparing() {
    let h = harness();
    seed_malformed_pipeline(&h.store, "t1");

    let response = h.engine.analyze_drift(pipeline_request("t1")).await;

    let failure = response.failure().unwrap();
    assert_eq!(failure.kind(), ExErrorKind::MalformedPayload);
    assert_eq!(failure.stage, AnalysisStage::Comparing);
    let events = h.audit.for_correlation(response.correlation_id.as_str());
    assert_eq!(events[0].details["stage"], json!("COMPARING"));
}

#[tokio::test]
async fn test_identical_snapshots_report_no_drift() {
    let h = harness();
    h.store
        .insert(snapshot("a", "t1", SnapshotType::Pipeline, 30, pipeline_before()));
    h.store
        .insert(snapshot("b", "t1", SnapshotType::Pipeline, 10, pipeline_before()));

    let result = h
        .engine
        .analyze_drift(pipeline_request("t1"))
        .await
        .into_result()
        .unwrap();

    assert_eq!(result.summary.total_changes, 0);
    assert_eq!(result.summary.max_severity, DriftSeverity::Low);
    assert!(!result.summary.has_breaking_changes);
    assert!(!result.summary.requires_review);
}

#[tokio::test]
async fn test_single_snapshot_is_insufficient() {
    let h = harness();
    h.store
        .insert(snapshot("only", "t1", SnapshotType::Pipeline, 10, pipeline_before()));

    let response = h.engine.analyze_drift(pipeline_request("t1")).await;
    assert_eq!(
        response.failure().map(|f| f.kind()),
        Some(ExErrorKind::InsufficientSnapshots)
    );
}
