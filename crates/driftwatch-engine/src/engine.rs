//! Drift Detection Engine.
//!
//! Orchestrates one comparison per request through the stages
//! `RESOLVING_SNAPSHOTS -> COMPARING -> CLASSIFYING -> SUMMARIZING ->
//! AUDITING -> DONE`; any stage may end in `FAILED`. Every request, whatever
//! its outcome, emits exactly one audit event and one metrics record tagged
//! with its correlation id.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use driftwatch_core::errors::{DriftError, ExError, ExErrorKind, Result};
use driftwatch_core::{
    changes_digest, classify_all, compare, summarize, AnalysisStage, CompareContext, DriftConfig,
    DriftAnalysisResult, DriftDetectionRequest, DriftDetectionResponse, DriftFailure,
    DriftOutcome, DriftRules, EngineConfig, Snapshot,
};
use driftwatch_core::{log_op_end, log_op_error, log_op_start};
use driftwatch_core_types::schema::{
    AUDIT_ANALYSIS_COMPLETED, AUDIT_ANALYSIS_FAILED, AUDIT_SOURCE_ENGINE,
    FIELD_AFTER_SNAPSHOT_ID, FIELD_ANALYSIS_ID, FIELD_BEFORE_SNAPSHOT_ID, FIELD_CORRELATION_ID,
    FIELD_DURATION_MS, FIELD_ERR_CODE, FIELD_ERR_MESSAGE, FIELD_EXTERNAL_ACCOUNT_ID,
    FIELD_HAS_BREAKING, FIELD_MAX_SEVERITY, FIELD_REQUIRES_REVIEW, FIELD_SNAPSHOT_TYPE,
    FIELD_STAGE, FIELD_SUCCESS, FIELD_TENANT_ID, FIELD_TOTAL_CHANGES,
};
use driftwatch_core_types::AnalysisId;
use serde_json::Value;

use crate::ports::{AuditSink, Details, MetricsRecorder, SnapshotQuery, SnapshotStore};

const OP_ANALYZE: &str = "analyze_drift";

pub struct DriftDetectionEngine {
    store: Arc<dyn SnapshotStore>,
    audit: Arc<dyn AuditSink>,
    metrics: Option<Arc<dyn MetricsRecorder>>,
    settings: EngineConfig,
    rules: DriftRules,
}

impl DriftDetectionEngine {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        audit: Arc<dyn AuditSink>,
        metrics: Option<Arc<dyn MetricsRecorder>>,
        config: &DriftConfig,
    ) -> Self {
        Self {
            store,
            audit,
            metrics,
            settings: config.engine.clone(),
            rules: config.rules.clone(),
        }
    }

    /// Run one comparison. Never returns an error: failures come back as
    /// [`DriftOutcome::Failed`] with the stage that was executing.
    pub async fn analyze_drift(&self, request: DriftDetectionRequest) -> DriftDetectionResponse {
        let started = Instant::now();
        log_op_start!(
            OP_ANALYZE,
            correlation_id = %request.correlation_id,
            tenant_id = %request.tenant_id,
            snapshot_type = %request.snapshot_type
        );

        let mut stage = AnalysisStage::ResolvingSnapshots;
        let outcome = self.run(&request, &mut stage).await;
        let duration_ms = elapsed_ms(started);

        let outcome = match outcome {
            Ok(result) => {
                self.audit_completed(&result, duration_ms);
                self.record_metrics(&request, duration_ms, Some(&result));
                log_op_end!(
                    OP_ANALYZE,
                    duration_ms = duration_ms,
                    correlation_id = %request.correlation_id,
                    total_changes = result.summary.total_changes,
                    max_severity = %result.summary.max_severity
                );
                DriftOutcome::Completed(Box::new(result))
            }
            Err(err) => {
                let err = err
                    .with_op(OP_ANALYZE)
                    .with_tenant_id(request.tenant_id.clone())
                    .with_snapshot_type(request.snapshot_type)
                    .with_correlation_id(request.correlation_id.clone());
                self.audit_failed(&request, stage, &err, duration_ms);
                self.record_metrics(&request, duration_ms, None);
                log_op_error!(
                    OP_ANALYZE,
                    &err,
                    duration_ms = duration_ms,
                    correlation_id = %request.correlation_id,
                    stage = stage.as_str()
                );
                DriftOutcome::Failed(DriftFailure { stage, error: err })
            }
        };

        DriftDetectionResponse {
            correlation_id: request.correlation_id,
            duration_ms,
            outcome,
        }
    }

    async fn run(
        &self,
        request: &DriftDetectionRequest,
        stage: &mut AnalysisStage,
    ) -> Result<DriftAnalysisResult> {
        let (before, after) = self.resolve_snapshots(request).await?;

        *stage = AnalysisStage::Comparing;
        let context = CompareContext::new(request.snapshot_type).with_tenant_id(&request.tenant_id);
        let raw = compare(&before.payload, &after.payload, &context)?;

        *stage = AnalysisStage::Classifying;
        let changes = classify_all(raw, request.snapshot_type);

        *stage = AnalysisStage::Summarizing;
        let summary = summarize(&changes, &self.rules);
        let digest = changes_digest(&changes);

        *stage = AnalysisStage::Auditing;
        Ok(DriftAnalysisResult {
            analysis_id: AnalysisId::new(),
            correlation_id: request.correlation_id.clone(),
            tenant_id: request.tenant_id.clone(),
            external_account_id: request.external_account_id.clone(),
            snapshot_type: request.snapshot_type,
            before_snapshot_id: before.snapshot_id,
            after_snapshot_id: after.snapshot_id,
            before_captured_at: before.captured_at,
            after_captured_at: after.captured_at,
            analyzed_at: Utc::now(),
            changes,
            summary,
            changes_digest: digest,
        })
    }

    async fn resolve_snapshots(
        &self,
        request: &DriftDetectionRequest,
    ) -> Result<(Snapshot, Snapshot)> {
        if request.tenant_id.trim().is_empty() {
            return Err(DriftError::MissingTenant.into());
        }
        if request.external_account_id.trim().is_empty() {
            return Err(DriftError::MissingExternalAccount.into());
        }

        let (before, after) = match (&request.before_snapshot_id, &request.after_snapshot_id) {
            (Some(before_id), Some(after_id)) => {
                (self.fetch(before_id).await?, self.fetch(after_id).await?)
            }
            (None, None) => self.latest_pair(request).await?,
            _ => {
                return Err(ExError::new(ExErrorKind::InvalidInput).with_message(
                    "beforeSnapshotId and afterSnapshotId must be given together",
                ))
            }
        };

        validate_pair(request, &before, &after)?;
        Ok((before, after))
    }

    async fn fetch(&self, snapshot_id: &str) -> Result<Snapshot> {
        self.store
            .retrieve(snapshot_id)
            .await?
            .ok_or_else(|| {
                DriftError::SnapshotNotFound {
                    snapshot_id: snapshot_id.to_string(),
                }
                .into()
            })
    }

    /// Newest capture in the lookback window is `after`, the one before it
    /// is `before`.
    async fn latest_pair(&self, request: &DriftDetectionRequest) -> Result<(Snapshot, Snapshot)> {
        let to = Utc::now();
        let from = to
            .checked_sub_signed(Duration::hours(i64::from(self.settings.lookback_hours)))
            .ok_or_else(|| {
                ExError::new(ExErrorKind::Config).with_message(format!(
                    "lookback of {} hours is out of range",
                    self.settings.lookback_hours
                ))
            })?;
        let mut found = self
            .store
            .query(&SnapshotQuery {
                tenant_id: request.tenant_id.clone(),
                external_account_id: request.external_account_id.clone(),
                snapshot_type: request.snapshot_type,
                from,
                to,
                limit: self.settings.max_snapshots,
            })
            .await?;

        if found.len() < 2 {
            return Err(DriftError::InsufficientSnapshots { found: found.len() }.into());
        }
        found.sort_by(|a, b| {
            b.captured_at
                .cmp(&a.captured_at)
                .then_with(|| b.snapshot_id.cmp(&a.snapshot_id))
        });
        let mut newest = found.into_iter();
        match (newest.next(), newest.next()) {
            (Some(after), Some(before)) => Ok((before, after)),
            _ => Err(ExError::new(ExErrorKind::Internal).with_message("snapshot window shrank")),
        }
    }

    fn audit_completed(&self, result: &DriftAnalysisResult, duration_ms: u64) {
        let mut details = Details::new();
        details.insert(FIELD_CORRELATION_ID.into(), result.correlation_id.as_str().into());
        details.insert(FIELD_ANALYSIS_ID.into(), result.analysis_id.as_str().into());
        details.insert(FIELD_EXTERNAL_ACCOUNT_ID.into(), result.external_account_id.clone().into());
        details.insert(FIELD_SNAPSHOT_TYPE.into(), result.snapshot_type.as_str().into());
        details.insert(FIELD_BEFORE_SNAPSHOT_ID.into(), result.before_snapshot_id.clone().into());
        details.insert(FIELD_AFTER_SNAPSHOT_ID.into(), result.after_snapshot_id.clone().into());
        details.insert(FIELD_TOTAL_CHANGES.into(), result.summary.total_changes.into());
        details.insert(FIELD_MAX_SEVERITY.into(), result.summary.max_severity.as_str().into());
        details.insert(FIELD_HAS_BREAKING.into(), result.summary.has_breaking_changes.into());
        details.insert(FIELD_REQUIRES_REVIEW.into(), result.summary.requires_review.into());
        details.insert(FIELD_DURATION_MS.into(), duration_ms.into());
        self.audit.log_event(
            AUDIT_ANALYSIS_COMPLETED,
            &details,
            AUDIT_SOURCE_ENGINE,
            &result.tenant_id,
        );
    }

    fn audit_failed(
        &self,
        request: &DriftDetectionRequest,
        stage: AnalysisStage,
        err: &ExError,
        duration_ms: u64,
    ) {
        let mut details = Details::new();
        details.insert(FIELD_CORRELATION_ID.into(), request.correlation_id.as_str().into());
        details.insert(FIELD_EXTERNAL_ACCOUNT_ID.into(), request.external_account_id.clone().into());
        details.insert(FIELD_SNAPSHOT_TYPE.into(), request.snapshot_type.as_str().into());
        details.insert(FIELD_STAGE.into(), stage.as_str().into());
        details.insert(FIELD_ERR_CODE.into(), err.code().into());
        details.insert(FIELD_ERR_MESSAGE.into(), err.message().into());
        details.insert(FIELD_DURATION_MS.into(), duration_ms.into());
        self.audit.log_event(
            AUDIT_ANALYSIS_FAILED,
            &details,
            AUDIT_SOURCE_ENGINE,
            &request.tenant_id,
        );
    }

    fn record_metrics(
        &self,
        request: &DriftDetectionRequest,
        duration_ms: u64,
        result: Option<&DriftAnalysisResult>,
    ) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        let mut details = Details::new();
        details.insert(FIELD_CORRELATION_ID.into(), request.correlation_id.as_str().into());
        details.insert(FIELD_TENANT_ID.into(), request.tenant_id.clone().into());
        details.insert(FIELD_SNAPSHOT_TYPE.into(), request.snapshot_type.as_str().into());
        details.insert(FIELD_SUCCESS.into(), result.is_some().into());
        details.insert(FIELD_DURATION_MS.into(), duration_ms.into());
        details.insert(
            FIELD_TOTAL_CHANGES.into(),
            result.map_or(0, |r| r.summary.total_changes).into(),
        );
        details.insert(
            FIELD_MAX_SEVERITY.into(),
            result.map_or(Value::Null, |r| r.summary.max_severity.as_str().into()),
        );
        metrics.record(&details);
    }
}

fn validate_pair(request: &DriftDetectionRequest, before: &Snapshot, after: &Snapshot) -> Result<()> {
    if before.snapshot_type != request.snapshot_type || after.snapshot_type != request.snapshot_type
    {
        return Err(DriftError::SnapshotTypeMismatch {
            before: before.snapshot_type,
            after: after.snapshot_type,
            requested: request.snapshot_type,
        }
        .into());
    }
    for snapshot in [before, after] {
        if snapshot.tenant_id != request.tenant_id {
            return Err(DriftError::TenantMismatch {
                snapshot_id: snapshot.snapshot_id.clone(),
                expected: request.tenant_id.clone(),
                actual: snapshot.tenant_id.clone(),
            }
            .into());
        }
        if snapshot.external_account_id != request.external_account_id {
            return Err(DriftError::AccountMismatch {
                snapshot_id: snapshot.snapshot_id.clone(),
                expected: request.external_account_id.clone(),
                actual: snapshot.external_account_id.clone(),
            }
            .into());
        }
    }
    if !before.is_comparable_with(after) {
        return Err(DriftError::NonChronological {
            before_id: before.snapshot_id.clone(),
            after_id: after.snapshot_id.clone(),
        }
        .into());
    }
    Ok(())
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
