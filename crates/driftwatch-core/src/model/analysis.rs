//! Engine request, result and response types.

use chrono::{DateTime, Utc};
use driftwatch_core_types::{AnalysisId, CorrelationId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{ExError, ExErrorKind};
use crate::model::change::DriftChange;
use crate::model::snapshot::SnapshotType;
use crate::summary::DriftSummary;

/// The engine's sole input.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftDetectionRequest {
    pub tenant_id: String,
    pub external_account_id: String,
    pub snapshot_type: SnapshotType,
    /// Explicit pair; when both are absent the engine picks the two most
    /// recent snapshots in its lookback window.
    pub before_snapshot_id: Option<String>,
    pub after_snapshot_id: Option<String>,
    pub correlation_id: CorrelationId,
}

impl DriftDetectionRequest {
    /// Request comparing the latest two snapshots, with a fresh correlation id.
    pub fn latest(
        tenant_id: impl Into<String>,
        external_account_id: impl Into<String>,
        snapshot_type: SnapshotType,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            external_account_id: external_account_id.into(),
            snapshot_type,
            before_snapshot_id: None,
            after_snapshot_id: None,
            correlation_id: CorrelationId::new(),
        }
    }

    pub fn with_snapshots(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.before_snapshot_id = Some(before.into());
        self.after_snapshot_id = Some(after.into());
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}

/// Per-request pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStage {
    ResolvingSnapshots,
    Comparing,
    Classifying,
    Summarizing,
    Auditing,
    Done,
    Failed,
}

impl AnalysisStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStage::ResolvingSnapshots => "RESOLVING_SNAPSHOTS",
            AnalysisStage::Comparing => "COMPARING",
            AnalysisStage::Classifying => "CLASSIFYING",
            AnalysisStage::Summarizing => "SUMMARIZING",
            AnalysisStage::Auditing => "AUDITING",
            AnalysisStage::Done => "DONE",
            AnalysisStage::Failed => "FAILED",
        }
    }

    /// Next stage on success; terminal stages stay put.
    pub fn next(&self) -> AnalysisStage {
        match self {
            AnalysisStage::ResolvingSnapshots => AnalysisStage::Comparing,
            AnalysisStage::Comparing => AnalysisStage::Classifying,
            AnalysisStage::Classifying => AnalysisStage::Summarizing,
            AnalysisStage::Summarizing => AnalysisStage::Auditing,
            AnalysisStage::Auditing => AnalysisStage::Done,
            AnalysisStage::Done => AnalysisStage::Done,
            AnalysisStage::Failed => AnalysisStage::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStage::Done | AnalysisStage::Failed)
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed comparison. Built once by the engine and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftAnalysisResult {
    pub analysis_id: AnalysisId,
    pub correlation_id: CorrelationId,
    pub tenant_id: String,
    pub external_account_id: String,
    pub snapshot_type: SnapshotType,
    pub before_snapshot_id: String,
    pub after_snapshot_id: String,
    pub before_captured_at: DateTime<Utc>,
    pub after_captured_at: DateTime<Utc>,
    pub analyzed_at: DateTime<Utc>,
    pub changes: Vec<DriftChange>,
    pub summary: DriftSummary,
    /// SHA-256 hex of the canonical JSON of `changes`
    pub changes_digest: String,
}

/// Why a request failed and where.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftFailure {
    /// Stage that was executing when the failure occurred
    pub stage: AnalysisStage,
    pub error: ExError,
}

impl DriftFailure {
    pub fn kind(&self) -> ExErrorKind {
        self.error.kind()
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriftOutcome {
    Completed(Box<DriftAnalysisResult>),
    Failed(DriftFailure),
}

/// Success with a result, or failure with a reason; never both.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftDetectionResponse {
    pub correlation_id: CorrelationId,
    pub duration_ms: u64,
    pub outcome: DriftOutcome,
}

impl DriftDetectionResponse {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DriftOutcome::Completed(_))
    }

    pub fn result(&self) -> Option<&DriftAnalysisResult> {
        match &self.outcome {
            DriftOutcome::Completed(result) => Some(result),
            DriftOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&DriftFailure> {
        match &self.outcome {
            DriftOutcome::Completed(_) => None,
            DriftOutcome::Failed(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<DriftAnalysisResult, DriftFailure> {
        match self.outcome {
            DriftOutcome::Completed(result) => Ok(*result),
            DriftOutcome::Failed(failure) => Err(failure),
        }
    }
}
