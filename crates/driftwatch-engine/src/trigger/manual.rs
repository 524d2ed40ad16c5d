//! Manual trigger: on-demand, asynchronous drift requests.
//!
//! `trigger_drift_detection` validates synchronously and returns an
//! `accepted` response at once; the comparisons then run on a spawned task,
//! one snapshot type after another. Each record moves
//! `accepted -> running -> completed | failed` exactly once.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use driftwatch_core::errors::{DriftError, ExError, ExErrorKind, Result};
use driftwatch_core::{
    DriftDetectionRequest, DriftOutcome, DriftSeverity, ManualConfig, SnapshotType,
};
use driftwatch_core::{log_op_end, log_op_error, log_op_start};
use driftwatch_core_types::{AnalysisId, CorrelationId, RequestId};
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::{elapsed_ms, DriftDetectionEngine};

const OP_TRIGGER: &str = "trigger_drift_detection";
const OP_RUN: &str = "run_manual_request";

pub const CANCELLED_REASON: &str = "Cancelled by user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DriftError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            _ => Err(DriftError::InvalidPriority {
                value: s.to_string(),
            }),
        }
    }
}

/// Caller input. Snapshot types and priority arrive as raw strings and are
/// validated before anything is recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualDriftRequest {
    pub tenant_id: String,
    pub external_account_id: String,
    /// `None` means every snapshot type; `Some(vec![])` is rejected
    pub snapshot_types: Option<Vec<String>>,
    pub priority: Option<String>,
    pub requested_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualRequestStatus {
    Accepted,
    Running,
    Completed,
    Failed,
}

impl ManualRequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ManualRequestStatus::Completed | ManualRequestStatus::Failed)
    }

    /// Transitions only move forward.
    fn can_become(&self, next: ManualRequestStatus) -> bool {
        use ManualRequestStatus::*;
        matches!(
            (self, next),
            (Accepted, Running) | (Accepted, Failed) | (Running, Completed) | (Running, Failed)
        )
    }
}

/// Outcome for one requested snapshot type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualTypeResult {
    pub snapshot_type: SnapshotType,
    pub success: bool,
    pub analysis_id: Option<AnalysisId>,
    pub total_changes: usize,
    pub max_severity: Option<DriftSeverity>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualRequestRecord {
    pub request_id: RequestId,
    pub tenant_id: String,
    pub external_account_id: String,
    pub snapshot_types: Vec<SnapshotType>,
    pub priority: Priority,
    pub requested_by: Option<String>,
    pub status: ManualRequestStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub results: Vec<ManualTypeResult>,
    pub total_changes: usize,
    pub failed_types: usize,
    pub error: Option<String>,
}

impl ManualRequestRecord {
    fn transition(&mut self, next: ManualRequestStatus) -> bool {
        if !self.status.can_become(next) {
            return false;
        }
        let now = Utc::now();
        match next {
            ManualRequestStatus::Running => self.started_at = Some(now),
            _ => self.completed_at = Some(now),
        }
        self.status = next;
        true
    }
}

/// Immediate answer to an accepted request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualDriftResponse {
    pub request_id: RequestId,
    pub status: ManualRequestStatus,
    pub snapshot_types: Vec<SnapshotType>,
    pub priority: Priority,
    pub accepted_at: DateTime<Utc>,
}

struct Inner {
    engine: Arc<DriftDetectionEngine>,
    requests: DashMap<RequestId, ManualRequestRecord>,
    /// Serializes the capacity check with the insert that follows it.
    admission: Mutex<()>,
    config: ManualConfig,
}

impl Inner {
    /// Apply `f` to the record if present; returns what `f` returned.
    fn update<R>(&self, id: &RequestId, f: impl FnOnce(&mut ManualRequestRecord) -> R) -> Option<R> {
        self.requests.get_mut(id).map(|mut record| f(&mut record))
    }

    fn is_terminal(&self, id: &RequestId) -> bool {
        self.requests
            .get(id)
            .map_or(true, |record| record.status.is_terminal())
    }

    /// Drop expired terminal records, then the oldest terminal ones while at
    /// the cap. Fails if the cap is reached by in-flight requests alone.
    fn make_room(&self) -> Result<()> {
        let retention_secs = self.config.completed_retention_secs.min(u64::from(u32::MAX));
        let retention = Duration::seconds(i64::try_from(retention_secs).unwrap_or(0));
        let cutoff = Utc::now() - retention;
        self.requests.retain(|_, record| {
            !(record.status.is_terminal() && record.completed_at.is_some_and(|at| at < cutoff))
        });

        while self.requests.len() >= self.config.max_tracked_requests {
            let oldest_terminal = self
                .requests
                .iter()
                .filter(|r| r.status.is_terminal())
                .min_by_key(|r| (r.completed_at, r.request_id.clone()))
                .map(|r| r.request_id.clone());
            match oldest_terminal {
                Some(id) => {
                    self.requests.remove(&id);
                }
                None => {
                    return Err(ExError::new(ExErrorKind::CapacityExceeded)
                        .with_op(OP_TRIGGER)
                        .with_message(format!(
                            "{} manual requests in flight (limit {})",
                            self.requests.len(),
                            self.config.max_tracked_requests
                        )))
                }
            }
        }
        Ok(())
    }
}

/// Cheap to clone; clones share one request registry.
#[derive(Clone)]
pub struct ManualTrigger {
    inner: Arc<Inner>,
}

impl ManualTrigger {
    pub fn new(engine: Arc<DriftDetectionEngine>, config: ManualConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                requests: DashMap::new(),
                admission: Mutex::new(()),
                config,
            }),
        }
    }

    /// Validate, record and schedule a manual request.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Validation failures (`InvalidInput`, `UnknownSnapshotType`) create no
    /// record and start no work. `CapacityExceeded` when the registry is full
    /// of in-flight requests; `Internal` outside a runtime.
    pub fn trigger_drift_detection(&self, request: ManualDriftRequest) -> Result<ManualDriftResponse> {
        let started = Instant::now();
        log_op_start!(OP_TRIGGER, tenant_id = %request.tenant_id);

        let accepted = self.accept(request);
        match &accepted {
            Ok(response) => log_op_end!(
                OP_TRIGGER,
                duration_ms = elapsed_ms(started),
                request_id = %response.request_id,
                priority = response.priority.as_str()
            ),
            Err(err) => log_op_error!(OP_TRIGGER, err, duration_ms = elapsed_ms(started)),
        }
        accepted
    }

    fn accept(&self, request: ManualDriftRequest) -> Result<ManualDriftResponse> {
        let (snapshot_types, priority) = validate(&request)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ExError::new(ExErrorKind::Internal)
                .with_op(OP_TRIGGER)
                .with_message(format!("no async runtime available: {}", e))
        })?;
        let admission = self
            .inner
            .admission
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner.make_room()?;

        let request_id = RequestId::new();
        let created_at = Utc::now();
        self.inner.requests.insert(
            request_id.clone(),
            ManualRequestRecord {
                request_id: request_id.clone(),
                tenant_id: request.tenant_id.clone(),
                external_account_id: request.external_account_id.clone(),
                snapshot_types: snapshot_types.clone(),
                priority,
                requested_by: request.requested_by.clone(),
                status: ManualRequestStatus::Accepted,
                created_at,
                started_at: None,
                completed_at: None,
                duration_ms: None,
                results: Vec::new(),
                total_changes: 0,
                failed_types: 0,
                error: None,
            },
        );
        drop(admission);

        runtime.spawn(run_request(
            self.inner.clone(),
            request_id.clone(),
            request.tenant_id,
            request.external_account_id,
            snapshot_types.clone(),
        ));

        Ok(ManualDriftResponse {
            request_id,
            status: ManualRequestStatus::Accepted,
            snapshot_types,
            priority,
            accepted_at: created_at,
        })
    }

    pub fn get_request_status(&self, request_id: &RequestId) -> Option<ManualRequestRecord> {
        self.inner.requests.get(request_id).map(|r| r.value().clone())
    }

    /// Accepted and running requests, oldest first.
    pub fn get_active_requests(&self) -> Vec<ManualRequestRecord> {
        let mut active: Vec<ManualRequestRecord> = self
            .inner
            .requests
            .iter()
            .filter(|r| !r.status.is_terminal())
            .map(|r| r.value().clone())
            .collect();
        active.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.request_id.cmp(&b.request_id))
        });
        active
    }

    /// Force an accepted or running request to `failed`. Comparisons already
    /// in flight finish, and their side effects stand; no further types
    /// start. Returns false if the request is unknown or already terminal.
    pub fn cancel_request(&self, request_id: &RequestId) -> bool {
        let cancelled = self
            .inner
            .update(request_id, |record| {
                if !record.transition(ManualRequestStatus::Failed) {
                    return false;
                }
                record.error = Some(CANCELLED_REASON.to_string());
                record.duration_ms = record
                    .started_at
                    .map(|at| u64::try_from((Utc::now() - at).num_milliseconds()).unwrap_or(0));
                true
            })
            .unwrap_or(false);
        if cancelled {
            info!(request_id = %request_id, "manual request cancelled");
        }
        cancelled
    }
}

fn validate(request: &ManualDriftRequest) -> Result<(Vec<SnapshotType>, Priority)> {
    if request.tenant_id.trim().is_empty() {
        return Err(DriftError::MissingTenant.into());
    }
    if request.external_account_id.trim().is_empty() {
        return Err(DriftError::MissingExternalAccount.into());
    }

    let snapshot_types = match &request.snapshot_types {
        None => SnapshotType::ALL.to_vec(),
        Some(raw) if raw.is_empty() => return Err(DriftError::EmptySnapshotTypes.into()),
        Some(raw) => {
            let mut types = Vec::with_capacity(raw.len());
            for value in raw {
                let ty: SnapshotType = value.parse()?;
                if !types.contains(&ty) {
                    types.push(ty);
                }
            }
            types
        }
    };

    let priority = match &request.priority {
        None => Priority::default(),
        Some(value) => value.parse::<Priority>()?,
    };

    Ok((snapshot_types, priority))
}

async fn run_request(
    inner: Arc<Inner>,
    request_id: RequestId,
    tenant_id: String,
    external_account_id: String,
    snapshot_types: Vec<SnapshotType>,
) {
    let started_request = inner
        .update(&request_id, |r| r.transition(ManualRequestStatus::Running))
        .unwrap_or(false);
    if !started_request {
        debug!(request_id = %request_id, "manual request cancelled before start");
        return;
    }

    let started = Instant::now();
    log_op_start!(OP_RUN, request_id = %request_id, tenant_id = %tenant_id);

    for snapshot_type in snapshot_types {
        if inner.is_terminal(&request_id) {
            debug!(request_id = %request_id, "manual request stopped before {}", snapshot_type);
            return;
        }

        let type_started = Instant::now();
        let correlation_id = CorrelationId::from_string(format!("{}:{}", request_id, snapshot_type));
        let response = inner
            .engine
            .analyze_drift(
                DriftDetectionRequest::latest(&tenant_id, &external_account_id, snapshot_type)
                    .with_correlation_id(correlation_id),
            )
            .await;

        let result = match response.outcome {
            DriftOutcome::Completed(result) => ManualTypeResult {
                snapshot_type,
                success: true,
                analysis_id: Some(result.analysis_id.clone()),
                total_changes: result.summary.total_changes,
                max_severity: Some(result.summary.max_severity),
                error: None,
                duration_ms: elapsed_ms(type_started),
            },
            DriftOutcome::Failed(failure) => ManualTypeResult {
                snapshot_type,
                success: false,
                analysis_id: None,
                total_changes: 0,
                max_severity: None,
                error: Some(failure.error.to_string()),
                duration_ms: elapsed_ms(type_started),
            },
        };
        inner.update(&request_id, |r| {
            r.total_changes += result.total_changes;
            if !result.success {
                r.failed_types += 1;
            }
            r.results.push(result);
        });
    }

    let duration_ms = elapsed_ms(started);
    let finished = inner
        .update(&request_id, |r| {
            let all_failed = !r.results.is_empty() && r.failed_types == r.results.len();
            let next = if all_failed {
                ManualRequestStatus::Failed
            } else {
                ManualRequestStatus::Completed
            };
            if !r.transition(next) {
                return None;
            }
            r.duration_ms = Some(duration_ms);
            if all_failed {
                r.error = Some("every requested snapshot type failed".to_string());
            }
            Some((r.status, r.total_changes, r.failed_types))
        })
        .flatten();

    match finished {
        Some((ManualRequestStatus::Failed, _, failed_types)) => {
            let err = ExError::new(ExErrorKind::ExternalService)
                .with_op(OP_RUN)
                .with_tenant_id(tenant_id)
                .with_message(format!("all {} snapshot types failed", failed_types));
            log_op_error!(OP_RUN, &err, duration_ms = duration_ms, request_id = %request_id);
        }
        Some((_, total_changes, failed_types)) => log_op_end!(
            OP_RUN,
            duration_ms = duration_ms,
            request_id = %request_id,
            total_changes = total_changes,
            failed_types = failed_types
        ),
        None => debug!(request_id = %request_id, "manual request cancelled while running"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(types: Option<Vec<&str>>, priority: Option<&str>) -> ManualDriftRequest {
        ManualDriftRequest {
            tenant_id: "t1".to_string(),
            external_account_id: "acct".to_string(),
            snapshot_types: types.map(|t| t.into_iter().map(String::from).collect()),
            priority: priority.map(String::from),
            requested_by: None,
        }
    }

    #[test]
    fn test_omitted_types_mean_all() {
        let (types, priority) = validate(&request(None, None)).unwrap();
        assert_eq!(types, SnapshotType::ALL.to_vec());
        assert_eq!(priority, Priority::Normal);
    }

    #[test]
    fn test_duplicate_types_are_collapsed() {
        let (types, _) = validate(&request(Some(vec!["pipeline", "Pipeline", "ai-worker"]), None))
            .unwrap();
        assert_eq!(types, vec![SnapshotType::Pipeline, SnapshotType::AiWorker]);
    }

    #[test]
    fn test_validation_failures() {
        let err = validate(&request(Some(vec![]), None)).unwrap_err();
        assert_eq!(err.message(), "snapshotTypes cannot be empty");

        let err = validate(&request(Some(vec!["invoice"]), None)).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::UnknownSnapshotType);

        let err = validate(&request(None, Some("urgent"))).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);

        let mut missing_tenant = request(None, None);
        missing_tenant.tenant_id = "  ".to_string();
        assert_eq!(validate(&missing_tenant).unwrap_err().message(), "tenantId is required");
    }

    #[test]
    fn test_status_transitions_are_monotonic() {
        use ManualRequestStatus::*;
        assert!(Accepted.can_become(Running));
        assert!(Accepted.can_become(Failed));
        assert!(Running.can_become(Completed));
        assert!(!Completed.can_become(Failed));
        assert!(!Failed.can_become(Running));
        assert!(!Running.can_become(Accepted));
        assert!(!Accepted.can_become(Completed));
    }
}
