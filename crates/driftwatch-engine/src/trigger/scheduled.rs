//! Scheduled trigger: recurring sweeps across every known tenant.
//!
//! Wall-clock scheduling belongs to the host; this type only exposes the
//! three sweep entry points plus job inspection and cancellation.
//!
//! ## Sweeps
//!
//! - `DailyComprehensive`: every snapshot type for every tenant
//! - `HourlyCritical`: the configured high-volatility subset
//! - `WeeklyPatternAnalysis`: aggregate statistics from history, no new
//!   comparisons
//!
//! Tenants are processed one after another; the snapshot types of a tenant
//! run concurrently. One failing type never blocks its siblings and one
//! failing tenant never blocks the next.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use driftwatch_core::errors::{ExError, ExErrorKind, Result};
use driftwatch_core::{
    DriftAnalysisResult, DriftDetectionRequest, DriftOutcome, DriftSeverity, ScheduleConfig,
    SnapshotType,
};
use driftwatch_core::{log_op_end, log_op_error, log_op_start};
use driftwatch_core_types::{AnalysisId, RunId};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use super::cancellation::CancellationToken;
use super::history::{AnalysisHistory, HistoryEntry};
use super::pattern::{build_pattern_report, PatternReport};
use crate::engine::{elapsed_ms, DriftDetectionEngine};
use crate::ports::{AlertSink, CriticalDriftAlert, TenantAccount, TenantDirectory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    DailyComprehensive,
    HourlyCritical,
    WeeklyPatternAnalysis,
}

impl SweepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepKind::DailyComprehensive => "daily_comprehensive",
            SweepKind::HourlyCritical => "hourly_critical",
            SweepKind::WeeklyPatternAnalysis => "weekly_pattern_analysis",
        }
    }

    fn op(&self) -> &'static str {
        match self {
            SweepKind::DailyComprehensive => "sweep_daily_comprehensive",
            SweepKind::HourlyCritical => "sweep_hourly_critical",
            SweepKind::WeeklyPatternAnalysis => "sweep_weekly_pattern_analysis",
        }
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepKind {
    type Err = ExError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "daily_comprehensive" => Ok(SweepKind::DailyComprehensive),
            "hourly" | "hourly_critical" => Ok(SweepKind::HourlyCritical),
            "weekly" | "weekly_pattern_analysis" => Ok(SweepKind::WeeklyPatternAnalysis),
            other => Err(ExError::new(ExErrorKind::InvalidInput)
                .with_message(format!("unknown sweep kind: {}", other))),
        }
    }
}

/// Public view of a running sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobInfo {
    pub run_id: RunId,
    pub kind: SweepKind,
    pub started_at: DateTime<Utc>,
}

struct ActiveJob {
    info: JobInfo,
    token: CancellationToken,
}

/// Removes the job from the registry when the sweep ends, however it ends.
struct JobGuard<'a> {
    jobs: &'a DashMap<RunId, ActiveJob>,
    run_id: RunId,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.jobs.remove(&self.run_id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepStatus {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepEntryOutcome {
    Analyzed {
        analysis_id: AnalysisId,
        total_changes: usize,
        max_severity: DriftSeverity,
        has_breaking_changes: bool,
    },
    /// Fewer than two snapshots in the lookback window; nothing to compare
    Skipped { reason: String },
    Failed { error: String },
}

/// Outcome of one (tenant, type) comparison within a sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepEntry {
    pub tenant_id: String,
    pub external_account_id: String,
    pub snapshot_type: SnapshotType,
    #[serde(flatten)]
    pub outcome: SweepEntryOutcome,
}

impl SweepEntry {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SweepEntryOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub run_id: RunId,
    pub kind: SweepKind,
    pub status: SweepStatus,
    pub started_at: DateTime<Utc>,
    pub tenants_processed: usize,
    pub entries: Vec<SweepEntry>,
    pub total_changes: usize,
    pub alerts_raised: usize,
    pub duration_ms: u64,
    /// Only set by the weekly pattern sweep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternReport>,
}

impl SweepReport {
    pub fn failed_entries(&self) -> impl Iterator<Item = &SweepEntry> {
        self.entries.iter().filter(|e| e.is_failed())
    }
}

pub struct ScheduledTrigger {
    engine: Arc<DriftDetectionEngine>,
    tenants: Arc<dyn TenantDirectory>,
    alerts: Arc<dyn AlertSink>,
    history: Arc<AnalysisHistory>,
    jobs: DashMap<RunId, ActiveJob>,
    // Serializes the overlap/capacity check with the registry insert.
    admission: Mutex<()>,
    config: ScheduleConfig,
}

impl ScheduledTrigger {
    pub fn new(
        engine: Arc<DriftDetectionEngine>,
        tenants: Arc<dyn TenantDirectory>,
        alerts: Arc<dyn AlertSink>,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            engine,
            tenants,
            alerts,
            history: Arc::new(AnalysisHistory::new(config.history_capacity)),
            jobs: DashMap::new(),
            admission: Mutex::new(()),
            config,
        }
    }

    pub fn history(&self) -> &Arc<AnalysisHistory> {
        &self.history
    }

    /// # Errors
    ///
    /// `Overlap` if a daily sweep is already running, `CapacityExceeded` at
    /// the active job limit, `ExternalService` if tenants cannot be listed.
    pub async fn run_daily_comprehensive(&self) -> Result<SweepReport> {
        self.run(SweepKind::DailyComprehensive).await
    }

    /// # Errors
    ///
    /// As [`ScheduledTrigger::run_daily_comprehensive`].
    pub async fn run_hourly_critical(&self) -> Result<SweepReport> {
        self.run(SweepKind::HourlyCritical).await
    }

    /// # Errors
    ///
    /// `Overlap` or `CapacityExceeded` as for the other sweeps.
    pub async fn run_weekly_pattern_analysis(&self) -> Result<SweepReport> {
        self.run(SweepKind::WeeklyPatternAnalysis).await
    }

    /// Run the sweep of the given kind.
    ///
    /// # Errors
    ///
    /// See the per-kind entry points.
    pub async fn run(&self, kind: SweepKind) -> Result<SweepReport> {
        let (info, token) = self.admit(kind)?;
        let _guard = JobGuard {
            jobs: &self.jobs,
            run_id: info.run_id.clone(),
        };

        let started = Instant::now();
        log_op_start!(kind.op(), run_id = %info.run_id);

        let outcome = match kind {
            SweepKind::DailyComprehensive => {
                self.sweep(&info, &token, &SnapshotType::ALL, started).await
            }
            SweepKind::HourlyCritical => {
                let types = self.config.critical_types.clone();
                self.sweep(&info, &token, &types, started).await
            }
            SweepKind::WeeklyPatternAnalysis => self.pattern_analysis(&info, started),
        };

        match &outcome {
            Ok(report) => log_op_end!(
                kind.op(),
                duration_ms = report.duration_ms,
                run_id = %info.run_id,
                tenants_processed = report.tenants_processed,
                total_changes = report.total_changes,
                alerts_raised = report.alerts_raised,
                status = ?report.status
            ),
            Err(err) => log_op_error!(
                kind.op(),
                err,
                duration_ms = elapsed_ms(started),
                run_id = %info.run_id
            ),
        }
        outcome
    }

    /// Running sweeps, oldest first.
    pub fn get_active_jobs(&self) -> Vec<JobInfo> {
        let mut jobs: Vec<JobInfo> = self.jobs.iter().map(|j| j.info.clone()).collect();
        jobs.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.run_id.cmp(&b.run_id)));
        jobs
    }

    /// Request cancellation of a running sweep. The sweep stops before its
    /// next tenant. Returns false if no such job is running.
    pub fn cancel_job(&self, run_id: &RunId) -> bool {
        match self.jobs.get(run_id) {
            Some(job) => {
                job.token.cancel();
                info!(run_id = %run_id, sweep_kind = %job.info.kind, "sweep cancellation requested");
                true
            }
            None => false,
        }
    }

    fn admit(&self, kind: SweepKind) -> Result<(JobInfo, CancellationToken)> {
        let _admission = self.admission.lock().unwrap_or_else(PoisonError::into_inner);
        if self.jobs.iter().any(|j| j.info.kind == kind) {
            return Err(ExError::new(ExErrorKind::Overlap)
                .with_op(kind.op())
                .with_message(format!("a {} sweep is already running", kind)));
        }
        if self.jobs.len() >= self.config.max_active_jobs {
            return Err(ExError::new(ExErrorKind::CapacityExceeded)
                .with_op(kind.op())
                .with_message(format!(
                    "{} sweeps already active (limit {})",
                    self.jobs.len(),
                    self.config.max_active_jobs
                )));
        }

        let info = JobInfo {
            run_id: RunId::new(),
            kind,
            started_at: Utc::now(),
        };
        let token = CancellationToken::new();
        self.jobs.insert(
            info.run_id.clone(),
            ActiveJob {
                info: info.clone(),
                token: token.clone(),
            },
        );
        Ok((info, token))
    }

    async fn sweep(
        &self,
        info: &JobInfo,
        token: &CancellationToken,
        types: &[SnapshotType],
        started: Instant,
    ) -> Result<SweepReport> {
        let tenants = self
            .tenants
            .list_tenants()
            .await
            .map_err(|e| e.with_op(info.kind.op()))?;

        let mut report = SweepReport {
            run_id: info.run_id.clone(),
            kind: info.kind,
            status: SweepStatus::Completed,
            started_at: info.started_at,
            tenants_processed: 0,
            entries: Vec::new(),
            total_changes: 0,
            alerts_raised: 0,
            duration_ms: 0,
            pattern: None,
        };

        for tenant in &tenants {
            if token.is_cancelled() {
                report.status = SweepStatus::Cancelled;
                info!(
                    run_id = %info.run_id,
                    remaining_tenants = tenants.len() - report.tenants_processed,
                    "sweep cancelled before tenant {}",
                    tenant.tenant_id
                );
                break;
            }
            self.sweep_tenant(info, tenant, types, &mut report).await;
            report.tenants_processed += 1;
        }

        report.duration_ms = elapsed_ms(started);
        Ok(report)
    }

    async fn sweep_tenant(
        &self,
        info: &JobInfo,
        tenant: &TenantAccount,
        types: &[SnapshotType],
        report: &mut SweepReport,
    ) {
        let requests = types.iter().map(|ty| {
            self.engine.analyze_drift(DriftDetectionRequest::latest(
                &tenant.tenant_id,
                &tenant.external_account_id,
                *ty,
            ))
        });
        let responses = join_all(requests).await;

        for (ty, response) in types.iter().zip(responses) {
            let outcome = match response.outcome {
                DriftOutcome::Completed(result) => {
                    self.history.record(HistoryEntry::from(&*result));
                    report.total_changes += result.summary.total_changes;
                    if result.summary.max_severity == DriftSeverity::Critical {
                        self.raise_alert(info, &result);
                        report.alerts_raised += 1;
                    }
                    SweepEntryOutcome::Analyzed {
                        analysis_id: result.analysis_id.clone(),
                        total_changes: result.summary.total_changes,
                        max_severity: result.summary.max_severity,
                        has_breaking_changes: result.summary.has_breaking_changes,
                    }
                }
                DriftOutcome::Failed(failure)
                    if failure.kind() == ExErrorKind::InsufficientSnapshots =>
                {
                    SweepEntryOutcome::Skipped {
                        reason: failure.message().to_string(),
                    }
                }
                DriftOutcome::Failed(failure) => {
                    warn!(
                        run_id = %info.run_id,
                        tenant_id = %tenant.tenant_id,
                        snapshot_type = %ty,
                        stage = failure.stage.as_str(),
                        err.code = failure.error.code(),
                        "sweep comparison failed"
                    );
                    SweepEntryOutcome::Failed {
                        error: failure.error.to_string(),
                    }
                }
            };
            report.entries.push(SweepEntry {
                tenant_id: tenant.tenant_id.clone(),
                external_account_id: tenant.external_account_id.clone(),
                snapshot_type: *ty,
                outcome,
            });
        }
    }

    fn raise_alert(&self, info: &JobInfo, result: &DriftAnalysisResult) {
        let critical_changes = result
            .changes
            .iter()
            .filter(|c| c.severity == DriftSeverity::Critical)
            .count();
        self.alerts.critical_drift(&CriticalDriftAlert {
            run_id: info.run_id.clone(),
            sweep_kind: info.kind.as_str().to_string(),
            tenant_id: result.tenant_id.clone(),
            external_account_id: result.external_account_id.clone(),
            snapshot_type: result.snapshot_type,
            analysis_id: result.analysis_id.clone(),
            correlation_id: result.correlation_id.clone(),
            max_severity: result.summary.max_severity,
            critical_changes,
            has_breaking_changes: result.summary.has_breaking_changes,
            risk_text: result.summary.risk_text.clone(),
        });
    }

    fn pattern_analysis(&self, info: &JobInfo, started: Instant) -> Result<SweepReport> {
        let window_end = Utc::now();
        let window_start = window_end
            .checked_sub_signed(Duration::days(i64::from(self.config.pattern_window_days)))
            .ok_or_else(|| {
                ExError::new(ExErrorKind::Config)
                    .with_op(info.kind.op())
                    .with_message(format!(
                        "pattern window of {} days is out of range",
                        self.config.pattern_window_days
                    ))
            })?;
        let entries = self.history.since(window_start);
        let pattern = build_pattern_report(&entries, window_start, window_end);

        Ok(SweepReport {
            run_id: info.run_id.clone(),
            kind: info.kind,
            status: SweepStatus::Completed,
            started_at: info.started_at,
            tenants_processed: pattern.by_tenant.len(),
            entries: Vec::new(),
            total_changes: pattern.total_changes,
            alerts_raised: 0,
            duration_ms: elapsed_ms(started),
            pattern: Some(pattern),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_kind_parsing() {
        assert_eq!("daily".parse::<SweepKind>().unwrap(), SweepKind::DailyComprehensive);
        assert_eq!("Hourly".parse::<SweepKind>().unwrap(), SweepKind::HourlyCritical);
        assert_eq!(
            "weekly_pattern_analysis".parse::<SweepKind>().unwrap(),
            SweepKind::WeeklyPatternAnalysis
        );
        let err = "monthly".parse::<SweepKind>().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }
}
