//! Bounded record of completed analyses, read by the weekly pattern sweep.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use driftwatch_core::{DriftAnalysisResult, DriftSummary, SnapshotType};
use driftwatch_core_types::AnalysisId;
use serde::Serialize;

/// Summary-level view of one completed analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub analysis_id: AnalysisId,
    pub tenant_id: String,
    pub external_account_id: String,
    pub snapshot_type: SnapshotType,
    pub analyzed_at: DateTime<Utc>,
    pub summary: DriftSummary,
}

impl From<&DriftAnalysisResult> for HistoryEntry {
    fn from(result: &DriftAnalysisResult) -> Self {
        Self {
            analysis_id: result.analysis_id.clone(),
            tenant_id: result.tenant_id.clone(),
            external_account_id: result.external_account_id.clone(),
            snapshot_type: result.snapshot_type,
            analyzed_at: result.analyzed_at,
            summary: result.summary.clone(),
        }
    }
}

/// FIFO ring of history entries; the oldest entry is evicted at capacity.
#[derive(Debug)]
pub struct AnalysisHistory {
    capacity: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl AnalysisHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record(&self, entry: HistoryEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Entries analyzed at or after `cutoff`, oldest first.
    pub fn since(&self, cutoff: DateTime<Utc>) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.analyzed_at >= cutoff)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use driftwatch_core::{summarize, DriftRules};

    fn entry(tenant: &str, age_days: i64) -> HistoryEntry {
        HistoryEntry {
            analysis_id: AnalysisId::new(),
            tenant_id: tenant.to_string(),
            external_account_id: "acct".to_string(),
            snapshot_type: SnapshotType::Pipeline,
            analyzed_at: Utc::now() - Duration::days(age_days),
            summary: summarize(&[], &DriftRules::default()),
        }
    }

    #[test]
    fn test_oldest_entry_is_evicted_at_capacity() {
        let history = AnalysisHistory::new(2);
        history.record(entry("t1", 0));
        history.record(entry("t2", 0));
        history.record(entry("t3", 0));

        let tenants: Vec<String> = history
            .since(Utc::now() - Duration::days(1))
            .into_iter()
            .map(|e| e.tenant_id)
            .collect();
        assert_eq!(tenants, vec!["t2", "t3"]);
    }

    #[test]
    fn test_since_filters_by_age() {
        let history = AnalysisHistory::new(10);
        history.record(entry("old", 10));
        history.record(entry("new", 1));
        let recent = history.since(Utc::now() - Duration::days(7));
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].tenant_id, "new");
        assert_eq!(history.len(), 2);
    }
}
