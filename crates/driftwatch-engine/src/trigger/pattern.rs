//! Aggregate drift statistics over the analysis history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use driftwatch_core::{DriftCategory, DriftSeverity, SnapshotType};
use serde::Serialize;

use super::history::HistoryEntry;

/// How many (tenant, type) pairs the report ranks.
const HOTSPOT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatternStats {
    pub analyses: usize,
    pub total_changes: usize,
    pub breaking_analyses: usize,
}

impl PatternStats {
    fn add(&mut self, entry: &HistoryEntry) {
        self.analyses += 1;
        self.total_changes += entry.summary.total_changes;
        if entry.summary.has_breaking_changes {
            self.breaking_analyses += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftHotspot {
    pub tenant_id: String,
    pub snapshot_type: SnapshotType,
    pub analyses: usize,
    pub total_changes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternReport {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub analyses: usize,
    pub total_changes: usize,
    pub by_tenant: BTreeMap<String, PatternStats>,
    pub by_type: BTreeMap<SnapshotType, PatternStats>,
    /// Change counts per category, summed over every analysis
    pub by_category: BTreeMap<DriftCategory, usize>,
    /// Analyses per maximum severity
    pub by_max_severity: BTreeMap<DriftSeverity, usize>,
    /// Most-drifting (tenant, type) pairs, by change count descending
    pub hotspots: Vec<DriftHotspot>,
}

pub fn build_pattern_report(
    entries: &[HistoryEntry],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> PatternReport {
    let mut by_tenant: BTreeMap<String, PatternStats> = BTreeMap::new();
    let mut by_type: BTreeMap<SnapshotType, PatternStats> = BTreeMap::new();
    let mut by_pair: BTreeMap<(String, SnapshotType), PatternStats> = BTreeMap::new();
    let mut by_category: BTreeMap<DriftCategory, usize> =
        DriftCategory::ALL.iter().map(|c| (*c, 0)).collect();
    let mut by_max_severity: BTreeMap<DriftSeverity, usize> =
        DriftSeverity::ALL.iter().map(|s| (*s, 0)).collect();

    for entry in entries {
        by_tenant.entry(entry.tenant_id.clone()).or_default().add(entry);
        by_type.entry(entry.snapshot_type).or_default().add(entry);
        by_pair
            .entry((entry.tenant_id.clone(), entry.snapshot_type))
            .or_default()
            .add(entry);
        for (category, n) in &entry.summary.by_category {
            *by_category.entry(*category).or_insert(0) += n;
        }
        *by_max_severity.entry(entry.summary.max_severity).or_insert(0) += 1;
    }

    let mut hotspots: Vec<DriftHotspot> = by_pair
        .into_iter()
        .filter(|(_, stats)| stats.total_changes > 0)
        .map(|((tenant_id, snapshot_type), stats)| DriftHotspot {
            tenant_id,
            snapshot_type,
            analyses: stats.analyses,
            total_changes: stats.total_changes,
        })
        .collect();
    // Stable sort keeps (tenant, type) order among ties.
    hotspots.sort_by(|a, b| b.total_changes.cmp(&a.total_changes));
    hotspots.truncate(HOTSPOT_LIMIT);

    PatternReport {
        window_start,
        window_end,
        analyses: entries.len(),
        total_changes: entries.iter().map(|e| e.summary.total_changes).sum(),
        by_tenant,
        by_type,
        by_category,
        by_max_severity,
        hotspots,
    }
}
