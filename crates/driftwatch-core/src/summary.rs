//! Summary statistics and risk assessment over a classified change list.
//!
//! The breaking/review predicates are injectable through [`DriftRules`]; the
//! defaults treat any structural or capability change at `HIGH` or above as
//! breaking.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::collections::BTreeMap;

use crate::model::change::{ChangeType, DriftCategory, DriftChange, DriftSeverity};

pub const RISK_BREAKING: &str = "Breaking changes detected: immediate review required";
pub const RISK_CRITICAL: &str = "Critical drift detected: review required";
pub const RISK_HIGH: &str = "High-impact drift detected: review recommended";
pub const RISK_MEDIUM: &str = "Moderate drift detected: monitor changes";
pub const RISK_MINOR: &str = "Minor changes detected";
pub const RISK_NONE: &str = "No changes detected";

/// Rule-set deciding `has_breaking_changes` and `requires_review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftRules {
    /// Categories that can make a change breaking
    pub breaking_categories: Vec<DriftCategory>,
    /// Minimum severity for a change in `breaking_categories` to be breaking
    pub breaking_min_severity: DriftSeverity,
    /// Any change at or above this severity requires review
    pub review_min_severity: DriftSeverity,
    /// This many changes or more require review whatever their severity
    pub review_change_count: usize,
    /// Breaking changes always require review
    pub review_on_breaking: bool,
}

impl Default for DriftRules {
    fn default() -> Self {
        Self {
            breaking_categories: vec![DriftCategory::StructuralDrift, DriftCategory::CapabilityDrift],
            breaking_min_severity: DriftSeverity::High,
            review_min_severity: DriftSeverity::Medium,
            review_change_count: 25,
            review_on_breaking: true,
        }
    }
}

impl DriftRules {
    pub fn is_breaking(&self, change: &DriftChange) -> bool {
        self.breaking_categories.contains(&change.category)
            && change.severity >= self.breaking_min_severity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeTypeCounts {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftSummary {
    pub total_changes: usize,
    /// All four categories present, zero-filled
    pub by_category: BTreeMap<DriftCategory, usize>,
    pub by_change_type: ChangeTypeCounts,
    pub by_entity_type: BTreeMap<String, usize>,
    /// `LOW` when there are no changes
    pub max_severity: DriftSeverity,
    pub has_breaking_changes: bool,
    pub requires_review: bool,
    /// Always one of the six `RISK_*` strings
    pub risk_text: String,
}

impl DriftSummary {
    pub fn count(&self, category: DriftCategory) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

/// Aggregate a classified change list under `rules`.
pub fn summarize(changes: &[DriftChange], rules: &DriftRules) -> DriftSummary {
    let mut by_category: BTreeMap<DriftCategory, usize> =
        DriftCategory::ALL.iter().map(|c| (*c, 0)).collect();
    let mut by_change_type = ChangeTypeCounts::default();
    let mut by_entity_type: BTreeMap<String, usize> = BTreeMap::new();

    for change in changes {
        *by_category.entry(change.category).or_insert(0) += 1;
        *by_entity_type
            .entry(change.change.entity_type.clone())
            .or_insert(0) += 1;
        match change.change.change_type {
            ChangeType::Added => by_change_type.added += 1,
            ChangeType::Removed => by_change_type.removed += 1,
            ChangeType::Modified => by_change_type.modified += 1,
        }
    }

    let max_severity = max_severity(changes);
    let has_breaking_changes = changes.iter().any(|c| rules.is_breaking(c));
    let requires_review = (rules.review_on_breaking && has_breaking_changes)
        || (!changes.is_empty() && max_severity >= rules.review_min_severity)
        || changes.len() >= rules.review_change_count.max(1);

    DriftSummary {
        total_changes: changes.len(),
        by_category,
        by_change_type,
        by_entity_type,
        max_severity,
        has_breaking_changes,
        requires_review,
        risk_text: risk_text(changes.len(), max_severity, has_breaking_changes).to_string(),
    }
}

/// Maximum severity across `changes`, `LOW` when empty.
pub fn max_severity(changes: &[DriftChange]) -> DriftSeverity {
    changes
        .iter()
        .map(|c| c.severity)
        .max()
        .unwrap_or(DriftSeverity::Low)
}

/// Fixed precedence: breaking > CRITICAL > HIGH > MEDIUM > minor > none.
pub fn risk_text(total_changes: usize, max_severity: DriftSeverity, has_breaking: bool) -> &'static str {
    if has_breaking {
        RISK_BREAKING
    } else if total_changes == 0 {
        RISK_NONE
    } else {
        match max_severity {
            DriftSeverity::Critical => RISK_CRITICAL,
            DriftSeverity::High => RISK_HIGH,
            DriftSeverity::Medium => RISK_MEDIUM,
            DriftSeverity::Low => RISK_MINOR,
        }
    }
}

/// SHA-256 hex over the canonical JSON of the ordered change list.
pub fn changes_digest(changes: &[DriftChange]) -> String {
    let canonical = serde_json::to_string(changes).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
