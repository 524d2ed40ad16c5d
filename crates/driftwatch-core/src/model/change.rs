//! Raw and classified entity-level changes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an entity or field differs between the two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

impl ChangeType {
    pub const ALL: [ChangeType; 3] = [ChangeType::Added, ChangeType::Removed, ChangeType::Modified];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "ADDED",
            ChangeType::Removed => "REMOVED",
            ChangeType::Modified => "MODIFIED",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of drift categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftCategory {
    /// Entity shape or topology removed or changed
    StructuralDrift,
    /// Behavioral capability added or changed
    CapabilityDrift,
    /// Tunable configuration changed
    ConfigDrift,
    /// Non-functional change
    CosmeticDrift,
}

impl DriftCategory {
    pub const ALL: [DriftCategory; 4] = [
        DriftCategory::StructuralDrift,
        DriftCategory::CapabilityDrift,
        DriftCategory::ConfigDrift,
        DriftCategory::CosmeticDrift,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriftCategory::StructuralDrift => "STRUCTURAL_DRIFT",
            DriftCategory::CapabilityDrift => "CAPABILITY_DRIFT",
            DriftCategory::ConfigDrift => "CONFIG_DRIFT",
            DriftCategory::CosmeticDrift => "COSMETIC_DRIFT",
        }
    }
}

impl fmt::Display for DriftCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Totally ordered severity: `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftSeverity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl DriftSeverity {
    pub const ALL: [DriftSeverity; 4] = [
        DriftSeverity::Low,
        DriftSeverity::Medium,
        DriftSeverity::High,
        DriftSeverity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriftSeverity::Low => "LOW",
            DriftSeverity::Medium => "MEDIUM",
            DriftSeverity::High => "HIGH",
            DriftSeverity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for DriftSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unclassified difference produced by a comparator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChange {
    pub entity_id: String,
    pub entity_type: String,
    pub change_type: ChangeType,
    /// Location of the change rooted at its top-level entity,
    /// e.g. `pipeline[P].stages[C].name`
    pub diff_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_value: Option<serde_json::Value>,
    pub description: String,
}

/// A raw change with its assigned category and severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftChange {
    #[serde(flatten)]
    pub change: RawChange,
    pub category: DriftCategory,
    pub severity: DriftSeverity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_total_order() {
        assert!(DriftSeverity::Low < DriftSeverity::Medium);
        assert!(DriftSeverity::Medium < DriftSeverity::High);
        assert!(DriftSeverity::High < DriftSeverity::Critical);
        assert_eq!(DriftSeverity::ALL.iter().max(), Some(&DriftSeverity::Critical));
        assert_eq!(DriftSeverity::default(), DriftSeverity::Low);
    }

    #[test]
    fn test_category_serializes_screaming_snake() {
        let json = serde_json::to_string(&DriftCategory::CapabilityDrift).unwrap();
        assert_eq!(json, "\"CAPABILITY_DRIFT\"");
        let parsed: DriftCategory = serde_json::from_str("\"CONFIG_DRIFT\"").unwrap();
        assert_eq!(parsed, DriftCategory::ConfigDrift);
    }

    #[test]
    fn test_drift_change_flattens_raw_fields() {
        let change = DriftChange {
            change: RawChange {
                entity_id: "B".to_string(),
                entity_type: "stage".to_string(),
                change_type: ChangeType::Removed,
                diff_path: "pipeline[P].stages[B]".to_string(),
                before_value: Some(serde_json::json!({"id": "B"})),
                after_value: None,
                description: "stage B removed".to_string(),
            },
            category: DriftCategory::StructuralDrift,
            severity: DriftSeverity::High,
        };

        let value = serde_json::to_value(&change).unwrap();
        assert_eq!(value["entity_id"], "B");
        assert_eq!(value["change_type"], "REMOVED");
        assert_eq!(value["category"], "STRUCTURAL_DRIFT");
        assert!(value.get("after_value").is_none());

        let back: DriftChange = serde_json::from_value(value).unwrap();
        assert_eq!(back, change);
    }
}
