//! Drift Classifier.
//!
//! Pure two-stage mapping from a raw change plus its domain to a
//! `(category, severity)` pair. It never fails: anything it does not
//! recognize resolves to `COSMETIC_DRIFT` / `LOW`.
//!
//! ## Category precedence
//!
//! 1. a capability-bearing field anywhere in the path -> `CAPABILITY_DRIFT`
//! 2. removal of a structural entity -> `STRUCTURAL_DRIFT`
//! 3. a path touching a configuration sub-tree -> `CONFIG_DRIFT`
//! 4. otherwise -> `COSMETIC_DRIFT`
//!
//! ## Severity precedence
//!
//! 1. `CAPABILITY_DRIFT` -> `CRITICAL`
//! 2. REMOVED top-tier entity -> `CRITICAL`
//! 3. `STRUCTURAL_DRIFT` -> `HIGH`
//! 4. REMOVED -> `HIGH`
//! 5. ADDED capability-bearing entity -> `HIGH`, other ADDED -> `MEDIUM`
//! 6. MODIFIED model/limits path -> `HIGH`, stage-level -> `MEDIUM`, else `LOW`

use crate::model::change::{ChangeType, DriftCategory, DriftChange, DriftSeverity, RawChange};
use crate::model::snapshot::SnapshotType;

/// Entity types emitted by the comparator set. Every one of them is part of
/// the configuration topology, so removing any of them is structural.
const KNOWN_ENTITY_TYPES: &[&str] = &[
    "pipeline",
    "stage",
    "workflow",
    "trigger",
    "action",
    "calendar",
    "team_member",
    "ai_worker",
    "location",
];

/// Entities that carry behavior of their own.
const CAPABILITY_ENTITY_TYPES: &[&str] = &["ai_worker"];

/// Pipeline-level entities; losing one removes a whole flow.
const PIPELINE_LEVEL_ENTITY_TYPES: &[&str] = &["pipeline", "workflow"];

// Path segments are compared lowercased with `_` and `-` removed.
const CAPABILITY_SEGMENTS: &[&str] = &[
    "capabilities",
    "capability",
    "tools",
    "skills",
    "permissions",
    "intents",
];

const CONFIG_SEGMENTS: &[&str] = &[
    "triggers",
    "trigger",
    "conditions",
    "condition",
    "filters",
    "workinghours",
    "openhours",
    "businesshours",
    "availability",
    "bookingsettings",
    "slotduration",
    "slotinterval",
    "bufferminutes",
    "timezone",
    "settings",
    "model",
    "limits",
    "maxtokens",
    "temperature",
    "ratelimit",
    "quota",
    "maxconcurrency",
];

const MODEL_LIMIT_SEGMENTS: &[&str] = &[
    "model",
    "limits",
    "maxtokens",
    "temperature",
    "ratelimit",
    "quota",
    "maxconcurrency",
];

/// Category and severity assigned to one change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Classification {
    pub category: DriftCategory,
    pub severity: DriftSeverity,
}

impl Classification {
    const DEFAULT: Classification = Classification {
        category: DriftCategory::CosmeticDrift,
        severity: DriftSeverity::Low,
    };
}

/// Classify one raw change in the context of its snapshot domain.
pub fn classify(
    entity_type: &str,
    diff_path: &str,
    change_type: ChangeType,
    snapshot_type: SnapshotType,
) -> Classification {
    if !KNOWN_ENTITY_TYPES.contains(&entity_type) {
        return Classification::DEFAULT;
    }

    let segments = path_segments(diff_path);
    let category = categorize(&segments, change_type, snapshot_type);
    let severity = grade(category, entity_type, &segments, change_type);
    Classification { category, severity }
}

/// Attach category and severity to a raw change.
pub fn classify_change(raw: RawChange, snapshot_type: SnapshotType) -> DriftChange {
    let Classification { category, severity } = classify(
        &raw.entity_type,
        &raw.diff_path,
        raw.change_type,
        snapshot_type,
    );
    DriftChange {
        change: raw,
        category,
        severity,
    }
}

/// Classify every change independently, preserving order.
pub fn classify_all(raw: Vec<RawChange>, snapshot_type: SnapshotType) -> Vec<DriftChange> {
    raw.into_iter()
        .map(|change| classify_change(change, snapshot_type))
        .collect()
}

fn categorize(
    segments: &[String],
    change_type: ChangeType,
    snapshot_type: SnapshotType,
) -> DriftCategory {
    if touches_capability(segments, snapshot_type) {
        return DriftCategory::CapabilityDrift;
    }
    if change_type == ChangeType::Removed {
        return DriftCategory::StructuralDrift;
    }
    if any_segment_in(segments, CONFIG_SEGMENTS) {
        return DriftCategory::ConfigDrift;
    }
    DriftCategory::CosmeticDrift
}

fn grade(
    category: DriftCategory,
    entity_type: &str,
    segments: &[String],
    change_type: ChangeType,
) -> DriftSeverity {
    if category == DriftCategory::CapabilityDrift {
        return DriftSeverity::Critical;
    }
    if change_type == ChangeType::Removed && is_top_tier(entity_type) {
        return DriftSeverity::Critical;
    }
    if category == DriftCategory::StructuralDrift {
        return DriftSeverity::High;
    }
    match change_type {
        ChangeType::Removed => DriftSeverity::High,
        ChangeType::Added if CAPABILITY_ENTITY_TYPES.contains(&entity_type) => DriftSeverity::High,
        ChangeType::Added => DriftSeverity::Medium,
        ChangeType::Modified if any_segment_in(segments, MODEL_LIMIT_SEGMENTS) => {
            DriftSeverity::High
        }
        ChangeType::Modified if entity_type == "stage" => DriftSeverity::Medium,
        ChangeType::Modified => DriftSeverity::Low,
    }
}

fn is_top_tier(entity_type: &str) -> bool {
    CAPABILITY_ENTITY_TYPES.contains(&entity_type)
        || PIPELINE_LEVEL_ENTITY_TYPES.contains(&entity_type)
}

fn touches_capability(segments: &[String], snapshot_type: SnapshotType) -> bool {
    if any_segment_in(segments, CAPABILITY_SEGMENTS) {
        return true;
    }
    // An AI worker's callable actions are its capabilities.
    snapshot_type == SnapshotType::AiWorker && segments.iter().skip(1).any(|s| s == "actions")
}

fn any_segment_in(segments: &[String], names: &[&str]) -> bool {
    segments.iter().any(|s| names.contains(&s.as_str()))
}

/// `pipeline[P].stages[C].max_tokens` -> `["pipeline", "stages", "maxtokens"]`
///
/// Bracketed entity ids are dropped before splitting; an id may itself
/// contain dots or brackets.
fn path_segments(diff_path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in diff_path.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            '.' => segments.push(std::mem::take(&mut current)),
            '_' | '-' => {}
            _ => current.push(c.to_ascii_lowercase()),
        }
    }
    segments.push(current);
    segments.retain(|s| !s.is_empty());
    segments
}
