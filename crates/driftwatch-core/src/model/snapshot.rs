//! Snapshot identity and configuration domains.
//!
//! Snapshots are owned by the snapshot collaborator; this crate only reads
//! them. A snapshot is immutable once captured.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DriftError;

/// Configuration domain captured by a snapshot.
///
/// The variant set is closed: supporting a new domain means adding a variant
/// here and a matching comparator, never registering one at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotType {
    Pipeline,
    Workflow,
    Calendar,
    AiWorker,
    Location,
}

impl SnapshotType {
    /// Every supported snapshot type, in canonical order
    pub const ALL: [SnapshotType; 5] = [
        SnapshotType::Pipeline,
        SnapshotType::Workflow,
        SnapshotType::Calendar,
        SnapshotType::AiWorker,
        SnapshotType::Location,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotType::Pipeline => "pipeline",
            SnapshotType::Workflow => "workflow",
            SnapshotType::Calendar => "calendar",
            SnapshotType::AiWorker => "ai_worker",
            SnapshotType::Location => "location",
        }
    }
}

impl fmt::Display for SnapshotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotType {
    type Err = DriftError;

    /// Accepts snake_case, kebab-case and camelCase spellings (`ai_worker`,
    /// `ai-worker`, `aiWorker`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "pipeline" => Ok(SnapshotType::Pipeline),
            "workflow" => Ok(SnapshotType::Workflow),
            "calendar" => Ok(SnapshotType::Calendar),
            "aiworker" => Ok(SnapshotType::AiWorker),
            "location" => Ok(SnapshotType::Location),
            _ => Err(DriftError::UnknownSnapshotType {
                value: s.to_string(),
            }),
        }
    }
}

/// One immutable, timestamped capture of a tenant's configuration for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_id: String,
    pub tenant_id: String,
    pub external_account_id: String,
    pub snapshot_type: SnapshotType,
    pub captured_at: DateTime<Utc>,
    /// Opaque domain payload; only the matching comparator interprets it.
    pub payload: serde_json::Value,
}

impl Snapshot {
    /// True iff `self` (as before) and `after` may be compared: same type,
    /// tenant and external account, and `self` captured strictly earlier.
    pub fn is_comparable_with(&self, after: &Snapshot) -> bool {
        self.snapshot_type == after.snapshot_type
            && self.tenant_id == after.tenant_id
            && self.external_account_id == after.external_account_id
            && self.captured_at < after.captured_at
    }
}
