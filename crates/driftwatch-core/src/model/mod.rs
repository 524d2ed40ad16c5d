pub mod analysis;
pub mod change;
pub mod snapshot;

pub use analysis::{
    AnalysisStage, DriftAnalysisResult, DriftDetectionRequest, DriftDetectionResponse,
    DriftFailure, DriftOutcome,
};
pub use change::{ChangeType, DriftCategory, DriftChange, DriftSeverity, RawChange};
pub use snapshot::{Snapshot, SnapshotType};
