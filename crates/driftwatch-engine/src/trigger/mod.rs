//! Trigger layer: scheduled sweeps and manual on-demand requests.

pub mod cancellation;
pub mod history;
pub mod manual;
pub mod pattern;
pub mod scheduled;

pub use cancellation::CancellationToken;
pub use history::{AnalysisHistory, HistoryEntry};
pub use manual::{
    ManualDriftRequest, ManualDriftResponse, ManualRequestRecord, ManualRequestStatus,
    ManualTrigger, ManualTypeResult, Priority, CANCELLED_REASON,
};
pub use pattern::{DriftHotspot, PatternReport, PatternStats};
pub use scheduled::{
    JobInfo, ScheduledTrigger, SweepEntry, SweepEntryOutcome, SweepKind, SweepReport,
    SweepStatus,
};
