//! Canonical schema constants for structured logging, audit and metrics
//!
//! These constants keep field names consistent across log events, audit
//! detail maps and metric records.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_CORRELATION_ID: &str = "correlation_id";

// Drift identifiers
pub const FIELD_ANALYSIS_ID: &str = "analysis_id";
pub const FIELD_TENANT_ID: &str = "tenant_id";
pub const FIELD_EXTERNAL_ACCOUNT_ID: &str = "external_account_id";
pub const FIELD_SNAPSHOT_TYPE: &str = "snapshot_type";
pub const FIELD_BEFORE_SNAPSHOT_ID: &str = "before_snapshot_id";
pub const FIELD_AFTER_SNAPSHOT_ID: &str = "after_snapshot_id";
pub const FIELD_RUN_ID: &str = "run_id";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_SWEEP_KIND: &str = "sweep_kind";
pub const FIELD_PRIORITY: &str = "priority";

// Result fields
pub const FIELD_SUCCESS: &str = "success";
pub const FIELD_TOTAL_CHANGES: &str = "total_changes";
pub const FIELD_MAX_SEVERITY: &str = "max_severity";
pub const FIELD_HAS_BREAKING: &str = "has_breaking_changes";
pub const FIELD_REQUIRES_REVIEW: &str = "requires_review";
pub const FIELD_STAGE: &str = "stage";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";
pub const FIELD_ERR_MESSAGE: &str = "err.message";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Audit event names
pub const AUDIT_ANALYSIS_COMPLETED: &str = "drift_analysis_completed";
pub const AUDIT_ANALYSIS_FAILED: &str = "drift_analysis_failed";
pub const AUDIT_SOURCE_ENGINE: &str = "drift_detection_engine";
