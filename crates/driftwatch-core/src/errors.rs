use crate::model::snapshot::SnapshotType;
use driftwatch_core_types::CorrelationId;
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling,
/// audit records and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    // Validation
    InvalidInput,
    UnknownSnapshotType,
    NotFound,
    InsufficientSnapshots,
    SnapshotMismatch,
    NonChronological,
    MalformedPayload,

    // Collaborators
    ExternalService,

    // Trigger layer
    Overlap,
    CapacityExceeded,

    // Ambient
    Config,
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::UnknownSnapshotType => "ERR_UNKNOWN_SNAPSHOT_TYPE",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InsufficientSnapshots => "ERR_INSUFFICIENT_SNAPSHOTS",
            ExErrorKind::SnapshotMismatch => "ERR_SNAPSHOT_MISMATCH",
            ExErrorKind::NonChronological => "ERR_NON_CHRONOLOGICAL",
            ExErrorKind::MalformedPayload => "ERR_MALFORMED_PAYLOAD",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::Overlap => "ERR_OVERLAP",
            ExErrorKind::CapacityExceeded => "ERR_CAPACITY_EXCEEDED",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Validation failures are surfaced to the caller and never retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidInput
                | ExErrorKind::UnknownSnapshotType
                | ExErrorKind::NotFound
                | ExErrorKind::InsufficientSnapshots
                | ExErrorKind::SnapshotMismatch
                | ExErrorKind::NonChronological
        )
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus the drift
/// context (tenant, snapshot type, snapshot id, correlation id) needed to
/// trace a failure back to its request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    tenant_id: Option<String>,
    snapshot_type: Option<SnapshotType>,
    snapshot_id: Option<String>,
    correlation_id: Option<CorrelationId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            tenant_id: None,
            snapshot_type: None,
            snapshot_id: None,
            correlation_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add tenant context
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Add snapshot type context
    pub fn with_snapshot_type(mut self, snapshot_type: SnapshotType) -> Self {
        self.snapshot_type = Some(snapshot_type);
        self
    }

    /// Add snapshot id context
    pub fn with_snapshot_id(mut self, snapshot_id: impl Into<String>) -> Self {
        self.snapshot_id = Some(snapshot_id.into());
        self
    }

    /// Add correlation id context
    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn snapshot_type(&self) -> Option<SnapshotType> {
        self.snapshot_type
    }

    pub fn snapshot_id(&self) -> Option<&str> {
        self.snapshot_id.as_deref()
    }

    pub fn correlation_id(&self) -> Option<&CorrelationId> {
        self.correlation_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(tenant_id) = &self.tenant_id {
            write!(f, " (tenant_id: {})", tenant_id)?;
        }
        if let Some(snapshot_type) = &self.snapshot_type {
            write!(f, " (snapshot_type: {})", snapshot_type)?;
        }
        if let Some(snapshot_id) = &self.snapshot_id {
            write!(f, " (snapshot_id: {})", snapshot_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain validation failures raised while building or resolving a comparison
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriftError {
    #[error("tenantId is required")]
    MissingTenant,

    #[error("externalAccountId is required")]
    MissingExternalAccount,

    #[error("snapshotTypes cannot be empty")]
    EmptySnapshotTypes,

    #[error("unknown snapshot type: {value}")]
    UnknownSnapshotType { value: String },

    #[error("invalid priority: {value} (expected one of low, normal, high)")]
    InvalidPriority { value: String },

    #[error("snapshot not found: {snapshot_id}")]
    SnapshotNotFound { snapshot_id: String },

    #[error("insufficient snapshots for comparison: found {found}, need at least 2")]
    InsufficientSnapshots { found: usize },

    #[error("snapshot type mismatch: before={before}, after={after}, requested={requested}")]
    SnapshotTypeMismatch {
        before: SnapshotType,
        after: SnapshotType,
        requested: SnapshotType,
    },

    #[error("snapshot {snapshot_id} belongs to tenant {actual}, expected {expected}")]
    TenantMismatch {
        snapshot_id: String,
        expected: String,
        actual: String,
    },

    #[error("snapshot {snapshot_id} belongs to external account {actual}, expected {expected}")]
    AccountMismatch {
        snapshot_id: String,
        expected: String,
        actual: String,
    },

    #[error("before snapshot {before_id} was not captured strictly before after snapshot {after_id}")]
    NonChronological { before_id: String, after_id: String },

    #[error("malformed {snapshot_type} payload at {path}: {reason}")]
    MalformedPayload {
        snapshot_type: SnapshotType,
        path: String,
        reason: String,
    },
}

impl From<DriftError> for ExError {
    fn from(err: DriftError) -> Self {
        let message = err.to_string();
        match err {
            DriftError::MissingTenant
            | DriftError::MissingExternalAccount
            | DriftError::EmptySnapshotTypes
            | DriftError::InvalidPriority { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }
            DriftError::UnknownSnapshotType { .. } => {
                ExError::new(ExErrorKind::UnknownSnapshotType).with_message(message)
            }
            DriftError::SnapshotNotFound { snapshot_id } => ExError::new(ExErrorKind::NotFound)
                .with_snapshot_id(snapshot_id)
                .with_message(message),
            DriftError::InsufficientSnapshots { .. } => {
                ExError::new(ExErrorKind::InsufficientSnapshots).with_message(message)
            }
            DriftError::SnapshotTypeMismatch { requested, .. } => {
                ExError::new(ExErrorKind::SnapshotMismatch)
                    .with_snapshot_type(requested)
                    .with_message(message)
            }
            DriftError::TenantMismatch { snapshot_id, .. }
            | DriftError::AccountMismatch { snapshot_id, .. } => {
                ExError::new(ExErrorKind::SnapshotMismatch)
                    .with_snapshot_id(snapshot_id)
                    .with_message(message)
            }
            DriftError::NonChronological { .. } => {
                ExError::new(ExErrorKind::NonChronological).with_message(message)
            }
            DriftError::MalformedPayload { snapshot_type, .. } => {
                ExError::new(ExErrorKind::MalformedPayload)
                    .with_snapshot_type(snapshot_type)
                    .with_message(message)
            }
        }
    }
}
