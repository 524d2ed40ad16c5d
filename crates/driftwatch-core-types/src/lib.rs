//! Core types shared across driftwatch crates
//!
//! - **Identity types**: CorrelationId, AnalysisId, RunId, RequestId
//! - **Schema constants**: canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{AnalysisId, CorrelationId, RequestId, RunId};
