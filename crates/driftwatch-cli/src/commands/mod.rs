//! CLI subcommands and the snapshot-directory loader they share.

pub mod analyze;
pub mod sweep;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use driftwatch_core::{DriftConfig, ExError, ExErrorKind, Snapshot};
use driftwatch_engine::{DriftDetectionEngine, InMemorySnapshotStore, TracingAuditSink};
use tracing::debug;

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Load every `*.json` file in `dir` as one [`Snapshot`].
pub fn load_snapshots(dir: &Path) -> CliResult<InMemorySnapshotStore> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("load_snapshots")
                .with_message(format!("failed to read {}: {}", dir.display(), e))
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let store = InMemorySnapshotStore::new();
    for path in paths {
        let content = fs::read_to_string(&path)?;
        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
            ExError::new(ExErrorKind::Serialization)
                .with_op("load_snapshots")
                .with_message(format!("invalid snapshot {}: {}", path.display(), e))
        })?;
        debug!(snapshot_id = %snapshot.snapshot_id, path = %path.display(), "snapshot loaded");
        store.insert(snapshot);
    }
    Ok(store)
}

pub fn load_config(path: Option<&Path>) -> CliResult<DriftConfig> {
    match path {
        Some(path) => Ok(DriftConfig::from_file(path)?),
        None => Ok(DriftConfig::default()),
    }
}

/// Engine over `store`, auditing through tracing, without metrics.
pub fn build_engine(
    store: Arc<InMemorySnapshotStore>,
    config: &DriftConfig,
) -> Arc<DriftDetectionEngine> {
    Arc::new(DriftDetectionEngine::new(
        store,
        Arc::new(TracingAuditSink),
        None,
        config,
    ))
}

pub fn runtime() -> CliResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}
