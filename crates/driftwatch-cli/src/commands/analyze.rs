//! Analyze command
//!
//! Usage: driftwatch analyze --snapshots <DIR> --tenant <ID> --account <ID>
//! --type <TYPE> [--before <ID> --after <ID>] [--json]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use driftwatch_core::{render_human_summary, DriftDetectionRequest, SnapshotType};

use super::{build_engine, load_config, load_snapshots, runtime, CliResult};

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Directory of snapshot JSON files
    #[arg(long)]
    pub snapshots: PathBuf,

    #[arg(long)]
    pub tenant: String,

    /// External account id
    #[arg(long)]
    pub account: String,

    /// Snapshot type (pipeline, workflow, calendar, ai_worker, location)
    #[arg(long = "type")]
    pub snapshot_type: String,

    /// Explicit before snapshot id; requires --after
    #[arg(long, requires = "after")]
    pub before: Option<String>,

    /// Explicit after snapshot id; requires --before
    #[arg(long, requires = "before")]
    pub after: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the configured lookback window
    #[arg(long)]
    pub lookback_hours: Option<u32>,

    /// Print the analysis result as JSON instead of Markdown
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: AnalyzeArgs) -> CliResult<()> {
    let snapshot_type: SnapshotType = args.snapshot_type.parse()?;
    let mut config = load_config(args.config.as_deref())?;
    if let Some(hours) = args.lookback_hours {
        config.engine.lookback_hours = hours;
        config.validate()?;
    }
    let store = Arc::new(load_snapshots(&args.snapshots)?);
    let engine = build_engine(store, &config);

    let mut request = DriftDetectionRequest::latest(args.tenant, args.account, snapshot_type);
    if let (Some(before), Some(after)) = (args.before, args.after) {
        request = request.with_snapshots(before, after);
    }

    let response = runtime()?.block_on(engine.analyze_drift(request));
    let result = response.into_result().map_err(|failure| {
        format!("analysis failed at {}: {}", failure.stage.as_str(), failure.error)
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_human_summary(&result));
    }
    Ok(())
}
