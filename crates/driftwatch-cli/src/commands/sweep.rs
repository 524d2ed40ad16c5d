//! Sweep command
//!
//! Usage: driftwatch sweep <daily|hourly|weekly> --snapshots <DIR> [--config <FILE>]
//!
//! Analysis history lives in process memory, so a one-shot `weekly` sweep
//! first runs a daily sweep to have something to aggregate.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use driftwatch_engine::{ScheduledTrigger, SweepKind, TracingAlertSink};

use super::{build_engine, load_config, load_snapshots, runtime, CliResult};

#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Sweep kind: daily, hourly or weekly
    pub kind: String,

    /// Directory of snapshot JSON files
    #[arg(long)]
    pub snapshots: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn execute(args: SweepArgs) -> CliResult<()> {
    let kind: SweepKind = args.kind.parse()?;
    let config = load_config(args.config.as_deref())?;
    let store = Arc::new(load_snapshots(&args.snapshots)?);
    let engine = build_engine(store.clone(), &config);
    let trigger = ScheduledTrigger::new(
        engine,
        store,
        Arc::new(TracingAlertSink),
        config.schedule.clone(),
    );

    let report = runtime()?.block_on(async {
        if kind == SweepKind::WeeklyPatternAnalysis {
            trigger.run_daily_comprehensive().await?;
        }
        trigger.run(kind).await
    })?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
