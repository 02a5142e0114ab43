use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clap::Args;
use tokio::sync::broadcast::error::RecvError;

use ghostplan_core::{
    CandidateSuggestion, DaySummary, GeneratorError, GhostPlanner, PlannerEvent, RefreshReason,
    SuggestionGenerator, SystemClock,
};

use crate::day_file::{describe_placement, load_config, DayFile};

#[derive(Args)]
pub struct WatchArgs {
    /// Day file (JSON). Candidates are re-read on every pass.
    file: PathBuf,
    /// Seconds between passes, overriding refresh.interval_secs
    #[arg(long)]
    interval: Option<u64>,
}

/// Proposes whatever the day file currently lists.
struct FileGenerator {
    path: PathBuf,
}

#[async_trait]
impl SuggestionGenerator for FileGenerator {
    async fn generate(
        &self,
        _summary: &DaySummary,
        reason: Option<RefreshReason>,
    ) -> Result<Vec<CandidateSuggestion>, GeneratorError> {
        tracing::debug!(path = %self.path.display(), ?reason, "reading candidates");
        let file = DayFile::read(&self.path).map_err(|e| GeneratorError::Malformed(e.to_string()))?;
        Ok(file.candidates)
    }
}

pub fn run(args: WatchArgs, config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    if let Some(secs) = args.interval {
        config.refresh.interval_secs = secs.max(1);
    }
    let file = DayFile::read(&args.file)?;
    let day = file.day(&config)?;

    let calendar = Arc::new(file.calendar(&config));
    let generator = Arc::new(FileGenerator { path: args.file });
    let planner = GhostPlanner::new(&config, calendar, generator, Arc::new(SystemClock), day);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch(planner));
    Ok(())
}

async fn watch(planner: GhostPlanner) {
    let mut events = planner.subscribe();
    planner.start_refresh_loop().await;
    eprintln!("watching {} (Ctrl+C to stop)", planner.day().date);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = events.recv() => match event {
                Ok(PlannerEvent::PlacementsPublished { reason, .. }) => print_placements(&planner, reason),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "missed planner events"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    planner.stop_refresh_loop().await;
}

fn print_placements(planner: &GhostPlanner, reason: Option<RefreshReason>) {
    let day = planner.day();
    let placed = planner.current_placements();
    match reason {
        Some(reason) => println!("-- {} ghost(s), {reason}", placed.len()),
        None => println!("-- {} ghost(s)", placed.len()),
    }
    for ghost in placed.iter() {
        println!("{}", describe_placement(&day, ghost));
    }
}
