use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use ghostplan_core::timeline::free_minutes;
use ghostplan_core::TimeInterval;

use crate::day_file::{describe_interval, load_config, DayFile};

#[derive(Args)]
pub struct GapsArgs {
    /// Day file (JSON)
    file: PathBuf,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct GapsReport {
    gaps: Vec<TimeInterval>,
    free_minutes: i64,
}

pub fn run(args: GapsArgs, config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let file = DayFile::read(&args.file)?;
    let day = file.day(&config)?;

    let quiet = config.quiet_hours.resolve(&day);
    let gaps = config
        .gap_calculator()
        .compute_gaps(&day, &file.blocks, &quiet, file.now());

    if args.json {
        let report = GapsReport {
            free_minutes: free_minutes(&gaps),
            gaps,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if gaps.is_empty() {
        println!("No free time left on {}.", day.date);
        return Ok(());
    }
    for gap in &gaps {
        println!("{}", describe_interval(&day, gap));
    }
    println!("{} min free", free_minutes(&gaps));
    Ok(())
}
