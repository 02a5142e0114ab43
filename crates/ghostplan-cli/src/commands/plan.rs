use std::path::{Path, PathBuf};

use clap::Args;

use crate::day_file::{describe_placement, load_config, DayFile};

#[derive(Args)]
pub struct PlanArgs {
    /// Day file (JSON)
    file: PathBuf,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: PlanArgs, config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let file = DayFile::read(&args.file)?;
    let day = file.day(&config)?;
    let now = file.now();

    let quiet = config.quiet_hours.resolve(&day);
    let gaps = config
        .gap_calculator()
        .compute_gaps(&day, &file.blocks, &quiet, now);
    let placed = config
        .placement_engine()
        .place(&file.candidates, &gaps, day.is_today(now).then_some(now));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&placed)?);
        return Ok(());
    }

    if placed.is_empty() {
        println!("Nothing fits on {}.", day.date);
        return Ok(());
    }
    for ghost in &placed {
        println!("{}", describe_placement(&day, ghost));
    }
    let dropped = file.candidates.len() - placed.len();
    if dropped > 0 {
        println!("{dropped} suggestion(s) did not fit");
    }
    Ok(())
}
