use chrono::NaiveDateTime;
use clap::Args;
use serde::Serialize;
use unveil_core::{gate, CountdownSnapshot};

use crate::common::{self, Context};

#[derive(Args)]
pub struct CountdownArgs {
    /// Count from this local time instead of now
    #[arg(long, value_parser = common::parse_at)]
    at: Option<NaiveDateTime>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct CountdownReport {
    at: NaiveDateTime,
    target: Option<NaiveDateTime>,
    remaining_ms: i64,
    snapshot: Option<CountdownSnapshot>,
}

pub fn run(args: CountdownArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let config = ctx.load_config()?;
    let now = common::now_or(args.at);

    // Inside the window (or ungated) there is nothing to count down to.
    let target = config
        .window()?
        .filter(|w| !gate::is_within_window(*w, now))
        .map(|w| gate::next_occurrence(w, now));
    let remaining_ms = target.map_or(0, |t| (t - now).num_milliseconds());
    let report = CountdownReport {
        at: now,
        target,
        remaining_ms,
        snapshot: CountdownSnapshot::from_millis(remaining_ms),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    match report.snapshot {
        Some(snapshot) => println!("{snapshot}"),
        None => println!("unlocked"),
    }
    Ok(())
}
