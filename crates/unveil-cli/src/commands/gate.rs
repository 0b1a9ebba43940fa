use chrono::NaiveDateTime;
use clap::Args;
use serde::Serialize;
use unveil_core::gate;

use crate::common::{self, Context};

#[derive(Args)]
pub struct GateArgs {
    /// Evaluate at this local time instead of now
    #[arg(long, value_parser = common::parse_at)]
    at: Option<NaiveDateTime>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct GateReport {
    enabled: bool,
    month: u32,
    day: u32,
    at: NaiveDateTime,
    within: bool,
    unlocked: bool,
    next_occurrence: Option<NaiveDateTime>,
}

pub fn run(args: GateArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let config = ctx.load_config()?;
    let now = common::now_or(args.at);
    let window = config.window()?;

    let within = window.is_some_and(|w| gate::is_within_window(w, now));
    let report = GateReport {
        enabled: window.is_some(),
        month: config.gate.month,
        day: config.gate.day,
        at: now,
        within,
        unlocked: window.is_none() || within,
        next_occurrence: window.map(|w| gate::next_occurrence(w, now)),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !report.enabled {
        println!("Gate: disabled");
        println!("State: revealed");
        return Ok(());
    }
    println!(
        "Window: {} {} (every year)",
        common::month_name(report.month),
        report.day
    );
    println!("At: {}", report.at);
    println!(
        "State: {}",
        if report.unlocked { "revealed" } else { "locked" }
    );
    if let Some(next) = report.next_occurrence {
        println!("Next opening: {next}");
    }
    Ok(())
}
