use std::time::Duration;

use chrono::NaiveDateTime;
use clap::Args;
use unveil_core::{
    Event, Page, PageLayout, RealtimeScheduler, RevealState, Scheduler, VirtualDocument,
};

use crate::common::{self, Context};

/// Upper bound on a single sleep so a long-delayed job never stalls the loop.
const MAX_SLEEP: Duration = Duration::from_secs(1);

#[derive(Args)]
pub struct WatchArgs {
    /// Start the clock at this local time instead of now
    #[arg(long, value_parser = common::parse_at)]
    at: Option<NaiveDateTime>,
    /// Stop after this many countdown ticks
    #[arg(long)]
    max_ticks: Option<u64>,
}

pub fn run(args: WatchArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ctx.load_config()?;
    // No pointer and no overlay in a terminal.
    config.cursor.enabled = false;

    let mut layout = PageLayout::sample()?;
    layout
        .elements
        .retain(|el| el.id.as_deref() != Some("loadingScreen"));

    let sched = match args.at {
        Some(at) => RealtimeScheduler::starting_at(at),
        None => RealtimeScheduler::new(),
    };
    let page = Page::new(layout.build(), sched, config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(watch(page, args.max_ticks));
    Ok(())
}

async fn watch(mut page: Page<VirtualDocument, RealtimeScheduler>, max_ticks: Option<u64>) {
    page.init();
    let mut ticks = 0u64;
    loop {
        page.run_due();
        for event in page.drain_events() {
            match event {
                Event::CountdownTicked { snapshot, .. } => {
                    println!("{snapshot}");
                    ticks += 1;
                }
                Event::StateChanged { from, to, .. } => {
                    tracing::info!(?from, ?to, "state changed");
                    if to == RevealState::Unlocking {
                        println!("unlocking...");
                    }
                }
                _ => {}
            }
        }
        if page.state().is_revealed() {
            println!("unlocked");
            return;
        }
        if max_ticks.is_some_and(|max| ticks >= max) {
            return;
        }
        let wait = page
            .scheduler()
            .next_due_in()
            .unwrap_or(MAX_SLEEP)
            .min(MAX_SLEEP);
        tokio::time::sleep(wait).await;
    }
}
