use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDateTime;
use clap::Args;
use unveil_core::dom::{Document, Selector};
use unveil_core::visibility::{TRACKED_CLASS, VISIBLE_CLASS};
use unveil_core::{Event, HostEvent, ManualScheduler, Page, PageLayout};

use crate::common::{self, Context};

#[derive(Args)]
pub struct SimulateArgs {
    /// Page layout TOML (defaults to the built-in sample page)
    layout: Option<PathBuf>,
    /// Local time the simulation starts at
    #[arg(long, value_parser = common::parse_at)]
    at: Option<NaiveDateTime>,
    /// Virtual time to run for
    #[arg(long, default_value_t = 8000)]
    duration_ms: u64,
    /// Scroll the page: `<ms>:<y>`, may be repeated
    #[arg(long = "scroll", value_parser = parse_scroll)]
    scrolls: Vec<(u64, f64)>,
    /// Seed for decoration randomness
    #[arg(long)]
    seed: Option<u64>,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

fn parse_scroll(value: &str) -> Result<(u64, f64), String> {
    let (ms, y) = value
        .split_once(':')
        .ok_or_else(|| format!("invalid scroll '{value}', expected <ms>:<y>"))?;
    let ms = ms.trim().parse().map_err(|e| format!("invalid scroll time: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("invalid scroll offset: {e}"))?;
    Ok((ms, y))
}

fn describe(event: &Event) -> String {
    match event {
        Event::LoadingStarted { .. } => "loading started".into(),
        Event::LoadingFinished { .. } => "loading finished".into(),
        Event::StateChanged { from, to, .. } => format!("state {from:?} -> {to:?}"),
        Event::CountdownTicked { snapshot, .. } => format!("countdown {snapshot}"),
        Event::ElementRevealed { element, path, .. } => format!("revealed {element} ({path:?})"),
        Event::VisibilityScanned { revealed, .. } => format!("scan revealed {revealed}"),
        Event::DecorationSpawned { kind, count, .. } => format!("spawned {count} {kind:?}"),
        Event::FeatureSkipped { feature, .. } => format!("skipped {feature}"),
        Event::EffectsStarted { .. } => "effects started".into(),
        Event::PageLoaded { .. } => "page loaded".into(),
    }
}

pub fn run(args: SimulateArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ctx.load_config()?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let layout = match &args.layout {
        Some(path) => PageLayout::load(path)?,
        None => PageLayout::sample()?,
    };
    let start = common::now_or(args.at);
    let mut page = Page::new(layout.build(), ManualScheduler::new(start), config)?;

    page.init();
    page.dispatch(HostEvent::Load);

    let mut scrolls = args.scrolls.clone();
    scrolls.sort_by_key(|(ms, _)| *ms);
    let end = Duration::from_millis(args.duration_ms);
    for (ms, y) in scrolls {
        let when = Duration::from_millis(ms).min(end);
        page.advance(when.saturating_sub(page.elapsed()));
        page.document_mut().scroll_to(y);
        page.dispatch(HostEvent::Scroll);
    }
    page.advance(end.saturating_sub(page.elapsed()));

    let dropped = page.journal().dropped();
    for event in page.drain_events() {
        if args.json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            let offset = event.at() - start;
            println!("{:>7}ms  {}", offset.num_milliseconds(), describe(&event));
        }
    }

    if !args.json {
        let doc = page.document();
        let tracked = doc.find_all(&Selector::class(TRACKED_CLASS));
        let visible = tracked
            .iter()
            .filter(|el| doc.has_class(**el, VISIBLE_CLASS))
            .count();
        println!("State: {:?}", page.state());
        println!("Visible: {visible}/{}", tracked.len());
        if dropped > 0 {
            println!("Dropped: {dropped} early events");
        }
    }
    Ok(())
}
