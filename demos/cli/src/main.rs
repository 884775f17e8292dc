use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use timeline_core::presentation::{
    build_cells, current_day_index, tooltip_date, CellBody, DateRange, DayCell,
};
use timeline_core::{interpolate, DenseTimeline, Scale, TimelineConfig, TimelineInput};
use timeline_polling::{PollingConfig, PollingDataSource};
use timeline_search::{parse_records_str, MemorySearchClient, SearchFilter};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const LEVELS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Parser, Debug)]
#[command(
    name = "timeline-cli",
    about = "Poll a JSON record set page by page and print the daily activity strip."
)]
struct Args {
    /// JSON file holding a record array or a search page.
    #[arg(short, long)]
    input: PathBuf,
    /// Re-poll interval in milliseconds.
    #[arg(long, default_value_t = 3000)]
    interval_ms: u64,
    /// Records per page.
    #[arg(long, default_value_t = timeline_search::PAGE_LIMIT)]
    page_size: u32,
    /// Simulated server latency in milliseconds.
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,
    /// Number of strips to print before exiting.
    #[arg(long, default_value_t = 3)]
    cycles: usize,
    /// Track height in pixels used for the scale.
    #[arg(long, default_value_t = 130.0)]
    track_height: f64,
    /// Search filter as a JSON object. Its `dateFilter` range is highlighted.
    #[arg(long)]
    filter: Option<String>,
    /// Print the dense timeline as JSON instead of a text strip.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {:?}", args.input))?;
    let records = parse_records_str(&data)
        .with_context(|| format!("cannot decode records from {:?}", args.input))?;
    info!(records = records.len(), "record set loaded");

    let client = Arc::new(
        MemorySearchClient::new(records).with_latency(Duration::from_millis(args.latency_ms)),
    );
    let polling = PollingConfig {
        page_size: args.page_size,
        interval_ms: args.interval_ms,
    };
    let filter = match &args.filter {
        Some(text) => SearchFilter::from_value(
            serde_json::from_str(text).context("--filter is not valid JSON")?,
        )?,
        None => SearchFilter::default(),
    };
    let highlight = filter.date_range();
    let source = PollingDataSource::new(client, polling.clone());
    let timeline_config = TimelineConfig::default();

    let mut updates = source.subscribe();
    source.activate(filter, polling.interval());

    let mut printed = 0;
    while printed < args.cycles {
        updates
            .changed()
            .await
            .context("polling source stopped")?;
        let snapshot = updates.borrow_and_update().clone();
        if !snapshot.initialized || snapshot.offsets != snapshot.loaded_offsets {
            continue;
        }
        if let Some(err) = &snapshot.error {
            warn!(%err, "showing last good data");
        }

        let view = interpolate(&TimelineInput::from(snapshot), &timeline_config)?;
        let Some(timeline) = view.timeline else {
            continue;
        };

        if args.json {
            println!("{}", serde_json::to_string_pretty(&timeline)?);
        } else {
            print_strip(&timeline, args.track_height, &timeline_config, highlight.as_ref())?;
        }
        printed += 1;

        if let Some(page) = timeline.page_request() {
            if source.add_page(Some(page)) {
                info!(page, "scrolled into loading days; requesting next page");
            }
        }
    }

    source.deactivate();
    Ok(())
}

fn print_strip(
    timeline: &DenseTimeline,
    track_height: f64,
    config: &TimelineConfig,
    highlight: Option<&DateRange>,
) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let scale = Scale::from_timeline(&timeline.entries, track_height, config)?;
    let cells = build_cells(timeline, &scale, today, highlight);
    let top = scale.range().1;

    println!(
        "{} .. {}  {} of {} days loaded, {} loading",
        timeline.window.start,
        timeline.window.end,
        timeline.raw.len(),
        timeline.meta.total,
        timeline.loading_days(),
    );

    let strip: String = cells.iter().map(|cell| glyph(cell, top)).collect();
    println!("{strip}");
    if highlight.is_some() {
        let marks: String = cells
            .iter()
            .map(|cell| if cell.flags.highlighted { '-' } else { ' ' })
            .collect();
        println!("{marks}");
    }

    if let Some(index) = current_day_index(&timeline.entries, today) {
        println!("{}^ {}", " ".repeat(index), tooltip_date(today, today));
    }
    Ok(())
}

fn glyph(cell: &DayCell, top: f64) -> char {
    match &cell.body {
        CellBody::Loading { .. } => '?',
        CellBody::Stacked { segments } => {
            let height: f64 = segments.iter().map(|segment| segment.height).sum();
            if height <= 0.0 || top <= 0.0 {
                return if cell.flags.before_today { '.' } else { ' ' };
            }
            let level = ((height / top) * 8.0).ceil().clamp(1.0, 8.0) as usize;
            LEVELS[level]
        }
    }
}
