//! One-shot report: run the pipeline over an events file and print the
//! venue, peak-flow and recommendation tables.

mod args;
mod render;

use std::sync::Arc;

use anyhow::{Context, Result};
use festflow_core::dataset::Dataset;
use festflow_core::frequency::{FrequencySource, MeasuredFrequency};
use festflow_core::pipeline::{self, PipelineOutput};
use festflow_core::recommendation::RecommendationTier;
use festflow_sources::events::{load_events_file, DateWindow};
use festflow_sources::stops::{load_stops_or_empty, DemoStops, FileStops, StopSource};
use festflow_sources::timetable::TimetableFrequency;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use args::{Args, Command, USAGE};
use render::{render_table, to_rows};

const VENUE_COLUMNS: &[&str] = &[
    "event_id",
    "venue_name",
    "performance_time",
    "estimated_attendance",
    "stops_nearby",
    "avg_buses_per_hour",
    "uzi_normalized",
    "recommendation_tier",
];
const FLOW_COLUMNS: &[&str] = &["start", "end", "inflow_total", "outflow_total"];
const RECOMMENDATION_COLUMNS: &[&str] = &[
    "event_id",
    "venue_name",
    "tier",
    "suggested_vehicles",
    "uzi_normalized",
    "message",
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "festflow_report=info,festflow_sources=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = match args::parse(std::env::args().skip(1), |key| std::env::var(key).ok())? {
        Command::Help => {
            println!("{USAGE}");
            return Ok(());
        }
        Command::Run(args) => args,
    };

    let output = run(&args).await?;
    print_report(&output, args.rows)
}

async fn run(args: &Args) -> Result<PipelineOutput> {
    let mut config = args.preset.config();
    if let Some(radius) = args.radius_m {
        config.stop_radius_m = radius;
    }

    let window = DateWindow {
        from: args.from,
        to: args.to,
    };
    let records = load_events_file(&args.events, &window)
        .with_context(|| format!("loading events from {}", args.events.display()))?;

    let source: Box<dyn StopSource> = match &args.stops {
        Some(path) => Box::new(FileStops::new(path.clone())),
        None => Box::new(DemoStops::around_records(&records)),
    };
    let stops = load_stops_or_empty(source.as_ref()).await;

    let frequency: Arc<dyn FrequencySource> = match &args.timetable {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading timetable {}", path.display()))?;
            Arc::new(TimetableFrequency::from_json(&json)?)
        }
        None => Arc::new(MeasuredFrequency),
    };

    tracing::info!(
        preset = ?args.preset,
        performances = records.len(),
        stops = stops.len(),
        "Running pipeline"
    );
    let dataset = Dataset::new(records, stops);
    Ok(pipeline::run(&dataset, &config, frequency.as_ref())?)
}

fn print_report(output: &PipelineOutput, rows: usize) -> Result<()> {
    let venues = to_rows(&output.venues)?;
    print!(
        "{}",
        render_table(
            "venues (UZI + attendance + metadata)",
            &venues,
            VENUE_COLUMNS,
            rows
        )
    );

    let flows = to_rows(&output.peak_flows)?;
    print!(
        "{}",
        render_table(
            "peak_flows (inflow/outflow per bin)",
            &flows,
            FLOW_COLUMNS,
            rows
        )
    );

    let actionable: Vec<_> = output
        .recommendations
        .iter()
        .filter(|r| r.tier != RecommendationTier::Low)
        .cloned()
        .collect();
    let recs = to_rows(&actionable)?;
    print!(
        "{}",
        render_table(
            "recommendations (critical/high/medium)",
            &recs,
            RECOMMENDATION_COLUMNS,
            rows
        )
    );

    if output.excluded_without_coordinates > 0 {
        println!(
            "\n{} performance(s) skipped: venue has no coordinates",
            output.excluded_without_coordinates
        );
    }
    Ok(())
}
