//! Builds a [`Snapshot`] from the configured data sources.
//!
//! Unreadable event files, stop sources and timetables each degrade to an
//! empty input with a warning; only pipeline validation can fail a load.

use std::path::Path;
use std::sync::Arc;

use festflow_core::config::PipelineConfig;
use festflow_core::dataset::Dataset;
use festflow_core::frequency::{FrequencySource, MeasuredFrequency};
use festflow_sources::events::load_events_or_empty;
use festflow_sources::stops::{load_stops_or_empty, DemoStops, FileStops, StopSource, TfeStops};
use festflow_sources::timetable::TimetableFrequency;
use festflow_sources::SourceError;

use crate::config::{DataConfig, StopsSetting};
use crate::error::{AppError, AppResult};
use crate::state::Snapshot;

/// Load events, stops and service frequency, then run the pipeline.
pub async fn load_snapshot(data: &DataConfig, pipeline: &PipelineConfig) -> AppResult<Snapshot> {
    let events_path = data.events_path.clone();
    let window = data.window;
    let records = tokio::task::spawn_blocking(move || load_events_or_empty(&events_path, &window))
        .await
        .map_err(|e| AppError::InternalError(format!("Event loader panicked: {e}")))?;

    let source: Box<dyn StopSource> = match &data.stops {
        StopsSetting::Demo => Box::new(DemoStops::around_records(&records)),
        StopsSetting::File(path) => Box::new(FileStops::new(path.clone())),
        StopsSetting::Live(url) => Box::new(TfeStops::new(url.clone())?),
    };
    let stops = load_stops_or_empty(source.as_ref()).await;

    let frequency = match &data.timetable_path {
        Some(path) => load_timetable_or_measured(path).await,
        None => Arc::new(MeasuredFrequency),
    };

    let dataset = Dataset::new(records, stops);
    let snapshot = Snapshot::build(dataset, pipeline, frequency.as_ref())?;
    tracing::info!(
        performances = snapshot.dataset.records().len(),
        stops = snapshot.dataset.stops().len(),
        scored = snapshot.output.venues.len(),
        "Dataset loaded",
    );
    Ok(snapshot)
}

async fn load_timetable_or_measured(path: &Path) -> Arc<dyn FrequencySource> {
    let parsed = match tokio::fs::read_to_string(path).await {
        Ok(json) => TimetableFrequency::from_json(&json),
        Err(e) => Err(SourceError::Io {
            path: path.display().to_string(),
            source: e,
        }),
    };
    match parsed {
        Ok(timetables) => {
            tracing::info!(stops = timetables.len(), "Loaded stop timetables");
            Arc::new(timetables)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Timetables unavailable, using measured stop frequency");
            Arc::new(MeasuredFrequency)
        }
    }
}
