use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::{TimeZone, Utc};
use festflow_core::config::{PipelineConfig, Preset};
use festflow_core::dataset::Dataset;
use festflow_core::frequency::MeasuredFrequency;
use festflow_core::model::{PerformanceRecord, TransitStop};
use festflow_sources::events::DateWindow;
use http_body_util::BodyExt;
use tower::ServiceExt;

use festflow_api::config::{DataConfig, ServerConfig, StopsSetting};
use festflow_api::router::build_app_router;
use festflow_api::state::{AppState, DatasetStore, Snapshot};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Data config whose sources are all offline.
pub fn test_data_config(events_path: PathBuf) -> DataConfig {
    DataConfig {
        events_path,
        stops: StopsSetting::Demo,
        timetable_path: None,
        preset: Preset::Optimisation,
        stop_radius_m: None,
        window: DateWindow::default(),
    }
}

fn record(
    event_id: &str,
    name: &str,
    category: &str,
    location: Option<(f64, f64)>,
    capacity: u32,
    day: u32,
    hour: u32,
) -> PerformanceRecord {
    let time = Utc.with_ymd_and_hms(2025, 8, day, hour, 0, 0).unwrap();
    let mut r = PerformanceRecord::new(event_id, format!("venue-{event_id}"), time);
    r.event_name = name.to_string();
    r.event_category = category.to_string();
    r.venue_name = format!("{name} Hall");
    r.venue_town = Some("Edinburgh".to_string());
    r.venue_lat = location.map(|(lat, _)| lat);
    r.venue_lon = location.map(|(_, lon)| lon);
    r.venue_capacity = Some(capacity);
    r
}

fn stop(id: &str, lat: f64, lon: f64) -> TransitStop {
    TransitStop {
        stop_id: id.to_string(),
        name: format!("Stop {id}"),
        locality: "City Centre".to_string(),
        lat,
        lon,
        services: vec!["23".to_string()],
        buses_per_hour: None,
    }
}

/// Fixture dataset.
///
/// - `e1` Fringe Gala: ranking 1, 1000 seats, two stops within 200 m.
/// - `e2` Late Comedy: two performances, about 1 km north, no stop in range.
/// - `e3` Mystery: no venue coordinates.
pub fn test_dataset() -> Dataset {
    let mut gala = record("e1", "Fringe Gala", "Music", Some((55.9533, -3.1883)), 1000, 10, 19);
    gala.ranking_level = 1;

    let records = vec![
        gala,
        record("e2", "Late Comedy", "Comedy", Some((55.9623, -3.1883)), 200, 10, 21),
        record("e2", "Late Comedy", "Comedy", Some((55.9623, -3.1883)), 200, 11, 21),
        record("e3", "Mystery", "Theatre", None, 80, 12, 14),
    ];
    let stops = vec![stop("s1", 55.9535, -3.1883), stop("s2", 55.9550, -3.1883)];
    Dataset::new(records, stops)
}

/// Build the full application router over `dataset`.
///
/// Uses the same [`build_app_router`] as `main.rs` so tests exercise the
/// production middleware stack.
pub fn build_test_app_with(dataset: Dataset, data_config: DataConfig) -> Router {
    let config = test_config();
    let pipeline_config = PipelineConfig::default();
    let snapshot = Snapshot::build(dataset, &pipeline_config, &MeasuredFrequency).unwrap();

    let state = AppState {
        config: Arc::new(config.clone()),
        data_config: Arc::new(data_config),
        pipeline_config: Arc::new(pipeline_config),
        store: Arc::new(DatasetStore::new(snapshot)),
    };
    build_app_router(state, &config)
}

/// Router over [`test_dataset`]; reloads read from a path that does not exist.
pub fn build_test_app() -> Router {
    build_test_app_with(
        test_dataset(),
        test_data_config(PathBuf::from("/nonexistent/events.json")),
    )
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
