//! Festival event feed ingestion.
//!
//! Two vendor layouts are accepted by the same raw model:
//!
//! - **places + events**: a top-level `places` list (with `loc` and
//!   `properties`) referenced from each schedule by `place_id`.
//! - **embedded place**: each schedule carries its `place` inline, may set a
//!   `start_ts`, and events carry their own ranking.
//!
//! Every performance becomes one flattened [`PerformanceRecord`]. Scalars are
//! read leniently (see [`crate::json`]) so one odd field never rejects a feed.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use festflow_core::model::{
    PerformanceRecord, DEFAULT_DURATION_MINUTES, DEFAULT_RANKING_IN_LEVEL, DEFAULT_RANKING_LEVEL,
    MAX_DURATION_MINUTES,
};
use festflow_core::types::Timestamp;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::SourceError;
use crate::json::{as_bool, as_f64, as_i64, as_id, as_positive_u32, as_text};
use crate::timestamps::coerce_timestamp;

/// Capacity keys in `properties`, most specific first.
const CAPACITY_KEYS: &[&str] = &["place.capacity.max", "capacity.max", "capacity"];

/// Ticket type whose price is reported as `min_price`.
const STANDARD_TICKET: &str = "Standard";

// ---------------------------------------------------------------------------
// Date window
// ---------------------------------------------------------------------------

/// Optional inclusive `[from, to]` filter on performance start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl DateWindow {
    pub fn contains(&self, t: Timestamp) -> bool {
        self.from.map_or(true, |from| t >= from) && self.to.map_or(true, |to| t <= to)
    }
}

// ---------------------------------------------------------------------------
// Raw vendor model
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct RawFeed {
    #[serde(default)]
    places: Vec<RawPlace>,
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPlace {
    place_id: Option<Value>,
    name: Option<Value>,
    town: Option<Value>,
    address: Option<Value>,
    loc: Option<RawLoc>,
    latitude: Option<Value>,
    longitude: Option<Value>,
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLoc {
    latitude: Option<Value>,
    longitude: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    event_id: Option<Value>,
    name: Option<Value>,
    category: Option<Value>,
    ranking_level: Option<Value>,
    ranking_in_level: Option<Value>,
    #[serde(default)]
    schedules: Vec<RawSchedule>,
}

#[derive(Debug, Deserialize)]
struct RawSchedule {
    place_id: Option<Value>,
    place: Option<RawPlace>,
    start_ts: Option<Value>,
    #[serde(default)]
    performances: Vec<RawPerformance>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPerformance {
    ts: Option<Value>,
    duration: Option<Value>,
    sold_out: Option<Value>,
    #[serde(default)]
    tickets: Vec<RawTicket>,
}

#[derive(Debug, Deserialize)]
struct RawTicket {
    #[serde(rename = "type")]
    kind: Option<String>,
    min_price: Option<Value>,
}

// ---------------------------------------------------------------------------
// Venue resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct Venue {
    id: Option<String>,
    name: String,
    town: Option<String>,
    address: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    capacity: Option<u32>,
}

impl From<&RawPlace> for Venue {
    fn from(place: &RawPlace) -> Self {
        let (lat, lon) = match &place.loc {
            Some(loc) => (
                as_f64(loc.latitude.as_ref()),
                as_f64(loc.longitude.as_ref()),
            ),
            None => (
                as_f64(place.latitude.as_ref()),
                as_f64(place.longitude.as_ref()),
            ),
        };
        let capacity = place.properties.as_ref().and_then(|props| {
            CAPACITY_KEYS
                .iter()
                .find_map(|key| as_positive_u32(props.get(*key)))
        });

        Self {
            id: as_id(place.place_id.as_ref()),
            name: as_text(place.name.as_ref()).unwrap_or_default(),
            town: as_text(place.town.as_ref()),
            address: as_text(place.address.as_ref()),
            lat,
            lon,
            capacity,
        }
    }
}

fn standard_min_price(tickets: &[RawTicket]) -> Option<f64> {
    tickets
        .iter()
        .find(|t| t.kind.as_deref() == Some(STANDARD_TICKET))
        .and_then(|t| as_f64(t.min_price.as_ref()))
}

fn ranking(value: Option<&Value>, default: i32) -> i32 {
    as_i64(value)
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(default)
}

fn duration(value: Option<&Value>, event_id: &str) -> u32 {
    match as_positive_u32(value) {
        Some(minutes) if minutes <= MAX_DURATION_MINUTES => minutes,
        Some(minutes) => {
            tracing::warn!(event_id, minutes, "Implausible duration, using default");
            DEFAULT_DURATION_MINUTES
        }
        None => DEFAULT_DURATION_MINUTES,
    }
}

// ---------------------------------------------------------------------------
// Flattening
// ---------------------------------------------------------------------------

/// Parse a feed, substituting the current time for unparseable timestamps.
pub fn parse_events(json: &str, window: &DateWindow) -> Result<Vec<PerformanceRecord>, SourceError> {
    parse_events_at(json, window, Utc::now())
}

/// Parse a feed with an explicit "now" used for unparseable timestamps.
pub fn parse_events_at(
    json: &str,
    window: &DateWindow,
    now: Timestamp,
) -> Result<Vec<PerformanceRecord>, SourceError> {
    let feed: RawFeed = serde_json::from_str(json)?;
    Ok(flatten(&feed, window, now))
}

fn flatten(feed: &RawFeed, window: &DateWindow, now: Timestamp) -> Vec<PerformanceRecord> {
    let places: HashMap<String, Venue> = feed
        .places
        .iter()
        .map(Venue::from)
        .filter_map(|v| v.id.clone().map(|id| (id, v)))
        .collect();

    let mut records = Vec::new();
    let mut skipped_without_id = 0usize;
    let mut outside_window = 0usize;
    let fallback_performance = [RawPerformance::default()];

    for event in &feed.events {
        let Some(event_id) = as_id(event.event_id.as_ref()) else {
            skipped_without_id += 1;
            continue;
        };
        let event_name = as_text(event.name.as_ref()).unwrap_or_default();
        let event_category = as_text(event.category.as_ref()).unwrap_or_default();
        let ranking_level = ranking(event.ranking_level.as_ref(), DEFAULT_RANKING_LEVEL);
        let ranking_in_level = ranking(event.ranking_in_level.as_ref(), DEFAULT_RANKING_IN_LEVEL);

        for schedule in &event.schedules {
            let schedule_place_id = as_id(schedule.place_id.as_ref());
            let venue = match &schedule.place {
                Some(inline) => {
                    let mut v = Venue::from(inline);
                    if v.id.is_none() {
                        v.id = schedule_place_id.clone();
                    }
                    v
                }
                None => schedule_place_id
                    .as_ref()
                    .and_then(|id| places.get(id))
                    .cloned()
                    .unwrap_or_else(|| Venue {
                        id: schedule_place_id.clone(),
                        ..Venue::default()
                    }),
            };

            let performances: &[RawPerformance] = if schedule.performances.is_empty() {
                &fallback_performance
            } else {
                &schedule.performances
            };

            for perf in performances {
                let raw_ts = as_text(perf.ts.as_ref()).or_else(|| as_text(schedule.start_ts.as_ref()));
                let parsed = coerce_timestamp(raw_ts.as_deref(), now, &event_id);
                if !window.contains(parsed.utc) {
                    outside_window += 1;
                    continue;
                }

                let mut record = PerformanceRecord::new(
                    event_id.clone(),
                    venue.id.clone().unwrap_or_default(),
                    parsed.utc,
                );
                record.event_name = event_name.clone();
                record.event_category = event_category.clone();
                record.venue_name = venue.name.clone();
                record.venue_town = venue.town.clone();
                record.venue_address = venue.address.clone();
                record.venue_lat = venue.lat;
                record.venue_lon = venue.lon;
                record.venue_capacity = venue.capacity;
                record.ranking_level = ranking_level;
                record.ranking_in_level = ranking_in_level;
                record.utc_offset_minutes = parsed.offset_minutes;
                record.duration_minutes = duration(perf.duration.as_ref(), &event_id);
                record.sold_out = as_bool(perf.sold_out.as_ref()).unwrap_or(false);
                record.min_price = standard_min_price(&perf.tickets);
                records.push(record);
            }
        }
    }

    tracing::debug!(
        places = places.len(),
        performances = records.len(),
        skipped_without_id,
        outside_window,
        "Flattened event feed"
    );
    records
}

// ---------------------------------------------------------------------------
// File loading
// ---------------------------------------------------------------------------

/// Read and flatten an events file.
pub fn load_events_file(
    path: &Path,
    window: &DateWindow,
) -> Result<Vec<PerformanceRecord>, SourceError> {
    let json = std::fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
    let records = parse_events(&json, window)?;
    tracing::info!(path = %path.display(), performances = records.len(), "Loaded events");
    Ok(records)
}

/// Like [`load_events_file`] but resolves any failure to an empty set.
pub fn load_events_or_empty(path: &Path, window: &DateWindow) -> Vec<PerformanceRecord> {
    load_events_file(path, window).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Events unavailable, continuing with an empty set");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    fn parse(feed: Value) -> Vec<PerformanceRecord> {
        parse_events_at(&feed.to_string(), &DateWindow::default(), now()).unwrap()
    }

    fn places_layout() -> Value {
        json!({
            "places": [
                {
                    "place_id": "p1",
                    "name": "Assembly Hall",
                    "town": "Edinburgh",
                    "address": "Mound Place",
                    "loc": { "latitude": "55.9497", "longitude": -3.1953 },
                    "properties": { "capacity.max": "850", "capacity": 10 }
                },
                { "place_id": "p2", "name": "Nowhere", "properties": { "capacity": 0 } }
            ],
            "events": [
                {
                    "event_id": "e1",
                    "name": "Late Show",
                    "category": "Comedy",
                    "schedules": [
                        {
                            "place_id": "p1",
                            "performances": [
                                {
                                    "ts": "2025-08-10T20:00:00+01:00",
                                    "duration": 60,
                                    "tickets": [
                                        { "type": "Concession", "min_price": 8 },
                                        { "type": "Standard", "min_price": "12.5" }
                                    ]
                                },
                                { "ts": "2025-08-11 20:00:00" }
                            ]
                        },
                        { "place_id": "p2", "performances": [{ "ts": "2025-08-12T20:00:00Z" }] }
                    ]
                },
                { "name": "No id", "schedules": [] }
            ]
        })
    }

    #[test]
    fn places_layout_flattens_each_performance() {
        let records = parse(places_layout());
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.event_id, "e1");
        assert_eq!(first.event_category, "Comedy");
        assert_eq!(first.venue_name, "Assembly Hall");
        assert_eq!(first.venue_town.as_deref(), Some("Edinburgh"));
        assert_eq!(first.venue_lat, Some(55.9497));
        assert_eq!(first.venue_capacity, Some(850));
        assert_eq!(first.duration_minutes, 60);
        assert_eq!(first.min_price, Some(12.5));
        assert_eq!(first.utc_offset_minutes, 60);
        assert_eq!(
            first.performance_time,
            Utc.with_ymd_and_hms(2025, 8, 10, 19, 0, 0).unwrap()
        );
        assert_eq!(first.ranking_level, DEFAULT_RANKING_LEVEL);

        let second = &records[1];
        assert_eq!(second.duration_minutes, DEFAULT_DURATION_MINUTES);
        assert_eq!(second.min_price, None);
        assert_eq!(second.utc_offset_minutes, 0);

        let third = &records[2];
        assert_eq!(third.venue_id, "p2");
        assert_eq!(third.venue_capacity, None);
        assert!(third.venue_location().is_none());
    }

    #[test]
    fn embedded_layout_uses_start_ts_and_ranking() {
        let records = parse(json!({
            "events": [{
                "event_id": 7,
                "name": "Gala",
                "ranking_level": "1",
                "ranking_in_level": 2,
                "schedules": [
                    {
                        "start_ts": "2025-08-10T19:00:00Z",
                        "place": {
                            "place_id": "v9",
                            "name": "Usher Hall",
                            "latitude": 55.9469,
                            "longitude": "-3.2050",
                            "properties": { "place.capacity.max": 2200 }
                        }
                    },
                    {
                        "place_id": "v9",
                        "start_ts": "2025-08-11T19:00:00Z",
                        "place": { "name": "Usher Hall" },
                        "performances": [{ "sold_out": true, "duration": "90" }]
                    }
                ]
            }]
        }));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_id, "7");
        assert_eq!(records[0].ranking_level, 1);
        assert_eq!(records[0].ranking_in_level, 2);
        assert_eq!(records[0].venue_capacity, Some(2200));
        assert_eq!(records[0].venue_lon, Some(-3.205));
        assert!(!records[0].sold_out);
        assert_eq!(records[0].duration_minutes, DEFAULT_DURATION_MINUTES);

        assert_eq!(records[1].venue_id, "v9");
        assert!(records[1].sold_out);
        assert_eq!(records[1].duration_minutes, 90);
        assert_eq!(
            records[1].performance_time,
            Utc.with_ymd_and_hms(2025, 8, 11, 19, 0, 0).unwrap()
        );
    }

    #[test]
    fn implausible_duration_falls_back_to_default() {
        let records = parse(json!({
            "events": [{
                "event_id": "e1",
                "schedules": [{
                    "place_id": "p",
                    "start_ts": "2025-08-10T19:00:00Z",
                    "performances": [
                        { "duration": 4294967295u64 },
                        { "duration": MAX_DURATION_MINUTES },
                        { "duration": MAX_DURATION_MINUTES + 1 }
                    ]
                }]
            }]
        }));
        let durations: Vec<u32> = records.iter().map(|r| r.duration_minutes).collect();
        assert_eq!(
            durations,
            [DEFAULT_DURATION_MINUTES, MAX_DURATION_MINUTES, DEFAULT_DURATION_MINUTES]
        );
    }

    #[test]
    fn unparseable_timestamp_becomes_now() {
        let records = parse(json!({
            "events": [{
                "event_id": "e1",
                "schedules": [{ "place_id": "p", "performances": [{ "ts": "tbc" }] }]
            }]
        }));
        assert_eq!(records[0].performance_time, now());
    }

    #[test]
    fn window_filters_inclusively() {
        let window = DateWindow {
            from: Some(Utc.with_ymd_and_hms(2025, 8, 11, 0, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2025, 8, 12, 20, 0, 0).unwrap()),
        };
        let records =
            parse_events_at(&places_layout().to_string(), &window, now()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| window.contains(r.performance_time)));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let result = parse_events_at("{ not json", &DateWindow::default(), now());
        assert_matches!(result, Err(SourceError::Json(_)));
    }

    #[test]
    fn file_loading_and_missing_file_fallback() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", places_layout()).unwrap();

        let records = load_events_file(file.path(), &DateWindow::default()).unwrap();
        assert_eq!(records.len(), 3);

        let missing = Path::new("/definitely/not/here.json");
        assert_matches!(
            load_events_file(missing, &DateWindow::default()),
            Err(SourceError::Io { .. })
        );
        assert!(load_events_or_empty(missing, &DateWindow::default()).is_empty());
    }
}
