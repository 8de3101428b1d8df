//! Service frequency derived from stop timetables.
//!
//! A timetable is a list of `HH:MM` departures at one stop. Frequency is the
//! number of headways over the observed span, so `17:00, 17:15` is 4/h.

use std::collections::HashMap;

use chrono::NaiveTime;
use festflow_core::frequency::FrequencySource;
use festflow_core::model::TransitStop;
use serde::Deserialize;

use crate::error::SourceError;

/// Departures per hour across the span of `departures`.
///
/// Empty yields `None`; a single departure counts as one per hour; several
/// departures at the same minute count as that many per hour.
pub fn departures_per_hour(departures: &[NaiveTime]) -> Option<f64> {
    let first = departures.iter().min()?;
    let last = departures.iter().max()?;
    let n = departures.len();
    if n == 1 {
        return Some(1.0);
    }
    let span_minutes = (*last - *first).num_minutes();
    if span_minutes <= 0 {
        return Some(n as f64);
    }
    Some((n - 1) as f64 * 60.0 / span_minutes as f64)
}

/// Parse `HH:MM` or `HH:MM:SS` strings, skipping anything else.
pub fn parse_departure_times<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<NaiveTime> {
    raw.into_iter()
        .filter_map(|s| {
            let s = s.trim();
            NaiveTime::parse_from_str(s, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
                .ok()
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct TimetableDoc {
    #[serde(default, alias = "departures")]
    stops: Vec<TimetableEntry>,
}

#[derive(Debug, Deserialize)]
struct TimetableEntry {
    time: Option<String>,
}

/// Parse a single-stop timetable document (`{"stops": [{"time": "17:00"}, ...]}`
/// or the same under `departures`).
pub fn parse_timetable(json: &str) -> Result<Vec<NaiveTime>, SourceError> {
    let doc: TimetableDoc = serde_json::from_str(json)?;
    Ok(parse_departure_times(
        doc.stops.iter().filter_map(|e| e.time.as_deref()),
    ))
}

/// Per-stop frequencies computed from timetables.
#[derive(Debug, Clone, Default)]
pub struct TimetableFrequency {
    per_stop: HashMap<String, f64>,
}

impl TimetableFrequency {
    pub fn from_departures(
        timetables: impl IntoIterator<Item = (String, Vec<NaiveTime>)>,
    ) -> Self {
        let per_stop = timetables
            .into_iter()
            .filter_map(|(stop_id, times)| departures_per_hour(&times).map(|bph| (stop_id, bph)))
            .collect();
        Self { per_stop }
    }

    /// Parse `{"<stop_id>": ["17:00", "17:15", ...], ...}`.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        Ok(Self::from_departures(raw.into_iter().map(|(stop_id, times)| {
            let parsed = parse_departure_times(times.iter().map(String::as_str));
            (stop_id, parsed)
        })))
    }

    pub fn len(&self) -> usize {
        self.per_stop.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_stop.is_empty()
    }
}

impl FrequencySource for TimetableFrequency {
    fn buses_per_hour(&self, stop: &TransitStop) -> Option<f64> {
        self.per_stop.get(&stop.stop_id).copied()
    }
}
