//! Input records consumed by the pipeline.
//!
//! Both types are plain flattened views produced at the ingestion boundary;
//! defaults (duration, ranking) are applied there and mirrored here by
//! [`PerformanceRecord::new`].

use chrono::{DateTime, FixedOffset, Offset, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{GeoPoint, Timestamp};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Performance length when the source does not say.
pub const DEFAULT_DURATION_MINUTES: u32 = 120;
/// Longest performance accepted from a source (one week).
pub const MAX_DURATION_MINUTES: u32 = 7 * 24 * 60;
/// Ranking level when the source does not say (lower = higher priority).
pub const DEFAULT_RANKING_LEVEL: i32 = 3;
/// Ranking within the level when the source does not say.
pub const DEFAULT_RANKING_IN_LEVEL: i32 = 1;

// ---------------------------------------------------------------------------
// PerformanceRecord
// ---------------------------------------------------------------------------

/// One scheduled occurrence of an event at a venue.
///
/// Several records may share an `event_id` (one per performance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub event_id: String,
    pub event_name: String,
    pub event_category: String,
    pub venue_id: String,
    pub venue_name: String,
    pub venue_town: Option<String>,
    pub venue_address: Option<String>,
    pub venue_lat: Option<f64>,
    pub venue_lon: Option<f64>,
    pub venue_capacity: Option<u32>,
    pub ranking_level: i32,
    pub ranking_in_level: i32,
    /// Start of the performance, normalized to UTC.
    pub performance_time: Timestamp,
    /// Offset of the event's own clock from UTC, kept so prime time can be
    /// judged on the wall clock the source supplied.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    pub duration_minutes: u32,
    pub sold_out: bool,
    pub min_price: Option<f64>,
}

impl PerformanceRecord {
    /// Build a record with source defaults for everything but identity and time.
    pub fn new(
        event_id: impl Into<String>,
        venue_id: impl Into<String>,
        performance_time: Timestamp,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_name: String::new(),
            event_category: String::new(),
            venue_id: venue_id.into(),
            venue_name: String::new(),
            venue_town: None,
            venue_address: None,
            venue_lat: None,
            venue_lon: None,
            venue_capacity: None,
            ranking_level: DEFAULT_RANKING_LEVEL,
            ranking_in_level: DEFAULT_RANKING_IN_LEVEL,
            performance_time,
            utc_offset_minutes: 0,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            sold_out: false,
            min_price: None,
        }
    }

    /// Venue position, or `None` when either coordinate is missing or not finite.
    pub fn venue_location(&self) -> Option<GeoPoint> {
        match (self.venue_lat, self.venue_lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(GeoPoint::new(lat, lon))
            }
            _ => None,
        }
    }

    /// Capacity if known and positive.
    pub fn known_capacity(&self) -> Option<u32> {
        self.venue_capacity.filter(|c| *c > 0)
    }

    /// Performance start on the event's own wall clock.
    pub fn local_time(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());
        self.performance_time.with_timezone(&offset)
    }

    /// Performance end (start + duration), UTC.
    pub fn performance_end(&self) -> Timestamp {
        self.performance_time + TimeDelta::minutes(i64::from(self.duration_minutes))
    }
}

// ---------------------------------------------------------------------------
// TransitStop
// ---------------------------------------------------------------------------

/// A physical transit stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitStop {
    pub stop_id: String,
    pub name: String,
    pub locality: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub services: Vec<String>,
    /// Measured service frequency, when the stop source knows it.
    #[serde(default)]
    pub buses_per_hour: Option<f64>,
}

impl TransitStop {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}
