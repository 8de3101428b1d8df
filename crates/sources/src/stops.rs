//! Transit stop sources.
//!
//! Stops come from a TfE-shaped JSON document, either read from disk
//! ([`FileStops`]) or fetched live ([`TfeStops`]). [`DemoStops`] produces a
//! deterministic pair near the venues for offline runs.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use festflow_core::model::{PerformanceRecord, TransitStop};
use festflow_core::types::GeoPoint;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SourceError;
use crate::json::{as_f64, as_id, as_text};

/// Public TfE open-data stops endpoint.
pub const TFE_STOPS_URL: &str = "https://tfe-opendata.com/api/v1/stops";

/// Request timeout for live stop fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Edinburgh city centre, used when there are no venues to centre on.
pub const DEFAULT_CENTRE: GeoPoint = GeoPoint {
    lat: 55.9533,
    lon: -3.1883,
};

/// Produces the list of candidate transit stops.
#[async_trait]
pub trait StopSource: Send + Sync {
    async fn fetch_stops(&self) -> Result<Vec<TransitStop>, SourceError>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

/// Fetch stops, resolving any failure to an empty list.
pub async fn load_stops_or_empty(source: &dyn StopSource) -> Vec<TransitStop> {
    match source.fetch_stops().await {
        Ok(stops) => {
            tracing::info!(source = %source.describe(), stops = stops.len(), "Loaded transit stops");
            stops
        }
        Err(e) => {
            tracing::warn!(
                source = %source.describe(),
                error = %e,
                "Could not load transit stops, continuing without any",
            );
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StopsPayload {
    Wrapped { stops: Vec<RawStop> },
    Bare(Vec<RawStop>),
}

#[derive(Debug, Deserialize)]
struct RawStop {
    #[serde(alias = "stopId")]
    stop_id: Option<Value>,
    name: Option<Value>,
    locality: Option<Value>,
    latitude: Option<Value>,
    longitude: Option<Value>,
    #[serde(default)]
    services: Option<Vec<Value>>,
    buses_per_hour: Option<Value>,
}

impl RawStop {
    fn into_stop(self) -> Option<TransitStop> {
        let stop_id = as_id(self.stop_id.as_ref())?;
        let lat = as_f64(self.latitude.as_ref())?;
        let lon = as_f64(self.longitude.as_ref())?;
        Some(TransitStop {
            name: as_text(self.name.as_ref()).unwrap_or_else(|| stop_id.clone()),
            stop_id,
            locality: as_text(self.locality.as_ref()).unwrap_or_default(),
            lat,
            lon,
            services: self
                .services
                .unwrap_or_default()
                .iter()
                .filter_map(|s| as_text(Some(s)))
                .collect(),
            buses_per_hour: as_f64(self.buses_per_hour.as_ref()).filter(|v| *v >= 0.0),
        })
    }
}

/// Parse a `{"stops": [...]}` document or a bare array. Stops without an
/// id or coordinates are dropped.
pub fn parse_stops(json: &str) -> Result<Vec<TransitStop>, SourceError> {
    let raw = match serde_json::from_str::<StopsPayload>(json)? {
        StopsPayload::Wrapped { stops } | StopsPayload::Bare(stops) => stops,
    };
    let total = raw.len();
    let stops: Vec<TransitStop> = raw.into_iter().filter_map(RawStop::into_stop).collect();
    if stops.len() < total {
        tracing::debug!(dropped = total - stops.len(), "Dropped stops without id or coordinates");
    }
    Ok(stops)
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Stops read from a local JSON file.
#[derive(Debug, Clone)]
pub struct FileStops {
    path: PathBuf,
}

impl FileStops {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StopSource for FileStops {
    async fn fetch_stops(&self) -> Result<Vec<TransitStop>, SourceError> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::io(&self.path, e))?;
        parse_stops(&json)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

// ---------------------------------------------------------------------------
// Live TfE API
// ---------------------------------------------------------------------------

/// Stops fetched from the TfE open-data API.
pub struct TfeStops {
    client: reqwest::Client,
    url: String,
}

impl TfeStops {
    /// Client against `url` with the standard fetch timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self::with_client(client, url))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl StopSource for TfeStops {
    async fn fetch_stops(&self) -> Result<Vec<TransitStop>, SourceError> {
        let response = self.client.get(&self.url).send().await?;
        let body = Self::ensure_success(response).await?.text().await?;
        parse_stops(&body)
    }

    fn describe(&self) -> String {
        format!("tfe:{}", self.url)
    }
}

// ---------------------------------------------------------------------------
// Offline demo stops
// ---------------------------------------------------------------------------

/// Two fixed stops a short walk from a centre point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoStops {
    centre: GeoPoint,
}

impl DemoStops {
    pub fn new(centre: GeoPoint) -> Self {
        Self { centre }
    }

    /// Centre on the median venue position of `records`, or on
    /// [`DEFAULT_CENTRE`] when none have coordinates.
    pub fn around_records(records: &[PerformanceRecord]) -> Self {
        let mut lats: Vec<f64> = Vec::new();
        let mut lons: Vec<f64> = Vec::new();
        for loc in records.iter().filter_map(PerformanceRecord::venue_location) {
            lats.push(loc.lat);
            lons.push(loc.lon);
        }
        let centre = match (median(&mut lats), median(&mut lons)) {
            (Some(lat), Some(lon)) => GeoPoint::new(lat, lon),
            _ => DEFAULT_CENTRE,
        };
        Self::new(centre)
    }

    pub fn centre(&self) -> GeoPoint {
        self.centre
    }

    pub fn stops(&self) -> Vec<TransitStop> {
        let GeoPoint { lat, lon } = self.centre;
        [
            ("demo_stop_1", "Demo Stop 1", lat + 0.001, lon + 0.001),
            ("demo_stop_2", "Demo Stop 2", lat + 0.002, lon - 0.001),
        ]
        .into_iter()
        .map(|(id, name, lat, lon)| TransitStop {
            stop_id: id.to_string(),
            name: name.to_string(),
            locality: "City Center".to_string(),
            lat,
            lon,
            services: Vec::new(),
            buses_per_hour: None,
        })
        .collect()
    }
}

#[async_trait]
impl StopSource for DemoStops {
    async fn fetch_stops(&self) -> Result<Vec<TransitStop>, SourceError> {
        Ok(self.stops())
    }

    fn describe(&self) -> String {
        format!("demo:{:.4},{:.4}", self.centre.lat, self.centre.lon)
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}
