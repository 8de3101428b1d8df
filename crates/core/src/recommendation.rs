//! Threshold-based operator recommendations.
//!
//! | Condition                               | Tier     | Vehicles                   |
//! |-----------------------------------------|----------|----------------------------|
//! | `uzi >= 0.85` and ranking level 1       | Critical | `ceil(attendance / seats)` |
//! | `uzi >= 0.6`                            | High     | `ceil(attendance / 2 seats)` |
//! | `uzi >= 0.4`                            | Medium   | none                       |
//! | otherwise                               | Low      | none                       |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

pub const CRITICAL_UZI_THRESHOLD: f64 = 0.85;
pub const HIGH_UZI_THRESHOLD: f64 = 0.6;
pub const MEDIUM_UZI_THRESHOLD: f64 = 0.4;

/// Recommendation severity; ordering follows severity (`Low < Critical`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RecommendationTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RecommendationTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(CoreError::Validation(format!(
                "unknown recommendation tier '{other}'"
            ))),
        }
    }
}

/// Tier plus the suggested number of extra vehicles, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub tier: RecommendationTier,
    pub vehicles: Option<u32>,
}

/// Apply the threshold table top-down; the first matching row wins.
pub fn classify(
    uzi_normalized: f64,
    ranking_level: i32,
    estimated_attendance: f64,
    seat_capacity: u32,
) -> Classification {
    let seats = f64::from(seat_capacity.max(1));
    let vehicles = |per_vehicle: f64| (estimated_attendance.max(0.0) / per_vehicle).ceil() as u32;

    if uzi_normalized >= CRITICAL_UZI_THRESHOLD && ranking_level == 1 {
        Classification {
            tier: RecommendationTier::Critical,
            vehicles: Some(vehicles(seats)),
        }
    } else if uzi_normalized >= HIGH_UZI_THRESHOLD {
        Classification {
            tier: RecommendationTier::High,
            vehicles: Some(vehicles(2.0 * seats)),
        }
    } else if uzi_normalized >= MEDIUM_UZI_THRESHOLD {
        Classification {
            tier: RecommendationTier::Medium,
            vehicles: None,
        }
    } else {
        Classification {
            tier: RecommendationTier::Low,
            vehicles: None,
        }
    }
}

/// Operator-facing text for a classification.
pub fn message(classification: Classification, venue_name: &str, time: Timestamp) -> String {
    let when = time.format("%Y-%m-%d %H:%M UTC");
    match (classification.tier, classification.vehicles) {
        (RecommendationTier::Critical, Some(n)) => {
            format!("CRITICAL: {venue_name} - recommend {n} shuttle(s) around {when}.")
        }
        (RecommendationTier::High, Some(n)) => {
            format!("HIGH: {venue_name} - consider {n} bus(es) or extended service around {when}.")
        }
        (RecommendationTier::Medium, _) => {
            format!("MONITOR: {venue_name} - moderate transport load expected around {when}.")
        }
        _ => format!("LOW: {venue_name} - no immediate transport action required at {when}."),
    }
}

/// A recommendation row, independent of the scored table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub event_id: String,
    pub event_name: String,
    pub venue_id: String,
    pub venue_name: String,
    pub performance_time: Timestamp,
    pub duration_minutes: u32,
    pub uzi_normalized: f64,
    pub estimated_attendance: f64,
    pub tier: RecommendationTier,
    pub suggested_vehicles: Option<u32>,
    pub message: String,
}
