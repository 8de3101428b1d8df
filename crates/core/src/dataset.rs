//! Immutable dataset handle.
//!
//! A [`Dataset`] is built once from ingested records and stops and never
//! mutated afterwards. Long-lived servers share it behind an `Arc` and
//! replace the whole handle on reload.

use chrono::Utc;

use crate::error::CoreError;
use crate::model::{PerformanceRecord, TransitStop};
use crate::types::Timestamp;

#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<PerformanceRecord>,
    stops: Vec<TransitStop>,
    loaded_at: Timestamp,
}

impl Dataset {
    pub fn new(records: Vec<PerformanceRecord>, stops: Vec<TransitStop>) -> Self {
        Self {
            records,
            stops,
            loaded_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn stops(&self) -> &[TransitStop] {
        &self.stops
    }

    pub fn loaded_at(&self) -> Timestamp {
        self.loaded_at
    }

    /// Records that carry venue coordinates, in load order.
    pub fn usable_records(&self) -> impl Iterator<Item = &PerformanceRecord> {
        self.records.iter().filter(|r| r.venue_location().is_some())
    }

    /// First performance of `event_id`.
    pub fn find_event(&self, event_id: &str) -> Result<&PerformanceRecord, CoreError> {
        self.records
            .iter()
            .find(|r| r.event_id == event_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Event",
                id: event_id.to_string(),
            })
    }
}
