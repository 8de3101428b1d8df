//! Dataset summary statistics.

use std::collections::HashSet;

use serde::Serialize;

use crate::dataset::Dataset;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityStats {
    pub min: u32,
    pub max: u32,
    pub average: f64,
    pub events_with_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub total_performances: usize,
    pub unique_events: usize,
    pub total_venues: usize,
    pub total_bus_stops: usize,
    pub performances_without_coordinates: usize,
    /// `None` when no record carries a capacity.
    pub capacity_statistics: Option<CapacityStats>,
}

pub fn dataset_stats(dataset: &Dataset) -> DatasetStats {
    let records = dataset.records();
    let unique_events: HashSet<&str> = records.iter().map(|r| r.event_id.as_str()).collect();
    let venues: HashSet<&str> = records.iter().map(|r| r.venue_name.as_str()).collect();
    let capacities: Vec<u32> = records.iter().filter_map(|r| r.venue_capacity).collect();

    let capacity_statistics = match (capacities.iter().min(), capacities.iter().max()) {
        (Some(&min), Some(&max)) => Some(CapacityStats {
            min,
            max,
            average: capacities.iter().map(|c| f64::from(*c)).sum::<f64>()
                / capacities.len() as f64,
            events_with_capacity: capacities.len(),
        }),
        _ => None,
    };

    DatasetStats {
        total_performances: records.len(),
        unique_events: unique_events.len(),
        total_venues: venues.len(),
        total_bus_stops: dataset.stops().len(),
        performances_without_coordinates: records.len() - dataset.usable_records().count(),
        capacity_statistics,
    }
}
