//! Pipeline entry points.
//!
//! [`run`] scores a whole dataset in one pass and returns four independent
//! tables: scored venues, per-record stop allocations, the flow series and
//! recommendations. [`event_demand`] serves the single-record lookup.

use std::collections::HashSet;

use serde::Serialize;

use crate::attendance::estimate_attendance;
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::distribution::{distribute, Distribution};
use crate::error::CoreError;
use crate::frequency::FrequencySource;
use crate::model::{PerformanceRecord, TransitStop};
use crate::peak_flow::{aggregate, FlowWindow, TimeBin};
use crate::recommendation::{classify, message, Recommendation, RecommendationTier};
use crate::types::{GeoPoint, Timestamp};
use crate::underserved::{coverage, score_batch, UziInput};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A performance record with every derived field attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: PerformanceRecord,
    pub estimated_attendance: f64,
    pub stops_nearby: usize,
    pub avg_buses_per_hour: f64,
    pub uzi_raw: f64,
    pub priority_boost: f64,
    pub uzi: f64,
    pub uzi_normalized: f64,
    pub recommendation_tier: RecommendationTier,
    pub recommendation_text: String,
}

/// Stop allocations for one scored record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueAllocation {
    pub event_id: String,
    pub event_name: String,
    pub venue_id: String,
    pub venue_name: String,
    pub performance_time: Timestamp,
    #[serde(flatten)]
    pub distribution: Distribution,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub venues: Vec<ScoredRecord>,
    pub allocations: Vec<VenueAllocation>,
    pub peak_flows: Vec<TimeBin>,
    pub recommendations: Vec<Recommendation>,
    /// Records dropped because their venue has no coordinates.
    pub excluded_without_coordinates: usize,
}

/// Single-record demand view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDemand {
    pub record: PerformanceRecord,
    pub radius_m: f64,
    pub stops_within_radius: usize,
    #[serde(flatten)]
    pub distribution: Distribution,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Records the batch will score, paired with their venue position.
///
/// Records without coordinates are skipped; with
/// `first_performance_per_event` only the first record of each event id
/// survives.
pub fn select_records<'a>(
    dataset: &'a Dataset,
    config: &PipelineConfig,
) -> Vec<(&'a PerformanceRecord, GeoPoint)> {
    let mut seen: HashSet<&str> = HashSet::new();
    dataset
        .records()
        .iter()
        .filter_map(|r| r.venue_location().map(|loc| (r, loc)))
        .filter(|(r, _)| !config.first_performance_per_event || seen.insert(r.event_id.as_str()))
        .collect()
}

/// Score every usable record in `dataset`.
pub fn run(
    dataset: &Dataset,
    config: &PipelineConfig,
    frequency: &dyn FrequencySource,
) -> Result<PipelineOutput, CoreError> {
    config.validate()?;

    let excluded_without_coordinates =
        dataset.records().len() - dataset.usable_records().count();
    if excluded_without_coordinates > 0 {
        tracing::warn!(
            excluded = excluded_without_coordinates,
            "Skipping performances whose venue has no coordinates",
        );
    }

    let selected = select_records(dataset, config);
    let stops = dataset.stops();

    let attendance: Vec<f64> = selected
        .iter()
        .map(|(r, _)| estimate_attendance(r, config))
        .collect();

    let allocations: Vec<VenueAllocation> = selected
        .iter()
        .zip(&attendance)
        .map(|((r, loc), att)| VenueAllocation {
            event_id: r.event_id.clone(),
            event_name: r.event_name.clone(),
            venue_id: r.venue_id.clone(),
            venue_name: r.venue_name.clone(),
            performance_time: r.performance_time,
            distribution: distribute(*loc, *att, stops, config.stop_radius_m),
        })
        .collect();

    let inputs: Vec<UziInput> = selected
        .iter()
        .zip(&attendance)
        .map(|((r, loc), att)| UziInput {
            estimated_attendance: *att,
            coverage: coverage(
                *loc,
                stops,
                config.stop_radius_m,
                frequency,
                config.uzi_fallback_frequency,
            ),
            ranking_level: r.ranking_level,
        })
        .collect();
    let scores = score_batch(&inputs);

    let mut venues = Vec::with_capacity(selected.len());
    let mut recommendations = Vec::with_capacity(selected.len());
    for (((record, _), input), score) in selected.iter().zip(&inputs).zip(&scores) {
        let class = classify(
            score.uzi_normalized,
            record.ranking_level,
            input.estimated_attendance,
            config.avg_bus_seat_capacity,
        );
        let text = message(class, &record.venue_name, record.performance_time);

        recommendations.push(Recommendation {
            event_id: record.event_id.clone(),
            event_name: record.event_name.clone(),
            venue_id: record.venue_id.clone(),
            venue_name: record.venue_name.clone(),
            performance_time: record.performance_time,
            duration_minutes: record.duration_minutes,
            uzi_normalized: score.uzi_normalized,
            estimated_attendance: input.estimated_attendance,
            tier: class.tier,
            suggested_vehicles: class.vehicles,
            message: text.clone(),
        });
        venues.push(ScoredRecord {
            record: (*record).clone(),
            estimated_attendance: input.estimated_attendance,
            stops_nearby: input.coverage.stops_nearby,
            avg_buses_per_hour: input.coverage.avg_buses_per_hour,
            uzi_raw: score.uzi_raw,
            priority_boost: score.priority_boost,
            uzi: score.uzi,
            uzi_normalized: score.uzi_normalized,
            recommendation_tier: class.tier,
            recommendation_text: text,
        });
    }

    let windows: Vec<FlowWindow> = selected
        .iter()
        .zip(&attendance)
        .map(|((r, _), att)| {
            FlowWindow::for_record(r, *att, config.ingress_buffer_min, config.egress_buffer_min)
        })
        .collect();
    let peak_flows = match aggregate(&windows, config.bin_width_min) {
        Ok(bins) => bins,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping peak-flow aggregation");
            Vec::new()
        }
    };

    tracing::debug!(
        scored = venues.len(),
        stops = stops.len(),
        bins = peak_flows.len(),
        "Pipeline run complete",
    );

    Ok(PipelineOutput {
        venues,
        allocations,
        peak_flows,
        recommendations,
        excluded_without_coordinates,
    })
}

/// Attendance and stop allocations for a single record.
///
/// `radius_m` overrides the configured stop radius.
pub fn event_demand(
    record: &PerformanceRecord,
    stops: &[TransitStop],
    config: &PipelineConfig,
    radius_m: Option<f64>,
) -> Result<EventDemand, CoreError> {
    let config = PipelineConfig {
        stop_radius_m: radius_m.unwrap_or(config.stop_radius_m),
        ..config.clone()
    };
    config.validate()?;

    let venue = record.venue_location().ok_or_else(|| {
        CoreError::Validation(format!(
            "Event {} venue has no coordinates",
            record.event_id
        ))
    })?;

    let attendance = estimate_attendance(record, &config);
    let distribution = distribute(venue, attendance, stops, config.stop_radius_m);

    Ok(EventDemand {
        record: record.clone(),
        radius_m: config.stop_radius_m,
        stops_within_radius: distribution.allocations.len(),
        distribution,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::frequency::NoServiceData;
    use crate::test_support::{at, north_of, record, stop, VENUE};

    fn far_venue(mut r: PerformanceRecord) -> PerformanceRecord {
        let p = north_of(VENUE, 10_000.0);
        r.venue_lat = Some(p.lat);
        r.venue_lon = Some(p.lon);
        r
    }

    fn dataset() -> Dataset {
        let stops = vec![
            stop("s1", north_of(VENUE, 80.0)),
            stop("s2", north_of(VENUE, 160.0)),
        ];
        let mut top = record("e1", "central", Some(1000));
        top.ranking_level = 1;
        let mut repeat = record("e1", "central", Some(1000));
        repeat.performance_time = at(21, 0);
        let remote = far_venue(record("e2", "remote", Some(400)));
        let mut lost = record("e3", "nowhere", Some(100));
        lost.venue_lat = None;
        Dataset::new(vec![top, repeat, remote, lost], stops)
    }

    #[test]
    fn run_produces_four_aligned_tables() {
        let out = run(&dataset(), &PipelineConfig::optimisation(), &NoServiceData).unwrap();

        // e1 deduplicated, e3 excluded.
        assert_eq!(out.venues.len(), 2);
        assert_eq!(out.allocations.len(), 2);
        assert_eq!(out.recommendations.len(), 2);
        assert_eq!(out.excluded_without_coordinates, 1);
        assert!(!out.peak_flows.is_empty());

        let central = &out.venues[0];
        assert_eq!(central.stops_nearby, 2);
        assert!((central.avg_buses_per_hour - 8.0).abs() < f64::EPSILON);
        assert_eq!(out.allocations[0].distribution.allocations.len(), 2);

        let remote = &out.venues[1];
        assert_eq!(remote.stops_nearby, 0);
        assert_eq!(remote.uzi_normalized, 1.0);
        assert_eq!(central.uzi_normalized, 0.0);
        assert_eq!(remote.recommendation_tier, RecommendationTier::High);
        // ceil(400 * 0.6 * 1.3 * 1.1 / 80)
        assert_eq!(out.recommendations[1].suggested_vehicles, Some(5));
    }

    #[test]
    fn keeps_all_performances_when_not_deduplicating() {
        let out = run(&dataset(), &PipelineConfig::direct_capacity(), &NoServiceData).unwrap();
        assert_eq!(out.venues.len(), 3);
    }

    #[test]
    fn empty_dataset_is_valid() {
        let out = run(&Dataset::empty(), &PipelineConfig::default(), &NoServiceData).unwrap();
        assert!(out.venues.is_empty());
        assert!(out.peak_flows.is_empty());
        assert!(out.recommendations.is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = PipelineConfig {
            bin_width_min: 0,
            ..PipelineConfig::default()
        };
        assert_matches!(
            run(&dataset(), &cfg, &NoServiceData),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn unbinnable_flow_span_keeps_scored_tables() {
        let mut long = record("e9", "marathon", Some(300));
        long.duration_minutes = u32::MAX;
        let ds = Dataset::new(vec![long], vec![stop("s1", north_of(VENUE, 80.0))]);

        let out = run(&ds, &PipelineConfig::optimisation(), &NoServiceData).unwrap();
        assert_eq!(out.venues.len(), 1);
        assert_eq!(out.recommendations.len(), 1);
        assert!(out.peak_flows.is_empty());
    }

    #[test]
    fn scored_and_recommendation_tables_agree() {
        let out = run(&dataset(), &PipelineConfig::optimisation(), &NoServiceData).unwrap();
        for (v, r) in out.venues.iter().zip(&out.recommendations) {
            assert_eq!(v.recommendation_tier, r.tier);
            assert_eq!(v.recommendation_text, r.message);
            assert_eq!(v.record.event_id, r.event_id);
        }
    }

    // -- event_demand --

    #[test]
    fn event_demand_direct_capacity() {
        let ds = dataset();
        let rec = ds.find_event("e1").unwrap();
        let demand =
            event_demand(rec, ds.stops(), &PipelineConfig::direct_capacity(), None).unwrap();
        assert!((demand.distribution.expected_attendance - 700.0).abs() < f64::EPSILON);
        assert_eq!(demand.stops_within_radius, 2);
        assert!(demand.distribution.total_allocated <= 700);
    }

    #[test]
    fn event_demand_radius_override() {
        let ds = dataset();
        let rec = ds.find_event("e1").unwrap();
        let demand =
            event_demand(rec, ds.stops(), &PipelineConfig::direct_capacity(), Some(100.0))
                .unwrap();
        assert_eq!(demand.stops_within_radius, 1);
        assert!((demand.radius_m - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn event_demand_without_coordinates_is_rejected() {
        let ds = dataset();
        let rec = ds.find_event("e3").unwrap();
        assert_matches!(
            event_demand(rec, ds.stops(), &PipelineConfig::default(), None),
            Err(CoreError::Validation(_))
        );
    }
}
