//! Time-binned ingress/egress flows.
//!
//! Each performance contributes its attendance to every bin whose start lies
//! in its ingress window `[start - ingress_buffer, start)` and to every bin
//! whose start lies in its egress window `[end, end + egress_buffer)`. Bins
//! are aligned to the bin width and span the earliest ingress start to the
//! latest egress end.

use chrono::{DurationRound, TimeDelta};
use serde::Serialize;

use crate::error::CoreError;
use crate::model::PerformanceRecord;
use crate::types::Timestamp;

/// Upper bound on the bins one aggregation may produce.
pub const MAX_FLOW_BINS: i64 = 200_000;

/// Arrival and departure windows for one performance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowWindow {
    pub ingress_start: Timestamp,
    pub ingress_end: Timestamp,
    pub egress_start: Timestamp,
    pub egress_end: Timestamp,
    pub attendance: f64,
}

impl FlowWindow {
    pub fn for_record(
        record: &PerformanceRecord,
        attendance: f64,
        ingress_buffer_min: u32,
        egress_buffer_min: u32,
    ) -> Self {
        let egress_start = record.performance_end();
        Self {
            ingress_start: record.performance_time
                - TimeDelta::minutes(i64::from(ingress_buffer_min)),
            ingress_end: record.performance_time,
            egress_start,
            egress_end: egress_start + TimeDelta::minutes(i64::from(egress_buffer_min)),
            attendance,
        }
    }
}

/// One fixed-width slot of the flow series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBin {
    pub start: Timestamp,
    pub end: Timestamp,
    pub inflow_total: f64,
    pub outflow_total: f64,
}

fn round_error(e: chrono::RoundingError) -> CoreError {
    CoreError::Validation(format!("cannot align flow bins: {e}"))
}

fn ceil_to(ts: Timestamp, width: TimeDelta) -> Result<Timestamp, CoreError> {
    let floor = ts.duration_trunc(width).map_err(round_error)?;
    Ok(if floor < ts { floor + width } else { floor })
}

/// Aggregate `windows` into ascending bins of `bin_width_min` minutes.
///
/// No windows means no bins. A span needing more than [`MAX_FLOW_BINS`]
/// bins is rejected before anything is allocated.
pub fn aggregate(windows: &[FlowWindow], bin_width_min: u32) -> Result<Vec<TimeBin>, CoreError> {
    if bin_width_min == 0 {
        return Err(CoreError::Validation(
            "bin width must be at least one minute".into(),
        ));
    }
    let (Some(first), Some(last)) = (
        windows.iter().map(|w| w.ingress_start).min(),
        windows.iter().map(|w| w.egress_end).max(),
    ) else {
        return Ok(Vec::new());
    };

    let width = TimeDelta::minutes(i64::from(bin_width_min));
    let origin = first.duration_trunc(width).map_err(round_error)?;
    let horizon = ceil_to(last, width)?;

    let count = (horizon - origin).num_minutes() / i64::from(bin_width_min);
    if count > MAX_FLOW_BINS {
        return Err(CoreError::Validation(format!(
            "flow span {origin} .. {horizon} needs {count} bins, limit is {MAX_FLOW_BINS}"
        )));
    }

    let mut bins = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
    let mut start = origin;
    while start < horizon {
        bins.push(TimeBin {
            start,
            end: start + width,
            inflow_total: 0.0,
            outflow_total: 0.0,
        });
        start += width;
    }

    for w in windows {
        let (lo, hi) = bin_range(&bins, w.ingress_start, w.ingress_end);
        for bin in &mut bins[lo..hi] {
            bin.inflow_total += w.attendance;
        }
        let (lo, hi) = bin_range(&bins, w.egress_start, w.egress_end);
        for bin in &mut bins[lo..hi] {
            bin.outflow_total += w.attendance;
        }
    }

    Ok(bins)
}

/// Index range of bins whose start lies in `[from, to)`.
fn bin_range(bins: &[TimeBin], from: Timestamp, to: Timestamp) -> (usize, usize) {
    let lo = bins.partition_point(|b| b.start < from);
    let hi = bins.partition_point(|b| b.start < to).max(lo);
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::test_support::{at, record};

    fn window(start_h: u32, start_m: u32, duration: u32, attendance: f64) -> FlowWindow {
        let mut r = record("e", "v", Some(1000));
        r.performance_time = at(start_h, start_m);
        r.duration_minutes = duration;
        FlowWindow::for_record(&r, attendance, 60, 60)
    }

    #[test]
    fn window_edges() {
        let w = window(19, 0, 120, 10.0);
        assert_eq!(w.ingress_start, at(18, 0));
        assert_eq!(w.ingress_end, at(19, 0));
        assert_eq!(w.egress_start, at(21, 0));
        assert_eq!(w.egress_end, at(22, 0));
    }

    #[test]
    fn empty_batch_has_no_bins() {
        assert!(aggregate(&[], 15).unwrap().is_empty());
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(aggregate(&[window(19, 0, 120, 10.0)], 0).is_err());
    }

    #[test]
    fn oversized_span_is_rejected() {
        let w = window(19, 0, u32::MAX, 10.0);
        assert_matches!(aggregate(&[w], 15), Err(CoreError::Validation(_)));

        let mut far = window(19, 0, 120, 10.0);
        far.egress_end = far.ingress_start + TimeDelta::minutes(15 * MAX_FLOW_BINS);
        assert_eq!(aggregate(&[far], 15).unwrap().len() as i64, MAX_FLOW_BINS);
    }

    #[test]
    fn aligned_single_record() {
        let bins = aggregate(&[window(19, 0, 120, 100.0)], 15).unwrap();
        // 18:00 .. 22:00 in 15 minute steps.
        assert_eq!(bins.len(), 16);
        assert_eq!(bins[0].start, at(18, 0));
        assert_eq!(bins.last().unwrap().end, at(22, 0));

        let inflow: Vec<f64> = bins.iter().map(|b| b.inflow_total).collect();
        assert_eq!(&inflow[..4], &[100.0; 4]);
        assert!(inflow[4..].iter().all(|v| *v == 0.0));

        let outflow: Vec<f64> = bins.iter().map(|b| b.outflow_total).collect();
        assert!(outflow[..12].iter().all(|v| *v == 0.0));
        assert_eq!(&outflow[12..], &[100.0; 4]);
    }

    #[test]
    fn single_record_inflow_conservation() {
        let bins = aggregate(&[window(19, 7, 95, 250.0)], 15).unwrap();
        let overlapped = bins
            .iter()
            .filter(|b| b.start >= at(18, 7) && b.start < at(19, 7))
            .count();
        let total: f64 = bins.iter().map(|b| b.inflow_total).sum();
        assert_eq!(overlapped, 4);
        assert!((total - 250.0 * overlapped as f64).abs() < 1e-9);
    }

    #[test]
    fn unaligned_span_is_widened_to_bin_edges() {
        let bins = aggregate(&[window(19, 7, 95, 1.0)], 15).unwrap();
        // ingress 18:07 floors to 18:00, egress end 21:42 ceils to 21:45.
        assert_eq!(bins[0].start, at(18, 0));
        assert_eq!(bins.last().unwrap().end, at(21, 45));
        for pair in bins.windows(2) {
            assert!(pair[0].start < pair[1].start);
        }
    }

    #[test]
    fn overlapping_records_add_up() {
        let bins = aggregate(&[window(19, 0, 60, 100.0), window(19, 30, 60, 50.0)], 15).unwrap();
        let at_1845 = bins.iter().find(|b| b.start == at(18, 45)).unwrap();
        assert!((at_1845.inflow_total - 150.0).abs() < f64::EPSILON);
        let at_2030 = bins.iter().find(|b| b.start == at(20, 30)).unwrap();
        assert!((at_2030.outflow_total - 150.0).abs() < f64::EPSILON);
        let at_1815 = bins.iter().find(|b| b.start == at(18, 15)).unwrap();
        assert!((at_1815.inflow_total - 100.0).abs() < f64::EPSILON);
    }
}
