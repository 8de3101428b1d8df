//! Expected-attendance estimation.
//!
//! `estimate = min(base * ranking_mult * time_mult, capacity)` where `base`
//! is the full capacity for sold-out performances and `capacity * fill`
//! otherwise. The ranking multiplier is deliberately unclamped: ranking
//! values outside 1..=4 push it outside the 0.7..=1.45 band.

use chrono::Timelike;

use crate::config::{AttendanceModel, CapacityFallback, PipelineConfig, PrimeTimeWindow};
use crate::model::PerformanceRecord;

/// Multiplier added per ranking level above the lowest (4).
pub const RANKING_LEVEL_STEP: f64 = 0.15;
/// Multiplier added per position above the lowest (4) within a level.
pub const RANKING_IN_LEVEL_STEP: f64 = 0.05;
/// Demand multiplier inside the prime-time window.
pub const PRIME_TIME_MULTIPLIER: f64 = 1.1;

/// `1.0 + (4 - level) * 0.15 + (4 - in_level) * 0.05`, unclamped.
pub fn ranking_multiplier(ranking_level: i32, ranking_in_level: i32) -> f64 {
    1.0 + (4.0 - f64::from(ranking_level)) * RANKING_LEVEL_STEP
        + (4.0 - f64::from(ranking_in_level)) * RANKING_IN_LEVEL_STEP
}

/// [`PRIME_TIME_MULTIPLIER`] when `hour` is inside the window, else `1.0`.
pub fn time_multiplier(hour: u32, window: &PrimeTimeWindow) -> f64 {
    if window.contains(hour) {
        PRIME_TIME_MULTIPLIER
    } else {
        1.0
    }
}

/// Expected attendance for one performance under `config`.
///
/// Never negative. Never above the capacity used for the estimate, except
/// when [`CapacityFallback::FixedAttendance`] supplies the figure outright.
pub fn estimate_attendance(record: &PerformanceRecord, config: &PipelineConfig) -> f64 {
    let capacity = match (record.known_capacity(), config.capacity_fallback) {
        (Some(c), _) => c,
        (None, CapacityFallback::FixedAttendance { attendance }) => return attendance.max(0.0),
        (None, CapacityFallback::Capacity { capacity }) => capacity,
    };
    let capacity = f64::from(capacity);

    match config.attendance_model {
        AttendanceModel::DirectCapacity { fill } => (capacity * fill).floor(),
        AttendanceModel::Weighted => {
            let base = if record.sold_out {
                capacity
            } else {
                capacity * config.default_fill
            };
            let ranking = ranking_multiplier(record.ranking_level, record.ranking_in_level);
            let time = time_multiplier(record.local_time().hour(), &config.prime_time);
            (base * ranking * time).min(capacity).max(0.0)
        }
    }
}
