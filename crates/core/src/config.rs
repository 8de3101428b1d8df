//! Pipeline configuration and the two named presets.
//!
//! The direct-capacity preset reproduces the per-event lookup service
//! (300 m radius, 70% of capacity, fixed 100 passengers when capacity is
//! unknown). The optimisation preset reproduces the batch UZI analysis
//! (400 m radius, full multiplier chain, fallback capacity 500). The two
//! disagree on where the capacity fallback sits, so both are kept as
//! explicit [`CapacityFallback`] variants rather than merged.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fill ratio applied to capacity for events that are not sold out.
pub const DEFAULT_FILL: f64 = 0.6;
/// Fill ratio used by the direct-capacity model.
pub const DIRECT_CAPACITY_FILL: f64 = 0.7;
/// Expected attendance used by the direct-capacity model when capacity is unknown.
pub const DIRECT_FALLBACK_ATTENDANCE: f64 = 100.0;
/// Capacity assumed by the optimisation model when capacity is unknown.
pub const FALLBACK_CAPACITY: u32 = 500;
/// Seats per bus, the unit for shuttle suggestions.
pub const AVG_BUS_SEAT_CAPACITY: u32 = 40;
/// Buses per hour assumed per stop when no service data exists.
pub const UZI_FALLBACK_FREQUENCY: f64 = 4.0;
pub const INGRESS_BUFFER_MINUTES: u32 = 60;
pub const EGRESS_BUFFER_MINUTES: u32 = 60;
pub const BIN_WIDTH_MINUTES: u32 = 15;
pub const PRIME_TIME_START_HOUR: u32 = 18;
pub const PRIME_TIME_END_HOUR: u32 = 23;
pub const DIRECT_STOP_RADIUS_M: f64 = 300.0;
pub const OPTIMISATION_STOP_RADIUS_M: f64 = 400.0;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How expected attendance is derived from capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttendanceModel {
    /// `floor(capacity * fill)`, no multipliers.
    DirectCapacity { fill: f64 },
    /// Fill, ranking and prime-time multipliers, capped at capacity.
    Weighted,
}

/// What to do when a record has no usable capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapacityFallback {
    /// Skip the model and report this attendance directly.
    FixedAttendance { attendance: f64 },
    /// Assume this capacity and run the model as usual.
    Capacity { capacity: u32 },
}

/// Hour-of-day window `[start_hour, end_hour)` with elevated demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimeTimeWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl PrimeTimeWindow {
    pub fn contains(&self, hour: u32) -> bool {
        (self.start_hour..self.end_hour).contains(&hour)
    }
}

impl Default for PrimeTimeWindow {
    fn default() -> Self {
        Self {
            start_hour: PRIME_TIME_START_HOUR,
            end_hour: PRIME_TIME_END_HOUR,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Every tunable the pipeline reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub stop_radius_m: f64,
    pub default_fill: f64,
    pub ingress_buffer_min: u32,
    pub egress_buffer_min: u32,
    pub prime_time: PrimeTimeWindow,
    pub avg_bus_seat_capacity: u32,
    pub uzi_fallback_frequency: f64,
    pub bin_width_min: u32,
    pub attendance_model: AttendanceModel,
    pub capacity_fallback: CapacityFallback,
    /// Keep only the first performance of each `event_id`.
    pub first_performance_per_event: bool,
}

impl PipelineConfig {
    /// Batch UZI analysis preset.
    pub fn optimisation() -> Self {
        Self {
            stop_radius_m: OPTIMISATION_STOP_RADIUS_M,
            default_fill: DEFAULT_FILL,
            ingress_buffer_min: INGRESS_BUFFER_MINUTES,
            egress_buffer_min: EGRESS_BUFFER_MINUTES,
            prime_time: PrimeTimeWindow::default(),
            avg_bus_seat_capacity: AVG_BUS_SEAT_CAPACITY,
            uzi_fallback_frequency: UZI_FALLBACK_FREQUENCY,
            bin_width_min: BIN_WIDTH_MINUTES,
            attendance_model: AttendanceModel::Weighted,
            capacity_fallback: CapacityFallback::Capacity {
                capacity: FALLBACK_CAPACITY,
            },
            first_performance_per_event: true,
        }
    }

    /// Per-event lookup preset.
    pub fn direct_capacity() -> Self {
        Self {
            stop_radius_m: DIRECT_STOP_RADIUS_M,
            attendance_model: AttendanceModel::DirectCapacity {
                fill: DIRECT_CAPACITY_FILL,
            },
            capacity_fallback: CapacityFallback::FixedAttendance {
                attendance: DIRECT_FALLBACK_ATTENDANCE,
            },
            first_performance_per_event: false,
            ..Self::optimisation()
        }
    }

    /// Reject settings that would make a stage meaningless.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.stop_radius_m.is_finite() && self.stop_radius_m > 0.0) {
            return Err(CoreError::Validation(format!(
                "stop_radius_m must be positive, got {}",
                self.stop_radius_m
            )));
        }
        validate_fill(self.default_fill, "default_fill")?;
        if let AttendanceModel::DirectCapacity { fill } = self.attendance_model {
            validate_fill(fill, "direct capacity fill")?;
        }
        if self.bin_width_min == 0 {
            return Err(CoreError::Validation(
                "bin_width_min must be at least 1".into(),
            ));
        }
        if self.avg_bus_seat_capacity == 0 {
            return Err(CoreError::Validation(
                "avg_bus_seat_capacity must be at least 1".into(),
            ));
        }
        if !(self.uzi_fallback_frequency.is_finite() && self.uzi_fallback_frequency >= 0.0) {
            return Err(CoreError::Validation(format!(
                "uzi_fallback_frequency must be non-negative, got {}",
                self.uzi_fallback_frequency
            )));
        }
        let PrimeTimeWindow {
            start_hour,
            end_hour,
        } = self.prime_time;
        if end_hour > 24 || start_hour >= end_hour {
            return Err(CoreError::Validation(format!(
                "prime time window must satisfy start < end <= 24, got {start_hour}..{end_hour}"
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::optimisation()
    }
}

fn validate_fill(value: f64, name: &str) -> Result<(), CoreError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(CoreError::Validation(format!(
            "{name} must be in (0.0, 1.0], got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Preset
// ---------------------------------------------------------------------------

/// Named presets selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Optimisation,
    DirectCapacity,
}

impl Preset {
    pub fn config(self) -> PipelineConfig {
        match self {
            Self::Optimisation => PipelineConfig::optimisation(),
            Self::DirectCapacity => PipelineConfig::direct_capacity(),
        }
    }
}

impl FromStr for Preset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "optimisation" | "optimization" => Ok(Self::Optimisation),
            "direct_capacity" | "direct" => Ok(Self::DirectCapacity),
            other => Err(CoreError::Validation(format!(
                "unknown pipeline preset '{other}'"
            ))),
        }
    }
}
