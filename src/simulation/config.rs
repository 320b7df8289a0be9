//! Simulation parameters and their validation
//!
//! [`SimParams`] is the raw, user-facing parameter set. It uses signed
//! integers so that nonsense such as a negative vehicle count can be
//! expressed and rejected. [`configure`] validates it and freezes the
//! result into a [`SimConfig`], which every construction and update call
//! takes by reference.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::error::SimError;
use super::types::{Lane, SignalPhase};

/// Default number of ticks each signal phase lasts
pub const DEFAULT_SIGNAL_CYCLE: i64 = 60;

/// Distance between the road edge and a signal post
pub const SIGNAL_SETBACK: i64 = 2;

/// Largest population a configuration may ask for
pub const MAX_VEHICLES: u32 = 1_000_000;

/// How the gap to the vehicle ahead is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapMetric {
    /// Forward distance around the loop, consistent with position wrapping
    #[default]
    Wrapped,
    /// Plain `|other.x - x|`, ignoring the seam. Vehicles just past the seam
    /// are invisible to vehicles just before it.
    Linear,
}

/// Whether vehicles see each other's pre-tick or already-updated state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateScheme {
    /// Every vehicle reads a pre-tick snapshot; result is independent of
    /// population order
    #[default]
    Synchronous,
    /// Vehicles update in place in population order, so later vehicles see
    /// the new state of earlier ones
    Sequential,
}

/// What a lane change does to travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneChangePolicy {
    /// Direction is kept; the other band is used for same-direction passing
    #[default]
    KeepDirection,
    /// Direction is set to the new band's travel sense
    FollowLane,
}

/// Unvalidated simulation parameters.
///
/// Every field has a default, so a JSON file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub width: i64,
    pub height: i64,
    pub vehicle_count: i64,
    pub road_half_width: i64,
    /// Top speed in cells per tick
    pub max_speed: i64,
    pub slowdown_prob: f64,
    pub lane_change_prob: f64,
    pub safe_distance: i64,
    pub lane_change_trigger_distance: i64,
    pub signals_enabled: bool,
    pub signal_cycle_length: i64,
    /// Half-width of the stopping window along the road
    pub signal_x_range: i64,
    /// Half-height of the stopping window across the road
    pub signal_y_range: i64,
    /// Starting phase of the upper and lower band signals
    pub signal_phases: Vec<SignalPhase>,
    pub gap_metric: GapMetric,
    pub update_scheme: UpdateScheme,
    pub lane_change_policy: LaneChangePolicy,
    pub seed: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            width: 200,
            height: 100,
            vehicle_count: 50,
            road_half_width: 5,
            max_speed: 6,
            slowdown_prob: 0.1,
            lane_change_prob: 0.05,
            safe_distance: 5,
            lane_change_trigger_distance: 10,
            signals_enabled: true,
            signal_cycle_length: DEFAULT_SIGNAL_CYCLE,
            signal_x_range: 10,
            signal_y_range: 5,
            signal_phases: vec![SignalPhase::Red, SignalPhase::Green],
            gap_metric: GapMetric::default(),
            update_scheme: UpdateScheme::default(),
            lane_change_policy: LaneChangePolicy::default(),
            seed: 42,
        }
    }
}

impl SimParams {
    /// Validate and freeze these parameters
    pub fn validate(&self) -> Result<SimConfig, SimError> {
        let width = positive_u32("width", self.width)?;
        let height = positive_u32("height", self.height)?;
        let vehicle_count = non_negative("vehicle_count", self.vehicle_count)?;
        if vehicle_count > MAX_VEHICLES {
            return Err(SimError::invalid(
                "vehicle_count",
                format!("must be at most {MAX_VEHICLES}, got {vehicle_count}"),
            ));
        }
        let road_half_width = positive_u32("road_half_width", self.road_half_width)?;
        let max_speed = non_negative("max_speed", self.max_speed)?;
        let slowdown_prob = probability("slowdown_prob", self.slowdown_prob)?;
        let lane_change_prob = probability("lane_change_prob", self.lane_change_prob)?;
        let safe_distance = non_negative("safe_distance", self.safe_distance)?;
        let lane_change_trigger_distance = non_negative(
            "lane_change_trigger_distance",
            self.lane_change_trigger_distance,
        )?;

        let signals = if self.signals_enabled {
            if self.signal_cycle_length <= 0 {
                return Err(SimError::invalid(
                    "signal_cycle_length",
                    format!(
                        "must be positive when signals are enabled, got {}",
                        self.signal_cycle_length
                    ),
                ));
            }
            let initial_phases: [SignalPhase; 2] =
                self.signal_phases.as_slice().try_into().map_err(|_| {
                    SimError::invalid(
                        "signal_phases",
                        format!(
                            "needs one phase per lane band (2), got {}",
                            self.signal_phases.len()
                        ),
                    )
                })?;
            Some(SignalConfig {
                cycle_length: positive_u32("signal_cycle_length", self.signal_cycle_length)?,
                x_range: positive_u32("signal_x_range", self.signal_x_range)?,
                y_range: positive_u32("signal_y_range", self.signal_y_range)?,
                initial_phases,
            })
        } else {
            None
        };

        Ok(SimConfig {
            width,
            height,
            vehicle_count: vehicle_count as usize,
            road_half_width,
            max_speed,
            slowdown_prob,
            lane_change_prob,
            safe_distance,
            lane_change_trigger_distance,
            signals,
            gap_metric: self.gap_metric,
            update_scheme: self.update_scheme,
            lane_change_policy: self.lane_change_policy,
            seed: self.seed,
        })
    }
}

/// Validate `params` into an immutable [`SimConfig`]
pub fn configure(params: &SimParams) -> Result<SimConfig, SimError> {
    params.validate()
}

fn non_negative(field: &'static str, value: i64) -> Result<u32, SimError> {
    if value < 0 {
        return Err(SimError::invalid(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    u32::try_from(value).map_err(|_| SimError::invalid(field, format!("is too large: {value}")))
}

fn positive_u32(field: &'static str, value: i64) -> Result<u32, SimError> {
    if value <= 0 {
        return Err(SimError::invalid(
            field,
            format!("must be positive, got {value}"),
        ));
    }
    u32::try_from(value).map_err(|_| SimError::invalid(field, format!("is too large: {value}")))
}

fn probability(field: &'static str, value: f64) -> Result<f64, SimError> {
    // NaN fails the range check too
    if !(0.0..=1.0).contains(&value) {
        return Err(SimError::invalid(
            field,
            format!("must be within [0, 1], got {value}"),
        ));
    }
    Ok(value)
}

/// Signal settings, present only when signals are enabled
#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub cycle_length: u32,
    pub x_range: u32,
    pub y_range: u32,
    pub initial_phases: [SignalPhase; 2],
}

/// Validated, immutable simulation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub width: u32,
    pub height: u32,
    pub vehicle_count: usize,
    pub road_half_width: u32,
    pub max_speed: u32,
    pub slowdown_prob: f64,
    pub lane_change_prob: f64,
    pub safe_distance: u32,
    pub lane_change_trigger_distance: u32,
    pub signals: Option<SignalConfig>,
    pub gap_metric: GapMetric,
    pub update_scheme: UpdateScheme,
    pub lane_change_policy: LaneChangePolicy,
    pub seed: u64,
}

impl SimConfig {
    pub fn centerline(&self) -> i64 {
        i64::from(self.height) / 2
    }

    /// Lateral positions a vehicle in `lane` may occupy
    pub fn lane_band(&self, lane: Lane) -> RangeInclusive<i64> {
        let half = i64::from(self.road_half_width);
        let top = match lane {
            Lane::Upper => self.centerline() - half / 2,
            Lane::Lower => self.centerline() + half / 2,
        };
        top..=top + half
    }

    /// Where the signal guarding `lane` stands
    pub fn signal_location(&self, lane: Lane) -> (i64, i64) {
        let x = i64::from(self.width) / 2;
        let offset = i64::from(self.road_half_width) + SIGNAL_SETBACK;
        let y = match lane {
            Lane::Upper => self.centerline() - offset,
            Lane::Lower => self.centerline() + offset,
        };
        (x, y)
    }

    pub fn signals_enabled(&self) -> bool {
        self.signals.is_some()
    }
}
