//! Vehicle state and the per-vehicle motion rule
//!
//! One tick of a vehicle runs these phases, in this order:
//!
//! 1. accelerate one step toward the desired speed
//! 2. slow to the slowest vehicle ahead that is closer than the safe distance
//! 3. stop if inside the window of a yellow or red signal
//! 4. random friction: lose one step of speed with `slowdown_prob`
//! 5. with `lane_change_prob`, switch bands if the leader is closer than the
//!    lane-change trigger distance
//! 6. move `speed` cells along `direction`, wrapping around the loop
//!
//! Reordering the phases changes the model, so [`Vehicle::update`] keeps
//! them in one place.

use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::config::{LaneChangePolicy, SimConfig};
use super::lane_index::Leader;
use super::signal::TrafficSignal;
use super::types::{wrap_position, Direction, Lane, VehicleId};

/// A vehicle on the two-band loop road
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    /// Position along the road, always in `[0, width)`
    pub x: u32,
    /// Lateral position, inside the band of `lane`
    pub y: i64,
    pub lane: Lane,
    pub direction: Direction,
    pub speed: u32,
    /// Cruising speed, fixed at creation
    pub desired_speed: u32,
}

/// What happened to a vehicle during one update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleOutcome {
    pub changed_lane: bool,
    pub held_by_signal: bool,
}

impl Vehicle {
    pub fn new(
        id: VehicleId,
        x: u32,
        y: i64,
        lane: Lane,
        direction: Direction,
        speed: u32,
        desired_speed: u32,
    ) -> Self {
        Self {
            id,
            x,
            y,
            lane,
            direction,
            speed,
            desired_speed,
        }
    }

    /// Place a vehicle at random: band chosen uniformly, `x` uniform over the
    /// road, `y` uniform within the band, speed uniform in `[1, max_speed]`
    pub fn spawn<R: Rng + ?Sized>(id: VehicleId, config: &SimConfig, rng: &mut R) -> Self {
        let lane = if rng.random_bool(0.5) {
            Lane::Lower
        } else {
            Lane::Upper
        };
        let x = rng.random_range(0..config.width);
        let y = rng.random_range(config.lane_band(lane));
        let speed = if config.max_speed == 0 {
            0
        } else {
            rng.random_range(1..=config.max_speed)
        };
        Self::new(id, x, y, lane, lane.travel_direction(), speed, speed)
    }

    /// Run all motion phases for one tick.
    ///
    /// `leader` is the nearest vehicle ahead in the same band, as seen by
    /// whichever update scheme the engine is using. `signals` must already
    /// hold this tick's phases.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        leader: Option<Leader>,
        signals: &[TrafficSignal],
        config: &SimConfig,
        rng: &mut R,
    ) -> VehicleOutcome {
        let mut outcome = VehicleOutcome::default();

        self.accelerate();
        self.keep_gap(leader, config.safe_distance);
        outcome.held_by_signal = self.obey_signals(signals, config);
        self.apply_friction(config.slowdown_prob, rng);
        outcome.changed_lane = self.consider_lane_change(leader.map(|l| l.gap), config, rng);
        self.advance(config.width);

        outcome
    }

    fn accelerate(&mut self) {
        if self.speed < self.desired_speed {
            self.speed = (self.speed + 1).min(self.desired_speed);
        }
    }

    fn keep_gap(&mut self, leader: Option<Leader>, safe_distance: u32) {
        if let Some(leader) = leader {
            if leader.gap < safe_distance {
                self.speed = self.speed.min(leader.yield_speed);
            }
        }
    }

    fn obey_signals(&mut self, signals: &[TrafficSignal], config: &SimConfig) -> bool {
        let Some(window) = &config.signals else {
            return false;
        };
        let x = i64::from(self.x);
        let held = signals
            .iter()
            .any(|s| s.blocks(x, self.y, window.x_range, window.y_range));
        if held {
            self.speed = 0;
        }
        held
    }

    fn apply_friction<R: Rng + ?Sized>(&mut self, slowdown_prob: f64, rng: &mut R) {
        if rng.random_bool(slowdown_prob) {
            self.speed = self.speed.saturating_sub(1);
        }
    }

    /// The probability roll is always drawn so the random stream does not
    /// depend on traffic conditions.
    fn consider_lane_change<R: Rng + ?Sized>(
        &mut self,
        gap: Option<u32>,
        config: &SimConfig,
        rng: &mut R,
    ) -> bool {
        let wants = rng.random_bool(config.lane_change_prob);
        let boxed_in = gap.is_some_and(|g| g < config.lane_change_trigger_distance);
        if !(wants && boxed_in) {
            return false;
        }

        let from = self.lane;
        self.lane = from.other();
        self.y = rng.random_range(config.lane_band(self.lane));
        if config.lane_change_policy == LaneChangePolicy::FollowLane {
            self.direction = self.lane.travel_direction();
        }
        trace!(
            "Vehicle {:?} changed lane {:?} -> {:?} at x={}",
            self.id,
            from,
            self.lane,
            self.x
        );
        true
    }

    fn advance(&mut self, width: u32) {
        let delta = i64::from(self.speed) * self.direction.sign();
        self.x = wrap_position(i64::from(self.x) + delta, width);
    }
}
