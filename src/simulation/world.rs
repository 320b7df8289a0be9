//! The simulation world: the vehicle population and the signal set
//!
//! Built once from a [`SimConfig`], mutated once per tick by the engine and
//! never grows or shrinks during a run.

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::config::SimConfig;
use super::error::SimError;
use super::signal::TrafficSignal;
use super::types::VehicleId;
use super::vehicle::Vehicle;

/// The main simulation world
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    /// Road length; the wrap modulus for `x`
    pub width: u32,
    pub height: u32,
    pub road_half_width: u32,

    /// All vehicles, in population order. `vehicles[i].id == VehicleId(i)`.
    pub vehicles: Vec<Vehicle>,

    /// All signals; empty when signals are disabled
    pub signals: Vec<TrafficSignal>,

    /// Number of ticks completed
    pub tick: u64,
}

/// Read-only copy of the world after a tick, for rendering, metrics and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub vehicles: Vec<Vehicle>,
    pub signals: Vec<TrafficSignal>,
}

impl World {
    /// Build a world with randomly placed vehicles and the configured signals
    pub fn generate<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Self {
        let vehicles = (0..config.vehicle_count)
            .map(|i| Vehicle::spawn(VehicleId(i), config, rng))
            .collect();
        let world = Self::from_parts(config, vehicles);
        info!(
            "Created world {}x{} with {} vehicles and {} signals",
            world.width,
            world.height,
            world.vehicles.len(),
            world.signals.len()
        );
        world
    }

    /// Build a world around a hand-placed population.
    /// Vehicle ids are reassigned to match population order.
    pub fn with_vehicles(config: &SimConfig, mut vehicles: Vec<Vehicle>) -> Self {
        for (i, vehicle) in vehicles.iter_mut().enumerate() {
            vehicle.id = VehicleId(i);
        }
        Self::from_parts(config, vehicles)
    }

    fn from_parts(config: &SimConfig, vehicles: Vec<Vehicle>) -> Self {
        Self {
            width: config.width,
            height: config.height,
            road_half_width: config.road_half_width,
            vehicles,
            signals: TrafficSignal::build_all(config),
            tick: 0,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            vehicles: self.vehicles.clone(),
            signals: self.signals.clone(),
        }
    }

    /// Check every state invariant, reporting the first one broken
    pub fn check_invariants(&self, config: &SimConfig) -> Result<(), SimError> {
        for (i, v) in self.vehicles.iter().enumerate() {
            if v.id != VehicleId(i) {
                return Err(SimError::inconsistent(format!(
                    "vehicle at index {i} carries id {:?}",
                    v.id
                )));
            }
            if v.x >= self.width {
                return Err(SimError::inconsistent(format!(
                    "vehicle {i} at x={} outside [0, {})",
                    v.x, self.width
                )));
            }
            if v.speed > config.max_speed || v.desired_speed > config.max_speed {
                return Err(SimError::inconsistent(format!(
                    "vehicle {i} speed {} / desired {} exceeds max {}",
                    v.speed, v.desired_speed, config.max_speed
                )));
            }
            if !config.lane_band(v.lane).contains(&v.y) {
                return Err(SimError::inconsistent(format!(
                    "vehicle {i} at y={} outside band of {:?}",
                    v.y, v.lane
                )));
            }
        }
        for s in &self.signals {
            if s.timer >= s.cycle_length {
                return Err(SimError::inconsistent(format!(
                    "signal {:?} timer {} not below cycle length {}",
                    s.id, s.timer, s.cycle_length
                )));
            }
        }
        Ok(())
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Lane Flow Summary ===");
        println!("Tick: {}", self.tick);
        println!(
            "Road: {} cells, half-width {}, vehicles: {}",
            self.width,
            self.road_half_width,
            self.vehicles.len()
        );
        for s in &self.signals {
            println!(
                "  Signal {:?} at ({}, {}): {:?} {}/{}",
                s.id.0, s.x, s.y, s.state, s.timer, s.cycle_length
            );
        }
        let stopped = self.vehicles.iter().filter(|v| v.speed == 0).count();
        println!("Stopped vehicles: {}", stopped);
    }
}

/// Build the initial world for `config`
pub fn init_world<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> World {
    World::generate(config, rng)
}
