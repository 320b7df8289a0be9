//! Standalone lane-flow simulation module
//!
//! Contains the whole simulation core: configuration, vehicles, signals, the
//! per-tick update engine and the stepper. Nothing here does I/O, so every
//! piece can be driven and tested from plain Rust code.

mod config;
mod engine;
mod error;
mod lane_index;
mod metrics;
mod signal;
mod stepper;
mod types;
mod vehicle;
mod world;

pub use config::{
    configure, GapMetric, LaneChangePolicy, SignalConfig, SimConfig, SimParams, UpdateScheme,
    DEFAULT_SIGNAL_CYCLE, SIGNAL_SETBACK,
};
pub use engine::{step, TickReport};
pub use error::SimError;
pub use lane_index::{forward_gap, scan_leader, LaneIndex, Leader};
pub use metrics::{flow_density_sweep, speed_histogram, RunSummary, SweepPoint, TrafficMetrics};
pub use signal::TrafficSignal;
pub use stepper::{Run, Stepper};
pub use types::{
    wrap_position, Direction, Lane, SignalId, SignalPhase, VehicleId, KMH_PER_CELL_SPEED,
};
pub use vehicle::{Vehicle, VehicleOutcome};
pub use world::{init_world, Snapshot, World};
