//! Traffic metrics derived from snapshots
//!
//! Density is vehicles per unit of road area (`width * road_half_width * 2`)
//! and flow is density times mean speed, giving the points of a
//! flow-density (fundamental) diagram.

use log::info;
use serde::Serialize;

use super::config::{SimConfig, SimParams};
use super::error::SimError;
use super::stepper::Stepper;
use super::types::{Lane, KMH_PER_CELL_SPEED};
use super::world::Snapshot;

/// Metrics of a single snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrafficMetrics {
    pub tick: u64,
    pub vehicle_count: usize,
    /// Cells per tick
    pub mean_speed: f64,
    pub mean_speed_kmh: f64,
    pub density: f64,
    pub flow: f64,
    /// Minutes to cover the whole road at the mean speed
    pub travel_time_minutes: f64,
    pub stopped: usize,
    /// Vehicle count per band, upper first
    pub per_lane: [usize; 2],
}

impl TrafficMetrics {
    pub fn measure(snapshot: &Snapshot, config: &SimConfig) -> Self {
        let vehicle_count = snapshot.vehicles.len();
        let total_speed: u64 = snapshot.vehicles.iter().map(|v| u64::from(v.speed)).sum();
        let mean_speed = if vehicle_count == 0 {
            0.0
        } else {
            total_speed as f64 / vehicle_count as f64
        };
        let area = f64::from(config.width) * f64::from(config.road_half_width) * 2.0;
        let density = vehicle_count as f64 / area;

        let mut per_lane = [0; 2];
        for v in &snapshot.vehicles {
            per_lane[v.lane.index()] += 1;
        }

        Self {
            tick: snapshot.tick,
            vehicle_count,
            mean_speed,
            mean_speed_kmh: mean_speed * KMH_PER_CELL_SPEED,
            density,
            flow: density * mean_speed,
            // The 0.1 keeps a fully jammed road finite
            travel_time_minutes: f64::from(config.width) / (mean_speed + 0.1) / 60.0,
            stopped: snapshot.vehicles.iter().filter(|v| v.speed == 0).count(),
            per_lane,
        }
    }

    pub fn lane_count(&self, lane: Lane) -> usize {
        self.per_lane[lane.index()]
    }
}

/// Number of vehicles at each speed, indexed by speed from 0 to `max_speed`
pub fn speed_histogram(snapshot: &Snapshot, config: &SimConfig) -> Vec<usize> {
    let mut counts = vec![0; config.max_speed as usize + 1];
    for v in &snapshot.vehicles {
        let speed = v.speed as usize;
        if speed >= counts.len() {
            counts.resize(speed + 1, 0);
        }
        counts[speed] += 1;
    }
    counts
}

/// Running totals over a sequence of ticks
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    speed_total: f64,
    flow_total: f64,
    pub density: f64,
    pub peak_stopped: usize,
    pub final_tick: u64,
}

impl RunSummary {
    pub fn record(&mut self, metrics: &TrafficMetrics) {
        self.ticks += 1;
        self.speed_total += metrics.mean_speed;
        self.flow_total += metrics.flow;
        self.density = metrics.density;
        self.peak_stopped = self.peak_stopped.max(metrics.stopped);
        self.final_tick = metrics.tick;
    }

    pub fn mean_speed(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.speed_total / self.ticks as f64
        }
    }

    pub fn mean_flow(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.flow_total / self.ticks as f64
        }
    }
}

/// One point of a flow-density sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    pub vehicle_count: usize,
    pub density: f64,
    pub mean_speed: f64,
    pub flow: f64,
}

/// Run one simulation per vehicle count, otherwise identical to `base`.
///
/// The first `warmup` ticks of each run are discarded; the reported speed
/// and flow are averaged over the following `measure` ticks.
pub fn flow_density_sweep(
    base: &SimParams,
    vehicle_counts: &[i64],
    warmup: u64,
    measure: u64,
) -> Result<Vec<SweepPoint>, SimError> {
    let mut points = Vec::with_capacity(vehicle_counts.len());
    for &count in vehicle_counts {
        let config = SimParams {
            vehicle_count: count,
            ..base.clone()
        }
        .validate()?;
        let mut stepper = Stepper::new(config.clone());
        for _ in 0..warmup {
            stepper.advance();
        }
        let mut summary = RunSummary::default();
        for snapshot in stepper.run(measure) {
            summary.record(&TrafficMetrics::measure(&snapshot, &config));
        }
        let density = TrafficMetrics::measure(&stepper.world().snapshot(), &config).density;
        let point = SweepPoint {
            vehicle_count: config.vehicle_count,
            density,
            mean_speed: summary.mean_speed(),
            flow: summary.mean_flow(),
        };
        info!(
            "Sweep: {} vehicles, density {:.4}, mean speed {:.2}, flow {:.4}",
            point.vehicle_count, point.density, point.mean_speed, point.flow
        );
        points.push(point);
    }
    Ok(points)
}
