//! The per-tick update engine
//!
//! A tick updates every signal, then every vehicle. Under
//! [`UpdateScheme::Synchronous`] each vehicle's next state is computed from
//! the pre-tick population and written to a fresh buffer, which replaces the
//! population once every vehicle is done. Under [`UpdateScheme::Sequential`]
//! vehicles are updated in place in population order, so a vehicle sees the
//! already-moved state of every vehicle before it.
//!
//! All randomness comes from the caller's generator, drawn in population
//! order, so a fixed seed replays the same run.

use log::trace;
use rand::Rng;

use super::config::{SimConfig, UpdateScheme};
use super::lane_index::{scan_leader, LaneIndex};
use super::signal::TrafficSignal;
use super::vehicle::{Vehicle, VehicleOutcome};
use super::world::World;

/// Counts of notable events during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number just completed
    pub tick: u64,
    pub phase_changes: usize,
    pub lane_changes: usize,
    pub signal_holds: usize,
}

impl TickReport {
    fn record(&mut self, outcome: VehicleOutcome) {
        if outcome.changed_lane {
            self.lane_changes += 1;
        }
        if outcome.held_by_signal {
            self.signal_holds += 1;
        }
    }
}

/// Advance `world` by exactly one tick
pub fn step<R: Rng + ?Sized>(world: &mut World, config: &SimConfig, rng: &mut R) -> TickReport {
    let mut report = TickReport {
        phase_changes: update_signals(&mut world.signals),
        ..Default::default()
    };

    match config.update_scheme {
        UpdateScheme::Synchronous => {
            world.vehicles =
                next_generation(&world.vehicles, &world.signals, config, rng, &mut report);
        }
        UpdateScheme::Sequential => {
            update_in_place(&mut world.vehicles, &world.signals, config, rng, &mut report);
        }
    }

    world.tick += 1;
    report.tick = world.tick;
    report
}

fn update_signals(signals: &mut [TrafficSignal]) -> usize {
    let mut changed = 0;
    for signal in signals.iter_mut() {
        if signal.tick() {
            trace!("Signal {:?} switched to {:?}", signal.id, signal.state);
            changed += 1;
        }
    }
    changed
}

fn next_generation<R: Rng + ?Sized>(
    current: &[Vehicle],
    signals: &[TrafficSignal],
    config: &SimConfig,
    rng: &mut R,
    report: &mut TickReport,
) -> Vec<Vehicle> {
    let index = LaneIndex::build(
        current,
        config.width,
        config.gap_metric,
        config.safe_distance,
    );
    current
        .iter()
        .enumerate()
        .map(|(i, vehicle)| {
            let leader = index.leader(current, i);
            let mut next = *vehicle;
            report.record(next.update(leader, signals, config, rng));
            next
        })
        .collect()
}

fn update_in_place<R: Rng + ?Sized>(
    vehicles: &mut [Vehicle],
    signals: &[TrafficSignal],
    config: &SimConfig,
    rng: &mut R,
    report: &mut TickReport,
) {
    for i in 0..vehicles.len() {
        let leader = scan_leader(
            vehicles,
            i,
            config.width,
            config.gap_metric,
            config.safe_distance,
        );
        if let Some(vehicle) = vehicles.get_mut(i) {
            report.record(vehicle.update(leader, signals, config, rng));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::config::{GapMetric, SimParams};
    use crate::simulation::types::{Direction, Lane, SignalPhase, VehicleId};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quiet(scheme: UpdateScheme) -> SimConfig {
        SimParams {
            width: 200,
            max_speed: 6,
            slowdown_prob: 0.0,
            lane_change_prob: 0.0,
            signals_enabled: false,
            safe_distance: 5,
            update_scheme: scheme,
            ..Default::default()
        }
        .validate()
        .unwrap()
    }

    fn east(x: u32, speed: u32, desired: u32) -> Vehicle {
        Vehicle::new(VehicleId(0), x, 50, Lane::Upper, Direction::Forward, speed, desired)
    }

    #[test]
    fn test_close_pair_moves_together() {
        let config = quiet(UpdateScheme::Synchronous);
        let mut world = World::with_vehicles(&config, vec![east(0, 3, 3), east(4, 3, 3)]);
        let mut rng = StdRng::seed_from_u64(0);
        let report = step(&mut world, &config, &mut rng);
        assert_eq!(report.tick, 1);
        assert_eq!((world.vehicles[0].x, world.vehicles[0].speed), (3, 3));
        assert_eq!((world.vehicles[1].x, world.vehicles[1].speed), (7, 3));
    }

    #[test]
    fn test_synchronous_reads_pre_tick_speeds() {
        // The leader accelerates from 0 to 1 this tick, but the follower
        // only sees its pre-tick speed of 0.
        let config = quiet(UpdateScheme::Synchronous);
        let mut world = World::with_vehicles(&config, vec![east(10, 0, 2), east(8, 2, 2)]);
        step(&mut world, &config, &mut StdRng::seed_from_u64(0));
        assert_eq!(world.vehicles[0].x, 11);
        assert_eq!(world.vehicles[1].speed, 0);
        assert_eq!(world.vehicles[1].x, 8);
    }

    #[test]
    fn test_sequential_reads_updated_neighbours() {
        let config = quiet(UpdateScheme::Sequential);
        let mut world = World::with_vehicles(&config, vec![east(10, 0, 2), east(8, 2, 2)]);
        step(&mut world, &config, &mut StdRng::seed_from_u64(0));
        // Leader moved first to x=11 at speed 1; gap is now 3 and the
        // follower copies speed 1
        assert_eq!(world.vehicles[0].x, 11);
        assert_eq!(world.vehicles[1].speed, 1);
        assert_eq!(world.vehicles[1].x, 9);
    }

    #[test]
    fn test_signals_update_before_vehicles() {
        let config = SimParams {
            slowdown_prob: 0.0,
            lane_change_prob: 0.0,
            signal_cycle_length: 1,
            signal_phases: vec![SignalPhase::Green, SignalPhase::Yellow],
            ..Default::default()
        }
        .validate()
        .unwrap();
        // Lower signal sits at (100, 57); y=55 is in the lower band and
        // inside its window
        let mut v = east(105, 2, 2);
        v.lane = Lane::Lower;
        v.direction = Direction::Backward;
        v.y = 55;
        let mut world = World::with_vehicles(&config, vec![v]);
        assert!(world.check_invariants(&config).is_ok());
        let report = step(&mut world, &config, &mut StdRng::seed_from_u64(0));
        // Yellow -> red happened first, so the vehicle is held this tick
        assert_eq!(world.signals[1].state, SignalPhase::Red);
        assert_eq!(report.phase_changes, 2);
        assert_eq!(report.signal_holds, 1);
        assert_eq!((world.vehicles[0].x, world.vehicles[0].speed), (105, 0));
    }

    #[test]
    fn test_follower_yields_to_slow_vehicle_behind_leader() {
        let config = quiet(UpdateScheme::Synchronous);
        let vehicles = vec![east(0, 3, 3), east(2, 3, 3), east(4, 1, 1)];
        let mut world = World::with_vehicles(&config, vehicles);
        step(&mut world, &config, &mut StdRng::seed_from_u64(0));
        let state: Vec<(u32, u32)> = world.vehicles.iter().map(|v| (v.x, v.speed)).collect();
        assert_eq!(state, vec![(1, 1), (3, 1), (5, 1)]);
    }

    #[test]
    fn test_gap_metric_changes_seam_behaviour() {
        let mut config = quiet(UpdateScheme::Synchronous);
        let vehicles = vec![east(198, 4, 4), east(1, 0, 0)];

        config.gap_metric = GapMetric::Wrapped;
        let mut wrapped = World::with_vehicles(&config, vehicles.clone());
        step(&mut wrapped, &config, &mut StdRng::seed_from_u64(0));
        assert_eq!(wrapped.vehicles[0].speed, 0);

        config.gap_metric = GapMetric::Linear;
        let mut linear = World::with_vehicles(&config, vehicles);
        step(&mut linear, &config, &mut StdRng::seed_from_u64(0));
        assert_eq!(linear.vehicles[0].speed, 4);
        assert_eq!(linear.vehicles[0].x, 2);
    }

    #[test]
    fn test_same_seed_same_ticks() {
        let config = SimParams::default().validate().unwrap();
        let mut a = World::generate(&config, &mut StdRng::seed_from_u64(config.seed));
        let mut b = a.clone();
        let mut rng_a = StdRng::seed_from_u64(77);
        let mut rng_b = StdRng::seed_from_u64(77);
        for _ in 0..100 {
            step(&mut a, &config, &mut rng_a);
            step(&mut b, &config, &mut rng_b);
            assert_eq!(a, b);
            assert!(a.check_invariants(&config).is_ok());
        }
    }
}
