//! Behavioural properties of the lane-flow engine
//!
//! These drive the public API only and check the observable rules: speed and
//! position bounds, signal cycling, acceleration, gap keeping and wrap-around.

use lane_flow::simulation::{
    configure, forward_gap, init_world, step, Direction, GapMetric, Lane, SignalPhase, SimConfig,
    SimParams, Stepper, UpdateScheme, Vehicle, VehicleId, World,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn quiet_params() -> SimParams {
    SimParams {
        width: 200,
        road_half_width: 5,
        max_speed: 6,
        slowdown_prob: 0.0,
        lane_change_prob: 0.0,
        signals_enabled: false,
        safe_distance: 5,
        ..Default::default()
    }
}

fn east(x: u32, speed: u32, desired: u32) -> Vehicle {
    Vehicle::new(VehicleId(0), x, 50, Lane::Upper, Direction::Forward, speed, desired)
}

#[test]
fn test_end_to_end_two_vehicle_scenario() {
    let config = configure(&quiet_params()).unwrap();
    let world = World::with_vehicles(&config, vec![east(0, 3, 3), east(4, 3, 3)]);
    let mut stepper = Stepper::with_world(config, world);
    let snapshot = stepper.step();

    let a = &snapshot.vehicles[0];
    let b = &snapshot.vehicles[1];
    assert_eq!((a.x, a.speed), (3, 3));
    assert_eq!((b.x, b.speed), (7, 3));
    assert_eq!(snapshot.tick, 1);
}

#[test]
fn test_lone_vehicle_reaches_desired_speed_in_v_ticks() {
    let config = configure(&quiet_params()).unwrap();
    let v = 5;
    let world = World::with_vehicles(&config, vec![east(17, 0, v)]);
    let mut stepper = Stepper::with_world(config, world);

    let speeds: Vec<u32> = stepper.run(12).map(|s| s.vehicles[0].speed).collect();
    for (tick, &speed) in speeds.iter().enumerate() {
        let expected = (tick as u32 + 1).min(v);
        assert_eq!(speed, expected, "tick {}", tick + 1);
    }
}

#[test]
fn test_constant_speed_returns_to_start_after_full_lap() {
    let config = configure(&quiet_params()).unwrap();
    for (speed, direction, lane) in [
        (4, Direction::Forward, Lane::Upper),
        (5, Direction::Backward, Lane::Lower),
    ] {
        let y = *config.lane_band(lane).start();
        let vehicle = Vehicle::new(VehicleId(0), 37, y, lane, direction, speed, speed);
        let world = World::with_vehicles(&config, vec![vehicle]);
        let mut stepper = Stepper::with_world(config.clone(), world);
        let laps: Vec<u32> = stepper
            .run(u64::from(config.width / speed))
            .map(|s| s.vehicles[0].x)
            .collect();
        assert!(laps.iter().all(|&x| x < config.width));
        assert_eq!(laps.last().copied(), Some(37));
        assert!(laps[..laps.len() - 1].iter().all(|&x| x != 37));
    }
}

#[test]
fn test_invariants_hold_on_busy_roads() {
    for scheme in [UpdateScheme::Synchronous, UpdateScheme::Sequential] {
        for metric in [GapMetric::Wrapped, GapMetric::Linear] {
            let params = SimParams {
                vehicle_count: 120,
                slowdown_prob: 0.3,
                lane_change_prob: 0.3,
                signal_cycle_length: 7,
                update_scheme: scheme,
                gap_metric: metric,
                seed: 99,
                ..Default::default()
            };
            let config = configure(&params).unwrap();
            let mut rng = StdRng::seed_from_u64(config.seed);
            let mut world = init_world(&config, &mut rng);
            for _ in 0..300 {
                step(&mut world, &config, &mut rng);
                world.check_invariants(&config).unwrap();
                assert!(world
                    .vehicles
                    .iter()
                    .all(|v| v.speed <= config.max_speed && v.x < config.width));
            }
        }
    }
}

#[test]
fn test_signals_cycle_independently_with_fixed_phase_length() {
    let params = SimParams {
        vehicle_count: 0,
        signal_cycle_length: 4,
        signal_phases: vec![SignalPhase::Red, SignalPhase::Yellow],
        ..Default::default()
    };
    let config = configure(&params).unwrap();
    let mut stepper = Stepper::new(config);
    let history: Vec<(SignalPhase, SignalPhase)> = stepper
        .run(24)
        .map(|s| {
            assert!(s.signals.iter().all(|sig| sig.timer < sig.cycle_length));
            (s.signals[0].state, s.signals[1].state)
        })
        .collect();

    let expected = |start: SignalPhase, tick: usize| {
        let mut phase = start;
        for _ in 0..(tick / 4) {
            phase = phase.next();
        }
        phase
    };
    for (i, &(upper, lower)) in history.iter().enumerate() {
        let tick = i + 1;
        assert_eq!(upper, expected(SignalPhase::Red, tick), "upper at tick {tick}");
        assert_eq!(lower, expected(SignalPhase::Yellow, tick), "lower at tick {tick}");
    }
}

/// No vehicle ends a tick faster than any same-band vehicle that was closer
/// than the safe distance ahead of it before the tick
fn assert_followers_respect_close_vehicles(config: &SimConfig, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = init_world(config, &mut rng);
    for _ in 0..200 {
        let before = world.vehicles.clone();
        step(&mut world, config, &mut rng);
        for (i, follower) in before.iter().enumerate() {
            for (j, ahead) in before.iter().enumerate() {
                if i == j || ahead.lane != follower.lane {
                    continue;
                }
                let gap = forward_gap(
                    follower.x,
                    ahead.x,
                    follower.direction,
                    config.width,
                    config.gap_metric,
                );
                if gap.is_some_and(|g| g < config.safe_distance) {
                    assert!(
                        world.vehicles[i].speed <= ahead.speed,
                        "vehicle {:?} sped past {:?} at gap {:?}",
                        follower.id,
                        ahead.id,
                        gap
                    );
                }
            }
        }
    }
}

#[test]
fn test_follower_never_catches_braking_pair_ahead() {
    let config = configure(&quiet_params()).unwrap();
    let vehicles = vec![east(0, 3, 3), east(2, 3, 3), east(4, 1, 1)];
    let world = World::with_vehicles(&config, vehicles);
    let mut stepper = Stepper::with_world(config, world);
    let snapshot = stepper.step();

    let positions: Vec<u32> = snapshot.vehicles.iter().map(|v| v.x).collect();
    assert_eq!(positions, vec![1, 3, 5]);
    assert!(snapshot.vehicles.iter().all(|v| v.speed == 1));
}

#[test]
fn test_safety_gap_caps_follower_speed() {
    let params = SimParams {
        vehicle_count: 80,
        slowdown_prob: 0.2,
        lane_change_prob: 0.0,
        seed: 5,
        ..Default::default()
    };
    let config = configure(&params).unwrap();
    assert_followers_respect_close_vehicles(&config, 5);
}

#[test]
fn test_seeded_runs_replay_identically() {
    let config = configure(&SimParams {
        seed: 2718,
        ..Default::default()
    })
    .unwrap();
    let first: Vec<_> = Stepper::new(config.clone()).run(80).collect();
    let second: Vec<_> = Stepper::new(config).run(80).collect();
    assert_eq!(first, second);
}

#[test]
fn test_vehicle_count_never_changes() {
    let config = configure(&SimParams {
        vehicle_count: 33,
        lane_change_prob: 0.5,
        ..Default::default()
    })
    .unwrap();
    let mut stepper = Stepper::new(config);
    assert!(stepper.run(100).all(|s| s.vehicles.len() == 33));
}

#[test]
fn test_invalid_configuration_is_rejected_before_world_exists() {
    let err = configure(&SimParams {
        lane_change_prob: 2.0,
        ..Default::default()
    })
    .unwrap_err();
    assert_eq!(err.field(), Some("lane_change_prob"));
    assert!(err.to_string().contains("lane_change_prob"));
}
