//! Text rendering of simulation snapshots for terminal output

use crate::simulation::{Direction, SimConfig, Snapshot, TrafficMetrics};

/// Widest map drawn, in characters; longer roads are scaled down
pub const MAX_MAP_COLUMNS: usize = 100;

/// Longest histogram bar, in characters
const MAX_BAR_WIDTH: usize = 40;

/// Draw the road as two lane rows framed by the signal rows.
///
/// Vehicles show as `>` or `<` by direction, `#` where several share a cell.
/// Signals show their phase letter.
pub fn draw_road(snapshot: &Snapshot, config: &SimConfig) -> String {
    let columns = (config.width as usize).min(MAX_MAP_COLUMNS);
    let to_col = |x: i64| -> usize {
        let x = x.clamp(0, i64::from(config.width) - 1) as u64;
        (x * columns as u64 / u64::from(config.width)) as usize
    };

    let mut signal_rows = [vec![' '; columns], vec![' '; columns]];
    let mut lane_rows = [vec!['.'; columns], vec!['.'; columns]];

    for (row, signal) in signal_rows.iter_mut().zip(&snapshot.signals) {
        row[to_col(signal.x)] = signal.state.symbol();
    }

    for vehicle in &snapshot.vehicles {
        let cell = &mut lane_rows[vehicle.lane.index()][to_col(i64::from(vehicle.x))];
        *cell = match (*cell, vehicle.direction) {
            ('.', Direction::Forward) => '>',
            ('.', Direction::Backward) => '<',
            _ => '#',
        };
    }

    let line = |cells: &[char]| -> String { cells.iter().collect() };
    let mut out = String::new();
    out.push_str(&format!("=== Road Map (tick {}) ===\n", snapshot.tick));
    out.push_str("Legend: >/< = vehicle heading east/west, # = several, G/Y/R = signal\n");
    out.push_str(&format!(" {}\n", line(&signal_rows[0])));
    out.push_str(&format!("|{}|\n", line(&lane_rows[0])));
    out.push_str(&format!("|{}|\n", "-".repeat(columns)));
    out.push_str(&format!("|{}|\n", line(&lane_rows[1])));
    out.push_str(&format!(" {}\n", line(&signal_rows[1])));
    out
}

/// Horizontal bar chart of a speed histogram, one row per speed
pub fn draw_speed_histogram(histogram: &[usize]) -> String {
    let peak = histogram.iter().copied().max().unwrap_or(0);
    let mut out = String::from("=== Speed Distribution ===\n");
    for (speed, &count) in histogram.iter().enumerate() {
        let bar = if peak == 0 {
            0
        } else {
            (count * MAX_BAR_WIDTH).div_ceil(peak)
        };
        out.push_str(&format!(
            "{:>2} | {:<width$} {}\n",
            speed,
            "*".repeat(bar),
            count,
            width = MAX_BAR_WIDTH
        ));
    }
    out
}

/// One-line metrics summary
pub fn format_metrics(metrics: &TrafficMetrics) -> String {
    format!(
        "tick {:>5} | mean speed {:5.2} ({:5.1} km/h) | density {:.4} | flow {:.4} | stopped {:>3} | lanes {}/{} | travel {:.1} min",
        metrics.tick,
        metrics.mean_speed,
        metrics.mean_speed_kmh,
        metrics.density,
        metrics.flow,
        metrics.stopped,
        metrics.per_lane[0],
        metrics.per_lane[1],
        metrics.travel_time_minutes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Lane, SimParams, Vehicle, VehicleId, World};

    #[test]
    fn test_draws_vehicles_and_signals() {
        let config = SimParams {
            width: 20,
            ..Default::default()
        }
        .validate()
        .unwrap();
        let east = Vehicle::new(VehicleId(0), 2, 50, Lane::Upper, Direction::Forward, 1, 1);
        let west = Vehicle::new(VehicleId(1), 5, 55, Lane::Lower, Direction::Backward, 1, 1);
        let twin = Vehicle { x: 5, ..west };
        let world = World::with_vehicles(&config, vec![east, west, twin]);
        let map = draw_road(&world.snapshot(), &config);
        let lines: Vec<&str> = map.lines().collect();

        assert_eq!(lines[2], format!(" {}R{}", " ".repeat(10), " ".repeat(9)));
        assert_eq!(lines[3], "|..>.................|");
        assert_eq!(lines[5], "|.....#..............|");
        assert_eq!(lines[6].chars().nth(11), Some('G'));
    }

    #[test]
    fn test_histogram_bars_scale_to_peak() {
        let chart = draw_speed_histogram(&[2, 0, 4]);
        let rows: Vec<&str> = chart.lines().collect();
        assert_eq!(rows[0], "=== Speed Distribution ===");
        assert_eq!(rows.len(), 4);
        assert!(rows[1].starts_with(&format!(" 0 | {} ", "*".repeat(20))));
        assert!(rows[2].starts_with(" 1 |  "));
        assert!(rows[2].ends_with(" 0"));
        assert!(rows[3].contains(&"*".repeat(40)));
        assert!(rows[3].ends_with(" 4"));
    }

    #[test]
    fn test_long_roads_are_scaled() {
        let config = SimParams {
            width: 1000,
            signals_enabled: false,
            ..Default::default()
        }
        .validate()
        .unwrap();
        let v = Vehicle::new(VehicleId(0), 999, 50, Lane::Upper, Direction::Forward, 1, 1);
        let world = World::with_vehicles(&config, vec![v]);
        let map = draw_road(&world.snapshot(), &config);
        let lane = map.lines().nth(3).unwrap();
        assert_eq!(lane.len(), MAX_MAP_COLUMNS + 2);
        assert!(lane.ends_with(">|"));
    }
}
