//! Traffic signal state machine
//!
//! Each signal counts ticks and advances green -> yellow -> red -> green once
//! its timer reaches the cycle length. Signals never read vehicle state.

use serde::{Deserialize, Serialize};

use super::config::SimConfig;
use super::types::{Lane, SignalId, SignalPhase};

/// A traffic signal beside one lane band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSignal {
    pub id: SignalId,
    pub x: i64,
    pub y: i64,
    pub state: SignalPhase,
    /// Ticks spent in the current phase, always below `cycle_length`
    pub timer: u32,
    pub cycle_length: u32,
}

impl TrafficSignal {
    pub fn new(id: SignalId, x: i64, y: i64, state: SignalPhase, cycle_length: u32) -> Self {
        Self {
            id,
            x,
            y,
            state,
            timer: 0,
            cycle_length,
        }
    }

    /// Build the signal set described by `config`; empty when signals are disabled
    pub fn build_all(config: &SimConfig) -> Vec<TrafficSignal> {
        let Some(signals) = &config.signals else {
            return Vec::new();
        };
        Lane::ALL
            .iter()
            .zip(signals.initial_phases)
            .enumerate()
            .map(|(i, (&lane, phase))| {
                let (x, y) = config.signal_location(lane);
                TrafficSignal::new(SignalId(i), x, y, phase, signals.cycle_length)
            })
            .collect()
    }

    /// Advance by one tick. Returns true when the phase changed.
    pub fn tick(&mut self) -> bool {
        self.timer += 1;
        if self.timer >= self.cycle_length {
            self.timer = 0;
            self.state = self.state.next();
            return true;
        }
        false
    }

    /// Whether `(x, y)` lies inside this signal's stopping window
    pub fn covers(&self, x: i64, y: i64, x_range: u32, y_range: u32) -> bool {
        (x - self.x).abs() < i64::from(x_range) && (y - self.y).abs() < i64::from(y_range)
    }

    /// Whether a vehicle at `(x, y)` must stop this tick
    pub fn blocks(&self, x: i64, y: i64, x_range: u32, y_range: u32) -> bool {
        self.state.halts_traffic() && self.covers(x, y, x_range, y_range)
    }
}
