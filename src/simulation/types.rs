//! Core types for the lane-flow simulation
//!
//! Small value types shared by vehicles, signals and the update engine.

use serde::{Deserialize, Serialize};

/// A unique identifier for a vehicle.
/// Wraps the vehicle's index in the world's population, which never changes
/// during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub usize);

/// A unique identifier for a traffic signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalId(pub usize);

/// One of the two parallel travel bands of the road.
///
/// Serialized as `0` (upper band, initially eastbound) or `1` (lower band,
/// initially westbound).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Lane {
    Upper,
    Lower,
}

impl Lane {
    pub const ALL: [Lane; 2] = [Lane::Upper, Lane::Lower];

    pub fn index(self) -> usize {
        match self {
            Lane::Upper => 0,
            Lane::Lower => 1,
        }
    }

    /// The adjacent band
    pub fn other(self) -> Lane {
        match self {
            Lane::Upper => Lane::Lower,
            Lane::Lower => Lane::Upper,
        }
    }

    /// Travel sense assigned to vehicles created in this band
    pub fn travel_direction(self) -> Direction {
        match self {
            Lane::Upper => Direction::Forward,
            Lane::Lower => Direction::Backward,
        }
    }
}

impl From<Lane> for u8 {
    fn from(lane: Lane) -> Self {
        match lane {
            Lane::Upper => 0,
            Lane::Lower => 1,
        }
    }
}

impl TryFrom<u8> for Lane {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Lane::Upper),
            1 => Ok(Lane::Lower),
            other => Err(format!("lane must be 0 or 1, got {other}")),
        }
    }
}

/// Travel sense along the road axis.
///
/// Serialized as `1` or `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::Forward),
            -1 => Ok(Direction::Backward),
            other => Err(format!("direction must be 1 or -1, got {other}")),
        }
    }
}

/// Phase of a traffic signal. Phases cycle green -> yellow -> red -> green.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalPhase {
    Green,
    Yellow,
    Red,
}

impl SignalPhase {
    pub fn next(self) -> SignalPhase {
        match self {
            SignalPhase::Green => SignalPhase::Yellow,
            SignalPhase::Yellow => SignalPhase::Red,
            SignalPhase::Red => SignalPhase::Green,
        }
    }

    /// Whether vehicles inside the signal's window must stop
    pub fn halts_traffic(self) -> bool {
        matches!(self, SignalPhase::Yellow | SignalPhase::Red)
    }

    pub fn symbol(self) -> char {
        match self {
            SignalPhase::Green => 'G',
            SignalPhase::Yellow => 'Y',
            SignalPhase::Red => 'R',
        }
    }
}

/// Wrap a signed position onto the loop `[0, width)`
pub fn wrap_position(x: i64, width: u32) -> u32 {
    // rem_euclid with a positive modulus always lands in [0, width)
    x.rem_euclid(i64::from(width)) as u32
}

/// Conversion factor between cells/tick and the km/h figures shown to users
pub const KMH_PER_CELL_SPEED: f64 = 10.0;
