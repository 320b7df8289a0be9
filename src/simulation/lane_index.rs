//! Gap perception: finding the nearest vehicle ahead in the same band
//!
//! A vehicle's leader is the other vehicle in its band with the smallest
//! positive forward gap, measured along the subject's own direction. Ties go
//! to the lowest population index. Vehicles at exactly the same `x` are never
//! ahead of each other.
//!
//! Alongside the leader, each query reports the slowest speed among all the
//! vehicles ahead that are closer than the safe distance. A follower must not
//! outrun any of them, not just the nearest.
//!
//! [`scan_leader`] is the plain O(n) scan over the population.
//! [`LaneIndex`] sorts each band by position once per tick and answers the
//! same query by binary search; both must always agree.

use sorted_vec::SortedVec;

use super::config::GapMetric;
use super::types::{Direction, Lane, VehicleId};
use super::vehicle::Vehicle;

/// The vehicle a subject is following
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leader {
    pub id: VehicleId,
    pub gap: u32,
    pub speed: u32,
    /// Slowest speed among the vehicles ahead closer than the safe distance.
    /// Equal to `speed` when none of them is slower than the leader, or when
    /// the leader itself is not that close.
    pub yield_speed: u32,
}

/// Forward distance from `from` to `to` for a vehicle travelling `direction`,
/// or `None` if `to` is not ahead.
pub fn forward_gap(
    from: u32,
    to: u32,
    direction: Direction,
    width: u32,
    metric: GapMetric,
) -> Option<u32> {
    match metric {
        GapMetric::Linear => match direction {
            Direction::Forward if to > from => Some(to - from),
            Direction::Backward if to < from => Some(from - to),
            _ => None,
        },
        GapMetric::Wrapped => {
            let raw = (i64::from(to) - i64::from(from)) * direction.sign();
            let gap = raw.rem_euclid(i64::from(width));
            // gap is in [0, width), which always fits back into u32
            (gap != 0).then_some(gap as u32)
        }
    }
}

/// Nearest vehicle ahead of `vehicles[subject]`, by full scan.
/// The subject is excluded by index, never by value.
pub fn scan_leader(
    vehicles: &[Vehicle],
    subject: usize,
    width: u32,
    metric: GapMetric,
    safe_distance: u32,
) -> Option<Leader> {
    let me = vehicles.get(subject)?;
    let mut best: Option<Leader> = None;
    let mut slowest_close: Option<u32> = None;
    for (i, other) in vehicles.iter().enumerate() {
        if i == subject || other.lane != me.lane {
            continue;
        }
        let Some(gap) = forward_gap(me.x, other.x, me.direction, width, metric) else {
            continue;
        };
        if gap < safe_distance {
            slowest_close = Some(slowest_close.map_or(other.speed, |s| s.min(other.speed)));
        }
        if best.map_or(true, |b| gap < b.gap) {
            best = Some(Leader {
                id: other.id,
                gap,
                speed: other.speed,
                yield_speed: other.speed,
            });
        }
    }
    best.map(|leader| Leader {
        yield_speed: slowest_close.map_or(leader.speed, |s| s.min(leader.speed)),
        ..leader
    })
}

/// Per-band position index over a fixed population snapshot
pub struct LaneIndex {
    /// `(x, population index)` per band, ascending
    bands: [SortedVec<(u32, usize)>; 2],
    width: u32,
    metric: GapMetric,
    safe_distance: u32,
}

impl LaneIndex {
    pub fn build(vehicles: &[Vehicle], width: u32, metric: GapMetric, safe_distance: u32) -> Self {
        let mut upper = Vec::new();
        let mut lower = Vec::new();
        for (i, v) in vehicles.iter().enumerate() {
            match v.lane {
                Lane::Upper => upper.push((v.x, i)),
                Lane::Lower => lower.push((v.x, i)),
            }
        }
        Self {
            bands: [
                SortedVec::from_unsorted(upper),
                SortedVec::from_unsorted(lower),
            ],
            width,
            metric,
            safe_distance,
        }
    }

    /// Nearest vehicle ahead of `vehicles[subject]`.
    /// `vehicles` must be the population this index was built from.
    pub fn leader(&self, vehicles: &[Vehicle], subject: usize) -> Option<Leader> {
        let me = vehicles.get(subject)?;
        let band: &[(u32, usize)] = &self.bands[me.lane.index()];
        let wrapped = self.metric == GapMetric::Wrapped;

        let target_x = match me.direction {
            Direction::Forward => {
                let past = band.partition_point(|&(x, _)| x <= me.x);
                match band.get(past) {
                    Some(&(x, _)) => Some(x),
                    // Nothing further along: wrap to the lowest position
                    None if wrapped => band.first().map(|&(x, _)| x).filter(|&x| x < me.x),
                    None => None,
                }
            }
            Direction::Backward => {
                let below = band.partition_point(|&(x, _)| x < me.x);
                if below > 0 {
                    band.get(below - 1).map(|&(x, _)| x)
                } else if wrapped {
                    band.last().map(|&(x, _)| x).filter(|&x| x > me.x)
                } else {
                    None
                }
            }
        }?;

        // Lowest population index among the vehicles sharing that position
        let first = band.partition_point(|&(x, _)| x < target_x);
        let &(_, idx) = band.get(first)?;
        let other = vehicles.get(idx)?;
        let gap = forward_gap(me.x, other.x, me.direction, self.width, self.metric)?;

        let slowest_close = self
            .ahead_of(band, me)
            .map_while(|&(_, idx)| {
                let next = vehicles.get(idx)?;
                let gap = forward_gap(me.x, next.x, me.direction, self.width, self.metric)?;
                (gap < self.safe_distance).then_some(next.speed)
            })
            .min();

        Some(Leader {
            id: other.id,
            gap,
            speed: other.speed,
            yield_speed: slowest_close.map_or(other.speed, |s| s.min(other.speed)),
        })
    }

    /// Band entries in order of increasing forward gap from `me`. Under the
    /// wrapped metric the entries at `me.x` itself come last.
    fn ahead_of<'a>(
        &self,
        band: &'a [(u32, usize)],
        me: &Vehicle,
    ) -> Box<dyn Iterator<Item = &'a (u32, usize)> + 'a> {
        let wrapped = self.metric == GapMetric::Wrapped;
        match me.direction {
            Direction::Forward => {
                let (behind, ahead) = band.split_at(band.partition_point(|&(x, _)| x <= me.x));
                let seam: &[(u32, usize)] = if wrapped { behind } else { &[] };
                Box::new(ahead.iter().chain(seam))
            }
            Direction::Backward => {
                let (ahead, behind) = band.split_at(band.partition_point(|&(x, _)| x < me.x));
                let seam: &[(u32, usize)] = if wrapped { behind } else { &[] };
                Box::new(ahead.iter().rev().chain(seam.iter().rev()))
            }
        }
    }
}
