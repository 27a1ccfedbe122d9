use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::{debug, info};

use super::{check_start, polygon_from_order, Direction, OptimizeError, Outcome, PolygonOptimizer, StopReason};
use crate::geom::{Point, Polygon};
use crate::spatial::{Oracle, Ring};

/// Moves ranked per scan; a pass rescans below the last band only when the
/// whole band was rejected by the oracle.
const BAND: usize = 4096;

/// Best-improvement chain relocation.
///
/// A move cuts a chain of `1..=max_chain` consecutive vertices out from
/// between `p` and `q` and reinserts it into another edge `(u, w)`, forward or
/// reversed. Each pass ranks every improving move by gain (ties: shorter
/// chain) and applies the best one the oracle accepts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalSearch {
    pub direction: Direction,
    /// A pass whose relative area gain is at most this counts as stale.
    pub threshold: f64,
    /// Consecutive stale passes before stopping.
    pub patience: usize,
    /// Longest chain moved in one step (`L`).
    pub max_chain: usize,
    pub max_passes: usize,
}

impl Default for LocalSearch {
    fn default() -> Self {
        Self {
            direction: Direction::Maximize,
            threshold: 1e-4,
            patience: 1,
            max_chain: 3,
            max_passes: 10_000,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Relocation {
    first: usize,
    last: usize,
    len: usize,
    target: usize,
    reversed: bool,
    gain: f64,
}

impl Relocation {
    /// Greater is better: larger gain, then shorter chain, then a fixed id order.
    fn rank(&self, other: &Self) -> Ordering {
        self.gain
            .partial_cmp(&other.gain)
            .unwrap_or(Ordering::Equal)
            .then(other.len.cmp(&self.len))
            .then(other.first.cmp(&self.first))
            .then(other.target.cmp(&self.target))
            .then(other.reversed.cmp(&self.reversed))
    }
}

struct Ranked(Relocation);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.0.rank(&other.0) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rank(&other.0)
    }
}

impl LocalSearch {
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if !(self.threshold.is_finite() && self.threshold >= 0.0) {
            return Err(OptimizeError::invalid("threshold must be finite and >= 0"));
        }
        if self.patience == 0 {
            return Err(OptimizeError::invalid("patience must be >= 1"));
        }
        if self.max_chain == 0 {
            return Err(OptimizeError::invalid("max_chain must be >= 1"));
        }
        if self.max_passes == 0 {
            return Err(OptimizeError::invalid("max_passes must be >= 1"));
        }
        Ok(())
    }

    /// All improving moves ranked strictly below `ceiling`, best first, at most `BAND`.
    fn collect_band(&self, ring: &Ring, order: &[usize], ceiling: Option<&Relocation>) -> Vec<Relocation> {
        let n = order.len();
        let s = ring.twice_signed_area();
        let area = 0.5 * s.abs();
        let floor = 1e-9 * area.max(f64::MIN_POSITIVE);
        let pt = |i: usize| ring.point(order[i % n]);
        let mut heap: BinaryHeap<Reverse<Ranked>> = BinaryHeap::new();
        let mut offer = |m: Relocation| {
            if ceiling.is_some_and(|c| m.rank(c) != Ordering::Less) {
                return;
            }
            if heap.len() < BAND {
                heap.push(Reverse(Ranked(m)));
            } else if heap.peek().is_some_and(|Reverse(worst)| m.rank(&worst.0) == Ordering::Greater) {
                heap.pop();
                heap.push(Reverse(Ranked(m)));
            }
        };
        let longest = self.max_chain.min(n.saturating_sub(3));
        for i in 0..n {
            let p = pt(i + n - 1);
            let c1 = pt(i);
            let mut internal = 0.0;
            for k in 1..=longest {
                let ck = pt(i + k - 1);
                if k > 1 {
                    internal += cross(pt(i + k - 2), ck);
                }
                let q = pt(i + k);
                let cut = cross(p, q) - cross(p, c1) - cross(ck, q);
                for t in (i + k)..(i + n - 1) {
                    let u = pt(t);
                    let w = pt(t + 1);
                    let open = cut - cross(u, w);
                    let forward = open + cross(u, c1) + cross(ck, w);
                    let mut candidates = [(false, forward), (true, 0.0)];
                    let tries = if k > 1 {
                        candidates[1].1 = open + cross(u, ck) + cross(c1, w) - 2.0 * internal;
                        2
                    } else {
                        1
                    };
                    for &(reversed, delta) in &candidates[..tries] {
                        let gain = self.direction.gain(area, 0.5 * (s + delta).abs());
                        if gain > floor {
                            offer(Relocation {
                                first: order[i % n],
                                last: order[(i + k - 1) % n],
                                len: k,
                                target: order[t % n],
                                reversed,
                                gain,
                            });
                        }
                    }
                }
            }
        }
        let mut band: Vec<Relocation> = heap.into_iter().map(|Reverse(Ranked(m))| m).collect();
        band.sort_by(|a, b| b.rank(a));
        band
    }

    /// Best improving move the oracle accepts.
    fn best_valid(&self, ring: &Ring, oracle: &Oracle, order: &[usize]) -> Option<Relocation> {
        let mut ceiling: Option<Relocation> = None;
        loop {
            let band = self.collect_band(ring, order, ceiling.as_ref());
            for m in &band {
                if accepts(ring, oracle, m) {
                    return Some(*m);
                }
            }
            if band.len() < BAND {
                return None;
            }
            ceiling = band.last().copied();
        }
    }

    fn run(&self, points: &[Point]) -> Outcome {
        let ids: Vec<usize> = (0..points.len()).collect();
        let mut ring = Ring::from_cycle(points, &ids);
        let oracle = Oracle::new(points);
        let initial_area = ring.area();
        let mut history = Vec::new();
        let mut stale = 0usize;
        let mut steps = 0usize;
        let mut stop = StopReason::MaxPasses;

        for pass in 1..=self.max_passes {
            let order = ring.cycle_from(0);
            let before = ring.area();
            let Some(m) = self.best_valid(&ring, &oracle, &order) else {
                info!(pass, area = before, "local search: no valid improving move");
                stop = StopReason::NoValidMove;
                break;
            };
            ring.relocate_chain(m.first, m.last, m.target, m.reversed);
            steps += 1;
            let after = ring.area();
            history.push(after);
            let relative = self.direction.gain(before, after) / before;
            debug!(pass, area = after, relative, chain = m.len, "local search pass");
            if relative <= self.threshold {
                stale += 1;
                if stale >= self.patience {
                    stop = StopReason::Converged;
                    break;
                }
            } else {
                stale = 0;
            }
        }
        ring.refresh_area();
        let polygon = polygon_from_order(points, &ring.cycle_from(0));
        let area = polygon.area();
        info!(
            initial_area,
            area,
            steps,
            stop = %stop,
            "local search finished"
        );
        Outcome {
            polygon,
            area,
            initial_area: Some(initial_area),
            stop,
            steps,
            history,
        }
    }
}

impl PolygonOptimizer for LocalSearch {
    fn optimize(&self, initial: &Polygon, hull_area: f64) -> Result<Outcome, OptimizeError> {
        self.validate()?;
        check_start(initial, hull_area)?;
        Ok(self.run(&initial.vertices))
    }
}

fn accepts(ring: &Ring, oracle: &Oracle, m: &Relocation) -> bool {
    let p = ring.prev(m.first);
    let q = ring.next(m.last);
    let u = m.target;
    let w = ring.next(u);
    let added = if m.reversed {
        [(p, q), (u, m.last), (m.first, w)]
    } else {
        [(p, q), (u, m.first), (m.last, w)]
    };
    oracle.accepts(ring, &[(p, m.first), (m.last, q), (u, w)], &added)
}

#[inline]
fn cross(p: Point, q: Point) -> f64 {
    p.x * q.y - q.x * p.y
}
