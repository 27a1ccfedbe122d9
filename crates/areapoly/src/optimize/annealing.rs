use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::str::FromStr;
use tracing::{debug, info};

use super::{check_start, polygon_from_order, Direction, OptimizeError, Outcome, PolygonOptimizer, StopReason};
use crate::geom::{lex_cmp, Point, Polygon};
use crate::spatial::{Oracle, Ring};

/// Re-sum the ring area after this many accepted moves.
const REFRESH_EVERY: usize = 4096;

/// Move family used by the annealer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnnealingMode {
    /// Swap two consecutive vertices.
    #[default]
    Local,
    /// Move one vertex into a random non-incident edge.
    Global,
    /// Local swaps, annealed slab by slab over vertical strips of points.
    Subdivision,
}

impl AnnealingMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
            Self::Subdivision => "subdivision",
        }
    }
}

impl FromStr for AnnealingMode {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" | "1" => Ok(Self::Local),
            "global" | "2" => Ok(Self::Global),
            "subdivision" | "3" => Ok(Self::Subdivision),
            other => Err(OptimizeError::invalid(format!(
                "unknown annealing mode '{other}' (expected local|global|subdivision)"
            ))),
        }
    }
}

/// Metropolis criterion: always take a non-worsening move, otherwise take it
/// iff `draw < exp(-delta_energy / temperature)`.
#[inline]
pub fn metropolis_accepts(delta_energy: f64, temperature: f64, draw: f64) -> bool {
    delta_energy <= 0.0 || (temperature > 0.0 && draw < (-delta_energy / temperature).exp())
}

/// Simulated annealing on the energy `n·A/H` (minimize) or `n·(1 − A/H)` (maximize).
///
/// The temperature starts at 1 and drops by `1 / cooling_steps` per trial.
/// Each trial looks for a valid move from a random position onward; if no
/// position yields one the run stops early. The lowest-energy state seen is
/// returned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulatedAnnealing {
    pub direction: Direction,
    /// Trials per schedule (`L`).
    pub cooling_steps: usize,
    pub mode: AnnealingMode,
    pub seed: u64,
    /// Points per slab in `Subdivision` mode.
    pub subdivision_size: usize,
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self {
            direction: Direction::Maximize,
            cooling_steps: 5_000,
            mode: AnnealingMode::Local,
            seed: 0,
            subdivision_size: 100,
        }
    }
}

impl SimulatedAnnealing {
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.cooling_steps == 0 {
            return Err(OptimizeError::invalid("cooling_steps must be >= 1"));
        }
        if self.mode == AnnealingMode::Subdivision && self.subdivision_size < 4 {
            return Err(OptimizeError::invalid("subdivision_size must be >= 4"));
        }
        Ok(())
    }

    /// Run with an explicit random source instead of the configured seed.
    pub fn optimize_with_rng<R: Rng + ?Sized>(
        &self,
        initial: &Polygon,
        hull_area: f64,
        rng: &mut R,
    ) -> Result<Outcome, OptimizeError> {
        self.validate()?;
        check_start(initial, hull_area)?;
        let points = &initial.vertices;
        let ids: Vec<usize> = (0..points.len()).collect();
        let mut annealer = Annealer::new(points, &ids, hull_area, self.direction);
        let initial_area = annealer.ring.area();

        let stop = if points.len() < 4 {
            StopReason::NoValidMove
        } else {
            match self.mode {
                AnnealingMode::Local | AnnealingMode::Global => {
                    let finished = annealer.schedule(&ids, None, self.mode, self.cooling_steps, rng);
                    if finished {
                        StopReason::Cooled
                    } else {
                        StopReason::NoValidMove
                    }
                }
                AnnealingMode::Subdivision => {
                    let slabs = slabs(points, self.subdivision_size);
                    let mut halted = 0usize;
                    let mut member = vec![false; points.len()];
                    for (k, slab) in slabs.iter().enumerate() {
                        for &i in slab {
                            member[i] = true;
                        }
                        let finished = annealer.schedule(
                            slab,
                            Some(&member),
                            AnnealingMode::Local,
                            self.cooling_steps,
                            rng,
                        );
                        if !finished {
                            halted += 1;
                        }
                        debug!(slab = k, size = slab.len(), finished, "annealed slab");
                        for &i in slab {
                            member[i] = false;
                        }
                    }
                    if halted == 0 {
                        StopReason::Cooled
                    } else {
                        StopReason::NoValidMove
                    }
                }
            }
        };
        if stop == StopReason::NoValidMove {
            info!("annealing: no valid move, stopping early");
        }

        let polygon = polygon_from_order(points, &annealer.best_order);
        let area = polygon.area();
        info!(
            mode = self.mode.name(),
            initial_area,
            area,
            accepted = annealer.accepted,
            stop = %stop,
            "annealing finished"
        );
        Ok(Outcome {
            polygon,
            area,
            initial_area: Some(initial_area),
            stop,
            steps: annealer.accepted,
            history: annealer.history,
        })
    }
}

impl PolygonOptimizer for SimulatedAnnealing {
    fn optimize(&self, initial: &Polygon, hull_area: f64) -> Result<Outcome, OptimizeError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.optimize_with_rng(initial, hull_area, &mut rng)
    }
}

/// Ids in x order, cut into runs of `size`; a short tail joins the previous run.
fn slabs(points: &[Point], size: usize) -> Vec<Vec<usize>> {
    let mut ids: Vec<usize> = (0..points.len()).collect();
    ids.sort_by(|&a, &b| lex_cmp(&points[a], &points[b]));
    let mut out: Vec<Vec<usize>> = ids.chunks(size).map(|c| c.to_vec()).collect();
    if out.len() > 1 && out.last().is_some_and(|c| c.len() < 4) {
        if let Some(tail) = out.pop() {
            if let Some(prev) = out.last_mut() {
                prev.extend(tail);
            }
        }
    }
    out
}

#[derive(Clone, Copy, Debug)]
enum Proposal {
    /// `q` and `next(q)` trade places.
    Swap { q: usize, delta: f64 },
    /// `q` moves between `target` and `next(target)`.
    Relocate { q: usize, target: usize, delta: f64 },
}

impl Proposal {
    fn delta(&self) -> f64 {
        match *self {
            Self::Swap { delta, .. } | Self::Relocate { delta, .. } => delta,
        }
    }
}

struct Annealer<'a> {
    ring: Ring<'a>,
    oracle: Oracle,
    hull_area: f64,
    direction: Direction,
    energy: f64,
    best_energy: f64,
    best_order: Vec<usize>,
    accepted: usize,
    history: Vec<f64>,
}

impl<'a> Annealer<'a> {
    fn new(points: &'a [Point], order: &[usize], hull_area: f64, direction: Direction) -> Self {
        let ring = Ring::from_cycle(points, order);
        let mut annealer = Self {
            oracle: Oracle::new(points),
            hull_area,
            direction,
            energy: 0.0,
            best_energy: 0.0,
            best_order: order.to_vec(),
            accepted: 0,
            history: Vec::new(),
            ring,
        };
        annealer.energy = annealer.energy_of(annealer.ring.twice_signed_area());
        annealer.best_energy = annealer.energy;
        annealer
    }

    fn energy_of(&self, twice_area: f64) -> f64 {
        let n = self.ring.len() as f64;
        let ratio = 0.5 * twice_area.abs() / self.hull_area;
        match self.direction {
            Direction::Minimize => n * ratio,
            Direction::Maximize => n * (1.0 - ratio),
        }
    }

    /// One full temperature schedule over moves anchored at `anchors`.
    ///
    /// Returns false if it stopped early for lack of a valid move.
    fn schedule<R: Rng + ?Sized>(
        &mut self,
        anchors: &[usize],
        member: Option<&[bool]>,
        mode: AnnealingMode,
        steps: usize,
        rng: &mut R,
    ) -> bool {
        let report_every = (steps / 10).max(1);
        for step in 0..steps {
            let temperature = 1.0 - step as f64 / steps as f64;
            if step % report_every == 0 {
                debug!(step, temperature, energy = self.energy, "annealing schedule");
            }
            let Some(proposal) = self.find_move(anchors, member, mode, rng) else {
                return false;
            };
            let next_energy = self.energy_of(self.ring.twice_signed_area() + proposal.delta());
            let draw: f64 = rng.gen();
            if metropolis_accepts(next_energy - self.energy, temperature, draw) {
                self.apply(proposal);
            }
        }
        true
    }

    /// First valid move scanning `anchors` cyclically from a random start.
    fn find_move<R: Rng + ?Sized>(
        &self,
        anchors: &[usize],
        member: Option<&[bool]>,
        mode: AnnealingMode,
        rng: &mut R,
    ) -> Option<Proposal> {
        let start = rng.gen_range(0..anchors.len());
        for k in 0..anchors.len() {
            let q = anchors[(start + k) % anchors.len()];
            let proposal = match mode {
                AnnealingMode::Global => {
                    let target = self.random_target(q, rng);
                    self.relocation(q, target)
                }
                _ => {
                    if member.is_some_and(|m| !m[self.ring.next(q)]) {
                        continue;
                    }
                    self.swap(q)
                }
            };
            if proposal.is_some() {
                return proposal;
            }
        }
        None
    }

    /// Uniform edge source other than `q` and `prev(q)`.
    fn random_target<R: Rng + ?Sized>(&self, q: usize, rng: &mut R) -> usize {
        let n = self.ring.len();
        let p = self.ring.prev(q);
        let (lo, hi) = if p < q { (p, q) } else { (q, p) };
        let mut s = rng.gen_range(0..n - 2);
        if s >= lo {
            s += 1;
        }
        if s >= hi {
            s += 1;
        }
        s
    }

    fn swap(&self, q: usize) -> Option<Proposal> {
        let ring = &self.ring;
        let p = ring.prev(q);
        let r = ring.next(q);
        let s = ring.next(r);
        let (pp, pq, pr, ps) = (ring.point(p), ring.point(q), ring.point(r), ring.point(s));
        if !self.oracle.accepts(ring, &[(p, q), (r, s)], &[(p, r), (q, s)]) {
            return None;
        }
        let delta = cross(pp, pr) + cross(pr, pq) + cross(pq, ps)
            - cross(pp, pq)
            - cross(pq, pr)
            - cross(pr, ps);
        Some(Proposal::Swap { q, delta })
    }

    fn relocation(&self, q: usize, s: usize) -> Option<Proposal> {
        let ring = &self.ring;
        let p = ring.prev(q);
        let r = ring.next(q);
        let t = ring.next(s);
        if !self
            .oracle
            .accepts(ring, &[(p, q), (q, r), (s, t)], &[(p, r), (s, q), (q, t)])
        {
            return None;
        }
        let (pp, pq, pr, ps, pt) = (
            ring.point(p),
            ring.point(q),
            ring.point(r),
            ring.point(s),
            ring.point(t),
        );
        let delta = cross(pp, pr) + cross(ps, pq) + cross(pq, pt)
            - cross(pp, pq)
            - cross(pq, pr)
            - cross(ps, pt);
        Some(Proposal::Relocate { q, target: s, delta })
    }

    fn apply(&mut self, proposal: Proposal) {
        match proposal {
            Proposal::Swap { q, .. } => self.ring.swap_with_next(q),
            Proposal::Relocate { q, target, .. } => self.ring.relocate_chain(q, q, target, false),
        }
        self.accepted += 1;
        if self.accepted % REFRESH_EVERY == 0 {
            self.ring.refresh_area();
        }
        self.energy = self.energy_of(self.ring.twice_signed_area());
        if self.energy < self.best_energy {
            self.best_energy = self.energy;
            self.best_order = self.ring.cycle_from(0);
            self.history.push(self.ring.area());
        }
    }
}

#[inline]
fn cross(p: Point, q: Point) -> f64 {
    p.x * q.y - q.x * p.y
}
