//! Ant colony construction over partial polygons.
//!
//! The construction graph is built lazily. Its nodes are simple partial
//! polygons over a subset of the points; an arc inserts one more point into
//! one edge. An arc is only offered if the oracle accepts it, the area grows
//! (the new triangle lies outside the partial polygon) and the triangle holds
//! no other unplaced point, so every unplaced point stays outside and can
//! still be reached. Nodes are keyed by their canonical vertex cycle and
//! shared between walks; every parent that reaches a node is recorded, and
//! reinforcement of a complete polygon flows back through all recorded
//! ancestors.
//!
//! All run state (nodes, trails, best-so-far) lives in `ColonyContext`, one
//! per run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{check_start, polygon_from_order, Direction, OptimizeError, Outcome, PolygonOptimizer, StopReason};
use crate::generate::check_input;
use crate::geom::{orient, point_in_triangle_strict, Point, Polygon};
use crate::spatial::{Bbox, Oracle, Ring};

/// Ant colony parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AntColony {
    pub direction: Direction,
    /// Ants per iteration; 0 picks `n / 4` (at least one).
    pub colony_size: usize,
    pub iterations: usize,
    /// Trail exponent.
    pub alpha: f64,
    /// Heuristic exponent.
    pub beta: f64,
    /// Evaporation rate in `[0, 1]`.
    pub rho: f64,
    /// Reinforce the best polygon so far instead of the iteration's best.
    pub elitism: bool,
    pub deposit: f64,
    pub initial_trail: f64,
    /// Nearest neighbours combined into seed triangles per point.
    pub seed_neighbors: usize,
    pub seed: u64,
}

impl Default for AntColony {
    fn default() -> Self {
        Self {
            direction: Direction::Maximize,
            colony_size: 0,
            iterations: 50,
            alpha: 1.0,
            beta: 3.0,
            rho: 0.05,
            elitism: false,
            deposit: 1.0,
            initial_trail: 1.0,
            seed_neighbors: 4,
            seed: 0,
        }
    }
}

impl AntColony {
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.iterations == 0 {
            return Err(OptimizeError::invalid("iterations must be >= 1"));
        }
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(OptimizeError::invalid("alpha must be finite and >= 0"));
        }
        if !(self.beta.is_finite() && self.beta >= 0.0) {
            return Err(OptimizeError::invalid("beta must be finite and >= 0"));
        }
        if !(0.0..=1.0).contains(&self.rho) {
            return Err(OptimizeError::invalid("rho must lie in [0, 1]"));
        }
        if !(self.deposit.is_finite() && self.deposit >= 0.0) {
            return Err(OptimizeError::invalid("deposit must be finite and >= 0"));
        }
        if !(self.initial_trail.is_finite() && self.initial_trail > 0.0) {
            return Err(OptimizeError::invalid("initial_trail must be finite and > 0"));
        }
        if self.seed_neighbors < 2 {
            return Err(OptimizeError::invalid("seed_neighbors must be >= 2"));
        }
        Ok(())
    }

    /// Ants per iteration for `n` points.
    pub fn ants_for(&self, n: usize) -> usize {
        if self.colony_size == 0 {
            (n / 4).max(1)
        } else {
            self.colony_size
        }
    }

    /// Build polygons over the vertices of `initial` (their order is ignored).
    pub fn optimize_with_rng<R: Rng + ?Sized>(
        &self,
        initial: &Polygon,
        hull_area: f64,
        rng: &mut R,
    ) -> Result<Outcome, OptimizeError> {
        check_start(initial, hull_area)?;
        let points = &initial.vertices;
        let mut ctx = ColonyContext::new(points, hull_area, *self)?;
        for iteration in 0..self.iterations {
            let found = ctx.iterate(rng);
            debug!(
                iteration,
                found = found.is_some(),
                best = ctx.best_area(),
                nodes = ctx.node_count(),
                "colony iteration"
            );
        }
        let Some((order, _)) = ctx.best() else {
            return Err(OptimizeError::NoFeasibleInsertion {
                reason: format!(
                    "no ant completed a polygon in {} iterations ({} dead ends)",
                    self.iterations, ctx.dead_ends
                ),
            });
        };
        let polygon = polygon_from_order(points, order);
        let area = polygon.area();
        info!(
            area,
            completed = ctx.completed,
            dead_ends = ctx.dead_ends,
            nodes = ctx.node_count(),
            "ant colony finished"
        );
        Ok(Outcome {
            polygon,
            area,
            initial_area: None,
            stop: StopReason::IterationsDone,
            steps: ctx.completed,
            history: ctx.history.clone(),
        })
    }
}

impl PolygonOptimizer for AntColony {
    fn optimize(&self, initial: &Polygon, hull_area: f64) -> Result<Outcome, OptimizeError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.optimize_with_rng(initial, hull_area, &mut rng)
    }
}

#[derive(Clone, Copy, Debug)]
struct Arc {
    to: usize,
    heuristic: f64,
}

#[derive(Clone, Debug)]
struct Node {
    cycle: Vec<usize>,
    area: f64,
    trail: f64,
    parents: Vec<usize>,
    /// `None` until first visited.
    arcs: Option<Vec<Arc>>,
}

/// State of one colony run: the construction graph with its trails.
pub struct ColonyContext<'a> {
    points: &'a [Point],
    oracle: Oracle,
    hull_area: f64,
    cfg: AntColony,
    nodes: Vec<Node>,
    index: HashMap<Vec<usize>, usize>,
    roots: Vec<Arc>,
    best: Option<usize>,
    history: Vec<f64>,
    completed: usize,
    dead_ends: usize,
}

impl<'a> ColonyContext<'a> {
    /// Validate inputs and seed the graph with empty triangles.
    pub fn new(points: &'a [Point], hull_area: f64, cfg: AntColony) -> Result<Self, OptimizeError> {
        cfg.validate()?;
        check_input(points)?;
        let mut ctx = Self {
            points,
            oracle: Oracle::new(points),
            hull_area,
            cfg,
            nodes: Vec::new(),
            index: HashMap::new(),
            roots: Vec::new(),
            best: None,
            history: Vec::new(),
            completed: 0,
            dead_ends: 0,
        };
        ctx.seed_triangles();
        if ctx.roots.is_empty() {
            return Err(OptimizeError::NoFeasibleInsertion {
                reason: "no empty seed triangle".into(),
            });
        }
        debug!(seeds = ctx.roots.len(), "colony seeded");
        Ok(ctx)
    }

    fn seed_triangles(&mut self) {
        let n = self.points.len();
        for i in 0..n {
            let near = self.oracle.tree().nearest(i, self.cfg.seed_neighbors);
            for (k, &j) in near.iter().enumerate() {
                for &l in &near[k + 1..] {
                    let (a, b, c) = (self.points[i], self.points[j], self.points[l]);
                    let twice = orient(a, b, c);
                    if twice == 0.0 || !self.triangle_clear(&[i, j, l], a, b, c, None) {
                        continue;
                    }
                    let (node, fresh) = self.intern(vec![i, j, l], 0.5 * twice.abs(), None);
                    if fresh {
                        let heuristic = self.heuristic(self.nodes[node].area);
                        self.roots.push(Arc { to: node, heuristic });
                    }
                }
            }
        }
    }

    /// No point strictly inside triangle `(a, b, c)` apart from `skip`,
    /// counting only points outside `placed` when given.
    fn triangle_clear(&self, skip: &[usize], a: Point, b: Point, c: Point, placed: Option<&[bool]>) -> bool {
        let mut clear = true;
        self.oracle.tree().query(&Bbox::around([a, b, c]), |i| {
            if clear
                && !skip.contains(&i)
                && placed.map_or(true, |m| !m[i])
                && point_in_triangle_strict(self.points[i], a, b, c)
            {
                clear = false;
            }
        });
        clear
    }

    /// Heuristic desirability of adding `delta` area.
    fn heuristic(&self, delta: f64) -> f64 {
        let scaled = delta / self.hull_area;
        match self.cfg.direction {
            Direction::Maximize => scaled,
            Direction::Minimize => 1.0 / scaled,
        }
    }

    /// How good a complete polygon of `area` is, in `[0, 1]`.
    pub fn quality(&self, area: f64) -> f64 {
        let ratio = (area / self.hull_area).clamp(0.0, 1.0);
        match self.cfg.direction {
            Direction::Maximize => ratio,
            Direction::Minimize => 1.0 - ratio,
        }
    }

    /// Node for `cycle`, created if unseen; records `parent`.
    fn intern(&mut self, cycle: Vec<usize>, area: f64, parent: Option<usize>) -> (usize, bool) {
        let key = canonical(&cycle);
        let (id, fresh) = match self.index.get(&key) {
            Some(&id) => (id, false),
            None => {
                let id = self.nodes.len();
                self.nodes.push(Node {
                    cycle: key.clone(),
                    area,
                    trail: self.cfg.initial_trail,
                    parents: Vec::new(),
                    arcs: None,
                });
                self.index.insert(key, id);
                (id, true)
            }
        };
        if let Some(p) = parent {
            if !self.nodes[id].parents.contains(&p) {
                self.nodes[id].parents.push(p);
            }
        }
        (id, fresh)
    }

    /// Compute the arcs out of `node` once.
    fn expand(&mut self, node: usize) {
        if self.nodes[node].arcs.is_some() {
            return;
        }
        let cycle = self.nodes[node].cycle.clone();
        let area = self.nodes[node].area;
        let ring = Ring::from_cycle(self.points, &cycle);
        let side = ring.twice_signed_area().signum();
        let mut placed = vec![false; self.points.len()];
        for &i in &cycle {
            placed[i] = true;
        }
        let mut found: Vec<(usize, usize, f64)> = Vec::new();
        for &a in &cycle {
            let b = ring.next(a);
            let (pa, pb) = (self.points[a], self.points[b]);
            for x in (0..self.points.len()).filter(|&x| !placed[x]) {
                let px = self.points[x];
                let twice = orient(pa, pb, px);
                if twice * side >= 0.0 {
                    continue;
                }
                if !self.triangle_clear(&[x], pa, px, pb, Some(&placed)) {
                    continue;
                }
                if self.oracle.accepts(&ring, &[(a, b)], &[(a, x), (x, b)]) {
                    found.push((a, x, 0.5 * twice.abs()));
                }
            }
        }
        let mut arcs = Vec::with_capacity(found.len());
        for (a, x, delta) in found {
            let mut child = Vec::with_capacity(cycle.len() + 1);
            for &v in &cycle {
                child.push(v);
                if v == a {
                    child.push(x);
                }
            }
            let (to, _) = self.intern(child, area + delta, Some(node));
            arcs.push(Arc {
                to,
                heuristic: self.heuristic(delta),
            });
        }
        self.nodes[node].arcs = Some(arcs);
    }

    fn weights(&self, arcs: &[Arc]) -> Vec<f64> {
        arcs.iter()
            .map(|arc| {
                self.nodes[arc.to].trail.powf(self.cfg.alpha) * arc.heuristic.powf(self.cfg.beta)
            })
            .collect()
    }

    /// One ant from the root to a complete polygon; `None` on a dead end.
    pub fn walk<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        let n = self.points.len();
        let weights = self.weights(&self.roots);
        let mut node = self.roots[roulette(&weights, rng)].to;
        loop {
            if self.nodes[node].cycle.len() == n {
                return Some(node);
            }
            self.expand(node);
            let arcs = self.nodes[node].arcs.as_deref().unwrap_or(&[]);
            if arcs.is_empty() {
                return None;
            }
            let weights = self.weights(arcs);
            node = arcs[roulette(&weights, rng)].to;
        }
    }

    /// Add `amount` to the trail of `node` and of every recorded ancestor.
    pub fn reinforce(&mut self, node: usize, amount: f64) {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![node];
        seen[node] = true;
        while let Some(k) = stack.pop() {
            self.nodes[k].trail += amount;
            for &p in &self.nodes[k].parents {
                if !seen[p] {
                    seen[p] = true;
                    stack.push(p);
                }
            }
        }
    }

    /// Scale every trail by `1 - rho`.
    pub fn evaporate(&mut self) {
        let keep = 1.0 - self.cfg.rho;
        for node in &mut self.nodes {
            node.trail *= keep;
        }
    }

    /// One colony iteration: walk every ant, reinforce, evaporate.
    ///
    /// Returns the iteration's best complete node.
    pub fn iterate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        let direction = self.cfg.direction;
        let mut iteration_best: Option<usize> = None;
        for _ in 0..self.cfg.ants_for(self.points.len()) {
            let Some(done) = self.walk(rng) else {
                self.dead_ends += 1;
                continue;
            };
            self.completed += 1;
            let area = self.nodes[done].area;
            if iteration_best.map_or(true, |b| direction.better(area, self.nodes[b].area)) {
                iteration_best = Some(done);
            }
        }
        if let Some(ib) = iteration_best {
            let area = self.nodes[ib].area;
            if self.best.map_or(true, |b| direction.better(area, self.nodes[b].area)) {
                self.best = Some(ib);
                self.history.push(area);
            }
        }
        let target = if self.cfg.elitism {
            self.best
        } else {
            iteration_best
        };
        if let Some(t) = target {
            let amount = self.cfg.deposit * self.quality(self.nodes[t].area);
            self.reinforce(t, amount);
        }
        self.evaporate();
        iteration_best
    }

    pub fn trail(&self, node: usize) -> f64 {
        self.nodes[node].trail
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node ids of the seed triangles.
    pub fn seed_nodes(&self) -> Vec<usize> {
        self.roots.iter().map(|arc| arc.to).collect()
    }

    /// Parents recorded for `node`.
    pub fn parents(&self, node: usize) -> &[usize] {
        &self.nodes[node].parents
    }

    /// Vertex cycle of the best complete polygon so far and its area.
    pub fn best(&self) -> Option<(&[usize], f64)> {
        self.best
            .map(|b| (self.nodes[b].cycle.as_slice(), self.nodes[b].area))
    }

    pub fn best_area(&self) -> Option<f64> {
        self.best.map(|b| self.nodes[b].area)
    }
}

/// Index drawn with probability proportional to `weights`.
///
/// Falls back to uniform when the weights carry no mass, and to the last
/// entry when rounding leaves the draw past the cumulative sum.
fn roulette<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return rng.gen_range(0..weights.len());
    }
    let draw = rng.gen::<f64>() * total;
    let mut acc = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        acc += w;
        if draw < acc {
            return i;
        }
    }
    weights.len() - 1
}

/// Rotation starting at the smallest id, direction with the smaller neighbour second.
fn canonical(cycle: &[usize]) -> Vec<usize> {
    let n = cycle.len();
    let start = cycle
        .iter()
        .enumerate()
        .min_by_key(|&(_, &v)| v)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let forward = cycle[(start + 1) % n] < cycle[(start + n - 1) % n];
    (0..n)
        .map(|k| {
            if forward {
                cycle[(start + k) % n]
            } else {
                cycle[(start + n - k) % n]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_ignores_rotation_and_direction() {
        let a = canonical(&[3, 1, 4, 2]);
        assert_eq!(a, vec![1, 3, 2, 4]);
        assert_eq!(canonical(&[4, 2, 3, 1]), a);
        assert_eq!(canonical(&[2, 4, 1, 3]), a);
    }

    #[test]
    fn roulette_follows_weights_and_falls_back() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(roulette(&[0.0, 0.0, 5.0], &mut rng), 2);
        let mut hits = [0usize; 2];
        for _ in 0..2000 {
            hits[roulette(&[1.0, 3.0], &mut rng)] += 1;
        }
        assert!(hits[1] > 2 * hits[0]);
        // No mass at all: still a valid index.
        assert!(roulette(&[0.0, 0.0], &mut rng) < 2);
    }
}
