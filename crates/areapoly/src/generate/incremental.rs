use rand::Rng;
use tracing::{debug, trace};

use super::{check_input, EdgeSelection, GenerateError, Initialization, PolygonGenerator};
use crate::geom::{orient, point_in_polygon, Containment, Point};
use crate::spatial::{Oracle, Ring};

/// Grow a polygon from a seed triangle by splitting one edge per point.
///
/// Points are visited in `initialization` order. Every edge whose split keeps
/// the ring simple is eligible; `selection` picks among them by the signed
/// area change of the split (negative when it cuts into the polygon, as it
/// does for a point already enclosed).
#[derive(Clone, Copy, Debug, Default)]
pub struct Incremental {
    pub selection: EdgeSelection,
    pub initialization: Initialization,
}

impl PolygonGenerator for Incremental {
    fn generate_order<R: Rng + ?Sized>(
        &self,
        points: &[Point],
        rng: &mut R,
    ) -> Result<Vec<usize>, GenerateError> {
        check_input(points)?;
        let order = self.initialization.order(points);
        let seed = seed_triangle(points, &order)?;
        let mut ring = Ring::from_cycle(points, &seed);
        let oracle = Oracle::new(points);
        let mut pending: Vec<usize> = order.into_iter().filter(|&i| !ring.contains(i)).collect();

        let mut pass = 0usize;
        while !pending.is_empty() {
            pass += 1;
            let mut deferred = Vec::new();
            for &x in &pending {
                if !insert_point(&mut ring, &oracle, x, self.selection, rng) {
                    deferred.push(x);
                }
            }
            if deferred.len() == pending.len() {
                return Err(GenerateError::NoFeasibleInsertion {
                    placed: ring.len(),
                    remaining: deferred.len(),
                });
            }
            if !deferred.is_empty() {
                debug!(pass, deferred = deferred.len(), "incremental pass deferred points");
            }
            pending = deferred;
        }
        Ok(ring.cycle_from(seed[0]))
    }
}

/// First three points of `order` that span a proper triangle, counterclockwise.
fn seed_triangle(points: &[Point], order: &[usize]) -> Result<[usize; 3], GenerateError> {
    let (a, b) = (order[0], order[1]);
    for &c in &order[2..] {
        let o = orient(points[a], points[b], points[c]);
        if o > 0.0 {
            return Ok([a, b, c]);
        }
        if o < 0.0 {
            return Ok([a, c, b]);
        }
    }
    Err(GenerateError::degenerate("all points are collinear"))
}

/// Split the best eligible edge with `x`; false when no edge is eligible.
fn insert_point<R: Rng + ?Sized>(
    ring: &mut Ring,
    oracle: &Oracle,
    x: usize,
    selection: EdgeSelection,
    rng: &mut R,
) -> bool {
    let Some(start) = ring.first() else {
        return false;
    };
    let cycle = ring.cycle_from(start);
    let px = ring.point(x);
    let boundary: Vec<Point> = cycle.iter().map(|&i| ring.point(i)).collect();
    // A point outside can only join through an edge it sees from outside,
    // an enclosed one only through an edge it sees from inside.
    let wanted_side = match point_in_polygon(px, &boundary) {
        Containment::Outside => -ring.twice_signed_area().signum(),
        Containment::Inside => ring.twice_signed_area().signum(),
        Containment::Boundary => 0.0,
    };
    let mut edges = Vec::new();
    let mut keys = Vec::new();
    for &a in &cycle {
        let b = ring.next(a);
        let o = orient(ring.point(a), ring.point(b), px);
        if wanted_side != 0.0 && o * wanted_side <= 0.0 {
            continue;
        }
        if oracle.accepts(ring, &[(a, b)], &[(a, x), (x, b)]) {
            edges.push(a);
            keys.push(split_gain(ring, a, x));
        }
    }
    let Some(k) = selection.pick(&keys, rng) else {
        trace!(point = x, "no eligible edge");
        return false;
    };
    ring.insert_after(edges[k], x);
    true
}

/// Change in enclosed area when `x` splits the edge `a -> next(a)`.
pub(crate) fn split_gain(ring: &Ring, a: usize, x: usize) -> f64 {
    let o = orient(ring.point(a), ring.point(ring.next(a)), ring.point(x));
    -0.5 * o * ring.twice_signed_area().signum()
}
