//! Pocket insertion: place waiting points into edges of an existing ring.
//!
//! Each ring edge caches its candidate: the nearest waiting point whose
//! triangle with the edge holds no other waiting point and whose insertion the
//! oracle accepts. Empty triangles keep most waiting points reachable, but not
//! all of them: a point can still end up with every edge it sees blocked. When
//! no edge has an empty-triangle candidate left, every edge is rescanned with
//! the oracle check alone, and only if that finds nothing does insertion fail.
//! Cached candidates go stale as the ring changes; they are re-checked when
//! picked and recomputed on failure.

use rand::Rng;
use tracing::debug;

use super::{EdgeSelection, GenerateError};
use crate::geom::{orient, point_in_triangle_strict, Point};
use crate::spatial::{Bbox, Oracle, Ring};

#[derive(Clone, Copy, Debug)]
struct Candidate {
    to: usize,
    point: usize,
    area: f64,
}

/// Insert every id in `waiting` into `ring` (a single cycle).
pub(crate) fn fill_pockets<R: Rng + ?Sized>(
    ring: &mut Ring,
    oracle: &Oracle,
    waiting: &[usize],
    selection: EdgeSelection,
    rng: &mut R,
) -> Result<(), GenerateError> {
    let n = ring.points().len();
    let mut is_waiting = vec![false; n];
    for &x in waiting {
        is_waiting[x] = true;
    }
    let mut left: Vec<usize> = waiting.to_vec();
    let mut cache: Vec<Option<Candidate>> = vec![None; n];
    refresh_all(ring, oracle, &left, &is_waiting, true, &mut cache);

    while !left.is_empty() {
        let live: Vec<usize> = (0..n).filter(|&a| cache[a].is_some()).collect();
        if live.is_empty() {
            refresh_all(ring, oracle, &left, &is_waiting, true, &mut cache);
            if (0..n).all(|a| cache[a].is_none()) {
                refresh_all(ring, oracle, &left, &is_waiting, false, &mut cache);
                if (0..n).any(|a| cache[a].is_some()) {
                    debug!(remaining = left.len(), "pocket insertion fell back to full edge scan");
                    continue;
                }
                return Err(GenerateError::NoFeasibleInsertion {
                    placed: ring.len(),
                    remaining: left.len(),
                });
            }
            continue;
        }
        let keys: Vec<f64> = live
            .iter()
            .filter_map(|&a| cache[a].map(|c| c.area))
            .collect();
        let Some(k) = selection.pick(&keys, rng) else {
            continue;
        };
        let a = live[k];
        let Some(c) = cache[a] else {
            continue;
        };
        let fresh = ring.contains(a)
            && ring.next(a) == c.to
            && is_waiting[c.point]
            && oracle.accepts(ring, &[(a, c.to)], &[(a, c.point), (c.point, c.to)]);
        if !fresh {
            cache[a] = candidate_for(ring, oracle, a, &left, &is_waiting, true);
            continue;
        }
        ring.insert_after(a, c.point);
        is_waiting[c.point] = false;
        if let Some(pos) = left.iter().position(|&x| x == c.point) {
            left.swap_remove(pos);
        }
        cache[a] = candidate_for(ring, oracle, a, &left, &is_waiting, true);
        cache[c.point] = candidate_for(ring, oracle, c.point, &left, &is_waiting, true);
    }
    debug!(vertices = ring.len(), "pocket insertion complete");
    Ok(())
}

fn refresh_all(
    ring: &Ring,
    oracle: &Oracle,
    left: &[usize],
    is_waiting: &[bool],
    empty_triangles: bool,
    cache: &mut [Option<Candidate>],
) {
    for (a, slot) in cache.iter_mut().enumerate() {
        *slot = if ring.contains(a) {
            candidate_for(ring, oracle, a, left, is_waiting, empty_triangles)
        } else {
            None
        };
    }
}

fn candidate_for(
    ring: &Ring,
    oracle: &Oracle,
    a: usize,
    left: &[usize],
    is_waiting: &[bool],
    empty_triangles: bool,
) -> Option<Candidate> {
    if left.is_empty() {
        return None;
    }
    let b = ring.next(a);
    let (pa, pb) = (ring.point(a), ring.point(b));
    let mut by_distance: Vec<(f64, usize)> = left
        .iter()
        .map(|&x| (segment_distance(ring.point(x), pa, pb), x))
        .collect();
    by_distance.sort_by(|l, r| l.0.partial_cmp(&r.0).unwrap_or(std::cmp::Ordering::Equal));
    for (dist, x) in by_distance {
        let px = ring.point(x);
        let twice = orient(pa, px, pb);
        // Collinear points only fit into the edge they lie on.
        if twice == 0.0 && dist > 0.0 {
            continue;
        }
        if empty_triangles && !triangle_is_empty(oracle, ring, is_waiting, x, pa, px, pb) {
            continue;
        }
        if oracle.accepts(ring, &[(a, b)], &[(a, x), (x, b)]) {
            return Some(Candidate {
                to: b,
                point: x,
                area: 0.5 * twice.abs(),
            });
        }
    }
    None
}

/// No waiting point other than `x` strictly inside triangle `(a, x, b)`.
pub(crate) fn triangle_is_empty(
    oracle: &Oracle,
    ring: &Ring,
    is_waiting: &[bool],
    x: usize,
    a: Point,
    p: Point,
    b: Point,
) -> bool {
    let window = Bbox::around([a, p, b]);
    let mut empty = true;
    oracle.tree().query(&window, |i| {
        if empty && i != x && is_waiting[i] && point_in_triangle_strict(ring.point(i), a, p, b) {
            empty = false;
        }
    });
    empty
}

/// Euclidean distance from `p` to the closed segment `ab`.
pub(crate) fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}
