use rand::Rng;
use tracing::{debug, trace};

use super::pocket::fill_pockets;
use super::{check_input, EdgeSelection, GenerateError, PolygonGenerator};
use crate::geom::{convex_layers, Point};
use crate::spatial::{Oracle, Ring};

/// Peel convex layers and splice them into one boundary, outermost first.
///
/// Layer `i` is added as its own cycle with orientation opposite to layer
/// `i - 1`, then one of its edges `(w, u)` and an intact edge `(a, b)` of the
/// enclosing layer are exchanged for the bridges `(a, u)` and `(w, b)`. Layers
/// hold their collinear boundary points, so each lies strictly inside the one
/// before it. Points left inside the deepest layer, and any layer for which no
/// bridge is accepted, fill pockets of the merged ring. With
/// `layer_depth == 1` this reduces to `ConvexHullInsertion`.
#[derive(Clone, Copy, Debug)]
pub struct Onion {
    pub selection: EdgeSelection,
    pub layer_depth: usize,
}

impl Default for Onion {
    fn default() -> Self {
        Self {
            selection: EdgeSelection::Random,
            layer_depth: usize::MAX,
        }
    }
}

impl PolygonGenerator for Onion {
    fn generate_order<R: Rng + ?Sized>(
        &self,
        points: &[Point],
        rng: &mut R,
    ) -> Result<Vec<usize>, GenerateError> {
        check_input(points)?;
        if self.layer_depth == 0 {
            return Err(GenerateError::invalid("layer_depth must be >= 1"));
        }
        let peeled = convex_layers(points, self.layer_depth);
        let Some(outer) = peeled.layers.first() else {
            return Err(GenerateError::degenerate("all points are collinear"));
        };
        let oracle = Oracle::new(points);
        let mut ring = Ring::from_cycle(points, outer);
        let mut layer_of = vec![usize::MAX; points.len()];
        for (depth, layer) in peeled.layers.iter().enumerate() {
            for &i in layer {
                layer_of[i] = depth;
            }
        }

        let mut waiting = Vec::new();
        let mut spliced = 1;
        for (depth, layer) in peeled.layers.iter().enumerate().skip(1) {
            let mut cycle = layer.clone();
            if depth % 2 == 1 {
                cycle.reverse();
            }
            ring.add_cycle(&cycle);
            if !bridge(&mut ring, &oracle, &cycle, depth, &layer_of, rng) {
                // This layer and everything inside it go through pocket insertion.
                ring.remove_cycle(cycle[0]);
                trace!(depth, "no bridge accepted");
                for deeper in &peeled.layers[depth..] {
                    waiting.extend_from_slice(deeper);
                }
                break;
            }
            spliced += 1;
        }
        waiting.extend_from_slice(&peeled.interior);
        debug!(
            layers = peeled.layers.len(),
            spliced,
            waiting = waiting.len(),
            "onion layers spliced"
        );
        fill_pockets(&mut ring, &oracle, &waiting, self.selection, rng)?;
        Ok(ring.cycle_from(outer[0]))
    }
}

/// Splice the cycle `inner` (layer `depth`) into the enclosing layer.
///
/// Tries inner edges starting from a random one; for each, intact outer
/// edges are tried nearest first until the oracle accepts the bridges.
fn bridge<R: Rng + ?Sized>(
    ring: &mut Ring,
    oracle: &Oracle,
    inner: &[usize],
    depth: usize,
    layer_of: &[usize],
    rng: &mut R,
) -> bool {
    let n = ring.points().len();
    let outer_edges: Vec<usize> = (0..n)
        .filter(|&a| {
            ring.contains(a) && layer_of[a] == depth - 1 && layer_of[ring.next(a)] == depth - 1
        })
        .collect();
    let start = rng.gen_range(0..inner.len());
    for k in 0..inner.len() {
        let w = inner[(start + k) % inner.len()];
        let u = ring.next(w);
        let mid = (ring.point(w) + ring.point(u)) * 0.5;
        let mut nearest: Vec<(f64, usize)> = outer_edges
            .iter()
            .map(|&a| {
                let m = (ring.point(a) + ring.point(ring.next(a))) * 0.5;
                ((m - mid).norm(), a)
            })
            .collect();
        nearest.sort_by(|l, r| l.0.partial_cmp(&r.0).unwrap_or(std::cmp::Ordering::Equal));
        for (_, a) in nearest {
            let b = ring.next(a);
            if oracle.accepts(ring, &[(a, b), (w, u)], &[(a, u), (w, b)]) {
                ring.splice(a, w);
                return true;
            }
        }
    }
    false
}
