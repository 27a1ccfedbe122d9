use crate::geom::{orient, segments_intersect, Point};

use super::kdtree::{Bbox, KdTree};
use super::ring::Ring;

/// Local simplicity check for ring edits.
///
/// An edit removes a set of ring edges and adds a set of new edges (unordered
/// id pairs). It is accepted iff, after the edit, no added edge conflicts with
/// another added edge or with any surviving ring edge.
///
/// Only edges near the edit are inspected: any ring edge that meets an added
/// edge has both endpoints within the ring's longest edge of the added edge's
/// bounding box, so a kd-tree range query over that widened box, restricted to
/// ring members, finds the source vertex of every candidate edge.
#[derive(Clone, Debug)]
pub struct Oracle {
    tree: KdTree,
}

impl Oracle {
    pub fn new(points: &[Point]) -> Self {
        Self {
            tree: KdTree::build(points),
        }
    }

    #[inline]
    pub fn tree(&self) -> &KdTree {
        &self.tree
    }

    /// Would replacing `removed` by `added` keep `ring` simple?
    pub fn accepts(&self, ring: &Ring, removed: &[(usize, usize)], added: &[(usize, usize)]) -> bool {
        for (i, &e) in added.iter().enumerate() {
            if e.0 == e.1 || ring.point(e.0) == ring.point(e.1) {
                return false;
            }
            for &f in &added[i + 1..] {
                if conflicts(ring, e, f) {
                    return false;
                }
            }
        }
        if added.is_empty() {
            return true;
        }
        let window = Bbox::around(added.iter().flat_map(|&(a, b)| [ring.point(a), ring.point(b)]))
            .expanded(ring.max_edge_len());
        let mut ok = true;
        self.tree.query(&window, |v| {
            if !ok || !ring.contains(v) {
                return;
            }
            let edge = (v, ring.next(v));
            if removed.iter().any(|&r| same_edge(r, edge)) {
                return;
            }
            if added.iter().any(|&f| conflicts(ring, edge, f)) {
                ok = false;
            }
        });
        ok
    }
}

#[inline]
fn same_edge(a: (usize, usize), b: (usize, usize)) -> bool {
    (a.0 == b.0 && a.1 == b.1) || (a.0 == b.1 && a.1 == b.0)
}

/// Two edges may share one endpoint and then only conflict when they overlap
/// along a common line; otherwise any closed contact is a conflict.
fn conflicts(ring: &Ring, e: (usize, usize), f: (usize, usize)) -> bool {
    let shared = [e.0 == f.0, e.0 == f.1, e.1 == f.0, e.1 == f.1];
    match shared.iter().filter(|&&s| s).count() {
        0 => segments_intersect(
            ring.point(e.0),
            ring.point(e.1),
            ring.point(f.0),
            ring.point(f.1),
        ),
        1 => {
            let (s, u, w) = if shared[0] {
                (e.0, e.1, f.1)
            } else if shared[1] {
                (e.0, e.1, f.0)
            } else if shared[2] {
                (e.1, e.0, f.1)
            } else {
                (e.1, e.0, f.0)
            };
            let (ps, pu, pw) = (ring.point(s), ring.point(u), ring.point(w));
            orient(ps, pu, pw) == 0.0 && (pu - ps).dot(&(pw - ps)) > 0.0
        }
        _ => true,
    }
}
