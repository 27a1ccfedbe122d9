//! Point and polygon value types.

use nalgebra::Vector2;
use std::cmp::Ordering;

use super::predicates::{orient, segments_intersect};

/// A point in the plane.
pub type Point = Vector2<f64>;

/// Closed polygon given by its vertices in boundary order.
///
/// Invariants (for every polygon the engine hands out):
/// - at least three vertices, each input point exactly once;
/// - simple: no two non-adjacent edges touch, adjacent edges only share
///   their common endpoint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

impl Polygon {
    #[inline]
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Shoelace sum; positive for counterclockwise boundaries.
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0.0;
        for i in 0..n {
            let p = self.vertices[i];
            let q = self.vertices[(i + 1) % n];
            twice += p.x * q.y - q.x * p.y;
        }
        0.5 * twice
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Edges `(v_i, v_{i+1})` with wraparound.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Brute-force simplicity check, O(n²).
    ///
    /// The engine never needs this on its hot path (the oracle guards every
    /// edit); it exists for tests and for validating externally supplied
    /// polygons.
    pub fn is_simple(&self) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        for (p, q) in self.edges() {
            if p == q {
                return false;
            }
        }
        if n == 3 {
            return orient(self.vertices[0], self.vertices[1], self.vertices[2]) != 0.0;
        }
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            for j in (i + 1)..n {
                let c = self.vertices[j];
                let d = self.vertices[(j + 1) % n];
                let next_of_i = j == (i + 1) % n;
                let next_of_j = i == (j + 1) % n;
                if next_of_i || next_of_j {
                    // Adjacent edges share one vertex; they conflict only if they fold back.
                    let (shared, u, v) = if next_of_i { (b, a, d) } else { (a, b, c) };
                    if orient(shared, u, v) == 0.0 && (u - shared).dot(&(v - shared)) > 0.0 {
                        return false;
                    }
                    continue;
                }
                if segments_intersect(a, b, c, d) {
                    return false;
                }
            }
        }
        true
    }

    /// True iff the vertex multiset equals `points` (exact coordinate match).
    pub fn covers_exactly(&self, points: &[Point]) -> bool {
        if self.vertices.len() != points.len() {
            return false;
        }
        let mut lhs = self.vertices.clone();
        let mut rhs = points.to_vec();
        lhs.sort_by(lex_cmp);
        rhs.sort_by(lex_cmp);
        lhs == rhs
    }
}

/// Lexicographic (x, then y) order on points; NaN compares equal.
#[inline]
pub(crate) fn lex_cmp(a: &Point, b: &Point) -> Ordering {
    match a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal) {
        Ordering::Equal => a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal),
        o => o,
    }
}
