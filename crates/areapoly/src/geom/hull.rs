use std::cmp::Ordering;

use super::predicates::orient;
use super::types::{lex_cmp, Point, Polygon};

/// Andrew's monotone chain hull of `ids` (indices into `points`), counterclockwise.
///
/// Points on hull edges are dropped (strict turns only). Returns fewer than
/// three ids when the input is collinear or has fewer than three distinct points.
pub fn convex_hull(points: &[Point], ids: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = ids.to_vec();
    order.sort_by(|&a, &b| match lex_cmp(&points[a], &points[b]) {
        Ordering::Equal => a.cmp(&b),
        o => o,
    });
    order.dedup_by(|a, b| points[*a] == points[*b]);
    if order.len() < 3 {
        return order;
    }
    let mut lower: Vec<usize> = Vec::with_capacity(order.len());
    for &i in &order {
        while lower.len() >= 2
            && orient(
                points[lower[lower.len() - 2]],
                points[lower[lower.len() - 1]],
                points[i],
            ) <= 0.0
        {
            lower.pop();
        }
        lower.push(i);
    }
    let mut upper: Vec<usize> = Vec::with_capacity(order.len());
    for &i in order.iter().rev() {
        while upper.len() >= 2
            && orient(
                points[upper[upper.len() - 2]],
                points[upper[upper.len() - 1]],
                points[i],
            ) <= 0.0
        {
            upper.pop();
        }
        upper.push(i);
    }
    lower.pop();
    upper.pop();
    let mut hull = lower;
    hull.extend(upper);
    if hull.len() == 2 && hull[0] == hull[1] {
        hull.pop();
    }
    hull
}

/// Hull of `ids` that also keeps every point lying on a hull edge, counterclockwise.
///
/// Falls back to [`convex_hull`] when the input spans no proper triangle.
pub fn convex_hull_boundary(points: &[Point], ids: &[usize]) -> Vec<usize> {
    let strict = convex_hull(points, ids);
    if strict.len() < 3 {
        return strict;
    }
    let mut order: Vec<usize> = ids.to_vec();
    order.sort_by(|&a, &b| match lex_cmp(&points[a], &points[b]) {
        Ordering::Equal => a.cmp(&b),
        o => o,
    });
    order.dedup_by(|a, b| points[*a] == points[*b]);
    let chain = |iter: &mut dyn Iterator<Item = usize>| {
        let mut out: Vec<usize> = Vec::with_capacity(order.len());
        for i in iter {
            while out.len() >= 2
                && orient(points[out[out.len() - 2]], points[out[out.len() - 1]], points[i]) < 0.0
            {
                out.pop();
            }
            out.push(i);
        }
        out
    };
    let mut lower = chain(&mut order.iter().copied());
    let mut upper = chain(&mut order.iter().rev().copied());
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Area of the convex hull of `points` (0 for degenerate inputs).
pub fn convex_hull_area(points: &[Point]) -> f64 {
    let ids: Vec<usize> = (0..points.len()).collect();
    let hull = convex_hull(points, &ids);
    if hull.len() < 3 {
        return 0.0;
    }
    Polygon::new(hull.into_iter().map(|i| points[i]).collect()).area()
}

/// Nested convex layers, outermost first, plus the points left inside the last one.
#[derive(Clone, Debug, Default)]
pub struct ConvexLayers {
    /// Each layer is a counterclockwise hull with at least three vertices,
    /// including collinear boundary points.
    pub layers: Vec<Vec<usize>>,
    /// Points not assigned to any layer (inside the deepest layer).
    pub interior: Vec<usize>,
}

/// Peel up to `max_layers` convex hulls off `points`.
///
/// Each layer keeps the points on its edges, so the next layer lies strictly
/// inside it. Peeling stops early once the remaining points no longer span a proper
/// triangle; those points become `interior`.
pub fn convex_layers(points: &[Point], max_layers: usize) -> ConvexLayers {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut layers = Vec::new();
    while layers.len() < max_layers && remaining.len() >= 3 {
        let hull = convex_hull_boundary(points, &remaining);
        if hull.len() < 3 {
            break;
        }
        let mut on_hull = vec![false; points.len()];
        for &i in &hull {
            on_hull[i] = true;
        }
        remaining.retain(|&i| !on_hull[i]);
        layers.push(hull);
    }
    ConvexLayers {
        layers,
        interior: remaining,
    }
}
