use super::types::Point;

/// Twice the signed area of triangle `(a, b, c)`; positive for a left turn.
#[inline]
pub fn orient(a: Point, b: Point, c: Point) -> f64 {
    let ab = b - a;
    let ac = c - a;
    ab.x * ac.y - ab.y * ac.x
}

/// `p` lies within the bounding box of segment `ab` (callers ensure collinearity).
#[inline]
fn within_box(p: Point, a: Point, b: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Closed segment intersection: touching endpoints and collinear overlap count.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let d1 = orient(c, d, a);
    let d2 = orient(c, d, b);
    let d3 = orient(a, b, c);
    let d4 = orient(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && within_box(a, c, d))
        || (d2 == 0.0 && within_box(b, c, d))
        || (d3 == 0.0 && within_box(c, a, b))
        || (d4 == 0.0 && within_box(d, a, b))
}

/// Strictly inside triangle `(a, b, c)` (either orientation); boundary is outside.
pub fn point_in_triangle_strict(p: Point, a: Point, b: Point, c: Point) -> bool {
    let o1 = orient(a, b, p);
    let o2 = orient(b, c, p);
    let o3 = orient(c, a, p);
    (o1 > 0.0 && o2 > 0.0 && o3 > 0.0) || (o1 < 0.0 && o2 < 0.0 && o3 < 0.0)
}

/// Where a point sits relative to a closed polygon boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Containment {
    Inside,
    Boundary,
    Outside,
}

/// Crossing-number test with an explicit boundary check.
pub fn point_in_polygon(p: Point, vertices: &[Point]) -> Containment {
    let n = vertices.len();
    if n == 0 {
        return Containment::Outside;
    }
    let mut inside = false;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        if orient(a, b, p) == 0.0 && within_box(p, a, b) {
            return Containment::Boundary;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    if inside {
        Containment::Inside
    } else {
        Containment::Outside
    }
}
