use super::*;
use nalgebra::vector;

fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
    raw.iter().map(|&(x, y)| vector![x, y]).collect()
}

#[test]
fn shoelace_area_square_both_orientations() {
    let ccw = Polygon::new(pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]));
    assert!((ccw.signed_area() - 100.0).abs() < 1e-12);
    let mut cw = ccw.clone();
    cw.vertices.reverse();
    assert!((cw.signed_area() + 100.0).abs() < 1e-12);
    assert!((cw.area() - 100.0).abs() < 1e-12);
}

#[test]
fn segment_intersection_cases() {
    let p = pts(&[(0.0, 0.0), (2.0, 2.0), (0.0, 2.0), (2.0, 0.0)]);
    assert!(segments_intersect(p[0], p[1], p[2], p[3]));
    // Touching at an endpoint counts.
    let q = pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (2.0, 1.0)]);
    assert!(segments_intersect(q[0], q[1], q[2], q[3]));
    // Collinear overlap counts, collinear disjoint does not.
    let r = pts(&[(0.0, 0.0), (2.0, 0.0), (1.0, 0.0), (3.0, 0.0)]);
    assert!(segments_intersect(r[0], r[1], r[2], r[3]));
    let s = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
    assert!(!segments_intersect(s[0], s[1], s[2], s[3]));
    // Parallel, apart.
    let t = pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
    assert!(!segments_intersect(t[0], t[1], t[2], t[3]));
}

#[test]
fn containment_and_triangle() {
    let square = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
    assert_eq!(point_in_polygon(vector![1.0, 1.0], &square), Containment::Inside);
    assert_eq!(point_in_polygon(vector![4.0, 2.0], &square), Containment::Boundary);
    assert_eq!(point_in_polygon(vector![5.0, 2.0], &square), Containment::Outside);

    let (a, b, c) = (vector![0.0, 0.0], vector![4.0, 0.0], vector![0.0, 4.0]);
    assert!(point_in_triangle_strict(vector![1.0, 1.0], a, b, c));
    assert!(point_in_triangle_strict(vector![1.0, 1.0], a, c, b));
    assert!(!point_in_triangle_strict(vector![2.0, 0.0], a, b, c));
    assert!(!point_in_triangle_strict(vector![3.0, 3.0], a, b, c));
}

#[test]
fn simplicity_detects_bowtie_and_folds() {
    let square = Polygon::new(pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]));
    assert!(square.is_simple());
    let bowtie = Polygon::new(pts(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)]));
    assert!(!bowtie.is_simple());
    let flat = Polygon::new(pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]));
    assert!(!flat.is_simple());
    // Spike folding back over its predecessor edge.
    let folded = Polygon::new(pts(&[(0.0, 0.0), (2.0, 0.0), (1.0, 0.0), (1.0, 1.0)]));
    assert!(!folded.is_simple());
}

#[test]
fn hull_drops_interior_and_collinear() {
    let p = pts(&[
        (0.0, 0.0),
        (2.0, 0.0),
        (4.0, 0.0),
        (4.0, 4.0),
        (0.0, 4.0),
        (1.0, 1.0),
    ]);
    let ids: Vec<usize> = (0..p.len()).collect();
    let hull = convex_hull(&p, &ids);
    assert_eq!(hull.len(), 4);
    assert!(!hull.contains(&1));
    assert!(!hull.contains(&5));
    assert!((convex_hull_area(&p) - 16.0).abs() < 1e-12);
    let poly = Polygon::new(hull.iter().map(|&i| p[i]).collect());
    assert!(poly.signed_area() > 0.0);
}

#[test]
fn boundary_hull_keeps_edge_points_in_order() {
    let p = pts(&[
        (0.0, 0.0),
        (10.0, 0.0),
        (10.0, 10.0),
        (0.0, 10.0),
        (5.0, 0.0),
        (0.0, 5.0),
        (5.0, 5.0),
    ]);
    let ids: Vec<usize> = (0..p.len()).collect();
    assert_eq!(convex_hull_boundary(&p, &ids), vec![0, 4, 1, 2, 3, 5]);
    // Collinear input has no boundary beyond the strict hull.
    let line = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
    assert_eq!(convex_hull_boundary(&line, &[0, 1, 2]).len(), 2);
}

#[test]
fn layers_take_points_on_enclosing_edges() {
    let p = pts(&[
        (0.0, 0.0),
        (10.0, 0.0),
        (10.0, 10.0),
        (0.0, 10.0),
        (5.0, 0.0),
        (5.0, 5.0),
        (4.0, 6.0),
    ]);
    let layers = convex_layers(&p, usize::MAX);
    assert_eq!(layers.layers.len(), 1);
    assert!(layers.layers[0].contains(&4));
    assert_eq!(layers.interior.len(), 2);
}

#[test]
fn layers_nest_and_leave_interior() {
    let p = pts(&[
        (0.0, 0.0),
        (10.0, 0.0),
        (10.0, 10.0),
        (0.0, 10.0),
        (3.0, 3.0),
        (7.0, 3.0),
        (5.0, 7.0),
        (5.0, 4.5),
    ]);
    let all = convex_layers(&p, 5);
    assert_eq!(all.layers.len(), 2);
    assert_eq!(all.layers[0].len(), 4);
    assert_eq!(all.layers[1].len(), 3);
    assert_eq!(all.interior, vec![7]);

    let shallow = convex_layers(&p, 1);
    assert_eq!(shallow.layers.len(), 1);
    assert_eq!(shallow.interior.len(), 4);
}
