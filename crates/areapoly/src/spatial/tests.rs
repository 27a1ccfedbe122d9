use super::*;
use crate::geom::Point;
use nalgebra::vector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
    raw.iter().map(|&(x, y)| vector![x, y]).collect()
}

fn random_points(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| vector![rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)])
        .collect()
}

#[test]
fn kdtree_query_matches_linear_scan() {
    let p = random_points(500, 7);
    let tree = KdTree::build(&p);
    assert_eq!(tree.len(), 500);
    let boxes = [
        Bbox { min: vector![10.0, 10.0], max: vector![30.0, 45.0] },
        Bbox { min: vector![-5.0, -5.0], max: vector![200.0, 200.0] },
        Bbox { min: vector![50.0, 50.0], max: vector![50.5, 50.5] },
    ];
    for b in &boxes {
        let mut got = Vec::new();
        tree.query(b, |i| got.push(i));
        got.sort_unstable();
        let want: Vec<usize> = (0..p.len()).filter(|&i| b.contains(p[i])).collect();
        assert_eq!(got, want);
    }
}

#[test]
fn kdtree_nearest_is_sorted_by_distance() {
    let p = random_points(200, 3);
    let tree = KdTree::build(&p);
    let got = tree.nearest(0, 5);
    assert_eq!(got.len(), 5);
    let mut all: Vec<(f64, usize)> = (1..p.len()).map(|i| ((p[i] - p[0]).norm(), i)).collect();
    all.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    let want: Vec<usize> = all.iter().take(5).map(|&(_, i)| i).collect();
    assert_eq!(got, want);
}

#[test]
fn ring_tracks_area_and_lengths() {
    let p = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (2.0, 2.0)]);
    let mut ring = Ring::from_cycle(&p, &[0, 1, 2, 3]);
    assert_eq!(ring.len(), 4);
    assert!((ring.area() - 16.0).abs() < 1e-12);
    assert!((ring.max_edge_len() - 4.0).abs() < 1e-12);

    ring.insert_after(3, 4);
    assert_eq!(ring.cycle_from(0), vec![0, 1, 2, 3, 4]);
    assert!((ring.area() - 12.0).abs() < 1e-12);
    assert!(ring.to_polygon().is_simple());

    ring.remove(4);
    assert!(!ring.contains(4));
    assert!((ring.area() - 16.0).abs() < 1e-12);
    assert!((ring.max_edge_len() - 4.0).abs() < 1e-12);
}

#[test]
fn ring_relocate_and_swap() {
    let p = pts(&[
        (0.0, 0.0),
        (1.0, 0.0),
        (2.0, 0.0),
        (3.0, 0.0),
        (3.0, 1.0),
        (0.0, 1.0),
    ]);
    let mut ring = Ring::from_cycle(&p, &[0, 1, 2, 3, 4, 5]);
    ring.relocate_chain(1, 2, 4, false);
    assert_eq!(ring.cycle_from(0), vec![0, 3, 4, 1, 2, 5]);
    ring.relocate_chain(1, 2, 5, true);
    assert_eq!(ring.cycle_from(0), vec![0, 3, 4, 5, 2, 1]);
    ring.swap_with_next(2);
    assert_eq!(ring.cycle_from(0), vec![0, 3, 4, 5, 1, 2]);

    let mut fresh = ring.clone();
    fresh.refresh_area();
    assert!((fresh.twice_signed_area() - ring.twice_signed_area()).abs() < 1e-9);
}

#[test]
fn ring_splice_merges_cycles() {
    let p = pts(&[
        (0.0, 0.0),
        (10.0, 0.0),
        (10.0, 10.0),
        (0.0, 10.0),
        (4.0, 4.0),
        (6.0, 4.0),
        (5.0, 6.0),
    ]);
    let mut ring = Ring::from_cycle(&p, &[0, 1, 2, 3]);
    // Inner layer clockwise so the spliced boundary stays consistent.
    ring.add_cycle(&[4, 6, 5]);
    assert_eq!(ring.len(), 7);
    // Outer edge 0 -> 1, inner edge 5 -> 4.
    ring.splice(0, 5);
    let order = ring.cycle_from(0);
    assert_eq!(order, vec![0, 4, 6, 5, 1, 2, 3]);
    let poly = ring.to_polygon();
    assert!(poly.is_simple());
    assert!((poly.area() - 74.0).abs() < 1e-9);
    assert!((ring.area() - 74.0).abs() < 1e-9);
}

#[test]
fn ring_remove_cycle_restores_aggregates() {
    let p = pts(&[
        (0.0, 0.0),
        (10.0, 0.0),
        (10.0, 10.0),
        (0.0, 10.0),
        (4.0, 4.0),
        (6.0, 4.0),
        (5.0, 6.0),
    ]);
    let mut ring = Ring::from_cycle(&p, &[0, 1, 2, 3]);
    ring.add_cycle(&[4, 6, 5]);
    ring.remove_cycle(6);
    assert_eq!(ring.len(), 4);
    assert!(!ring.contains(4) && !ring.contains(5) && !ring.contains(6));
    assert!((ring.area() - 100.0).abs() < 1e-9);
    assert!((ring.max_edge_len() - 10.0).abs() < 1e-12);
}

#[test]
fn oracle_rejects_crossing_insertions() {
    // Square with a notch reaching in to 4.
    let p = pts(&[
        (0.0, 0.0),
        (10.0, 0.0),
        (10.0, 10.0),
        (0.0, 10.0),
        (5.0, 5.0),
        (12.0, 5.0),
        (-3.0, 5.0),
    ]);
    let ring = Ring::from_cycle(&p, &[0, 1, 2, 3, 4]);
    let oracle = Oracle::new(&p);
    assert!(oracle.accepts(&ring, &[(1, 2)], &[(1, 5), (5, 2)]));
    assert!(oracle.accepts(&ring, &[(4, 0)], &[(4, 6), (6, 0)]));
    // Reaching 5 from the notch crosses edge (1, 2).
    assert!(!oracle.accepts(&ring, &[(4, 0)], &[(4, 5), (5, 0)]));
}

#[test]
fn oracle_rejects_collinear_fold_and_accepts_shared_endpoint() {
    let p = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (2.0, 0.0), (2.0, -1.0)]);
    let ring = Ring::from_cycle(&p, &[0, 1, 2, 3]);
    let oracle = Oracle::new(&p);
    // Point 4 lies on edge (0, 1): inserting it there is degenerate-but-simple.
    assert!(oracle.accepts(&ring, &[(0, 1)], &[(0, 4), (4, 1)]));
    // Inserting 4 into (3, 0) produces edge (4, 0) overlapping (0, 1).
    assert!(!oracle.accepts(&ring, &[(3, 0)], &[(3, 4), (4, 0)]));
    // Pocket below the bottom edge shares endpoints only.
    assert!(oracle.accepts(&ring, &[(0, 1)], &[(0, 5), (5, 1)]));
}

#[test]
fn oracle_agrees_with_brute_force_on_random_edits() {
    let p = random_points(60, 11);
    let ids: Vec<usize> = (0..p.len()).collect();
    let hull = crate::geom::convex_hull(&p, &ids);
    let mut ring = Ring::from_cycle(&p, &hull);
    let oracle = Oracle::new(&p);
    let mut rng = StdRng::seed_from_u64(5);
    let mut outside: Vec<usize> = ids.into_iter().filter(|&i| !ring.contains(i)).collect();
    let mut checked = 0;
    while let Some(x) = outside.pop() {
        let order = ring.cycle_from(ring.first().unwrap());
        let start = rng.gen_range(0..order.len());
        for k in 0..order.len() {
            let a = order[(start + k) % order.len()];
            let b = ring.next(a);
            let verdict = oracle.accepts(&ring, &[(a, b)], &[(a, x), (x, b)]);
            let mut trial = ring.clone();
            trial.insert_after(a, x);
            assert_eq!(verdict, trial.to_polygon().is_simple(), "edge ({a},{b}) point {x}");
            checked += 1;
            if verdict {
                ring = trial;
                break;
            }
        }
    }
    assert!(checked > 40);
}
