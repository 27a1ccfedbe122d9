//! Seeded one-call entry points (UNSTABLE).
//!
//! The CLI and benches go through these; library code may use the
//! generator and optimizer traits directly.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::generate::{GenerateError, GeneratorCfg, PolygonGenerator};
use crate::geom::{Point, Polygon};
use crate::optimize::{OptimizeError, OptimizerCfg, Outcome, PolygonOptimizer};

pub use crate::geom::convex_hull_area;

/// Simple polygon through every point of `points`, built by `cfg`.
///
/// The same `(points, cfg, seed)` always yields the same polygon.
pub fn generate_polygon(
    points: &[Point],
    cfg: &GeneratorCfg,
    seed: u64,
) -> Result<Polygon, GenerateError> {
    cfg.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    cfg.generate(points, &mut rng)
}

/// Run the optimizer selected by `cfg` on `initial`.
///
/// `hull_area` is the convex hull area of the vertex set; it normalizes the
/// annealing energy and the ant colony quality.
pub fn optimize_polygon(
    initial: &Polygon,
    hull_area: f64,
    cfg: &OptimizerCfg,
) -> Result<Outcome, OptimizeError> {
    cfg.validate()?;
    cfg.optimize(initial, hull_area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{EdgeSelection, GeneratorKind, Initialization};
    use crate::optimize::{AnnealingMode, Direction, LocalSearch, SimulatedAnnealing};
    use nalgebra::vector;

    fn square() -> Vec<Point> {
        vec![
            vector![0.0, 0.0],
            vector![10.0, 0.0],
            vector![10.0, 10.0],
            vector![0.0, 10.0],
        ]
    }

    fn non_convex() -> Vec<Point> {
        let mut pts = square();
        pts.push(vector![3.0, 5.0]);
        pts.push(vector![7.0, 4.0]);
        pts
    }

    #[test]
    fn square_polygonizes_to_its_hull() {
        let points = square();
        let hull = convex_hull_area(&points);
        for kind in [GeneratorKind::Incremental, GeneratorKind::ConvexHull, GeneratorKind::Onion] {
            let cfg = GeneratorCfg {
                kind,
                ..GeneratorCfg::default()
            };
            let poly = generate_polygon(&points, &cfg, 1).unwrap();
            assert!((poly.area() - 100.0).abs() < 1e-9, "{kind:?}");
            assert!((poly.area() / hull - 1.0).abs() < 1e-12);
            assert!(poly.covers_exactly(&points));
        }
    }

    #[test]
    fn local_search_minimizes_non_convex_input() {
        let points = non_convex();
        let hull = convex_hull_area(&points);
        let cfg = GeneratorCfg {
            kind: GeneratorKind::Incremental,
            edge_selection: EdgeSelection::Min,
            initialization: Initialization::XAscending,
            ..GeneratorCfg::default()
        };
        let initial = generate_polygon(&points, &cfg, 0).unwrap();
        let opt = OptimizerCfg::LocalSearch(LocalSearch {
            direction: Direction::Minimize,
            ..LocalSearch::default()
        });
        let out = optimize_polygon(&initial, hull, &opt).unwrap();
        assert!(out.polygon.is_simple());
        assert!(out.polygon.covers_exactly(&points));
        assert!(out.area < hull);
        assert!(out.area <= initial.area() + 1e-9);
        assert_eq!(out.initial_area, Some(initial.area()));
    }

    #[test]
    fn annealing_is_reproducible_for_a_seed() {
        let points = non_convex();
        let hull = convex_hull_area(&points);
        let initial = generate_polygon(&points, &GeneratorCfg::default(), 3).unwrap();
        let opt = OptimizerCfg::SimulatedAnnealing(SimulatedAnnealing {
            direction: Direction::Maximize,
            mode: AnnealingMode::Local,
            cooling_steps: 400,
            seed: 42,
            ..SimulatedAnnealing::default()
        });
        let a = optimize_polygon(&initial, hull, &opt).unwrap();
        let b = optimize_polygon(&initial, hull, &opt).unwrap();
        assert_eq!(a.polygon, b.polygon);
        assert_eq!(a.area, b.area);
        assert!(a.area >= initial.area() - 1e-9);
    }

    #[test]
    fn invalid_configs_surface_as_errors() {
        let points = square();
        let cfg = GeneratorCfg {
            kind: GeneratorKind::Onion,
            layer_depth: 0,
            ..GeneratorCfg::default()
        };
        assert!(matches!(
            generate_polygon(&points, &cfg, 0),
            Err(GenerateError::InvalidParams { .. })
        ));
        assert!(matches!(
            generate_polygon(&points[..2], &GeneratorCfg::default(), 0),
            Err(GenerateError::DegenerateInput { .. })
        ));
    }
}
