use rand::Rng;
use tracing::debug;

use super::pocket::fill_pockets;
use super::{check_input, EdgeSelection, GenerateError, PolygonGenerator};
use crate::geom::{convex_hull, Point};
use crate::spatial::{Oracle, Ring};

/// Start from the convex hull and carve every interior point into it.
///
/// Each insertion cuts a triangle off the polygon, so `EdgeSelection::Min`
/// keeps the area large and `Max` drives it down.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConvexHullInsertion {
    pub selection: EdgeSelection,
}

impl PolygonGenerator for ConvexHullInsertion {
    fn generate_order<R: Rng + ?Sized>(
        &self,
        points: &[Point],
        rng: &mut R,
    ) -> Result<Vec<usize>, GenerateError> {
        check_input(points)?;
        let ids: Vec<usize> = (0..points.len()).collect();
        let hull = convex_hull(points, &ids);
        let mut ring = Ring::from_cycle(points, &hull);
        let interior: Vec<usize> = ids.into_iter().filter(|&i| !ring.contains(i)).collect();
        debug!(
            hull = hull.len(),
            interior = interior.len(),
            "convex hull generator"
        );
        let oracle = Oracle::new(points);
        fill_pockets(&mut ring, &oracle, &interior, self.selection, rng)?;
        Ok(ring.cycle_from(hull[0]))
    }
}
