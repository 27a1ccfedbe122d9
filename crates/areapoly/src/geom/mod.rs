//! Planar geometry kernel (points, segments, simple polygons).
//!
//! Purpose
//! - Provide the few predicates the polygonization engine relies on: signed
//!   shoelace area, orientation, closed segment intersection, point-in-polygon
//!   and point-in-triangle tests, convex hulls and convex layers.
//! - Plain `f64` predicates; inputs in general position are assumed, but
//!   collinear contacts are still classified (touching counts as contact).
//!
//! Conventions
//! - `Point` is `nalgebra::Vector2<f64>`.
//! - Polygons are stored as an ordered vertex list with implicit wraparound.
//! - Hull routines return indices into the caller's point slice so the
//!   engine can keep working with point ids.
//!
//! Code cross-refs: `crate::spatial::Ring` (working polygon), `crate::spatial::Oracle`.

mod hull;
mod predicates;
mod types;

pub use hull::{convex_hull, convex_hull_area, convex_hull_boundary, convex_layers, ConvexLayers};
pub use predicates::{
    orient, point_in_polygon, point_in_triangle_strict, segments_intersect, Containment,
};
pub(crate) use types::lex_cmp;
pub use types::{Point, Polygon};

#[cfg(test)]
mod tests;
