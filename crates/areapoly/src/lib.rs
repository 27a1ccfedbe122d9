//! Area-optimal simple polygons over planar point sets.
//!
//! Given a set of points, build a simple polygon that uses every point as a
//! vertex, then push its area toward the minimum or maximum relative to the
//! convex hull.
//!
//! Layout
//! - `geom`: points, polygons, predicates, hulls.
//! - `spatial`: kd-tree, the mutable `Ring` and the simplicity `Oracle`.
//! - `generate`: Incremental, ConvexHull and Onion initial polygons.
//! - `optimize`: LocalSearch, SimulatedAnnealing and AntColony.
//! - `api`: seeded one-call entry points used by the CLI.
//!
//! API Policy
//! - This crate is project-internal. There is no stable public API.

pub mod api;
pub mod generate;
pub mod geom;
pub mod optimize;
pub mod spatial;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use geom::{Point, Polygon};

/// Common exports for callers.
pub mod prelude {
    pub use crate::api::{convex_hull_area, generate_polygon, optimize_polygon};
    pub use crate::generate::{
        EdgeSelection, GenerateError, GeneratorCfg, GeneratorKind, Initialization,
        PolygonGenerator,
    };
    pub use crate::geom::{Point, Polygon};
    pub use crate::optimize::{
        AnnealingMode, AntColony, Direction, LocalSearch, OptimizeError, OptimizerCfg, Outcome,
        PolygonOptimizer, SimulatedAnnealing, StopReason,
    };
}
