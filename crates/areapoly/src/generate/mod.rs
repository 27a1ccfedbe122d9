//! Initial simple polygons from raw point sets.
//!
//! Purpose
//! - Turn every input point into a vertex of one simple polygon, as a starting
//!   state for the optimizers.
//!
//! Why this design
//! - All three generators grow a `Ring` by local edits and ask the `Oracle`
//!   before every edit, so simplicity holds after each step rather than being
//!   repaired at the end.
//! - Generators produce id orders (`generate_order`); the polygon is the
//!   order mapped onto positions. Optimizers and the ant colony reuse the
//!   id-level entry points.
//! - `EdgeSelection` ranks candidate edits by the area of the triangle they
//!   add or cut. For Incremental that triangle grows the polygon, for
//!   ConvexHull it shrinks it, so the same policy name drives the two
//!   generators in opposite directions.
//!
//! Code cross-refs: `spatial::{Ring, Oracle}`, `geom::{convex_hull, convex_layers}`.

mod hull;
mod incremental;
mod onion;
mod pocket;

pub use hull::ConvexHullInsertion;
pub use incremental::Incremental;
pub use onion::Onion;

use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::geom::{convex_hull, lex_cmp, Point, Polygon};

/// Error type shared by all generators.
#[derive(Clone, Debug, PartialEq)]
pub enum GenerateError {
    /// Fewer than three points, all points collinear, duplicates or non-finite coordinates.
    DegenerateInput { reason: String },
    /// Some points could not be placed without breaking simplicity.
    NoFeasibleInsertion { placed: usize, remaining: usize },
    InvalidParams { reason: String },
}

impl GenerateError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateInput { reason } => write!(f, "degenerate input: {reason}"),
            Self::NoFeasibleInsertion { placed, remaining } => write!(
                f,
                "no feasible insertion: {placed} points placed, {remaining} could not be inserted"
            ),
            Self::InvalidParams { reason } => write!(f, "invalid generator params: {reason}"),
        }
    }
}

impl std::error::Error for GenerateError {}

/// How a generator picks among the edits that keep the ring simple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeSelection {
    /// Uniform among valid edits.
    #[default]
    Random,
    /// Smallest triangle added or cut.
    Min,
    /// Largest triangle added or cut.
    Max,
}

impl EdgeSelection {
    /// Index of the chosen entry in `keys`, or `None` when empty.
    pub(crate) fn pick<R: Rng + ?Sized>(&self, keys: &[f64], rng: &mut R) -> Option<usize> {
        if keys.is_empty() {
            return None;
        }
        let by_key = |a: &(usize, &f64), b: &(usize, &f64)| {
            a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal)
        };
        match self {
            Self::Random => Some(rng.gen_range(0..keys.len())),
            Self::Min => keys.iter().enumerate().min_by(by_key).map(|(i, _)| i),
            Self::Max => keys.iter().enumerate().max_by(by_key).map(|(i, _)| i),
        }
    }
}

impl FromStr for EdgeSelection {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" | "1" => Ok(Self::Random),
            "min" | "2" => Ok(Self::Min),
            "max" | "3" => Ok(Self::Max),
            other => Err(GenerateError::invalid(format!(
                "unknown edge selection '{other}' (expected random|min|max)"
            ))),
        }
    }
}

/// Point order for the incremental generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Initialization {
    #[default]
    XAscending,
    XDescending,
    YAscending,
    YDescending,
}

impl Initialization {
    /// All ids sorted by this policy; ties broken by the other axis.
    pub fn order(&self, points: &[Point]) -> Vec<usize> {
        let mut ids: Vec<usize> = (0..points.len()).collect();
        let swapped = |p: &Point| Point::new(p.y, p.x);
        match self {
            Self::XAscending => ids.sort_by(|&a, &b| lex_cmp(&points[a], &points[b])),
            Self::XDescending => ids.sort_by(|&a, &b| lex_cmp(&points[b], &points[a])),
            Self::YAscending => {
                ids.sort_by(|&a, &b| lex_cmp(&swapped(&points[a]), &swapped(&points[b])))
            }
            Self::YDescending => {
                ids.sort_by(|&a, &b| lex_cmp(&swapped(&points[b]), &swapped(&points[a])))
            }
        }
        ids
    }
}

impl FromStr for Initialization {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x-asc" | "a1" => Ok(Self::XAscending),
            "x-desc" | "a2" => Ok(Self::XDescending),
            "y-asc" | "b1" => Ok(Self::YAscending),
            "y-desc" | "b2" => Ok(Self::YDescending),
            other => Err(GenerateError::invalid(format!(
                "unknown initialization '{other}' (expected x-asc|x-desc|y-asc|y-desc)"
            ))),
        }
    }
}

/// Which generator to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GeneratorKind {
    #[default]
    Incremental,
    ConvexHull,
    Onion,
}

impl GeneratorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::ConvexHull => "convex_hull",
            Self::Onion => "onion",
        }
    }
}

impl FromStr for GeneratorKind {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "incremental" => Ok(Self::Incremental),
            "convex_hull" | "hull" => Ok(Self::ConvexHull),
            "onion" => Ok(Self::Onion),
            other => Err(GenerateError::invalid(format!(
                "unknown generator '{other}' (expected incremental|convex-hull|onion)"
            ))),
        }
    }
}

/// Generator selection plus its tuning knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeneratorCfg {
    pub kind: GeneratorKind,
    pub edge_selection: EdgeSelection,
    /// Incremental only.
    pub initialization: Initialization,
    /// Onion only: layers peeled before the remaining points are inserted.
    pub layer_depth: usize,
}

impl Default for GeneratorCfg {
    fn default() -> Self {
        Self {
            kind: GeneratorKind::Incremental,
            edge_selection: EdgeSelection::Random,
            initialization: Initialization::XAscending,
            layer_depth: usize::MAX,
        }
    }
}

impl GeneratorCfg {
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.kind == GeneratorKind::Onion && self.layer_depth == 0 {
            return Err(GenerateError::invalid("layer_depth must be >= 1"));
        }
        Ok(())
    }

    /// Run the configured generator on `points`.
    pub fn generate_order<R: Rng + ?Sized>(
        &self,
        points: &[Point],
        rng: &mut R,
    ) -> Result<Vec<usize>, GenerateError> {
        self.validate()?;
        match self.kind {
            GeneratorKind::Incremental => Incremental {
                selection: self.edge_selection,
                initialization: self.initialization,
            }
            .generate_order(points, rng),
            GeneratorKind::ConvexHull => ConvexHullInsertion {
                selection: self.edge_selection,
            }
            .generate_order(points, rng),
            GeneratorKind::Onion => Onion {
                selection: self.edge_selection,
                layer_depth: self.layer_depth,
            }
            .generate_order(points, rng),
        }
    }
}

impl PolygonGenerator for GeneratorCfg {
    fn generate_order<R: Rng + ?Sized>(
        &self,
        points: &[Point],
        rng: &mut R,
    ) -> Result<Vec<usize>, GenerateError> {
        GeneratorCfg::generate_order(self, points, rng)
    }
}

/// Common interface of the polygon generators.
pub trait PolygonGenerator {
    /// Cyclic vertex order over all of `points`, as point ids.
    fn generate_order<R: Rng + ?Sized>(
        &self,
        points: &[Point],
        rng: &mut R,
    ) -> Result<Vec<usize>, GenerateError>;

    fn generate<R: Rng + ?Sized>(
        &self,
        points: &[Point],
        rng: &mut R,
    ) -> Result<Polygon, GenerateError> {
        let order = self.generate_order(points, rng)?;
        Ok(Polygon::new(order.into_iter().map(|i| points[i]).collect()))
    }
}

/// Reject inputs no generator can polygonize.
pub fn check_input(points: &[Point]) -> Result<(), GenerateError> {
    if points.len() < 3 {
        return Err(GenerateError::degenerate(format!(
            "need at least 3 points, got {}",
            points.len()
        )));
    }
    if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(GenerateError::degenerate("non-finite coordinate"));
    }
    let mut sorted = points.to_vec();
    sorted.sort_by(lex_cmp);
    if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(GenerateError::degenerate(format!(
            "duplicate point ({}, {})",
            w[0].x, w[0].y
        )));
    }
    let ids: Vec<usize> = (0..points.len()).collect();
    if convex_hull(points, &ids).len() < 3 {
        return Err(GenerateError::degenerate("all points are collinear"));
    }
    Ok(())
}
