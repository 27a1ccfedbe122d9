//! Area optimizers over simple polygons.
//!
//! Purpose
//! - Push an initial simple polygon toward minimum or maximum area relative to
//!   the convex hull of its vertices, without ever leaving the space of simple
//!   polygons.
//!
//! Why this design
//! - Each optimizer owns one `Ring` plus one `Oracle` for the duration of a
//!   run; every accepted edit is checked first, so every intermediate state
//!   is simple and the result needs no repair.
//! - Tuning knobs live in plain config structs with `Default` and
//!   `validate()`; `OptimizerCfg` selects one of them.
//! - Stochastic optimizers take their seed from the config and also expose a
//!   `*_with_rng` entry point generic over `R: Rng` for tests.
//! - Running out of valid moves is not an error: the run stops and the
//!   outcome says so (`StopReason::NoValidMove`).
//!
//! Code cross-refs: `spatial::{Ring, Oracle}`, `generate::PolygonGenerator`.

mod annealing;
mod colony;
mod local;

pub use annealing::{metropolis_accepts, AnnealingMode, SimulatedAnnealing};
pub use colony::{AntColony, ColonyContext};
pub use local::LocalSearch;

use std::fmt;
use std::str::FromStr;

use crate::generate::GenerateError;
use crate::geom::{Point, Polygon};

/// Which way the area should move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    Minimize,
    #[default]
    Maximize,
}

impl Direction {
    /// Gain of going from `before` to `after` (positive is better).
    #[inline]
    pub fn gain(&self, before: f64, after: f64) -> f64 {
        match self {
            Self::Minimize => before - after,
            Self::Maximize => after - before,
        }
    }

    /// True if `a` is strictly better than `b`.
    #[inline]
    pub fn better(&self, a: f64, b: f64) -> bool {
        self.gain(b, a) > 0.0
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Minimize => "min",
            Self::Maximize => "max",
        }
    }
}

impl FromStr for Direction {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" | "minimize" => Ok(Self::Minimize),
            "max" | "maximize" => Ok(Self::Maximize),
            other => Err(OptimizeError::invalid(format!(
                "unknown direction '{other}' (expected min|max)"
            ))),
        }
    }
}

/// Why an optimizer returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// `patience` consecutive passes improved by no more than the threshold.
    Converged,
    /// Pass budget used up.
    MaxPasses,
    /// Temperature reached zero.
    Cooled,
    /// Every candidate move in a full pass was invalid (or none improved).
    NoValidMove,
    /// All colony iterations ran.
    IterationsDone,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Converged => "converged",
            Self::MaxPasses => "max_passes",
            Self::Cooled => "cooled",
            Self::NoValidMove => "no_valid_move",
            Self::IterationsDone => "iterations_done",
        };
        f.write_str(s)
    }
}

/// Result of one optimizer run.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub polygon: Polygon,
    pub area: f64,
    /// Area of the polygon the run started from; `None` for the ant colony,
    /// which builds from scratch.
    pub initial_area: Option<f64>,
    pub stop: StopReason,
    /// Moves applied (local search, annealing) or complete walks (ant colony).
    pub steps: usize,
    /// Area after each pass (local search) or each new best (annealing, ant colony).
    pub history: Vec<f64>,
}

impl Outcome {
    /// `area / hull_area`.
    #[inline]
    pub fn ratio(&self, hull_area: f64) -> f64 {
        self.area / hull_area
    }
}

/// Error type shared by all optimizers.
#[derive(Clone, Debug, PartialEq)]
pub enum OptimizeError {
    InvalidParams { reason: String },
    /// The ant colony never completed a polygon.
    NoFeasibleInsertion { reason: String },
    /// The input could not be polygonized at all.
    Generate(GenerateError),
}

impl OptimizeError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParams { reason } => write!(f, "invalid optimizer params: {reason}"),
            Self::NoFeasibleInsertion { reason } => write!(f, "no feasible insertion: {reason}"),
            Self::Generate(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for OptimizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Generate(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GenerateError> for OptimizeError {
    fn from(e: GenerateError) -> Self {
        Self::Generate(e)
    }
}

/// Common interface of the optimizers.
pub trait PolygonOptimizer {
    /// Improve `initial` (assumed simple) toward the configured direction.
    fn optimize(&self, initial: &Polygon, hull_area: f64) -> Result<Outcome, OptimizeError>;
}

/// Optimizer selection plus its tuning knobs.
#[derive(Clone, Debug, PartialEq)]
pub enum OptimizerCfg {
    LocalSearch(LocalSearch),
    SimulatedAnnealing(SimulatedAnnealing),
    AntColony(AntColony),
}

impl Default for OptimizerCfg {
    fn default() -> Self {
        Self::LocalSearch(LocalSearch::default())
    }
}

impl OptimizerCfg {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalSearch(_) => "local_search",
            Self::SimulatedAnnealing(_) => "simulated_annealing",
            Self::AntColony(_) => "ant_colony",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::LocalSearch(c) => c.direction,
            Self::SimulatedAnnealing(c) => c.direction,
            Self::AntColony(c) => c.direction,
        }
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        match self {
            Self::LocalSearch(c) => c.validate(),
            Self::SimulatedAnnealing(c) => c.validate(),
            Self::AntColony(c) => c.validate(),
        }
    }
}

impl PolygonOptimizer for OptimizerCfg {
    fn optimize(&self, initial: &Polygon, hull_area: f64) -> Result<Outcome, OptimizeError> {
        match self {
            Self::LocalSearch(c) => c.optimize(initial, hull_area),
            Self::SimulatedAnnealing(c) => c.optimize(initial, hull_area),
            Self::AntColony(c) => c.optimize(initial, hull_area),
        }
    }
}

/// Shared input checks: at least a triangle, a usable hull area.
pub(crate) fn check_start(initial: &Polygon, hull_area: f64) -> Result<(), OptimizeError> {
    if initial.len() < 3 {
        return Err(GenerateError::degenerate(format!(
            "need at least 3 vertices, got {}",
            initial.len()
        ))
        .into());
    }
    if !(hull_area.is_finite() && hull_area > 0.0) {
        return Err(OptimizeError::invalid(format!(
            "hull area must be finite and > 0, got {hull_area}"
        )));
    }
    Ok(())
}

/// Polygon visiting `points` in `order`.
pub(crate) fn polygon_from_order(points: &[Point], order: &[usize]) -> Polygon {
    Polygon::new(order.iter().map(|&i| points[i]).collect())
}
