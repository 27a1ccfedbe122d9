//! Batch comparison of the seven generator/optimizer combinations.
//!
//! Every instance file is solved once per combination for each direction.
//! Scores are `area / hull_area`; they are summed per point count, and the
//! bounds keep the worst score seen (largest for minimization, smallest for
//! maximization).

use anyhow::{Context, Result};
use areapoly::prelude::*;
use clap::ValueEnum;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Parameter preset for the batch run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Random edge selection, coarse local search (threshold 0.7, L 5),
    /// 500-step local annealing, default colony.
    Default,
    /// Edge selection matched to the direction and local-search knobs scaled
    /// by instance size.
    Tuned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Combination {
    IncrementalLocal,
    IncrementalAnnealing,
    HullLocal,
    HullAnnealing,
    OnionLocal,
    OnionAnnealing,
    AntColony,
}

impl Combination {
    pub const ALL: [Combination; 7] = [
        Self::IncrementalLocal,
        Self::IncrementalAnnealing,
        Self::HullLocal,
        Self::HullAnnealing,
        Self::OnionLocal,
        Self::OnionAnnealing,
        Self::AntColony,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::IncrementalLocal => "Incremental & Local Search",
            Self::IncrementalAnnealing => "Incremental & Simulated Annealing",
            Self::HullLocal => "Convex Hull & Local Search",
            Self::HullAnnealing => "Convex Hull & Simulated Annealing",
            Self::OnionLocal => "Onion & Local Search",
            Self::OnionAnnealing => "Onion & Simulated Annealing",
            Self::AntColony => "Ant Colony",
        }
    }

    fn generator(&self) -> Option<GeneratorKind> {
        match self {
            Self::IncrementalLocal | Self::IncrementalAnnealing => Some(GeneratorKind::Incremental),
            Self::HullLocal | Self::HullAnnealing => Some(GeneratorKind::ConvexHull),
            Self::OnionLocal | Self::OnionAnnealing => Some(GeneratorKind::Onion),
            Self::AntColony => None,
        }
    }

    fn uses_local_search(&self) -> bool {
        matches!(
            self,
            Self::IncrementalLocal | Self::HullLocal | Self::OnionLocal
        )
    }
}

/// Generator and optimizer settings of one combination under a preset.
pub fn plan(
    preset: Preset,
    combo: Combination,
    direction: Direction,
    n: usize,
    seed: u64,
) -> (Option<GeneratorCfg>, OptimizerCfg) {
    let Some(kind) = combo.generator() else {
        let colony = match preset {
            Preset::Default => AntColony {
                direction,
                seed,
                ..AntColony::default()
            },
            Preset::Tuned => AntColony {
                direction,
                alpha: 1.0,
                beta: 3.0,
                rho: 0.05,
                elitism: false,
                iterations: 3,
                seed,
                ..AntColony::default()
            },
        };
        return (None, OptimizerCfg::AntColony(colony));
    };

    let edge_selection = match preset {
        Preset::Default => EdgeSelection::Random,
        Preset::Tuned if combo == Combination::IncrementalAnnealing => EdgeSelection::Random,
        Preset::Tuned => match direction {
            Direction::Maximize => EdgeSelection::Max,
            Direction::Minimize => EdgeSelection::Min,
        },
    };
    let layer_depth = match preset {
        Preset::Default => usize::MAX,
        Preset::Tuned => 3,
    };
    let generator = GeneratorCfg {
        kind,
        edge_selection,
        initialization: Initialization::XAscending,
        layer_depth,
    };

    let optimizer = if combo.uses_local_search() {
        let (threshold, max_chain) = match preset {
            Preset::Default => (0.7, 5),
            Preset::Tuned => (tuned_threshold(n), tuned_chain(n)),
        };
        OptimizerCfg::LocalSearch(LocalSearch {
            direction,
            threshold,
            max_chain,
            ..LocalSearch::default()
        })
    } else {
        OptimizerCfg::SimulatedAnnealing(SimulatedAnnealing {
            direction,
            cooling_steps: 500,
            mode: AnnealingMode::Local,
            seed,
            ..SimulatedAnnealing::default()
        })
    };
    (Some(generator), optimizer)
}

fn tuned_threshold(n: usize) -> f64 {
    match n {
        0..=200 => 0.10,
        201..=500 => 0.08,
        _ => 0.05,
    }
}

fn tuned_chain(n: usize) -> usize {
    match n {
        0..=49 => 3,
        50..=99 => 2,
        _ => 1,
    }
}

/// `area / hull_area` reached by one combination.
pub fn score(
    points: &[Point],
    hull_area: f64,
    preset: Preset,
    combo: Combination,
    direction: Direction,
    seed: u64,
) -> Result<f64> {
    let (generator, optimizer) = plan(preset, combo, direction, points.len(), seed);
    let initial = match generator {
        Some(cfg) => generate_polygon(points, &cfg, seed)?,
        // The colony builds its own polygons; it only needs the vertex set.
        None => Polygon::new(points.to_vec()),
    };
    let outcome = optimize_polygon(&initial, hull_area, &optimizer)?;
    Ok(outcome.ratio(hull_area))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entry {
    pub min_score: f64,
    pub max_score: f64,
    pub min_bound: f64,
    pub max_bound: f64,
    pub runs: usize,
}

impl Entry {
    fn empty() -> Self {
        Self {
            min_score: 0.0,
            max_score: 0.0,
            min_bound: f64::NEG_INFINITY,
            max_bound: f64::INFINITY,
            runs: 0,
        }
    }
}

/// Per point count, per combination aggregates.
#[derive(Debug, Default)]
pub struct Summary {
    entries: BTreeMap<(usize, Combination), Entry>,
}

impl Summary {
    pub fn record(&mut self, n: usize, combo: Combination, min_score: f64, max_score: f64) {
        let e = self.entries.entry((n, combo)).or_insert_with(Entry::empty);
        e.min_score += min_score;
        e.max_score += max_score;
        e.min_bound = e.min_bound.max(min_score);
        e.max_bound = e.max_bound.min(max_score);
        e.runs += 1;
    }

    pub fn get(&self, n: usize, combo: Combination) -> Option<&Entry> {
        self.entries.get(&(n, combo))
    }

    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut points = Vec::new();
        let mut combos = Vec::new();
        let mut min_score = Vec::new();
        let mut max_score = Vec::new();
        let mut min_bound = Vec::new();
        let mut max_bound = Vec::new();
        let mut runs = Vec::new();
        for (&(n, combo), e) in &self.entries {
            points.push(n as u64);
            combos.push(combo.label());
            min_score.push(e.min_score);
            max_score.push(e.max_score);
            min_bound.push(e.min_bound);
            max_bound.push(e.max_bound);
            runs.push(e.runs as u64);
        }
        df!(
            "points" => points,
            "combination" => combos,
            "min_score" => min_score,
            "max_score" => max_score,
            "min_bound" => min_bound,
            "max_bound" => max_bound,
            "runs" => runs
        )
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut df = self.to_frame()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating output dir {}", parent.display()))?;
            }
        }
        let mut file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

/// Run every combination in both directions on one instance.
pub fn run_instance(
    summary: &mut Summary,
    points: &[Point],
    hull_area: f64,
    preset: Preset,
    seed: u64,
) {
    let n = points.len();
    for combo in Combination::ALL {
        let min = score(points, hull_area, preset, combo, Direction::Minimize, seed);
        let max = score(points, hull_area, preset, combo, Direction::Maximize, seed);
        match (min, max) {
            (Ok(min), Ok(max)) => {
                tracing::debug!(n, combo = combo.label(), min, max, "bench instance");
                summary.record(n, combo, min, max);
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(n, combo = combo.label(), error = %e, "bench combination failed");
            }
        }
    }
}
