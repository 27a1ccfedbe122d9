use anyhow::{bail, Context, Result};
use areapoly::prelude::*;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::fmt::SubscriberBuilder;

mod bench;
mod io;
mod provenance;

use bench::{Preset, Summary};
use provenance::{write_sidecar, Payload};

#[derive(Parser)]
#[command(name = "areapoly")]
#[command(about = "Minimum/maximum area polygonization of point sets")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Polygonize one point file, optimize it and write the report
    Run(RunArgs),
    /// Run all generator/optimizer combinations over many files and write a CSV summary
    Bench(BenchArgs),
    /// Print a small provenance JSON block
    Report,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    LocalSearch,
    SimulatedAnnealing,
    AntColony,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Point file: two header lines, then `index x y` per line
    #[arg(short = 'i', long)]
    input: PathBuf,
    /// Text report path; WKT dumps go next to it unless `--wkt-dir` is given
    #[arg(short = 'o', long)]
    output: PathBuf,
    #[arg(long)]
    generator: GeneratorKind,
    #[arg(long, value_enum)]
    algorithm: Algorithm,
    /// Minimal area polygonization
    #[arg(long, conflicts_with = "max")]
    min: bool,
    /// Maximal area polygonization (default)
    #[arg(long)]
    max: bool,
    /// Chain length (local search), cooling steps (annealing) or iterations (ant colony)
    #[arg(short = 'L')]
    l: Option<usize>,
    /// Local search: relative gain at or below which a pass is stale
    #[arg(long)]
    threshold: Option<f64>,
    /// Local search: stale passes before stopping
    #[arg(long)]
    patience: Option<usize>,
    #[arg(long, default_value = "local")]
    annealing: AnnealingMode,
    #[arg(long)]
    alpha: Option<f64>,
    #[arg(long)]
    beta: Option<f64>,
    #[arg(long)]
    rho: Option<f64>,
    /// Ant colony: reinforce the best polygon so far
    #[arg(long)]
    elitism: bool,
    /// Ant colony: ants per iteration (default n/4)
    #[arg(long)]
    ants: Option<usize>,
    /// Defaults: max (incremental) or min (convex hull) when maximizing, the reverse when minimizing
    #[arg(long)]
    edge_selection: Option<EdgeSelection>,
    #[arg(long, default_value = "x-asc")]
    init: Initialization,
    /// Onion: convex layers peeled before the rest is inserted
    #[arg(long)]
    layers: Option<usize>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long)]
    wkt_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BenchArgs {
    #[arg(long, value_enum, default_value_t = Preset::Default)]
    preset: Preset,
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Run(args) => run(&args),
        Action::Bench(args) => bench(&args),
        Action::Report => report(),
    }
}

impl RunArgs {
    fn direction(&self) -> Direction {
        if self.min {
            Direction::Minimize
        } else {
            Direction::Maximize
        }
    }

    fn generator_cfg(&self) -> GeneratorCfg {
        let direction = self.direction();
        let edge_selection = self.edge_selection.unwrap_or(match (self.generator, direction) {
            (GeneratorKind::ConvexHull, Direction::Maximize) => EdgeSelection::Min,
            (GeneratorKind::ConvexHull, Direction::Minimize) => EdgeSelection::Max,
            (_, Direction::Maximize) => EdgeSelection::Max,
            (_, Direction::Minimize) => EdgeSelection::Min,
        });
        GeneratorCfg {
            kind: self.generator,
            edge_selection,
            initialization: self.init,
            layer_depth: self.layers.unwrap_or(usize::MAX),
        }
    }

    fn optimizer_cfg(&self) -> OptimizerCfg {
        let direction = self.direction();
        match self.algorithm {
            Algorithm::LocalSearch => {
                let d = LocalSearch::default();
                OptimizerCfg::LocalSearch(LocalSearch {
                    direction,
                    max_chain: self.l.unwrap_or(d.max_chain),
                    threshold: self.threshold.unwrap_or(d.threshold),
                    patience: self.patience.unwrap_or(d.patience),
                    ..d
                })
            }
            Algorithm::SimulatedAnnealing => {
                let d = SimulatedAnnealing::default();
                OptimizerCfg::SimulatedAnnealing(SimulatedAnnealing {
                    direction,
                    cooling_steps: self.l.unwrap_or(d.cooling_steps),
                    mode: self.annealing,
                    seed: self.seed,
                    ..d
                })
            }
            Algorithm::AntColony => {
                let d = AntColony::default();
                OptimizerCfg::AntColony(AntColony {
                    direction,
                    iterations: self.l.unwrap_or(d.iterations),
                    colony_size: self.ants.unwrap_or(d.colony_size),
                    alpha: self.alpha.unwrap_or(d.alpha),
                    beta: self.beta.unwrap_or(d.beta),
                    rho: self.rho.unwrap_or(d.rho),
                    elitism: self.elitism,
                    seed: self.seed,
                    ..d
                })
            }
        }
    }
}

/// Hull area used for ratios: the header's value if present, else computed.
fn hull_area_for(path: &Path, set: &io::PointSet) -> f64 {
    let computed = convex_hull_area(&set.points);
    match set.declared_hull_area {
        Some(declared) => {
            if (declared - computed).abs() > 1e-9 * computed.max(1.0) {
                tracing::warn!(
                    file = %path.display(),
                    declared,
                    computed,
                    "declared hull area differs from computed"
                );
            }
            declared
        }
        None => computed,
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let gen_cfg = args.generator_cfg();
    let opt_cfg = args.optimizer_cfg();
    tracing::info!(
        input = %args.input.display(),
        output = %args.output.display(),
        generator = gen_cfg.kind.name(),
        algorithm = opt_cfg.name(),
        direction = opt_cfg.direction().suffix(),
        "run"
    );
    let set = io::load_points(&args.input)?;
    let hull_area = hull_area_for(&args.input, &set);
    if !(hull_area > 0.0) {
        bail!("hull area of {} is not positive", args.input.display());
    }

    let start = Instant::now();
    let initial = generate_polygon(&set.points, &gen_cfg, args.seed)
        .with_context(|| format!("generating initial polygon for {}", args.input.display()))?;
    let outcome = optimize_polygon(&initial, hull_area, &opt_cfg)
        .with_context(|| format!("optimizing {}", args.input.display()))?;
    let millis = start.elapsed().as_millis();

    let algorithm = format!("{}_{}", opt_cfg.name(), opt_cfg.direction().suffix());
    let report = io::Report {
        polygon: &outcome.polygon,
        algorithm,
        initial_area: outcome.initial_area,
        hull_area,
        millis,
    };
    io::write_text(&args.output, &report.render())?;

    let wkt_dir = match &args.wkt_dir {
        Some(dir) => dir.clone(),
        None => args
            .output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let points_wkt = wkt_dir.join("points.wkt");
    let initial_wkt = wkt_dir.join("initial.wkt");
    let optimal_wkt = wkt_dir.join("optimal.wkt");
    io::write_text(&points_wkt, &io::multipoint_wkt(&set.points))?;
    io::write_text(&initial_wkt, &io::polygon_wkt(&initial))?;
    io::write_text(&optimal_wkt, &io::polygon_wkt(&outcome.polygon))?;

    let params = json!({
        "generator": format!("{gen_cfg:?}"),
        "optimizer": format!("{opt_cfg:?}"),
        "seed": args.seed,
        "hull_area": hull_area,
        "area": outcome.area,
        "ratio": outcome.ratio(hull_area),
        "stop": outcome.stop.to_string(),
        "steps": outcome.steps,
        "millis": millis as u64,
    });
    let payload = Payload::new(&params)?
        .input(&args.input)
        .companion(&points_wkt)
        .companion(&initial_wkt)
        .companion(&optimal_wkt);
    write_sidecar(&args.output, payload)?;

    tracing::info!(
        area = outcome.area,
        ratio = outcome.ratio(hull_area),
        stop = %outcome.stop,
        millis = millis as u64,
        "run finished"
    );
    Ok(())
}

fn bench(args: &BenchArgs) -> Result<()> {
    tracing::info!(files = args.files.len(), preset = ?args.preset, out = %args.out.display(), "bench");
    let mut summary = Summary::default();
    for path in &args.files {
        let set = io::load_points(path)?;
        let hull_area = hull_area_for(path, &set);
        tracing::info!(file = %path.display(), n = set.points.len(), "bench file");
        bench::run_instance(&mut summary, &set.points, hull_area, args.preset, args.seed);
    }
    summary.write_csv(&args.out)?;

    let params = json!({
        "preset": format!("{:?}", args.preset),
        "seed": args.seed,
    });
    let mut payload = Payload::new(&params)?;
    for path in &args.files {
        payload = payload.input(path);
    }
    write_sidecar(&args.out, payload)?;
    Ok(())
}

fn report() -> Result<()> {
    let obj = json!({
        "code_rev": provenance::current_git_rev(),
        "version": areapoly::VERSION,
        "params": {},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SQUARE_PLUS_TWO: &str = "# six points\n# {\"area\": \"100\"}\n0 0 0\n1 10 0\n2 10 10\n3 0 10\n4 3 5\n5 7 4\n";

    fn parse_run(argv: &[&str]) -> RunArgs {
        match Cmd::try_parse_from(argv).unwrap().action {
            Action::Run(args) => args,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn edge_selection_defaults_follow_direction_and_generator() {
        let base = ["areapoly", "run", "-i", "p", "-o", "r", "--algorithm", "local-search"];
        let with = |extra: &[&str]| {
            let mut argv = base.to_vec();
            argv.extend_from_slice(extra);
            parse_run(&argv).generator_cfg().edge_selection
        };
        assert_eq!(with(&["--generator", "incremental"]), EdgeSelection::Max);
        assert_eq!(with(&["--generator", "incremental", "--min"]), EdgeSelection::Min);
        assert_eq!(with(&["--generator", "convex-hull"]), EdgeSelection::Min);
        assert_eq!(with(&["--generator", "convex-hull", "--min"]), EdgeSelection::Max);
        assert_eq!(
            with(&["--generator", "onion", "--edge-selection", "random"]),
            EdgeSelection::Random
        );
    }

    #[test]
    fn chain_flag_maps_onto_each_optimizer() {
        let args = parse_run(&[
            "areapoly", "run", "-i", "p", "-o", "r", "--generator", "onion",
            "--algorithm", "simulated-annealing", "-L", "700", "--annealing", "global", "--min",
        ]);
        match args.optimizer_cfg() {
            OptimizerCfg::SimulatedAnnealing(sa) => {
                assert_eq!(sa.cooling_steps, 700);
                assert_eq!(sa.mode, AnnealingMode::Global);
                assert_eq!(sa.direction, Direction::Minimize);
            }
            other => panic!("unexpected optimizer {other:?}"),
        }
        assert!(Cmd::try_parse_from([
            "areapoly", "run", "-i", "p", "-o", "r", "--generator", "onion",
            "--algorithm", "ant-colony", "--min", "--max",
        ])
        .is_err());
    }

    #[test]
    fn run_writes_report_dumps_and_sidecar() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("points.instance");
        fs::write(&input, SQUARE_PLUS_TWO).unwrap();
        let output = dir.path().join("out").join("report.txt");
        let args = parse_run(&[
            "areapoly",
            "run",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--generator",
            "incremental",
            "--algorithm",
            "local-search",
            "--min",
        ]);
        run(&args).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("Optimal Area Polygonization\n"));
        assert!(text.contains("Algorithm: local_search_min\n"));
        assert!(text.contains("area_initial: "));
        let out_dir = output.parent().unwrap();
        for name in ["points.wkt", "initial.wkt", "optimal.wkt", "report.provenance.json"] {
            assert!(out_dir.join(name).exists(), "{name} missing");
        }
        let optimal = fs::read_to_string(out_dir.join("optimal.wkt")).unwrap();
        assert!(optimal.starts_with("POLYGON(("));
    }

    #[test]
    fn bench_writes_csv_summary() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("six.instance");
        fs::write(&input, SQUARE_PLUS_TWO).unwrap();
        let out = dir.path().join("summary.csv");
        let cmd = Cmd::try_parse_from([
            "areapoly",
            "bench",
            "--out",
            out.to_str().unwrap(),
            input.to_str().unwrap(),
        ])
        .unwrap();
        let Action::Bench(args) = cmd.action else {
            panic!("expected bench");
        };
        assert_eq!(args.preset, Preset::Default);
        bench(&args).unwrap();
        let csv = fs::read_to_string(&out).unwrap();
        assert!(csv.starts_with("points,combination,min_score"));
        assert!(dir.path().join("summary.provenance.json").exists());
    }
}
