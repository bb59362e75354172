//! `labelspread` command line.
//!
//! ```text
//! labelspread roads.json --seed 123 --seed 456 --mode 1 --iterations 20 --interval-ms 50
//! labelspread roads.json --click 42.05,55.57 --click 42.07,55.59 --mode final -o frames.json
//! ```
//!
//! Anything not given as a flag is asked for on stdin. The result is a JSON animation
//! document (positions, edges, per-frame node colors) for the renderer.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use labelspread::config::{parse_positive_or_default, DEFAULT_ALPHA};
use labelspread::{
    select_seeds, unreachable_from, Animation, RoadGraph, RunMode, RunSettings, SpreadingEngine,
};

#[derive(Parser, Debug)]
#[command(name = "labelspread", version, about = "Two-class label spreading over a road graph")]
struct Cli {
    /// Graph document (JSON nodes/edges)
    graph: PathBuf,

    /// Seed node id; give exactly twice (class 0, then class 1)
    #[arg(long = "seed")]
    seeds: Vec<u64>,

    /// Pointer position "X,Y"; the nearest node becomes a seed
    #[arg(long = "click", conflicts_with = "seeds")]
    clicks: Vec<String>,

    /// 1 / iterative, or 2 / final
    #[arg(long)]
    mode: Option<String>,

    /// Iteration count; non-positive or non-numeric falls back to the mode default
    #[arg(long)]
    iterations: Option<String>,

    /// Animation frame interval in milliseconds
    #[arg(long)]
    interval_ms: Option<String>,

    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    alpha: f64,

    /// Output file (defaults to stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("labelspread=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn prompt(stdin: &mut impl BufRead, question: &str) -> io::Result<String> {
    eprint!("{question}");
    io::stderr().flush()?;
    let mut line = String::new();
    stdin.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x = x.trim().parse().map_err(|_| format!("bad x in {s:?}"))?;
    let y = y.trim().parse().map_err(|_| format!("bad y in {s:?}"))?;
    Ok((x, y))
}

fn choose_seeds(
    cli: &Cli,
    graph: &RoadGraph<u64>,
    stdin: &mut impl BufRead,
) -> Result<(u64, u64), Box<dyn std::error::Error>> {
    let ids: Vec<u64> = if !cli.seeds.is_empty() {
        cli.seeds.clone()
    } else if !cli.clicks.is_empty() {
        let clicks = cli
            .clicks
            .iter()
            .map(|c| parse_point(c))
            .collect::<Result<Vec<_>, _>>()?;
        let (a, b) = select_seeds(graph, clicks)?;
        [a, b]
            .iter()
            .filter_map(|&i| graph.node_id(i).copied())
            .collect()
    } else {
        eprintln!("Select two nodes of the graph to seed the two classes.");
        let mut ids = Vec::with_capacity(2);
        for class in 0..2 {
            let answer = prompt(stdin, &format!("Node id for class {class}: "))?;
            ids.push(answer.parse::<u64>().map_err(|_| format!("not a node id: {answer:?}"))?);
        }
        ids
    };
    match ids[..] {
        [a, b] => Ok((a, b)),
        _ => Err(format!("exactly two seeds are required, got {}", ids.len()).into()),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let graph: RoadGraph<u64> = labelspread::source::from_path(&cli.graph)?;
    let stdin = io::stdin();
    let mut stdin = stdin.lock();

    let (seed0, seed1) = choose_seeds(&cli, &graph, &mut stdin)?;
    eprintln!("Selected nodes: [{seed0}, {seed1}]");

    let choice = match &cli.mode {
        Some(m) => m.clone(),
        None => {
            eprintln!("\nChoose a mode:");
            eprintln!("1. Clustering by iterations.");
            eprintln!("2. Final clustering.");
            prompt(&mut stdin, "Enter 1 or 2: ")?
        }
    };
    let Some(mode) = RunMode::from_choice(&choice) else {
        eprintln!("Invalid choice. Try again.");
        return Ok(());
    };

    let mut settings = RunSettings::for_mode(mode);
    settings.alpha = cli.alpha;
    let mut fallbacks = Vec::new();
    match mode {
        RunMode::Iterative => {
            let iterations = match &cli.iterations {
                Some(s) => s.clone(),
                None => prompt(&mut stdin, "Number of iterations: ")?,
            };
            fallbacks.extend(settings.set_iterations(&iterations));
            let interval = match &cli.interval_ms {
                Some(s) => s.clone(),
                None => prompt(&mut stdin, "Animation interval (ms): ")?,
            };
            fallbacks.extend(settings.set_interval(&interval));
        }
        RunMode::Final => {
            if let Some(s) = &cli.iterations {
                fallbacks.extend(settings.set_iterations(s));
            }
            if let Some(s) = &cli.interval_ms {
                let (ms, fb) = parse_positive_or_default(s, "animation interval (ms)", settings.interval_ms);
                settings.interval_ms = ms;
                fallbacks.extend(fb);
            }
        }
    }
    for fb in &fallbacks {
        eprintln!("Warning: {fb}.");
    }

    let mut engine = SpreadingEngine::new(&graph, &seed0, &seed1, settings.spreading_config())?;
    let (i0, i1) = (
        graph.index_of(&seed0).ok_or("seed vanished")?,
        graph.index_of(&seed1).ok_or("seed vanished")?,
    );
    let unreachable = unreachable_from(&graph, &[i0, i1]);
    if !unreachable.is_empty() {
        warn!(
            nodes = unreachable.len(),
            "nodes are disconnected from both seeds and will stay unlabeled"
        );
    }
    info!(
        mode = mode.label(),
        iterations = settings.iterations,
        alpha = settings.alpha,
        isolated = engine.operator().isolated_nodes().len(),
        "running label spreading"
    );
    let history = engine.run_to_completion();

    let edges = graph.edges().map(|(u, v, _)| (u, v)).collect();
    let positions = graph.positions().to_vec();
    let animation = match mode {
        RunMode::Iterative => Animation::new(settings.interval_ms, positions, edges, history),
        RunMode::Final => {
            Animation::final_result(settings.interval_ms, positions, edges, history.last())
        }
    };

    match &cli.output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            serde_json::to_writer(io::BufWriter::new(file), &animation)?;
            info!(path = %path.display(), frames = animation.frames.len(), "wrote animation");
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer(&mut out, &animation)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
