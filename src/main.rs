use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use log::{info, warn};

use gridforge::core::domain::Params;
use gridforge::core::puzzle::{self, Puzzle, BUILTIN_PUZZLES};
use gridforge::core::sudoku::{Sudoku, SudokuSeeder};
use gridforge::export;
use gridforge::interface::state::{RunMonitor, PROGRESS_HEADER};
use gridforge::solvers::ga::GeneticAlgorithm;

// --- CLI Definitions ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Evolutionary solver for Sudoku-like grids", long_about = None)]
struct Args {
    /// Built-in puzzle to solve (tiny_4x4, small_6x6, classic_9x9)
    #[arg(short, long, default_value = "small_6x6")]
    puzzle: String,

    /// Puzzle file: JSON definition, or a plain grid (one row per line) with --box
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Box dimensions for plain grid files, as ROWSxCOLS: grid rows per box,
    /// then grid columns per box (3x2 groups 3 text rows by 2 columns)
    #[arg(long = "box", value_name = "ROWSxCOLS")]
    box_dims: Option<String>,

    /// JSON file with engine parameters; CLI flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Population size
    #[arg(short = 'n', long)]
    population: Option<usize>,

    /// Seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of worker threads for parallel scoring
    #[arg(short, long)]
    threads: Option<usize>,

    /// Per-cell mutation probability
    #[arg(long)]
    mutation: Option<f64>,

    /// Probability of mating instead of cloning
    #[arg(long)]
    mating: Option<f64>,

    /// Do not restart blocked populations
    #[arg(long)]
    no_restart: bool,

    /// Maximum number of restarts
    #[arg(long)]
    max_restarts: Option<usize>,

    /// Stop the run after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory to save the run history into
    #[arg(long)]
    export: Option<PathBuf>,
}

// --- Initialization Helpers ---

fn load_params(args: &Args) -> Result<Params> {
    let mut params = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => Params::default(),
    };

    if let Some(n) = args.population {
        params.population_size = n;
    }
    if args.seed.is_some() {
        params.seed = args.seed;
    }
    if let Some(t) = args.threads {
        params.threads = t;
    }
    if let Some(p) = args.mutation {
        params.mutation_probability = p;
    }
    if let Some(p) = args.mating {
        params.mating_probability = p;
    }
    if args.no_restart {
        params.restart_on_stagnation = false;
    }
    if args.max_restarts.is_some() {
        params.max_restarts = args.max_restarts;
    }

    params.validate().context("Invalid parameters")?;
    Ok(params)
}

fn parse_box(dims: &str) -> Result<(usize, usize)> {
    let (w, h) = dims
        .split_once(|c| c == 'x' || c == 'X')
        .ok_or_else(|| anyhow!("Box must look like ROWSxCOLS, got `{}`", dims))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

fn load_puzzle(args: &Args) -> Result<Puzzle> {
    match &args.file {
        Some(path) => match &args.box_dims {
            Some(dims) => {
                let (sw, sh) = parse_box(dims)?;
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read puzzle file {}", path.display()))?;
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "custom".to_string());
                Ok(Puzzle::parse(&text, sw, sh)
                    .with_context(|| format!("Invalid puzzle in {}", path.display()))?
                    .with_name(name))
            }
            None => puzzle::load_definition(path),
        },
        None => Puzzle::builtin(&args.puzzle).ok_or_else(|| {
            anyhow!(
                "Unknown puzzle `{}` (available: {})",
                args.puzzle,
                BUILTIN_PUZZLES.join(", ")
            )
        }),
    }
}

// --- Main ---

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let params = load_params(&args)?;
    let puzzle = Arc::new(load_puzzle(&args)?);
    info!(
        "Puzzle {}: {}x{} grid, {} given cells",
        puzzle.name(),
        puzzle.shape().width,
        puzzle.shape().height,
        puzzle.given_cells().len()
    );

    // Ctrl-C and the watchdog both stop the run between generations.
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, finishing the current generation...");
        flag.store(true, Ordering::Relaxed);
    })
    .context("Failed to install the Ctrl-C handler")?;

    let seeder = SudokuSeeder::new(Arc::clone(&puzzle), &params);
    let solver = GeneticAlgorithm::new(seeder, params.clone())?.with_cancel_flag(Arc::clone(&cancel));

    if let Some(secs) = args.timeout {
        let flag = Arc::clone(&cancel);
        thread::Builder::new()
            .name("Watchdog".to_string())
            .spawn(move || {
                thread::sleep(Duration::from_secs(secs));
                flag.store(true, Ordering::Relaxed);
            })?;
    }

    // Spawn Solver Thread
    let (tx, rx) = unbounded();
    let mut monitor: RunMonitor<Sudoku> = RunMonitor::new();
    monitor.set_channel(rx);

    let threads = params.threads;
    let worker = thread::Builder::new()
        .name("Solver-Worker".to_string())
        .spawn(move || {
            // Initialize Rayon global thread pool for parallel evaluations
            if rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .is_err()
            {
                warn!("Rayon global pool already initialized");
            }
            solver.solve(tx)
        })?;

    // Event Loop
    println!("{}", PROGRESS_HEADER);
    let tick_rate = Duration::from_millis(50);
    let mut stdout = io::stdout();
    while !monitor.is_done() {
        if let Some(line) = monitor.tick().pop() {
            print!("\r{}", line);
            stdout.flush()?;
        }
        thread::sleep(tick_rate);
    }
    println!();

    let report = worker
        .join()
        .map_err(|_| anyhow!("Solver thread panicked"))??;

    println!(
        "{:?} after {} generations ({} cycle(s), {:.1} gen/s)",
        report.exit_reason(),
        report.stats().len(),
        report.cycles(),
        monitor.throughput()
    );
    println!("{}", monitor.telemetry.summary());
    if let Some((best, score)) = report.champion() {
        println!("Best score: {:.2}", score);
        println!("{}", best);
    }

    if let Some(dir) = &args.export {
        let stats_file = export::save_stats(dir, puzzle.name(), report.stats())?;
        let population_file = export::save_best_individuals(
            dir,
            puzzle.name(),
            report.run_id(),
            report.best_individuals(),
            report.stats(),
        )?;
        println!("Statistics: {}", stats_file.display());
        println!("Best individuals: {}", population_file.display());
    }

    Ok(())
}
