use std::collections::VecDeque;
use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::solvers::{ExitReason, GenStats, SolverEvent};

// --- Constants ---
const LOG_CAPACITY: usize = 200;

/// Column headers matching [`progress_line`].
pub const PROGRESS_HEADER: &str = "max \tavg \tmin \tmut-pr\tmat-pr\tg-nbr";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    Running,
    Finished(ExitReason),
    Disconnected,
}

// --- Telemetry ---

/// Run-wide aggregates, independent of restart cycles.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    pub best_ever: Option<f64>,
    /// Cycle and generation where `best_ever` was first reached.
    pub best_at: Option<(usize, usize)>,
    pub fallback_generations: usize,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, stats: &GenStats) {
        if self.best_ever.map_or(true, |best| stats.best_score > best) {
            self.best_ever = Some(stats.best_score);
            self.best_at = Some((stats.cycle, stats.generation));
        }
        if stats.uniform_fallback {
            self.fallback_generations += 1;
        }
    }

    /// One-line digest printed once the run is over.
    pub fn summary(&self) -> String {
        let mut line = match (self.best_ever, self.best_at) {
            (Some(best), Some((cycle, generation))) => format!(
                "best {:.2} first reached in cycle {} at generation {}",
                best, cycle, generation
            ),
            _ => "no generation completed".to_string(),
        };
        if self.fallback_generations > 0 {
            line.push_str(&format!(
                ", uniform parent draw in {} generation(s)",
                self.fallback_generations
            ));
        }
        line
    }
}

/// One tab-separated progress line: max, mean, min, mean tunables, generation.
pub fn progress_line(stats: &GenStats) -> String {
    format!(
        "{:<4.2}\t{:<4.2}\t{:<4.2}\t{:<4.4}\t{:<4.4}\t{}",
        stats.best_score,
        stats.mean_score,
        stats.worst_score,
        stats.mean_mutation_probability,
        stats.mean_mating_probability,
        stats.generation
    )
}

// --- Monitor ---

/// Headless consumer of solver events. Never touches engine state; it only
/// keeps copies of what the solver reports.
pub struct RunMonitor<I> {
    rx: Option<Receiver<SolverEvent<I>>>,
    pub status: WorkerStatus,
    pub start_time: Instant,

    pub total_generations: usize,
    pub cycle: usize,
    pub last_stats: Option<GenStats>,
    pub current_best: Option<I>,

    pub telemetry: Telemetry,
    pub logs: VecDeque<String>,
}

impl<I> RunMonitor<I> {
    pub fn new() -> Self {
        Self {
            rx: None,
            status: WorkerStatus::Idle,
            start_time: Instant::now(),
            total_generations: 0,
            cycle: 0,
            last_stats: None,
            current_best: None,
            telemetry: Telemetry::new(),
            logs: VecDeque::with_capacity(LOG_CAPACITY),
        }
    }

    pub fn set_channel(&mut self, rx: Receiver<SolverEvent<I>>) {
        self.rx = Some(rx);
        self.status = WorkerStatus::Running;
        self.start_time = Instant::now();
    }

    /// Drains pending events without blocking. Returns the progress lines of
    /// the generations received.
    pub fn tick(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        let Some(rx) = self.rx.clone() else {
            return lines;
        };

        loop {
            match rx.try_recv() {
                Ok(evt) => {
                    if let Some(line) = self.handle_event(evt) {
                        lines.push(line);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !matches!(self.status, WorkerStatus::Finished(_)) {
                        self.status = WorkerStatus::Disconnected;
                        self.log("Worker disconnected.");
                    }
                    self.rx = None;
                    break;
                }
            }
        }
        lines
    }

    /// Applies one event. Returns a progress line for generation updates.
    pub fn handle_event(&mut self, event: SolverEvent<I>) -> Option<String> {
        match event {
            SolverEvent::Log(msg) => {
                self.log(msg);
                None
            }

            SolverEvent::GenerationUpdate(stats) => {
                self.status = WorkerStatus::Running;
                self.total_generations += 1;
                self.telemetry.ingest(&stats);
                let line = progress_line(&stats);
                self.last_stats = Some(stats);
                Some(line)
            }

            SolverEvent::NewBest(individual) => {
                self.current_best = Some(individual);
                None
            }

            SolverEvent::Restarted { cycle } => {
                self.cycle = cycle;
                self.log(format!("Restarted with a fresh population (cycle {})", cycle));
                None
            }

            SolverEvent::Finished(reason) => {
                self.status = WorkerStatus::Finished(reason);
                self.log(format!("Solver finished: {:?}", reason));
                None
            }
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(
            self.status,
            WorkerStatus::Finished(_) | WorkerStatus::Disconnected
        )
    }

    /// Generations per second since the channel was attached.
    pub fn throughput(&self) -> f64 {
        let secs = self.start_time.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.total_generations as f64 / secs
        } else {
            0.0
        }
    }

    fn log(&mut self, msg: impl Into<String>) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(msg.into());
    }
}

impl<I> Default for RunMonitor<I> {
    fn default() -> Self {
        Self::new()
    }
}
