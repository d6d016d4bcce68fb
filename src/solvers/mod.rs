use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::error::ConfigError;

/// Detailed statistics for a single generation.
/// Used for telemetry and history export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenStats {
    /// Restart cycle this generation belongs to (0 for the first population).
    pub cycle: usize,
    /// Generation index within the cycle.
    pub generation: usize,
    pub best_score: f64,
    pub best_raw_score: f64,
    pub mean_score: f64,
    pub worst_score: f64,
    pub best_index: usize,
    pub mean_mutation_probability: f64,
    pub mean_mating_probability: f64,

    /// True when every selection weight was unusable and parents were drawn uniformly.
    pub uniform_fallback: bool,
}

impl Default for GenStats {
    fn default() -> Self {
        Self {
            cycle: 0,
            generation: 0,
            best_score: 0.0,
            best_raw_score: 0.0,
            mean_score: 0.0,
            worst_score: 0.0,
            best_index: 0,
            mean_mutation_probability: 0.0,
            mean_mating_probability: 0.0,
            uniform_fallback: false,
        }
    }
}

/// Why a population stopped evolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// The best possible score was reached.
    Success,
    /// No progress for too long; stuck in a local optimum.
    Blocked,
    /// The cancel flag was raised between two generations.
    Interrupted,
}

/// Events emitted by solvers to the main thread.
#[derive(Debug, Clone)]
pub enum SolverEvent<I> {
    /// Diagnostic log message.
    Log(String),

    /// A completed generation with full statistics.
    GenerationUpdate(GenStats),

    /// An individual that beats the best score seen so far in the run.
    NewBest(I),

    /// The population was discarded and a fresh one started.
    Restarted { cycle: usize },

    /// Solver has finished its run.
    Finished(ExitReason),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub mod ga;
pub mod stagnation;
