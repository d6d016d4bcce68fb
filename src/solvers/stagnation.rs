use crate::core::domain::{Params, DEFAULT_STAGNATION_WARMUP};

/// Outcome of observing one generation's best score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The running best improved.
    Improved,
    /// The running best reached the maximum score (100).
    Solved,
    /// No improvement, keep going.
    Stalled,
    /// No improvement for too long.
    Blocked,
}

/// Tracks the running best score of a population and decides when it is stuck.
///
/// Success is checked before stagnation, so a generation reaching 100 is
/// always reported as solved.
#[derive(Debug, Clone)]
pub struct StagnationDetector {
    warmup: usize,
    divisor: usize,
    best: Option<f64>,
    no_progress: usize,
    generations: usize,
}

impl StagnationDetector {
    pub fn new(warmup: usize, divisor: usize) -> Self {
        Self {
            warmup,
            divisor: divisor.max(1),
            best: None,
            no_progress: 0,
            generations: 0,
        }
    }

    pub fn from_params(params: &Params) -> Self {
        Self::new(params.stagnation_warmup, params.stagnation_divisor)
    }

    pub fn observe(&mut self, generation_best: f64) -> Verdict {
        let verdict = match self.best {
            Some(best) if generation_best <= best => {
                self.no_progress += 1;
                if self.generations > self.warmup
                    && self.no_progress >= self.generations / self.divisor
                {
                    Verdict::Blocked
                } else {
                    Verdict::Stalled
                }
            }
            _ => {
                self.best = Some(generation_best);
                self.no_progress = 0;
                if generation_best >= 100.0 {
                    Verdict::Solved
                } else {
                    Verdict::Improved
                }
            }
        };
        self.generations += 1;
        verdict
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }

    pub fn no_progress(&self) -> usize {
        self.no_progress
    }

    pub fn generations(&self) -> usize {
        self.generations
    }
}

impl Default for StagnationDetector {
    fn default() -> Self {
        Self::new(DEFAULT_STAGNATION_WARMUP, 2)
    }
}
