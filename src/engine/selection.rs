use log::warn;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Raises a normalized score to `exponent`. Non-positive and NaN scores weigh 0.
#[inline]
pub fn biased_weight(score: f64, exponent: i32) -> f64 {
    if score.is_nan() || score <= 0.0 {
        0.0
    } else {
        score.powi(exponent)
    }
}

/// Fitness-proportional index sampler with a uniform fallback.
pub enum ParentSampler {
    Weighted(WeightedIndex<f64>),
    /// Used when no weight is usable (all zero, overflowed, or empty).
    Uniform(usize),
}

impl ParentSampler {
    pub fn new(weights: &[f64]) -> Self {
        match WeightedIndex::new(weights.iter().copied()) {
            Ok(dist) => ParentSampler::Weighted(dist),
            Err(e) => {
                warn!(
                    "Weighted selection unavailable ({}) -> uniform draw over {} candidates",
                    e,
                    weights.len()
                );
                ParentSampler::Uniform(weights.len())
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ParentSampler::Uniform(_))
    }

    /// Draws one index. Callers must not sample from an empty population.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        match self {
            ParentSampler::Weighted(dist) => dist.sample(rng),
            ParentSampler::Uniform(n) => rng.gen_range(0..*n),
        }
    }

    /// Draws `k` indices with replacement.
    pub fn draw<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Vec<usize> {
        (0..k).map(|_| self.sample(rng)).collect()
    }
}
