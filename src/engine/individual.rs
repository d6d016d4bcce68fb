use rand::Rng;

use crate::core::error::ConfigError;

/// Affinely rescales `raw` from `[floor, maxi]` to `[0, 100]`.
pub fn normalize(raw: f64, floor: f64, maxi: f64) -> Result<f64, ConfigError> {
    if !floor.is_finite() || !maxi.is_finite() || maxi == floor {
        return Err(ConfigError::DegenerateScoreRange { floor, maxi });
    }
    Ok((raw - floor) * 100.0 / (maxi - floor))
}

/// The capabilities any evolvable representation must provide.
/// Implementations must be Thread-Safe (Sync) so generations can be scored in parallel.
pub trait Individual: Clone + Send + Sync {
    /// Unnormalized fitness. The bigger, the better.
    fn raw_score(&self) -> f64;

    /// Minimum reachable raw score.
    fn score_floor(&self) -> f64;

    /// Maximum reachable raw score.
    fn score_max(&self) -> f64;

    /// Raw score mapped onto `[0, 100]`.
    fn normalized_score(&self) -> Result<f64, ConfigError> {
        normalize(self.raw_score(), self.score_floor(), self.score_max())
    }

    /// In-place random perturbation. Must never alter fixed parts of the genome.
    fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R);

    /// Combines `self` with a partner. Does not mutate.
    fn mate<R: Rng + ?Sized>(&self, other: &Self, rng: &mut R) -> Self;

    fn mutation_probability(&self) -> f64 {
        1.0
    }

    /// Probability of mating with a partner instead of cloning itself.
    fn mating_probability(&self) -> f64 {
        1.0
    }

    /// Mates with `other`, or clones itself when `other` is the very same
    /// individual or the mating coin flip fails.
    fn reproduce<R: Rng + ?Sized>(&self, other: &Self, rng: &mut R) -> Self {
        if std::ptr::eq(self, other) || rng.gen::<f64>() > self.mating_probability() {
            return self.clone();
        }
        self.mate(other, rng)
    }
}

/// Produces fresh random individuals for a new population.
pub trait Seeder: Send + Sync {
    type Individual: Individual;

    fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Individual;

    /// Short name used in logs and export file names.
    fn label(&self) -> &str {
        "individual"
    }
}
