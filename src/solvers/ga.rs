use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Sender;
use log::{debug, info};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use uuid::Uuid;

use crate::core::domain::Params;
use crate::engine::individual::{Individual, Seeder};
use crate::engine::selection::{biased_weight, ParentSampler};
use crate::engine::stats::StatCollector;
use crate::solvers::stagnation::{StagnationDetector, Verdict};
use crate::solvers::{EngineError, ExitReason, GenStats, SolverEvent};

/// Output of a single generation.
#[derive(Debug, Clone)]
pub struct Generation<I> {
    /// The next population. The elite sits at index `elite`.
    pub population: Vec<I>,
    pub elite: usize,
    /// Best individual of the scored population.
    pub best: I,
    pub stats: GenStats,
}

/// History of one population, from a fresh start to its exit.
#[derive(Debug, Clone)]
pub struct PopulationRun<I> {
    pub exit: ExitReason,
    pub stats: Vec<GenStats>,
    pub best_individuals: Vec<I>,
    pub final_population: Vec<I>,
}

/// Everything a run produced. Read-only for consumers.
#[derive(Debug, Clone)]
pub struct RunReport<I> {
    run_id: Uuid,
    exit: ExitReason,
    cycles: usize,
    stats: Vec<GenStats>,
    best_individuals: Vec<I>,
    champion: Option<(I, f64)>,
    final_population: Vec<I>,
}

impl<I: Clone> RunReport<I> {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            exit: ExitReason::Interrupted,
            cycles: 0,
            stats: Vec::new(),
            best_individuals: Vec::new(),
            champion: None,
            final_population: Vec::new(),
        }
    }

    fn absorb(&mut self, run: PopulationRun<I>) {
        self.exit = run.exit;
        // A population interrupted before its first generation adds nothing.
        if run.stats.is_empty() && self.cycles > 0 {
            return;
        }
        for (stats, best) in run.stats.iter().zip(run.best_individuals.iter()) {
            let beats = self
                .champion
                .as_ref()
                .map_or(true, |(_, score)| stats.best_score > *score);
            if beats {
                self.champion = Some((best.clone(), stats.best_score));
            }
        }
        self.cycles += 1;
        self.stats.extend(run.stats);
        self.best_individuals.extend(run.best_individuals);
        self.final_population = run.final_population;
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn exit_reason(&self) -> ExitReason {
        self.exit
    }

    /// Number of populations evolved (1 + restarts).
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Per-generation statistics across every cycle, in order.
    pub fn stats(&self) -> &[GenStats] {
        &self.stats
    }

    /// Best individual of each generation, aligned with [`Self::stats`].
    pub fn best_individuals(&self) -> &[I] {
        &self.best_individuals
    }

    pub fn final_population(&self) -> &[I] {
        &self.final_population
    }

    /// Best individual of the whole run with its normalized score.
    pub fn champion(&self) -> Option<(&I, f64)> {
        self.champion.as_ref().map(|(i, s)| (i, *s))
    }
}

/// Optional event sink. Send failures (receiver gone) are ignored.
struct Events<'a, I>(Option<&'a Sender<SolverEvent<I>>>);

impl<'a, I> Events<'a, I> {
    fn send_with(&self, event: impl FnOnce() -> SolverEvent<I>) {
        if let Some(tx) = self.0 {
            let _ = tx.send(event());
        }
    }
}

pub struct GeneticAlgorithm<S: Seeder> {
    seeder: S,
    params: Params,
    cancelled: Arc<AtomicBool>,
}

impl<S: Seeder> GeneticAlgorithm<S> {
    pub fn new(seeder: S, params: Params) -> Result<Self, EngineError> {
        params.validate()?;
        Ok(Self {
            seeder,
            params,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn seeder(&self) -> &S {
        &self.seeder
    }

    /// Flag checked between generations. Raising it stops the run cleanly;
    /// it is lowered again when the run returns.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Uses an existing flag, e.g. one already wired to a signal handler.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Spawns a fresh population. Each individual gets its own RNG seeded
    /// from `rng`, so the result does not depend on thread scheduling.
    pub fn init_population<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<S::Individual> {
        let seeds: Vec<u64> = (0..self.params.population_size).map(|_| rng.gen()).collect();
        seeds
            .par_iter()
            .map(|&seed| self.seeder.spawn(&mut ChaCha8Rng::seed_from_u64(seed)))
            .collect()
    }

    /// Performs one generation: mutate everything but the elite, score,
    /// draw parents proportionally to the biased scores, reproduce, and
    /// carry this generation's best individual over unchanged.
    pub fn run_generation<R: Rng + ?Sized>(
        &self,
        mut population: Vec<S::Individual>,
        elite: Option<usize>,
        cycle: usize,
        generation: usize,
        rng: &mut R,
    ) -> Result<Generation<S::Individual>, EngineError> {
        let n = population.len();

        // A. Mutation
        let seeds: Vec<u64> = (0..n).map(|_| rng.gen()).collect();
        population
            .par_iter_mut()
            .zip(seeds.par_iter())
            .enumerate()
            .for_each(|(i, (individual, &seed))| {
                if Some(i) != elite {
                    individual.mutate(&mut ChaCha8Rng::seed_from_u64(seed));
                }
            });

        // B. Evaluation
        let scores: Vec<f64> = population
            .par_iter()
            .map(|individual| individual.normalized_score())
            .collect::<Result<_, _>>()?;

        let mut score_stats = StatCollector::new();
        let mut mutation_stats = StatCollector::new();
        let mut mating_stats = StatCollector::new();
        for (i, (individual, &score)) in population.iter().zip(scores.iter()).enumerate() {
            score_stats.collect(score, i);
            mutation_stats.collect(individual.mutation_probability(), i);
            mating_stats.collect(individual.mating_probability(), i);
        }
        let best_index = score_stats.greatest_index();

        // C. Selection
        let weights: Vec<f64> = scores
            .iter()
            .map(|&s| biased_weight(s, self.params.selection_exponent))
            .collect();
        let sampler = ParentSampler::new(&weights);

        let offspring = n.saturating_sub(1);
        let fathers = sampler.draw(offspring, rng);
        let mothers = sampler.draw(offspring, rng);

        // D. Reproduction
        let mut next = Vec::with_capacity(n);
        for (f, m) in fathers.into_iter().zip(mothers) {
            next.push(population[f].reproduce(&population[m], rng));
        }

        // E. Elitism
        let best = population.swap_remove(best_index);
        next.push(best.clone());

        let stats = GenStats {
            cycle,
            generation,
            best_score: score_stats.greatest(),
            best_raw_score: best.raw_score(),
            mean_score: score_stats.mean(),
            worst_score: score_stats.smallest(),
            best_index,
            mean_mutation_probability: mutation_stats.mean(),
            mean_mating_probability: mating_stats.mean(),
            uniform_fallback: sampler.is_fallback(),
        };

        Ok(Generation {
            elite: next.len() - 1,
            population: next,
            best,
            stats,
        })
    }

    /// Evolves one fresh population until it succeeds, gets blocked, or the
    /// cancel flag is raised.
    pub fn run_population<R: Rng + ?Sized>(
        &self,
        cycle: usize,
        rng: &mut R,
    ) -> Result<PopulationRun<S::Individual>, EngineError> {
        self.evolve(cycle, rng, &Events(None))
    }

    fn evolve<R: Rng + ?Sized>(
        &self,
        cycle: usize,
        rng: &mut R,
        events: &Events<'_, S::Individual>,
    ) -> Result<PopulationRun<S::Individual>, EngineError> {
        if self.is_cancelled() {
            return Ok(PopulationRun {
                exit: ExitReason::Interrupted,
                stats: Vec::new(),
                best_individuals: Vec::new(),
                final_population: Vec::new(),
            });
        }
        let mut population = self.init_population(rng);
        let mut elite = None;
        let mut detector = StagnationDetector::from_params(&self.params);

        let mut stats_history = Vec::new();
        let mut best_individuals = Vec::new();

        let exit = loop {
            if self.is_cancelled() {
                break ExitReason::Interrupted;
            }

            let generation = detector.generations();
            let outcome = self.run_generation(population, elite, cycle, generation, rng)?;
            population = outcome.population;
            elite = Some(outcome.elite);

            let stats = outcome.stats;
            debug!(
                "cycle {} gen {}: max {:.2} avg {:.2} min {:.2}",
                cycle, generation, stats.best_score, stats.mean_score, stats.worst_score
            );
            events.send_with(|| SolverEvent::GenerationUpdate(stats.clone()));

            let verdict = detector.observe(stats.best_score);
            stats_history.push(stats);

            match verdict {
                Verdict::Improved | Verdict::Solved => {
                    events.send_with(|| SolverEvent::NewBest(outcome.best.clone()));
                }
                Verdict::Stalled | Verdict::Blocked => {}
            }
            best_individuals.push(outcome.best);

            match verdict {
                Verdict::Solved => break ExitReason::Success,
                Verdict::Blocked => break ExitReason::Blocked,
                Verdict::Improved | Verdict::Stalled => {}
            }
        };

        Ok(PopulationRun {
            exit,
            stats: stats_history,
            best_individuals,
            final_population: population,
        })
    }

    /// Evolves populations until success or interruption. A blocked
    /// population is discarded and replaced by a fresh one when restarts
    /// are enabled.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RunReport<S::Individual>, EngineError> {
        self.execute(rng, &Events(None))
    }

    pub fn run_seeded(&self, seed: u64) -> Result<RunReport<S::Individual>, EngineError> {
        self.run(&mut ChaCha8Rng::seed_from_u64(seed))
    }

    /// Runs with `params.seed` (or entropy) and streams progress over `tx`.
    pub fn solve(&self, tx: Sender<SolverEvent<S::Individual>>) -> Result<RunReport<S::Individual>, EngineError> {
        let mut rng = match self.params.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        self.execute(&mut rng, &Events(Some(&tx)))
    }

    fn execute<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        events: &Events<'_, S::Individual>,
    ) -> Result<RunReport<S::Individual>, EngineError> {
        let start = Instant::now();
        let mut report = RunReport::new(Uuid::new_v4());
        info!(
            "Run {} started: {} x {}",
            report.run_id(),
            self.params.population_size,
            self.seeder.label()
        );
        events.send_with(|| SolverEvent::Log("Initializing Population...".to_string()));

        let mut cycle = 0;
        loop {
            let outcome = self.evolve(cycle, rng, events)?;
            let generations = outcome.stats.len();
            let exit = outcome.exit;
            report.absorb(outcome);

            let may_restart = self.params.restart_on_stagnation
                && self.params.max_restarts.map_or(true, |max| cycle < max);

            if exit == ExitReason::Blocked && may_restart {
                cycle += 1;
                info!(
                    "Population blocked after {} generations -> restart #{}",
                    generations, cycle
                );
                events.send_with(|| {
                    SolverEvent::Log(format!("Blocked after {} generations -> Reseeding", generations))
                });
                events.send_with(|| SolverEvent::Restarted { cycle });
                continue;
            }
            break;
        }

        info!(
            "Run {} finished: {:?} after {} generations in {} cycle(s), {:.2}s",
            report.run_id(),
            report.exit_reason(),
            report.stats().len(),
            report.cycles(),
            start.elapsed().as_secs_f64()
        );
        self.cancelled.store(false, Ordering::Relaxed);
        let exit = report.exit_reason();
        events.send_with(|| SolverEvent::Finished(exit));
        Ok(report)
    }
}
