use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::unbounded;
use gridforge::core::domain::Params;
use gridforge::core::sudoku::SudokuSeeder;
use gridforge::interface::state::{RunMonitor, WorkerStatus};
use gridforge::solvers::ga::GeneticAlgorithm;
use gridforge::solvers::{EngineError, ExitReason, SolverEvent};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::common::{builtin, four_blank_4x4, Flat, FlatSeeder, TripwireSeeder, WalkerSeeder};

mod common;

fn params(population_size: usize) -> Params {
    Params {
        population_size,
        restart_on_stagnation: false,
        ..Params::default()
    }
}

#[test]
fn test_invalid_params_are_rejected() {
    let bad = Params {
        population_size: 0,
        ..Params::default()
    };
    assert!(matches!(
        GeneticAlgorithm::new(FlatSeeder(1.0), bad),
        Err(EngineError::Config(_))
    ));

    let bad = Params {
        mutation_probability: 1.5,
        ..Params::default()
    };
    assert!(GeneticAlgorithm::new(FlatSeeder(1.0), bad).is_err());
}

#[test]
fn test_flat_population_gets_blocked() {
    let ga = GeneticAlgorithm::new(FlatSeeder(50.0), params(10)).unwrap();
    let report = ga.run_seeded(1).unwrap();

    assert_eq!(report.exit_reason(), ExitReason::Blocked);
    assert_eq!(report.cycles(), 1);
    // One improving generation, then 21 without progress.
    assert_eq!(report.stats().len(), 22);
    assert_eq!(report.best_individuals().len(), report.stats().len());
    assert!(report.stats().iter().all(|s| s.best_score == 50.0));
}

#[test]
fn test_perfect_population_succeeds_immediately() {
    let ga = GeneticAlgorithm::new(FlatSeeder(100.0), params(5)).unwrap();
    let report = ga.run_seeded(1).unwrap();

    assert_eq!(report.exit_reason(), ExitReason::Success);
    assert_eq!(report.stats().len(), 1);
    assert_eq!(report.stats()[0].generation, 0);
    assert_eq!(report.champion().map(|(_, s)| s), Some(100.0));
}

#[test]
fn test_zero_scores_fall_back_to_uniform_selection() {
    let ga = GeneticAlgorithm::new(FlatSeeder(0.0), params(8)).unwrap();
    let report = ga.run_seeded(3).unwrap();

    assert_eq!(report.exit_reason(), ExitReason::Blocked);
    assert!(report.stats().iter().all(|s| s.uniform_fallback));
    assert_eq!(report.final_population().len(), 8);
}

#[test]
fn test_cancel_before_start_interrupts() {
    let ga = GeneticAlgorithm::new(FlatSeeder(50.0), params(10)).unwrap();
    ga.cancel_handle().store(true, Ordering::Relaxed);

    let report = ga.run_seeded(1).unwrap();
    assert_eq!(report.exit_reason(), ExitReason::Interrupted);
    assert!(report.stats().is_empty());
    assert!(report.champion().is_none());
}

#[test]
fn test_cancel_mid_run_keeps_completed_generations() {
    let cancel = Arc::new(AtomicBool::new(false));
    let mut seeder = TripwireSeeder::new(50.0, Arc::clone(&cancel));
    // Generation 0 mutates all 5, later ones skip the elite: 5 + 4 + 4.
    seeder.trip_at_mutation = 13;
    let ga = GeneticAlgorithm::new(seeder, params(5))
        .unwrap()
        .with_cancel_flag(Arc::clone(&cancel));

    let report = ga.run_seeded(4).unwrap();

    assert_eq!(report.exit_reason(), ExitReason::Interrupted);
    assert_eq!(report.cycles(), 1);
    assert_eq!(report.stats().len(), 3);
    assert_eq!(report.best_individuals().len(), report.stats().len());
    assert_eq!(report.stats()[2].generation, 2);
    assert_eq!(report.final_population().len(), 5);
    assert!(report.champion().is_some());
}

#[test]
fn test_cancel_during_reseed_keeps_evolved_population() {
    let cancel = Arc::new(AtomicBool::new(false));
    let mut seeder = TripwireSeeder::new(50.0, Arc::clone(&cancel));
    // The fifth spawn belongs to the population built after the first block.
    seeder.trip_at_spawn = 5;
    let p = Params {
        population_size: 4,
        ..Params::default()
    };
    let ga = GeneticAlgorithm::new(seeder, p)
        .unwrap()
        .with_cancel_flag(Arc::clone(&cancel));

    let report = ga.run_seeded(4).unwrap();

    assert_eq!(report.exit_reason(), ExitReason::Interrupted);
    assert_eq!(report.cycles(), 1);
    assert_eq!(report.stats().len(), 22);
    assert_eq!(report.final_population().len(), 4);
    assert!(report.final_population().iter().all(|t| t.id < 4));
}

#[test]
fn test_solver_is_reusable_after_cancel() {
    let ga = GeneticAlgorithm::new(FlatSeeder(50.0), params(6)).unwrap();
    ga.cancel_handle().store(true, Ordering::Relaxed);
    assert_eq!(ga.run_seeded(1).unwrap().exit_reason(), ExitReason::Interrupted);

    assert!(!ga.cancel_handle().load(Ordering::Relaxed));
    let second = ga.run_seeded(1).unwrap();
    assert_eq!(second.exit_reason(), ExitReason::Blocked);
    assert_eq!(second.stats().len(), 22);
}

#[test]
fn test_restarts_accumulate_history() {
    let p = Params {
        population_size: 6,
        restart_on_stagnation: true,
        max_restarts: Some(2),
        ..Params::default()
    };
    let ga = GeneticAlgorithm::new(FlatSeeder(50.0), p).unwrap();
    let report = ga.run_seeded(1).unwrap();

    assert_eq!(report.exit_reason(), ExitReason::Blocked);
    assert_eq!(report.cycles(), 3);
    assert_eq!(report.stats().len(), 66);
    for (cycle, chunk) in report.stats().chunks(22).enumerate() {
        assert!(chunk.iter().all(|s| s.cycle == cycle));
        assert_eq!(chunk[0].generation, 0);
        assert_eq!(chunk[21].generation, 21);
    }
}

#[test]
fn test_elite_is_not_mutated() {
    let ga = GeneticAlgorithm::new(FlatSeeder(0.0), params(3)).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let population = || {
        vec![
            Flat { score: 10.0, mutations: 0 },
            Flat { score: 20.0, mutations: 0 },
            Flat { score: 90.0, mutations: 0 },
        ]
    };

    let kept = ga.run_generation(population(), Some(2), 0, 1, &mut rng).unwrap();
    assert_eq!(kept.stats.best_index, 2);
    assert_eq!(kept.best.mutations, 0);
    assert_eq!(kept.population.len(), 3);
    assert_eq!(kept.elite, 2);
    assert_eq!(kept.population[kept.elite].score, 90.0);
    assert_eq!(kept.population[kept.elite].mutations, 0);

    let mutated = ga.run_generation(population(), None, 0, 0, &mut rng).unwrap();
    assert_eq!(mutated.best.mutations, 1);
}

#[test]
fn test_best_score_never_drops_within_a_cycle() {
    let puzzle = builtin("small_6x6");
    let p = params(60);
    let ga = GeneticAlgorithm::new(SudokuSeeder::new(puzzle, &p), p).unwrap();
    let report = ga.run_seeded(17).unwrap();

    assert_ne!(report.exit_reason(), ExitReason::Interrupted);
    for pair in report.stats().windows(2) {
        assert!(pair[1].best_score >= pair[0].best_score);
    }
}

#[test]
fn test_walker_keeps_population_size() {
    let ga = GeneticAlgorithm::new(WalkerSeeder, params(25)).unwrap();
    let report = ga.run_seeded(9).unwrap();

    assert_eq!(report.final_population().len(), 25);
    for pair in report.stats().windows(2) {
        assert!(pair[1].best_score >= pair[0].best_score);
    }
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let puzzle = builtin("tiny_4x4");
    let p = params(50);

    let first = GeneticAlgorithm::new(SudokuSeeder::new(Arc::clone(&puzzle), &p), p.clone())
        .unwrap()
        .run_seeded(123)
        .unwrap();
    let second = GeneticAlgorithm::new(SudokuSeeder::new(puzzle, &p), p)
        .unwrap()
        .run_seeded(123)
        .unwrap();

    assert_eq!(first.stats(), second.stats());
    assert_eq!(first.best_individuals(), second.best_individuals());
    assert_ne!(first.run_id(), second.run_id());
}

#[test]
fn test_solves_tiny_puzzles() {
    for puzzle in [four_blank_4x4(), builtin("tiny_4x4")] {
        let p = Params {
            population_size: 300,
            ..Params::default()
        };
        let ga = GeneticAlgorithm::new(SudokuSeeder::new(Arc::clone(&puzzle), &p), p).unwrap();
        let report = ga.run_seeded(42).unwrap();

        assert_eq!(report.exit_reason(), ExitReason::Success);
        let (best, score) = report.champion().unwrap();
        assert_eq!(score, 100.0);
        for given in puzzle.given_cells() {
            assert_eq!(best.value_at(given.position), given.value);
        }
    }
}

#[test]
fn test_solve_streams_events() {
    let p = Params {
        population_size: 4,
        seed: Some(7),
        ..Params::default()
    };
    let ga = GeneticAlgorithm::new(FlatSeeder(100.0), p).unwrap();
    let (tx, rx) = unbounded();

    let report = ga.solve(tx).unwrap();
    let events: Vec<SolverEvent<Flat>> = rx.try_iter().collect();

    assert!(matches!(events.first(), Some(SolverEvent::Log(_))));
    assert!(events
        .iter()
        .any(|e| matches!(e, SolverEvent::GenerationUpdate(s) if s.best_score == 100.0)));
    assert!(events.iter().any(|e| matches!(e, SolverEvent::NewBest(_))));
    assert!(matches!(
        events.last(),
        Some(SolverEvent::Finished(ExitReason::Success))
    ));
    assert_eq!(report.exit_reason(), ExitReason::Success);
}

#[test]
fn test_monitor_follows_a_run() {
    let p = Params {
        population_size: 6,
        max_restarts: Some(1),
        seed: Some(2),
        ..Params::default()
    };
    let ga = GeneticAlgorithm::new(FlatSeeder(50.0), p).unwrap();
    let (tx, rx) = unbounded();
    let mut monitor: RunMonitor<Flat> = RunMonitor::new();
    monitor.set_channel(rx);
    assert_eq!(monitor.status, WorkerStatus::Running);

    ga.solve(tx).unwrap();
    let lines = monitor.tick();

    assert_eq!(lines.len(), 44);
    assert_eq!(monitor.total_generations, 44);
    assert_eq!(monitor.cycle, 1);
    assert_eq!(monitor.status, WorkerStatus::Finished(ExitReason::Blocked));
    assert!(monitor.is_done());
    assert_eq!(monitor.telemetry.best_ever, Some(50.0));
    assert_eq!(monitor.telemetry.best_at, Some((0, 0)));
    assert_eq!(
        monitor.telemetry.summary(),
        "best 50.00 first reached in cycle 0 at generation 0"
    );
    assert!(monitor.current_best.is_some());
    assert!(monitor.logs.iter().any(|l| l.contains("Restarted")));
}

#[test]
fn test_monitor_reports_disconnect() {
    let (tx, rx) = unbounded::<SolverEvent<Flat>>();
    let mut monitor = RunMonitor::new();
    monitor.set_channel(rx);
    drop(tx);

    assert!(monitor.tick().is_empty());
    assert_eq!(monitor.status, WorkerStatus::Disconnected);
    assert!(monitor.is_done());
}
