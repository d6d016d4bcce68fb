#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use gridforge::core::puzzle::Puzzle;
use gridforge::engine::individual::{Individual, Seeder};
use rand::Rng;

pub const SOLVED_4X4: &str = "
1234
3412
2143
4321
";

pub const SOLVED_6X6: &str = "
142536
253614
361425
415263
526341
634152
";

pub const SOLVED_9X9: &str = "
534678912
672195348
198342567
859761423
426853791
713924856
961537284
287419635
345286179
";

/// Row-major values of a solution text.
pub fn solution_values(text: &str) -> Vec<Option<u16>> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .flat_map(|l| l.chars().map(|c| c.to_digit(10).map(|d| d as u16)))
        .collect()
}

/// A 4x4 puzzle with one blank per row, column and box.
pub fn four_blank_4x4() -> Arc<Puzzle> {
    let text = "
.234
341.
21.3
4.21
";
    Arc::new(Puzzle::parse(text, 2, 2).expect("valid puzzle"))
}

pub fn builtin(name: &str) -> Arc<Puzzle> {
    Arc::new(Puzzle::builtin(name).expect("known puzzle"))
}

// --- Synthetic individuals ---

/// An individual whose score never changes.
#[derive(Debug, Clone)]
pub struct Flat {
    pub score: f64,
    pub mutations: usize,
}

impl Individual for Flat {
    fn raw_score(&self) -> f64 {
        self.score
    }

    fn score_floor(&self) -> f64 {
        0.0
    }

    fn score_max(&self) -> f64 {
        100.0
    }

    fn mutate<R: Rng + ?Sized>(&mut self, _rng: &mut R) {
        self.mutations += 1;
    }

    fn mate<R: Rng + ?Sized>(&self, _other: &Self, _rng: &mut R) -> Self {
        Flat {
            score: self.score,
            mutations: 0,
        }
    }
}

pub struct FlatSeeder(pub f64);

impl Seeder for FlatSeeder {
    type Individual = Flat;

    fn spawn<R: Rng + ?Sized>(&self, _rng: &mut R) -> Flat {
        Flat {
            score: self.0,
            mutations: 0,
        }
    }

    fn label(&self) -> &str {
        "flat"
    }
}

/// An individual scored by its own value; mutation adds a random step.
#[derive(Debug, Clone)]
pub struct Walker {
    pub value: f64,
}

impl Individual for Walker {
    fn raw_score(&self) -> f64 {
        self.value
    }

    fn score_floor(&self) -> f64 {
        0.0
    }

    fn score_max(&self) -> f64 {
        1000.0
    }

    fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.value = (self.value + rng.gen_range(-5.0..5.0)).clamp(0.0, 999.0);
    }

    fn mate<R: Rng + ?Sized>(&self, other: &Self, _rng: &mut R) -> Self {
        Walker {
            value: (self.value + other.value) / 2.0,
        }
    }
}

pub struct WalkerSeeder;

impl Seeder for WalkerSeeder {
    type Individual = Walker;

    fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Walker {
        Walker {
            value: rng.gen_range(0.0..100.0),
        }
    }
}

/// A constant-score individual that raises a cancel flag once the whole
/// population has performed `trip_at` mutations in total.
#[derive(Debug, Clone)]
pub struct Tripwire {
    pub score: f64,
    /// Spawn ordinal of the founding individual; kept by clones and children.
    pub id: usize,
    mutations: Arc<AtomicUsize>,
    trip_at: usize,
    cancel: Arc<AtomicBool>,
}

impl Individual for Tripwire {
    fn raw_score(&self) -> f64 {
        self.score
    }

    fn score_floor(&self) -> f64 {
        0.0
    }

    fn score_max(&self) -> f64 {
        100.0
    }

    fn mutate<R: Rng + ?Sized>(&mut self, _rng: &mut R) {
        let done = self.mutations.fetch_add(1, Ordering::SeqCst) + 1;
        if done == self.trip_at {
            self.cancel.store(true, Ordering::SeqCst);
        }
    }

    fn mate<R: Rng + ?Sized>(&self, _other: &Self, _rng: &mut R) -> Self {
        self.clone()
    }
}

/// Spawns [`Tripwire`]s. Raises the flag itself while spawning individual
/// number `trip_at_spawn` (1-based).
pub struct TripwireSeeder {
    pub score: f64,
    pub cancel: Arc<AtomicBool>,
    pub trip_at_mutation: usize,
    pub trip_at_spawn: usize,
    mutations: Arc<AtomicUsize>,
    spawned: AtomicUsize,
}

impl TripwireSeeder {
    pub fn new(score: f64, cancel: Arc<AtomicBool>) -> Self {
        Self {
            score,
            cancel,
            trip_at_mutation: usize::MAX,
            trip_at_spawn: usize::MAX,
            mutations: Arc::new(AtomicUsize::new(0)),
            spawned: AtomicUsize::new(0),
        }
    }
}

impl Seeder for TripwireSeeder {
    type Individual = Tripwire;

    fn spawn<R: Rng + ?Sized>(&self, _rng: &mut R) -> Tripwire {
        let id = self.spawned.fetch_add(1, Ordering::SeqCst);
        if id + 1 == self.trip_at_spawn {
            self.cancel.store(true, Ordering::SeqCst);
        }
        Tripwire {
            score: self.score,
            id,
            mutations: Arc::clone(&self.mutations),
            trip_at: self.trip_at_mutation,
            cancel: Arc::clone(&self.cancel),
        }
    }
}
