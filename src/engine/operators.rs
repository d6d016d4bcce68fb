use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::domain::{Cell, GridShape};
use crate::core::puzzle::Puzzle;

/// Values still owed by the free cells so that every value reaches its
/// target multiplicity across the whole grid.
///
/// Runs `min(width, height)` passes over `1..=value_number`; each occurrence
/// already provided by a given cell is consumed instead of emitted.
pub fn owed_values(puzzle: &Puzzle) -> Vec<u16> {
    let shape = puzzle.shape();
    let max_value = shape.value_number();
    let passes = shape.width.min(shape.height);

    let mut given_pool = vec![0usize; max_value + 1];
    for cell in puzzle.given_cells() {
        if let Some(v) = cell.value {
            given_pool[v as usize] += 1;
        }
    }

    let mut numbers = Vec::with_capacity(puzzle.free_indices().len());
    for _ in 0..passes {
        for value in 1..=max_value {
            if given_pool[value] > 0 {
                given_pool[value] -= 1;
            } else {
                numbers.push(value as u16);
            }
        }
    }
    numbers
}

/// Fills every free cell with a shuffled owed value.
///
/// There are never fewer owed values than free cells. When the givens
/// over-represent some value there are more, and the surplus is dropped.
pub fn random_fill<R: Rng + ?Sized>(cells: &mut [Cell], puzzle: &Puzzle, rng: &mut R) {
    let mut values = owed_values(puzzle);
    values.shuffle(rng);

    for (&index, value) in puzzle.free_indices().iter().zip(values) {
        cells[index].value = Some(value);
    }
}

/// Reassigns each free cell, with probability `probability`, to a uniform
/// value in `1..=value_number`.
pub fn mutate_free_cells<R: Rng + ?Sized>(
    cells: &mut [Cell],
    puzzle: &Puzzle,
    probability: f64,
    rng: &mut R,
) {
    let max_value = puzzle.value_number() as u16;
    for &index in puzzle.free_indices() {
        debug_assert!(!puzzle.is_given(index), "mutation reached a given cell");
        if rng.gen::<f64>() < probability {
            cells[index].value = Some(rng.gen_range(1..=max_value));
        }
    }
}

// --- Crossover ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

/// A single-cut crossover: cells whose coordinate on `axis` is below
/// `threshold` come from the first parent, the rest from the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlan {
    pub axis: Axis,
    pub threshold: usize,
}

impl SplitPlan {
    /// Draws the axis uniformly, then a threshold in `[0, extent - 2]`.
    pub fn random<R: Rng + ?Sized>(shape: &GridShape, rng: &mut R) -> Self {
        let axis = if rng.gen_bool(0.5) { Axis::Row } else { Axis::Column };
        let extent = match axis {
            Axis::Row => shape.width,
            Axis::Column => shape.height,
        };
        let threshold = if extent >= 2 {
            rng.gen_range(0..=extent - 2)
        } else {
            0
        };
        Self { axis, threshold }
    }

    /// Builds the child cells. Every cell is an owned copy; given positions
    /// are rewritten from `puzzle`, never taken from a parent.
    pub fn apply(&self, first: &[Cell], second: &[Cell], puzzle: &Puzzle) -> Vec<Cell> {
        first
            .iter()
            .zip(second.iter())
            .enumerate()
            .map(|(index, (f, s))| {
                if let Some(given) = puzzle.given_value(index) {
                    return Cell {
                        position: f.position,
                        value: Some(given),
                    };
                }
                let coordinate = match self.axis {
                    Axis::Row => f.position.row,
                    Axis::Column => f.position.col,
                };
                if coordinate < self.threshold {
                    *f
                } else {
                    *s
                }
            })
            .collect()
    }
}
