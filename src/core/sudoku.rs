use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::domain::{Cell, Params, Position};
use crate::core::error::ConfigError;
use crate::core::puzzle::Puzzle;
use crate::engine::individual::{Individual, Seeder};
use crate::engine::operators::{self, SplitPlan};

/// A candidate solution: one value per cell of the puzzle's grid.
#[derive(Debug, Clone)]
pub struct Sudoku {
    puzzle: Arc<Puzzle>,
    /// Row-major, one entry per position.
    cells: Vec<Cell>,
    mutation_probability: f64,
    mating_probability: f64,
}

impl Sudoku {
    /// Builds a grid whose free cells are still unknown.
    pub fn unfilled(puzzle: Arc<Puzzle>) -> Self {
        let shape = *puzzle.shape();
        let cells = (0..shape.cell_count())
            .map(|i| Cell {
                position: shape.position_of(i),
                value: puzzle.given_value(i),
            })
            .collect();

        let defaults = Params::default();
        Self {
            puzzle,
            cells,
            mutation_probability: defaults.mutation_probability,
            mating_probability: defaults.mating_probability,
        }
    }

    /// Builds a grid and fills its free cells with a value-balanced shuffle.
    pub fn new<R: Rng + ?Sized>(puzzle: Arc<Puzzle>, rng: &mut R) -> Self {
        let mut grid = Self::unfilled(puzzle);
        grid.randomly_fill(rng);
        grid
    }

    /// Builds a grid from explicit row-major values. Given positions must be
    /// either `None` or equal to the given value.
    pub fn from_values(puzzle: Arc<Puzzle>, values: &[Option<u16>]) -> Result<Self, ConfigError> {
        let expected = puzzle.shape().cell_count();
        if values.len() != expected {
            return Err(ConfigError::CellCountMismatch {
                expected,
                actual: values.len(),
            });
        }
        let max = puzzle.value_number() as u16;

        let mut grid = Self::unfilled(puzzle);
        for (index, &value) in values.iter().enumerate() {
            let Position { row, col } = grid.cells[index].position;
            match (grid.puzzle.given_value(index), value) {
                (Some(given), Some(v)) if v != given => {
                    return Err(ConfigError::GivenConflict { row, col, given });
                }
                (Some(_), _) => {}
                (None, Some(v)) if v == 0 || v > max => {
                    return Err(ConfigError::ValueOutOfRange { row, col, value: v, max });
                }
                (None, v) => grid.cells[index].value = v,
            }
        }
        Ok(grid)
    }

    pub fn with_probabilities(mut self, mutation: f64, mating: f64) -> Self {
        self.mutation_probability = mutation;
        self.mating_probability = mating;
        self
    }

    /// Reassigns every free cell from a fresh shuffle of the owed values.
    pub fn randomly_fill<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        operators::random_fill(&mut self.cells, &self.puzzle, rng);
    }

    // --- Accessors ---

    pub fn puzzle(&self) -> &Arc<Puzzle> {
        &self.puzzle
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn given_cells(&self) -> &[Cell] {
        self.puzzle.given_cells()
    }

    pub fn value_at(&self, position: Position) -> Option<u16> {
        let shape = self.puzzle.shape();
        if !shape.contains(position) {
            return None;
        }
        self.cells[shape.index_of(position)].value
    }

    /// Overwrites a free cell. Returns `false` for given or out-of-grid positions.
    pub fn set_free_value(&mut self, position: Position, value: Option<u16>) -> bool {
        let shape = self.puzzle.shape();
        if !shape.contains(position) {
            return false;
        }
        let index = shape.index_of(position);
        if self.puzzle.is_given(index) {
            return false;
        }
        self.cells[index].value = value;
        true
    }

    pub fn values(&self) -> Vec<Option<u16>> {
        self.cells.iter().map(|c| c.value).collect()
    }

    /// The four score terms before squaring: distinct totals over rows,
    /// columns and boxes, and the value-multiplicity credit.
    pub fn score_terms(&self) -> [f64; 4] {
        let vn = self.puzzle.value_number();
        let symbols = self.cells.iter().map(|c| c.value.map_or(0, usize::from));
        let [rows, cols, boxes] = self.puzzle.layout().distinct_totals(symbols, vn);

        let mut counts: HashMap<u16, usize> = HashMap::with_capacity(vn);
        for value in self.cells.iter().filter_map(|c| c.value) {
            *counts.entry(value).or_insert(0) += 1;
        }
        let multiplicity: f64 = counts
            .values()
            .map(|&n| match vn.checked_sub(n) {
                Some(0) => 1.0,
                Some(1) => 0.5,
                Some(2) => 0.25,
                _ => 0.0,
            })
            .sum();

        [rows as f64, cols as f64, boxes as f64, multiplicity]
    }

    pub fn snapshot(&self, generation: usize, score: f64) -> GridSnapshot {
        let shape = self.puzzle.shape();
        GridSnapshot {
            generation,
            score,
            rows: self
                .cells
                .chunks(shape.height)
                .map(|row| row.iter().map(|c| c.value).collect())
                .collect(),
        }
    }
}

impl Individual for Sudoku {
    fn raw_score(&self) -> f64 {
        self.score_terms().iter().map(|t| t * t).sum()
    }

    fn score_floor(&self) -> f64 {
        self.puzzle.floor()
    }

    fn score_max(&self) -> f64 {
        self.puzzle.maxi()
    }

    fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        operators::mutate_free_cells(&mut self.cells, &self.puzzle, self.mutation_probability, rng);
    }

    fn mate<R: Rng + ?Sized>(&self, other: &Self, rng: &mut R) -> Self {
        let mutation_probability = if rng.gen_bool(0.5) {
            self.mutation_probability
        } else {
            other.mutation_probability
        };
        let mating_probability = if rng.gen_bool(0.5) {
            self.mating_probability
        } else {
            other.mating_probability
        };

        let plan = SplitPlan::random(self.puzzle.shape(), rng);
        Self {
            cells: plan.apply(&self.cells, &other.cells, &self.puzzle),
            puzzle: Arc::clone(&self.puzzle),
            mutation_probability,
            mating_probability,
        }
    }

    fn mutation_probability(&self) -> f64 {
        self.mutation_probability
    }

    fn mating_probability(&self) -> f64 {
        self.mating_probability
    }
}

impl PartialEq for Sudoku {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
            && self.puzzle.given_cells() == other.puzzle.given_cells()
            && self.mutation_probability == other.mutation_probability
            && self.mating_probability == other.mating_probability
    }
}

/// ASCII art of the grid. Values are letters, upper case for given cells.
impl fmt::Display for Sudoku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = self.puzzle.shape();
        let rule = "-".repeat(1 + shape.height * 2 + (shape.height / shape.square_height) * 2);

        for (r, row) in self.cells.chunks(shape.height).enumerate() {
            if r % shape.square_width == 0 {
                writeln!(f, "{}", rule)?;
            }
            let mut line = String::new();
            for (c, cell) in row.iter().enumerate() {
                if c % shape.square_height == 0 {
                    line.push_str("| ");
                }
                let given = self.puzzle.is_given(shape.index_of(cell.position));
                line.push_str(&symbol(cell.value, given));
                line.push(' ');
            }
            line.push('|');
            writeln!(f, "{}", line)?;
        }
        write!(f, "{}", rule)
    }
}

fn symbol(value: Option<u16>, given: bool) -> String {
    match value {
        None => "-".to_string(),
        Some(v @ 1..=26) => {
            let letter = (b'a' + (v - 1) as u8) as char;
            if given {
                letter.to_ascii_uppercase().to_string()
            } else {
                letter.to_string()
            }
        }
        Some(v) => v.to_string(),
    }
}

/// Serializable copy of a grid, used for history export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub generation: usize,
    pub score: f64,
    pub rows: Vec<Vec<Option<u16>>>,
}

// --- Seeder ---

/// Spawns randomly filled grids for one puzzle.
#[derive(Debug, Clone)]
pub struct SudokuSeeder {
    puzzle: Arc<Puzzle>,
    mutation_probability: f64,
    mating_probability: f64,
}

impl SudokuSeeder {
    pub fn new(puzzle: Arc<Puzzle>, params: &Params) -> Self {
        Self {
            puzzle,
            mutation_probability: params.mutation_probability,
            mating_probability: params.mating_probability,
        }
    }

    pub fn puzzle(&self) -> &Arc<Puzzle> {
        &self.puzzle
    }
}

impl Seeder for SudokuSeeder {
    type Individual = Sudoku;

    fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Sudoku {
        Sudoku::new(Arc::clone(&self.puzzle), rng)
            .with_probabilities(self.mutation_probability, self.mating_probability)
    }

    fn label(&self) -> &str {
        self.puzzle.name()
    }
}
