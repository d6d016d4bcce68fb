use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;

// --- Constants ---
pub const DEFAULT_SELECTION_EXPONENT: i32 = 10;
pub const DEFAULT_STAGNATION_WARMUP: usize = 20;

// --- Grid Types ---

/// Coordinates of a cell. `row` runs over the grid width, `col` over its height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

/// A slot of the grid. `None` means the value is not known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub position: Position,
    pub value: Option<u16>,
}

impl Cell {
    pub fn new(row: usize, col: usize, value: Option<u16>) -> Self {
        Self {
            position: Position::new(row, col),
            value,
        }
    }

    /// Shorthand for a cell with a known value.
    pub fn given(row: usize, col: usize, value: u16) -> Self {
        Self::new(row, col, Some(value))
    }

    /// Builds a set of cells from `(row, col, value)` triples.
    pub fn build(data: &[(usize, usize, u16)]) -> Vec<Cell> {
        data.iter().map(|&(r, c, v)| Cell::given(r, c, v)).collect()
    }
}

/// Dimensions of a grid and of the boxes tiling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub width: usize,
    pub height: usize,
    pub square_width: usize,
    pub square_height: usize,
}

impl GridShape {
    pub fn new(
        width: usize,
        height: usize,
        square_width: usize,
        square_height: usize,
    ) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 || square_width == 0 || square_height == 0 {
            return Err(ConfigError::ZeroDimension {
                width,
                height,
                square_width,
                square_height,
            });
        }
        if width % square_width != 0
            || height % square_height != 0
            || square_width * square_height != width
        {
            return Err(ConfigError::UnevenTiling {
                width,
                height,
                square_width,
                square_height,
            });
        }
        Ok(Self {
            width,
            height,
            square_width,
            square_height,
        })
    }

    /// A classic 9x9 board with 3x3 boxes.
    pub fn classic() -> Self {
        Self {
            width: 9,
            height: 9,
            square_width: 3,
            square_height: 3,
        }
    }

    /// Size of the symbol alphabet.
    #[inline]
    pub fn value_number(&self) -> usize {
        self.width.max(self.height)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn box_size(&self) -> usize {
        self.square_width * self.square_height
    }

    #[inline]
    pub fn box_count(&self) -> usize {
        (self.width / self.square_width) * (self.height / self.square_height)
    }

    #[inline]
    pub fn contains(&self, position: Position) -> bool {
        position.row < self.width && position.col < self.height
    }

    /// Row-major flat index. Callers must pass a position inside the grid.
    #[inline]
    pub fn index_of(&self, position: Position) -> usize {
        position.row * self.height + position.col
    }

    #[inline]
    pub fn position_of(&self, index: usize) -> Position {
        Position::new(index / self.height, index % self.height)
    }

    /// Box coordinates `(row / square_width, col / square_height)`.
    #[inline]
    pub fn box_of(&self, position: Position) -> (usize, usize) {
        (
            position.row / self.square_width,
            position.col / self.square_height,
        )
    }

    /// Closed-form minimum of the raw score: every row, column and box holds
    /// a single distinct value and no value reaches its target multiplicity.
    pub fn score_floor(&self) -> f64 {
        let rows = self.width as f64;
        let cols = self.height as f64;
        let boxes = self.box_count() as f64;
        rows * rows + cols * cols + boxes * boxes
    }

    /// Closed-form maximum of the raw score: every partition is as distinct as
    /// the alphabet allows and every reachable value count is exact.
    pub fn score_max(&self) -> f64 {
        let vn = self.value_number();
        let rows = (self.width * self.height.min(vn)) as f64;
        let cols = (self.height * self.width.min(vn)) as f64;
        let boxes = (self.box_count() * self.box_size().min(vn)) as f64;
        let multiplicity = vn.min(self.cell_count() / vn) as f64;
        rows * rows + cols * cols + boxes * boxes + multiplicity * multiplicity
    }
}

// --- Configuration Types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Seed for the run RNG. `None` draws one from entropy.
    pub seed: Option<u64>,
    pub threads: usize,

    // GA Specific
    pub population_size: usize,
    pub mutation_probability: f64,
    pub mating_probability: f64,
    /// Scores are raised to this power before the weighted parent draw.
    pub selection_exponent: i32,

    // Stagnation
    pub stagnation_warmup: usize,
    pub stagnation_divisor: usize,
    pub restart_on_stagnation: bool,
    pub max_restarts: Option<usize>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            seed: None,
            threads: 4,
            population_size: 1000,
            mutation_probability: 0.03,
            mating_probability: 0.5,
            selection_exponent: DEFAULT_SELECTION_EXPONENT,
            stagnation_warmup: DEFAULT_STAGNATION_WARMUP,
            stagnation_divisor: 2,
            restart_on_stagnation: true,
            max_restarts: None,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::InvalidParam {
                name: "population_size",
                reason: "must be at least 1".to_string(),
            });
        }
        for (name, p) in [
            ("mutation_probability", self.mutation_probability),
            ("mating_probability", self.mating_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::InvalidParam {
                    name,
                    reason: format!("{} is outside [0, 1]", p),
                });
            }
        }
        if self.selection_exponent < 1 {
            return Err(ConfigError::InvalidParam {
                name: "selection_exponent",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.stagnation_divisor == 0 {
            return Err(ConfigError::InvalidParam {
                name: "stagnation_divisor",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
