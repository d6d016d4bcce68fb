use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::domain::{Cell, GridShape, Position};
use crate::core::error::ConfigError;
use crate::core::layout::PartitionMap;

/// Names accepted by [`Puzzle::builtin`].
pub const BUILTIN_PUZZLES: [&str; 3] = ["tiny_4x4", "small_6x6", "classic_9x9"];

/// A validated puzzle instance: the grid shape, its given cells and the
/// score bounds derived from the shape. Shared read-only by every individual.
#[derive(Debug, Clone)]
pub struct Puzzle {
    name: String,
    shape: GridShape,
    given_cells: Vec<Cell>,
    /// Given value per cell index, `None` for free cells.
    given_values: Vec<Option<u16>>,
    free_indices: Vec<usize>,
    layout: PartitionMap,
    floor: f64,
    maxi: f64,
}

impl Puzzle {
    pub fn new(shape: GridShape, givens: Vec<Cell>) -> Result<Self, ConfigError> {
        // Re-validate in case the shape was built field by field.
        let shape = GridShape::new(
            shape.width,
            shape.height,
            shape.square_width,
            shape.square_height,
        )?;
        let max = shape.value_number() as u16;

        let mut given_values = vec![None; shape.cell_count()];
        let mut seen = HashSet::with_capacity(givens.len());
        for cell in &givens {
            let Position { row, col } = cell.position;
            if !shape.contains(cell.position) {
                return Err(ConfigError::GivenOutOfBounds {
                    row,
                    col,
                    width: shape.width,
                    height: shape.height,
                });
            }
            let value = cell
                .value
                .ok_or(ConfigError::GivenWithoutValue { row, col })?;
            if value == 0 || value > max {
                return Err(ConfigError::ValueOutOfRange { row, col, value, max });
            }
            if !seen.insert(cell.position) {
                return Err(ConfigError::DuplicateGiven { row, col });
            }
            given_values[shape.index_of(cell.position)] = Some(value);
        }

        let floor = shape.score_floor();
        let maxi = shape.score_max();
        if !floor.is_finite() || !maxi.is_finite() || maxi <= floor {
            return Err(ConfigError::DegenerateScoreRange { floor, maxi });
        }

        let mut given_cells = givens;
        given_cells.sort_by_key(|c| c.position);

        let free_indices = given_values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(i, _)| i)
            .collect();

        Ok(Self {
            name: "custom".to_string(),
            layout: PartitionMap::new(&shape),
            shape,
            given_cells,
            given_values,
            free_indices,
            floor,
            maxi,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Parses a grid written one row per line. Cells are separated by
    /// whitespace; `.`, `0`, `-` and `_` mark blanks. A line made of a single
    /// token is read one character per cell.
    pub fn parse(text: &str, square_width: usize, square_height: usize) -> Result<Self, ConfigError> {
        let mut rows: Vec<Vec<Option<u16>>> = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let tokens: Vec<String> = match line.split_whitespace().collect::<Vec<_>>() {
                t if t.len() == 1 => t[0].chars().map(String::from).collect(),
                t => t.into_iter().map(String::from).collect(),
            };

            let mut row = Vec::with_capacity(tokens.len());
            for token in tokens {
                let value = match token.as_str() {
                    "." | "0" | "-" | "_" => None,
                    t => Some(t.parse::<u16>().map_err(|_| ConfigError::Parse {
                        line: line_no + 1,
                        reason: format!("invalid cell `{}`", t),
                    })?),
                };
                row.push(value);
            }

            if let Some(first) = rows.first() {
                if first.len() != row.len() {
                    return Err(ConfigError::Parse {
                        line: line_no + 1,
                        reason: format!("expected {} cells, found {}", first.len(), row.len()),
                    });
                }
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ConfigError::Parse {
                line: 0,
                reason: "no grid rows".to_string(),
            });
        }

        let shape = GridShape::new(rows.len(), rows[0].len(), square_width, square_height)?;
        let givens = rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .filter_map(move |(c, v)| v.map(|v| Cell::given(r, c, v)))
            })
            .collect();

        Self::new(shape, givens)
    }

    /// Looks up a puzzle from the built-in catalog.
    pub fn builtin(name: &str) -> Option<Self> {
        let (text, sw, sh) = match name {
            "tiny_4x4" => (TINY_4X4, 2, 2),
            "small_6x6" => (SMALL_6X6, 3, 2),
            "classic_9x9" => (CLASSIC_9X9, 3, 3),
            _ => return None,
        };
        // Catalog entries are fixed and known to be well formed.
        Self::parse(text, sw, sh).ok().map(|p| p.with_name(name))
    }

    // --- Accessors ---

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    pub fn given_cells(&self) -> &[Cell] {
        &self.given_cells
    }

    #[inline]
    pub fn given_value(&self, index: usize) -> Option<u16> {
        self.given_values[index]
    }

    #[inline]
    pub fn is_given(&self, index: usize) -> bool {
        self.given_values[index].is_some()
    }

    /// Row-major indices of the free cells.
    pub fn free_indices(&self) -> &[usize] {
        &self.free_indices
    }

    pub fn layout(&self) -> &PartitionMap {
        &self.layout
    }

    pub fn value_number(&self) -> usize {
        self.shape.value_number()
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    pub fn maxi(&self) -> f64 {
        self.maxi
    }
}

// --- File Format ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GivenEntry {
    pub row: usize,
    pub col: usize,
    pub value: u16,
}

/// JSON description of a puzzle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub width: usize,
    pub height: usize,
    pub square_width: usize,
    pub square_height: usize,
    pub givens: Vec<GivenEntry>,
}

impl PuzzleDefinition {
    pub fn into_puzzle(self) -> Result<Puzzle, ConfigError> {
        let shape = GridShape::new(self.width, self.height, self.square_width, self.square_height)?;
        let givens = self
            .givens
            .iter()
            .map(|g| Cell::given(g.row, g.col, g.value))
            .collect();
        let puzzle = Puzzle::new(shape, givens)?;
        Ok(match self.name {
            Some(name) => puzzle.with_name(name),
            None => puzzle,
        })
    }
}

/// Loads a puzzle from a JSON definition file.
pub fn load_definition(path: &Path) -> Result<Puzzle> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read puzzle file {}", path.display()))?;
    let definition: PuzzleDefinition = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse puzzle file {}", path.display()))?;
    let puzzle = definition
        .into_puzzle()
        .with_context(|| format!("Invalid puzzle in {}", path.display()))?;
    Ok(puzzle)
}

// --- Catalog ---

const TINY_4X4: &str = "
1.3.
.4.2
2.4.
.3.1
";

const SMALL_6X6: &str = "
1.2.36
.53.1.
3.1.25
41.2.3
.26.4.
63.15.
";

const CLASSIC_9X9: &str = "
53..7....
6..195...
.98....6.
8...6...3
4..8.3..1
7...2...6
.6....28.
...419..5
....8..79
";
