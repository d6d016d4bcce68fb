use thiserror::Error;

/// Configuration errors. Raised at construction time and never clamped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid dimensions must be non-zero (got {width}x{height}, box {square_width}x{square_height})")]
    ZeroDimension {
        width: usize,
        height: usize,
        square_width: usize,
        square_height: usize,
    },

    #[error("box {square_width}x{square_height} does not tile a {width}x{height} grid")]
    UnevenTiling {
        width: usize,
        height: usize,
        square_width: usize,
        square_height: usize,
    },

    #[error("given cell ({row}, {col}) lies outside the {width}x{height} grid")]
    GivenOutOfBounds {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },

    #[error("given cell ({row}, {col}) has no value")]
    GivenWithoutValue { row: usize, col: usize },

    #[error("duplicate given cell at ({row}, {col})")]
    DuplicateGiven { row: usize, col: usize },

    #[error("value {value} at ({row}, {col}) is outside 1..={max}")]
    ValueOutOfRange {
        row: usize,
        col: usize,
        value: u16,
        max: u16,
    },

    #[error("value at ({row}, {col}) conflicts with the given value {given}")]
    GivenConflict { row: usize, col: usize, given: u16 },

    #[error("expected {expected} cell values, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },

    #[error("degenerate score range: floor {floor} and maxi {maxi}")]
    DegenerateScoreRange { floor: f64, maxi: f64 },

    #[error("puzzle parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParam { name: &'static str, reason: String },
}
