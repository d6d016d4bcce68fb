pub mod individual;
pub mod operators;
pub mod selection;
pub mod stats;
