pub mod core;
pub mod engine;
pub mod export;
pub mod interface;
pub mod solvers;
