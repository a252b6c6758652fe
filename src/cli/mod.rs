//! CLI command handlers

pub mod commands;

pub use commands::{execute, formulas, solve, validate};
