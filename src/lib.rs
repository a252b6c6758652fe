//! FinanCalc - step-by-step financial math from calculation plans
//!
//! A language model reads a word problem and answers with a
//! [`CalculationPlan`]: an ordered list of steps, each naming a formula from
//! a fixed catalog and its inputs. This crate does all of the arithmetic.
//!
//! # Features
//!
//! - 39 catalog formulas (simple and compound interest, annuities, gradients, ...)
//! - `{{name}}` references between steps
//! - `formula_experimental` steps with a sandboxed arithmetic expression
//! - JSON Schema validation and plan linting
//! - Gemini and OpenRouter planners, run concurrently per request
//!
//! # Example
//!
//! ```no_run
//! use financalc::core::execute_plan;
//! use financalc::parser::parse_plan;
//! use std::path::Path;
//!
//! let plan = parse_plan(Path::new("plan.json"))?;
//! for step in execute_plan(&plan)? {
//!     println!("{}: {}", step.step.target_variable, step.substituted_formula);
//! }
//! # Ok::<(), financalc::error::CalcError>(())
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod parser;
pub mod planner;
pub mod solver;
pub mod types;

// Re-export commonly used types
pub use error::{CalcError, CalcResult};
pub use types::{format_value, CalculationPlan, CalculationStep, ExecutedStep, Inputs, Value};
