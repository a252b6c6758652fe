//! Calculation engine: formula catalog, plan executor and plan lint

pub mod catalog;
pub mod dependencies;
pub mod executor;
pub mod expression;

pub use catalog::{evaluate_formula, Category, Evaluation, Formula, FormulaInfo, StepFormula, CATALOG};
pub use dependencies::{lint_plan, LintIssue, PlanReport};
pub use executor::{execute_plan, Execution, PlanExecutor, VariableTable};
