//! Static plan lint
//!
//! Checks a plan without executing it: formula names, experimental
//! expressions, back-references and the final target. Back-references form a
//! dependency graph between steps, which also yields an evaluation order.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::catalog::{Formula, StepFormula};
use super::expression;
use crate::types::{CalculationPlan, CalculationStep};

/// A single lint finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    /// Step the finding belongs to; `None` for plan-level findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    pub message: String,
}

impl LintIssue {
    fn step(step: &CalculationStep, message: impl Into<String>) -> Self {
        Self {
            step: Some(step.step_name.clone()),
            message: message.into(),
        }
    }

    fn plan(message: impl Into<String>) -> Self {
        Self {
            step: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LintIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.step {
            Some(step) => write!(f, "[{}] {}", step, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Result of linting a plan
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanReport {
    pub errors: Vec<LintIssue>,
    pub warnings: Vec<LintIssue>,
    /// Step target variables in a valid evaluation order; empty on a cycle
    pub order: Vec<String>,
}

impl PlanReport {
    /// True when the plan has no errors (warnings are allowed)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Lint a plan.
///
/// Errors: unknown formulas, experimental steps without a usable expression,
/// undefined or forward back-references, dependency cycles and a final target
/// nobody produces. Warnings: formula parameters missing from a step's inputs.
pub fn lint_plan(plan: &CalculationPlan) -> PlanReport {
    let mut report = PlanReport::default();

    for step in &plan.calculation_steps {
        check_formula(step, &mut report);
    }

    let mut graph = DiGraph::<String, ()>::new();
    let nodes: Vec<NodeIndex> = plan
        .calculation_steps
        .iter()
        .map(|step| graph.add_node(step.target_variable.clone()))
        .collect();

    // target -> indices of the steps that write it, in declaration order
    let mut producers: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, step) in plan.calculation_steps.iter().enumerate() {
        producers
            .entry(step.target_variable.as_str())
            .or_default()
            .push(index);
    }

    for (index, step) in plan.calculation_steps.iter().enumerate() {
        for name in step.references() {
            let writers = producers.get(name).map(Vec::as_slice).unwrap_or_default();

            // The value seen at execution time is the latest write before this step
            if let Some(&writer) = writers.iter().rev().find(|&&w| w < index) {
                graph.add_edge(nodes[writer], nodes[index], ());
            } else if plan.initial_data.contains_key(name) {
                continue;
            } else if let Some(&writer) = writers.first() {
                graph.add_edge(nodes[writer], nodes[index], ());
                report.errors.push(LintIssue::step(
                    step,
                    format!(
                        "Reference '{{{{{}}}}}' is only computed by a later step ('{}')",
                        name, plan.calculation_steps[writer].step_name
                    ),
                ));
            } else {
                report.errors.push(LintIssue::step(
                    step,
                    format!("Reference '{{{{{}}}}}' is never defined", name),
                ));
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => {
            report.order = order
                .iter()
                .filter_map(|idx| graph.node_weight(*idx).cloned())
                .collect();
        }
        Err(cycle) => {
            let name = graph
                .node_weight(cycle.node_id())
                .cloned()
                .unwrap_or_default();
            report.errors.push(LintIssue::plan(format!(
                "Circular dependency detected involving '{}'",
                name
            )));
        }
    }

    let target = &plan.final_target_variable;
    if !producers.contains_key(target.as_str()) && !plan.initial_data.contains_key(target) {
        report.errors.push(LintIssue::plan(format!(
            "Final target variable '{}' is not produced by any step",
            target
        )));
    }

    report
}

fn check_formula(step: &CalculationStep, report: &mut PlanReport) {
    let resolved = StepFormula::resolve(&step.formula_name, step.expression());

    match resolved {
        Ok(StepFormula::Catalog(formula)) => check_parameters(step, formula, report),
        Ok(StepFormula::Experimental(source)) => match expression::compile(source) {
            Ok(expr) => {
                for name in expr.variables() {
                    if !step.inputs.contains_key(&name) && !is_constant(&name) {
                        report.errors.push(LintIssue::step(
                            step,
                            format!("Expression variable '{}' is not bound in inputs", name),
                        ));
                    }
                }
            }
            Err(e) => report.errors.push(LintIssue::step(step, e.to_string())),
        },
        Err(e) => report.errors.push(LintIssue::step(step, e.to_string())),
    }
}

fn check_parameters(step: &CalculationStep, formula: Formula, report: &mut PlanReport) {
    for param in formula.info().parameters {
        if !step.inputs.contains_key(*param) {
            report.warnings.push(LintIssue::step(
                step,
                format!("Missing parameter '{}' for {}", param, formula),
            ));
        }
    }
}

fn is_constant(name: &str) -> bool {
    matches!(name, "pi" | "PI" | "e" | "E")
}
