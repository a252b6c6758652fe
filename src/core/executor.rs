use std::collections::HashMap;

use tracing::{debug, info};

use super::catalog::evaluate_formula;
use crate::error::{CalcError, CalcResult};
use crate::types::{CalculationPlan, CalculationStep, ExecutedStep, Inputs, Value};

/// Named values known at a given point of a plan execution.
///
/// Seeded from `initial_data`; every executed step writes its target.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    values: HashMap<String, Value>,
}

impl VariableTable {
    #[must_use]
    pub fn new(initial_data: &Inputs) -> Self {
        Self {
            values: initial_data
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Insert or overwrite a value
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric value of a variable, if present and numeric
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_number)
    }

    /// Replace every `{{name}}` back-reference in `inputs` with its current value
    pub fn resolve(&self, inputs: &Inputs) -> CalcResult<Inputs> {
        inputs
            .iter()
            .map(|(param, value)| {
                let resolved = match value.as_reference() {
                    Some(name) => self
                        .get(name)
                        .cloned()
                        .ok_or_else(|| CalcError::Reference(name.to_string()))?,
                    None => value.clone(),
                };
                Ok((param.clone(), resolved))
            })
            .collect()
    }
}

/// Outcome of a full plan run
#[derive(Debug, Clone)]
pub struct Execution {
    pub steps: Vec<ExecutedStep>,
    pub variables: VariableTable,
}

impl Execution {
    /// Value of the plan's `final_target_variable`, if it was produced
    pub fn final_value(&self, plan: &CalculationPlan) -> Option<f64> {
        self.variables.number(&plan.final_target_variable)
    }
}

/// Runs the steps of one plan in declaration order.
///
/// Each executor owns a fresh variable table; nothing is shared between runs.
pub struct PlanExecutor<'a> {
    plan: &'a CalculationPlan,
    variables: VariableTable,
}

impl<'a> PlanExecutor<'a> {
    #[must_use]
    pub fn new(plan: &'a CalculationPlan) -> Self {
        Self {
            plan,
            variables: VariableTable::new(&plan.initial_data),
        }
    }

    /// Execute every step. The first failure aborts the run and no partial
    /// results are returned.
    pub fn execute(mut self) -> CalcResult<Execution> {
        info!(
            steps = self.plan.calculation_steps.len(),
            target = %self.plan.final_target_variable,
            "Executing calculation plan"
        );

        let mut executed = Vec::with_capacity(self.plan.calculation_steps.len());
        for step in &self.plan.calculation_steps {
            executed.push(self.execute_step(step)?);
        }

        info!(steps = executed.len(), "Calculation plan complete");
        Ok(Execution {
            steps: executed,
            variables: self.variables,
        })
    }

    fn execute_step(&mut self, step: &CalculationStep) -> CalcResult<ExecutedStep> {
        let inputs = self.variables.resolve(&step.inputs)?;

        if step.is_experimental() && step.expression().is_none() {
            return Err(CalcError::MissingExpression(step.step_name.clone()));
        }

        let evaluation = evaluate_formula(&step.formula_name, &inputs, step.expression())?;

        debug!(
            step = %step.step_name,
            target = %step.target_variable,
            formula = %step.formula_name,
            result = evaluation.result,
            "Step executed"
        );

        self.variables
            .set(step.target_variable.clone(), Value::Number(evaluation.result));

        Ok(ExecutedStep {
            step: CalculationStep {
                inputs,
                ..step.clone()
            },
            result: evaluation.result,
            substituted_formula: evaluation.substituted_formula,
        })
    }
}

/// Execute a plan and return its executed steps in order
pub fn execute_plan(plan: &CalculationPlan) -> CalcResult<Vec<ExecutedStep>> {
    PlanExecutor::new(plan).execute().map(|execution| execution.steps)
}
