use crate::core::catalog::{Category, Formula};
use crate::core::dependencies::lint_plan;
use crate::core::executor::PlanExecutor;
use crate::error::{CalcError, CalcResult};
use crate::parser;
use crate::planner::{HttpPlanner, Mode, PlannerConfig, ProviderSelection};
use crate::solver::{self, ProviderOutcome};
use crate::types::{CalculationPlan, ExecutedStep};
use colored::Colorize;
use std::path::PathBuf;

/// Format a number for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    // Six decimals are enough for rates and amounts alike
    let rounded = (n * 1e6).round() / 1e6;
    let formatted = format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string();
    if formatted == "-0" {
        "0".to_string()
    } else {
        formatted
    }
}

/// Execute the execute command
pub fn execute(file: PathBuf, json: bool) -> CalcResult<()> {
    let plan = parser::parse_plan(&file)?;

    if json {
        let steps = PlanExecutor::new(&plan).execute()?.steps;
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }

    println!("{}", "🧮 FinanCalc - Executing plan".bold().green());
    println!("   File: {}", file.display());
    if !plan.interpretation.is_empty() {
        println!("   {}", plan.interpretation.italic());
    }
    println!();

    let execution = match PlanExecutor::new(&plan).execute() {
        Ok(execution) => execution,
        Err(e) => {
            println!("{}", format!("❌ Execution failed: {}", e).bold().red());
            return Err(e);
        }
    };

    print_steps(&execution.steps);
    print_final(&plan, execution.final_value(&plan));
    Ok(())
}

fn print_steps(steps: &[ExecutedStep]) {
    println!("{}", "✅ Calculation steps:".bold().green());
    for (index, executed) in steps.iter().enumerate() {
        println!(
            "   {}. {} → {}",
            index + 1,
            executed.step.step_name.bold(),
            executed.step.target_variable.bright_blue()
        );
        println!("      {}", executed.step.formula_name.cyan());
        if let Some(ref generated) = executed.step.generated_formula {
            println!("      {}", generated.yellow());
        }
        println!("      {}", executed.substituted_formula);
    }
    println!();
}

fn print_final(plan: &CalculationPlan, value: Option<f64>) {
    match value {
        Some(value) => println!(
            "{} {} = {}",
            "🎯 Result:".bold().green(),
            plan.final_target_variable.bright_blue().bold(),
            format_number(value).bold()
        ),
        None => println!(
            "{}",
            format!(
                "⚠️  Final target '{}' was not computed",
                plan.final_target_variable
            )
            .yellow()
        ),
    }
}

/// Execute the validate command over one or more plan files
pub fn validate(files: Vec<PathBuf>) -> CalcResult<()> {
    let mut failed = 0;

    for file in &files {
        println!("{}", "✅ Validating plan".bold().green());
        println!("   File: {}", file.display());

        let plan = match parser::parse_plan(file) {
            Ok(plan) => plan,
            Err(e) => {
                println!("{}\n", format!("❌ {}", e).bold().red());
                failed += 1;
                continue;
            }
        };

        let report = lint_plan(&plan);
        for warning in &report.warnings {
            println!("   {}", format!("⚠️  {}", warning).yellow());
        }
        for error in &report.errors {
            println!("   {}", format!("❌ {}", error).red());
        }

        if report.is_valid() {
            println!(
                "   {} ({} steps, order: {})\n",
                "Plan is valid".bold().green(),
                plan.calculation_steps.len(),
                report.order.join(" → ")
            );
        } else {
            println!();
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(CalcError::Validation(format!(
            "{} of {} plan(s) failed validation",
            failed,
            files.len()
        )));
    }
    Ok(())
}

/// Execute the formulas command
pub fn formulas(json: bool) -> CalcResult<()> {
    if json {
        let catalog: Vec<_> = Category::ALL
            .into_iter()
            .flat_map(Formula::in_category)
            .collect();
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    println!("{}", "📚 FinanCalc - Formula catalog".bold().green());
    for category in Category::ALL {
        println!("\n   {}", category.title().bold());
        for info in Formula::in_category(category) {
            println!(
                "      {}  {}  [{}]",
                info.name.bright_blue(),
                info.expression,
                info.parameters.join(", ").cyan()
            );
        }
    }
    println!(
        "\n   {} plus {}",
        format!("{} formulas", crate::core::catalog::CATALOG.len()).bold(),
        crate::types::EXPERIMENTAL_FORMULA.yellow()
    );
    Ok(())
}

/// Execute the solve command: plan with the selected providers, then execute
pub fn solve(
    problem: String,
    selection: ProviderSelection,
    mode: Mode,
    json: bool,
) -> CalcResult<()> {
    let config = PlannerConfig::from_env();
    let planners = HttpPlanner::for_providers(&selection.providers(), &config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let outcomes = runtime.block_on(solver::solve(&planners, mode, &problem))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        println!("{}", "🧮 FinanCalc - Solving".bold().green());
        println!("   Problem: {}\n", problem.trim().italic());
        for outcome in &outcomes {
            print_outcome(outcome);
        }
    }

    if outcomes.iter().any(ProviderOutcome::is_success) {
        Ok(())
    } else {
        Err(CalcError::Provider {
            provider: format!("{:?}", selection).to_lowercase(),
            message: "No provider produced a result".to_string(),
        })
    }
}

fn print_outcome(outcome: &ProviderOutcome) {
    println!("{}", format!("── {} ──", outcome.provider.label()).bold());

    if let Some(ref plan) = outcome.plan {
        if !plan.interpretation.is_empty() {
            println!("   {}", plan.interpretation.italic());
        }
    }
    if let Some(ref error) = outcome.error {
        println!("   {}\n", format!("❌ {}", error).red());
        return;
    }
    if let Some(ref steps) = outcome.executed_steps {
        print_steps(steps);
    }
    if let Some(ref plan) = outcome.plan {
        print_final(plan, outcome.final_result());
    }
    println!();
}
