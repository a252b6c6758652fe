use clap::{Parser, Subcommand};
use financalc::cli;
use financalc::error::CalcResult;
use financalc::planner::{Mode, ProviderSelection};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "financalc")]
#[command(about = "Step-by-step financial math: LLM plans, deterministic arithmetic.")]
#[command(long_about = "FinanCalc - Financial math from calculation plans
The model only plans. Every number is computed locally from a fixed formula catalog.

COMMANDS:
  execute   - Run a calculation plan file (JSON or YAML)
  validate  - Check plan files without executing them
  formulas  - List the formula catalog
  solve     - Ask one or all providers to plan a word problem, then execute

EXAMPLES:
  financalc execute plan.json                   # Step-by-step results
  financalc validate plan.json other.yaml       # Schema + reference checks
  financalc solve \"¿Cuánto acumulo con 1000 al 12% en 2 años?\" -p todas

ENVIRONMENT:
  GEMINI_API_KEY               Google Gemini key
  OPENROUTER_KIMI_API_KEY      OpenRouter key for Kimi
  OPENROUTER_MISTRAL_API_KEY   OpenRouter key for Mistral
  RUST_LOG                     log filter (default: financalc=warn)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Execute a calculation plan.

Steps run in the order they are written. '{{name}}' inputs are read from
earlier steps' target variables. Each step prints its catalog formula
(or generated expression) with the inputs substituted, then the result.

The first failing step aborts the whole plan.")]
    /// Execute a calculation plan file
    Execute {
        /// Path to a JSON or YAML plan
        file: PathBuf,

        /// Print the executed steps as JSON
        #[arg(long)]
        json: bool,
    },

    #[command(long_about = "Validate calculation plans without executing them.

Checks each file against the plan schema, then lints it:
  - unknown formula names
  - '{{name}}' references that are never defined or only defined later
  - circular step dependencies
  - experimental steps without a parsable 'generated_formula'
  - missing catalog parameters (warning)

Exits non-zero when any file fails.")]
    /// Validate plan files without executing them
    Validate {
        /// One or more plan files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List the formula catalog
    Formulas {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    #[command(long_about = "Solve a word problem.

Asks the selected provider(s) for a calculation plan, then executes it
locally. With '--provider todas' every provider runs concurrently and a
failure from one never hides the others' results.

Requires the matching API key in the environment.")]
    /// Plan and execute a word problem
    Solve {
        /// The problem, in natural language
        problem: String,

        /// Provider to ask
        #[arg(short, long, value_enum, default_value_t = ProviderSelection::Google)]
        provider: ProviderSelection,

        /// Planning mode
        #[arg(short, long, value_enum, default_value_t = Mode::Preciso)]
        mode: Mode,

        /// Print the outcomes as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> CalcResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("financalc=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Execute { file, json } => cli::execute(file, json),

        Commands::Validate { files } => cli::validate(files),

        Commands::Formulas { json } => cli::formulas(json),

        Commands::Solve {
            problem,
            provider,
            mode,
            json,
        } => cli::solve(problem, provider, mode, json),
    }
}
