use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dsynth::ir::Identifier;
use dsynth::oracle::{BackendKind, Oracle, OracleConfig};
use dsynth::parser::{parse_declaration, parse_formula, parse_problem_file};
use dsynth::rules::RuleCatalog;
use dsynth::search::{CostMetric, SearchConfig, SearchEngine};

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "dsynth")]
#[command(about = "dsynth - deductive program synthesis")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

/// Oracle options shared by every subcommand
#[derive(clap::Args)]
struct OracleArgs {
    /// Oracle backend, in the order they are consulted (repeatable)
    #[arg(long = "backend")]
    backends: Vec<BackendKind>,
    /// Per-query budget for each backend, in milliseconds
    #[arg(long, default_value = "5000")]
    solver_timeout: u64,
    /// Seed for the random backend
    #[arg(long, default_value = "0")]
    seed: u64,
    /// Integers in [-N, N] are tried by the enumerative backend
    #[arg(long, default_value = "8")]
    enumeration_bound: i64,
}

impl OracleArgs {
    fn config(&self) -> OracleConfig {
        let mut config = OracleConfig::default()
            .with_timeout(Duration::from_millis(self.solver_timeout))
            .with_seed(self.seed)
            .with_enumeration_bound(self.enumeration_bound);
        if !self.backends.is_empty() {
            config = config.with_backends(self.backends.clone());
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize a program for a problem file
    Synth {
        /// Path to the problem file
        file: PathBuf,

        // --- Search options ---
        /// Timeout in seconds for the whole search (0 = unbounded)
        #[arg(long, default_value = "60")]
        timeout: u64,
        /// Stop after this many task expansions
        #[arg(long)]
        max_expansions: Option<u64>,
        /// Worklist priority estimate
        #[arg(long, default_value = "constraint-size")]
        cost_metric: CostMetric,

        #[command(flatten)]
        oracle: OracleArgs,

        // --- Output options ---
        /// Write the derivation tree as JSON to this path
        #[arg(long)]
        dump_tree: Option<PathBuf>,
        /// Print the derivation tree outline
        #[arg(long)]
        show_tree: bool,
    },
    /// Ask the oracle whether a formula holds for all values of its variables
    Decide {
        /// Formula to decide
        formula: String,
        /// Variable declaration, e.g. `x:int` (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,

        #[command(flatten)]
        oracle: OracleArgs,
    },
}

// --- Commands ---

struct SynthOptions {
    search: SearchConfig,
    oracle: OracleConfig,
    dump_tree: Option<PathBuf>,
    show_tree: bool,
}

fn run_synth(path: &Path, options: &SynthOptions) -> Result<(), Box<dyn std::error::Error>> {
    let problem = parse_problem_file(path)?;

    let oracle = Oracle::from_config(&options.oracle)?;
    let catalog = RuleCatalog::standard();
    info!(
        backends = ?oracle.backend_names(),
        rules = catalog.len(),
        "starting_synthesis"
    );

    let engine = SearchEngine::new(&catalog, &oracle).with_config(options.search.clone());
    let result = engine.synthesize(&problem)?;

    println!();
    print!("{}", result);
    println!("Program:");
    println!("  {}", result.solution.to_program(&problem));
    println!(
        "Placeholder: {}",
        if result.is_placeholder() { "yes" } else { "no" }
    );
    println!();
    println!("Statistics:");
    for line in result.statistics.format_summary().lines() {
        println!("  {}", line);
    }

    if options.show_tree {
        println!();
        println!("Derivation tree:");
        print!("{}", result.tree);
    }

    if let Some(dump_path) = &options.dump_tree {
        fs::write(dump_path, result.tree.to_json()?)?;
        println!("Wrote derivation tree to {}", dump_path.display());
    }

    Ok(())
}

fn run_decide(
    formula: &str,
    vars: &[String],
    oracle_config: &OracleConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let scope = vars
        .iter()
        .map(|v| parse_declaration(v))
        .collect::<Result<Vec<Identifier>, _>>()?;
    let formula = parse_formula(formula, &scope)?;
    let oracle = Oracle::from_config(oracle_config)?;

    println!("Formula: {}", formula);
    println!("Backends: {}", oracle.backend_names().join(", "));
    let verdict = oracle.decide(&formula);
    println!("Verdict: {}", verdict);
    Ok(())
}

// --- Main ---

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Commands::Synth {
            file,
            timeout,
            max_expansions,
            cost_metric,
            oracle,
            dump_tree,
            show_tree,
        } => {
            let search = SearchConfig::default()
                .with_timeout_option((timeout > 0).then(|| Duration::from_secs(timeout)))
                .with_max_expansions_option(max_expansions)
                .with_cost_metric(cost_metric);
            let options = SynthOptions {
                search,
                oracle: oracle.config(),
                dump_tree,
                show_tree,
            };
            run_synth(&file, &options)
        }
        Commands::Decide {
            formula,
            vars,
            oracle,
        } => run_decide(&formula, &vars, &oracle.config()),
    }
}
