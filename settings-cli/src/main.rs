use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use settings_core::logging::init_tracing;
use settings_core::SettingsConfig;
use settings_rules::{EvaluationMode, SettingsEngine};
use tracing::debug;

mod commands;

use commands::{
    build_context, print_json, print_summary, print_unresolved, rules_path, RuleSetSummary,
};

#[derive(Parser)]
#[command(name = "settings")]
#[command(about = "Resolve clinic settings from declarative rule sets", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, env = "SETTINGS_LOG_LEVEL")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve variables against a context
    Resolve(ResolveArgs),
    /// Load a rule set and summarise it
    Check(RulesArgs),
    /// List every variable a rule set defines
    Vars(RulesArgs),
    /// Show version information
    Version,
}

#[derive(Args)]
struct RulesArgs {
    /// Rule file or directory (defaults to SETTINGS_RULES_PATH)
    #[arg(short, long)]
    rules: Option<PathBuf>,
}

#[derive(Args)]
struct ResolveArgs {
    #[command(flatten)]
    rules: RulesArgs,
    /// Context field as key=value; repeatable
    #[arg(short = 's', long = "set")]
    assignments: Vec<String>,
    /// JSON file holding the base context object
    #[arg(short, long)]
    context: Option<PathBuf>,
    /// Collect every matching value instead of the first
    #[arg(long, default_value_t = false)]
    all: bool,
    /// Fail constraints on fields missing from the context
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Variables to resolve
    #[arg(required = true)]
    variables: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = SettingsConfig::from_env().context("failed to read configuration")?;

    let level = cli.log_level.as_deref().or(config.log_level.as_deref());
    init_tracing(level.or(Some("warn"))).context("failed to initialise logging")?;

    match cli.command {
        Commands::Resolve(args) => {
            let path = rules_path(args.rules.rules, &config)?;
            let mode = if args.strict || config.strict {
                EvaluationMode::Strict
            } else {
                EvaluationMode::Lenient
            };
            let engine = SettingsEngine::from_path(&path)
                .with_context(|| format!("failed to load rules from {}", path.display()))?
                .with_mode(mode);
            let context = build_context(args.context.as_deref(), &args.assignments)?;
            debug!(fields = context.len(), ?mode, "resolving settings");

            if args.all {
                let all = engine.resolve_all(&args.variables, &context);
                let empty: Vec<&str> = all
                    .iter()
                    .filter(|(_, values)| values.is_empty())
                    .map(|(name, _)| name)
                    .collect();
                print_json(&all)?;
                print_unresolved(&empty);
            } else {
                let resolved = engine.resolve_first(&args.variables, &context);
                let missing: Vec<&str> = args
                    .variables
                    .iter()
                    .map(String::as_str)
                    .filter(|name| !resolved.contains(name))
                    .collect();
                print_json(&resolved)?;
                print_unresolved(&missing);
            }
        }
        Commands::Check(args) => {
            let path = rules_path(args.rules, &config)?;
            let engine = SettingsEngine::from_path(&path)
                .with_context(|| format!("failed to load rules from {}", path.display()))?;
            print_summary(&path, &RuleSetSummary::from_engine(&engine));
        }
        Commands::Vars(args) => {
            let path = rules_path(args.rules, &config)?;
            let engine = SettingsEngine::from_path(&path)
                .with_context(|| format!("failed to load rules from {}", path.display()))?;
            for name in engine.variables() {
                println!("{}", name);
            }
        }
        Commands::Version => {
            println!("clinic settings v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
