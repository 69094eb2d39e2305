use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Once;

use clap::{Parser, Subcommand};
use molang_lang::{Context, ContextConfig, Dictionary, QueryBuilder, Value};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Parser)]
#[command(name = "molang")]
#[command(about = "Evaluate Molang expressions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Seed for math.random and math.die_roll (entropy when omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Cap on iterations of a single loop / for_each
    #[arg(long, global = true)]
    loop_limit: Option<u32>,

    /// Pre-set a variable, e.g. `--var speed=2.5`
    #[arg(long = "var", value_name = "NAME=VALUE", global = true, value_parser = parse_var)]
    vars: Vec<(String, Value)>,

    /// Print the parsed syntax tree before evaluating
    #[arg(long, global = true)]
    ast: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an inline expression
    Eval {
        /// Molang source text
        code: String,
    },

    /// Evaluate a file
    Run {
        /// Path to a Molang source file
        file: PathBuf,
    },
}

static TRACING_INIT: Once = Once::new();

fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let fallback = if verbose { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
            .with(filter)
            .init();
    });
}

/// `name=value`: numbers and booleans are typed, anything else is a string.
fn parse_var(arg: &str) -> Result<(String, Value), String> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{arg}`"))?;
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(format!("missing variable name in `{arg}`"));
    }
    let value = match raw.trim() {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        text => text.parse::<f32>().map(Value::Number).unwrap_or_else(|_| Value::from(text)),
    };
    Ok((name, value))
}

fn run(cli: &Cli, source: &str) -> Result<Value, String> {
    // ── Parse ─────────────────────────────────────────────────────────────────
    let script = molang_lang::parse(source).map_err(|e| {
        tracing::error!(error = %e, "parse failed");
        format!("[parse] {e}")
    })?;
    if cli.ast {
        println!("{script:#?}");
    }

    // ── Evaluate ──────────────────────────────────────────────────────────────
    let random = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let config = ContextConfig { loop_limit: cli.loop_limit };
    tracing::debug!(seed = ?cli.seed, loop_limit = ?cli.loop_limit, vars = cli.vars.len(), "evaluating");
    let mut ctx = Context::with_config(QueryBuilder::standard().build(), random, config);

    let variables = Dictionary::new();
    for (name, value) in &cli.vars {
        variables.insert(name.clone(), value.clone());
    }
    ctx.set_variable_dict(Value::Dictionary(variables));

    Ok(script.eval(&mut ctx))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let source = match &cli.command {
        Commands::Eval { code } => code.clone(),
        Commands::Run { file } => match std::fs::read_to_string(file) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(file = %file.display(), error = %e, "cannot read source");
                eprintln!("[io] {}: {e}", file.display());
                return ExitCode::FAILURE;
            }
        },
    };

    match run(&cli, &source) {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_values_are_typed() {
        let (name, value) = parse_var("Speed=2.5").unwrap();
        assert_eq!(name, "speed");
        assert!(matches!(value, Value::Number(n) if n == 2.5));
        assert!(matches!(parse_var("ok=true").unwrap().1, Value::Boolean(true)));
        assert!(matches!(parse_var("id=minecraft:pig").unwrap().1, Value::String(s) if s == "minecraft:pig"));
    }

    #[test]
    fn var_needs_name_and_equals() {
        assert!(parse_var("speed").is_err());
        assert!(parse_var("=1").is_err());
    }

    #[test]
    fn cli_runs_with_seeded_variables() {
        let cli = Cli::parse_from(["molang", "--var", "x=4", "--seed", "3", "eval", "v.x * 2"]);
        let Commands::Eval { code } = &cli.command else { panic!("expected eval") };
        let value = run(&cli, code).unwrap();
        assert_eq!(value.to_string(), "8.0");
    }

    #[test]
    fn parse_errors_are_prefixed() {
        let cli = Cli::parse_from(["molang", "eval", "1 +"]);
        let err = run(&cli, "1 +").unwrap_err();
        assert!(err.starts_with("[parse] [P002]"), "{err}");
    }
}
