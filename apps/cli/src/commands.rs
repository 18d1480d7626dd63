//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use docgraph_core::{VerbInput, VerbRegistry};
use docgraph_shared::{AppConfig, Table, init_config, load_config, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docgraph: graph-indexing table verbs.
#[derive(Parser)]
#[command(
    name = "docgraph",
    version,
    about = "Run document/graph indexing verbs over JSON tables.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.docgraph/docgraph.toml.
    #[arg(long, env = "DOCGRAPH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// List the available verbs.
    Verbs,

    /// Run one verb and print the resulting table.
    Run {
        /// Verb name, e.g. compute_edge_combined_degree.
        verb: String,

        /// Primary input table (JSON).
        #[arg(short, long)]
        input: PathBuf,

        /// Named secondary table as NAME=PATH (repeatable), e.g. nodes=nodes.json.
        #[arg(short, long = "table", value_parser = parse_named_table)]
        tables: Vec<(String, PathBuf)>,

        /// JSON object of verb arguments, overriding the config file.
        #[arg(short, long)]
        args: Option<String>,

        /// Write the output table here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays
/// a clean JSON table.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docgraph=info",
        1 => "docgraph=debug",
        _ => "docgraph=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Verbs => cmd_verbs(),
        Command::Run {
            verb,
            input,
            tables,
            args,
            out,
        } => {
            let config = resolve_config(cli.config.as_deref())?;
            cmd_run(&config, &verb, &input, &tables, args.as_deref(), out.as_deref())
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        },
    }
}

fn cmd_verbs() -> Result<()> {
    let registry = VerbRegistry::builtin();
    for name in registry.names() {
        println!("{name}");
    }
    Ok(())
}

fn cmd_run(
    config: &AppConfig,
    verb: &str,
    input: &Path,
    tables: &[(String, PathBuf)],
    args: Option<&str>,
    out: Option<&Path>,
) -> Result<()> {
    let output = execute_verb(config, verb, input, tables, args)?;
    let json = serde_json::to_string_pretty(&output)?;

    match out {
        Some(path) => {
            std::fs::write(path, json)
                .wrap_err_with(|| format!("writing output table to {}", path.display()))?;
            info!(path = %path.display(), rows = output.num_rows(), "output table written");
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

/// Load tables, merge arguments, and run `verb`.
fn execute_verb(
    config: &AppConfig,
    verb: &str,
    input: &Path,
    tables: &[(String, PathBuf)],
    args: Option<&str>,
) -> Result<Table> {
    let registry = VerbRegistry::builtin();
    if registry.get(verb).is_none() {
        let known: Vec<_> = registry.names().collect();
        return Err(eyre!("unknown verb '{verb}' (available: {})", known.join(", ")));
    }

    let mut verb_input = VerbInput::new(load_table(input)?);
    for (name, path) in tables {
        verb_input = verb_input.with_table(name.clone(), load_table(path)?);
    }

    let args = verb_args(config, verb, args)?;
    info!(verb, args = %args, "running verb");

    let result = registry.run(verb, &verb_input, &args)?;
    Ok(result.table)
}

/// Config-file section for `verb`, with `overrides` (a JSON object) applied on top.
fn verb_args(
    config: &AppConfig,
    verb: &str,
    overrides: Option<&str>,
) -> Result<serde_json::Value> {
    let mut args = match verb {
        "compute_edge_combined_degree" => serde_json::to_value(&config.edge_degree)?,
        "create_base_documents" => serde_json::to_value(&config.base_documents)?,
        _ => serde_json::Value::Object(serde_json::Map::new()),
    };

    if let Some(raw) = overrides {
        let parsed: serde_json::Value =
            serde_json::from_str(raw).wrap_err("--args must be valid JSON")?;
        let serde_json::Value::Object(overrides) = parsed else {
            return Err(eyre!("--args must be a JSON object"));
        };
        if let serde_json::Value::Object(base) = &mut args {
            base.extend(overrides);
        }
    }

    Ok(args)
}

fn load_table(path: &Path) -> Result<Table> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading table {}", path.display()))?;
    serde_json::from_str(&content).wrap_err_with(|| format!("parsing table {}", path.display()))
}

/// Parse `NAME=PATH`.
fn parse_named_table(raw: &str) -> std::result::Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got '{raw}'")),
    }
}
