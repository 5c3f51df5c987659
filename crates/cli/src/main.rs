mod commands;
mod config;
mod telemetry;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Policy document field-mapping toolkit.
#[derive(Parser)]
#[command(name = "policydoc", version, about = "Policy document field-mapping toolkit")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log filter when RUST_LOG is unset (e.g. "info", "policydoc_eval=debug")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Path to a policydoc.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a mapping template and check its function arities and path syntax
    Check {
        /// Path to the JSON mapping template
        template: PathBuf,
    },

    /// Resolve mapped fields against a JSON policy
    Resolve {
        /// Path to the default JSON mapping template (falls back to the config file)
        template: Option<PathBuf>,
        /// Path to the policy JSON, used as both typed object and projection
        #[arg(long)]
        policy: PathBuf,
        /// Path to a per-form override template consulted before the default
        #[arg(long)]
        custom: Option<PathBuf>,
        /// Field to resolve; repeat for several. Default: every mapped field.
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// Run a path query against a JSON document
    Path {
        /// Path to the JSON document
        document: PathBuf,
        /// Query such as "$.Policy.Forms[*].Code"
        query: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match config::read_config(path) {
            Ok(c) => c,
            Err(msg) => {
                report_error(&format!("error: {}", msg), cli.output, cli.quiet);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| telemetry::DEFAULT_LEVEL.to_string());
    if let Err(e) = telemetry::init(&level) {
        report_error(&format!("error: {}", e), cli.output, cli.quiet);
        process::exit(1);
    }

    match cli.command {
        Commands::Check { template } => {
            commands::check::cmd_check(&template, cli.output, cli.quiet);
        }
        Commands::Resolve {
            template,
            policy,
            custom,
            fields,
        } => {
            let template = template.or_else(|| config.templates.default.clone());
            let custom = custom.or_else(|| config.templates.custom.clone());
            let Some(template) = template else {
                report_error(
                    "error: no template given and no [templates] default in config",
                    cli.output,
                    cli.quiet,
                );
                process::exit(1);
            };
            commands::resolve::cmd_resolve(
                &template,
                custom.as_deref(),
                &policy,
                &fields,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Path { document, query } => {
            commands::path::cmd_path(&document, &query, cli.output, cli.quiet);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
