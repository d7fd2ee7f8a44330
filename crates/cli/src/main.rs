mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Overrides, Settings};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Attribute form engine: check descriptors, render forms and collect
/// attribute requests.
#[derive(Parser)]
#[command(
    name = "attrform",
    version,
    about = "Mount, render and collect server-declared attribute forms"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log engine activity at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Form namespace (overrides the config file)
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// UTC offset for datetime fields, e.g. +02:00 (defaults to the host time zone)
    #[arg(long, global = true, allow_hyphen_values = true)]
    utc_offset: Option<String>,

    /// Path to an attrform.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a descriptor list against the descriptor schema
    Check {
        /// Path to the descriptor JSON file
        descriptors: PathBuf,
    },

    /// Print the render plan of a descriptor list
    Render {
        /// Path to the descriptor JSON file
        descriptors: PathBuf,
        /// Existing attribute values to pre-fill
        #[arg(long)]
        attributes: Option<PathBuf>,
    },

    /// Apply form values, resolve callbacks and print attribute requests
    Collect {
        /// Path to the descriptor JSON file
        descriptors: PathBuf,
        /// Form values keyed by attribute name or full field path
        #[arg(long)]
        form: PathBuf,
        /// Existing attribute values to pre-fill
        #[arg(long)]
        attributes: Option<PathBuf>,
        /// Canned callback responses keyed by attribute name
        #[arg(long, conflicts_with = "api_url")]
        callbacks: Option<PathBuf>,
        /// Base URL of the platform API serving callbacks
        #[arg(long)]
        api_url: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let overrides = Overrides {
        namespace: cli.namespace,
        utc_offset: cli.utc_offset,
        config: cli.config,
    };

    match cli.command {
        Commands::Check { descriptors } => {
            commands::check::cmd_check(&descriptors, cli.output, cli.quiet);
        }
        Commands::Render {
            descriptors,
            attributes,
        } => {
            let settings = resolve_settings(&overrides, cli.output, cli.quiet);
            commands::render::cmd_render(
                &descriptors,
                attributes.as_deref(),
                &settings,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Collect {
            descriptors,
            form,
            attributes,
            callbacks,
            api_url,
        } => {
            let settings = resolve_settings(&overrides, cli.output, cli.quiet);
            commands::collect::cmd_collect(
                &commands::collect::CollectArgs {
                    descriptors: &descriptors,
                    form: &form,
                    attributes: attributes.as_deref(),
                    callbacks: callbacks.as_deref(),
                    api_url: api_url.as_deref(),
                },
                &settings,
                cli.output,
                cli.quiet,
            );
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        )
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn resolve_settings(overrides: &Overrides, output: OutputFormat, quiet: bool) -> Settings {
    match Settings::resolve(overrides) {
        Ok(settings) => settings,
        Err(e) => {
            report_error(&e, output, quiet);
            process::exit(1);
        }
    }
}

/// Report an error in the appropriate output format.
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
