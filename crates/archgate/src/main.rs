//! Archgate CLI - architecture validation from the command line.
//!
//! Reads a dependency configuration and a JSON Lines stream of package
//! observations, then reports references that break the declared
//! architecture.

use std::path::PathBuf;
use std::process::ExitCode;

use archgate::Severity;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;

/// Archgate: enforce a declared package architecture.
#[derive(Parser)]
#[command(name = "archgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate observed references against the configuration
    Validate {
        /// Dependency configuration (JSON, or YAML by extension)
        #[arg(short, long, default_value = "archgate.json")]
        config: PathBuf,

        /// JSON Lines file of package observations
        #[arg(short, long)]
        events: PathBuf,

        /// Severity of illegal references (error, warning)
        #[arg(long, default_value = "error")]
        reporting_policy: Severity,

        /// Severity of undeclared packages (error, warning)
        #[arg(long, default_value = "warning")]
        unconfigured_policy: Severity,

        /// Write the classified graph as a DOT file
        #[arg(long, value_name = "DOT_FILE")]
        visualize: Option<PathBuf>,
    },

    /// Derive a configuration from observed references
    Analyze {
        /// JSON Lines file of package observations
        #[arg(short, long)]
        events: PathBuf,

        /// Pattern of packages to leave out (repeatable)
        #[arg(short, long)]
        whitelist: Vec<String>,

        /// Implicit namespace to leave out, e.g. java.lang (repeatable)
        #[arg(long)]
        builtin_root: Vec<String>,

        /// Where to write the derived configuration (stdout if omitted)
        #[arg(long, value_name = "JSON_FILE")]
        config_out: Option<PathBuf>,

        /// Write the observed graph as a DOT file
        #[arg(long, value_name = "DOT_FILE")]
        visualize: Option<PathBuf>,
    },

    /// List circular dependencies declared in the configuration
    Cycles {
        /// Dependency configuration (JSON, or YAML by extension)
        #[arg(short, long, default_value = "archgate.json")]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate {
            config,
            events,
            reporting_policy,
            unconfigured_policy,
            visualize,
        } => cli::validate::run(
            &config,
            &events,
            archgate::ReportingPolicy {
                illegal_dependency: reporting_policy,
                unconfigured_package: unconfigured_policy,
            },
            visualize.as_deref(),
        ),
        Commands::Analyze {
            events,
            whitelist,
            builtin_root,
            config_out,
            visualize,
        } => cli::analyze::run(
            &events,
            &whitelist,
            &builtin_root,
            config_out.as_deref(),
            visualize.as_deref(),
        )
        .map(|()| true),
        Commands::Cycles { config } => cli::cycles::run(&config).map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}
