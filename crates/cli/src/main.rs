//! Rehydrate CLI
//!
//! Command-line interface for exporting JSON documents as replayable
//! expressions and checking that they round-trip.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use rehydrate_cli::{CliConfig, ObjectMode, run_check, run_export};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(name = "rehydrate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Export value graphs as replayable expressions", long_about = None)]
struct Cli {
    /// Path to configuration (TOML); defaults to ./rehydrate.toml if present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the expression that rebuilds a JSON document
    Export {
        /// Input .json file
        input: PathBuf,

        /// Treat JSON objects as anonymous records instead of mappings
        #[arg(long)]
        records: bool,
    },

    /// Export, replay into a fresh heap, and compare with the input
    Check {
        /// Input .json file
        input: PathBuf,

        /// Treat JSON objects as anonymous records instead of mappings
        #[arg(long)]
        records: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::load(cli.config.as_deref(), Path::new(".")) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    init_logging(&config.log.level);

    match cli.command {
        Commands::Export { input, records } => {
            match run_export(&input, object_mode(&config, records)) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }
        Commands::Check { input, records } => {
            match run_check(&input, object_mode(&config, records)) {
                Ok(report) if report.isomorphic => {
                    println!("ok: {} objects rebuilt", report.objects);
                }
                Ok(report) => {
                    eprintln!("mismatch: replay of the export differs from the input");
                    eprintln!("{}", report.text);
                    process::exit(1);
                }
                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }
        Commands::Completions { shell } => {
            run_completions(shell);
        }
    }
}

/// The `--records` flag wins over the config file
fn object_mode(config: &CliConfig, records: bool) -> ObjectMode {
    if records {
        ObjectMode::Records
    } else {
        config.json.objects
    }
}

fn init_logging(level: &str) {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    match format!("rehydrate={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring log level '{}': {}", level, e),
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "rehydrate", &mut io::stdout());
}
