//! queryeval CLI: the annotator-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "queryeval", version, about = "Query annotation tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive annotation session
    Annotate {
        /// Path to a .toml task catalog
        #[arg(long)]
        catalog: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Annotator name recorded in the session report
        #[arg(long)]
        annotator: Option<String>,

        /// Simulated submit latency in milliseconds
        #[arg(long)]
        latency_ms: Option<u64>,

        /// Delay before moving on after a successful submit
        #[arg(long)]
        auto_advance_ms: Option<u64>,

        /// Output directory for the session report
        #[arg(long)]
        output: Option<PathBuf>,

        /// Do not write a session report on exit
        #[arg(long)]
        no_save: bool,
    },

    /// Validate task catalog TOML files
    Validate {
        /// Path to catalog file or directory
        #[arg(long)]
        catalog: PathBuf,
    },

    /// List the evaluation criteria
    Criteria,

    /// Summarize a saved session report
    Summary {
        /// Session report JSON
        #[arg(long)]
        report: PathBuf,
    },

    /// Create starter config and example catalog
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("queryeval=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Annotate {
            catalog,
            config,
            annotator,
            latency_ms,
            auto_advance_ms,
            output,
            no_save,
        } => {
            commands::annotate::execute(commands::annotate::AnnotateArgs {
                catalog,
                config,
                annotator,
                latency_ms,
                auto_advance_ms,
                output,
                no_save,
            })
            .await
        }
        Commands::Validate { catalog } => commands::validate::execute(catalog),
        Commands::Criteria => commands::criteria::execute(),
        Commands::Summary { report } => commands::summary::execute(report),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
