//! archdsm CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "archdsm")]
#[command(about = "Design structure matrices from extracted code facts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove false-positive dependencies into a working copy of the fact base
    Filter {
        /// Raw fact base (never modified)
        input: PathBuf,

        /// Filtered copy to write
        output: PathBuf,

        /// Replace the output if it exists
        #[arg(short, long)]
        force: bool,
    },
    /// Export dependency matrices
    Export(commands::ExportArgs),
    /// Print fact base totals as JSON
    Summary {
        /// Fact base to summarize
        db: PathBuf,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("archdsm={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Filter { input, output, force } => commands::filter(&input, &output, force),
        Commands::Export(args) => commands::export(args),
        Commands::Summary { db } => commands::summary(&db),
        Commands::Version => {
            println!("archdsm v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
