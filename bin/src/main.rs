//! cosmobot CLI - Interval capture experiments with background sync.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod logging;
mod paths;

#[derive(Parser)]
#[command(name = "cosmobot")]
#[command(about = "Run interval capture experiments and sync them to S3", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (only warnings and errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an experiment until its duration elapses, space runs out or it is interrupted
    Run(commands::run::RunArgs),

    /// Show how many more captures fit on disk
    Space {
        /// Directory on the filesystem to check. Defaults to the experiment output directory.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args, cli.verbose, cli.quiet).await,
        Commands::Space { output_dir } => commands::space::space(output_dir),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
