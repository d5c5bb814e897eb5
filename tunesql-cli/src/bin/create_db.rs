//! # create-db
//!
//! Builds the sample music catalog (Artists, Albums, Tracks).
//!
//! Usage:
//!   create-db
//!   create-db --db /tmp/music_library.db

use clap::Parser;
use std::path::PathBuf;
use tracing::warn;
use tunesql_catalog::create_database;
use tunesql_cli::config::DEFAULT_DB_FILE;
use tunesql_cli::logging::init_logging;

#[derive(Parser)]
#[command(name = "create-db")]
#[command(author, version, about = "Create the sample music catalog database")]
struct Cli {
    /// Database file to (re)create
    #[arg(long, default_value = DEFAULT_DB_FILE)]
    db: PathBuf,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match create_database(&cli.db) {
        Ok(report) => {
            for failure in &report.failures {
                warn!("skipped: {}", failure);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
