//! Command line interface of jakas.

pub mod commands;
pub mod interactive;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// jakas - value-for-money restaurant scores.
#[derive(Parser, Debug)]
#[command(name = "jakas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "jakas.toml")]
    pub config: PathBuf,

    /// Verbose mode.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode.
    #[arg(short, long)]
    pub quiet: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initializes configuration in the current directory.
    Init {
        /// Target directory (default: current directory).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Edits the configuration interactively.
    Config,

    /// Imports restaurants and reviews from a JSON file.
    Import {
        /// JSON file with a `restaurants` array.
        input: PathBuf,
    },

    /// Gets the score of a restaurant, computing it if needed.
    Score {
        /// Restaurant identifier.
        id: String,

        /// Print the response envelope as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Shows stored scores without triggering computations.
    Show {
        /// Restaurant identifier (all restaurants when omitted).
        id: Option<String>,
    },

    /// Diagnoses configuration, database and scorer.
    Doctor,

    /// Shows version.
    Version,
}
