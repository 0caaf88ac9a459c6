//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool. All
//! commands operate on a saved page snapshot; `watch` additionally runs
//! the reconciliation loop against it.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// NotebookLM Exporter - extract conversations and Studio items as Markdown.
#[derive(Parser, Debug)]
#[command(name = "nlm-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to a configuration file (defaults to the user config dir).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the conversation from a page snapshot to Markdown.
    Export {
        /// Path to the saved page snapshot.
        snapshot: PathBuf,

        /// Output directory (defaults to the configured one).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a Studio item from a page snapshot.
    ExportStudio {
        /// Path to the saved page snapshot.
        snapshot: PathBuf,

        /// Zero-based index of the Studio item to select.
        #[arg(short, long, default_value = "0")]
        item: usize,

        /// Output directory (defaults to the configured one).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect a snapshot: messages, roles and Studio items found.
    Inspect {
        /// Path to the saved page snapshot.
        snapshot: PathBuf,

        /// Emit the report as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Run the reconciliation loop against a snapshot for a while and
    /// report what it keeps in place.
    Watch {
        /// Path to the saved page snapshot.
        snapshot: PathBuf,

        /// How long to run, in seconds.
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },

    /// Print the active selector chains as TOML.
    Selectors,
}
