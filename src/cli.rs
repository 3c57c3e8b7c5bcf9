//! Command-line interface for the `student-records` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

/// student-records - manage student registration records
///
/// Serves the web application, or lists and searches records directly
/// from the configured store.
#[derive(Debug, Parser)]
#[command(name = "student-records")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web application
    Serve {
        /// Address to listen on, overriding `server.bind`
        #[arg(short, long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Print every record
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print records matching a query in any field
    Search {
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration file path
    Path,

    /// Check a configuration file for errors
    Validate {
        /// File to validate (defaults to student-records.toml)
        file: Option<PathBuf>,
    },
}

impl Cli {
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
