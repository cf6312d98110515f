//! # rxnbel CLI Module
//!
//! This module implements the CLI interface for rxnbel.
//!
//! ## Available Commands
//!
//! - `import` - Load record dumps into the database
//! - `status` - Show record and reaction counts
//! - `resolve` - Resolve one component and print its term
//! - `convert` - Convert reactions to JSONL nanopubs

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use rxnbel_core::BelError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// rxnbel - Reactome to BEL converter
///
/// Translates pathway reaction records into BEL assertions wrapped as
/// nanopubs with provenance metadata.
#[derive(Parser, Debug)]
#[command(name = "rxnbel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the record database [default: rxnbel.db]
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Path to a TOML config file [default: ./rxnbel.toml if present]
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import records from JSON array or JSON Lines dumps
    Import {
        /// Input files
        #[arg(short, long, required = true)]
        file: Vec<PathBuf>,
    },

    /// Show database status
    Status,

    /// Resolve a single component and print its term
    Resolve {
        /// Record id
        #[arg(long)]
        id: u64,
    },

    /// Convert reactions to nanopubs
    Convert {
        /// Reaction ids to convert (repeatable)
        #[arg(long = "id")]
        ids: Vec<u64>,

        /// Convert every reaction in the database
        #[arg(long, conflicts_with = "ids")]
        all: bool,

        /// With --all, reconvert reactions already listed in the resume file
        #[arg(long)]
        update_all: bool,

        /// Stop after attempting this many reactions (skipped and failed ones count)
        #[arg(long)]
        limit: Option<usize>,

        /// Restrict --all to a species display name
        #[arg(long)]
        species: Option<String>,

        /// Nanopub JSONL output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit isA relations for defined-set combinations
        #[arg(long)]
        expand_sets: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli, config: AppConfig) -> Result<(), BelError> {
    let db_path = config.database(cli.database.as_deref());
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Import { file }) => cmd_import(&db_path, json_mode, &file),
        Some(Commands::Status) => cmd_status(&db_path, json_mode),
        Some(Commands::Resolve { id }) => cmd_resolve(&db_path, json_mode, id),
        Some(Commands::Convert {
            ids,
            all,
            update_all,
            limit,
            species,
            output,
            expand_sets,
        }) => {
            let mut settings = config.convert;
            if limit.is_some() {
                settings.limit = limit;
            }
            if species.is_some() {
                settings.species = species;
            }
            if let Some(output) = output {
                settings.output = output;
            }
            settings.expand_defined_sets |= expand_sets;

            let selection = Selection {
                ids,
                all,
                update_all,
            };
            cmd_convert(&db_path, json_mode, &settings, &selection).map(|_| ())
        }
        None => {
            // No subcommand - show status by default
            cmd_status(&db_path, json_mode)
        }
    }
}
