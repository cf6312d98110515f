//! # rxnbel
//!
//! Command line front end and batch driver for rxnbel-core.
//!
//! - `cli` → argument parsing and command implementations
//! - `config` → optional `rxnbel.toml` settings

pub mod cli;
pub mod config;
