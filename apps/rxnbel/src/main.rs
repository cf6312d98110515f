//! # rxnbel - Reactome to BEL converter
//!
//! The main binary for the rxnbel translation engine.
//!
//! This application provides:
//! - Record import into a redb database
//! - Batch conversion of reactions to JSONL nanopubs, with resumption
//! - Single component resolution for inspection
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │             apps/rxnbel (THE BINARY)          │
//! │                                               │
//! │   ┌─────────────┐        ┌────────────────┐   │
//! │   │    CLI      │        │  Config (toml) │   │
//! │   │   (clap)    │        │  + tracing     │   │
//! │   └──────┬──────┘        └───────┬────────┘   │
//! │          └───────────┬───────────┘            │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │  rxnbel-core  │                │
//! │              │ (THE ENGINE)  │                │
//! │              └───────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! rxnbel import -f reactome_records.jsonl
//! rxnbel status
//! rxnbel resolve --id 445811
//! rxnbel convert --all --limit 500
//! ```

use clap::Parser;
use rxnbel::cli;
use rxnbel::config::{AppConfig, LogConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log, cli.verbose);

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli, config) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing. RXNBEL_LOG_FORMAT=json overrides the config file.
fn init_tracing(log: &LogConfig, verbose: bool) {
    let format = match std::env::var("RXNBEL_LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        Ok(_) => LogFormat::Text,
        Err(_) => log.format,
    };

    let fallback = match (&log.filter, verbose) {
        (_, true) => "rxnbel=debug,rxnbel_core=debug".to_string(),
        (Some(filter), false) => filter.clone(),
        (None, false) => "rxnbel=info,rxnbel_core=info".to_string(),
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| fallback.into());

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  rxnbel v{}
  Reactome reactions → BEL nanopubs
"#,
        env!("CARGO_PKG_VERSION")
    );
}
