//! # Application Configuration
//!
//! Optional `rxnbel.toml` settings. Every section and field has a default,
//! so an empty file (or no file at all) is a valid configuration.
//!
//! ```toml
//! [store]
//! path = "rxnbel.db"
//!
//! [convert]
//! species = "Homo sapiens"
//! expand_defined_sets = false
//! output = "nanopubs.jsonl"
//! memberships = "memberships.jsonl"
//! resume_file = "converted_reaction_ids.json"
//! progress_every = 1000
//! record_cache_capacity = 1024
//! term_cache_capacity = 5000
//!
//! [log]
//! format = "json"
//! filter = "rxnbel=debug"
//! ```

use rxnbel_core::{
    BelError, ConvertOptions, DEFAULT_RECORD_CACHE_CAPACITY, DEFAULT_TERM_CACHE_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "rxnbel.toml";

/// Record database used when neither flag nor config names one.
pub const DEFAULT_DATABASE: &str = "rxnbel.db";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// SECTIONS
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub convert: ConvertConfig,
    pub log: LogConfig,
}

/// `[store]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

/// `[convert]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Restrict `--all` to one species display name.
    pub species: Option<String>,
    pub expand_defined_sets: bool,
    pub max_combinations: usize,
    /// Nanopub JSONL output.
    pub output: PathBuf,
    /// Auxiliary `isA` relations, one JSON object per line.
    pub memberships: PathBuf,
    /// Ids converted so far, for resuming a batch.
    pub resume_file: PathBuf,
    /// Log progress and save the resume file every N reactions.
    pub progress_every: usize,
    /// Reactions to attempt before stopping. Resumed ids do not count.
    pub limit: Option<usize>,
    /// Records kept in the read-through memo.
    pub record_cache_capacity: usize,
    /// Resolved terms kept across reactions.
    pub term_cache_capacity: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        let options = ConvertOptions::default();
        Self {
            species: None,
            expand_defined_sets: options.expand_defined_sets,
            max_combinations: options.max_combinations,
            output: PathBuf::from("nanopubs.jsonl"),
            memberships: PathBuf::from("memberships.jsonl"),
            resume_file: PathBuf::from("converted_reaction_ids.json"),
            progress_every: 1000,
            limit: None,
            record_cache_capacity: DEFAULT_RECORD_CACHE_CAPACITY,
            term_cache_capacity: DEFAULT_TERM_CACHE_CAPACITY,
        }
    }
}

impl ConvertConfig {
    /// Engine options carried by this section.
    pub fn options(&self) -> ConvertOptions {
        ConvertOptions {
            expand_defined_sets: self.expand_defined_sets,
            max_combinations: self.max_combinations,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// `[log]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

// =============================================================================
// LOADING
// =============================================================================

impl AppConfig {
    /// Parse configuration text.
    pub fn from_toml(text: &str) -> Result<Self, BelError> {
        toml::from_str(text).map_err(|e| BelError::ConfigError(e.to_string()))
    }

    /// Load the given file, or `rxnbel.toml` if present, or defaults.
    ///
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, BelError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let metadata = std::fs::metadata(&path).map_err(|e| {
            BelError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(BelError::ConfigError(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            BelError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// The record database: flag, then config, then the default name.
    pub fn database(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.store.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_text_is_default() {
        let config = AppConfig::from_toml("").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.convert.progress_every, 1000);
        assert_eq!(config.convert.options(), ConvertOptions::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [store]
            path = "records.db"

            [convert]
            species = "Homo sapiens"
            expand_defined_sets = true
            progress_every = 50
            term_cache_capacity = 64

            [log]
            format = "json"
            "#,
        )
        .expect("parse");

        assert_eq!(config.store.path, Some(PathBuf::from("records.db")));
        assert_eq!(config.convert.species.as_deref(), Some("Homo sapiens"));
        assert!(config.convert.options().expand_defined_sets);
        assert_eq!(config.convert.progress_every, 50);
        assert_eq!(config.convert.term_cache_capacity, 64);
        assert_eq!(
            config.convert.record_cache_capacity,
            DEFAULT_RECORD_CACHE_CAPACITY
        );
        assert_eq!(
            config.convert.output,
            ConvertConfig::default().output,
            "unset fields keep their defaults"
        );
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn bad_values_are_config_errors() {
        let err = AppConfig::from_toml("[log]\nformat = \"xml\"").expect_err("invalid");
        assert!(matches!(err, BelError::ConfigError(_)));
    }

    #[test]
    fn named_file_must_exist() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            AppConfig::load(Some(&missing)),
            Err(BelError::ConfigError(_))
        ));

        let present = dir.path().join("rxnbel.toml");
        std::fs::write(&present, "[convert]\nlimit = 3\n").expect("write");
        let config = AppConfig::load(Some(&present)).expect("load");
        assert_eq!(config.convert.limit, Some(3));
    }

    #[test]
    fn database_flag_wins_over_config() {
        let mut config = AppConfig::default();
        assert_eq!(config.database(None), PathBuf::from(DEFAULT_DATABASE));

        config.store.path = Some(PathBuf::from("from-config.db"));
        assert_eq!(config.database(None), PathBuf::from("from-config.db"));
        assert_eq!(
            config.database(Some(Path::new("flag.db"))),
            PathBuf::from("flag.db")
        );
    }
}
