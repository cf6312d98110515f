//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::ConvertConfig;
use rxnbel_core::{
    BelError, CachedStore, Converter, DbId, MemoryTermCache, NanopubEnvelope, ReactionIndex,
    ReactionOutcome, Record, RedbStore, StructuralValidator, nanopub::now_timestamp,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of one record dump (4 GB).
///
/// Full pathway database exports run to a few gigabytes.
const MAX_IMPORT_FILE_SIZE: u64 = 4 * 1024 * 1024 * 1024;

/// Maximum resume file size (256 MB).
const MAX_RESUME_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), BelError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| BelError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(BelError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input path: canonical, existing, and a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, BelError> {
    // Canonicalize resolves "..", symlinks, and validates existence
    let canonical = path.canonicalize().map_err(|e| {
        BelError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(BelError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: its parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, BelError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        BelError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(BelError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| BelError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &impl Serialize) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import record dumps into the database.
pub fn cmd_import(db_path: &Path, json_mode: bool, files: &[PathBuf]) -> Result<(), BelError> {
    let mut store = RedbStore::open(db_path)?;
    let mut imported = 0usize;

    for file in files {
        let validated_path = validate_file_path(file)?;
        validate_file_size(&validated_path, MAX_IMPORT_FILE_SIZE)?;

        let text = std::fs::read_to_string(&validated_path)
            .map_err(|e| BelError::IoError(format!("Read file: {}", e)))?;
        let records = Record::parse_many(&text)?;
        let count = store.import(records)?;
        info!(file = %validated_path.display(), records = count, "imported");
        imported = imported.saturating_add(count);
    }

    store.compact()?;

    let reactions = store.reaction_count()?;
    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "imported": imported,
            "record_count": store.record_count()?,
            "reaction_count": reactions,
        }));
        return Ok(());
    }

    println!("Imported {} records", imported);
    println!(
        "Database now has {} records, {} reactions",
        store.record_count()?,
        reactions
    );
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show database status.
pub fn cmd_status(db_path: &Path, json_mode: bool) -> Result<(), BelError> {
    let store = RedbStore::open(db_path)?;
    let records = store.record_count()?;
    let reactions = store.reaction_count()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "record_count": records,
            "reaction_count": reactions,
        }));
        return Ok(());
    }

    println!("rxnbel Database Status");
    println!("======================");
    println!("Database:  {:?}", db_path);
    println!();
    println!("Records:   {}", records);
    println!("Reactions: {}", reactions);

    Ok(())
}

// =============================================================================
// RESOLVE COMMAND
// =============================================================================

/// Resolve one component and print its term and memberships.
pub fn cmd_resolve(db_path: &Path, json_mode: bool, id: u64) -> Result<(), BelError> {
    let store = RedbStore::open(db_path)?;
    let cache = MemoryTermCache::new();
    let converter = Converter::new(&store, &cache, &StructuralValidator, Default::default());

    let (term, memberships) = converter.resolve_component(DbId(id))?;

    if json_mode {
        print_json(&serde_json::json!({
            "db_id": id,
            "term": term.as_ref().map(ToString::to_string),
            "relation": term.as_ref().and_then(|t| t.relation()),
            "memberships": memberships,
        }));
        return Ok(());
    }

    match term {
        Some(term) => match term.relation() {
            Some(relation) => println!("{} ({})", term, relation),
            None => println!("{}", term),
        },
        None => println!("Component {} did not resolve", id),
    }
    for membership in &memberships {
        println!("  {}", membership);
    }
    Ok(())
}

// =============================================================================
// CONVERT COMMAND
// =============================================================================

/// Which reactions to convert.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Explicit ids. Always converted; the resume file is neither read nor written.
    pub ids: Vec<u64>,
    pub all: bool,
    /// Ignore the resume file and start the outputs afresh.
    pub update_all: bool,
}

impl Selection {
    /// Whether this run reads and saves the resume file.
    fn resumable(&self) -> bool {
        self.ids.is_empty() && self.all
    }
}

/// Counts reported at the end of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConvertSummary {
    pub converted: usize,
    /// Converted with an empty assertion list.
    pub empty: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Already listed in the resume file.
    pub resumed: usize,
    pub memberships: usize,
}

/// Convert reactions to JSONL nanopubs.
///
/// Each reaction is converted independently: a failure is logged and
/// counted, and the batch moves on.
pub fn cmd_convert(
    db_path: &Path,
    json_mode: bool,
    settings: &ConvertConfig,
    selection: &Selection,
) -> Result<ConvertSummary, BelError> {
    let store = CachedStore::with_capacity(
        RedbStore::open(db_path)?,
        settings.record_cache_capacity,
    );

    let targets: Vec<DbId> = if !selection.ids.is_empty() {
        selection.ids.iter().copied().map(DbId).collect()
    } else if selection.all {
        store.reaction_ids(settings.species.as_deref())?
    } else {
        return Err(BelError::ConfigError(
            "Specify reactions with --id <ID> or --all".to_string(),
        ));
    };

    let resumable = selection.resumable();
    let mut done = if resumable && !selection.update_all {
        load_resume_file(&settings.resume_file)?
    } else {
        BTreeSet::new()
    };
    let append = !selection.update_all;
    let mut nanopubs = open_output(&settings.output, append)?;
    let mut relations = open_output(&settings.memberships, append)?;

    let cache = MemoryTermCache::with_capacity(settings.term_cache_capacity);
    let converter = Converter::new(&store, &cache, &StructuralValidator, settings.options())
        .with_update_timestamp(now_timestamp());

    let progress_every = settings.progress_every.max(1);
    let mut summary = ConvertSummary::default();
    let mut processed = 0usize;

    info!(reactions = targets.len(), resumed = done.len(), "starting conversion");

    for id in targets {
        // Every attempted reaction counts toward the limit; resumed ones do not.
        if settings.limit.is_some_and(|limit| processed >= limit) {
            info!(processed, "limit reached");
            break;
        }
        if done.contains(&id.0) {
            summary.resumed += 1;
            continue;
        }

        match converter.convert_reaction(id) {
            Ok(ReactionOutcome::Converted(conversion)) => {
                if conversion.nanopub.assertions.is_empty() {
                    summary.empty += 1;
                }
                write_line(&mut relations, conversion.memberships.iter())?;
                summary.memberships += conversion.memberships.len();
                let envelope = NanopubEnvelope {
                    nanopub: conversion.nanopub,
                };
                write_line(&mut nanopubs, std::iter::once(&envelope))?;
                done.insert(id.0);
                summary.converted += 1;
            }
            Ok(ReactionOutcome::Skipped { reason }) => {
                warn!(db_id = %id, reason = %reason, "reaction skipped");
                summary.skipped += 1;
            }
            Err(e) => {
                warn!(db_id = %id, error = %e, "reaction failed");
                summary.failed += 1;
            }
        }

        processed += 1;
        if processed % progress_every == 0 {
            flush(&mut nanopubs)?;
            flush(&mut relations)?;
            if resumable {
                save_resume_file(&settings.resume_file, &done)?;
            }
            info!(
                processed,
                converted = summary.converted,
                failed = summary.failed,
                "progress"
            );
        }
    }

    flush(&mut nanopubs)?;
    flush(&mut relations)?;
    if resumable {
        save_resume_file(&settings.resume_file, &done)?;
    }

    if json_mode {
        print_json(&summary);
    } else {
        println!("Converted {} reactions", summary.converted);
        println!("  Empty:       {}", summary.empty);
        println!("  Skipped:     {}", summary.skipped);
        println!("  Failed:      {}", summary.failed);
        println!("  Resumed:     {}", summary.resumed);
        println!("  Memberships: {}", summary.memberships);
        println!("Nanopubs written to {:?}", settings.output);
    }

    Ok(summary)
}

fn open_output(path: &Path, append: bool) -> Result<BufWriter<File>, BelError> {
    let validated = validate_output_path(path)?;
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(&validated)
        .map_err(|e| BelError::IoError(format!("Open '{}': {}", validated.display(), e)))?;
    Ok(BufWriter::new(file))
}

/// One JSON document per line.
fn write_line<'a, T: Serialize + 'a>(
    out: &mut impl Write,
    items: impl Iterator<Item = &'a T>,
) -> Result<(), BelError> {
    for item in items {
        serde_json::to_writer(&mut *out, item)
            .map_err(|e| BelError::SerializationError(e.to_string()))?;
        out.write_all(b"\n")
            .map_err(|e| BelError::IoError(e.to_string()))?;
    }
    Ok(())
}

fn flush(out: &mut impl Write) -> Result<(), BelError> {
    out.flush().map_err(|e| BelError::IoError(e.to_string()))
}

/// Converted ids from a previous run. A missing file means none.
pub fn load_resume_file(path: &Path) -> Result<BTreeSet<u64>, BelError> {
    if !path.exists() {
        return Ok(BTreeSet::new());
    }
    let validated_path = validate_file_path(path)?;
    validate_file_size(&validated_path, MAX_RESUME_FILE_SIZE)?;

    let text = std::fs::read_to_string(&validated_path)
        .map_err(|e| BelError::IoError(format!("Read file: {}", e)))?;
    serde_json::from_str(&text).map_err(|e| {
        BelError::SerializationError(format!("resume file '{}': {}", path.display(), e))
    })
}

fn save_resume_file(path: &Path, done: &BTreeSet<u64>) -> Result<(), BelError> {
    let validated = validate_output_path(path)?;
    let data =
        serde_json::to_vec(done).map_err(|e| BelError::SerializationError(e.to_string()))?;
    std::fs::write(&validated, data)
        .map_err(|e| BelError::IoError(format!("Write file: {}", e)))
}
