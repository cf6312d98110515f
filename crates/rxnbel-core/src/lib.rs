//! # rxnbel-core
//!
//! The deterministic translation engine for rxnbel.
//!
//! This crate turns pathway reaction records into BEL assertions wrapped as
//! nanopubs. It resolves a heterogeneous record graph into typed terms,
//! canonicalizes ambiguous structures with fixed degradation rules, and
//! classifies each reaction into a target pattern.
//!
//! ## Pipeline
//!
//! - `store` → by-id record lookup, memo and term cache
//! - `resolver` → record → term, with cycle detection
//! - `canonical` / `expansion` → complex and set rules
//! - `synthesis` → assertions, validated through `validation`
//! - `nanopub` → output record with provenance
//! - `convert` → per-reaction entry point tying it all together
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies (pure Rust)
//! - Deterministic output: ordered collections only
//! - One bad record never aborts a batch

// =============================================================================
// MODULES
// =============================================================================

pub mod canonical;
pub mod convert;
pub mod expansion;
pub mod modification;
pub mod nanopub;
pub mod primitives;
pub mod resolver;
pub mod storage;
pub mod store;
pub mod synthesis;
pub mod term;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{BelError, DbId, Record, SourceIds};

// =============================================================================
// RE-EXPORTS: Translation Engine
// =============================================================================

pub use convert::{Conversion, ConvertOptions, Converter, ReactionOutcome};
pub use expansion::{Expansion, Membership, SetExpander};
pub use resolver::{ComponentResolver, RecordClass, ResolutionContext};
pub use store::{
    CachedStore, DEFAULT_RECORD_CACHE_CAPACITY, DEFAULT_TERM_CACHE_CAPACITY, EntityStore,
    MemoryStore, MemoryTermCache, NoTermCache, ReactionIndex, TermCache,
};
pub use synthesis::{Assertion, AssertionSynthesizer, Pattern, ReactionComponents, Target};
pub use term::{
    Catalyst, Complex, Entity, EntitySet, Function, Keyword, Location, Modifier, PMod, Regulator,
    Relation, SetKind, Term, Variance,
};
pub use validation::{AssertionValidator, Severity, StructuralValidator, ValidationIssue};

// =============================================================================
// RE-EXPORTS: Output & Storage
// =============================================================================

pub use nanopub::{Annotation, Nanopub, NanopubEnvelope};
pub use storage::RedbStore;
