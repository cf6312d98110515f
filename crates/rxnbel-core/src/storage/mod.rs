//! # Storage Module
//!
//! Persistent record stores.

mod redb_store;

pub use redb_store::RedbStore;
