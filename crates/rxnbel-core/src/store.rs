//! # Entity Store & Term Cache
//!
//! Read-only access to source records, and the memo of resolved terms.
//!
//! - [`EntityStore`]: by-id record lookup. Never mutated by the resolver.
//! - [`ReactionIndex`]: lists the reactions available for batch conversion.
//! - [`TermCache`]: cross-reaction memo of resolved terms, insert-if-absent.
//!
//! All implementations are `Send + Sync` so one store and one cache can be
//! shared by conversions running on different threads. Both memos are
//! bounded LRUs; an evicted entry is simply resolved again.

use crate::term::Term;
use crate::types::{BelError, DbId, Record, value_ref};
use lru::LruCache;
use serde_json::Value;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::{PoisonError, RwLock};

/// Default number of records kept by [`CachedStore`].
pub const DEFAULT_RECORD_CACHE_CAPACITY: usize = 1024;

/// Default number of terms kept by [`MemoryTermCache`].
pub const DEFAULT_TERM_CACHE_CAPACITY: usize = 5000;

fn bounded<V>(capacity: usize) -> RwLock<LruCache<DbId, V>> {
    let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
    RwLock::new(LruCache::new(capacity))
}

// =============================================================================
// ENTITY STORE
// =============================================================================

/// By-id lookup of raw records.
pub trait EntityStore: Send + Sync {
    /// Fetch a record. `Ok(None)` means the id is unknown.
    fn get(&self, id: DbId) -> Result<Option<Record>, BelError>;

    /// Follow a reference value to a full record.
    ///
    /// Integers are looked up by id. Objects carrying a `dbId` present in
    /// the store resolve to the stored record; otherwise an object is read as
    /// an embedded record.
    fn follow(&self, value: &Value) -> Result<Option<Record>, BelError> {
        match value {
            Value::Object(map) => {
                if let Some(id) = value_ref(value) {
                    if let Some(record) = self.get(id)? {
                        return Ok(Some(record));
                    }
                }
                if map.len() > 1 {
                    Record::from_value(value.clone()).map(Some)
                } else {
                    Ok(None)
                }
            }
            other => match value_ref(other) {
                Some(id) => self.get(id),
                None => Ok(None),
            },
        }
    }

    /// The first record referenced or embedded under `key`.
    fn follow_first(&self, record: &Record, key: &str) -> Result<Option<Record>, BelError> {
        for value in record.values(key) {
            if let Some(found) = self.follow(value)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Every record referenced or embedded under `key`.
    fn follow_all(&self, record: &Record, key: &str) -> Result<Vec<Record>, BelError> {
        let mut found = Vec::new();
        for value in record.values(key) {
            if let Some(next) = self.follow(value)? {
                found.push(next);
            }
        }
        Ok(found)
    }
}

/// Lists reactions for batch conversion.
pub trait ReactionIndex {
    /// Reaction ids in ascending order, optionally restricted to a species
    /// display name (e.g. `Homo sapiens`).
    fn reaction_ids(&self, species: Option<&str>) -> Result<Vec<DbId>, BelError>;
}

/// Whether `reaction` belongs to the named species.
pub fn reaction_in_species<S: EntityStore + ?Sized>(
    store: &S,
    reaction: &Record,
    species: &str,
) -> Result<bool, BelError> {
    Ok(store
        .follow_all(reaction, "species")?
        .iter()
        .any(|s| s.display_name == species || s.first_name() == Some(species)))
}

/// In-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<DbId, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a JSON array or JSON Lines dump.
    pub fn from_json(text: &str) -> Result<Self, BelError> {
        Ok(Self::from_records(Record::parse_many(text)?))
    }

    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Insert or replace a record.
    pub fn insert(&mut self, record: Record) {
        self.records.insert(record.db_id, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, id: DbId) -> Result<Option<Record>, BelError> {
        Ok(self.records.get(&id).cloned())
    }
}

impl ReactionIndex for MemoryStore {
    fn reaction_ids(&self, species: Option<&str>) -> Result<Vec<DbId>, BelError> {
        let mut ids = Vec::new();
        for record in self.records.values().filter(|r| r.is_reaction_like()) {
            if let Some(species) = species {
                if !reaction_in_species(self, record, species)? {
                    continue;
                }
            }
            ids.push(record.db_id);
        }
        Ok(ids)
    }
}

/// Read-through LRU memo in front of another store.
///
/// Only found records are kept; unknown ids go to the inner store each time.
#[derive(Debug)]
pub struct CachedStore<S> {
    inner: S,
    memo: RwLock<LruCache<DbId, Record>>,
}

impl<S: EntityStore> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_RECORD_CACHE_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            memo: bounded(capacity),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of memoized records.
    pub fn cached_len(&self) -> usize {
        self.memo.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn capacity(&self) -> usize {
        self.memo
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cap()
            .get()
    }
}

impl<S: EntityStore> EntityStore for CachedStore<S> {
    fn get(&self, id: DbId) -> Result<Option<Record>, BelError> {
        // LRU lookups update recency, so even hits take the write lock.
        if let Some(hit) = self
            .memo
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Ok(Some(hit.clone()));
        }

        let fetched = self.inner.get(id)?;
        if let Some(record) = &fetched {
            self.memo
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .put(id, record.clone());
        }
        Ok(fetched)
    }
}

impl<S: EntityStore + ReactionIndex> ReactionIndex for CachedStore<S> {
    fn reaction_ids(&self, species: Option<&str>) -> Result<Vec<DbId>, BelError> {
        self.inner.reaction_ids(species)
    }
}

// =============================================================================
// TERM CACHE
// =============================================================================

/// Memo of resolved terms keyed by source record id.
pub trait TermCache: Send + Sync {
    fn get(&self, id: DbId) -> Option<Term>;

    /// Insert unless a term is already cached for `id`.
    fn insert(&self, id: DbId, term: Term);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `RwLock`-guarded in-memory LRU term cache.
#[derive(Debug)]
pub struct MemoryTermCache {
    terms: RwLock<LruCache<DbId, Term>>,
}

impl MemoryTermCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TERM_CACHE_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: bounded(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.terms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cap()
            .get()
    }
}

impl Default for MemoryTermCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TermCache for MemoryTermCache {
    fn get(&self, id: DbId) -> Option<Term> {
        self.terms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn insert(&self, id: DbId, term: Term) {
        let mut terms = self.terms.write().unwrap_or_else(PoisonError::into_inner);
        if !terms.contains(&id) {
            terms.put(id, term);
        }
    }

    fn len(&self) -> usize {
        self.terms.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// A cache that never holds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTermCache;

impl TermCache for NoTermCache {
    fn get(&self, _id: DbId) -> Option<Term> {
        None
    }

    fn insert(&self, _id: DbId, _term: Term) {}

    fn len(&self) -> usize {
        0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{Entity, Function, Keyword};
    use crate::types::SourceIds;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::from_json(
            r#"[
                {"dbId": 1, "schemaClass": "Reaction", "species": [{"dbId": 48887, "displayName": "Homo sapiens", "taxId": "9606"}]},
                {"dbId": 2, "schemaClass": "Reaction", "species": 3},
                {"dbId": 3, "className": "Species", "displayName": "Mus musculus", "taxId": "10090"},
                {"dbId": 4, "schemaClass": "EntityWithAccessionedSequence"}
            ]"#,
        )
        .expect("fixture")
    }

    fn term(id: &str) -> Term {
        let entity = Entity {
            namespace: "SP".to_string(),
            id: id.to_string(),
            label: String::new(),
            source: SourceIds::default(),
            location: None,
        };
        Term::Function(Function::of_entity(Keyword::Protein, entity, Vec::new()))
    }

    #[test]
    fn follow_accepts_refs_and_embedded_records() {
        let store = store();
        let by_int = store.follow(&json!(3)).expect("follow").expect("found");
        assert_eq!(by_int.display_name, "Mus musculus");

        let embedded = store
            .follow(&json!({"dbId": 999, "displayName": "GO term", "accession": "0005829"}))
            .expect("follow")
            .expect("embedded");
        assert_eq!(embedded.first_str("accession"), Some("0005829"));

        assert!(store.follow(&json!({"dbId": 999})).expect("follow").is_none());
    }

    #[test]
    fn reaction_index_filters_species() {
        let store = store();
        assert_eq!(store.reaction_ids(None).expect("ids"), vec![DbId(1), DbId(2)]);
        assert_eq!(
            store.reaction_ids(Some("Homo sapiens")).expect("ids"),
            vec![DbId(1)]
        );
        assert_eq!(
            store.reaction_ids(Some("Mus musculus")).expect("ids"),
            vec![DbId(2)]
        );
    }

    #[test]
    fn cached_store_memoizes_found_records_only() {
        let cached = CachedStore::new(store());
        assert_eq!(cached.capacity(), DEFAULT_RECORD_CACHE_CAPACITY);
        assert!(cached.get(DbId(3)).expect("get").is_some());
        assert!(cached.get(DbId(42)).expect("get").is_none());
        assert!(cached.get(DbId(3)).expect("get").is_some());
        assert_eq!(cached.cached_len(), 1);
    }

    #[test]
    fn cached_store_evicts_least_recent() {
        let cached = CachedStore::with_capacity(store(), 2);
        for id in [1, 2, 3, 4, 1] {
            let record = cached.get(DbId(id)).expect("get").expect("found");
            assert_eq!(record.db_id, DbId(id));
        }
        assert_eq!(cached.cached_len(), 2);
        assert_eq!(CachedStore::with_capacity(store(), 0).capacity(), 1);
    }

    #[test]
    fn term_cache_evicts_and_rebuilds() {
        let cache = MemoryTermCache::with_capacity(2);
        cache.insert(DbId(1), term("A"));
        cache.insert(DbId(2), term("B"));
        assert!(cache.get(DbId(1)).is_some());
        cache.insert(DbId(3), term("C"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(DbId(2)).is_none(), "least recently used goes first");
        assert!(cache.get(DbId(1)).is_some());
        assert_eq!(MemoryTermCache::new().capacity(), DEFAULT_TERM_CACHE_CAPACITY);
    }

    #[test]
    fn term_cache_keeps_first_insert() {
        let cache = MemoryTermCache::new();
        cache.insert(DbId(1), term("A"));
        cache.insert(DbId(1), term("B"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(DbId(1)).expect("cached").render(), "p(SP:A)");

        let none = NoTermCache;
        none.insert(DbId(1), term("A"));
        assert!(none.get(DbId(1)).is_none());
        assert!(none.is_empty());
    }
}
