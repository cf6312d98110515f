//! # Canonicalizer
//!
//! Rules applied once while constructing complexes and entity sets:
//! - shared location inference
//! - complex flattening
//! - set keyword inference
//! - modification merging
//!
//! Ambiguity never fails construction. Disagreeing locations degrade to no
//! location, disagreeing keywords degrade to `MISSING`; both are logged.

use crate::term::{Keyword, Location, Modifier, Term};
use crate::types::DbId;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Sort terms by canonical text and drop duplicates.
pub fn dedup_by_render(terms: Vec<Term>) -> Vec<Term> {
    terms.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// The single non-empty location shared by all inputs, if there is one.
pub fn shared_location<'a>(
    locations: impl IntoIterator<Item = Option<&'a Location>>,
    owner: DbId,
) -> Option<Location> {
    let distinct: BTreeSet<&Location> = locations.into_iter().flatten().collect();
    match distinct.len() {
        0 => None,
        1 => distinct.into_iter().next().cloned(),
        _ => {
            warn!(
                db_id = %owner,
                locations = ?distinct.iter().map(|l| l.render()).collect::<Vec<_>>(),
                "mismatched member locations, leaving location empty"
            );
            None
        }
    }
}

/// Replace nested complexes by their leaves.
///
/// The result holds no `Term::Complex`, is deduplicated by member rendering,
/// and is sorted by it, so it does not depend on input order.
pub fn flatten_members(components: &[Term]) -> Vec<Term> {
    let mut leaves: BTreeMap<String, Term> = BTreeMap::new();
    for component in components {
        match component {
            Term::Complex(inner) => {
                for leaf in inner.members() {
                    leaves
                        .entry(leaf.render_as_member().to_string())
                        .or_insert_with(|| leaf.clone());
                }
            }
            other => {
                leaves
                    .entry(other.render_as_member().to_string())
                    .or_insert_with(|| other.clone());
            }
        }
    }
    leaves.into_values().collect()
}

/// `complex(<members>[, loc(...)])`
pub fn render_complex(members: &[Term], location: Option<&Location>) -> String {
    let mut parts: Vec<&str> = members.iter().map(Term::render_as_member).collect();
    let loc = location.map(|l| format!("loc({})", l.render()));
    if let Some(loc) = loc.as_deref() {
        parts.push(loc);
    }
    format!("complex({})", parts.join(", "))
}

/// Keyword an entity set renders with.
///
/// A single keyword shared by every function, complex and nested set member
/// wins. Otherwise any complex member makes it `complex`, else `MISSING`.
pub fn infer_set_keyword(members: &[Term], owner: DbId) -> Keyword {
    let mut keywords = BTreeSet::new();
    let mut has_complex = false;

    for member in members {
        match member {
            Term::Function(f) => {
                keywords.insert(f.keyword());
            }
            Term::Complex(_) => {
                keywords.insert(Keyword::Complex);
                has_complex = true;
            }
            Term::Set(set) if set.keyword() != Keyword::Missing => {
                keywords.insert(set.keyword());
                has_complex |= set.keyword() == Keyword::Complex;
            }
            other => {
                debug!(db_id = %owner, member = %other, "set member carries no keyword");
            }
        }
    }

    if keywords.len() == 1 {
        if let Some(keyword) = keywords.iter().next().copied() {
            return keyword;
        }
    } else if has_complex {
        return Keyword::Complex;
    }

    warn!(
        db_id = %owner,
        keywords = ?keywords.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        "set members share no keyword, rendering as MISSING"
    );
    Keyword::Missing
}

/// Union of the function members' modifiers, deduplicated by code-only
/// rendering and sorted by it.
pub fn merge_modifiers(members: &[Term]) -> Vec<Modifier> {
    let mut merged: BTreeMap<String, Modifier> = BTreeMap::new();
    for member in members {
        if let Term::Function(f) = member {
            for modifier in f.modifiers() {
                merged
                    .entry(modifier.render_mod_only())
                    .or_insert_with(|| modifier.clone());
            }
        }
    }
    merged.into_values().collect()
}

// =============================================================================
// TESTS
// =============================================================================
