//! # Set Expander
//!
//! Two treatments for entity sets found inside complexes:
//!
//! - **DefinedSet** members are mutually exclusive fillers. A complex holding
//!   sets of sizes s1..sN expands into the Cartesian product of one choice per
//!   set, giving ∏si concrete member lists before dedup. Nested complexes are
//!   expanded first and cross-multiplied into the outer product.
//! - **CandidateSet** members are never expanded in place. The set stays one
//!   atomic term and yields one `<member> isA <set>` relation per member.

use crate::canonical;
use crate::term::{Complex, EntitySet, Param, Relation, SetKind, Term};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::warn;

// =============================================================================
// MEMBERSHIP RELATIONS
// =============================================================================

/// An auxiliary relation kept apart from the main assertion stream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Membership {
    pub subject: String,
    pub relation: Relation,
    pub object: String,
}

impl Membership {
    pub fn is_a(subject: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            relation: Relation::IsA,
            object: object.into(),
        }
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.relation, self.object)
    }
}

/// One `<member> isA <set>` relation per member of the set.
pub fn candidate_memberships(set: &EntitySet) -> Vec<Membership> {
    set.members()
        .iter()
        .map(|member| Membership::is_a(member.render(), set.render()))
        .collect()
}

/// Register the memberships of every candidate set reachable from `term`.
pub fn collect_memberships(term: &Term, out: &mut BTreeSet<Membership>) {
    match term {
        Term::Set(set) => {
            if *set.kind() == SetKind::Candidate {
                out.extend(candidate_memberships(set));
            }
            for member in set.members() {
                collect_memberships(member, out);
            }
        }
        Term::Complex(complex) => {
            for component in complex.components() {
                collect_memberships(component, out);
            }
        }
        Term::Function(function) => {
            for param in function.params() {
                if let Param::Term(inner) = param {
                    collect_memberships(inner, out);
                }
            }
        }
        Term::Regulator(regulator) => collect_memberships(regulator.node(), out),
        Term::Catalyst(catalyst) => collect_memberships(catalyst.node(), out),
    }
}

// =============================================================================
// DEFINED SET EXPANSION
// =============================================================================

/// Concrete member lists of one complex.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// Number of combinations before dedup (∏si).
    pub raw_count: usize,
    /// Sorted, deduplicated leaf lists. Empty when `truncated`.
    pub combinations: Vec<Vec<Term>>,
    /// `raw_count` exceeded the expander's limit and nothing was built.
    pub truncated: bool,
}

/// Expands defined sets inside complexes.
#[derive(Debug, Clone, Copy)]
pub struct SetExpander {
    max_combinations: usize,
}

impl Default for SetExpander {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl SetExpander {
    pub fn new(max_combinations: usize) -> Self {
        Self { max_combinations }
    }

    /// Expand a complex into its concrete member lists.
    pub fn expand(&self, complex: &Complex) -> Expansion {
        let raw_count = complex_count(complex);
        if raw_count > self.max_combinations {
            warn!(
                db_id = %complex.source().db_id,
                raw_count,
                limit = self.max_combinations,
                "defined set expansion exceeds limit, skipping"
            );
            return Expansion {
                raw_count,
                combinations: Vec::new(),
                truncated: true,
            };
        }

        let mut unique: BTreeMap<String, Vec<Term>> = BTreeMap::new();
        for combination in complex_options(complex) {
            let leaves = canonical::flatten_members(&combination);
            let key = leaves
                .iter()
                .map(Term::render_as_member)
                .collect::<Vec<_>>()
                .join(", ");
            unique.entry(key).or_insert(leaves);
        }

        Expansion {
            raw_count,
            combinations: unique.into_values().collect(),
            truncated: false,
        }
    }

    /// `complex(<combination>) isA <complex>` for every complex reachable
    /// from `term` that holds a defined set.
    pub fn expansion_relations(&self, term: &Term, out: &mut BTreeSet<Membership>) {
        match term {
            Term::Complex(complex) => {
                if !contains_defined_set(complex) {
                    return;
                }
                let expansion = self.expand(complex);
                for combination in expansion.combinations {
                    let concrete =
                        Complex::new(combination, complex.label(), complex.source().clone());
                    out.insert(Membership::is_a(concrete.render(), complex.render()));
                }
            }
            Term::Function(function) => {
                for param in function.params() {
                    if let Param::Term(inner) = param {
                        self.expansion_relations(inner, out);
                    }
                }
            }
            Term::Regulator(regulator) => self.expansion_relations(regulator.node(), out),
            Term::Catalyst(catalyst) => self.expansion_relations(catalyst.node(), out),
            Term::Set(_) => {}
        }
    }
}

/// Whether any component, at any complex depth, is a defined set.
pub fn contains_defined_set(complex: &Complex) -> bool {
    complex.components().iter().any(|component| match component {
        Term::Complex(inner) => contains_defined_set(inner),
        Term::Set(set) => *set.kind() == SetKind::Defined,
        _ => false,
    })
}

fn complex_count(complex: &Complex) -> usize {
    complex
        .components()
        .iter()
        .fold(1usize, |acc, component| {
            acc.saturating_mul(component_count(component))
        })
}

fn component_count(term: &Term) -> usize {
    match term {
        Term::Complex(inner) => complex_count(inner),
        Term::Set(set) if *set.kind() == SetKind::Defined => set
            .members()
            .iter()
            .fold(0usize, |acc, member| acc.saturating_add(component_count(member))),
        _ => 1,
    }
}

fn complex_options(complex: &Complex) -> Vec<Vec<Term>> {
    let mut combinations: Vec<Vec<Term>> = vec![Vec::new()];
    for component in complex.components() {
        let options = component_options(component);
        let mut next = Vec::with_capacity(combinations.len().saturating_mul(options.len()));
        for prefix in &combinations {
            for option in &options {
                let mut combination = prefix.clone();
                combination.extend(option.iter().cloned());
                next.push(combination);
            }
        }
        combinations = next;
    }
    combinations
}

fn component_options(term: &Term) -> Vec<Vec<Term>> {
    match term {
        Term::Complex(inner) => complex_options(inner),
        Term::Set(set) if *set.kind() == SetKind::Defined => {
            set.members().iter().flat_map(component_options).collect()
        }
        other => vec![vec![other.clone()]],
    }
}

// =============================================================================
// TESTS
// =============================================================================
