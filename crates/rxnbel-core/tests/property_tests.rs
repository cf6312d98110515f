//! # Property-Based Tests
//!
//! Canonicalization invariants checked with proptest.
//!
//! These tests ensure rendering is deterministic and that flattening and
//! expansion do not depend on input order.

use proptest::collection::vec;
use proptest::prelude::*;
use rxnbel_core::expansion::candidate_memberships;
use rxnbel_core::{
    Complex, DbId, Entity, EntitySet, Function, Keyword, Location, Modifier, PMod, SetExpander,
    SetKind, SourceIds, Term,
};
use std::collections::BTreeSet;

// =============================================================================
// HELPERS
// =============================================================================

fn ids(db_id: u64) -> SourceIds {
    SourceIds {
        db_id: DbId(db_id),
        st_id: format!("R-HSA-{}", db_id),
        st_id_version: format!("R-HSA-{}.1", db_id),
    }
}

fn protein(id: &str, location: Option<Location>, modifiers: Vec<Modifier>) -> Term {
    let entity = Entity {
        namespace: "SP".to_string(),
        id: id.to_string(),
        label: String::new(),
        source: ids(1),
        location,
    };
    Term::Function(Function::of_entity(Keyword::Protein, entity, modifiers))
}

fn phospho(coordinate: i64) -> Modifier {
    Modifier::PMod(PMod {
        code: "Ph".to_string(),
        label: None,
        residue: Some("Ser".to_string()),
        coordinate: Some(coordinate),
        source: DbId(0),
    })
}

fn proteins(numbers: &[u32]) -> Vec<Term> {
    numbers
        .iter()
        .map(|n| protein(&format!("P{}", n), None, Vec::new()))
        .collect()
}

fn nested(numbers: &[u32]) -> Complex {
    let (inner, outer) = numbers.split_at(numbers.len() / 2);
    let mut components = proteins(outer);
    components.push(Term::Complex(Complex::new(proteins(inner), "inner", ids(2))));
    Complex::new(components, "outer", ids(3))
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Building the same function twice gives the same text, whatever the
    /// modifier order.
    #[test]
    fn render_is_idempotent(coords in vec(1i64..2000, 0..6)) {
        let forward: Vec<Modifier> = coords.iter().map(|&c| phospho(c)).collect();
        let backward: Vec<Modifier> = coords.iter().rev().map(|&c| phospho(c)).collect();
        let cytosol = Location::new("GO", "0005829", "cytosol");

        let a = protein("P31749", Some(cytosol.clone()), forward);
        let b = protein("P31749", Some(cytosol), backward);

        prop_assert_eq!(a.render(), b.render());
        let copy = a.clone();
        prop_assert_eq!(a.render(), copy.render());
        prop_assert_eq!(a.to_string(), a.render().to_string());
    }

    /// Flattened members hold no complex and no duplicate.
    #[test]
    fn flattening_removes_nesting_and_duplicates(numbers in vec(0u32..20, 1..12)) {
        let complex = nested(&numbers);
        let distinct: BTreeSet<u32> = numbers.iter().copied().collect();

        prop_assert!(complex.members().iter().all(|m| !matches!(m, Term::Complex(_))));
        prop_assert_eq!(complex.members().len(), distinct.len());

        let rendered: BTreeSet<&str> = complex.members().iter().map(Term::render_as_member).collect();
        prop_assert_eq!(rendered.len(), complex.members().len());
    }

    /// Component order and nesting shape do not change the rendering.
    #[test]
    fn flattening_is_order_invariant(numbers in vec(0u32..20, 1..12)) {
        let reversed: Vec<u32> = numbers.iter().rev().copied().collect();
        let flat = Complex::new(proteins(&numbers), "flat", ids(4));

        let forward = nested(&numbers);
        let backward = nested(&reversed);

        prop_assert_eq!(forward.render(), backward.render());
        prop_assert_eq!(forward.render(), flat.render());
    }

    /// A complex holding defined sets of sizes s1..sN expands to ∏si lists.
    #[test]
    fn defined_sets_expand_to_product(sizes in vec(1usize..4, 1..4)) {
        let mut components = vec![protein("FIXED", None, Vec::new())];
        for (i, size) in sizes.iter().enumerate() {
            let members: Vec<Term> = (0..*size)
                .map(|j| protein(&format!("S{}M{}", i, j), None, Vec::new()))
                .collect();
            components.push(Term::Set(EntitySet::new(
                SetKind::Defined,
                members,
                format!("set{}", i),
                ids(100 + i as u64),
            )));
        }
        let complex = Complex::new(components, "holder", ids(5));
        let expected: usize = sizes.iter().product();

        let expansion = SetExpander::default().expand(&complex);
        prop_assert!(!expansion.truncated);
        prop_assert_eq!(expansion.raw_count, expected);
        prop_assert_eq!(expansion.combinations.len(), expected);
        for combination in &expansion.combinations {
            prop_assert_eq!(combination.len(), sizes.len() + 1);
        }
    }

    /// A candidate set stays one term and yields one relation per member.
    #[test]
    fn candidate_sets_yield_one_relation_per_member(numbers in vec(0u32..30, 1..10)) {
        let distinct: BTreeSet<u32> = numbers.iter().copied().collect();
        let set = EntitySet::new(SetKind::Candidate, proteins(&numbers), "candidates", ids(6));

        prop_assert_eq!(set.render(), "p(REACTOME:R-HSA-6.1!candidates)");
        prop_assert_eq!(candidate_memberships(&set).len(), distinct.len());
    }
}
