//! # Conversion Scenarios
//!
//! End-to-end reaction conversions over a small record fixture modelled on
//! the smooth-muscle myosin phosphorylation reaction.

#![allow(clippy::unwrap_used, clippy::panic)]

use rxnbel_core::{
    BelError, CachedStore, Conversion, ConvertOptions, Converter, DbId, EntityStore, MemoryStore,
    MemoryTermCache, NoTermCache, ReactionIndex, ReactionOutcome, RedbStore, Relation,
    StructuralValidator, TermCache,
};
use tempfile::tempdir;

const FIXTURE: &str = include_str!("fixtures/reactions.json");

const CATALYST: &str = "activity(complex(a(CHEBI:29108!\"calcium(2+)\"), p(SP:P0DP23!CALM1), p(SP:Q15746!MYLK), loc(GO:0005829!cytosol)))";

fn store() -> MemoryStore {
    MemoryStore::from_json(FIXTURE).expect("fixture")
}

fn convert(store: &dyn EntityStore, cache: &dyn TermCache, id: u64) -> Conversion {
    let converter = Converter::new(store, cache, &StructuralValidator, ConvertOptions::default())
        .with_update_timestamp("2026-01-01T00:00:00.000Z");
    match converter.convert_reaction(DbId(id)).expect("convert") {
        ReactionOutcome::Converted(conversion) => *conversion,
        ReactionOutcome::Skipped { reason } => panic!("reaction {} skipped: {}", id, reason),
    }
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn catalyst_only_yields_one_assertion() {
    let store = store();
    let conversion = convert(&store, &NoTermCache, 1001);

    assert_eq!(
        conversion.nanopub.assertions,
        vec![format!(
            "{} directlyIncreases rxn(reactants(p(SP:P0DP23!CALM1, loc(GO:0005829!cytosol)), p(SP:Q15746!MYLK, loc(GO:0005829!cytosol))), products(complex(p(SP:P0DP23!CALM1), p(SP:Q15746!MYLK), loc(GO:0005829!cytosol))))",
            CATALYST
        )]
    );
}

#[test]
fn regulators_link_to_catalyst_before_target() {
    let store = store();
    let conversion = convert(&store, &NoTermCache, 445813);

    assert_eq!(
        conversion.nanopub.assertions,
        vec![
            format!(
                "a(CHEBI:16356!\"3',5'-cyclic GMP\", loc(GO:0005829!cytosol)) directlyDecreases {}",
                CATALYST
            ),
            format!(
                "activity(complex(a(CHEBI:29108!\"calcium(2+)\"), p(SP:P0DP23!CALM1), loc(GO:0005829!cytosol))) directlyIncreases {}",
                CATALYST
            ),
            format!(
                "{} directlyIncreases p(REACTOME:R-HSA-445770.1!\"Phosphorylated Smooth Muscle Myosin Light Chain\", pmod(Ph), loc(GO:0005829!cytosol))",
                CATALYST
            ),
        ]
    );
}

#[test]
fn subjectless_translocation_is_standalone() {
    let store = store();
    let conversion = convert(&store, &NoTermCache, 1003);

    assert_eq!(
        conversion.nanopub.assertions,
        vec!["tloc(p(SP:Q15746!MYLK), fromLoc(GO:0005829!cytosol), toLoc(GO:0005654!nucleoplasm))"]
    );
}

#[test]
fn self_cycle_fails_only_its_component() {
    let store = store();
    let cache = MemoryTermCache::new();

    let conversion = convert(&store, &cache, 1004);
    assert_eq!(
        conversion.nanopub.assertions,
        vec!["rxn(reactants(), products(p(SP:P0DP23!CALM1, loc(GO:0005829!cytosol))))"]
    );

    let converter = Converter::new(&store, &cache, &StructuralValidator, ConvertOptions::default());
    match converter.resolve_component(DbId(4000)) {
        Err(BelError::Cycle { id, chain }) => {
            assert_eq!(id, DbId(4000));
            assert_eq!(chain, vec![DbId(4000), DbId(4000)]);
        }
        other => panic!("expected a cycle, got {:?}", other.map(|(t, _)| t)),
    }

    // The batch carries on with the next reaction.
    let next = convert(&store, &cache, 445813);
    assert_eq!(next.nanopub.assertions.len(), 3);
}

#[test]
fn gene_expression_under_regulation() {
    let store = store();
    let conversion = convert(&store, &NoTermCache, 1005);

    assert_eq!(
        conversion.nanopub.assertions,
        vec![
            "activity(p(SP:P0DP23!CALM1, loc(GO:0005829!cytosol))) directlyIncreases p(SP:Q15746!MYLK, loc(GO:0005829!cytosol))"
        ]
    );
}

#[test]
fn failed_reaction_is_skipped() {
    let store = store();
    let converter = Converter::new(
        &store,
        &NoTermCache,
        &StructuralValidator,
        ConvertOptions::default(),
    );
    let outcome = converter.convert_reaction(DbId(1007)).expect("convert");
    assert!(matches!(outcome, ReactionOutcome::Skipped { .. }));
}

#[test]
fn candidate_set_registers_memberships() {
    let store = store();
    let conversion = convert(&store, &NoTermCache, 1008);

    let set = "p(REACTOME:R-HSA-6000.1!\"CaM binders\", loc(GO:0005829!cytosol))";
    assert!(conversion.nanopub.assertions[0].starts_with(&format!("rxn(reactants({})", set)));
    assert_eq!(conversion.memberships.len(), 2);
    assert!(conversion
        .memberships
        .iter()
        .all(|m| m.relation == Relation::IsA && m.object == set));
}

// =============================================================================
// METADATA
// =============================================================================

#[test]
fn nanopub_carries_provenance() {
    let store = store();
    let nanopub = convert(&store, &NoTermCache, 445813).nanopub;

    assert_eq!(nanopub.id, "Reactome_R-HSA-445813.2");
    assert_eq!(
        nanopub.citation.uri,
        "https://reactome.org/content/detail/R-HSA-445813.2"
    );
    assert_eq!(
        nanopub.evidence.as_deref(),
        Some("The smooth muscle light chain kinase phosphorylates the smooth muscle light chains.")
    );
    assert_eq!(nanopub.annotations.len(), 1);
    assert_eq!(nanopub.annotations[0].id, "TAX:9606");
    assert_eq!(nanopub.annotations[0].label, "Homo sapiens");
    assert_eq!(nanopub.metadata.creator.as_deref(), Some("Jupe, S"));
    assert_eq!(
        nanopub.metadata.creator_orcid.as_deref(),
        Some("0000-0001-5807-0069")
    );
    assert_eq!(
        nanopub.metadata.gd_create_ts.as_deref(),
        Some("2009-11-18T16:44:12.000Z")
    );
    assert_eq!(nanopub.metadata.gd_update_ts, "2026-01-01T00:00:00.000Z");
}

#[test]
fn disease_and_created_metadata() {
    let store = store();
    let nanopub = convert(&store, &NoTermCache, 1008).nanopub;

    assert_eq!(nanopub.annotations.len(), 1);
    assert_eq!(nanopub.annotations[0].kind, "Disease");
    assert_eq!(nanopub.annotations[0].id, "DO:162");
    assert_eq!(nanopub.metadata.creator.as_deref(), Some("Jassal, B,"));
    assert_eq!(
        nanopub.metadata.gd_create_ts.as_deref(),
        Some("2008-03-04T10:02:51.000Z")
    );
}

// =============================================================================
// CACHING & STORAGE
// =============================================================================

#[test]
fn cached_terms_do_not_change_output() {
    let store = store();
    let cache = MemoryTermCache::new();

    let first = convert(&store, &cache, 445813);
    assert!(!cache.is_empty());
    let second = convert(&store, &cache, 445813);
    let uncached = convert(&store, &NoTermCache, 445813);

    assert_eq!(first.nanopub, second.nanopub);
    assert_eq!(first.nanopub, uncached.nanopub);
}

#[test]
fn evicting_caches_do_not_change_output() {
    let memory = store();
    let records = CachedStore::with_capacity(store(), 2);
    let terms = MemoryTermCache::with_capacity(1);

    for id in [445813, 1001, 445813, 1008] {
        let bounded = convert(&records, &terms, id);
        let plain = convert(&memory, &NoTermCache, id);
        assert_eq!(bounded.nanopub, plain.nanopub);
        assert_eq!(bounded.memberships, plain.memberships);
    }
    assert!(records.cached_len() <= 2);
    assert_eq!(terms.len(), 1);
}

#[test]
fn redb_store_converts_like_memory_store() {
    let dir = tempdir().expect("tempdir");
    let redb = RedbStore::open(dir.path().join("records.db")).expect("open");
    let records = rxnbel_core::Record::parse_many(FIXTURE).expect("parse");
    redb.import(records).expect("import");

    let memory = store();
    assert_eq!(
        redb.reaction_ids(None).expect("ids"),
        memory.reaction_ids(None).expect("ids")
    );
    assert_eq!(
        redb.reaction_ids(Some("Homo sapiens")).expect("ids"),
        vec![DbId(1001), DbId(445813)]
    );

    let from_redb = convert(&redb, &NoTermCache, 445813);
    let from_memory = convert(&memory, &NoTermCache, 445813);
    assert_eq!(from_redb.nanopub, from_memory.nanopub);
}
