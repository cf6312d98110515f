//! # Reaction Converter
//!
//! Per-reaction entry point: resolve participants, synthesize assertions,
//! collect auxiliary relations and assemble the output record.
//!
//! A failing participant (missing record, cycle, unresolvable class) is
//! logged and omitted; the rest of the reaction still converts.

use crate::expansion::{Membership, SetExpander};
use crate::nanopub::{self, Nanopub};
use crate::primitives::FAILED_REACTION;
use crate::resolver::{ComponentResolver, ResolutionContext};
use crate::store::{EntityStore, TermCache};
use crate::synthesis::{AssertionSynthesizer, ReactionComponents};
use crate::term::Term;
use crate::types::{BelError, DbId, Record};
use crate::validation::AssertionValidator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Conversion options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Emit `complex(<combination>) isA <complex>` for defined sets.
    pub expand_defined_sets: bool,
    /// Upper bound on combinations per complex.
    pub max_combinations: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            expand_defined_sets: false,
            max_combinations: 1024,
        }
    }
}

/// A converted reaction.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub nanopub: Nanopub,
    /// Candidate-set memberships and defined-set expansions.
    pub memberships: BTreeSet<Membership>,
}

/// Result of converting one reaction id.
#[derive(Debug, Clone)]
pub enum ReactionOutcome {
    Converted(Box<Conversion>),
    Skipped { reason: String },
}

/// Which side of a reaction a participant sits on.
#[derive(Debug, Clone, Copy)]
enum Role {
    Input,
    Output,
    Catalyst,
    Regulator,
}

impl Role {
    const fn field(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Catalyst => "catalystActivity",
            Self::Regulator => "regulatedBy",
        }
    }
}

/// Converts reactions against one store and one term cache.
pub struct Converter<'a> {
    store: &'a dyn EntityStore,
    cache: &'a dyn TermCache,
    validator: &'a dyn AssertionValidator,
    options: ConvertOptions,
    updated: Option<String>,
}

impl<'a> Converter<'a> {
    pub fn new(
        store: &'a dyn EntityStore,
        cache: &'a dyn TermCache,
        validator: &'a dyn AssertionValidator,
        options: ConvertOptions,
    ) -> Self {
        Self {
            store,
            cache,
            validator,
            options,
            updated: None,
        }
    }

    /// Fix the `gd_updateTS` stamp instead of reading the clock.
    pub fn with_update_timestamp(mut self, updated: impl Into<String>) -> Self {
        self.updated = Some(updated.into());
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Resolve a single component and the memberships it registers.
    pub fn resolve_component(
        &self,
        id: DbId,
    ) -> Result<(Option<Term>, BTreeSet<Membership>), BelError> {
        let resolver = ComponentResolver::new(self.store, self.cache);
        let mut ctx = ResolutionContext::new();
        let term = resolver.resolve(id, &mut ctx)?;
        Ok((term, ctx.into_memberships()))
    }

    /// Convert one reaction.
    pub fn convert_reaction(&self, id: DbId) -> Result<ReactionOutcome, BelError> {
        let record = self.store.get(id)?.ok_or(BelError::RecordNotFound(id))?;

        if record.schema_class == FAILED_REACTION {
            warn!(db_id = %id, "FailedReaction, skipping");
            return Ok(ReactionOutcome::Skipped {
                reason: FAILED_REACTION.to_string(),
            });
        }
        if !record.is_reaction_like() {
            return Err(BelError::MalformedRecord(
                id,
                format!("schema class {:?} is not a reaction", record.schema_class),
            ));
        }

        info!(db_id = %id, st_id = %record.st_id_version, "converting reaction");

        let resolver = ComponentResolver::new(self.store, self.cache);
        let mut ctx = ResolutionContext::new();
        let mut components = ReactionComponents::default();

        for role in [Role::Input, Role::Output, Role::Catalyst, Role::Regulator] {
            for term in self.participants(&resolver, &record, role, &mut ctx) {
                match (role, term) {
                    (Role::Input, term) => {
                        components.inputs.insert(term);
                    }
                    (Role::Output, term) => {
                        components.outputs.insert(term);
                    }
                    (Role::Catalyst, Term::Catalyst(catalyst)) => {
                        components.catalysts.insert(catalyst);
                    }
                    (Role::Regulator, Term::Regulator(regulator)) => {
                        components.regulators.insert(regulator);
                    }
                    (role, other) => {
                        warn!(db_id = %id, field = role.field(), term = %other, "unexpected participant kind");
                    }
                }
            }
        }

        let synthesizer = AssertionSynthesizer::new(self.validator);
        let assertions: Vec<String> = synthesizer
            .synthesize(&components)
            .iter()
            .map(ToString::to_string)
            .collect();
        if assertions.is_empty() {
            warn!(db_id = %id, st_id = %record.st_id_version, "no assertions");
        }

        let mut memberships = ctx.into_memberships();
        if self.options.expand_defined_sets {
            self.expand(&components, &mut memberships);
        }

        let updated = self
            .updated
            .clone()
            .unwrap_or_else(nanopub::now_timestamp);
        let nanopub = nanopub::assemble(self.store, &record, assertions, &updated)?;

        Ok(ReactionOutcome::Converted(Box::new(Conversion {
            nanopub,
            memberships,
        })))
    }

    fn participants(
        &self,
        resolver: &ComponentResolver<'_>,
        record: &Record,
        role: Role,
        ctx: &mut ResolutionContext,
    ) -> Vec<Term> {
        let mut terms = Vec::new();
        for participant in record.refs(role.field()) {
            match resolver.resolve(participant, ctx) {
                Ok(Some(term)) => terms.push(term),
                Ok(None) => {
                    debug!(db_id = %record.db_id, participant = %participant, field = role.field(), "participant contributes nothing");
                }
                Err(e) => {
                    warn!(db_id = %record.db_id, participant = %participant, field = role.field(), error = %e, "participant failed, omitting");
                }
            }
        }
        terms
    }

    fn expand(&self, components: &ReactionComponents, out: &mut BTreeSet<Membership>) {
        let expander = SetExpander::new(self.options.max_combinations);
        let terms = components
            .inputs
            .iter()
            .chain(&components.outputs)
            .chain(components.catalysts.iter().map(|c| c.node()))
            .chain(components.regulators.iter().map(|r| r.node()));
        for term in terms {
            expander.expansion_relations(term, out);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, MemoryTermCache};
    use crate::validation::StructuralValidator;

    fn store() -> MemoryStore {
        MemoryStore::from_json(
            r#"[
                {"dbId": 1, "stId": "R-HSA-1", "stIdVersion": "R-HSA-1.1", "schemaClass": "Reaction",
                 "input": [10], "output": [11], "catalystActivity": [20]},
                {"dbId": 2, "stIdVersion": "R-HSA-2.1", "schemaClass": "FailedReaction"},
                {"dbId": 3, "className": "Protein", "schemaClass": "EntityWithAccessionedSequence"},
                {"dbId": 10, "stIdVersion": "R-HSA-10.1", "className": "Set", "schemaClass": "DefinedSet", "name": ["PKA"],
                 "hasMember": [12, 13]},
                {"dbId": 11, "stIdVersion": "R-HSA-11.1", "className": "Complex", "name": ["PKA:Ca"], "hasComponent": [10, 14]},
                {"dbId": 12, "className": "Protein", "referenceEntity": {"databaseName": "UniProt", "identifier": "P1"}},
                {"dbId": 13, "className": "Protein", "referenceEntity": {"databaseName": "UniProt", "identifier": "P2"}},
                {"dbId": 14, "className": "Chemical Compound", "referenceEntity": {"databaseName": "ChEBI", "identifier": "29108"}},
                {"dbId": 20, "className": "CatalystActivity", "physicalEntity": 12}
            ]"#,
        )
        .expect("fixture")
    }

    fn converter<'a>(
        store: &'a MemoryStore,
        cache: &'a MemoryTermCache,
        options: ConvertOptions,
    ) -> Converter<'a> {
        Converter::new(store, cache, &StructuralValidator, options).with_update_timestamp("ts")
    }

    #[test]
    fn failed_reactions_are_skipped() {
        let store = store();
        let cache = MemoryTermCache::new();
        let outcome = converter(&store, &cache, ConvertOptions::default())
            .convert_reaction(DbId(2))
            .expect("convert");
        assert!(matches!(outcome, ReactionOutcome::Skipped { .. }));
    }

    #[test]
    fn non_reactions_and_missing_ids_are_errors() {
        let store = store();
        let cache = MemoryTermCache::new();
        let converter = converter(&store, &cache, ConvertOptions::default());
        assert!(matches!(
            converter.convert_reaction(DbId(3)),
            Err(BelError::MalformedRecord(..))
        ));
        assert!(matches!(
            converter.convert_reaction(DbId(404)),
            Err(BelError::RecordNotFound(DbId(404)))
        ));
    }

    #[test]
    fn defined_set_expansion_is_optional() {
        let store = store();
        let cache = MemoryTermCache::new();

        let ReactionOutcome::Converted(plain) = converter(&store, &cache, ConvertOptions::default())
            .convert_reaction(DbId(1))
            .expect("convert")
        else {
            unreachable!("reaction converts");
        };
        assert!(plain.memberships.is_empty());
        assert_eq!(plain.nanopub.assertions.len(), 1);

        let options = ConvertOptions {
            expand_defined_sets: true,
            ..ConvertOptions::default()
        };
        let ReactionOutcome::Converted(expanded) = converter(&store, &cache, options)
            .convert_reaction(DbId(1))
            .expect("convert")
        else {
            unreachable!("reaction converts");
        };
        let relations: Vec<String> = expanded.memberships.iter().map(ToString::to_string).collect();
        assert_eq!(
            relations,
            vec![
                "complex(a(CHEBI:29108), p(SP:P1)) isA complex(a(CHEBI:29108), p(REACTOME:R-HSA-10.1!PKA))",
                "complex(a(CHEBI:29108), p(SP:P2)) isA complex(a(CHEBI:29108), p(REACTOME:R-HSA-10.1!PKA))",
            ]
        );
    }

    #[test]
    fn resolve_component_returns_memberships() {
        let store = store();
        let cache = MemoryTermCache::new();
        let (term, memberships) = converter(&store, &cache, ConvertOptions::default())
            .resolve_component(DbId(10))
            .expect("resolve");
        assert_eq!(term.expect("term").render(), "p(REACTOME:R-HSA-10.1!PKA)");
        assert!(memberships.is_empty());
    }
}
