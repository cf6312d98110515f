//! # Component Resolver
//!
//! Resolves a record id into a typed [`Term`], recursively.
//!
//! ## Dispatch
//!
//! The record's `className` maps onto a closed [`RecordClass`]; each variant
//! has one builder. Unknown classes resolve to `None` and are logged, so a
//! caller treats them as "no contribution" rather than a failure.
//!
//! ## Cycles
//!
//! A [`ResolutionContext`] carries the chain of ids currently being resolved.
//! Revisiting an id on that chain returns [`BelError::Cycle`], which fails
//! the enclosing component only. The context also collects the candidate-set
//! membership relations met along the way.

use crate::expansion::{Membership, candidate_memberships, collect_memberships};
use crate::modification::resolve_modifier;
use crate::primitives::{
    LOCATION_NAMESPACE, PHOTON_CHEBI_ID, PHOTON_LABEL, PHOTON_NAME, PLACEHOLDER_NAMESPACE,
    REACTOME_NAMESPACE, reference_namespace,
};
use crate::store::{EntityStore, TermCache};
use crate::term::{
    Catalyst, Complex, Entity, EntitySet, Function, Keyword, Location, Modifier,
    Regulator, Relation, SetKind, Term,
};
use crate::types::{BelError, DbId, Record};
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

// =============================================================================
// RECORD CLASSES
// =============================================================================

/// Declared record classes the resolver knows how to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordClass {
    Protein,
    GenesAndTranscripts,
    /// `Chemical Compound`, `ChemicalDrug` and `ProteinDrug`.
    ChemicalCompound,
    DnaSequence,
    RnaSequence,
    Polymer,
    OtherEntity,
    Complex,
    Set,
    Requirement,
    CatalystActivity,
    PositiveRegulation,
    NegativeRegulation,
    PositiveGeneExpressionRegulation,
    NegativeGeneExpressionRegulation,
    /// Any other `*Regulation` class.
    OtherRegulation(String),
    Unknown(String),
}

impl RecordClass {
    pub fn from_class_name(class_name: &str) -> Self {
        match class_name {
            "Protein" => Self::Protein,
            "Genes and Transcripts" => Self::GenesAndTranscripts,
            "Chemical Compound" | "ChemicalDrug" | "ProteinDrug" => Self::ChemicalCompound,
            "DNA Sequence" => Self::DnaSequence,
            "RNA Sequence" => Self::RnaSequence,
            "Polymer" => Self::Polymer,
            "OtherEntity" => Self::OtherEntity,
            "Complex" => Self::Complex,
            "Set" => Self::Set,
            "Requirement" => Self::Requirement,
            "CatalystActivity" => Self::CatalystActivity,
            "PositiveRegulation" => Self::PositiveRegulation,
            "NegativeRegulation" => Self::NegativeRegulation,
            "PositiveGeneExpressionRegulation" => Self::PositiveGeneExpressionRegulation,
            "NegativeGeneExpressionRegulation" => Self::NegativeGeneExpressionRegulation,
            other if other.ends_with("Regulation") => Self::OtherRegulation(other.to_string()),
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Relation of a regulation class, `None` for non-regulations.
    pub fn regulation_relation(&self) -> Option<Relation> {
        match self {
            Self::PositiveRegulation | Self::PositiveGeneExpressionRegulation => {
                Some(Relation::DirectlyIncreases)
            }
            Self::NegativeRegulation | Self::NegativeGeneExpressionRegulation => {
                Some(Relation::DirectlyDecreases)
            }
            Self::OtherRegulation(_) => Some(Relation::Regulates),
            _ => None,
        }
    }
}

// =============================================================================
// RESOLUTION CONTEXT
// =============================================================================

/// Per-resolution state threaded through every builder.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    chain: Vec<DbId>,
    memberships: BTreeSet<Membership>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids currently being resolved, outermost first.
    pub fn chain(&self) -> &[DbId] {
        &self.chain
    }

    pub fn memberships(&self) -> &BTreeSet<Membership> {
        &self.memberships
    }

    pub fn into_memberships(self) -> BTreeSet<Membership> {
        self.memberships
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Recursive record -> term resolver.
pub struct ComponentResolver<'a> {
    store: &'a dyn EntityStore,
    cache: &'a dyn TermCache,
}

impl<'a> ComponentResolver<'a> {
    pub fn new(store: &'a dyn EntityStore, cache: &'a dyn TermCache) -> Self {
        Self { store, cache }
    }

    /// Resolve one record id.
    ///
    /// `Ok(None)` means the record is missing or contributes nothing.
    pub fn resolve(
        &self,
        id: DbId,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<Term>, BelError> {
        if let Some(term) = self.cache.get(id) {
            collect_memberships(&term, &mut ctx.memberships);
            return Ok(Some(term));
        }

        if ctx.chain.contains(&id) {
            let mut chain = ctx.chain.clone();
            chain.push(id);
            warn!(db_id = %id, chain = ?chain, "cyclic resolution");
            return Err(BelError::Cycle { id, chain });
        }

        let Some(record) = self.store.get(id)? else {
            warn!(db_id = %id, "record not found, skipping component");
            return Ok(None);
        };

        ctx.chain.push(id);
        let built = self.dispatch(&record, ctx);
        ctx.chain.pop();

        let term = built?;
        if let Some(term) = &term {
            self.cache.insert(id, term.clone());
        }
        Ok(term)
    }

    fn dispatch(
        &self,
        record: &Record,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<Term>, BelError> {
        let class = RecordClass::from_class_name(&record.class_name);
        debug!(db_id = %record.db_id, class = ?class, "resolving");

        match class {
            RecordClass::Protein | RecordClass::GenesAndTranscripts => {
                self.sequence_entity(record, Keyword::Protein).map(Some)
            }
            RecordClass::ChemicalCompound => {
                self.sequence_entity(record, Keyword::Abundance).map(Some)
            }
            RecordClass::DnaSequence => self.sequence_entity(record, Keyword::Gene).map(Some),
            RecordClass::RnaSequence => self.sequence_entity(record, Keyword::Rna).map(Some),
            RecordClass::Polymer => self.polymer(record).map(Some),
            RecordClass::OtherEntity => self.other_entity(record),
            RecordClass::Complex => self.complex(record, ctx).map(Some),
            RecordClass::Set => self.set(record, ctx).map(Some),
            RecordClass::Requirement => self.requirement(record, ctx),
            RecordClass::CatalystActivity => self.catalyst(record, ctx),
            RecordClass::Unknown(name) => {
                info!(db_id = %record.db_id, class = %name, display_name = %record.display_name, "unmatched class name");
                Ok(None)
            }
            regulation => {
                let relation = match regulation.regulation_relation() {
                    Some(Relation::Regulates) | None => {
                        info!(db_id = %record.db_id, class = %record.class_name, "unknown regulation relationship");
                        Relation::Regulates
                    }
                    Some(relation) => relation,
                };
                self.regulator(record, relation, ctx)
            }
        }
    }

    // =========================================================================
    // PHYSICAL ENTITIES
    // =========================================================================

    /// Proteins, genes, RNA and compounds: one entity from `referenceEntity`.
    fn sequence_entity(&self, record: &Record, keyword: Keyword) -> Result<Term, BelError> {
        let location = self.location(record)?;
        let modifiers = self.modifiers(record)?;
        let reference = self.store.follow_first(record, "referenceEntity")?;

        let entity = match reference.as_ref().and_then(|r| self.reference_entity(record, r)) {
            Some((namespace, id, label)) => Entity {
                namespace,
                id,
                label,
                source: record.source_ids(),
                location,
            },
            None => {
                info!(db_id = %record.db_id, class = %record.class_name, "no usable referenceEntity, naming by label");
                let label = record
                    .first_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| record.st_id_version.clone());
                Entity {
                    namespace: PLACEHOLDER_NAMESPACE.to_string(),
                    id: label.clone(),
                    label,
                    source: record.source_ids(),
                    location,
                }
            }
        };

        Ok(Term::Function(Function::of_entity(keyword, entity, modifiers)))
    }

    /// (namespace, identifier, label) from a reference record.
    fn reference_entity(
        &self,
        record: &Record,
        reference: &Record,
    ) -> Option<(String, String, String)> {
        let id = reference.first_text("identifier")?;
        let database = reference.first_str("databaseName").unwrap_or_default();
        let namespace = match reference_namespace(database) {
            Some(namespace) => namespace,
            None => {
                info!(db_id = %record.db_id, database, "unmapped reference database");
                PLACEHOLDER_NAMESPACE
            }
        };
        let label = reference
            .first_name()
            .or_else(|| reference.first_str("geneName"))
            .or_else(|| record.first_name())
            .unwrap_or_default();
        Some((namespace.to_string(), id, label.to_string()))
    }

    fn polymer(&self, record: &Record) -> Result<Term, BelError> {
        let label = record
            .first_str("label")
            .or_else(|| record.first_name())
            .unwrap_or_default();
        let entity = Entity {
            namespace: REACTOME_NAMESPACE.to_string(),
            id: record.st_id.clone(),
            label: label.to_string(),
            source: record.source_ids(),
            location: self.location(record)?,
        };
        Ok(Term::Function(Function::of_entity(
            Keyword::Polymer,
            entity,
            Vec::new(),
        )))
    }

    fn other_entity(&self, record: &Record) -> Result<Option<Term>, BelError> {
        if record.first_name() != Some(PHOTON_NAME) {
            warn!(db_id = %record.db_id, name = ?record.first_name(), "OtherEntity has no BEL mapping");
            return Ok(None);
        }
        let entity = Entity {
            namespace: "CHEBI".to_string(),
            id: PHOTON_CHEBI_ID.to_string(),
            label: PHOTON_LABEL.to_string(),
            source: record.source_ids(),
            location: self.location(record)?,
        };
        Ok(Some(Term::Function(Function::of_entity(
            Keyword::Abundance,
            entity,
            Vec::new(),
        ))))
    }

    /// First compartment as a location.
    fn location(&self, record: &Record) -> Result<Option<Location>, BelError> {
        let Some(compartment) = self.store.follow_first(record, "compartment")? else {
            return Ok(None);
        };
        let Some(accession) = compartment.first_text("accession") else {
            debug!(db_id = %record.db_id, "compartment without accession");
            return Ok(None);
        };
        let namespace = match compartment.first_str("databaseName") {
            Some(LOCATION_NAMESPACE) => LOCATION_NAMESPACE,
            other => {
                info!(db_id = %record.db_id, database = ?other, "unmapped location database");
                PLACEHOLDER_NAMESPACE
            }
        };
        Ok(Some(Location::new(
            namespace,
            accession,
            compartment.display_name.clone(),
        )))
    }

    fn modifiers(&self, record: &Record) -> Result<Vec<Modifier>, BelError> {
        let mut modifiers = Vec::new();
        for value in record.values("hasModifiedResidue") {
            let Some(residue) = self.store.follow(value)? else {
                warn!(db_id = %record.db_id, "modified residue record not found");
                continue;
            };
            let psi_mod = self.store.follow_first(&residue, "psiMod")?;
            modifiers.push(resolve_modifier(&residue, psi_mod.as_ref()));
        }
        Ok(modifiers)
    }

    // =========================================================================
    // COMPOSITES
    // =========================================================================

    fn children(
        &self,
        record: &Record,
        keys: &[&str],
        ctx: &mut ResolutionContext,
    ) -> Result<Vec<Term>, BelError> {
        let mut children = Vec::new();
        for key in keys {
            for id in record.refs(key) {
                if let Some(child) = self.resolve(id, ctx)? {
                    children.push(child);
                }
            }
        }
        Ok(children)
    }

    fn complex(&self, record: &Record, ctx: &mut ResolutionContext) -> Result<Term, BelError> {
        let components = self.children(record, &["hasComponent"], ctx)?;
        let label = record.first_name().unwrap_or_default();
        Ok(Term::Complex(Complex::new(
            components,
            label,
            record.source_ids(),
        )))
    }

    fn set(&self, record: &Record, ctx: &mut ResolutionContext) -> Result<Term, BelError> {
        let members = self.children(record, &["hasMember", "hasCandidate"], ctx)?;
        let kind = SetKind::from_schema_class(&record.schema_class);
        let label = record.first_name().unwrap_or_default();
        let set = EntitySet::new(kind, members, label, record.source_ids());
        if *set.kind() == SetKind::Candidate {
            ctx.memberships.extend(candidate_memberships(&set));
        }
        Ok(Term::Set(set))
    }

    // =========================================================================
    // CATALYSTS & REGULATORS
    // =========================================================================

    fn requirement(
        &self,
        record: &Record,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<Term>, BelError> {
        let Some(inner_id) = record.first_ref("regulator") else {
            error!(db_id = %record.db_id, "requirement without regulator");
            return Ok(None);
        };
        let Some(inner) = self.store.get(inner_id)? else {
            warn!(db_id = %record.db_id, regulator = %inner_id, "requirement regulator not found");
            return Ok(None);
        };

        match RecordClass::from_class_name(&inner.class_name) {
            RecordClass::Complex
            | RecordClass::ChemicalCompound
            | RecordClass::Protein
            | RecordClass::Set => {}
            other => {
                error!(db_id = %record.db_id, class = ?other, "unknown class for requirement regulator");
                return Ok(None);
            }
        }

        Ok(self.resolve(inner_id, ctx)?.map(|node| {
            Term::Regulator(Regulator::new(
                node,
                Relation::Increases,
                inner.source_ids(),
            ))
        }))
    }

    fn catalyst(
        &self,
        record: &Record,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<Term>, BelError> {
        let Some(entity_id) = record.first_ref("physicalEntity") else {
            error!(db_id = %record.db_id, "catalyst activity without physicalEntity");
            return Ok(None);
        };
        Ok(self.resolve(entity_id, ctx)?.map(|node| {
            Term::Catalyst(Catalyst::new(node.into_activity(), record.source_ids()))
        }))
    }

    fn regulator(
        &self,
        record: &Record,
        relation: Relation,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<Term>, BelError> {
        let Some(regulator_id) = record.first_ref("regulator") else {
            error!(db_id = %record.db_id, "regulation without regulator");
            return Ok(None);
        };
        Ok(self.resolve(regulator_id, ctx)?.map(|node| {
            Term::Regulator(Regulator::new(
                node.into_activity(),
                relation,
                record.source_ids(),
            ))
        }))
    }
}

// =============================================================================
// TESTS
// =============================================================================
