//! # Translation Primitives
//!
//! Hardcoded constants and lookup tables for the rxnbel engine.
//!
//! These tables are compiled into the binary and are immutable at runtime.
//!
//! ## Primitives
//!
//! 1. **Namespace Tables**: Map source reference and disease databases to BEL namespaces.
//! 2. **Amino-Acid Table**: Maps residue names to single-letter codes.
//! 3. **Modification Overrides**: Fixed ontology ids with canonical shorthand.
//! 4. **Source Metadata**: Provenance strings stamped on every nanopub.

// =============================================================================
// NAMESPACES
// =============================================================================

/// Placeholder namespace for references with no known mapping.
pub const PLACEHOLDER_NAMESPACE: &str = "TBD";

/// Namespace used for terms named by their Reactome stable id.
pub const REACTOME_NAMESPACE: &str = "REACTOME";

/// Namespace for cellular locations.
pub const LOCATION_NAMESPACE: &str = "GO";

/// Source reference database name -> BEL namespace.
pub const REFERENCE_NAMESPACES: &[(&str, &str)] =
    &[("UniProt", "SP"), ("ChEBI", "CHEBI"), ("IUPHAR", "IUPHAR")];

/// Map a reference database name onto its BEL namespace.
///
/// Returns `None` for unmapped databases; callers fall back to
/// [`PLACEHOLDER_NAMESPACE`].
pub fn reference_namespace(database_name: &str) -> Option<&'static str> {
    REFERENCE_NAMESPACES
        .iter()
        .find(|(source, _)| *source == database_name)
        .map(|(_, namespace)| *namespace)
}

/// Disease database name -> annotation namespace. Unlisted names pass through.
pub const DISEASE_NAMESPACES: &[(&str, &str)] = &[("DOID", "DO")];

pub fn disease_namespace(database_name: &str) -> &str {
    DISEASE_NAMESPACES
        .iter()
        .find(|(source, _)| *source == database_name)
        .map_or(database_name, |(_, namespace)| *namespace)
}

// =============================================================================
// AMINO ACIDS
// =============================================================================

/// Residue name -> single-letter code. `unknown` maps to `?`.
pub const AMINO_ACIDS: &[(&str, &str)] = &[
    ("alanine", "A"),
    ("arginine", "R"),
    ("asparagine", "N"),
    ("aspartic acid", "D"),
    ("cysteine", "C"),
    ("glutamic acid", "E"),
    ("glutamine", "Q"),
    ("glycine", "G"),
    ("histidine", "H"),
    ("isoleucine", "I"),
    ("leucine", "L"),
    ("lysine", "K"),
    ("methionine", "M"),
    ("phenylalanine", "F"),
    ("proline", "P"),
    ("serine", "S"),
    ("threonine", "T"),
    ("tryptophan", "W"),
    ("tyrosine", "Y"),
    ("valine", "V"),
    ("unknown", "?"),
];

/// Look up the single-letter code for a residue name (case-insensitive).
pub fn amino_acid_code(name: &str) -> Option<&'static str> {
    let lowered = name.to_lowercase();
    AMINO_ACIDS
        .iter()
        .find(|(full, _)| *full == lowered)
        .map(|(_, code)| *code)
}

// =============================================================================
// MODIFICATION OVERRIDES
// =============================================================================

/// Record id of the N-acetyl-L-alanine modified residue.
pub const ACETYL_ALANINE_MOD_ID: u64 = 917_934;

/// Canonical rendering parts for [`ACETYL_ALANINE_MOD_ID`].
pub const ACETYL_ALANINE_CODE: &str = "Ac";
pub const ACETYL_ALANINE_LABEL: &str = "N-acetyl-L-alanine";
pub const ACETYL_ALANINE_RESIDUE: &str = "Ala";
pub const ACETYL_ALANINE_COORDINATE: i64 = 2;

/// PSI-MOD id -> (modification code, residue) for phosphorylation shorthand.
pub const PHOSPHO_SHORTHAND: &[(&str, &str, &str)] =
    &[("00046", "Ph", "Ser"), ("00047", "Ph", "Thr")];

/// Namespace used for generic PSI-MOD modifications.
pub const PSIMOD_NAMESPACE: &str = "PSIMOD";

/// Code used when a modification record matches no rule.
pub const MISSING_MODIFICATION: &str = "Missing";

// =============================================================================
// SPECIAL ENTITIES
// =============================================================================

/// `OtherEntity` name that maps onto a ChEBI abundance.
pub const PHOTON_NAME: &str = "Photon";
pub const PHOTON_CHEBI_ID: &str = "30212";
pub const PHOTON_LABEL: &str = "photon";

// =============================================================================
// SOURCE METADATA
// =============================================================================

pub const SOURCE_NAME: &str = "Reactome";
pub const SOURCE_LICENSE: &str = "CC0";
pub const SOURCE_LICENSE_URL: &str = "https://creativecommons.org/publicdomain/zero/1.0";
pub const SOURCE_DETAIL_URL: &str = "https://reactome.org/content/detail/";
pub const NANOPUB_COLLECTION: &str = "Reactome";

/// Target notation name and version stamped on each nanopub.
pub const BEL_NAME: &str = "BEL";
pub const BEL_VERSION: &str = "2.1.2";

/// Schema classes that mark a record as a reaction-like event.
pub const REACTION_SCHEMA_CLASSES: &[&str] = &[
    "Reaction",
    "BlackBoxEvent",
    "Polymerisation",
    "Depolymerisation",
    "FailedReaction",
];

/// Schema class of reactions that are skipped during conversion.
pub const FAILED_REACTION: &str = "FailedReaction";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_namespaces_map() {
        assert_eq!(reference_namespace("UniProt"), Some("SP"));
        assert_eq!(reference_namespace("ChEBI"), Some("CHEBI"));
        assert_eq!(reference_namespace("IUPHAR"), Some("IUPHAR"));
        assert_eq!(reference_namespace("ENSEMBL"), None);
    }

    #[test]
    fn disease_ontology_uses_short_namespace() {
        assert_eq!(disease_namespace("DOID"), "DO");
        assert_eq!(disease_namespace("MONDO"), "MONDO");
    }

    #[test]
    fn amino_acid_lookup_ignores_case() {
        assert_eq!(amino_acid_code("Glutamic Acid"), Some("E"));
        assert_eq!(amino_acid_code("lysine"), Some("K"));
        assert_eq!(amino_acid_code("unknown"), Some("?"));
        assert_eq!(amino_acid_code("ornithine"), None);
    }
}
