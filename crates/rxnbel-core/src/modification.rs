//! # Modification Rules
//!
//! Turns a modified-residue record into a [`Modifier`]. Rules apply in a
//! fixed priority order and the first match wins:
//!
//! 1. The N-acetyl-L-alanine record id maps to a fixed `pmod(Ac, Ala, 2)`.
//! 2. `FragmentDeletionModification` with start and end yields `var("p.<s>_<e>del")`.
//! 3. `ReplacedResidue` with a PSI-MOD tag: the display name is parsed for
//!    two residue names and a position, yielding `var("p.<from><pos><to>")`.
//! 4. PSI-MOD `00046`/`00047` map to `Ph` on `Ser`/`Thr`.
//! 5. Any other PSI-MOD tag yields `pmod(PSIMOD:<id>[!<name>], , <coordinate>)`.
//! 6. Anything else logs an error and yields `pmod(Missing)`.

use crate::primitives::{
    ACETYL_ALANINE_CODE, ACETYL_ALANINE_COORDINATE, ACETYL_ALANINE_LABEL,
    ACETYL_ALANINE_MOD_ID, ACETYL_ALANINE_RESIDUE, AMINO_ACIDS, MISSING_MODIFICATION,
    PHOSPHO_SHORTHAND, PSIMOD_NAMESPACE, amino_acid_code,
};
use crate::term::{Modifier, PMod, Variance};
use crate::types::{DbId, Record};
use regex_lite::Regex;
use std::sync::LazyLock;
use tracing::error;

/// `<residue> ... <position> ... <residue>`, residue names longest first.
static REPLACED_RESIDUE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let mut names: Vec<&str> = AMINO_ACIDS.iter().map(|(name, _)| *name).collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = names.join("|");
    let pattern = format!(
        r"(?i)({alt}).*?\s+(\d+)\s+.*?({alt})",
        alt = alternation
    );
    Regex::new(&pattern)
        .map_err(|e| error!(error = %e, "invalid replaced-residue pattern"))
        .ok()
});

/// Parse a replaced-residue display name into `<from><pos><to>`.
///
/// `"L-glutamic acid 17 replaced with L-lysine"` gives `E17K`.
pub fn parse_replaced_residue(display_name: &str) -> Option<String> {
    let regex = REPLACED_RESIDUE.as_ref()?;
    let caps = regex.captures(display_name)?;
    let from = amino_acid_code(caps.get(1)?.as_str())?;
    let position = caps.get(2)?.as_str();
    let to = amino_acid_code(caps.get(3)?.as_str())?;
    Some(format!("{}{}{}", from, position, to))
}

/// Apply the modification rules to one modified-residue record.
///
/// `psi_mod` is the record's first PSI-MOD tag, already dereferenced.
pub fn resolve_modifier(record: &Record, psi_mod: Option<&Record>) -> Modifier {
    let source = record.db_id;

    if source == DbId(ACETYL_ALANINE_MOD_ID) {
        return Modifier::PMod(PMod {
            code: ACETYL_ALANINE_CODE.to_string(),
            label: Some(ACETYL_ALANINE_LABEL.to_string()),
            residue: Some(ACETYL_ALANINE_RESIDUE.to_string()),
            coordinate: Some(ACETYL_ALANINE_COORDINATE),
            source,
        });
    }

    if record.class_name == "FragmentDeletionModification" {
        let start = record.int("startPositionInReferenceSequence");
        let end = record.int("endPositionInReferenceSequence");
        if let (Some(start), Some(end)) = (start, end) {
            return Modifier::Variance(Variance {
                description: format!("{}_{}del", start, end),
                source,
            });
        }
        return missing(record, "fragment deletion without start and end positions");
    }

    let Some(psi_mod) = psi_mod else {
        return missing(record, "no matching modification rule");
    };

    if record.class_name == "ReplacedResidue" {
        return match parse_replaced_residue(&record.display_name) {
            Some(description) => Modifier::Variance(Variance {
                description,
                source,
            }),
            None => missing(record, "unparseable replaced residue"),
        };
    }

    let Some(identifier) = psi_mod.first_text("identifier") else {
        return missing(record, "PSI-MOD tag without identifier");
    };
    let coordinate = record.int("coordinate");

    if let Some((_, code, residue)) = PHOSPHO_SHORTHAND
        .iter()
        .find(|(psi_id, _, _)| *psi_id == identifier)
    {
        return Modifier::PMod(PMod {
            code: (*code).to_string(),
            label: None,
            residue: Some((*residue).to_string()),
            coordinate,
            source,
        });
    }

    Modifier::PMod(PMod {
        code: format!("{}:{}", PSIMOD_NAMESPACE, identifier),
        label: psi_mod.first_name().map(str::to_string),
        residue: None,
        coordinate,
        source,
    })
}

fn missing(record: &Record, reason: &str) -> Modifier {
    error!(
        db_id = %record.db_id,
        class = %record.class_name,
        display_name = %record.display_name,
        reason,
        "unable to process protein modification"
    );
    Modifier::PMod(PMod {
        code: MISSING_MODIFICATION.to_string(),
        label: None,
        residue: None,
        coordinate: None,
        source: record.db_id,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).expect("record")
    }

    fn psi(identifier: &str, name: Option<&str>) -> Record {
        match name {
            Some(name) => record(json!({"identifier": identifier, "name": [name]})),
            None => record(json!({"identifier": identifier})),
        }
    }

    #[test]
    fn acetyl_alanine_override_wins() {
        let rec = record(json!({"dbId": 917934, "className": "ModifiedResidue"}));
        let modifier = resolve_modifier(&rec, Some(&psi("00058", Some("x"))));
        assert_eq!(modifier.render(), "pmod(Ac!N-acetyl-L-alanine, Ala, 2)");
    }

    #[test]
    fn fragment_deletion_is_a_variance() {
        let rec = record(json!({
            "dbId": 5,
            "className": "FragmentDeletionModification",
            "startPositionInReferenceSequence": 12,
            "endPositionInReferenceSequence": 40
        }));
        assert_eq!(resolve_modifier(&rec, None).render(), "var(\"p.12_40del\")");
    }

    #[test]
    fn fragment_deletion_without_range_is_missing() {
        let rec = record(json!({"dbId": 5, "className": "FragmentDeletionModification"}));
        assert_eq!(resolve_modifier(&rec, None).render(), "pmod(Missing)");
    }

    #[test]
    fn replaced_residue_uses_single_letter_codes() {
        let rec = record(json!({
            "dbId": 6,
            "className": "ReplacedResidue",
            "displayName": "L-glutamic acid 17 replaced with L-lysine"
        }));
        let modifier = resolve_modifier(&rec, Some(&psi("01636", None)));
        assert_eq!(modifier.render(), "var(\"p.E17K\")");
    }

    #[test]
    fn replaced_residue_prefers_longest_name() {
        assert_eq!(
            parse_replaced_residue("Isoleucine 100 replaced with Leucine").as_deref(),
            Some("I100L")
        );
        assert_eq!(parse_replaced_residue("no residues here"), None);
    }

    #[test]
    fn phospho_shorthand() {
        let rec = record(json!({"dbId": 7, "className": "ModifiedResidue", "coordinate": 473}));
        assert_eq!(
            resolve_modifier(&rec, Some(&psi("00046", Some("O-phospho-L-serine")))).render(),
            "pmod(Ph, Ser, 473)"
        );
        assert_eq!(
            resolve_modifier(&rec, Some(&psi("00047", None))).render(),
            "pmod(Ph, Thr, 473)"
        );
    }

    #[test]
    fn generic_psimod_keeps_name_and_coordinate() {
        let rec = record(json!({"dbId": 8, "className": "ModifiedResidue", "coordinate": 1253}));
        let modifier = resolve_modifier(&rec, Some(&psi("00048", Some("O4'-phospho-L-tyrosine"))));
        assert_eq!(
            modifier.render(),
            "pmod(PSIMOD:00048!O4'-phospho-L-tyrosine, , 1253)"
        );

        let no_coord = record(json!({"dbId": 9, "className": "ModifiedResidue"}));
        let modifier = resolve_modifier(&no_coord, Some(&psi("01148", Some("ubiquitinylated lysine"))));
        assert_eq!(modifier.render(), "pmod(PSIMOD:01148!\"ubiquitinylated lysine\")");
    }

    #[test]
    fn unmatched_record_is_missing() {
        let rec = record(json!({"dbId": 10, "className": "GroupModifiedResidue"}));
        assert_eq!(resolve_modifier(&rec, None).render(), "pmod(Missing)");
    }
}
