//! # Nanopub Assembler
//!
//! Wraps one reaction's assertions into an output record with provenance:
//! citation, species and disease annotations, evidence text and creator.
//!
//! Creator precedence: the first author of `authored`, else the name and date
//! parsed from the `created` instance edit's display name.

use crate::primitives::{
    BEL_NAME, BEL_VERSION, NANOPUB_COLLECTION, SOURCE_DETAIL_URL, SOURCE_LICENSE,
    SOURCE_LICENSE_URL, SOURCE_NAME, disease_namespace,
};
use crate::store::EntityStore;
use crate::types::{BelError, Record};
use chrono::{NaiveDateTime, SecondsFormat, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, error, warn};

// =============================================================================
// OUTPUT RECORD
// =============================================================================

/// Notation name and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NanopubType {
    pub name: String,
    pub version: String,
}

impl Default for NanopubType {
    fn default() -> Self {
        Self {
            name: BEL_NAME.to_string(),
            version: BEL_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
}

/// A context annotation such as species or disease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub source: String,
    pub source_url: String,
    pub license: String,
    pub license_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_orcid: Option<String>,
    #[serde(rename = "gd_createTS", default, skip_serializing_if = "Option::is_none")]
    pub gd_create_ts: Option<String>,
    #[serde(rename = "gd_updateTS")]
    pub gd_update_ts: String,
    pub collections: Vec<String>,
    pub version: String,
}

/// One reaction's output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nanopub {
    #[serde(rename = "type")]
    pub kind: NanopubType,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    pub citation: Citation,
    pub annotations: Vec<Annotation>,
    pub assertions: Vec<String>,
    pub metadata: Metadata,
}

/// `{"nanopub": ...}`, one per output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NanopubEnvelope {
    pub nanopub: Nanopub,
}

// =============================================================================
// CREATOR
// =============================================================================

/// Who curated a reaction, and when.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Creator {
    pub name: Option<String>,
    pub orcid: Option<String>,
    pub created: Option<String>,
}

static CREATED_WITH_TIME: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"^(.*?)\s+(\d{4}-\d{2}-\d{2})\s+(\d{2}:\d{2}:\d{2})"));

static CREATED_DATE_ONLY: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"^(.*?)\s+(\d{4}-\d{2}-\d{2})"));

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|e| error!(error = %e, pattern, "invalid creator pattern"))
        .ok()
}

/// `YYYY-MM-DD HH:MM:SS[...]` -> `YYYY-MM-DDTHH:MM:SS.000Z`.
///
/// Text that does not start with such a timestamp is returned unchanged.
pub fn ts_convert(timestamp: &str) -> String {
    timestamp
        .get(..19)
        .and_then(|head| NaiveDateTime::parse_from_str(head, "%Y-%m-%d %H:%M:%S").ok())
        .map(|ts| ts.format("%Y-%m-%dT%H:%M:%S.000Z").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Current time in the update-timestamp format.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse `"<name> YYYY-MM-DD[ HH:MM:SS]"`.
pub fn parse_created(display_name: &str) -> Option<Creator> {
    if let Some(caps) = CREATED_WITH_TIME
        .as_ref()
        .and_then(|re| re.captures(display_name))
    {
        let stamp = format!("{} {}", caps.get(2)?.as_str(), caps.get(3)?.as_str());
        return Some(Creator {
            name: Some(caps.get(1)?.as_str().to_string()),
            orcid: None,
            created: Some(ts_convert(&stamp)),
        });
    }

    let caps = CREATED_DATE_ONLY.as_ref()?.captures(display_name)?;
    let stamp = format!("{} 00:00:00", caps.get(2)?.as_str());
    Some(Creator {
        name: Some(caps.get(1)?.as_str().to_string()),
        orcid: None,
        created: Some(ts_convert(&stamp)),
    })
}

/// Creator of a reaction from `authored`, else `created`.
pub fn creator(store: &dyn EntityStore, reaction: &Record) -> Result<Creator, BelError> {
    if reaction.has_field("authored") {
        let Some(authored) = store.follow_first(reaction, "authored")? else {
            debug!(db_id = %reaction.db_id, "authored edit not found");
            return Ok(Creator::default());
        };
        let Some(author) = store.follow_first(&authored, "author")? else {
            return Ok(Creator::default());
        };
        return Ok(Creator {
            name: Some(author.display_name.clone()),
            orcid: author.first_text("orcidId"),
            created: authored.first_str("dateTime").map(ts_convert),
        });
    }

    let Some(created) = store.follow_first(reaction, "created")? else {
        return Ok(Creator::default());
    };
    Ok(parse_created(&created.display_name).unwrap_or_else(|| {
        debug!(db_id = %reaction.db_id, created = %created.display_name, "unparseable created edit");
        Creator::default()
    }))
}

// =============================================================================
// ANNOTATIONS
// =============================================================================

/// `TAX:<taxId>` for the reaction's first species.
pub fn species_annotation(
    store: &dyn EntityStore,
    reaction: &Record,
) -> Result<Option<Annotation>, BelError> {
    let Some(species) = store.follow_first(reaction, "species")? else {
        return Ok(None);
    };
    let Some(tax_id) = species.first_text("taxId") else {
        warn!(db_id = %reaction.db_id, species = %species.display_name, "species without taxId");
        return Ok(None);
    };
    Ok(Some(Annotation {
        kind: "Species".to_string(),
        id: format!("TAX:{}", tax_id),
        label: species.display_name,
    }))
}

/// `<namespace>:<identifier>` for every disease tag; `DOID` becomes `DO`.
pub fn disease_annotations(
    store: &dyn EntityStore,
    reaction: &Record,
) -> Result<Vec<Annotation>, BelError> {
    let mut annotations = Vec::new();
    for disease in store.follow_all(reaction, "disease")? {
        let (Some(database), Some(identifier)) =
            (disease.first_str("databaseName"), disease.first_text("identifier"))
        else {
            warn!(db_id = %reaction.db_id, disease = %disease.db_id, "disease without identifier");
            continue;
        };
        annotations.push(Annotation {
            kind: "Disease".to_string(),
            id: format!("{}:{}", disease_namespace(database), identifier),
            label: disease.display_name.clone(),
        });
    }
    Ok(annotations)
}

// =============================================================================
// ASSEMBLY
// =============================================================================

/// Build the output record for `reaction`.
pub fn assemble(
    store: &dyn EntityStore,
    reaction: &Record,
    assertions: Vec<String>,
    updated: &str,
) -> Result<Nanopub, BelError> {
    let source_url = format!("{}{}", SOURCE_DETAIL_URL, reaction.st_id_version);
    let creator = creator(store, reaction)?;

    let mut annotations = Vec::new();
    annotations.extend(species_annotation(store, reaction)?);
    annotations.extend(disease_annotations(store, reaction)?);

    let evidence = store
        .follow_first(reaction, "summation")?
        .and_then(|summation| summation.first_str("text").map(str::to_string));

    Ok(Nanopub {
        kind: NanopubType::default(),
        id: format!("{}_{}", SOURCE_NAME, reaction.st_id_version),
        evidence,
        citation: Citation {
            uri: source_url.clone(),
        },
        annotations,
        assertions,
        metadata: Metadata {
            source: SOURCE_NAME.to_string(),
            source_url,
            license: SOURCE_LICENSE.to_string(),
            license_url: SOURCE_LICENSE_URL.to_string(),
            creator: creator.name,
            creator_orcid: creator.orcid,
            gd_create_ts: creator.created,
            gd_update_ts: updated.to_string(),
            collections: vec![NANOPUB_COLLECTION.to_string()],
            version: format!("{}_{}", SOURCE_NAME, reaction.st_id_version),
        },
    })
}

// =============================================================================
// TESTS
// =============================================================================
