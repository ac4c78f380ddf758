//! Case document wire models and translation helpers.
//!
//! Responsibilities:
//! - Define a strict wire model for serialisation/deserialisation of a whole case
//! - Translate wire structs into `CaseState` through the model's validated constructors
//! - Translate `CaseState` back into the canonical wire form
//!
//! Notes:
//! - A document is the unit of storage; it is accepted or rejected as a whole
//! - Missing item keys are only filled in by the explicit [`CaseDocument::parse_migrating`] path

use crate::{DocumentFormat, WireError, WireResult};
use chrono::{DateTime, SecondsFormat, Utc};
use oplist_core::{
    Artifact, CaseState, EvidenceRef, ItemKey, ItemMap, ItemState, ItemStatus, ModelError,
};
use oplist_uuid::{ArtifactId, CaseId, ChunkId, EvidenceId};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::{info, warn};

// ============================================================================
// Public CaseDocument operations
// ============================================================================

/// Case document operations.
///
/// This is a zero-sized type used for namespacing document operations.
/// All methods are associated functions.
pub struct CaseDocument;

/// Outcome of [`CaseDocument::parse_migrating`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Migrated {
    pub case: CaseState,
    /// Item keys that were absent from the document and added with a default state.
    pub added_items: Vec<ItemKey>,
}

impl Migrated {
    /// Whether the document needs rewriting to become canonical.
    pub fn changed(&self) -> bool {
        !self.added_items.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyPolicy {
    Strict,
    FillMissing,
}

impl CaseDocument {
    /// Parse a case from document text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path" (e.g.
    /// `items.allergies.evidence_refs[0].page`) to the failing field.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Schema`] if the text is malformed, has unknown fields, or lacks a
    /// required field. Returns [`WireError::Model`] if any identifier is not canonical, any
    /// timestamp lacks an offset, any token is outside its closed set, any evidence span is
    /// invalid, or the item key set is not exactly complete.
    pub fn parse(text: &str, format: DocumentFormat) -> WireResult<CaseState> {
        let (case, _) = Self::load(text, format, KeyPolicy::Strict)?;
        Ok(case)
    }

    /// Parse a case, adding any missing item key with a fresh default state.
    ///
    /// Everything else is as strict as [`CaseDocument::parse`]: unknown keys and invalid
    /// evidence are still rejected.
    ///
    /// # Errors
    ///
    /// Same as [`CaseDocument::parse`], except that missing item keys are not an error.
    pub fn parse_migrating(text: &str, format: DocumentFormat) -> WireResult<Migrated> {
        let (case, added_items) = Self::load(text, format, KeyPolicy::FillMissing)?;
        for key in &added_items {
            info!(case_id = %case.case_id(), item = %key, "item added by migration");
        }
        Ok(Migrated { case, added_items })
    }

    /// Render a case as document text in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Json`] or [`WireError::Yaml`] if serialisation fails.
    pub fn render(case: &CaseState, format: DocumentFormat) -> WireResult<String> {
        let wire = domain_to_wire(case)?;
        match format {
            DocumentFormat::Json => Ok(serde_json::to_string_pretty(&wire)?),
            DocumentFormat::Yaml => Ok(serde_yaml::to_string(&wire)?),
        }
    }

    fn load(
        text: &str,
        format: DocumentFormat,
        policy: KeyPolicy,
    ) -> WireResult<(CaseState, Vec<ItemKey>)> {
        let result = deserialize_wire(text, format).and_then(|wire| wire_to_domain(wire, policy));
        if let Err(err) = &result {
            warn!(format = %format, error = %err, "case document rejected");
        }
        result
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of a whole case.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct CaseWire {
    case_id: String,
    #[serde(default)]
    artifacts: Vec<ArtifactWire>,
    items: ItemEntries,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ArtifactWire {
    artifact_id: String,
    filename: String,
    mime_type: String,
    #[serde(default = "default_included")]
    included: bool,
    created_at: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ItemStateWire {
    #[serde(default = "default_status")]
    status: String,
    #[serde(default)]
    evidence_refs: Vec<EvidenceRefWire>,
}

/// Numbers are signed so negative values reach the model and fail as range errors.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct EvidenceRefWire {
    artifact_id: String,
    evidence_id: String,
    page: i64,
    chunk_id: String,
    start_offset: i64,
    end_offset: i64,
}

/// The `items` mapping, kept as ordered entries so repeated keys are seen rather than
/// silently overwritten by the map deserializer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ItemEntries(Vec<(String, ItemStateWire)>);

impl Serialize for ItemEntries {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter().map(|(key, state)| (key, state)))
    }
}

impl<'de> Deserialize<'de> for ItemEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = ItemEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping from item key to item state")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, state)) = access.next_entry::<String, ItemStateWire>()? {
                    entries.push((key, state));
                }
                Ok(ItemEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn default_included() -> bool {
    true
}

fn default_status() -> String {
    ItemStatus::default().as_str().to_string()
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn deserialize_wire(text: &str, format: DocumentFormat) -> WireResult<CaseWire> {
    match format {
        DocumentFormat::Json => {
            let mut deserializer = serde_json::Deserializer::from_str(text);
            let wire = serde_path_to_error::deserialize(&mut deserializer).map_err(schema_error)?;
            deserializer.end().map_err(|err| WireError::Schema {
                path: "<root>".into(),
                message: err.to_string(),
            })?;
            Ok(wire)
        }
        DocumentFormat::Yaml => {
            let deserializer = serde_yaml::Deserializer::from_str(text);
            serde_path_to_error::deserialize(deserializer).map_err(schema_error)
        }
    }
}

fn schema_error<E: fmt::Display>(err: serde_path_to_error::Error<E>) -> WireError {
    let path = err.path().to_string();
    let path = if path.is_empty() {
        "<root>".to_string()
    } else {
        path
    };
    WireError::Schema {
        path,
        message: err.into_inner().to_string(),
    }
}

fn at(path: impl Into<String>, source: impl Into<ModelError>) -> WireError {
    WireError::Model {
        path: path.into(),
        source: source.into(),
    }
}

/// Convert the wire form to a case, re-running every model invariant.
fn wire_to_domain(wire: CaseWire, policy: KeyPolicy) -> WireResult<(CaseState, Vec<ItemKey>)> {
    let case_id = CaseId::parse(&wire.case_id).map_err(|e| at("case_id", e))?;

    let artifacts = wire
        .artifacts
        .into_iter()
        .enumerate()
        .map(|(index, artifact)| artifact_from_wire(&format!("artifacts[{index}]"), artifact))
        .collect::<WireResult<Vec<_>>>()?;

    let mut entries = Vec::with_capacity(wire.items.0.len());
    for (token, state) in wire.items.0 {
        let path = format!("items.{token}");
        token.parse::<ItemKey>().map_err(|e| at(path.as_str(), e))?;
        let state = item_state_from_wire(&path, state)?;
        entries.push((token, state));
    }

    let (items, added) = match policy {
        KeyPolicy::Strict => (
            ItemMap::try_from_tokens(entries).map_err(|e| at("items", e))?,
            Vec::new(),
        ),
        KeyPolicy::FillMissing => {
            ItemMap::migrate_from_tokens(entries).map_err(|e| at("items", e))?
        }
    };

    Ok((CaseState::with_parts(case_id, artifacts, items), added))
}

fn artifact_from_wire(path: &str, wire: ArtifactWire) -> WireResult<Artifact> {
    let artifact_id =
        ArtifactId::parse(&wire.artifact_id).map_err(|e| at(format!("{path}.artifact_id"), e))?;
    let created_at = parse_timestamp(&wire.created_at)
        .map_err(|e| at(format!("{path}.created_at"), e))?;

    Ok(Artifact::with_details(
        artifact_id,
        wire.filename,
        wire.mime_type,
        wire.included,
        created_at,
    ))
}

fn item_state_from_wire(path: &str, wire: ItemStateWire) -> WireResult<ItemState> {
    let status: ItemStatus = wire
        .status
        .parse()
        .map_err(|e: ModelError| at(format!("{path}.status"), e))?;

    let evidence_refs = wire
        .evidence_refs
        .into_iter()
        .enumerate()
        .map(|(index, evidence)| {
            evidence_from_wire(&format!("{path}.evidence_refs[{index}]"), evidence)
        })
        .collect::<WireResult<Vec<_>>>()?;

    Ok(ItemState::new(status, evidence_refs))
}

fn evidence_from_wire(path: &str, wire: EvidenceRefWire) -> WireResult<EvidenceRef> {
    let artifact_id =
        ArtifactId::parse(&wire.artifact_id).map_err(|e| at(format!("{path}.artifact_id"), e))?;
    let evidence_id =
        EvidenceId::parse(&wire.evidence_id).map_err(|e| at(format!("{path}.evidence_id"), e))?;
    let chunk_id =
        ChunkId::parse(&wire.chunk_id).map_err(|e| at(format!("{path}.chunk_id"), e))?;

    EvidenceRef::new(
        artifact_id,
        evidence_id,
        wire.page,
        chunk_id,
        wire.start_offset,
        wire.end_offset,
    )
    .map_err(|e| at(path, e))
}

/// Parse an RFC 3339 timestamp that carries an explicit offset, normalised to UTC.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ModelError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|e| {
            ModelError::TypeMismatch(format!(
                "expected RFC 3339 timestamp with explicit offset, got '{value}': {e}"
            ))
        })
}

fn render_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Convert a case to its canonical wire form.
fn domain_to_wire(case: &CaseState) -> WireResult<CaseWire> {
    let mut items = Vec::with_capacity(case.items().len());
    for (key, state) in case.items().iter() {
        let evidence_refs = state
            .evidence_refs()
            .iter()
            .enumerate()
            .map(|(index, evidence)| {
                evidence_to_wire(&format!("items.{key}.evidence_refs[{index}]"), evidence)
            })
            .collect::<WireResult<Vec<_>>>()?;
        items.push((
            key.as_str().to_string(),
            ItemStateWire {
                status: state.status().as_str().to_string(),
                evidence_refs,
            },
        ));
    }

    Ok(CaseWire {
        case_id: case.case_id().to_string(),
        artifacts: case
            .artifacts()
            .iter()
            .map(|artifact| ArtifactWire {
                artifact_id: artifact.artifact_id().to_string(),
                filename: artifact.filename().to_string(),
                mime_type: artifact.mime_type().to_string(),
                included: artifact.is_included(),
                created_at: render_timestamp(artifact.created_at()),
            })
            .collect(),
        items: ItemEntries(items),
    })
}

fn evidence_to_wire(path: &str, evidence: &EvidenceRef) -> WireResult<EvidenceRefWire> {
    Ok(EvidenceRefWire {
        artifact_id: evidence.artifact_id().to_string(),
        evidence_id: evidence.evidence_id().to_string(),
        page: i64::from(evidence.page()),
        chunk_id: evidence.chunk_id().to_string(),
        start_offset: offset_to_wire(&format!("{path}.start_offset"), evidence.start_offset())?,
        end_offset: offset_to_wire(&format!("{path}.end_offset"), evidence.end_offset())?,
    })
}

/// Offsets are written as signed integers; one that does not fit is refused, never truncated.
fn offset_to_wire(path: &str, offset: usize) -> WireResult<i64> {
    i64::try_from(offset).map_err(|_| {
        at(
            path,
            ModelError::Invariant(format!("offset {offset} exceeds {}", i64::MAX)),
        )
    })
}
