//! Case document wire/boundary support.
//!
//! This crate defines the canonical external representation of a case (the payload persistence
//! and API layers store and send) and translates between it and `oplist-core` records.
//!
//! This crate focuses on:
//! - strict wire structs (`deny_unknown_fields` everywhere)
//! - JSON and YAML serialisation/deserialisation
//! - re-running every model invariant on load, so a hand-edited document cannot slip through
//!
//! Canonical forms:
//! - enumerations as their lowercase tokens (`allergies`, `pending`, ...)
//! - identifiers as lowercase hyphenated UUIDs
//! - timestamps as RFC 3339 with an explicit `+00:00` offset
//! - `items` as a mapping keyed by item token, containing exactly the closed key set

pub mod case_document;
pub mod format;

pub use case_document::{CaseDocument, Migrated};
pub use format::DocumentFormat;

use oplist_core::ModelError;

/// Errors returned by the `oplist-wire` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The document does not match the wire schema (syntax, types, unknown or missing fields).
    #[error("case document schema mismatch at {path}: {message}")]
    Schema { path: String, message: String },

    /// The document is well-formed but violates a model rule.
    #[error("invalid case document at {path}: {source}")]
    Model {
        path: String,
        #[source]
        source: ModelError,
    },

    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
}

/// Type alias for Results that can fail with a [`WireError`].
pub type WireResult<T> = Result<T, WireError>;
