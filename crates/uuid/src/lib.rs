//! Typed identifiers for case records.
//!
//! Every entity in a case document is addressed by a UUID: the case itself, each uploaded
//! artifact, each evidence reference, and each externally indexed text chunk. Mixing these up
//! (for example passing a chunk id where an artifact id is expected) is a silent corruption, so
//! each one gets its own newtype.
//!
//! ## Canonical UUID form
//! - Length: 36
//! - Layout: `8-4-4-4-12` groups separated by `-`
//! - Characters: `0-9` and `a-f` only (lowercase)
//! - Example: `550e8400-e29b-41d4-a716-446655440000`
//!
//! Notes:
//! - This is the same value you would get from `Uuid::new_v4().hyphenated().to_string()`.
//! - Canonical form is *required* for externally supplied identifiers (documents loaded from
//!   disk, CLI arguments). Use `parse` on the relevant id type to validate an input string.
//! - Non-canonical values (uppercase, simple, braced, urn, wrong length) are rejected rather
//!   than normalised, so a stored document only ever has one spelling per identifier.

mod service;

// Re-export public types
pub use service::{is_canonical, ArtifactId, CaseId, ChunkId, EvidenceId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
