//! Uploaded source documents.
//!
//! # Invariants
//! - `artifact_id` and `created_at` never change after construction.
//! - `created_at` is always a UTC instant; `DateTime<Utc>` makes naive timestamps
//!   unrepresentable.
//! - `included` is the only mutable field and is changed only through [`Artifact::set_included`].

use chrono::{DateTime, Utc};
use oplist_uuid::ArtifactId;

/// An uploaded document belonging to exactly one case.
///
/// `filename` and `mime_type` are opaque strings from the ingestion collaborator and are not
/// validated here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    artifact_id: ArtifactId,
    filename: String,
    mime_type: String,
    included: bool,
    created_at: DateTime<Utc>,
}

impl Artifact {
    /// Creates an artifact at upload time.
    ///
    /// The artifact starts included and is stamped with the current UTC time.
    pub fn new(
        artifact_id: ArtifactId,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self::with_details(artifact_id, filename, mime_type, true, Utc::now())
    }

    /// Creates an artifact with every field supplied by the caller.
    ///
    /// Used by restore paths where the artifact already exists externally.
    pub fn with_details(
        artifact_id: ArtifactId,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        included: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            artifact_id,
            filename: filename.into(),
            mime_type: mime_type.into(),
            included,
            created_at,
        }
    }

    pub fn artifact_id(&self) -> ArtifactId {
        self.artifact_id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Whether this artifact's evidence currently participates in evaluation.
    ///
    /// Read this every time it matters; toggles are not broadcast.
    pub fn is_included(&self) -> bool {
        self.included
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Sets the global include/exclude toggle. Touches no other field.
    pub fn set_included(&mut self, included: bool) {
        self.included = included;
    }
}
