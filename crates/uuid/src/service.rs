//! Internal implementation of the typed identifiers.
//!
//! All four identifier types share one shape, so they are stamped out by `canonical_id!`. Each
//! type is a distinct newtype: a `ChunkId` cannot be passed where an `ArtifactId` is expected.

use crate::{UuidError, UuidResult};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Byte positions of the group separators in the canonical hyphenated form.
const HYPHEN_POSITIONS: [usize; 4] = [8, 13, 18, 23];

/// Returns true if `input` is in canonical UUID form.
///
/// This is a purely syntactic check that validates:
/// - Exactly 36 bytes long
/// - Hyphens at byte offsets 8, 13, 18 and 23
/// - Lowercase hex characters (`0-9` and `a-f`) everywhere else
pub fn is_canonical(input: &str) -> bool {
    input.len() == 36
        && input.bytes().enumerate().all(|(i, b)| {
            if HYPHEN_POSITIONS.contains(&i) {
                b == b'-'
            } else {
                matches!(b, b'0'..=b'9' | b'a'..=b'f')
            }
        })
}

fn parse_canonical(kind: &str, input: &str) -> UuidResult<Uuid> {
    if !is_canonical(input) {
        return Err(UuidError::InvalidInput(format!(
            "{kind} must be a lowercase hyphenated UUID (8-4-4-4-12), got: '{input}'"
        )));
    }
    Uuid::parse_str(input)
        .map_err(|e| UuidError::InvalidInput(format!("{kind} is not a valid UUID: {e}")))
}

macro_rules! canonical_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            /// Generates a fresh random (v4) identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Validates and parses an identifier that must already be in canonical form.
            ///
            /// # Errors
            ///
            /// Returns [`UuidError::InvalidInput`] if `input` is not canonical.
            pub fn parse(input: &str) -> UuidResult<Self> {
                parse_canonical($kind, input).map(Self)
            }

            /// Returns the underlying `uuid::Uuid`.
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = UuidError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

canonical_id!(
    /// Stable identifier of a case (the aggregate root).
    CaseId,
    "case_id"
);

canonical_id!(
    /// Stable identifier of an uploaded artifact.
    ArtifactId,
    "artifact_id"
);

canonical_id!(
    /// Identifier of one evidence reference, unique within a case.
    EvidenceId,
    "evidence_id"
);

canonical_id!(
    /// Identifier of an externally indexed text chunk.
    ///
    /// Chunks are owned by the ingestion collaborator; this crate only carries the reference.
    ChunkId,
    "chunk_id"
);

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn new_generates_canonical_id() {
        let id = CaseId::new();
        let text = id.to_string();

        assert_eq!(text.len(), 36);
        assert!(is_canonical(&text));
    }

    #[test]
    fn parse_accepts_canonical_form() {
        let id = ArtifactId::parse(CANONICAL).expect("canonical form should parse");
        assert_eq!(id.to_string(), CANONICAL);
    }

    #[test]
    fn parse_rejects_simple_form() {
        let err = ArtifactId::parse("550e8400e29b41d4a716446655440000")
            .expect_err("simple form should be rejected");
        match err {
            UuidError::InvalidInput(msg) => {
                assert!(msg.contains("artifact_id"));
                assert!(msg.contains("lowercase hyphenated"));
            }
        }
    }

    #[test]
    fn parse_rejects_uppercase() {
        assert!(EvidenceId::parse("550E8400-E29B-41D4-A716-446655440000").is_err());
        assert!(EvidenceId::parse("550e8400-E29B-41d4-a716-446655440000").is_err());
    }

    #[test]
    fn parse_rejects_braced_and_urn_forms() {
        assert!(ChunkId::parse("{550e8400-e29b-41d4-a716-446655440000}").is_err());
        assert!(ChunkId::parse("urn:uuid:550e8400-e29b-41d4-a716-446655440000").is_err());
    }

    #[test]
    fn is_canonical_checks_layout() {
        assert!(is_canonical(CANONICAL));
        assert!(!is_canonical(""));
        assert!(!is_canonical("550e8400-e29b-41d4-a716-44665544000"));
        assert!(!is_canonical("550e8400-e29b-41d4-a716-4466554400000"));
        assert!(!is_canonical("550e8400xe29b-41d4-a716-446655440000"));
        assert!(!is_canonical("550e8400-e29b-41d4-a716-44665544000g"));
        assert!(!is_canonical("550e8400--29b-41d4-a716-446655440000"));
    }

    #[test]
    fn from_str_matches_parse() {
        let id: CaseId = CANONICAL.parse().expect("from_str should accept canonical");
        assert_eq!(id, CaseId::parse(CANONICAL).expect("parse"));
        assert!("not-a-uuid".parse::<CaseId>().is_err());
    }

    #[test]
    fn round_trip_new_to_string_to_parse() {
        let original = ChunkId::new();
        let reparsed = ChunkId::parse(&original.to_string()).expect("reparse");
        assert_eq!(original, reparsed);
        assert_eq!(original.uuid(), reparsed.uuid());
    }

    #[test]
    fn from_uuid_wraps_without_changing_value() {
        let raw = Uuid::new_v4();
        assert_eq!(CaseId::from_uuid(raw).uuid(), raw);
        assert_eq!(CaseId::from(raw).uuid(), raw);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_canonical_text() {
        let id = EvidenceId::parse(CANONICAL).expect("parse");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{CANONICAL}\""));

        let back: EvidenceId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);

        let err = serde_json::from_str::<EvidenceId>("\"550E8400-E29B-41D4-A716-446655440000\"")
            .expect_err("uppercase should be rejected");
        assert!(err.to_string().contains("evidence_id"));
    }
}
