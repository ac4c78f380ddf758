//! Evidence references.
//!
//! # Invariants
//! - `page >= 1`
//! - `end_offset > start_offset` (non-empty, forward, end-exclusive span)
//! - Never mutated after construction. A changed reference is a new value that replaces the old
//!   one in its owning item's evidence list.
//!
//! Offsets are 0-based and relative to the text of the chunk identified by `chunk_id`.

use crate::validation::{validate_offset, validate_page, validate_span};
use crate::{ModelError, ModelResult};
use oplist_uuid::{ArtifactId, ChunkId, EvidenceId};
use std::ops::Range;

/// A pinpoint reference to a span of text inside an artifact chunk.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EvidenceRef {
    artifact_id: ArtifactId,
    evidence_id: EvidenceId,
    page: u32,
    chunk_id: ChunkId,
    start_offset: usize,
    end_offset: usize,
}

impl EvidenceRef {
    /// Builds a validated evidence reference.
    ///
    /// Numeric inputs are signed so out-of-domain values from an external boundary surface as
    /// range errors. Every rule is checked independently; `artifact_id` is not checked against
    /// any case (see `CaseState::check_consistency`).
    ///
    /// # Errors
    ///
    /// - `ModelError::Range` for `page < 1` or a negative offset.
    /// - `ModelError::Invariant` with the message `end_offset (<e>) must be > start_offset (<s>)`
    ///   when the span is empty or backwards.
    /// - `ModelError::Violations` when more than one rule fails, in the order page,
    ///   start_offset, end_offset, span.
    pub fn new(
        artifact_id: ArtifactId,
        evidence_id: EvidenceId,
        page: i64,
        chunk_id: ChunkId,
        start_offset: i64,
        end_offset: i64,
    ) -> ModelResult<Self> {
        let page_check = validate_page(page);
        let start_check = validate_offset("start_offset", start_offset);
        let end_check = validate_offset("end_offset", end_offset);
        let span_check = validate_span(start_offset, end_offset);

        match (page_check, start_check, end_check, span_check) {
            (Ok(page), Ok(start_offset), Ok(end_offset), Ok(())) => Ok(Self {
                artifact_id,
                evidence_id,
                page,
                chunk_id,
                start_offset,
                end_offset,
            }),
            (page, start, end, span) => Err(ModelError::collect([
                page.err(),
                start.err(),
                end.err(),
                span.err(),
            ])),
        }
    }

    pub fn artifact_id(&self) -> ArtifactId {
        self.artifact_id
    }

    pub fn evidence_id(&self) -> EvidenceId {
        self.evidence_id
    }

    /// 1-based page number in the source document.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn chunk_id(&self) -> ChunkId {
        self.chunk_id
    }

    /// Inclusive start offset into the chunk text.
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Exclusive end offset into the chunk text.
    pub fn end_offset(&self) -> usize {
        self.end_offset
    }

    /// The referenced span as a range, suitable for slicing the chunk text.
    pub fn span(&self) -> Range<usize> {
        self.start_offset..self.end_offset
    }

    /// Number of characters covered. Always at least 1.
    pub fn span_len(&self) -> usize {
        self.end_offset - self.start_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(page: i64, start: i64, end: i64) -> ModelResult<EvidenceRef> {
        EvidenceRef::new(
            ArtifactId::new(),
            EvidenceId::new(),
            page,
            ChunkId::new(),
            start,
            end,
        )
    }

    #[test]
    fn valid_span_preserves_fields() {
        let artifact_id = ArtifactId::new();
        let evidence_id = EvidenceId::new();
        let chunk_id = ChunkId::new();

        let evidence = EvidenceRef::new(artifact_id, evidence_id, 1, chunk_id, 10, 20)
            .expect("valid evidence should construct");

        assert_eq!(evidence.artifact_id(), artifact_id);
        assert_eq!(evidence.evidence_id(), evidence_id);
        assert_eq!(evidence.chunk_id(), chunk_id);
        assert_eq!(evidence.page(), 1);
        assert_eq!(evidence.start_offset(), 10);
        assert_eq!(evidence.end_offset(), 20);
        assert_eq!(evidence.span(), 10..20);
        assert_eq!(evidence.span_len(), 10);
    }

    #[test]
    fn backwards_span_is_rejected_with_documented_message() {
        let err = build(1, 30, 20).expect_err("end before start should fail");
        assert!(matches!(err, ModelError::Invariant(_)));
        assert!(err
            .to_string()
            .contains("end_offset (20) must be > start_offset (30)"));
    }

    #[test]
    fn every_forward_span_is_accepted() {
        for start in 0..16 {
            for end in (start + 1)..20 {
                for page in [1, 2, 999] {
                    let evidence = build(page, start, end).expect("forward span should construct");
                    assert_eq!(evidence.start_offset() as i64, start);
                    assert_eq!(evidence.end_offset() as i64, end);
                    assert_eq!(i64::from(evidence.page()), page);
                }
            }
        }
    }

    #[test]
    fn every_empty_or_backwards_span_reports_exact_message() {
        for start in 0..16 {
            for end in 0..=start {
                let err = build(1, start, end).expect_err("non-forward span should fail");
                assert_eq!(
                    err,
                    ModelError::Invariant(format!(
                        "end_offset ({end}) must be > start_offset ({start})"
                    ))
                );
            }
        }
    }

    #[test]
    fn page_zero_is_a_range_error() {
        let err = build(0, 0, 5).expect_err("page 0 should fail");
        assert_eq!(
            err,
            ModelError::Range {
                field: "page",
                value: 0,
                expected: ">= 1",
            }
        );
    }

    #[test]
    fn negative_start_is_a_range_error() {
        let err = build(1, -1, 5).expect_err("negative start should fail");
        assert!(matches!(
            err,
            ModelError::Range {
                field: "start_offset",
                value: -1,
                ..
            }
        ));
    }

    #[test]
    fn all_failures_are_reported_together() {
        let err = build(0, -2, -5).expect_err("everything is wrong");
        let violations = err.violations();

        assert_eq!(violations.len(), 4);
        assert!(matches!(violations[0], ModelError::Range { field: "page", .. }));
        assert!(matches!(
            violations[1],
            ModelError::Range {
                field: "start_offset",
                ..
            }
        ));
        assert!(matches!(
            violations[2],
            ModelError::Range {
                field: "end_offset",
                ..
            }
        ));
        assert_eq!(
            violations[3].to_string(),
            "end_offset (-5) must be > start_offset (-2)"
        );
    }

    #[test]
    fn span_check_still_runs_when_page_is_invalid() {
        let err = build(0, 30, 20).expect_err("bad page and bad span");
        let messages: Vec<String> = err.violations().iter().map(ToString::to_string).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].contains("end_offset (20) must be > start_offset (30)"));
    }
}
