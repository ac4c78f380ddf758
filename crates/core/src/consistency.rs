//! Whole-case cross-reference checks.
//!
//! These are findings, not construction invariants: a case that fails them is still a valid
//! `CaseState`. Calling layers decide whether a finding blocks anything.

use crate::{CaseState, ItemKey};
use oplist_uuid::{ArtifactId, EvidenceId};
use std::collections::BTreeMap;
use std::fmt;

/// One cross-reference problem found in a case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsistencyIssue {
    /// Evidence points at an artifact the case does not hold.
    DanglingEvidence {
        item: ItemKey,
        evidence_id: EvidenceId,
        artifact_id: ArtifactId,
    },
    /// More than one artifact shares an id.
    DuplicateArtifactId {
        artifact_id: ArtifactId,
        count: usize,
    },
    /// More than one evidence reference in the case shares an id.
    DuplicateEvidenceId {
        evidence_id: EvidenceId,
        count: usize,
    },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyIssue::DanglingEvidence {
                item,
                evidence_id,
                artifact_id,
            } => write!(
                f,
                "item {item}: evidence {evidence_id} references unknown artifact {artifact_id}"
            ),
            ConsistencyIssue::DuplicateArtifactId { artifact_id, count } => {
                write!(f, "artifact id {artifact_id} appears {count} times")
            }
            ConsistencyIssue::DuplicateEvidenceId { evidence_id, count } => {
                write!(f, "evidence id {evidence_id} appears {count} times")
            }
        }
    }
}

/// Result of [`CaseState::check_consistency`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    issues: Vec<ConsistencyIssue>,
}

impl ConsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Findings ordered as: duplicate artifacts, dangling evidence, duplicate evidence.
    pub fn issues(&self) -> &[ConsistencyIssue] {
        &self.issues
    }
}

pub(crate) fn check(case: &CaseState) -> ConsistencyReport {
    let mut issues = Vec::new();

    let mut artifact_counts: BTreeMap<ArtifactId, usize> = BTreeMap::new();
    for artifact in case.artifacts() {
        *artifact_counts.entry(artifact.artifact_id()).or_default() += 1;
    }
    issues.extend(
        artifact_counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(artifact_id, count)| ConsistencyIssue::DuplicateArtifactId {
                artifact_id: *artifact_id,
                count: *count,
            }),
    );

    let mut evidence_counts: BTreeMap<EvidenceId, usize> = BTreeMap::new();
    for (item, state) in case.items().iter() {
        for evidence in state.evidence_refs() {
            *evidence_counts.entry(evidence.evidence_id()).or_default() += 1;
            if !artifact_counts.contains_key(&evidence.artifact_id()) {
                issues.push(ConsistencyIssue::DanglingEvidence {
                    item,
                    evidence_id: evidence.evidence_id(),
                    artifact_id: evidence.artifact_id(),
                });
            }
        }
    }
    issues.extend(
        evidence_counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(evidence_id, count)| ConsistencyIssue::DuplicateEvidenceId {
                evidence_id,
                count,
            }),
    );

    ConsistencyReport { issues }
}
