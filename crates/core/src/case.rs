//! The case aggregate.
//!
//! # Invariants
//! - `case_id` never changes.
//! - `items` always holds exactly one state per [`ItemKey`] (guaranteed by [`ItemMap`]).
//! - All mutation goes through `&mut CaseState` methods; accessors hand out shared borrows only.
//!
//! Artifact ids and evidence ids are not deduplicated here, and evidence may point at an
//! artifact the case does not hold. Both are reported by [`CaseState::check_consistency`].

use crate::consistency::{self, ConsistencyReport};
use crate::item::{default_items, ItemKey, ItemMap, ItemState};
use crate::{Artifact, EvidenceRef, ModelError, ModelResult};
use oplist_uuid::{ArtifactId, CaseId};
use std::collections::BTreeMap;
use tracing::debug;

/// Aggregate state for one case: its artifacts and its complete checklist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseState {
    case_id: CaseId,
    artifacts: Vec<Artifact>,
    items: ItemMap,
}

impl CaseState {
    /// Creates an empty case with a fresh default checklist.
    pub fn new(case_id: CaseId) -> Self {
        Self::with_parts(case_id, Vec::new(), default_items())
    }

    /// Assembles a case from already-validated parts.
    pub fn with_parts(case_id: CaseId, artifacts: Vec<Artifact>, items: ItemMap) -> Self {
        Self {
            case_id,
            artifacts,
            items,
        }
    }

    /// Assembles a case from a caller-supplied item map, re-checking completeness.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Invariant` if any key is missing.
    pub fn try_with_items(
        case_id: CaseId,
        artifacts: Vec<Artifact>,
        items: BTreeMap<ItemKey, ItemState>,
    ) -> ModelResult<Self> {
        Ok(Self::with_parts(case_id, artifacts, ItemMap::try_from_map(items)?))
    }

    pub fn case_id(&self) -> CaseId {
        self.case_id
    }

    /// Artifacts in upload order.
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn items(&self) -> &ItemMap {
        &self.items
    }

    pub fn item(&self, key: ItemKey) -> &ItemState {
        self.items.get(key)
    }

    /// First artifact with the given id.
    pub fn artifact(&self, artifact_id: ArtifactId) -> Option<&Artifact> {
        self.artifacts
            .iter()
            .find(|artifact| artifact.artifact_id() == artifact_id)
    }

    /// Appends an artifact. Duplicate ids are not rejected.
    pub fn add_artifact(&mut self, artifact: Artifact) {
        debug!(
            case_id = %self.case_id,
            artifact_id = %artifact.artifact_id(),
            "artifact added"
        );
        self.artifacts.push(artifact);
    }

    /// Removes and returns the first artifact with the given id.
    ///
    /// Evidence pointing at it is left in place.
    pub fn remove_artifact(&mut self, artifact_id: ArtifactId) -> Option<Artifact> {
        let position = self
            .artifacts
            .iter()
            .position(|artifact| artifact.artifact_id() == artifact_id)?;
        debug!(case_id = %self.case_id, artifact_id = %artifact_id, "artifact removed");
        Some(self.artifacts.remove(position))
    }

    /// Toggles the inclusion flag of an attached artifact.
    ///
    /// This is the only way to change an attached artifact; its id, name, type and creation time
    /// are fixed once added.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Invariant` if no artifact with that id is attached.
    pub fn set_artifact_included(
        &mut self,
        artifact_id: ArtifactId,
        included: bool,
    ) -> ModelResult<()> {
        let case_id = self.case_id;
        let artifact = self
            .artifacts
            .iter_mut()
            .find(|artifact| artifact.artifact_id() == artifact_id)
            .ok_or_else(|| {
                ModelError::Invariant(format!(
                    "artifact {artifact_id} is not attached to case {case_id}"
                ))
            })?;
        artifact.set_included(included);
        debug!(case_id = %case_id, artifact_id = %artifact_id, included, "artifact inclusion set");
        Ok(())
    }

    /// Replaces the state of one item as a unit and returns the previous state.
    pub fn set_item(&mut self, key: ItemKey, state: ItemState) -> ItemState {
        debug!(
            case_id = %self.case_id,
            item = %key,
            status = %state.status(),
            evidence_count = state.evidence_refs().len(),
            "item state replaced"
        );
        self.items.replace(key, state)
    }

    /// [`CaseState::set_item`] for a key arriving as an untyped token.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::TypeMismatch` if `token` is not a known item key. The case is left
    /// unchanged.
    pub fn set_item_by_token(&mut self, token: &str, state: ItemState) -> ModelResult<ItemState> {
        let key: ItemKey = token.parse()?;
        Ok(self.set_item(key, state))
    }

    /// Evidence for `key` whose artifact is attached and currently included, in list order.
    ///
    /// Inclusion is read on every call.
    pub fn active_evidence(&self, key: ItemKey) -> impl Iterator<Item = &EvidenceRef> + '_ {
        self.item(key).evidence_refs().iter().filter(move |evidence| {
            self.artifact(evidence.artifact_id())
                .is_some_and(Artifact::is_included)
        })
    }

    /// Keys whose status is still `pending`, in key order.
    pub fn pending_items(&self) -> Vec<ItemKey> {
        self.items
            .iter()
            .filter(|(_, state)| !state.status().is_evaluated())
            .map(|(key, _)| key)
            .collect()
    }

    /// Runs the whole-case cross-reference checks. Never mutates and never fails.
    pub fn check_consistency(&self) -> ConsistencyReport {
        consistency::check(self)
    }
}
