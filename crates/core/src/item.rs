//! Checklist items: the closed key registry, statuses, and per-item state.
//!
//! # Invariants
//! - [`ItemKey`] is closed. Adding a key is a compile-time change that every exhaustive `match`
//!   in the workspace will flag.
//! - An [`ItemMap`] holds exactly one [`ItemState`] per [`ItemKey`]. It is stored as a fixed-size
//!   array indexed by key, so a partial map cannot exist once constructed.
//! - [`default_items`] is the single definition of a brand-new case's checklist.

use crate::{EvidenceRef, ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

/// Canonical checklist item identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKey {
    Allergies,
    BloodLossRisk,
    NumberBunitsAvailable,
    AbxProphylaxisTiming,
}

impl ItemKey {
    /// Every key, in declaration order.
    pub const ALL: [ItemKey; 4] = [
        ItemKey::Allergies,
        ItemKey::BloodLossRisk,
        ItemKey::NumberBunitsAvailable,
        ItemKey::AbxProphylaxisTiming,
    ];

    /// Number of keys in the closed set.
    pub const COUNT: usize = Self::ALL.len();

    /// The external token for this key.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKey::Allergies => "allergies",
            ItemKey::BloodLossRisk => "blood_loss_risk",
            ItemKey::NumberBunitsAvailable => "number_bunits_available",
            ItemKey::AbxProphylaxisTiming => "abx_prophylaxis_timing",
        }
    }

    fn index(self) -> usize {
        match self {
            ItemKey::Allergies => 0,
            ItemKey::BloodLossRisk => 1,
            ItemKey::NumberBunitsAvailable => 2,
            ItemKey::AbxProphylaxisTiming => 3,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ModelError::TypeMismatch(format!("unknown item key '{s}'")))
    }
}

/// Evaluation status of one checklist item.
///
/// Not a state machine: any status may replace any other at any time.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Not yet evaluated.
    #[default]
    Pending,
    /// Supported by evidence or user confirmation.
    Confirmed,
    /// Evaluated, but evidence is insufficient or uncertain.
    Unknown,
    /// Evaluated, and the evidence disagrees.
    Conflict,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::Pending,
        ItemStatus::Confirmed,
        ItemStatus::Unknown,
        ItemStatus::Conflict,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Confirmed => "confirmed",
            ItemStatus::Unknown => "unknown",
            ItemStatus::Conflict => "conflict",
        }
    }

    /// Whether the pipeline has produced a result for the item.
    pub fn is_evaluated(self) -> bool {
        match self {
            ItemStatus::Pending => false,
            ItemStatus::Confirmed | ItemStatus::Unknown | ItemStatus::Conflict => true,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ModelError::TypeMismatch(format!("unknown item status '{s}'")))
    }
}

/// Current status and supporting evidence for one checklist item.
///
/// There is no in-place update. Callers replace the whole value through
/// `CaseState::set_item`, so status and evidence always change together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemState {
    status: ItemStatus,
    evidence_refs: Vec<EvidenceRef>,
}

impl ItemState {
    /// Builds a replacement value. Evidence order is relevance/recency order.
    ///
    /// Evidence is advisory: an empty list is valid for any status.
    pub fn new(status: ItemStatus, evidence_refs: Vec<EvidenceRef>) -> Self {
        Self {
            status,
            evidence_refs,
        }
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn evidence_refs(&self) -> &[EvidenceRef] {
        &self.evidence_refs
    }
}

/// A complete mapping from every [`ItemKey`] to its [`ItemState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemMap {
    states: [ItemState; ItemKey::COUNT],
}

/// Creates a fresh, fully populated item map for a new case.
pub fn default_items() -> ItemMap {
    ItemMap {
        states: ItemKey::ALL.map(|_| ItemState::default()),
    }
}

impl Default for ItemMap {
    fn default() -> Self {
        default_items()
    }
}

impl ItemMap {
    /// Builds a map from caller-supplied entries, re-checking completeness.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Invariant` naming every missing key.
    pub fn try_from_map(map: BTreeMap<ItemKey, ItemState>) -> ModelResult<Self> {
        let missing: Vec<&str> = ItemKey::ALL
            .into_iter()
            .filter(|key| !map.contains_key(key))
            .map(ItemKey::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::Invariant(format!(
                "items map is missing keys: {}",
                missing.join(", ")
            )));
        }
        Ok(Self::fill(map))
    }

    /// Builds a map from untyped key tokens, as received from an external boundary.
    ///
    /// # Errors
    ///
    /// - `ModelError::TypeMismatch` for a token outside the closed key set.
    /// - `ModelError::Invariant` for a repeated key or any missing key.
    pub fn try_from_tokens<I, S>(entries: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (S, ItemState)>,
        S: AsRef<str>,
    {
        Self::try_from_map(keyed_entries(entries)?)
    }

    /// Like [`ItemMap::try_from_tokens`], but fills missing keys with a fresh default state.
    ///
    /// This is the explicit migration path for documents written before a key existed. Unknown
    /// and repeated tokens are still rejected. Returns the keys that were added.
    pub fn migrate_from_tokens<I, S>(entries: I) -> ModelResult<(Self, Vec<ItemKey>)>
    where
        I: IntoIterator<Item = (S, ItemState)>,
        S: AsRef<str>,
    {
        let map = keyed_entries(entries)?;
        let added: Vec<ItemKey> = ItemKey::ALL
            .into_iter()
            .filter(|key| !map.contains_key(key))
            .collect();
        Ok((Self::fill(map), added))
    }

    pub fn get(&self, key: ItemKey) -> &ItemState {
        &self.states[key.index()]
    }

    /// Iterates entries in key declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemKey, &ItemState)> + '_ {
        ItemKey::ALL.into_iter().zip(self.states.iter())
    }

    /// Always [`ItemKey::COUNT`].
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false; present for API symmetry with map types.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub(crate) fn replace(&mut self, key: ItemKey, state: ItemState) -> ItemState {
        std::mem::replace(&mut self.states[key.index()], state)
    }

    fn fill(mut map: BTreeMap<ItemKey, ItemState>) -> Self {
        Self {
            states: ItemKey::ALL.map(|key| map.remove(&key).unwrap_or_default()),
        }
    }
}

impl Index<ItemKey> for ItemMap {
    type Output = ItemState;

    fn index(&self, key: ItemKey) -> &Self::Output {
        self.get(key)
    }
}

fn keyed_entries<I, S>(entries: I) -> ModelResult<BTreeMap<ItemKey, ItemState>>
where
    I: IntoIterator<Item = (S, ItemState)>,
    S: AsRef<str>,
{
    let mut map = BTreeMap::new();
    for (token, state) in entries {
        let key: ItemKey = token.as_ref().parse()?;
        if map.insert(key, state).is_some() {
            return Err(ModelError::Invariant(format!(
                "items map contains key '{key}' more than once"
            )));
        }
    }
    Ok(map)
}
