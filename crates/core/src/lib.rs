//! # Op-List Core
//!
//! Shared record model for the surgical case-review checklist.
//!
//! A case accumulates uploaded documents ([`Artifact`]) and tracks the status of a fixed checklist
//! ([`ItemKey`]). Each status is backed by pinpoint references into source documents
//! ([`EvidenceRef`]). This crate owns the entities and every construction-time guarantee:
//! - evidence spans are non-empty and forward;
//! - every case holds exactly one [`ItemState`] per [`ItemKey`];
//! - artifact timestamps are UTC instants.
//!
//! **No I/O**: serialisation lives in `oplist-wire`, file handling in `oplist-cli`. Every
//! operation here is synchronous and pure apart from `debug!` tracing events.
//!
//! Values carry no locks. Callers that share a [`CaseState`] across workers must serialise
//! mutation themselves.

pub mod artifact;
pub mod case;
pub mod consistency;
pub mod error;
pub mod evidence;
pub mod item;
pub mod validation;

pub use artifact::Artifact;
pub use case::CaseState;
pub use consistency::{ConsistencyIssue, ConsistencyReport};
pub use error::{ModelError, ModelResult};
pub use evidence::EvidenceRef;
pub use item::{default_items, ItemKey, ItemMap, ItemState, ItemStatus};

pub use oplist_uuid::{ArtifactId, CaseId, ChunkId, EvidenceId};
