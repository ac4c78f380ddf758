//! Command handlers.
//!
//! Every handler loads the document through `CaseDocument::parse`, changes it only through
//! `CaseState` operations, and writes it back through `CaseDocument::render`.

use anyhow::{bail, Context};
use oplist_core::{Artifact, CaseState, ConsistencyReport, ItemKey, ItemState, ItemStatus};
use oplist_uuid::{ArtifactId, CaseId};
use oplist_wire::{CaseDocument, DocumentFormat};
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

fn load(path: &Path, format: DocumentFormat) -> anyhow::Result<CaseState> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read case document {}", path.display()))?;
    CaseDocument::parse(&text, format)
        .with_context(|| format!("failed to load case document {}", path.display()))
}

fn save(path: &Path, format: DocumentFormat, case: &CaseState) -> anyhow::Result<()> {
    let text = CaseDocument::render(case, format)?;
    write_document(path, &text, true)
        .with_context(|| format!("failed to write case document {}", path.display()))
}

/// Writes `text` to a temporary file beside `path`, then renames it into place, so a failed
/// write never leaves a truncated document behind.
fn write_document(path: &Path, text: &str, overwrite: bool) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(text.as_bytes())?;
    file.as_file().sync_all()?;

    if overwrite {
        file.persist(path)?;
    } else {
        file.persist_noclobber(path)?;
    }
    Ok(())
}

/// Writes a fresh case. Refuses to overwrite an existing file.
pub fn new_case(
    path: &Path,
    format: DocumentFormat,
    case_id: Option<CaseId>,
) -> anyhow::Result<CaseId> {
    let case = CaseState::new(case_id.unwrap_or_default());
    let text = CaseDocument::render(&case, format)?;

    write_document(path, &text, false)
        .with_context(|| format!("failed to create case document {}", path.display()))?;

    info!(case_id = %case.case_id(), "case created");
    Ok(case.case_id())
}

/// Human-readable summary of a case.
pub fn show(path: &Path, format: DocumentFormat) -> anyhow::Result<String> {
    let case = load(path, format)?;
    let mut out = String::new();

    writeln!(out, "Case: {}", case.case_id())?;
    writeln!(out, "Artifacts ({}):", case.artifacts().len())?;
    for artifact in case.artifacts() {
        writeln!(
            out,
            "  {}  {:<8}  {}  {}  {}",
            artifact.artifact_id(),
            if artifact.is_included() { "included" } else { "excluded" },
            artifact.created_at().to_rfc3339(),
            artifact.mime_type(),
            artifact.filename()
        )?;
    }
    writeln!(out, "Items:")?;
    for (key, state) in case.items().iter() {
        writeln!(
            out,
            "  {:<24} {:<9} evidence={} active={}",
            key.as_str(),
            state.status().as_str(),
            state.evidence_refs().len(),
            case.active_evidence(key).count()
        )?;
    }

    Ok(out)
}

/// Strict load plus the whole-case consistency report.
pub fn check(path: &Path, format: DocumentFormat) -> anyhow::Result<ConsistencyReport> {
    Ok(load(path, format)?.check_consistency())
}

/// Loads with migration and rewrites the file if any key was added.
pub fn migrate(path: &Path, format: DocumentFormat) -> anyhow::Result<Vec<ItemKey>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read case document {}", path.display()))?;
    let migrated = CaseDocument::parse_migrating(&text, format)
        .with_context(|| format!("failed to migrate case document {}", path.display()))?;

    if migrated.changed() {
        save(path, format, &migrated.case)?;
    }
    Ok(migrated.added_items)
}

pub fn add_artifact(
    path: &Path,
    format: DocumentFormat,
    filename: &str,
    mime_type: &str,
    artifact_id: Option<ArtifactId>,
    excluded: bool,
) -> anyhow::Result<ArtifactId> {
    let mut case = load(path, format)?;
    let mut artifact = Artifact::new(artifact_id.unwrap_or_default(), filename, mime_type);
    if excluded {
        artifact.set_included(false);
    }
    let artifact_id = artifact.artifact_id();

    case.add_artifact(artifact);
    save(path, format, &case)?;
    Ok(artifact_id)
}

pub fn remove_artifact(
    path: &Path,
    format: DocumentFormat,
    artifact_id: ArtifactId,
) -> anyhow::Result<()> {
    let mut case = load(path, format)?;
    if case.remove_artifact(artifact_id).is_none() {
        bail!(
            "artifact {artifact_id} is not attached to case {}",
            case.case_id()
        );
    }
    save(path, format, &case)
}

pub fn set_included(
    path: &Path,
    format: DocumentFormat,
    artifact_id: ArtifactId,
    included: bool,
) -> anyhow::Result<()> {
    let mut case = load(path, format)?;
    case.set_artifact_included(artifact_id, included)?;
    save(path, format, &case)
}

/// Replaces an item with `status` and no evidence.
pub fn set_item(
    path: &Path,
    format: DocumentFormat,
    key: ItemKey,
    status: ItemStatus,
) -> anyhow::Result<ItemState> {
    let mut case = load(path, format)?;
    let previous = case.set_item(key, ItemState::new(status, Vec::new()));
    save(path, format, &case)?;
    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn new_case_writes_loadable_document_and_refuses_overwrite() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("case.json");

        let case_id = new_case(&path, DocumentFormat::Json, None).expect("create case");
        let case = load(&path, DocumentFormat::Json).expect("load case");
        assert_eq!(case.case_id(), case_id);
        assert_eq!(case.pending_items(), ItemKey::ALL.to_vec());

        let err = new_case(&path, DocumentFormat::Json, None).expect_err("should not overwrite");
        assert!(err.to_string().contains("failed to create case document"));
    }

    #[test]
    fn refused_overwrite_keeps_existing_document() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("case.json");
        let case_id = new_case(&path, DocumentFormat::Json, None).expect("create case");
        let before = fs::read_to_string(&path).expect("read");

        new_case(&path, DocumentFormat::Json, None).expect_err("should not overwrite");

        assert_eq!(fs::read_to_string(&path).expect("read"), before);
        assert_eq!(
            load(&path, DocumentFormat::Json).expect("load").case_id(),
            case_id
        );
    }

    #[test]
    fn edits_replace_document_without_leaving_temporary_files() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("case.json");
        new_case(&path, DocumentFormat::Json, None).expect("create");

        add_artifact(&path, DocumentFormat::Json, "a.pdf", "application/pdf", None, false)
            .expect("add artifact");
        set_item(&path, DocumentFormat::Json, ItemKey::Allergies, ItemStatus::Unknown)
            .expect("set item");

        let names: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("case.json")]);
        assert_eq!(
            load(&path, DocumentFormat::Json)
                .expect("load")
                .artifacts()
                .len(),
            1
        );
    }

    #[test]
    fn new_case_uses_supplied_id() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("case.yaml");
        let case_id = CaseId::new();

        assert_eq!(
            new_case(&path, DocumentFormat::Yaml, Some(case_id)).expect("create"),
            case_id
        );
        assert_eq!(
            load(&path, DocumentFormat::Yaml).expect("load").case_id(),
            case_id
        );
    }

    #[test]
    fn artifact_commands_edit_the_document() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("case.json");
        new_case(&path, DocumentFormat::Json, None).expect("create");

        let artifact_id = add_artifact(
            &path,
            DocumentFormat::Json,
            "preop.pdf",
            "application/pdf",
            None,
            true,
        )
        .expect("add artifact");
        let case = load(&path, DocumentFormat::Json).expect("load");
        assert_eq!(case.artifacts().len(), 1);
        assert!(!case.artifacts()[0].is_included());

        set_included(&path, DocumentFormat::Json, artifact_id, true).expect("include");
        let case = load(&path, DocumentFormat::Json).expect("load");
        assert_eq!(
            case.artifact(artifact_id).map(Artifact::is_included),
            Some(true)
        );

        remove_artifact(&path, DocumentFormat::Json, artifact_id).expect("remove");
        assert!(load(&path, DocumentFormat::Json)
            .expect("load")
            .artifacts()
            .is_empty());

        let err = remove_artifact(&path, DocumentFormat::Json, artifact_id)
            .expect_err("already removed");
        assert!(err.to_string().contains("not attached"));
    }

    #[test]
    fn set_item_replaces_status() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("case.json");
        new_case(&path, DocumentFormat::Json, None).expect("create");

        let previous = set_item(
            &path,
            DocumentFormat::Json,
            ItemKey::BloodLossRisk,
            ItemStatus::Conflict,
        )
        .expect("set item");
        assert_eq!(previous, ItemState::default());

        let case = load(&path, DocumentFormat::Json).expect("load");
        assert_eq!(
            case.item(ItemKey::BloodLossRisk).status(),
            ItemStatus::Conflict
        );
        let summary = show(&path, DocumentFormat::Json).expect("show");
        assert!(summary.contains("blood_loss_risk"));
        assert!(summary.contains("conflict"));
    }

    #[test]
    fn check_rejects_hand_edited_document() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("case.json");
        new_case(&path, DocumentFormat::Json, None).expect("create");

        let text = fs::read_to_string(&path).expect("read");
        fs::write(&path, text.replace("\"allergies\"", "\"allergy\"")).expect("write");

        let err = check(&path, DocumentFormat::Json).expect_err("unknown key");
        assert!(format!("{err:#}").contains("unknown item key 'allergy'"));
    }

    #[test]
    fn migrate_adds_missing_keys_and_rewrites() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("case.json");
        let case_id = CaseId::new();
        let legacy = format!(
            r#"{{
  "case_id": "{case_id}",
  "items": {{
    "allergies": {{ "status": "confirmed" }},
    "blood_loss_risk": {{}},
    "number_bunits_available": {{}}
  }}
}}"#
        );
        fs::write(&path, legacy).expect("write legacy document");
        assert!(check(&path, DocumentFormat::Json).is_err());

        let added = migrate(&path, DocumentFormat::Json).expect("migrate");
        assert_eq!(added, vec![ItemKey::AbxProphylaxisTiming]);

        let report = check(&path, DocumentFormat::Json).expect("now strict-loadable");
        assert!(report.is_clean());
        assert!(migrate(&path, DocumentFormat::Json)
            .expect("second migration")
            .is_empty());
    }
}
