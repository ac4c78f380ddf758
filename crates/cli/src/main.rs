mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliConfig;
use oplist_core::{ItemKey, ItemStatus};
use oplist_uuid::{ArtifactId, CaseId};
use oplist_wire::DocumentFormat;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "oplist")]
#[command(about = "Op-List case document CLI")]
struct Cli {
    /// Document format (json or yaml); defaults to the file extension, then OPLIST_DOCUMENT_FORMAT
    #[arg(long, global = true)]
    format: Option<DocumentFormat>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new case document with a fresh checklist
    New {
        /// Path of the document to create
        path: PathBuf,
        /// Case UUID (generated when omitted)
        #[arg(long)]
        case_id: Option<CaseId>,
    },
    /// Show artifacts and item statuses
    Show {
        /// Case document path
        path: PathBuf,
    },
    /// Validate a document and report cross-reference problems
    Check {
        /// Case document path
        path: PathBuf,
    },
    /// Add missing checklist items to a document written by an older version
    Migrate {
        /// Case document path
        path: PathBuf,
    },
    /// Attach an uploaded artifact
    AddArtifact {
        /// Case document path
        path: PathBuf,
        /// Original filename
        filename: String,
        /// MIME type
        mime_type: String,
        /// Artifact UUID (generated when omitted)
        #[arg(long)]
        artifact_id: Option<ArtifactId>,
        /// Attach the artifact excluded from evaluation
        #[arg(long)]
        excluded: bool,
    },
    /// Remove an artifact (evidence pointing at it is kept)
    RemoveArtifact {
        /// Case document path
        path: PathBuf,
        /// Artifact UUID
        artifact_id: ArtifactId,
    },
    /// Include or exclude an artifact from evaluation
    SetIncluded {
        /// Case document path
        path: PathBuf,
        /// Artifact UUID
        artifact_id: ArtifactId,
        /// true or false
        #[arg(action = clap::ArgAction::Set)]
        included: bool,
    },
    /// Replace a checklist item with a status and no evidence
    SetItem {
        /// Case document path
        path: PathBuf,
        /// Item key (e.g. allergies)
        item: ItemKey,
        /// Status (pending, confirmed, unknown, conflict)
        status: ItemStatus,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("oplist=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = CliConfig::from_env()?;
    let cli = Cli::parse();
    let format_for = |path: &Path| config.format_for(path, cli.format);

    match cli.command {
        Some(Commands::New { ref path, case_id }) => {
            let case_id = commands::new_case(path, format_for(path), case_id)?;
            println!("Created case {} at {}", case_id, path.display());
        }
        Some(Commands::Show { ref path }) => {
            print!("{}", commands::show(path, format_for(path))?);
        }
        Some(Commands::Check { ref path }) => {
            let report = commands::check(path, format_for(path))?;
            if !report.is_clean() {
                for issue in report.issues() {
                    eprintln!("{issue}");
                }
                anyhow::bail!("{} consistency issue(s) found", report.issues().len());
            }
            println!("OK: {}", path.display());
        }
        Some(Commands::Migrate { ref path }) => {
            let added = commands::migrate(path, format_for(path))?;
            if added.is_empty() {
                println!("Already up to date: {}", path.display());
            } else {
                let names: Vec<&str> = added.iter().map(|key| key.as_str()).collect();
                println!("Added items: {}", names.join(", "));
            }
        }
        Some(Commands::AddArtifact {
            ref path,
            ref filename,
            ref mime_type,
            artifact_id,
            excluded,
        }) => {
            let artifact_id = commands::add_artifact(
                path,
                format_for(path),
                filename,
                mime_type,
                artifact_id,
                excluded,
            )?;
            println!("Added artifact {}", artifact_id);
        }
        Some(Commands::RemoveArtifact {
            ref path,
            artifact_id,
        }) => {
            commands::remove_artifact(path, format_for(path), artifact_id)?;
            println!("Removed artifact {}", artifact_id);
        }
        Some(Commands::SetIncluded {
            ref path,
            artifact_id,
            included,
        }) => {
            commands::set_included(path, format_for(path), artifact_id, included)?;
            println!("Artifact {} included={}", artifact_id, included);
        }
        Some(Commands::SetItem {
            ref path,
            item,
            status,
        }) => {
            let previous = commands::set_item(path, format_for(path), item, status)?;
            println!("{}: {} -> {}", item, previous.status(), status);
        }
        None => {
            println!("Use 'oplist --help' for commands");
        }
    }

    Ok(())
}
