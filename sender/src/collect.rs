//! Packaging both document folders into the attachment list.
//!
//! A folder that cannot be archived is skipped: a month without
//! cancellations is normal. Only the caller decides whether an empty list
//! is a failure.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::period::TargetPeriod;
use crate::core::settings::ValidSettings;
use crate::core::types::{Attachment, FolderKind};
use crate::io::archiver::Archiver;

/// Source folders for one period. `None` when the base folder was never configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFolders {
    pub cancelados: Option<PathBuf>,
    pub vendas: Option<PathBuf>,
}

impl SourceFolders {
    pub fn for_period(settings: &ValidSettings, period: TargetPeriod) -> Self {
        Self {
            cancelados: settings
                .pasta_cancelados
                .as_deref()
                .map(|base| period.source_dir(base)),
            vendas: settings
                .pasta_vendas
                .as_deref()
                .map(|base| period.source_dir(base)),
        }
    }

    pub fn get(&self, kind: FolderKind) -> Option<&Path> {
        match kind {
            FolderKind::Cancelados => self.cancelados.as_deref(),
            FolderKind::Vendas => self.vendas.as_deref(),
        }
    }
}

/// What happened to one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    Archived(Attachment),
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFolder {
    pub kind: FolderKind,
    pub outcome: FolderOutcome,
}

/// Per-folder outcomes in processing order (cancellations, then sales).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    pub folders: Vec<CollectedFolder>,
}

impl Collection {
    /// Attachments in processing order.
    pub fn attachments(&self) -> Vec<Attachment> {
        self.folders
            .iter()
            .filter_map(|folder| match &folder.outcome {
                FolderOutcome::Archived(attachment) => Some(attachment.clone()),
                FolderOutcome::Skipped { .. } => None,
            })
            .collect()
    }
}

/// Archive each configured folder into `archive_dir`. Never fails.
pub fn collect_attachments<A: Archiver>(
    archiver: &A,
    sources: &SourceFolders,
    archive_dir: &Path,
) -> Collection {
    let folders = FolderKind::PROCESSING_ORDER
        .into_iter()
        .map(|kind| CollectedFolder {
            kind,
            outcome: collect_one(archiver, kind, sources.get(kind), archive_dir),
        })
        .collect();
    Collection { folders }
}

fn collect_one<A: Archiver>(
    archiver: &A,
    kind: FolderKind,
    source: Option<&Path>,
    archive_dir: &Path,
) -> FolderOutcome {
    let destination = archive_dir.join(kind.archive_file_name());
    let Some(source) = source else {
        warn!(folder = kind.as_str(), "folder not configured, skipping");
        if let Err(err) = archiver.discard(&destination) {
            warn!(folder = kind.as_str(), error = %err, "could not remove previous archive");
        }
        return FolderOutcome::Skipped {
            reason: "folder not configured".to_string(),
        };
    };

    match archiver.archive(source, &destination) {
        Ok(path) => {
            info!(folder = kind.as_str(), path = %path.display(), "folder archived");
            FolderOutcome::Archived(Attachment {
                filename: kind.archive_file_name().to_string(),
                path,
            })
        }
        Err(err) => {
            warn!(folder = kind.as_str(), error = %err, "folder skipped");
            FolderOutcome::Skipped {
                reason: err.to_string(),
            }
        }
    }
}
