//! Shared value types for the send workflow.
//!
//! These types carry no I/O and stay stable across runs so outcomes can be
//! compared in tests.

use std::path::PathBuf;

/// Document category, each with its own source tree and fixed archive name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FolderKind {
    Cancelados,
    Vendas,
}

impl FolderKind {
    /// Order in which folders are packaged and attached.
    pub const PROCESSING_ORDER: [FolderKind; 2] = [FolderKind::Cancelados, FolderKind::Vendas];

    /// Archive file name; not derived from the source folder.
    pub fn archive_file_name(self) -> &'static str {
        match self {
            FolderKind::Cancelados => "Cancelados.zip",
            FolderKind::Vendas => "Vendas.zip",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FolderKind::Cancelados => "cancelados",
            FolderKind::Vendas => "vendas",
        }
    }
}

/// An archive ready to be attached to the outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Base name shown to the recipient.
    pub filename: String,
    /// Location of the archive payload.
    pub path: PathBuf,
}

/// Workflow stage, reported with every abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    CheckingRunState,
    Packaging,
    Sending,
}
