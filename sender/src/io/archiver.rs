//! Zip packaging of a monthly document folder.
//!
//! The [`Archiver`] trait decouples the workflow from the archive format.
//! Tests use fakes that record calls without touching the filesystem.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Folder missing or unreadable. Expected when a month had no documents.
    #[error("source folder unavailable {}: {reason}", .path.display())]
    SourceUnavailable { path: PathBuf, reason: String },
    #[error("source folder has no files {}", .path.display())]
    EmptySource { path: PathBuf },
    #[error("archive i/o {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write zip {}: {source}", .path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
}

/// Packages one directory tree into one archive file.
pub trait Archiver {
    /// Replace whatever is at `destination` with an archive of `source`.
    ///
    /// Any previous file at `destination` is removed first, even when
    /// `source` turns out to be unavailable.
    fn archive(&self, source: &Path, destination: &Path) -> Result<PathBuf, ArchiveError>;

    /// Remove whatever is at `destination` without producing a new archive.
    fn discard(&self, destination: &Path) -> Result<(), ArchiveError>;
}

/// Deflate-compressed zip with entry names relative to the source folder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    #[instrument(
        skip_all,
        fields(source = %source.display(), destination = %destination.display())
    )]
    fn archive(&self, source: &Path, destination: &Path) -> Result<PathBuf, ArchiveError> {
        remove_previous(destination)?;

        let files = list_files(source)?;
        if files.is_empty() {
            return Err(ArchiveError::EmptySource {
                path: source.to_path_buf(),
            });
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|err| io_error(parent, err))?;
        }
        let mut tmp_name = destination.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        if let Err(err) = write_zip(&tmp_path, &files) {
            // Best effort: a half-written temp file must not linger next to the archive.
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }
        fs::rename(&tmp_path, destination).map_err(|err| io_error(destination, err))?;

        info!(entries = files.len(), "archive written");
        Ok(destination.to_path_buf())
    }

    fn discard(&self, destination: &Path) -> Result<(), ArchiveError> {
        remove_previous(destination)
    }
}

#[derive(Debug)]
struct SourceFile {
    path: PathBuf,
    /// `/`-separated name inside the archive.
    entry_name: String,
}

fn remove_previous(destination: &Path) -> Result<(), ArchiveError> {
    match fs::remove_file(destination) {
        Ok(()) => {
            debug!("removed previous archive");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_error(destination, err)),
    }
}

fn list_files(source: &Path) -> Result<Vec<SourceFile>, ArchiveError> {
    let unavailable = |reason: String| ArchiveError::SourceUnavailable {
        path: source.to_path_buf(),
        reason,
    };

    let meta = fs::metadata(source).map_err(|err| unavailable(err.to_string()))?;
    if !meta.is_dir() {
        return Err(unavailable("not a directory".to_string()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|err| unavailable(err.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let entry_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(SourceFile {
            path: entry.path().to_path_buf(),
            entry_name,
        });
    }
    debug!(files = files.len(), "source listed");
    Ok(files)
}

fn write_zip(path: &Path, files: &[SourceFile]) -> Result<(), ArchiveError> {
    let zip_error = |source: ZipError| ArchiveError::Zip {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|err| io_error(path, err))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in files {
        zip.start_file(entry.entry_name.as_str(), options).map_err(zip_error)?;
        let mut input = File::open(&entry.path).map_err(|err| io_error(&entry.path, err))?;
        io::copy(&mut input, &mut zip).map_err(|err| io_error(&entry.path, err))?;
    }

    let mut writer = zip.finish().map_err(zip_error)?;
    writer.flush().map_err(|err| io_error(path, err))?;
    Ok(())
}

fn io_error(path: &Path, source: io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}
