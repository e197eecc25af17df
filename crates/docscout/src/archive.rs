//! Zip extraction and documentation file collection
//!
//! Archives are unpacked into a [`TempDir`] that lives only for the
//! duration of [`extract_documents`]; it is removed on every return path,
//! including errors, when the guard is dropped.

use crate::error::Result;
use crate::types::Document;
use std::fs;
use std::io::{self, Cursor};
use std::path::{Component, Path};
use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

/// File extensions treated as documentation (compared case-insensitively)
pub const DOC_EXTENSIONS: &[&str] = &["md", "mdx"];

/// Returns true if the path has a documentation extension
pub fn is_doc_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            DOC_EXTENSIONS
                .iter()
                .any(|doc_ext| ext.eq_ignore_ascii_case(doc_ext))
        })
        .unwrap_or(false)
}

/// Extract a zip archive and collect its documentation files
///
/// Paths are relative to the repository root: the single top-level
/// directory GitHub wraps archives in (`<repo>-<branch>/`) is stripped.
/// Documents are returned sorted by path.
pub fn extract_documents(archive: &[u8]) -> Result<Vec<Document>> {
    let dir = TempDir::with_prefix("docscout-")?;
    extract_zip(archive, dir.path())?;
    let documents = collect_documents(dir.path())?;
    debug!(
        count = documents.len(),
        dir = %dir.path().display(),
        "Collected documentation files"
    );
    Ok(documents)
}

/// Unpack `archive` below `dest`, skipping symlinks and escaping entries
fn extract_zip(archive: &[u8], dest: &Path) -> Result<()> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;

        let Some(relative) = entry.enclosed_name() else {
            warn!(name = entry.name(), "Skipping archive entry outside root");
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if entry.is_symlink() {
            debug!(name = entry.name(), "Skipping symlink entry");
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
    }

    Ok(())
}

/// Walk `root` and read every documentation file
fn collect_documents(root: &Path) -> Result<Vec<Document>> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io_err) => io_err,
            None => io::Error::other("directory walk failed"),
        })?;

        if !entry.file_type().is_file() || !is_doc_file(entry.path()) {
            continue;
        }

        let Some(path) = repo_relative_path(root, entry.path()) else {
            continue;
        };

        match fs::read(entry.path()) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(content) => documents.push(Document::new(path, content)),
                Err(_) => warn!(path = %path, "Skipping non-UTF-8 file"),
            },
            Err(e) => return Err(e.into()),
        }
    }

    documents.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(documents)
}

/// Path below the archive's top-level directory, `/`-separated
///
/// Files sitting directly in `root` (archives without a wrapper directory)
/// keep their name.
fn repo_relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    match parts.len() {
        0 => None,
        1 => Some(parts[0].clone()),
        _ => Some(parts[1..].join("/")),
    }
}
