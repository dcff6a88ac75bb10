//! Export pipeline.
//!
//! Packages every uploaded file into a zip archive, one top-level
//! directory per configured folder name, plus an `_annotations.json`
//! sidecar in each folder that holds annotated files. The archive is built
//! from a snapshot of the tree; concurrent state changes do not affect an
//! export already in flight.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::model::{Annotation, Phase};

/// Fixed name of the exported archive.
pub const ARCHIVE_FILE_NAME: &str = "RAG_Data_Collection_Export.zip";

/// Name of the per-folder annotation sidecar.
pub const ANNOTATIONS_FILE_NAME: &str = "_annotations.json";

/// Export failures.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No files have been uploaded to export.")]
    NothingToExport,

    #[error("Failed to generate the zip file: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to encode annotations: {0}")]
    Annotations(#[from] serde_json::Error),

    #[error("Failed to write archive: {0}")]
    Io(#[from] std::io::Error),
}

/// Files and annotations gathered for one archive directory.
///
/// The folder name is the partition key: tasks configured with the same
/// folder merge here, and a later file under an already-used name replaces
/// the earlier one.
#[derive(Default)]
struct FolderEntry {
    files: BTreeMap<String, Arc<Vec<u8>>>,
    annotations: BTreeMap<String, Vec<Annotation>>,
}

#[derive(Serialize)]
struct AnnotationRecord<'a> {
    id: &'a str,
    text: &'a str,
}

/// Build the export archive from a tree snapshot, returning the zip bytes.
///
/// Fails with [`ExportError::NothingToExport`] before any archive work
/// when the tree holds no files at all.
pub fn build_archive(phases: &[Phase]) -> Result<Vec<u8>, ExportError> {
    let mut folders: BTreeMap<String, FolderEntry> = BTreeMap::new();
    let mut file_count = 0usize;

    for task in phases.iter().flat_map(|p| &p.tasks) {
        let Some(config) = &task.file_config else { continue };
        if task.files.is_empty() {
            continue;
        }
        let entry = folders.entry(config.folder.clone()).or_default();
        for file in &task.files {
            entry.files.insert(file.name.clone(), Arc::clone(&file.content));
            file_count += 1;
            if !file.annotations.is_empty() {
                entry.annotations.insert(file.name.clone(), file.annotations.clone());
            }
        }
    }

    if file_count == 0 {
        return Err(ExportError::NothingToExport);
    }

    let options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (folder, entry) in &folders {
        for (name, content) in &entry.files {
            writer.start_file(format!("{folder}/{name}"), options)?;
            writer.write_all(content)?;
        }
        if !entry.annotations.is_empty() {
            let sidecar: BTreeMap<&str, Vec<AnnotationRecord>> = entry
                .annotations
                .iter()
                .map(|(name, annotations)| {
                    let records = annotations
                        .iter()
                        .map(|a| AnnotationRecord { id: &a.id, text: &a.text })
                        .collect();
                    (name.as_str(), records)
                })
                .collect();
            writer.start_file(format!("{folder}/{ANNOTATIONS_FILE_NAME}"), options)?;
            writer.write_all(serde_json::to_string_pretty(&sidecar)?.as_bytes())?;
        }
        debug!(folder, files = entry.files.len(), "folder packaged");
    }

    let cursor = writer.finish()?;
    info!(files = file_count, folders = folders.len(), "archive built");
    Ok(cursor.into_inner())
}

/// Build the archive and write it under its fixed name into `dir`.
/// Returns the path of the written file.
pub fn write_archive(phases: &[Phase], dir: &Path) -> Result<PathBuf, ExportError> {
    let bytes = build_archive(phases)?;
    let path = dir.join(ARCHIVE_FILE_NAME);
    std::fs::write(&path, bytes)?;
    Ok(path)
}
