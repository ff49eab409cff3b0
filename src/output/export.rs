//! JSON export of the stored documents
//!
//! The export is a pretty-printed JSON array of documents ordered by id.
//! With chunking enabled the array is split across `{stem}_batch_{n}.{ext}`
//! files (1-based) next to the configured path; chunk boundaries carry no
//! meaning. Chunk files left by an earlier export of the same path are
//! removed first, so the files on disk always mirror the store.

use crate::output::traits::OutputResult;
use crate::storage::{ExtractedDocument, Storage};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Exports every stored document
///
/// This is a pure read of the store.
///
/// # Arguments
///
/// * `storage` - The storage backend to read from
/// * `path` - Export file path
/// * `chunk_size` - Documents per file, or `None` for a single file
///
/// # Returns
///
/// The paths of the files written, in order
pub fn export_documents(
    storage: &dyn Storage,
    path: &Path,
    chunk_size: Option<usize>,
) -> OutputResult<Vec<PathBuf>> {
    let documents = storage.list_documents()?;
    let written = write_documents(&documents, path, chunk_size)?;

    tracing::info!(
        "Exported {} documents to {} file(s)",
        documents.len(),
        written.len()
    );
    Ok(written)
}

/// Writes documents as JSON, optionally split into chunks
pub fn write_documents(
    documents: &[ExtractedDocument],
    path: &Path,
    chunk_size: Option<usize>,
) -> OutputResult<Vec<PathBuf>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    remove_stale_chunks(path)?;

    match chunk_size {
        None => {
            write_json_file(documents, path)?;
            Ok(vec![path.to_path_buf()])
        }
        Some(size) => {
            // An empty store still produces one (empty) chunk
            let chunks: Vec<&[ExtractedDocument]> = if documents.is_empty() {
                vec![documents]
            } else {
                documents.chunks(size.max(1)).collect()
            };

            chunks
                .into_iter()
                .enumerate()
                .map(|(index, chunk)| {
                    let chunk_file = chunk_path(path, index + 1);
                    write_json_file(chunk, &chunk_file)?;
                    Ok(chunk_file)
                })
                .collect()
        }
    }
}

fn write_json_file(documents: &[ExtractedDocument], path: &Path) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, documents)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Deletes every `{stem}_batch_{n}.{ext}` file belonging to `path`
fn remove_stale_chunks(path: &Path) -> OutputResult<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let prefix = format!("{}_batch_", stem);
    let suffix = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let index = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(&suffix));

        let is_chunk = index
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
        if is_chunk && entry.file_type()?.is_file() {
            tracing::debug!("Removing stale export chunk {}", name);
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Path of the `index`-th chunk (1-based) for an export path
///
/// `out/stories.json` becomes `out/stories_batch_1.json`.
pub fn chunk_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());

    let file_name = match path.extension() {
        Some(ext) => format!("{}_batch_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_batch_{}", stem, index),
    };
    path.with_file_name(file_name)
}

/// Reads one or more export files back into documents, in file order
pub fn load_export<P: AsRef<Path>>(paths: &[P]) -> OutputResult<Vec<ExtractedDocument>> {
    let mut documents = Vec::new();
    for path in paths {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let mut chunk: Vec<ExtractedDocument> = serde_json::from_reader(reader)?;
        documents.append(&mut chunk);
    }
    Ok(documents)
}
