//! File index builder — walks the document roots and maps each patient
//! key to the files that belong to it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::AppConfig;
use crate::keys::normalize_key;

/// In-memory mapping from normalized patient key to the document paths
/// discovered under the scanned roots, in traversal order.
#[derive(Debug, Default)]
pub struct FileIndex {
    entries: HashMap<String, Vec<PathBuf>>,
}

impl FileIndex {
    pub fn get(&self, patient_key: &str) -> Option<&[PathBuf]> {
        self.entries.get(patient_key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, patient_key: String, path: PathBuf) {
        self.entries.entry(patient_key).or_default().push(path);
    }
}

/// Walk every configured root and index qualifying documents.
///
/// A file qualifies when its extension is on the allow-list
/// (case-insensitive). Its candidate identifier is the filename prefix
/// before the first `_`; a filename with no `_` contributes its whole
/// stem. Unreadable directories are logged and skipped; missing roots
/// yield an empty index rather than an error.
pub fn build_file_index(config: &AppConfig) -> FileIndex {
    let mut index = FileIndex::default();
    let mut files_indexed = 0usize;

    for root in &config.root_dirs {
        if !root.exists() {
            tracing::warn!(root = %root.display(), "Document root does not exist, skipping");
            continue;
        }

        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(root = %root.display(), error = %err, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let extension_ok = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| config.allows_extension(e));
            if !extension_ok {
                continue;
            }

            let Some(key) = candidate_key(path) else {
                continue;
            };

            let absolute = path
                .canonicalize()
                .unwrap_or_else(|_| path.to_path_buf());
            index.push(key, absolute);
            files_indexed += 1;
        }
    }

    tracing::info!(
        patients = index.len(),
        files = files_indexed,
        "File index built"
    );
    index
}

/// Normalized identifier from a document filename, or None when the
/// prefix normalizes to nothing (an all-zero or empty identifier can
/// never join against the store).
fn candidate_key(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let raw = stem.split('_').next().unwrap_or(stem);
    let key = normalize_key(raw);
    if key.is_empty() {
        tracing::debug!(file = %path.display(), "Filename yields empty patient key, skipping");
        return None;
    }
    Some(key)
}
