use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::HarmonizeError;

pub fn default_suffixes() -> Vec<String> {
    vec![".tsv".to_string(), ".tsv.gz".to_string()]
}

/// Recursively list files under `root` whose name ends with one of `suffixes`.
///
/// Directory entries are visited in name order, so repeated runs see files in
/// the same order. Symlinked directories are followed, but each real directory
/// is walked at most once.
pub fn discover_count_files(
    root: &Utf8Path,
    suffixes: &[String],
) -> Result<Vec<Utf8PathBuf>, HarmonizeError> {
    if !root.as_std_path().is_dir() {
        return Err(HarmonizeError::RootNotFound(root.to_string()));
    }
    let suffixes = suffixes
        .iter()
        .map(|suffix| suffix.to_lowercase())
        .collect::<Vec<_>>();

    let mut files = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root.as_std_path().to_path_buf()];
    while let Some(dir) = stack.pop() {
        let canonical = fs::canonicalize(&dir)
            .map_err(|err| HarmonizeError::Filesystem(format!("resolve dir {}: {err}", dir.display())))?;
        if !visited.insert(canonical) {
            tracing::debug!(path = %dir.display(), "skipping already visited directory");
            continue;
        }
        let mut entries = fs::read_dir(&dir)
            .map_err(|err| HarmonizeError::Filesystem(format!("read dir {}: {err}", dir.display())))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<PathBuf>, _>>()
            .map_err(|err| HarmonizeError::Filesystem(err.to_string()))?;
        entries.sort();

        let mut subdirs = Vec::new();
        for path in entries {
            if path.is_dir() {
                subdirs.push(path);
                continue;
            }
            if !path.is_file() {
                continue;
            }
            let path = match Utf8PathBuf::from_path_buf(path) {
                Ok(path) => path,
                Err(path) => {
                    tracing::warn!(path = %path.display(), "skipping non UTF-8 path");
                    continue;
                }
            };
            let matches = path
                .file_name()
                .map(|name| name.to_lowercase())
                .is_some_and(|name| suffixes.iter().any(|suffix| name.ends_with(suffix)));
            if matches {
                files.push(path);
            }
        }
        // Reverse so the stack pops subdirectories in name order.
        stack.extend(subdirs.into_iter().rev());
    }
    Ok(files)
}
