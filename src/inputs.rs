//! Input collection: turn command-line paths into an ordered file list.
//!
//! Files are taken as given, whatever their extension, so a bad file shows
//! up as a per-item failure in the report rather than silently vanishing.
//! Directories are walked recursively and contribute only files with a
//! supported image extension, sorted by path. Duplicates keep their first
//! position.

use crate::imaging::is_supported_input;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub fn collect_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for path in paths {
        let found = if path.is_dir() {
            images_in_dir(path)
        } else {
            vec![path.clone()]
        };
        for file in found {
            let key = file.canonicalize().unwrap_or_else(|_| file.clone());
            if seen.insert(key) {
                out.push(file);
            }
        }
    }
    debug!(count = out.len(), "collected inputs");
    out
}

fn images_in_dir(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(error = %err, "skipping unreadable path");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_supported_input(e.path()))
        .map(|e| e.into_path())
        .collect()
}
