use anyhow::{Result, bail};
use indexmap::IndexSet;
use log::debug;
use std::path::PathBuf;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;

/// Expand the command-line paths into the list of files to process.
///
/// Files named explicitly are always included. Directories are walked
/// recursively, skipping hidden entries, and contribute the files whose
/// extension is configured. The result is sorted and free of duplicates.
pub fn discover_files(paths: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>> {
    let mut files = IndexSet::new();

    for path in paths {
        if path.is_file() {
            files.insert(path.clone());
        } else if path.is_dir() {
            debug!("Scanning directory: {}", path.display());
            let entries = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
                .filter_map(|e| e.ok());

            for entry in entries {
                if entry.file_type().is_file() && config.matches_extension(entry.path()) {
                    files.insert(entry.into_path());
                }
            }
        } else {
            bail!("No such file or directory: {}", path.display());
        }
    }

    let mut files: Vec<_> = files.into_iter().collect();
    files.sort();
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
