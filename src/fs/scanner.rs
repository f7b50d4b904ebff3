use std::fs;
use std::path::Path;

use tracing::debug;

use crate::fs::entry::{is_hidden_name, Entry, Listing};

/// List the immediate children of `path`.
///
/// Hidden children are skipped unless `show_hidden` is set. An unreadable
/// directory (missing, permission denied, not a directory) produces an empty
/// listing. Children that vanish between `read_dir` and `stat` are skipped.
/// The result is in `read_dir` order; sorting is applied separately.
pub fn scan_directory(path: &Path, show_hidden: bool) -> Listing {
    let read = match fs::read_dir(path) {
        Ok(read) => read,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "directory unreadable, presenting as empty");
            return Listing::empty(path.to_path_buf());
        }
    };

    let mut entries = Vec::new();
    for dir_entry in read {
        let dir_entry = match dir_entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !show_hidden && is_hidden_name(&dir_entry.file_name().to_string_lossy()) {
            continue;
        }
        if let Some(entry) = read_entry(&dir_entry.path(), show_hidden) {
            entries.push(entry);
        }
    }

    debug!(path = %path.display(), entries = entries.len(), show_hidden, "scanned directory");
    Listing::empty(path.to_path_buf()).with_entries(entries)
}

/// Build one entry, following symlinks. A dangling link is reported as a
/// plain non-directory entry.
fn read_entry(path: &Path, show_hidden: bool) -> Option<Entry> {
    let metadata = fs::metadata(path)
        .or_else(|_| fs::symlink_metadata(path))
        .ok()?;
    let is_directory = metadata.is_dir();
    let child_count = if is_directory {
        count_visible_children(path, show_hidden)
    } else {
        0
    };
    Some(
        Entry::new(path.to_path_buf(), is_directory, child_count, metadata.len())
            .with_modified(metadata.modified().ok()),
    )
}

/// Number of immediate children of `path` that pass the hidden filter.
///
/// Any failure to list the directory counts as 0.
pub fn count_visible_children(path: &Path, show_hidden: bool) -> usize {
    match fs::read_dir(path) {
        Ok(read) => read
            .filter_map(|e| e.ok())
            .filter(|e| show_hidden || !is_hidden_name(&e.file_name().to_string_lossy()))
            .count(),
        Err(_) => 0,
    }
}
