use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::fs::sort::SortMode;

/// Names starting with this marker are hidden unless `show_hidden` is set.
pub const HIDDEN_MARKER: char = '.';

/// Whether a file name counts as hidden.
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with(HIDDEN_MARKER)
}

/// Final path segment, or the whole path for root-like paths.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// One immediate child of a scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub name: String,
    pub is_directory: bool,
    /// Visible immediate children (directories only, 0 for files).
    pub child_count: usize,
    /// Byte length for files. Directories report 0.
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl Entry {
    /// Build an entry from already-gathered facts.
    pub fn new(path: PathBuf, is_directory: bool, child_count: usize, size: u64) -> Self {
        let name = display_name(&path);
        Self {
            path,
            name,
            is_directory,
            child_count: if is_directory { child_count } else { 0 },
            size: if is_directory { 0 } else { size },
            modified: None,
        }
    }

    /// Attach a modification time.
    pub fn with_modified(mut self, modified: Option<SystemTime>) -> Self {
        self.modified = modified;
        self
    }

    pub fn is_hidden(&self) -> bool {
        is_hidden_name(&self.name)
    }

    /// Lowercased extension, if the name has one.
    ///
    /// A leading dot alone (`.bashrc`) is not an extension.
    pub fn extension(&self) -> Option<String> {
        let dot = self.name.rfind('.')?;
        if dot == 0 || dot == self.name.len() - 1 {
            return None;
        }
        Some(self.name[dot + 1..].to_lowercase())
    }
}

/// An ordered, immutable snapshot of one directory's entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub path: PathBuf,
    pub sort_mode: SortMode,
    pub entries: Vec<Entry>,
}

impl Listing {
    pub fn new(path: PathBuf, sort_mode: SortMode, entries: Vec<Entry>) -> Self {
        Self {
            path,
            sort_mode,
            entries,
        }
    }

    /// An empty listing for `path`, used for unreadable directories.
    pub fn empty(path: PathBuf) -> Self {
        Self::new(path, SortMode::default(), Vec::new())
    }

    /// Replace the entries, keeping path and sort tag.
    pub fn with_entries(mut self, entries: Vec<Entry>) -> Self {
        self.entries = entries;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Index of the entry with the given path.
    pub fn position(&self, path: &Path) -> Option<usize> {
        self.entries.iter().position(|e| e.path == path)
    }
}
