use std::cmp::Ordering;

use crate::fs::entry::{Entry, Listing};

/// Field entries are compared by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    /// Case-insensitive name, default.
    #[default]
    Name,
    /// Byte size.
    Size,
    /// Extension, then name.
    Type,
    /// Modification time.
    Modified,
}

impl SortField {
    /// Parse a sort field from its config spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Some(SortField::Name),
            "size" => Some(SortField::Size),
            "type" | "extension" => Some(SortField::Type),
            "modified" | "date" => Some(SortField::Modified),
            _ => None,
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            SortField::Name => "Name",
            SortField::Size => "Size",
            SortField::Type => "Type",
            SortField::Modified => "Modified",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }
}

/// Complete sort configuration for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortMode {
    pub field: SortField,
    pub order: SortOrder,
    /// Directories are listed before files. Not affected by `order`.
    pub dirs_first: bool,
}

impl Default for SortMode {
    fn default() -> Self {
        Self {
            field: SortField::Name,
            order: SortOrder::Ascending,
            dirs_first: true,
        }
    }
}

impl SortMode {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self {
            field,
            order,
            ..Self::default()
        }
    }

    /// Short human-readable description, e.g. `Size ↓`.
    pub fn label(&self) -> String {
        let arrow = match self.order {
            SortOrder::Ascending => "↑",
            SortOrder::Descending => "↓",
        };
        format!("{} {}", self.field.label(), arrow)
    }
}

/// Compare two entries under `mode`.
///
/// Total order: directory class (if enabled), then the selected field, then
/// case-insensitive full path, then the exact path.
pub fn compare_entries(a: &Entry, b: &Entry, mode: &SortMode) -> Ordering {
    if mode.dirs_first {
        let class = b.is_directory.cmp(&a.is_directory);
        if class != Ordering::Equal {
            return class;
        }
    }

    let ord = compare_field(a, b, mode.field).then_with(|| compare_paths(a, b));
    mode.order.apply(ord)
}

fn compare_field(a: &Entry, b: &Entry, field: SortField) -> Ordering {
    match field {
        SortField::Name => compare_names(a, b),
        SortField::Size => a.size.cmp(&b.size),
        // None sorts before Some, so entries without a time come first.
        SortField::Modified => a.modified.cmp(&b.modified),
        SortField::Type => a
            .extension()
            .cmp(&b.extension())
            .then_with(|| compare_names(a, b)),
    }
}

fn compare_names(a: &Entry, b: &Entry) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

fn compare_paths(a: &Entry, b: &Entry) -> Ordering {
    let pa = a.path.to_string_lossy().to_lowercase();
    let pb = b.path.to_string_lossy().to_lowercase();
    pa.cmp(&pb).then_with(|| a.path.cmp(&b.path))
}

/// Return a new, ordered copy of `entries`.
pub fn sort_entries(entries: &[Entry], mode: &SortMode) -> Vec<Entry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| compare_entries(a, b, mode));
    sorted
}

/// Sort a listing, tagging the result with `mode`.
pub fn sort_listing(listing: Listing, mode: SortMode) -> Listing {
    let Listing { path, entries, .. } = listing;
    let mut entries = entries;
    entries.sort_by(|a, b| compare_entries(a, b, &mode));
    Listing::new(path, mode, entries)
}
