//! Change detection between a freshly scanned listing and the displayed one.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::fs::entry::Listing;
use crate::presentation::{Snapshot, ViewportAnchor};

/// Structural digest of a listing.
///
/// SHA-256 over the directory path followed by the ordered
/// `(path, is_directory, child_count, size)` tuples. Paths are hashed as
/// length-prefixed raw OS bytes and integers are fixed-width little-endian,
/// so the value only depends on those fields and their order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(listing: &Listing) -> Self {
        let mut hasher = Sha256::new();
        update_path(&mut hasher, &listing.path);
        hasher.update((listing.entries.len() as u64).to_le_bytes());
        for entry in &listing.entries {
            update_path(&mut hasher, &entry.path);
            hasher.update([entry.is_directory as u8]);
            hasher.update((entry.child_count as u64).to_le_bytes());
            hasher.update(entry.size.to_le_bytes());
        }
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

fn update_path(hasher: &mut Sha256, path: &Path) {
    let bytes = path.as_os_str().as_encoded_bytes();
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Outcome of comparing a new listing against the displayed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Same fingerprint. Only the listing's sort-mode tag may have been
    /// refreshed.
    Unchanged,
    /// The listing was installed and the selection cleared. `anchor` is the
    /// viewport position captured before the install, to be restored once
    /// the new listing has been drawn.
    Changed {
        listing: Arc<Listing>,
        anchor: ViewportAnchor,
    },
}

impl Reconciliation {
    pub fn is_changed(&self) -> bool {
        matches!(self, Reconciliation::Changed { .. })
    }
}

/// Install `listing` into `snapshot` unless it matches what is displayed.
///
/// Either way the snapshot ends up in the displayed phase.
pub fn reconcile(
    snapshot: &mut Snapshot,
    listing: Listing,
    fingerprint: Fingerprint,
) -> Reconciliation {
    if snapshot.fingerprint() == Some(fingerprint) {
        debug!(path = %listing.path.display(), %fingerprint, "listing unchanged");
        snapshot.retag(listing.sort_mode);
        snapshot.mark_displayed();
        return Reconciliation::Unchanged;
    }

    let anchor = snapshot.scroll_state();
    let listing = Arc::new(listing);
    snapshot.install(listing.clone(), fingerprint);
    debug!(
        path = %listing.path.display(),
        entries = listing.len(),
        %fingerprint,
        "listing replaced"
    );
    Reconciliation::Changed { listing, anchor }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entry::Entry;
    use crate::fs::sort::{SortMode, SortOrder};
    use crate::presentation::Phase;
    use std::path::PathBuf;

    fn listing(sizes: &[u64]) -> Listing {
        let entries = sizes
            .iter()
            .enumerate()
            .map(|(i, size)| Entry::new(PathBuf::from(format!("/d/f{}", i)), false, 0, *size))
            .collect();
        Listing::new(PathBuf::from("/d"), SortMode::default(), entries)
    }

    fn displayed(sizes: &[u64]) -> Snapshot {
        let mut snapshot = Snapshot::default();
        let l = listing(sizes);
        let fp = Fingerprint::of(&l);
        reconcile(&mut snapshot, l, fp);
        snapshot
    }

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(Fingerprint::of(&listing(&[1, 2])), Fingerprint::of(&listing(&[1, 2])));
        assert_eq!(Fingerprint::of(&listing(&[])).to_hex().len(), 64);
    }

    #[test]
    fn fingerprint_tracks_order() {
        let a = listing(&[1, 2]);
        let mut b = a.clone();
        b.entries.reverse();
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[cfg(unix)]
    #[test]
    fn fingerprint_distinguishes_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let named = |raw: &[u8]| {
            let path = PathBuf::from("/d").join(OsStr::from_bytes(raw));
            Listing::new(
                PathBuf::from("/d"),
                SortMode::default(),
                vec![Entry::new(path, false, 0, 0)],
            )
        };
        assert_ne!(Fingerprint::of(&named(b"f\xff")), Fingerprint::of(&named(b"f\xfe")));
    }

    #[cfg(unix)]
    #[test]
    fn rename_between_non_utf8_names_replaces_listing() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let before = dir.path().join(OsStr::from_bytes(b"f\xff"));
        let after = dir.path().join(OsStr::from_bytes(b"f\xfe"));
        std::fs::File::create(&before).unwrap();

        let mut snapshot = Snapshot::default();
        let first = crate::fs::scanner::scan_directory(dir.path(), false);
        let fp = Fingerprint::of(&first);
        reconcile(&mut snapshot, first, fp);

        std::fs::rename(&before, &after).unwrap();
        let second = crate::fs::scanner::scan_directory(dir.path(), false);
        let fp = Fingerprint::of(&second);
        assert!(reconcile(&mut snapshot, second, fp).is_changed());
        assert_eq!(snapshot.current_listing().entries[0].path, after);
    }

    #[test]
    fn fingerprint_ignores_modification_time() {
        let a = listing(&[1]);
        let mut b = a.clone();
        b.entries[0].modified = Some(std::time::SystemTime::now());
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn fingerprint_tracks_child_count_and_kind() {
        let mut a = listing(&[0]);
        a.entries[0] = Entry::new(PathBuf::from("/d/f0"), true, 1, 0);
        let mut b = a.clone();
        b.entries[0].child_count = 2;
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&listing(&[0])));
    }

    #[test]
    fn empty_listings_of_different_directories_differ() {
        let a = Listing::empty(PathBuf::from("/a"));
        let b = Listing::empty(PathBuf::from("/b"));
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn identical_listing_is_unchanged_and_keeps_selection() {
        let mut snapshot = displayed(&[1, 2, 3]);
        snapshot.select(1);
        let again = listing(&[1, 2, 3]);
        let fp = Fingerprint::of(&again);

        let outcome = reconcile(&mut snapshot, again, fp);
        assert_eq!(outcome, Reconciliation::Unchanged);
        assert!(snapshot.selection().contains(&1));
        assert_eq!(snapshot.phase(), Phase::Displayed);
    }

    #[test]
    fn same_order_under_new_sort_mode_retags_without_clearing() {
        let mut snapshot = displayed(&[1, 2, 3]);
        snapshot.select(2);
        let mode = SortMode::new(crate::fs::sort::SortField::Size, SortOrder::Ascending);
        let mut resorted = listing(&[1, 2, 3]);
        resorted.sort_mode = mode;
        let fp = Fingerprint::of(&resorted);

        assert_eq!(reconcile(&mut snapshot, resorted, fp), Reconciliation::Unchanged);
        assert_eq!(snapshot.current_listing().sort_mode, mode);
        assert!(snapshot.selection().contains(&2));
    }

    #[test]
    fn size_change_replaces_and_clears_selection() {
        let mut snapshot = displayed(&[1, 2, 3]);
        snapshot.select(0);
        snapshot.select(2);
        let changed = listing(&[1, 99, 3]);
        let fp = Fingerprint::of(&changed);

        let outcome = reconcile(&mut snapshot, changed, fp);
        match outcome {
            Reconciliation::Changed { listing, .. } => assert_eq!(listing.entries[1].size, 99),
            other => panic!("expected Changed, got {:?}", other),
        }
        assert!(snapshot.selection().is_empty());
        assert_eq!(snapshot.current_listing().entries[1].size, 99);
    }

    #[test]
    fn changed_carries_anchor_captured_before_install() {
        let mut snapshot = displayed(&[1, 2, 3]);
        let anchor = ViewportAnchor::new(2, Some(PathBuf::from("/d/f2")));
        snapshot.restore_scroll_state(anchor.clone());

        let changed = listing(&[1, 2]);
        let fp = Fingerprint::of(&changed);
        match reconcile(&mut snapshot, changed, fp) {
            Reconciliation::Changed { anchor: captured, .. } => assert_eq!(captured, anchor),
            other => panic!("expected Changed, got {:?}", other),
        }
    }

    #[test]
    fn first_install_is_always_changed() {
        let mut snapshot = Snapshot::default();
        let empty = Listing::empty(PathBuf::from("/d"));
        let fp = Fingerprint::of(&empty);
        assert!(reconcile(&mut snapshot, empty, fp).is_changed());
    }

    #[test]
    fn invalidated_snapshot_reports_changed() {
        let mut snapshot = displayed(&[1]);
        snapshot.invalidate();
        let same = listing(&[1]);
        let fp = Fingerprint::of(&same);
        assert!(reconcile(&mut snapshot, same, fp).is_changed());
    }
}
