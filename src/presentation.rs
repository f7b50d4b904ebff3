//! The listing currently shown to the user, with its selection and scroll
//! position.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::fs::entry::Listing;
use crate::fs::sort::SortMode;
use crate::reconcile::{self, Fingerprint, Reconciliation};
use crate::sync::IgnorePoison;

/// Lifecycle of the displayed directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has been shown yet.
    #[default]
    Empty,
    /// A scan is in flight.
    Loading,
    /// The latest scan has been reconciled.
    Displayed,
}

/// Opaque scroll position captured across a listing replace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewportAnchor {
    first_visible: usize,
    path: Option<PathBuf>,
}

impl ViewportAnchor {
    pub fn new(first_visible: usize, path: Option<PathBuf>) -> Self {
        Self {
            first_visible,
            path,
        }
    }

    /// Anchor at row `index` of `listing`.
    pub fn at(listing: &Listing, index: usize) -> Self {
        Self::new(index, listing.get(index).map(|e| e.path.clone()))
    }

    pub fn first_visible(&self) -> usize {
        self.first_visible
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Re-anchor against `listing`: follow the anchored entry if it still
    /// exists, otherwise keep the row index clamped to the new length.
    pub fn resolve(&self, listing: &Listing) -> Self {
        if let Some(index) = self.path.as_deref().and_then(|p| listing.position(p)) {
            return Self::at(listing, index);
        }
        let index = self.first_visible.min(listing.len().saturating_sub(1));
        Self::at(listing, index)
    }
}

/// Mutable presentation state. Reached through [`Presentation`].
#[derive(Debug, Default)]
pub struct Snapshot {
    listing: Arc<Listing>,
    fingerprint: Option<Fingerprint>,
    selection: BTreeSet<usize>,
    anchor: ViewportAnchor,
    phase: Phase,
}

impl Snapshot {
    pub fn current_listing(&self) -> Arc<Listing> {
        self.listing.clone()
    }

    pub fn selection(&self) -> &BTreeSet<usize> {
        &self.selection
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint
    }

    /// Replace the displayed listing. Clears the selection.
    pub fn install(&mut self, listing: Arc<Listing>, fingerprint: Fingerprint) {
        self.listing = listing;
        self.fingerprint = Some(fingerprint);
        self.selection.clear();
        self.phase = Phase::Displayed;
    }

    pub fn begin_loading(&mut self) {
        self.phase = Phase::Loading;
    }

    pub(crate) fn mark_displayed(&mut self) {
        self.phase = Phase::Displayed;
    }

    /// Update the sort mode recorded on the displayed listing. Entries and
    /// selection are left alone.
    pub(crate) fn retag(&mut self, sort_mode: SortMode) {
        if self.listing.sort_mode != sort_mode {
            Arc::make_mut(&mut self.listing).sort_mode = sort_mode;
        }
    }

    /// Forget the displayed fingerprint so the next reconciliation replaces
    /// the listing even if nothing on disk changed.
    pub fn invalidate(&mut self) {
        self.fingerprint = None;
    }

    /// Add `index` to the selection. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) {
        if index < self.listing.len() {
            self.selection.insert(index);
        }
    }

    /// Select every index between `i` and `j` inclusive, in either order.
    ///
    /// The range is clipped to the listing; a range entirely past the end is
    /// ignored.
    pub fn select_range(&mut self, i: usize, j: usize) {
        let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
        let len = self.listing.len();
        if lo >= len {
            return;
        }
        self.selection.extend(lo..=hi.min(len - 1));
    }

    /// Toggle selection of `index`. Out-of-range indices are ignored.
    pub fn toggle(&mut self, index: usize) {
        if index >= self.listing.len() {
            return;
        }
        if !self.selection.remove(&index) {
            self.selection.insert(index);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn scroll_state(&self) -> ViewportAnchor {
        self.anchor.clone()
    }

    /// Apply `anchor` against the displayed listing and return where it landed.
    pub fn restore_scroll_state(&mut self, anchor: ViewportAnchor) -> ViewportAnchor {
        self.anchor = anchor.resolve(&self.listing);
        self.anchor.clone()
    }
}

/// A consistent copy of the snapshot taken under one lock acquisition.
#[derive(Debug, Clone)]
pub struct SnapshotView {
    pub listing: Arc<Listing>,
    pub selection: BTreeSet<usize>,
    pub anchor: ViewportAnchor,
    pub phase: Phase,
}

/// Shared handle to the presentation state.
///
/// Cloning shares the same snapshot. Every method takes the lock once, so a
/// reader never sees a listing and a selection from different installs.
#[derive(Debug, Clone, Default)]
pub struct Presentation {
    inner: Arc<RwLock<Snapshot>>,
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> SnapshotView {
        let snapshot = self.inner.read_ignore_poison();
        SnapshotView {
            listing: snapshot.listing.clone(),
            selection: snapshot.selection.clone(),
            anchor: snapshot.anchor.clone(),
            phase: snapshot.phase,
        }
    }

    pub fn current_listing(&self) -> Arc<Listing> {
        self.inner.read_ignore_poison().current_listing()
    }

    pub fn current_selection(&self) -> BTreeSet<usize> {
        self.inner.read_ignore_poison().selection.clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.read_ignore_poison().phase
    }

    /// Compare and, if different, install under a single write lock.
    pub fn reconcile(&self, listing: Listing, fingerprint: Fingerprint) -> Reconciliation {
        let mut snapshot = self.inner.write_ignore_poison();
        reconcile::reconcile(&mut snapshot, listing, fingerprint)
    }

    /// Unconditionally install `listing`, clearing the selection.
    pub fn install(&self, listing: Listing) {
        let fingerprint = Fingerprint::of(&listing);
        self.inner
            .write_ignore_poison()
            .install(Arc::new(listing), fingerprint);
    }

    pub fn begin_loading(&self) {
        self.inner.write_ignore_poison().begin_loading();
    }

    pub fn invalidate(&self) {
        self.inner.write_ignore_poison().invalidate();
    }

    pub fn select(&self, index: usize) {
        self.inner.write_ignore_poison().select(index);
    }

    pub fn select_range(&self, i: usize, j: usize) {
        self.inner.write_ignore_poison().select_range(i, j);
    }

    pub fn toggle(&self, index: usize) {
        self.inner.write_ignore_poison().toggle(index);
    }

    pub fn clear_selection(&self) {
        self.inner.write_ignore_poison().clear_selection();
    }

    pub fn scroll_state(&self) -> ViewportAnchor {
        self.inner.read_ignore_poison().scroll_state()
    }

    pub fn restore_scroll_state(&self, anchor: ViewportAnchor) -> ViewportAnchor {
        self.inner.write_ignore_poison().restore_scroll_state(anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entry::Entry;

    fn listing(names: &[&str]) -> Listing {
        let entries = names
            .iter()
            .map(|n| Entry::new(PathBuf::from("/d").join(n), false, 0, 1))
            .collect();
        Listing::new(PathBuf::from("/d"), SortMode::default(), entries)
    }

    fn presentation(names: &[&str]) -> Presentation {
        let p = Presentation::new();
        p.install(listing(names));
        p
    }

    #[test]
    fn starts_empty() {
        let p = Presentation::new();
        assert_eq!(p.phase(), Phase::Empty);
        assert!(p.current_listing().is_empty());
        assert!(p.current_selection().is_empty());
    }

    #[test]
    fn phase_transitions() {
        let p = Presentation::new();
        p.begin_loading();
        assert_eq!(p.phase(), Phase::Loading);
        p.install(listing(&["a"]));
        assert_eq!(p.phase(), Phase::Displayed);
        p.begin_loading();
        assert_eq!(p.phase(), Phase::Loading);
    }

    #[test]
    fn select_in_range() {
        let p = presentation(&["a", "b", "c"]);
        p.select(0);
        p.select(2);
        assert_eq!(p.current_selection().into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn select_out_of_range_is_noop() {
        let p = presentation(&["a", "b"]);
        p.select(2);
        p.select(100);
        assert!(p.current_selection().is_empty());
    }

    #[test]
    fn select_on_empty_listing_is_noop() {
        let p = Presentation::new();
        p.select(0);
        p.select_range(0, 3);
        p.toggle(0);
        assert!(p.current_selection().is_empty());
    }

    #[test]
    fn select_range_either_direction() {
        let p = presentation(&["a", "b", "c", "d"]);
        p.select_range(3, 1);
        assert_eq!(
            p.current_selection().into_iter().collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn select_range_clips_to_listing() {
        let p = presentation(&["a", "b", "c"]);
        p.select_range(1, 10);
        assert_eq!(p.current_selection().into_iter().collect::<Vec<_>>(), vec![1, 2]);

        p.clear_selection();
        p.select_range(5, 10);
        assert!(p.current_selection().is_empty());
    }

    #[test]
    fn toggle_adds_and_removes() {
        let p = presentation(&["a", "b"]);
        p.toggle(1);
        assert!(p.current_selection().contains(&1));
        p.toggle(1);
        assert!(p.current_selection().is_empty());
    }

    #[test]
    fn install_clears_selection() {
        let p = presentation(&["a", "b"]);
        p.select(1);
        p.install(listing(&["a"]));
        assert!(p.current_selection().is_empty());
    }

    #[test]
    fn view_is_consistent() {
        let p = presentation(&["a", "b"]);
        p.select(1);
        let view = p.view();
        assert_eq!(view.listing.len(), 2);
        assert!(view.selection.iter().all(|i| *i < view.listing.len()));
        assert_eq!(view.phase, Phase::Displayed);
    }

    #[test]
    fn concurrent_views_never_see_torn_state() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;

        let p = presentation(&["a", "b", "c", "d"]);
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let p = p.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut views = 0usize;
                while !done.load(Ordering::Relaxed) || views == 0 {
                    let view = p.view();
                    assert!(view.selection.iter().all(|i| *i < view.listing.len()));
                    views += 1;
                }
                views
            })
        };

        for round in 0..500 {
            if round % 2 == 0 {
                p.install(listing(&["a"]));
                p.select(0);
            } else {
                p.install(listing(&["a", "b", "c", "d"]));
                p.select_range(0, 3);
            }
        }
        done.store(true, Ordering::Relaxed);
        assert!(reader.join().expect("reader panicked") > 0);
    }

    #[test]
    fn anchor_follows_entry_by_path() {
        let p = presentation(&["a", "b", "c"]);
        let anchor = ViewportAnchor::at(&p.current_listing(), 2);
        p.install(listing(&["0", "a", "b", "c"]));
        let restored = p.restore_scroll_state(anchor);
        assert_eq!(restored.first_visible(), 3);
        assert_eq!(restored.path(), Some(&PathBuf::from("/d/c")));
    }

    #[test]
    fn anchor_falls_back_to_clamped_index() {
        let p = presentation(&["a", "b", "c", "d"]);
        let anchor = ViewportAnchor::at(&p.current_listing(), 3);
        p.install(listing(&["a", "b"]));
        let restored = p.restore_scroll_state(anchor);
        assert_eq!(restored.first_visible(), 1);
        assert_eq!(restored.path(), Some(&PathBuf::from("/d/b")));
    }

    #[test]
    fn anchor_on_empty_listing() {
        let p = Presentation::new();
        let restored = p.restore_scroll_state(ViewportAnchor::new(5, None));
        assert_eq!(restored.first_visible(), 0);
        assert!(restored.path().is_none());
        assert_eq!(p.scroll_state(), restored);
    }

    #[test]
    fn clones_share_state() {
        let p = presentation(&["a", "b"]);
        let reader = p.clone();
        p.select(0);
        assert!(reader.current_selection().contains(&0));
    }
}
