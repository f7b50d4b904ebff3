//! Refresh orchestration for one displayed directory.
//!
//! A [`Browser`] issues scan requests to blocking workers, receives their
//! results back through the event channel, drops results that were superseded
//! while in flight, and is the only caller that installs listings into the
//! shared [`Presentation`].

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::ConfigProvider;
use crate::event::Event;
use crate::fs::entry::{Entry, Listing};
use crate::fs::scanner::scan_directory;
use crate::fs::sort::{sort_listing, SortMode};
use crate::fs::watcher::affects_directory;
use crate::presentation::{Phase, Presentation, ViewportAnchor};
use crate::reconcile::{Fingerprint, Reconciliation};

/// Message shown when a delete reported failure.
pub const GENERIC_FAILURE: &str = "An unknown error occurred";

/// Everything a worker needs to produce one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    /// Monotonically increasing per browser.
    pub token: u64,
    pub path: PathBuf,
    pub show_hidden: bool,
    pub sort_mode: SortMode,
}

impl ScanRequest {
    /// Scan, sort and fingerprint. Blocking.
    pub fn run(self) -> ScanResult {
        let listing = sort_listing(scan_directory(&self.path, self.show_hidden), self.sort_mode);
        let fingerprint = Fingerprint::of(&listing);
        ScanResult {
            request: self,
            listing,
            fingerprint,
        }
    }
}

/// A finished scan on its way back to the browser.
#[derive(Debug)]
pub struct ScanResult {
    pub request: ScanRequest,
    pub listing: Listing,
    pub fingerprint: Fingerprint,
}

/// What happened to a delivered scan result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A newer request was issued after this one; result dropped.
    Stale,
    /// Same as the displayed listing; nothing redrawn.
    Unchanged,
    /// New listing installed and observer notified.
    Changed,
}

/// What activating an entry resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    NavigateInto(PathBuf),
    Open(PathBuf),
}

/// Callbacks into the rendering layer and the surrounding application.
/// All methods default to no-ops.
pub trait ViewObserver {
    /// A new listing was installed; rebuild or diff rows.
    fn on_listing_changed(&mut self, _listing: &Listing) {}

    /// The scroll position was re-applied after a listing change.
    fn on_viewport_restored(&mut self, _anchor: &ViewportAnchor) {}

    /// A directory entry was activated.
    fn on_navigate_into(&mut self, _entry: &Entry) {}

    /// A non-directory entry was activated; open it with a system viewer.
    fn on_item_activated(&mut self, _entry: &Entry) {}

    /// A collaborator reported a failure the user should see.
    fn on_operation_failed(&mut self, _message: &str) {}
}

pub struct Browser<C, O> {
    config: C,
    observer: O,
    presentation: Presentation,
    event_tx: mpsc::UnboundedSender<Event>,
    next_token: u64,
    latest: Option<ScanRequest>,
}

impl<C: ConfigProvider, O: ViewObserver> Browser<C, O> {
    pub fn new(config: C, observer: O, event_tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            config,
            observer,
            presentation: Presentation::new(),
            event_tx,
            next_token: 0,
            latest: None,
        }
    }

    /// Shared handle for readers such as the renderer.
    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Directory of the most recent request.
    pub fn current_path(&self) -> Option<&Path> {
        self.latest.as_ref().map(|r| r.path.as_path())
    }

    /// The request whose result will be accepted next.
    pub fn latest_request(&self) -> Option<&ScanRequest> {
        self.latest.as_ref()
    }

    /// Record a new request for `path`, superseding any in flight.
    pub fn request(&mut self, path: PathBuf) -> ScanRequest {
        self.next_token += 1;
        let request = ScanRequest {
            token: self.next_token,
            show_hidden: self.config.show_hidden(),
            sort_mode: self.config.sort_mode(&path),
            path,
        };
        self.latest = Some(request.clone());
        self.presentation.begin_loading();
        request
    }

    /// Scan `path` on a blocking worker. The result arrives as
    /// [`Event::ScanComplete`] and must be passed to [`Browser::apply`].
    pub fn refresh(&mut self, path: impl Into<PathBuf>) -> ScanRequest {
        let request = self.request(path.into());
        debug!(token = request.token, path = %request.path.display(), "scan requested");

        let job = request.clone();
        let tx = self.event_tx.clone();
        tokio::task::spawn_blocking(move || {
            let _ = tx.send(Event::ScanComplete(job.run()));
        });
        request
    }

    /// Re-scan the directory of the latest request, if any.
    pub fn refresh_current(&mut self) -> Option<ScanRequest> {
        let path = self.current_path()?.to_path_buf();
        Some(self.refresh(path))
    }

    /// Timer-driven refresh. Skipped while the latest scan is still running.
    pub fn refresh_if_idle(&mut self) -> Option<ScanRequest> {
        if self.presentation.phase() == Phase::Loading {
            debug!("scan in flight, skipping timed refresh");
            return None;
        }
        self.refresh_current()
    }

    /// Install a finished scan unless it was superseded.
    pub fn apply(&mut self, result: ScanResult) -> Applied {
        let is_latest = self
            .latest
            .as_ref()
            .is_some_and(|latest| latest.token == result.request.token);
        if !is_latest {
            debug!(
                token = result.request.token,
                path = %result.request.path.display(),
                "discarding stale scan result"
            );
            return Applied::Stale;
        }

        match self.presentation.reconcile(result.listing, result.fingerprint) {
            Reconciliation::Unchanged => Applied::Unchanged,
            Reconciliation::Changed { listing, anchor } => {
                self.observer.on_listing_changed(&listing);
                let restored = self.presentation.restore_scroll_state(anchor);
                self.observer.on_viewport_restored(&restored);
                Applied::Changed
            }
        }
    }

    /// Refresh if any changed path belongs to the displayed directory.
    pub fn handle_fs_change(&mut self, paths: &[PathBuf]) -> Option<ScanRequest> {
        let current = self.current_path()?;
        if !paths.iter().any(|p| affects_directory(p, current)) {
            return None;
        }
        self.refresh_current()
    }

    /// Swap in new settings. Re-scans when the hidden flag, the sort mode of
    /// the current directory or the text color changed; a text color change
    /// also forces the next result to be reported as changed.
    pub fn config_changed(&mut self, config: C) -> Option<ScanRequest> {
        let hidden_changed = config.show_hidden() != self.config.show_hidden();
        let color_changed = config.text_color() != self.config.text_color();
        let sort_changed = self
            .current_path()
            .is_some_and(|p| config.sort_mode(p) != self.config.sort_mode(p));
        self.config = config;

        if color_changed {
            self.presentation.invalidate();
        }
        if hidden_changed || sort_changed || color_changed {
            self.refresh_current()
        } else {
            None
        }
    }

    /// Forward activation of the entry at `index`.
    pub fn activate(&mut self, index: usize) -> Option<Activation> {
        let listing = self.presentation.current_listing();
        let entry = listing.get(index)?;
        if entry.is_directory {
            self.observer.on_navigate_into(entry);
            Some(Activation::NavigateInto(entry.path.clone()))
        } else {
            self.observer.on_item_activated(entry);
            Some(Activation::Open(entry.path.clone()))
        }
    }

    /// The delete collaborator finished removing `paths`.
    pub fn files_deleted(&mut self, paths: &[PathBuf]) -> Option<ScanRequest> {
        debug!(count = paths.len(), "files deleted, refreshing");
        self.refresh_current()
    }

    /// The delete collaborator reported failure. Not retried.
    pub fn deletion_failed(&mut self, reason: &str) {
        warn!(reason, "delete failed");
        self.observer.on_operation_failed(GENERIC_FAILURE);
    }

    /// The create dialog made a new file or folder.
    pub fn item_created(&mut self, path: &Path) -> Option<ScanRequest> {
        debug!(path = %path.display(), "item created, refreshing");
        self.refresh_current()
    }

    pub fn scroll_state(&self) -> ViewportAnchor {
        self.presentation.scroll_state()
    }

    pub fn restore_scroll_state(&self, anchor: ViewportAnchor) -> ViewportAnchor {
        self.presentation.restore_scroll_state(anchor)
    }
}
