use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::event::Event;

/// Watches the displayed directory (immediate children only) and sends
/// [`Event::FsChange`] for debounced changes.
pub struct FsWatcher {
    /// Directory currently watched.
    path: PathBuf,
    debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl FsWatcher {
    /// Start watching `dir`. Events are debounced by `debounce_duration`.
    pub fn new(
        dir: &Path,
        debounce_duration: Duration,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> notify::Result<Self> {
        let mut debouncer = new_debouncer(
            debounce_duration,
            move |result: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                match result {
                    Ok(events) => {
                        let paths = changed_paths(&events);
                        if !paths.is_empty() {
                            let _ = event_tx.send(Event::FsChange(paths));
                        }
                    }
                    // Non-fatal; the next refresh trigger catches up.
                    Err(e) => warn!(error = %e, "watcher error"),
                }
            },
        )?;

        debouncer.watcher().watch(dir, RecursiveMode::NonRecursive)?;
        debug!(path = %dir.display(), "watching directory");

        Ok(Self {
            path: dir.to_path_buf(),
            debouncer,
        })
    }

    /// Directory currently watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the watch to another directory.
    pub fn retarget(&mut self, dir: &Path) -> notify::Result<()> {
        if dir == self.path {
            return Ok(());
        }
        self.debouncer
            .watcher()
            .watch(dir, RecursiveMode::NonRecursive)?;
        // The old directory may already be gone; that is not an error here.
        let _ = self.debouncer.watcher().unwatch(&self.path);
        debug!(from = %self.path.display(), to = %dir.display(), "watch retargeted");
        self.path = dir.to_path_buf();
        Ok(())
    }
}

/// Paths from a debounced batch, deduplicated, in arrival order.
fn changed_paths(events: &[notify_debouncer_mini::DebouncedEvent]) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for event in events {
        if event.kind != DebouncedEventKind::Any {
            continue;
        }
        if !paths.contains(&event.path) {
            paths.push(event.path.clone());
        }
    }
    paths
}

/// Whether a change at `changed` affects the listing of `dir`.
///
/// True for `dir` itself and for its immediate children.
pub fn affects_directory(changed: &Path, dir: &Path) -> bool {
    changed == dir || changed.parent() == Some(dir)
}
