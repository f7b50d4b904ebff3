use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::browser::ScanResult;
use crate::error::{AppError, Result};

/// Events driving the listing loop.
#[derive(Debug)]
pub enum Event {
    /// Periodic refresh timer fired.
    Tick,
    /// A background scan finished.
    ScanComplete(ScanResult),
    /// Filesystem change detected by watcher.
    FsChange(Vec<PathBuf>),
    /// Stop the loop.
    Quit,
}

/// Owns the event channel and the optional refresh timer task.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new EventHandler. With `tick_rate` set, a task sends
    /// [`Event::Tick`] at that interval until the receiver is dropped.
    pub fn new(tick_rate: Option<Duration>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        if let Some(rate) = tick_rate {
            let tick_tx = tx.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(rate);
                // The first tick completes immediately; the initial scan is
                // requested separately.
                interval.tick().await;
                loop {
                    interval.tick().await;
                    if tick_tx.send(Event::Tick).is_err() {
                        break;
                    }
                }
            });
        }

        Self { rx, tx }
    }

    /// Get a sender clone for scan workers, the watcher and signal handlers.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event (waits until available).
    pub async fn next(&mut self) -> Result<Event> {
        self.rx.recv().await.ok_or(AppError::ChannelClosed)
    }
}
