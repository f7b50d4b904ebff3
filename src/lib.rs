//! Directory listing engine.
//!
//! Scans one directory off the caller's loop, sorts it, and reconciles the
//! result against what is currently displayed so unchanged refreshes cost no
//! redraw.

pub mod browser;
pub mod config;
pub mod error;
pub mod event;
pub mod fs;
pub mod presentation;
pub mod reconcile;
mod sync;

pub use browser::{Applied, Browser, ViewObserver};
pub use config::{AppConfig, ConfigProvider};
pub use fs::entry::{Entry, Listing};
pub use fs::sort::{SortField, SortMode, SortOrder};
pub use presentation::{Presentation, ViewportAnchor};
