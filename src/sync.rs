//! Lock helpers that ignore poisoning.
//!
//! The presentation snapshot is replaced wholesale on every install, so a
//! panic in another holder never leaves it half-written in a way later readers
//! could trip over.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub trait IgnorePoison<T> {
    fn read_ignore_poison(&self) -> RwLockReadGuard<'_, T>;
    fn write_ignore_poison(&self) -> RwLockWriteGuard<'_, T>;
}

impl<T> IgnorePoison<T> for RwLock<T> {
    fn read_ignore_poison(&self) -> RwLockReadGuard<'_, T> {
        self.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_ignore_poison(&self) -> RwLockWriteGuard<'_, T> {
        self.write().unwrap_or_else(|e| e.into_inner())
    }
}
