pub mod entry;
pub mod scanner;
pub mod sort;
pub mod watcher;
