use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use dirview::browser::{Applied, Browser, ViewObserver};
use dirview::config::{AppConfig, GeneralConfig, SortConfig};
use dirview::error::{AppError, Result};
use dirview::event::{Event, EventHandler};
use dirview::fs::entry::{Entry, Listing};
use dirview::fs::sort::SortField;
use dirview::fs::watcher::FsWatcher;

/// List a directory, and optionally keep the listing in sync with disk.
#[derive(Parser, Debug)]
#[command(name = "dirview", version, about)]
struct Cli {
    /// Directory to list (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Explicit config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Include names starting with '.'
    #[arg(short = 'a', long)]
    show_hidden: bool,

    /// Sort field: name, size, type, modified
    #[arg(long)]
    sort: Option<String>,

    /// Reverse the sort order
    #[arg(long)]
    desc: bool,

    /// Mix directories with files instead of listing them first
    #[arg(long)]
    no_dirs_first: bool,

    /// Keep running and print the listing whenever it changes
    #[arg(long)]
    watch: bool,

    /// Disable filesystem watcher (timer refresh only)
    #[arg(long)]
    no_watcher: bool,
}

impl Cli {
    /// Config overrides derived from flags. Unset flags leave file values alone.
    fn overrides(&self) -> Result<AppConfig> {
        if let Some(field) = &self.sort {
            if SortField::parse(field).is_none() {
                return Err(AppError::Config(format!("unknown sort field '{}'", field)));
            }
        }
        Ok(AppConfig {
            general: GeneralConfig {
                show_hidden: self.show_hidden.then_some(true),
                ..Default::default()
            },
            sort: SortConfig {
                field: self.sort.clone(),
                descending: self.desc.then_some(true),
                dirs_first: self.no_dirs_first.then_some(false),
                ..Default::default()
            },
            ..Default::default()
        })
    }
}

/// Prints each installed listing to stdout.
struct PrintObserver {
    out: io::Stdout,
}

impl PrintObserver {
    fn print(&mut self, listing: &Listing) -> io::Result<()> {
        let mut out = self.out.lock();
        writeln!(
            out,
            "{} ({} entries, {})",
            listing.path.display(),
            listing.len(),
            listing.sort_mode.label()
        )?;
        for entry in &listing.entries {
            writeln!(out, "  {}", format_entry(entry))?;
        }
        out.flush()
    }
}

impl ViewObserver for PrintObserver {
    fn on_listing_changed(&mut self, listing: &Listing) {
        if let Err(e) = self.print(listing) {
            warn!(error = %e, "failed to print listing");
        }
    }

    fn on_operation_failed(&mut self, message: &str) {
        eprintln!("⚠ {}", message);
    }
}

fn format_entry(entry: &Entry) -> String {
    if entry.is_directory {
        let noun = if entry.child_count == 1 { "item" } else { "items" };
        format!("{}/  ({} {})", entry.name, entry.child_count, noun)
    } else {
        format!("{}  {}", entry.name, format_size(entry.size))
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("DIRVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let path = cli.path.canonicalize().map_err(|_| {
        AppError::InvalidPath(format!("{} does not exist", cli.path.display()))
    })?;
    if !path.is_dir() {
        return Err(AppError::InvalidPath(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()?))?;

    let tick_rate = if cli.watch {
        config.refresh_interval_ms().map(Duration::from_millis)
    } else {
        None
    };
    let mut events = EventHandler::new(tick_rate);
    let event_tx = events.sender();

    let mut watcher = if cli.watch && config.watcher_enabled() && !cli.no_watcher {
        match FsWatcher::new(
            &path,
            Duration::from_millis(config.debounce_ms()),
            event_tx.clone(),
        ) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!(error = %e, "watcher unavailable, falling back to timer refresh");
                None
            }
        }
    } else {
        None
    };

    if cli.watch {
        let quit_tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = quit_tx.send(Event::Quit);
            }
        });
    }

    let observer = PrintObserver { out: io::stdout() };
    let mut browser = Browser::new(config, observer, event_tx);
    browser.refresh(&path);

    loop {
        match events.next().await? {
            Event::ScanComplete(result) => {
                let applied = browser.apply(result);
                if !cli.watch && applied != Applied::Stale {
                    break;
                }
            }
            Event::FsChange(paths) => {
                browser.handle_fs_change(&paths);
            }
            Event::Tick => {
                browser.refresh_if_idle();
            }
            Event::Quit => break,
        }

        // Keep the watch on whatever directory is displayed.
        if let (Some(w), Some(current)) = (watcher.as_mut(), browser.current_path()) {
            if w.path() != current {
                w.retarget(current)?;
            }
        }
    }

    Ok(())
}
