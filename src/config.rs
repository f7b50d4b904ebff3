use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::fs::sort::{SortField, SortMode, SortOrder};

// ── Provider seam ────────────────────────────────────────────────────────────

/// Settings the listing engine reads on every scan request.
pub trait ConfigProvider {
    /// Whether names starting with `.` are listed.
    fn show_hidden(&self) -> bool;
    /// Sort mode for a given directory.
    fn sort_mode(&self, path: &Path) -> SortMode;
    /// Text color used by the renderer. Changing it forces a redraw.
    fn text_color(&self) -> String;
}

// ── Section structs ──────────────────────────────────────────────────────────

/// General settings section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Show hidden (dot) files.
    pub show_hidden: Option<bool>,
    /// Text color name or hex value passed through to the renderer.
    pub text_color: Option<String>,
}

/// Sort settings for one folder, overriding the global ones.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FolderSortConfig {
    pub field: Option<String>,
    pub descending: Option<bool>,
    pub dirs_first: Option<bool>,
}

/// Sort settings section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SortConfig {
    /// Sort field: "name", "size", "type", "modified".
    pub field: Option<String>,
    /// Reverse the field order.
    pub descending: Option<bool>,
    /// Directories always listed first.
    pub dirs_first: Option<bool>,
    /// Per-folder overrides keyed by absolute path.
    pub folders: Option<HashMap<String, FolderSortConfig>>,
}

/// Filesystem watcher settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Enable filesystem watcher for auto-refresh.
    pub enabled: Option<bool>,
    /// Debounce interval in milliseconds.
    pub debounce_ms: Option<u64>,
}

/// Periodic refresh settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RefreshConfig {
    /// Interval between timer-driven refreshes. 0 disables the timer.
    pub interval_ms: Option<u64>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub sort: SortConfig,
    pub watcher: WatcherConfig,
    pub refresh: RefreshConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
/// Default text color.
pub const DEFAULT_TEXT_COLOR: &str = "default";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does not include the CLI `--config` path; the caller passes that separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("DIRVIEW_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".dirview.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("dirview").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning logged).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config file");
            None
        }
    }
}

/// Read a config file the user named explicitly. Unlike candidate files,
/// failures here are errors.
fn load_explicit(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
    toml::from_str::<AppConfig>(&content)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
}

// ── Merge logic ──────────────────────────────────────────────────────────────

fn merge_folders(
    base: Option<HashMap<String, FolderSortConfig>>,
    over: &Option<HashMap<String, FolderSortConfig>>,
) -> Option<HashMap<String, FolderSortConfig>> {
    match (base, over) {
        (None, None) => None,
        (Some(b), None) => Some(b),
        (None, Some(o)) => Some(o.clone()),
        (Some(mut b), Some(o)) => {
            b.extend(o.iter().map(|(k, v)| (k.clone(), v.clone())));
            Some(b)
        }
    }
}

impl AppConfig {
    /// Merge `other` on top of `self`. `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                show_hidden: other.general.show_hidden.or(self.general.show_hidden),
                text_color: other
                    .general
                    .text_color
                    .clone()
                    .or(self.general.text_color),
            },
            sort: SortConfig {
                field: other.sort.field.clone().or(self.sort.field),
                descending: other.sort.descending.or(self.sort.descending),
                dirs_first: other.sort.dirs_first.or(self.sort.dirs_first),
                folders: merge_folders(self.sort.folders, &other.sort.folders),
            },
            watcher: WatcherConfig {
                enabled: other.watcher.enabled.or(self.watcher.enabled),
                debounce_ms: other.watcher.debounce_ms.or(self.watcher.debounce_ms),
            },
            refresh: RefreshConfig {
                interval_ms: other.refresh.interval_ms.or(self.refresh.interval_ms),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(
        cli_config_path: Option<&Path>,
        cli_overrides: Option<&AppConfig>,
    ) -> Result<AppConfig> {
        let mut config = AppConfig::default();

        // Walk in reverse so that highest-priority (env var) overwrites lower.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            config = config.merge(&load_explicit(cli_path)?);
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        Ok(config)
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Whether to show hidden files.
    pub fn show_hidden(&self) -> bool {
        self.general.show_hidden.unwrap_or(false)
    }

    pub fn text_color(&self) -> &str {
        self.general
            .text_color
            .as_deref()
            .unwrap_or(DEFAULT_TEXT_COLOR)
    }

    /// Whether the watcher is enabled.
    pub fn watcher_enabled(&self) -> bool {
        self.watcher.enabled.unwrap_or(true)
    }

    /// Watcher debounce interval in milliseconds.
    pub fn debounce_ms(&self) -> u64 {
        self.watcher.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    /// Timer refresh interval in milliseconds, `None` when disabled.
    pub fn refresh_interval_ms(&self) -> Option<u64> {
        self.refresh.interval_ms.filter(|ms| *ms > 0)
    }

    /// Global sort mode, ignoring folder overrides.
    pub fn default_sort_mode(&self) -> SortMode {
        SortMode {
            field: parse_field(self.sort.field.as_deref()),
            order: SortOrder::from_descending(self.sort.descending.unwrap_or(false)),
            dirs_first: self.sort.dirs_first.unwrap_or(true),
        }
    }

    /// Sort mode for `path`, applying a folder override if one matches.
    pub fn sort_mode_for(&self, path: &Path) -> SortMode {
        let mut mode = self.default_sort_mode();
        let Some(folder) = self.folder_override(path) else {
            return mode;
        };
        if folder.field.is_some() {
            mode.field = parse_field(folder.field.as_deref());
        }
        if let Some(descending) = folder.descending {
            mode.order = SortOrder::from_descending(descending);
        }
        if let Some(dirs_first) = folder.dirs_first {
            mode.dirs_first = dirs_first;
        }
        mode
    }

    fn folder_override(&self, path: &Path) -> Option<&FolderSortConfig> {
        let folders = self.sort.folders.as_ref()?;
        let key = path.to_string_lossy();
        folders
            .get(&*key)
            .or_else(|| folders.get(key.trim_end_matches('/')))
    }
}

fn parse_field(value: Option<&str>) -> SortField {
    match value {
        None => SortField::default(),
        Some(s) => SortField::parse(s).unwrap_or_else(|| {
            warn!(field = s, "unknown sort field, using name");
            SortField::default()
        }),
    }
}

impl ConfigProvider for AppConfig {
    fn show_hidden(&self) -> bool {
        AppConfig::show_hidden(self)
    }

    fn sort_mode(&self, path: &Path) -> SortMode {
        self.sort_mode_for(path)
    }

    fn text_color(&self) -> String {
        AppConfig::text_color(self).to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
