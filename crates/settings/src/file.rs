//! TOML config file support with live reload.
//!
//! Config location: `~/.config/snipterm/config.toml`

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants;

/// One key-bound snippet: a key chord and the template it types.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SnippetEntry {
    /// Key chord (e.g., "ctrl-shift-h", "<Control>F5")
    pub keys: String,
    /// Template text (e.g., "cd $HOME\\n")
    pub snippet: String,
    /// Optional human-readable label shown by `snipterm list`.
    #[serde(default)]
    pub description: Option<String>,
}

impl SnippetEntry {
    pub fn new(keys: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            keys: keys.into(),
            snippet: snippet.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// User-facing config parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Abort loading all snippets when one is malformed, instead of skipping it.
    pub strict_snippets: bool,
    /// Key-bound snippets, in file order. A later entry for the same chord wins.
    pub snippets: Vec<SnippetEntry>,
}

/// Default config file content with comments (generated on first launch).
const DEFAULT_CONFIG: &str = r#"# SnipTerm Configuration
# Running `snipterm watch` re-checks this file every time it is saved.

# Refuse to load any snippet when one of them is malformed.
# By default malformed snippets are skipped with a warning.
# strict-snippets = false

# Snippets type text into the running session when their key chord is pressed.
#
# Escapes:   \t \n \r   tab, newline, carriage return
#            \e         escape (0x1B)
#            \[         escape followed by '['
#            \^X        control character, \^C is Ctrl-C, \^@ is NUL
#            \$ \\ \' \"  the character itself
# Variables: $HOME, ${PWD}  (unknown variables expand to nothing)
#
# [[snippets]]
# keys = "ctrl-shift-h"
# snippet = "cd $HOME\n"
# description = "Go home"
#
# [[snippets]]
# keys = "ctrl-shift-e"
# snippet = "${EDITOR} .\r"
#
# [[snippets]]
# keys = "alt-c"
# snippet = "\\^C\\^Uclear\\n"
"#;

/// Return the config file path.
pub fn config_path() -> Option<PathBuf> {
    Some(snipterm_paths::config_file())
}

/// Write the default config to `path` unless a file is already there.
/// Returns whether a file was created.
pub fn ensure_config_file_at(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write default config: {:?}", path))?;
    tracing::info!("Created default config at {:?}", path);
    Ok(true)
}

/// Parse config text.
pub fn parse_config(content: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(content)
}

/// Read and parse a config file, failing on any problem.
pub fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {:?}", path))?;

    // Size guard
    if content.len() as u64 > constants::settings::MAX_FILE_SIZE {
        bail!(
            "Config file too large ({} bytes, limit {})",
            content.len(),
            constants::settings::MAX_FILE_SIZE
        );
    }

    parse_config(&content).with_context(|| format!("Failed to parse config: {:?}", path))
}

/// Load and parse a config file at `path`. Returns default on any error.
///
/// A missing file is not worth a warning; everything else is.
pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match read_config(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("{:#}, using defaults", e);
            Config::default()
        }
    }
}

/// Add or replace a snippet in the config file (preserving comments/formatting).
///
/// An existing entry with identical `keys` text is updated in place.
pub fn add_snippet(path: &Path, entry: &SnippetEntry) -> Result<()> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read config: {:?}", path)),
    };

    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("Failed to parse config: {:?}", path))?;

    let snippets = doc
        .entry("snippets")
        .or_insert(toml_edit::Item::ArrayOfTables(
            toml_edit::ArrayOfTables::new(),
        ))
        .as_array_of_tables_mut()
        .context("`snippets` must be an array of tables ([[snippets]])")?;

    let existing = snippets
        .iter_mut()
        .find(|table| table.get("keys").and_then(|k| k.as_str()) == Some(entry.keys.as_str()));

    match existing {
        Some(table) => fill_snippet_table(table, entry),
        None => {
            let mut table = toml_edit::Table::new();
            fill_snippet_table(&mut table, entry);
            snippets.push(table);
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    std::fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write config: {:?}", path))?;
    tracing::info!("Saved snippet for '{}' to {:?}", entry.keys, path);
    Ok(())
}

fn fill_snippet_table(table: &mut toml_edit::Table, entry: &SnippetEntry) {
    table["keys"] = toml_edit::value(entry.keys.as_str());
    table["snippet"] = toml_edit::value(entry.snippet.as_str());
    match &entry.description {
        Some(description) => table["description"] = toml_edit::value(description.as_str()),
        None => {
            table.remove("description");
        }
    }
}

/// Start watching `path` for changes.
/// Returns a guard that stops watching on drop.
///
/// `on_change` runs on the watcher thread with the newly parsed config, and
/// only when it differs from the previously loaded one.
pub fn watch_config_at<F>(
    path: PathBuf,
    on_change: F,
) -> Option<notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>>
where
    F: Fn(Config) + Send + 'static,
{
    use notify_debouncer_mini::new_debouncer;

    let watch_dir = path.parent()?.to_path_buf();
    let current = parking_lot::Mutex::new(load_config_from(&path));
    let path_clone = path.clone();

    let mut debouncer = new_debouncer(
        constants::watch::DEBOUNCE,
        move |res: std::result::Result<Vec<notify_debouncer_mini::DebouncedEvent>, _>| {
            let Ok(events) = res else {
                return;
            };
            // Editors often save via rename, so match on the file name only.
            if !events
                .iter()
                .any(|event| event.path.file_name() == path_clone.file_name())
            {
                return;
            }

            let new_config = load_config_from(&path_clone);
            let mut prev = current.lock();
            if new_config != *prev {
                tracing::info!("Config file changed, reloading...");
                *prev = new_config.clone();
                drop(prev);
                on_change(new_config);
            }
        },
    )
    .ok()?;

    debouncer
        .watcher()
        .watch(&watch_dir, notify::RecursiveMode::NonRecursive)
        .ok()?;

    tracing::info!("Watching config file: {:?}", path);
    Some(debouncer)
}
