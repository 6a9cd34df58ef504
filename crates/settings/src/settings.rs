//! Configuration system for SnipTerm.
//!
//! Provides compile-time limits and TOML config file support.

pub mod constants;
pub mod file;

pub use file::{
    add_snippet, config_path, ensure_config_file_at, load_config_from, parse_config, read_config,
    watch_config_at, Config, SnippetEntry,
};
