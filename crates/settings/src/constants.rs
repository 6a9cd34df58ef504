//! Centralized configuration constants for SnipTerm.
//!
//! Organized by the component that enforces them.

/// Settings file validation limits.
pub mod settings {
    /// Maximum settings file size in bytes (64 KB).
    /// Settings files should be tiny; anything larger is suspicious.
    pub const MAX_FILE_SIZE: u64 = 64 * 1024;

    /// Maximum length for short string fields (key chords, descriptions).
    pub const MAX_STRING_LENGTH: usize = 256;
}

/// Snippet binding limits.
pub mod snippets {
    /// Maximum template length in characters.
    /// A snippet is typed into a shell; kilobytes of it is almost always a mistake.
    pub const MAX_TEMPLATE_LENGTH: usize = 4096;
}

/// Config file watching.
pub mod watch {
    use std::time::Duration;

    /// Debounce window for file system events.
    pub const DEBOUNCE: Duration = Duration::from_millis(100);
}
