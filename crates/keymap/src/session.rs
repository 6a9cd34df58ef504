use snippet::Variables;
use std::path::{Path, PathBuf};

/// User home directory.
pub const HOME: &str = "HOME";
/// Current working directory of the terminal session.
pub const PWD: &str = "PWD";

/// Build the environment a snippet sees when fired in a session at `working_dir`.
pub fn session_environment(working_dir: &Path) -> Variables {
    let mut variables = Variables::new();
    if let Some(home) = snipterm_paths::home_dir() {
        variables.insert(HOME, home.to_string_lossy());
    }
    variables.insert(PWD, working_dir.to_string_lossy());
    variables
}

/// Decode a `file://host/path` working-directory report (OSC 7) into a path.
///
/// The host part is ignored. Returns `None` for other schemes or malformed URIs.
pub fn working_dir_from_uri(uri: &str) -> Option<PathBuf> {
    let url = url::Url::parse(uri).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    // Drop the host; `to_file_path` refuses non-local hosts.
    let local = url::Url::parse(&format!("file://{}", url.path())).ok()?;
    local.to_file_path().ok()
}

/// Tracks where a terminal session currently is.
///
/// Starts at the directory the session was launched in and follows the
/// directory reports the shell emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDirectory {
    initial: PathBuf,
    reported: Option<PathBuf>,
}

impl SessionDirectory {
    pub fn new(initial: impl Into<PathBuf>) -> Self {
        Self {
            initial: initial.into(),
            reported: None,
        }
    }

    /// Record a directory report. Returns `false` (and falls back to the
    /// initial directory) if the URI could not be decoded.
    pub fn report_uri(&mut self, uri: &str) -> bool {
        self.reported = working_dir_from_uri(uri);
        if self.reported.is_none() {
            tracing::debug!("Ignoring undecodable working directory URI: {}", uri);
        }
        self.reported.is_some()
    }

    pub fn initial(&self) -> &Path {
        &self.initial
    }

    pub fn current(&self) -> &Path {
        self.reported.as_deref().unwrap_or(self.initial.as_path())
    }

    /// Environment for a snippet fired right now.
    pub fn environment(&self) -> Variables {
        session_environment(self.current())
    }
}
