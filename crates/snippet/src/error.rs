use thiserror::Error;

pub type Result<T> = std::result::Result<T, SnippetError>;

/// Compile-time diagnostics for a snippet template.
///
/// Positions count characters (not bytes) from the start of the template.
/// End-of-input errors report the template length as their position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnippetError {
    #[error("invalid control character '{character}' at position {position} of snippet '{template}'")]
    InvalidControlCharacter {
        character: char,
        position: usize,
        template: String,
    },

    #[error("invalid escape character '{character}' at position {position} of snippet '{template}'")]
    InvalidEscapeCharacter {
        character: char,
        position: usize,
        template: String,
    },

    #[error("unexpected end of snippet '{template}' after escape at position {position}")]
    UnterminatedEscape { position: usize, template: String },

    #[error("unexpected character '{character}' at position {position} of snippet '{template}', expected a variable name")]
    InvalidVariableStart {
        character: char,
        position: usize,
        template: String,
    },

    #[error("expected '}}' at position {position} of snippet '{template}'{}", found_suffix(.found))]
    UnterminatedBracedVariable {
        found: Option<char>,
        position: usize,
        template: String,
    },

    #[error("unexpected end of snippet '{template}'")]
    UnexpectedEndOfInput { position: usize, template: String },
}

fn found_suffix(found: &Option<char>) -> String {
    match found {
        Some(character) => format!(", found '{character}'"),
        None => ", found end of snippet".to_string(),
    }
}

impl SnippetError {
    /// Character index the diagnostic points at.
    pub fn position(&self) -> usize {
        match self {
            Self::InvalidControlCharacter { position, .. }
            | Self::InvalidEscapeCharacter { position, .. }
            | Self::UnterminatedEscape { position, .. }
            | Self::InvalidVariableStart { position, .. }
            | Self::UnterminatedBracedVariable { position, .. }
            | Self::UnexpectedEndOfInput { position, .. } => *position,
        }
    }

    /// The offending character, if the error was not caused by end of input.
    pub fn character(&self) -> Option<char> {
        match self {
            Self::InvalidControlCharacter { character, .. }
            | Self::InvalidEscapeCharacter { character, .. }
            | Self::InvalidVariableStart { character, .. } => Some(*character),
            Self::UnterminatedBracedVariable { found, .. } => *found,
            Self::UnterminatedEscape { .. } | Self::UnexpectedEndOfInput { .. } => None,
        }
    }

    /// The template that failed to compile.
    pub fn template(&self) -> &str {
        match self {
            Self::InvalidControlCharacter { template, .. }
            | Self::InvalidEscapeCharacter { template, .. }
            | Self::UnterminatedEscape { template, .. }
            | Self::InvalidVariableStart { template, .. }
            | Self::UnterminatedBracedVariable { template, .. }
            | Self::UnexpectedEndOfInput { template, .. } => template,
        }
    }
}
