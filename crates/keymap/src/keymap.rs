//! Key-chord bindings for snippets.
//!
//! Parses key chords, builds the chord → snippet table from configuration,
//! and on a key event evaluates the bound snippet against the session
//! environment and feeds the result to the child process.
//! This crate has no UI dependencies; the embedding terminal translates its
//! toolkit's key events into [`KeyChord`]s and provides a [`ChildInput`].

mod chord;
mod input;
mod session;
mod table;

pub use chord::{KeyChord, KeyChordError, Modifiers};
pub use input::{ChildInput, WriterInput};
pub use session::{session_environment, working_dir_from_uri, SessionDirectory, HOME, PWD};
pub use table::{BindingError, LoadPolicy, SnippetBinding, SnippetTable};
