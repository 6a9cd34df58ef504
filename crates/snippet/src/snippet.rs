//! Snippet compiler for key-bound terminal input.
//!
//! A snippet is a short template such as `cd $PWD\n` or `\e[A`. It is compiled
//! once with [`compile`] into an immutable [`CompiledSnippet`], then evaluated
//! against an [`Environment`] every time its key chord fires. Evaluation is a
//! pure function of the compiled steps and the environment; all errors are
//! reported at compile time.
//!
//! Template grammar:
//!
//! | Form        | Output                                              |
//! |-------------|-----------------------------------------------------|
//! | `\t \n \r`  | TAB, LF, CR                                         |
//! | `\e`        | ESC (0x1B)                                          |
//! | `\[`        | ESC followed by `[`                                 |
//! | `\$ \\ \' \"` | the character itself                              |
//! | `\^X`       | control code `X - '@'` (`\^@` .. `\^_`)             |
//! | `${NAME}`   | value of `NAME`, empty if unbound                   |
//! | `$NAME`     | same, name ends at the first non-alphanumeric char  |

mod compile;
mod environment;
mod error;
mod evaluate;
mod step;

pub use compile::compile;
pub use environment::{from_fn, Environment, FromFn, Variables};
pub use error::{Result, SnippetError};
pub use evaluate::evaluate;
pub use step::{CompiledSnippet, Step};
