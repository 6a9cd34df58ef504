use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::environment::Environment;
use crate::error::SnippetError;

/// One instruction of a compiled snippet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Step {
    /// Emit exactly this character.
    Literal(char),
    /// Emit the value bound to this name, or nothing if it is unbound.
    VariableRef(String),
}

/// An immutable, ordered list of [`Step`]s produced by [`crate::compile`].
///
/// Holds no reference to any environment, so one compiled snippet can be
/// evaluated any number of times, from any thread.
///
/// Deserialized step lists are checked by recompiling their rendered
/// template, so a variable name the compiler would reject is refused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Step>", into = "Vec<Step>")]
pub struct CompiledSnippet {
    steps: Vec<Step>,
}

impl CompiledSnippet {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Distinct variable names referenced by this snippet, in first-use order.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for step in &self.steps {
            if let Step::VariableRef(name) = step {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Shorthand for [`crate::evaluate`].
    pub fn evaluate<E: Environment + ?Sized>(&self, environment: &E) -> String {
        crate::evaluate(self, environment)
    }
}

impl TryFrom<Vec<Step>> for CompiledSnippet {
    type Error = SnippetError;

    fn try_from(steps: Vec<Step>) -> Result<Self, Self::Error> {
        crate::compile(&Self::new(steps).to_string())
    }
}

impl From<CompiledSnippet> for Vec<Step> {
    fn from(snippet: CompiledSnippet) -> Self {
        snippet.steps
    }
}

impl FromStr for CompiledSnippet {
    type Err = SnippetError;

    fn from_str(template: &str) -> Result<Self, Self::Err> {
        crate::compile(template)
    }
}

/// Renders the snippet back into template syntax.
///
/// The output is canonical rather than the original text: control codes use
/// their short escape where one exists, variables are always braced, and `\`
/// and `$` are escaped. Compiling the rendered text yields an equal snippet.
impl fmt::Display for CompiledSnippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step {
                Step::Literal('\t') => f.write_str("\\t")?,
                Step::Literal('\n') => f.write_str("\\n")?,
                Step::Literal('\r') => f.write_str("\\r")?,
                Step::Literal('\x1b') => f.write_str("\\e")?,
                Step::Literal('\\') => f.write_str("\\\\")?,
                Step::Literal('$') => f.write_str("\\$")?,
                Step::Literal(c) if (*c as u32) < 0x20 => {
                    // 0x00..0x1F map onto '@'..'_'
                    let caret = char::from(*c as u8 + b'@');
                    write!(f, "\\^{caret}")?;
                }
                Step::Literal(c) => write!(f, "{c}")?,
                Step::VariableRef(name) => write!(f, "${{{name}}}")?,
            }
        }
        Ok(())
    }
}
