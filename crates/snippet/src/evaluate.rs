use crate::environment::Environment;
use crate::step::{CompiledSnippet, Step};

/// Produce the text a snippet expands to under `environment`.
///
/// Unbound variables expand to nothing. Never fails and has no side effects.
pub fn evaluate<E: Environment + ?Sized>(snippet: &CompiledSnippet, environment: &E) -> String {
    let mut output = String::with_capacity(snippet.len());
    for step in snippet.steps() {
        match step {
            Step::Literal(character) => output.push(*character),
            Step::VariableRef(name) => {
                if let Some(value) = environment.lookup(name) {
                    output.push_str(&value);
                }
            }
        }
    }
    output
}
