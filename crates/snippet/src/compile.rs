use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Result, SnippetError};
use crate::step::{CompiledSnippet, Step};

/// Compile a template into a reusable snippet.
///
/// Scans the template once, left to right, and stops at the first error.
pub fn compile(template: &str) -> Result<CompiledSnippet> {
    let steps = Parser::new(template).parse()?;
    tracing::trace!(template, steps = steps.len(), "compiled snippet");
    Ok(CompiledSnippet::new(steps))
}

/// Expansion of a single-character escape (`\t`, `\n`, ...).
fn escape_sequence(character: char) -> Option<&'static str> {
    Some(match character {
        't' => "\t",
        'n' => "\n",
        'r' => "\r",
        'e' => "\x1b",
        '[' => "\x1b[",
        '$' => "$",
        '\\' => "\\",
        '\'' => "'",
        '"' => "\"",
        _ => return None,
    })
}

/// Control code for `\^X`, valid for `X` in `'@'..='_'`.
fn control_code(character: char) -> Option<char> {
    let code = (character as u32).checked_sub('@' as u32)?;
    (code < 0x20).then(|| char::from(code as u8))
}

/// Character cursor that tracks positions in characters, not bytes.
struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            position: 0,
        }
    }

    /// Position of the next character (the input length once exhausted).
    fn position(&self) -> usize {
        self.position
    }

    fn next(&mut self) -> Option<(usize, char)> {
        let character = self.chars.next()?;
        let position = self.position;
        self.position += 1;
        Some((position, character))
    }

    fn next_if(&mut self, accept: impl FnOnce(char) -> bool) -> Option<char> {
        let character = self.chars.next_if(|&c| accept(c))?;
        self.position += 1;
        Some(character)
    }
}

struct Parser<'a> {
    template: &'a str,
    cursor: Cursor<'a>,
    steps: Vec<Step>,
}

impl<'a> Parser<'a> {
    fn new(template: &'a str) -> Self {
        Self {
            template,
            cursor: Cursor::new(template),
            steps: Vec::with_capacity(template.len()),
        }
    }

    fn parse(mut self) -> Result<Vec<Step>> {
        while let Some((position, character)) = self.cursor.next() {
            match character {
                '\\' => self.escape(position)?,
                '$' => self.variable()?,
                _ => self.steps.push(Step::Literal(character)),
            }
        }
        Ok(self.steps)
    }

    /// After `\`.
    fn escape(&mut self, backslash: usize) -> Result<()> {
        let Some((position, character)) = self.cursor.next() else {
            return Err(SnippetError::UnterminatedEscape {
                position: backslash,
                template: self.template.to_string(),
            });
        };

        if character == '^' {
            let Some((position, character)) = self.cursor.next() else {
                return Err(SnippetError::UnterminatedEscape {
                    position: backslash,
                    template: self.template.to_string(),
                });
            };
            let code = control_code(character).ok_or_else(|| {
                SnippetError::InvalidControlCharacter {
                    character,
                    position,
                    template: self.template.to_string(),
                }
            })?;
            self.steps.push(Step::Literal(code));
            return Ok(());
        }

        let sequence =
            escape_sequence(character).ok_or_else(|| SnippetError::InvalidEscapeCharacter {
                character,
                position,
                template: self.template.to_string(),
            })?;
        self.steps.extend(sequence.chars().map(Step::Literal));
        Ok(())
    }

    /// After `$`.
    fn variable(&mut self) -> Result<()> {
        match self.cursor.next() {
            None => Err(SnippetError::UnexpectedEndOfInput {
                position: self.cursor.position(),
                template: self.template.to_string(),
            }),
            Some((_, '{')) => self.braced_variable(),
            Some((_, first)) if first.is_alphabetic() => {
                // Running off the end here is fine: `$NAME` may close the template.
                let name = self.name(first);
                self.steps.push(Step::VariableRef(name));
                Ok(())
            }
            Some((position, character)) => Err(SnippetError::InvalidVariableStart {
                character,
                position,
                template: self.template.to_string(),
            }),
        }
    }

    /// After `${`.
    fn braced_variable(&mut self) -> Result<()> {
        let first = match self.cursor.next() {
            Some((_, first)) if first.is_alphabetic() => first,
            Some((position, character)) => {
                return Err(SnippetError::InvalidVariableStart {
                    character,
                    position,
                    template: self.template.to_string(),
                })
            }
            None => return Err(self.unterminated_brace(None, self.cursor.position())),
        };

        let name = self.name(first);
        match self.cursor.next() {
            Some((_, '}')) => {
                self.steps.push(Step::VariableRef(name));
                Ok(())
            }
            Some((position, character)) => Err(self.unterminated_brace(Some(character), position)),
            None => Err(self.unterminated_brace(None, self.cursor.position())),
        }
    }

    /// Consume the alphanumeric tail of a variable name.
    fn name(&mut self, first: char) -> String {
        let mut name = String::from(first);
        while let Some(character) = self.cursor.next_if(char::is_alphanumeric) {
            name.push(character);
        }
        name
    }

    fn unterminated_brace(&self, found: Option<char>, position: usize) -> SnippetError {
        SnippetError::UnterminatedBracedVariable {
            found,
            position,
            template: self.template.to_string(),
        }
    }
}
