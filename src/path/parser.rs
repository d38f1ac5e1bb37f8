use super::error::PathFormatError;
use crate::value::Index;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// A single step of a path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// `.name`, or a bare name at the start of the expression
    Member(String),
    /// `[index]` or `(index)`
    Index(Index),
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Member(name) => write!(f, ".{name}"),
            Accessor::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Parse a path expression into its ordered accessor steps.
///
/// ```text
/// expr     := name? accessor*
/// accessor := '.' name | '[' index ']' | '(' index ')'
/// index    := int-literal | quoted-string
/// ```
pub fn parse_accessors(expression: &str) -> Result<Vec<Accessor>, PathFormatError> {
    Scanner::new(expression).run()
}

struct Scanner<'a> {
    expression: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(expression: &'a str) -> Self {
        Self {
            expression,
            chars: expression.char_indices().peekable(),
        }
    }

    fn error(&self, position: usize, reason: impl Into<String>) -> PathFormatError {
        PathFormatError {
            expression: self.expression.to_string(),
            position,
            reason: reason.into(),
        }
    }

    fn position(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(i, _)| *i)
            .unwrap_or(self.expression.len())
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn run(mut self) -> Result<Vec<Accessor>, PathFormatError> {
        let mut steps = Vec::new();
        self.skip_whitespace();

        if matches!(self.chars.peek(), Some((_, c)) if is_name_start(*c)) {
            steps.push(Accessor::Member(self.name()?));
        }

        while let Some((pos, c)) = self.chars.next() {
            match c {
                '.' => steps.push(Accessor::Member(self.name()?)),
                '[' => steps.push(Accessor::Index(self.index(']')?)),
                '(' => steps.push(Accessor::Index(self.index(')')?)),
                c if c.is_whitespace() => {
                    self.skip_whitespace();
                    if let Some((pos, c)) = self.chars.peek().copied() {
                        return Err(self.error(pos, format!("Unexpected '{c}' after whitespace")));
                    }
                }
                _ => return Err(self.error(pos, format!("Unexpected character '{c}'"))),
            }
        }

        Ok(steps)
    }

    fn name(&mut self) -> Result<String, PathFormatError> {
        let start = self.position();
        match self.chars.peek() {
            Some((_, c)) if is_name_start(*c) => {}
            _ => return Err(self.error(start, "Expected a member name")),
        }

        let mut name = String::new();
        while let Some((_, c)) = self.chars.next_if(|(_, c)| is_name_part(*c)) {
            name.push(c);
        }
        Ok(name)
    }

    fn index(&mut self, close: char) -> Result<Index, PathFormatError> {
        self.skip_whitespace();
        let start = self.position();

        let index = match self.chars.peek().copied() {
            Some((_, quote @ ('\'' | '"'))) => {
                self.chars.next();
                let mut text = String::new();
                loop {
                    match self.chars.next() {
                        Some((_, c)) if c == quote => break,
                        Some((_, c)) => text.push(c),
                        None => return Err(self.error(start, "Unterminated string index")),
                    }
                }
                Index::Str(text)
            }
            Some((_, c)) if c.is_ascii_digit() || c == '-' || c == '+' => {
                let mut digits = String::new();
                loop {
                    let sign_allowed = digits.is_empty();
                    let next = self.chars.next_if(|(_, c)| {
                        c.is_ascii_digit() || (sign_allowed && (*c == '-' || *c == '+'))
                    });
                    match next {
                        Some((_, c)) => digits.push(c),
                        None => break,
                    }
                }
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| self.error(start, format!("Invalid integer index '{digits}'")))?;
                Index::Int(value)
            }
            Some((pos, c)) => return Err(self.error(pos, format!("Unexpected '{c}' in index"))),
            None => return Err(self.error(start, "Missing index")),
        };

        self.skip_whitespace();
        match self.chars.next() {
            Some((_, c)) if c == close => Ok(index),
            Some((pos, c)) => Err(self.error(pos, format!("Expected '{close}', found '{c}'"))),
            None => Err(self.error(self.expression.len(), format!("Expected '{close}'"))),
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
