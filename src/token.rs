//! The token model shared between the external lexer and this crate's parser.
//!
//! The concrete lexer is an external collaborator (spec.md §1); this module
//! only defines the interface tokens must expose so that [`parser::Parser`](crate::parser::Parser)
//! can consume them.

use std::fmt::{self, Display};

/// The lexical category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Integer,
    Float,
    String,
    Operator,
    Open,
    Close,
    Keyword,
    Type,
    /// The expression/statement terminator, `;`.
    Terminator,
    /// End of file. The cursor synthesizes this kind once the underlying
    /// stream is exhausted; it is never produced twice with different spans.
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "an identifier",
            TokenKind::Integer => "an integer literal",
            TokenKind::Float => "a float literal",
            TokenKind::String => "a string literal",
            TokenKind::Operator => "an operator",
            TokenKind::Open => "an opening bracket",
            TokenKind::Close => "a closing bracket",
            TokenKind::Keyword => "a keyword",
            TokenKind::Type => "a type name",
            TokenKind::Terminator => "a statement terminator",
            TokenKind::Eof => "end of file",
        };
        write!(f, "{}", name)
    }
}

/// A single lexical unit. Tokens are immutable once produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Token {
        Token {
            kind,
            value: value.into(),
        }
    }

    /// The deterministic token the cursor returns once it has run past the
    /// end of the stream (spec.md §4.1).
    pub fn eof() -> Token {
        Token::new(TokenKind::Eof, "")
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} '{}'", self.kind, self.value)
        }
    }
}
