//! Error types for parsing JSON into a [`JsonValue`](crate::JsonValue) tree.

use std::fmt;
use std::io;

use json_tree_lexer::{LexicalError, Location, Token, TokenKind};
use thiserror::Error;

/// What the parser was looking for when it hit an unexpected token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Token(TokenKind),
    /// Any token that can start a value.
    Value,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "{kind}"),
            Expected::Value => f.write_str("a value"),
        }
    }
}

/// The token stream does not follow the JSON grammar.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("expected {expected} but found {found} at {location}")]
    UnexpectedToken {
        expected: Expected,
        found: Token,
        location: Location,
    },

    #[error("unknown keyword `{lexeme}` at {location}")]
    UnknownKeyword { lexeme: String, location: Location },

    #[error("invalid number literal `{lexeme}` at {location}")]
    InvalidNumber { lexeme: String, location: Location },

    #[error("nesting exceeds {max_depth} levels at {location}")]
    DepthExceeded { max_depth: usize, location: Location },
}

impl SyntaxError {
    pub fn location(&self) -> Location {
        match self {
            SyntaxError::UnexpectedToken { location, .. }
            | SyntaxError::UnknownKeyword { location, .. }
            | SyntaxError::InvalidNumber { location, .. }
            | SyntaxError::DepthExceeded { location, .. } => *location,
        }
    }
}

/// Any failure of a parse. No partial value is ever returned alongside it.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("lexical error: {0}")]
    Lexical(#[from] LexicalError),

    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// Where in the input the error was detected. `None` for I/O errors.
    pub fn location(&self) -> Option<Location> {
        match self {
            ParseError::Lexical(e) => Some(e.location()),
            ParseError::Syntax(e) => Some(e.location()),
            ParseError::Io(_) => None,
        }
    }
}

/// A type alias for `Result<T, ParseError>`.
pub type ParseResult<T> = Result<T, ParseError>;
