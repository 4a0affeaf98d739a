//! Parses JSON text into an owned tree of [`JsonValue`]s.
//!
//! Bytes are tokenized by [`json_tree_lexer`] and assembled by a top-down parser
//! with one token of lookahead that keeps open containers on an explicit stack.
//! Objects keep their members in document order, duplicates included, and
//! numbers remember whether they were written with a decimal point.
//!
//! ```
//! use json_tree::{parse_str, JsonNumber, JsonValue};
//!
//! let value = parse_str(r#"{"a": [1, 2.5], "a": null}"#).unwrap();
//! let object = value.as_object().unwrap();
//! assert_eq!(object.len(), 2);
//! assert_eq!(value["a"][1], JsonValue::Number(JsonNumber::Float(2.5)));
//! assert_eq!(value.repr(), r#"{"a": [1, 2.5], "a": null}"#);
//! ```
//!
//! This is not a conforming JSON parser: there are no exponents, and a backslash
//! simply keeps the following byte (`\n` is the letter `n`, `\u` starts nothing).

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod json_value;
mod options;
mod parser;

pub use error::{Expected, ParseError, ParseResult, SyntaxError};
pub use json_tree_lexer::{
    tokenize, IoBytes, JsonTokenizer, LexicalError, Location, Token, TokenKind,
};
pub use json_value::{JsonNumber, JsonObject, JsonValue, UnexpectedValue};
pub use options::{ParserOptions, TopLevel, DEFAULT_MAX_DEPTH};
pub use parser::*;
