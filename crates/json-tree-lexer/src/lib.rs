//! Pull-based tokenizer for JSON text. Bytes go in through any `Iterator<Item = u8>`,
//! [`Token`]s come out of [`JsonTokenizer::next_token`].
//!
//! The tokenizer is deliberately small: a backslash in the input escapes the single
//! byte after it (so `\"` keeps a string open), numbers are runs of digits and
//! decimal points, and keywords are runs of ASCII letters. Deciding whether a
//! keyword or number is actually valid is left to the parser.
//!
//! ```
//! use json_tree_lexer::{JsonTokenizer, TokenKind};
//!
//! # fn main() {
//!     let s = r#"{"key1": 1234, "key2": [true]}"#;
//!     let mut tokenizer = JsonTokenizer::new(s.bytes());
//!     assert_eq!(tokenizer.next_token().unwrap().kind, TokenKind::ObjectOpen);
//!     let key = tokenizer.next_token().unwrap();
//!     assert_eq!(key.kind, TokenKind::String);
//!     assert_eq!(key.lexeme, "key1");
//!     assert_eq!(tokenizer.next_token().unwrap().kind, TokenKind::Colon);
//!     assert_eq!(tokenizer.next_token().unwrap().lexeme, "1234");
//! # }
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod reader;
mod tokenizer;

pub use reader::*;
pub use tokenizer::*;
