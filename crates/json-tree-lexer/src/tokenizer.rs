use std::fmt;

use smallvec::SmallVec;
use thiserror::Error;
use tracing::trace;

use crate::reader::{CharReader, Location, ReadChar};

/// The lexical class of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    String,
    Keyword,
    Comma,
    Colon,
    ObjectOpen,
    ObjectClose,
    ArrayOpen,
    ArrayClose,
    EndOfInput,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Number => "Number",
            TokenKind::String => "String",
            TokenKind::Keyword => "Keyword",
            TokenKind::Comma => "Comma",
            TokenKind::Colon => "Colon",
            TokenKind::ObjectOpen => "ObjectOpen",
            TokenKind::ObjectClose => "ObjectClose",
            TokenKind::ArrayOpen => "ArrayOpen",
            TokenKind::ArrayClose => "ArrayClose",
            TokenKind::EndOfInput => "EndOfInput",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A JSON token.
///
/// `lexeme` is the raw text the token was made from. For strings the surrounding
/// quotes are not part of the lexeme and escapes have already been collapsed.
/// `is_float` is set on number tokens whose lexeme contains a decimal point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub lexeme: String,
    pub kind: TokenKind,
    pub is_float: bool,
    pub location: Location,
}

impl Token {
    fn new(lexeme: String, kind: TokenKind, location: Location) -> Self {
        Token {
            lexeme,
            kind,
            is_float: false,
            location,
        }
    }

    fn end_of_input(location: Location) -> Self {
        Token::new(String::new(), TokenKind::EndOfInput, location)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token {{ lexeme: `{}`, kind: {} }}", self.lexeme, self.kind)
    }
}

/// Errors produced while turning bytes into tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexicalError {
    #[error("unexpected byte {byte:#x} at {location}")]
    UnexpectedByte { byte: u8, location: Location },

    #[error("unterminated string starting at {location}")]
    UnterminatedString { location: Location },

    #[error("invalid UTF-8 in string starting at {location}")]
    InvalidUtf8 { location: Location },
}

impl LexicalError {
    /// Where the offending token (or byte) started.
    pub fn location(&self) -> Location {
        match self {
            LexicalError::UnexpectedByte { location, .. }
            | LexicalError::UnterminatedString { location }
            | LexicalError::InvalidUtf8 { location } => *location,
        }
    }
}

/// A type alias for `Result<T, LexicalError>`.
pub type LexResult<T> = Result<T, LexicalError>;

// Matches C's isspace(), which includes vertical tab and form feed.
fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

fn structural_kind(c: u8) -> Option<TokenKind> {
    match c {
        b'{' => Some(TokenKind::ObjectOpen),
        b'}' => Some(TokenKind::ObjectClose),
        b'[' => Some(TokenKind::ArrayOpen),
        b']' => Some(TokenKind::ArrayClose),
        b',' => Some(TokenKind::Comma),
        b':' => Some(TokenKind::Colon),
        _ => None,
    }
}

fn could_be_number_start(c: u8) -> bool {
    c.is_ascii_digit() || c == b'-'
}

fn could_be_number_internal(c: u8) -> bool {
    c.is_ascii_digit() || c == b'.'
}

// Number and keyword lexemes only ever hold ASCII bytes.
fn ascii_lexeme(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// A pull-based tokenizer which takes an iterator over bytes and emits [`Token`]s.
///
/// End of input between tokens is not an error: it produces a token of kind
/// [`TokenKind::EndOfInput`], and keeps producing it on every further call.
pub struct JsonTokenizer<I: Iterator<Item = u8>> {
    reader: CharReader<I>,
    finished: bool,
}

impl<I: Iterator<Item = u8>> JsonTokenizer<I> {
    /// Create a new [`JsonTokenizer`]
    pub fn new(it: I) -> Self {
        JsonTokenizer {
            reader: CharReader::new(it),
            finished: false,
        }
    }

    /// The location of the next unread character.
    pub fn location(&self) -> Location {
        self.reader.location()
    }

    fn skip_whitespace(&mut self) -> Option<(ReadChar, Location)> {
        loop {
            let location = self.reader.location();
            let c = self.reader.read()?;
            if !is_whitespace(c.byte) {
                return Some((c, location));
            }
        }
    }

    fn consume_number(&mut self, first: u8, location: Location) -> Token {
        let mut s = SmallVec::<[u8; 16]>::new();
        s.push(first);
        let mut is_float = false;

        while let Some(c) = self.reader.read() {
            if !could_be_number_internal(c.byte) {
                self.reader.push_back(c);
                break;
            }
            if c.byte == b'.' {
                is_float = true;
            }
            s.push(c.byte);
        }

        let mut token = Token::new(ascii_lexeme(&s), TokenKind::Number, location);
        token.is_float = is_float;
        token
    }

    fn consume_string(&mut self, location: Location) -> LexResult<Token> {
        let mut s = SmallVec::<[u8; 32]>::new();
        loop {
            match self.reader.read() {
                None => return Err(LexicalError::UnterminatedString { location }),
                Some(ReadChar {
                    byte: b'"',
                    escaped: false,
                }) => break,
                Some(c) => s.push(c.byte),
            }
        }

        let lexeme = String::from_utf8(s.into_vec())
            .map_err(|_| LexicalError::InvalidUtf8 { location })?;
        Ok(Token::new(lexeme, TokenKind::String, location))
    }

    fn consume_keyword(&mut self, first: u8, location: Location) -> Token {
        let mut s = SmallVec::<[u8; 8]>::new();
        s.push(first);

        while let Some(c) = self.reader.read() {
            if !c.byte.is_ascii_alphabetic() {
                self.reader.push_back(c);
                break;
            }
            s.push(c.byte);
        }

        Token::new(ascii_lexeme(&s), TokenKind::Keyword, location)
    }

    /// Reads the next token, or an error if the input cannot be tokenized.
    pub fn next_token(&mut self) -> LexResult<Token> {
        let Some((c, location)) = self.skip_whitespace() else {
            let token = Token::end_of_input(self.reader.location());
            trace!(%token, "end of input");
            return Ok(token);
        };

        let token = if let Some(kind) = structural_kind(c.byte) {
            Token::new(ascii_lexeme(&[c.byte]), kind, location)
        } else if could_be_number_start(c.byte) {
            self.consume_number(c.byte, location)
        } else if c.byte == b'"' {
            self.consume_string(location)?
        } else if c.byte.is_ascii_alphabetic() {
            self.consume_keyword(c.byte, location)
        } else {
            return Err(LexicalError::UnexpectedByte {
                byte: c.byte,
                location,
            });
        };

        trace!(%token, offset = location.byte_offset, "token");
        Ok(token)
    }
}

/// Yields tokens up to and including [`TokenKind::EndOfInput`], or up to the
/// first error.
impl<I: Iterator<Item = u8>> Iterator for JsonTokenizer<I> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        self.finished = match &result {
            Ok(token) => token.kind == TokenKind::EndOfInput,
            Err(_) => true,
        };
        Some(result)
    }
}

/// Tokenizes a whole string. The returned tokens end with an
/// [`TokenKind::EndOfInput`] token.
pub fn tokenize(s: &str) -> LexResult<Vec<Token>> {
    JsonTokenizer::new(s.bytes()).collect()
}
