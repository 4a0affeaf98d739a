use std::io::Read;
use std::mem;
use std::str::FromStr;

use json_tree_lexer::{IoBytes, JsonTokenizer, Token, TokenKind};
use tracing::{debug, trace};

use crate::error::{Expected, ParseError, ParseResult, SyntaxError};
use crate::json_value::{JsonNumber, JsonObject, JsonValue};
use crate::options::{ParserOptions, TopLevel};

/// Parses a JSON document from a byte iterator into a [`JsonValue`] tree.
///
/// The grammar is parsed top-down with exactly one token of lookahead, keeping
/// open arrays and objects on a stack. Parsing stops at the first error.
pub struct JsonParser<I: Iterator<Item = u8>> {
    iter: I,
    options: ParserOptions,
}

impl<I: Iterator<Item = u8>> JsonParser<I> {
    pub fn new(iter: I) -> Self {
        Self::with_options(iter, ParserOptions::default())
    }

    pub fn with_options(iter: I, options: ParserOptions) -> Self {
        JsonParser { iter, options }
    }

    pub fn parse(self) -> ParseResult<JsonValue> {
        debug!(options = ?self.options, "parsing document");
        let result = ParserState::new(JsonTokenizer::new(self.iter), self.options)
            .and_then(|mut state| state.parse_document());
        match &result {
            Ok(value) => debug!(kind = value.kind_name(), "parsed document"),
            Err(err) => debug!(%err, "parse failed"),
        }
        result
    }
}

/// A container that has been opened but not closed yet.
enum OpenContainer {
    Array(Vec<JsonValue>),
    /// The object so far and the key whose value is being parsed.
    Object(JsonObject, String),
}

struct ParserState<I: Iterator<Item = u8>> {
    tokenizer: JsonTokenizer<I>,
    lookahead: Token,
    options: ParserOptions,
}

impl<I: Iterator<Item = u8>> ParserState<I> {
    fn new(mut tokenizer: JsonTokenizer<I>, options: ParserOptions) -> ParseResult<Self> {
        let lookahead = tokenizer.next_token()?;
        Ok(ParserState {
            tokenizer,
            lookahead,
            options,
        })
    }

    fn unexpected(&self, expected: Expected) -> ParseError {
        SyntaxError::UnexpectedToken {
            expected,
            found: self.lookahead.clone(),
            location: self.lookahead.location,
        }
        .into()
    }

    /// Consumes the lookahead if it has the expected kind and returns it.
    fn match_kind(&mut self, expected: TokenKind) -> ParseResult<Token> {
        if self.lookahead.kind != expected {
            return Err(self.unexpected(Expected::Token(expected)));
        }
        trace!(%expected, offset = self.lookahead.location.byte_offset, "match");
        let next = self.tokenizer.next_token()?;
        Ok(mem::replace(&mut self.lookahead, next))
    }

    fn parse_document(&mut self) -> ParseResult<JsonValue> {
        let mut result = self.build_value()?;
        match self.options.top_level {
            TopLevel::Single => {
                if self.lookahead.kind != TokenKind::EndOfInput {
                    return Err(self.unexpected(Expected::Token(TokenKind::EndOfInput)));
                }
            }
            TopLevel::KeepLast => {
                while self.lookahead.kind != TokenKind::EndOfInput {
                    result = self.build_value()?;
                }
            }
        }
        Ok(result)
    }

    /// Parses one complete value.
    ///
    /// Nested containers live on an explicit stack rather than the call stack,
    /// so nesting depth is bounded only by `max_depth`.
    fn build_value(&mut self) -> ParseResult<JsonValue> {
        let mut stack: Vec<OpenContainer> = Vec::new();
        loop {
            let mut value = match self.lookahead.kind {
                TokenKind::Number => {
                    let number = convert_number(&self.lookahead)?;
                    self.match_kind(TokenKind::Number)?;
                    JsonValue::Number(number)
                }
                TokenKind::String => JsonValue::String(self.match_kind(TokenKind::String)?.lexeme),
                TokenKind::Keyword => {
                    let value = keyword_value(&self.lookahead.lexeme).ok_or_else(|| {
                        SyntaxError::UnknownKeyword {
                            lexeme: self.lookahead.lexeme.clone(),
                            location: self.lookahead.location,
                        }
                    })?;
                    self.match_kind(TokenKind::Keyword)?;
                    value
                }
                TokenKind::ArrayOpen => {
                    self.check_depth(stack.len())?;
                    self.match_kind(TokenKind::ArrayOpen)?;
                    if self.lookahead.kind != TokenKind::ArrayClose {
                        stack.push(OpenContainer::Array(Vec::new()));
                        continue;
                    }
                    self.match_kind(TokenKind::ArrayClose)?;
                    JsonValue::Array(Vec::new())
                }
                TokenKind::ObjectOpen => {
                    self.check_depth(stack.len())?;
                    self.match_kind(TokenKind::ObjectOpen)?;
                    if self.lookahead.kind != TokenKind::ObjectClose {
                        let key = self.parse_member_key()?;
                        stack.push(OpenContainer::Object(JsonObject::new(), key));
                        continue;
                    }
                    self.match_kind(TokenKind::ObjectClose)?;
                    JsonValue::Object(JsonObject::new())
                }
                TokenKind::Comma
                | TokenKind::Colon
                | TokenKind::ObjectClose
                | TokenKind::ArrayClose
                | TokenKind::EndOfInput => return Err(self.unexpected(Expected::Value)),
            };

            // Hand the finished value to its parent. Close every container that
            // ends here; stop at a comma, where the next element starts.
            loop {
                let Some(parent) = stack.pop() else {
                    return Ok(value);
                };
                match parent {
                    OpenContainer::Array(mut elements) => {
                        elements.push(value);
                        if self.lookahead.kind == TokenKind::Comma {
                            self.match_kind(TokenKind::Comma)?;
                            stack.push(OpenContainer::Array(elements));
                            break;
                        }
                        self.match_kind(TokenKind::ArrayClose)?;
                        value = JsonValue::Array(elements);
                    }
                    OpenContainer::Object(mut object, key) => {
                        object.push(key, value);
                        if self.lookahead.kind == TokenKind::Comma {
                            self.match_kind(TokenKind::Comma)?;
                            let key = self.parse_member_key()?;
                            stack.push(OpenContainer::Object(object, key));
                            break;
                        }
                        self.match_kind(TokenKind::ObjectClose)?;
                        value = JsonValue::Object(object);
                    }
                }
            }
        }
    }

    /// Fails if opening another container would exceed `max_depth`.
    fn check_depth(&self, open_containers: usize) -> ParseResult<()> {
        if open_containers >= self.options.max_depth {
            return Err(SyntaxError::DepthExceeded {
                max_depth: self.options.max_depth,
                location: self.lookahead.location,
            }
            .into());
        }
        Ok(())
    }

    /// `STRING ':'` at the start of an object member.
    fn parse_member_key(&mut self) -> ParseResult<String> {
        let key = self.match_kind(TokenKind::String)?.lexeme;
        self.match_kind(TokenKind::Colon)?;
        Ok(key)
    }
}

fn keyword_value(lexeme: &str) -> Option<JsonValue> {
    match lexeme {
        "null" => Some(JsonValue::Null),
        "true" => Some(JsonValue::Bool(true)),
        "false" => Some(JsonValue::Bool(false)),
        _ => None,
    }
}

fn convert_number(token: &Token) -> Result<JsonNumber, SyntaxError> {
    let invalid = || SyntaxError::InvalidNumber {
        lexeme: token.lexeme.clone(),
        location: token.location,
    };
    if token.is_float {
        match token.lexeme.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(JsonNumber::Float(f)),
            _ => Err(invalid()),
        }
    } else {
        token
            .lexeme
            .parse::<i64>()
            .map(JsonNumber::Integer)
            .map_err(|_| invalid())
    }
}

/// Parses a document held in a string.
pub fn parse_str(s: &str) -> ParseResult<JsonValue> {
    JsonParser::new(s.bytes()).parse()
}

/// Parses a document held in a byte slice. String contents must be UTF-8.
pub fn parse_bytes(bytes: &[u8]) -> ParseResult<JsonValue> {
    JsonParser::new(bytes.iter().copied()).parse()
}

/// Parses a document from any reader. An I/O error takes precedence over the
/// parse error it most likely caused.
pub fn parse_reader<R: Read>(reader: R, options: ParserOptions) -> ParseResult<JsonValue> {
    let mut bytes = IoBytes::new(reader);
    let result = JsonParser::with_options(&mut bytes, options).parse();
    match bytes.take_error() {
        Some(err) => Err(ParseError::Io(err)),
        None => result,
    }
}

impl FromStr for JsonValue {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_str(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::options::DEFAULT_MAX_DEPTH;
    use json_tree_lexer::LexicalError;

    fn syntax_err(s: &str) -> SyntaxError {
        match parse_str(s) {
            Err(ParseError::Syntax(e)) => e,
            other => panic!("expected a syntax error for {s:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_scalars() {
        assert_eq!(parse_str("42").unwrap(), JsonValue::Number(JsonNumber::Integer(42)));
        assert_eq!(parse_str("-5").unwrap(), JsonValue::Number(JsonNumber::Integer(-5)));
        assert_eq!(parse_str("4.2").unwrap(), JsonValue::Number(JsonNumber::Float(4.2)));
        assert_eq!(parse_str("true").unwrap(), JsonValue::Bool(true));
        assert_eq!(parse_str("false").unwrap(), JsonValue::Bool(false));
        assert_eq!(parse_str("null").unwrap(), JsonValue::Null);
        assert_eq!(parse_str(r#""s""#).unwrap(), JsonValue::String("s".into()));
    }

    #[test]
    fn test_basic() {
        let v = parse_str(r#"{"propertyKey": 1234, "arr": [], "obj": {}, "arr2": [null, false, true, -0.54] }"#)
            .unwrap();
        let o = v.as_object().unwrap();
        assert_eq!(o.len(), 4);
        assert_eq!(v["propertyKey"].as_i64(), Some(1234));
        assert!(v["arr"].as_array().unwrap().is_empty());
        assert!(v["obj"].as_object().unwrap().is_empty());
        assert_eq!(v["arr2"][3].as_f64(), Some(-0.54));
    }

    #[test]
    fn test_unknown_keyword() {
        let err = syntax_err("nul");
        assert!(matches!(err, SyntaxError::UnknownKeyword { ref lexeme, .. } if lexeme == "nul"));
        assert!(matches!(syntax_err("[True]"), SyntaxError::UnknownKeyword { .. }));
    }

    #[test]
    fn test_invalid_numbers() {
        for s in ["-", "1.2.3", "99999999999999999999", "[-]"] {
            assert!(
                matches!(syntax_err(s), SyntaxError::InvalidNumber { .. }),
                "{s}"
            );
        }
    }

    #[test]
    fn test_missing_close_bracket() {
        let err = syntax_err("[1,2");
        match &err {
            SyntaxError::UnexpectedToken {
                expected, found, ..
            } => {
                assert_eq!(*expected, Expected::Token(TokenKind::ArrayClose));
                assert_eq!(found.kind, TokenKind::EndOfInput);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(err.location().byte_offset, 4);
        assert_eq!(
            err.to_string(),
            "expected ArrayClose but found Token { lexeme: ``, kind: EndOfInput } at byte offset 4 (line:0, col:4)"
        );
    }

    #[test]
    fn test_trailing_comma() {
        let err = syntax_err("[1,]");
        assert!(matches!(
            err,
            SyntaxError::UnexpectedToken {
                expected: Expected::Value,
                found: Token {
                    kind: TokenKind::ArrayClose,
                    ..
                },
                ..
            }
        ));
        assert!(matches!(
            syntax_err(r#"{"a": 1,}"#),
            SyntaxError::UnexpectedToken {
                expected: Expected::Token(TokenKind::String),
                ..
            }
        ));
    }

    #[test]
    fn test_object_errors() {
        assert!(matches!(
            syntax_err(r#"{"a" 1}"#),
            SyntaxError::UnexpectedToken {
                expected: Expected::Token(TokenKind::Colon),
                ..
            }
        ));
        assert!(matches!(
            syntax_err("{1: 2}"),
            SyntaxError::UnexpectedToken {
                expected: Expected::Token(TokenKind::String),
                ..
            }
        ));
        assert!(matches!(
            syntax_err(r#"{"a": 1 "b": 2}"#),
            SyntaxError::UnexpectedToken {
                expected: Expected::Token(TokenKind::ObjectClose),
                ..
            }
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            syntax_err("  "),
            SyntaxError::UnexpectedToken {
                expected: Expected::Value,
                ..
            }
        ));
    }

    #[test]
    fn test_single_top_level_value() {
        assert!(matches!(
            syntax_err("1 2"),
            SyntaxError::UnexpectedToken {
                expected: Expected::Token(TokenKind::EndOfInput),
                ..
            }
        ));
        assert!(matches!(
            syntax_err("[1]]"),
            SyntaxError::UnexpectedToken {
                expected: Expected::Token(TokenKind::EndOfInput),
                ..
            }
        ));
    }

    #[test]
    fn test_keep_last_top_level_value() {
        let options = ParserOptions::strict().with_top_level(TopLevel::KeepLast);
        let v = JsonParser::with_options("1 [2] {\"a\": 3}".bytes(), options)
            .parse()
            .unwrap();
        assert_eq!(v["a"].as_i64(), Some(3));

        let err = JsonParser::with_options("".bytes(), options).parse().unwrap_err();
        assert!(matches!(err, ParseError::Syntax(_)));
    }

    #[test]
    fn test_lexical_errors_propagate() {
        assert!(matches!(
            parse_str(r#"["open"#),
            Err(ParseError::Lexical(_))
        ));
        assert!(matches!(parse_str("[1, ?]"), Err(ParseError::Lexical(_))));
    }

    #[test]
    fn test_depth_limit() {
        let options = ParserOptions::strict().with_max_depth(3);
        assert!(JsonParser::with_options("[[[1]]]".bytes(), options).parse().is_ok());
        let err = JsonParser::with_options(r#"[[{"a": [1]}]]"#.bytes(), options)
            .parse()
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::Syntax(SyntaxError::DepthExceeded { max_depth: 3, .. })
        ));
    }

    #[test]
    fn test_depth_resets_between_siblings() {
        let options = ParserOptions::strict().with_max_depth(2);
        assert!(JsonParser::with_options("[[1], [2], {}, [3]]".bytes(), options)
            .parse()
            .is_ok());
    }

    fn nested_arrays(depth: usize) -> String {
        "[".repeat(depth) + &"]".repeat(depth)
    }

    fn array_depth(mut value: &JsonValue) -> usize {
        let mut depth = 0;
        while let JsonValue::Array(elements) = value {
            depth += 1;
            match elements.first() {
                Some(first) => value = first,
                None => break,
            }
        }
        depth
    }

    #[test]
    fn test_default_depth() {
        let v = parse_str(&nested_arrays(DEFAULT_MAX_DEPTH)).unwrap();
        assert_eq!(array_depth(&v), DEFAULT_MAX_DEPTH);
        assert!(matches!(
            parse_str(&nested_arrays(DEFAULT_MAX_DEPTH + 1)),
            Err(ParseError::Syntax(SyntaxError::DepthExceeded { max_depth: DEFAULT_MAX_DEPTH, .. }))
        ));
    }

    #[test]
    fn test_lenient_depth_on_small_stack() {
        // Nesting is not limited by the call stack: the deepest document the
        // lenient preset accepts parses on a 2 MiB thread.
        let max_depth = ParserOptions::lenient().max_depth;
        let depth = std::thread::Builder::new()
            .stack_size(2 << 20)
            .spawn(move || {
                let v = JsonParser::with_options(
                    nested_arrays(max_depth).bytes(),
                    ParserOptions::lenient(),
                )
                .parse()
                .unwrap();
                array_depth(&v)
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(depth, max_depth);

        let err = JsonParser::with_options(
            nested_arrays(max_depth + 1).bytes(),
            ParserOptions::lenient(),
        )
        .parse()
        .unwrap_err();
        assert!(matches!(
            err,
            ParseError::Syntax(SyntaxError::DepthExceeded { .. })
        ));
    }

    #[test]
    fn test_lenient_keeps_last_value() {
        let v = JsonParser::with_options("{} [1] 2.5".bytes(), ParserOptions::lenient())
            .parse()
            .unwrap();
        assert_eq!(v, JsonValue::Number(JsonNumber::Float(2.5)));
    }

    #[test]
    fn test_nested_objects_and_arrays() {
        let v = parse_str(r#"{"a": {"b": [{}, [], {"c": [1, {"d": null}]}]}, "e": 2}"#).unwrap();
        assert_eq!(v["a"]["b"][2]["c"][1]["d"], JsonValue::Null);
        assert_eq!(v["e"].as_i64(), Some(2));
        assert_eq!(
            v.repr(),
            r#"{"a": {"b": [{}, [], {"c": [1, {"d": null}]}]}, "e": 2}"#
        );
    }

    #[test]
    fn test_parse_bytes() {
        let v = parse_bytes(b"[\"caf\xc3\xa9\", 1]").unwrap();
        assert_eq!(v[0].as_str(), Some("caf\u{e9}"));

        let err = parse_bytes(b"[\"\xff\xfe\"]").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Lexical(LexicalError::InvalidUtf8 { .. })
        ));
        assert_eq!(err.location().map(|l| l.byte_offset), Some(1));
    }

    #[test]
    fn test_from_str() {
        let v: JsonValue = "[1, 2.5]".parse().unwrap();
        assert_eq!(v.repr(), "[1, 2.5]");
    }

    #[test]
    fn test_parse_reader() {
        let v = parse_reader(&br#"{"k": [true]}"#[..], ParserOptions::default()).unwrap();
        assert_eq!(v["k"][0], JsonValue::Bool(true));
    }
}
