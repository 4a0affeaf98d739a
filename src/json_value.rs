use std::fmt::{self, Write};
use std::ops::Index;

use indexmap::IndexMap;
use thiserror::Error;

/// A JSON number. Whether it is an integer or a float is decided by the lexeme:
/// a decimal point makes it a float. The two are never converted into each other
/// implicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JsonNumber {
    Integer(i64),
    Float(f64),
}

impl JsonNumber {
    pub fn is_float(&self) -> bool {
        matches!(self, JsonNumber::Float(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            JsonNumber::Integer(i) => Some(*i),
            JsonNumber::Float(_) => None,
        }
    }

    /// The float payload. Integers return `None`; use [`JsonNumber::to_f64`] to widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonNumber::Integer(_) => None,
            JsonNumber::Float(f) => Some(*f),
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            JsonNumber::Integer(i) => *i as f64,
            JsonNumber::Float(f) => *f,
        }
    }
}

impl fmt::Display for JsonNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonNumber::Integer(i) => write!(f, "{i}"),
            JsonNumber::Float(x) => {
                // f64's Display drops the point for integral values ("4"), which
                // would read back as an integer.
                let s = x.to_string();
                f.write_str(&s)?;
                if x.is_finite() && !s.contains('.') {
                    f.write_str(".0")?;
                }
                Ok(())
            }
        }
    }
}

/// The members of a JSON object, in document order.
///
/// Duplicate keys are kept: `{"a": 1, "a": 2}` has two members.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonObject {
    members: Vec<(String, JsonValue)>,
}

impl JsonObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: JsonValue) {
        self.members.push((key.into(), value));
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(k, _)| k.as_str())
    }

    /// The value of the first member with this key. Later duplicates are only
    /// reachable through [`JsonObject::get_all`] or [`JsonObject::to_index_map`].
    /// Indexing a [`JsonValue`] with a `&str` goes through this method too.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.members.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// All values stored under this key, in document order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a JsonValue> + 'a {
        self.members
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// A map view where a repeated key takes the value of its last occurrence
    /// and keeps the position of its first.
    pub fn to_index_map(&self) -> IndexMap<&str, &JsonValue> {
        let mut map = IndexMap::with_capacity(self.members.len());
        for (k, v) in &self.members {
            map.insert(k.as_str(), v);
        }
        map
    }

    pub fn into_members(self) -> Vec<(String, JsonValue)> {
        self.members
    }
}

impl FromIterator<(String, JsonValue)> for JsonObject {
    fn from_iter<T: IntoIterator<Item = (String, JsonValue)>>(iter: T) -> Self {
        JsonObject {
            members: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for JsonObject {
    type Item = (String, JsonValue);
    type IntoIter = std::vec::IntoIter<(String, JsonValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl fmt::Display for JsonObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('{')?;
        for (i, (key, value)) in self.members.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write_quoted(f, key)?;
            write!(f, ": {value}")?;
        }
        f.write_char('}')
    }
}

/// A parsed JSON value. Containers own their children.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    String(String),
    Number(JsonNumber),
    Bool(bool),
    Null,
    Array(Vec<JsonValue>),
    Object(JsonObject),
}

macro_rules! is_xxx {
    ($name:ident, $variant:pat) => {
        pub fn $name(&self) -> bool {
            matches!(self, $variant)
        }
    };
}

impl JsonValue {
    is_xxx!(is_string, JsonValue::String(_));
    is_xxx!(is_number, JsonValue::Number(_));
    is_xxx!(is_bool, JsonValue::Bool(_));
    is_xxx!(is_null, JsonValue::Null);
    is_xxx!(is_array, JsonValue::Array(_));
    is_xxx!(is_object, JsonValue::Object(_));

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<JsonNumber> {
        match self {
            JsonValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(|n| n.as_i64())
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().and_then(|n| n.as_f64())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[JsonValue]> {
        match self {
            JsonValue::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&JsonObject> {
        match self {
            JsonValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            JsonValue::String(_) => "string",
            JsonValue::Number(_) => "number",
            JsonValue::Bool(_) => "bool",
            JsonValue::Null => "null",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        }
    }

    /// Renders the value as JSON-like text. Strings are quoted, with `"` and `\`
    /// escaped by a backslash. Same as the `Display` output.
    pub fn repr(&self) -> String {
        self.to_string()
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        if c == '"' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonValue::String(s) => write_quoted(f, s),
            JsonValue::Number(n) => write!(f, "{n}"),
            JsonValue::Bool(b) => write!(f, "{b}"),
            JsonValue::Null => f.write_str("null"),
            JsonValue::Array(a) => {
                f.write_char('[')?;
                for (i, value) in a.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_char(']')
            }
            JsonValue::Object(o) => write!(f, "{o}"),
        }
    }
}

/// Looks up an object member by key. With duplicate keys this is the first
/// member, as with [`JsonObject::get`].
impl<'a> Index<&'a str> for JsonValue {
    type Output = JsonValue;

    fn index(&self, key: &'a str) -> &Self::Output {
        let obj = match self {
            JsonValue::Object(o) => o,
            _ => panic!(
                "Attempted to access to an object with key '{}' but actually it was {:?}",
                key, self
            ),
        };

        match obj.get(key) {
            Some(json) => json,
            None => panic!("Key '{}' was not found in {:?}", key, self),
        }
    }
}

impl Index<usize> for JsonValue {
    type Output = JsonValue;

    fn index(&self, index: usize) -> &'_ Self::Output {
        let array = match self {
            JsonValue::Array(a) => a,
            _ => panic!(
                "Attempted to access to an array with index {} but actually the value was {:?}",
                index, self,
            ),
        };
        &array[index]
    }
}

impl From<JsonNumber> for JsonValue {
    fn from(n: JsonNumber) -> Self {
        JsonValue::Number(n)
    }
}

impl From<JsonObject> for JsonValue {
    fn from(o: JsonObject) -> Self {
        JsonValue::Object(o)
    }
}

/// Returned when a [`JsonValue`] is converted into a Rust type it does not hold.
#[derive(Error, Debug)]
#[error("Unexpected JSON value: {value}. Expected {expected} value")]
pub struct UnexpectedValue {
    pub value: JsonValue,
    pub expected: &'static str,
}

macro_rules! impl_try_from {
    ($ty:ty, $pat:pat => $val:expr) => {
        impl TryFrom<JsonValue> for $ty {
            type Error = UnexpectedValue;

            fn try_from(value: JsonValue) -> Result<$ty, UnexpectedValue> {
                match value {
                    $pat => Ok($val),
                    v => Err(UnexpectedValue {
                        value: v,
                        expected: stringify!($ty),
                    }),
                }
            }
        }
    };
}

impl_try_from!(JsonNumber, JsonValue::Number(n) => n);
impl_try_from!(i64, JsonValue::Number(JsonNumber::Integer(i)) => i);
impl_try_from!(f64, JsonValue::Number(JsonNumber::Float(f)) => f);
impl_try_from!(bool, JsonValue::Bool(b) => b);
impl_try_from!(String, JsonValue::String(s) => s);
impl_try_from!((), JsonValue::Null => ());
impl_try_from!(Vec<JsonValue>, JsonValue::Array(a) => a);
impl_try_from!(JsonObject, JsonValue::Object(o) => o);

#[cfg(test)]
mod test {
    use super::*;

    fn obj(members: Vec<(&str, JsonValue)>) -> JsonObject {
        members
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_scalar_repr() {
        assert_eq!(JsonValue::Null.repr(), "null");
        assert_eq!(JsonValue::Bool(true).repr(), "true");
        assert_eq!(JsonValue::Bool(false).repr(), "false");
        assert_eq!(JsonValue::String("hi".into()).repr(), "\"hi\"");
        assert_eq!(JsonValue::Number(JsonNumber::Integer(-5)).repr(), "-5");
        assert_eq!(JsonValue::Number(JsonNumber::Float(4.2)).repr(), "4.2");
    }

    #[test]
    fn test_integral_float_keeps_point() {
        assert_eq!(JsonNumber::Float(4.0).to_string(), "4.0");
        assert_eq!(JsonNumber::Float(-0.0).to_string(), "-0.0");
        assert_eq!(JsonNumber::Float(1e20).to_string(), "100000000000000000000.0");
    }

    #[test]
    fn test_string_escaping() {
        let v = JsonValue::String(r#"a"b\c"#.into());
        assert_eq!(v.repr(), r#""a\"b\\c""#);
    }

    #[test]
    fn test_container_repr() {
        let v = JsonValue::Array(vec![
            JsonValue::Number(JsonNumber::Integer(1)),
            JsonValue::Array(vec![]),
            JsonValue::Object(obj(vec![
                ("k", JsonValue::Null),
                ("q\"", JsonValue::Bool(true)),
            ])),
        ]);
        assert_eq!(v.repr(), r#"[1, [], {"k": null, "q\"": true}]"#);
        assert_eq!(JsonValue::Object(JsonObject::new()).repr(), "{}");
    }

    #[test]
    fn test_object_duplicate_keys() {
        let o = obj(vec![
            ("a", JsonValue::Number(JsonNumber::Integer(1))),
            ("b", JsonValue::Null),
            ("a", JsonValue::Number(JsonNumber::Integer(2))),
        ]);
        assert_eq!(o.len(), 3);
        assert_eq!(o.keys().collect::<Vec<_>>(), vec!["a", "b", "a"]);
        assert_eq!(o.get("a").and_then(JsonValue::as_i64), Some(1));
        assert_eq!(
            o.get_all("a").filter_map(JsonValue::as_i64).collect::<Vec<_>>(),
            vec![1, 2]
        );

        let map = o.to_index_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_index(0).map(|(k, _)| *k), Some("a"));
        assert_eq!(map["a"].as_i64(), Some(2));
    }

    #[test]
    fn test_index_returns_first_duplicate() {
        let v = JsonValue::Object(obj(vec![
            ("a", JsonValue::Bool(true)),
            ("a", JsonValue::Bool(false)),
        ]));
        assert_eq!(v["a"], JsonValue::Bool(true));
    }

    #[test]
    fn test_into_members() {
        let o = obj(vec![("x", JsonValue::Null), ("x", JsonValue::Bool(false))]);
        assert_eq!(
            o.into_members(),
            vec![
                ("x".to_string(), JsonValue::Null),
                ("x".to_string(), JsonValue::Bool(false)),
            ]
        );
    }

    #[test]
    fn test_number_is_float() {
        assert!(JsonNumber::Float(1.0).is_float());
        assert!(!JsonNumber::Integer(1).is_float());
    }

    #[test]
    fn test_accessors() {
        let v = JsonValue::Number(JsonNumber::Float(1.5));
        assert!(v.is_number());
        assert_eq!(v.as_f64(), Some(1.5));
        assert_eq!(v.as_i64(), None);
        assert_eq!(JsonNumber::Integer(3).to_f64(), 3.0);
        assert_eq!(JsonValue::Null.kind_name(), "null");
        assert!(JsonValue::Null.as_str().is_none());
    }

    #[test]
    fn test_index() {
        let v = JsonValue::Object(obj(vec![(
            "list",
            JsonValue::Array(vec![JsonValue::String("x".into())]),
        )]));
        assert_eq!(v["list"][0].as_str(), Some("x"));
    }

    #[test]
    #[should_panic(expected = "Key 'missing' was not found")]
    fn test_index_missing_key_panics() {
        let v = JsonValue::Object(JsonObject::new());
        let _ = &v["missing"];
    }

    #[test]
    fn test_try_from() {
        let n: i64 = JsonValue::Number(JsonNumber::Integer(7)).try_into().unwrap();
        assert_eq!(n, 7);

        let err = f64::try_from(JsonValue::Number(JsonNumber::Integer(7))).unwrap_err();
        assert_eq!(err.expected, "f64");
        assert_eq!(err.to_string(), "Unexpected JSON value: 7. Expected f64 value");

        let o = JsonObject::try_from(JsonValue::Object(JsonObject::new())).unwrap();
        assert!(o.is_empty());
    }
}
