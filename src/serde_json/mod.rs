//! Materialise JSON text into a [Serde JSON](https://github.com/serde-rs/json)
//! [`Value`] by driving the push parser with a value-building handler.

use std::ops::ControlFlow;

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::number::{parse_float, parse_int};
use crate::{JsonHandler, JsonParser, ParseError};

/// An error that can happen when parsing a byte slice into a [`Value`]
#[derive(Error, Debug)]
pub enum FromSliceError {
    /// The input is not valid JSON
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// A string or key is not valid UTF-8
    #[error("string value is not valid UTF-8")]
    InvalidUtf8,

    /// A number does not fit into an `i64` or a finite `f64`
    #[error("number cannot be represented")]
    InvalidNumber,
}

/// Convert a complete number lexeme to a JSON number, preferring `i64`.
fn to_number(lexeme: &[u8]) -> Option<Number> {
    if let Ok(i) = parse_int::<i64>(lexeme) {
        return Some(Number::from(i));
    }
    parse_float(lexeme).ok().and_then(Number::from_f64)
}

/// Builds a [`Value`] tree from parser events.
///
/// Strings, keys and numbers arrive in pieces; each kind is buffered until
/// an event proves the token complete (a separator, a container close, the
/// start of the next value, or end of input).
#[derive(Default)]
struct ValueBuilder {
    /// Open containers, each with the key it will be stored under in its
    /// parent.
    stack: Vec<(Option<String>, Value)>,

    /// A completed key waiting for its member value.
    key: Option<String>,

    /// Key bytes still arriving.
    pending_key: Option<Vec<u8>>,

    /// String value bytes still arriving.
    pending_string: Option<Vec<u8>>,

    /// Number lexeme bytes still arriving.
    pending_number: Option<Vec<u8>>,

    /// The completed top-level value.
    root: Option<Value>,

    /// Why the builder refused a callback.
    error: Option<FromSliceError>,
}

impl ValueBuilder {
    fn refuse(&mut self, error: FromSliceError) -> ControlFlow<()> {
        self.error = Some(error);
        ControlFlow::Break(())
    }

    /// Store a completed value in the innermost container, or as the root.
    fn store(&mut self, value: Value) {
        if let Some((_, container)) = self.stack.last_mut() {
            if let Some(members) = container.as_object_mut() {
                if let Some(key) = self.key.take() {
                    members.insert(key, value);
                }
            } else if let Some(elements) = container.as_array_mut() {
                elements.push(value);
            }
        } else {
            self.root = Some(value);
        }
    }

    /// Commit a finished key once its member value begins.
    fn flush_key(&mut self) -> ControlFlow<()> {
        if let Some(bytes) = self.pending_key.take() {
            match String::from_utf8(bytes) {
                Ok(key) => self.key = Some(key),
                Err(_) => return self.refuse(FromSliceError::InvalidUtf8),
            }
        }
        ControlFlow::Continue(())
    }

    /// Commit a string or number whose last piece has been delivered.
    fn flush_value(&mut self) -> ControlFlow<()> {
        if let Some(bytes) = self.pending_string.take() {
            match String::from_utf8(bytes) {
                Ok(s) => self.store(Value::String(s)),
                Err(_) => return self.refuse(FromSliceError::InvalidUtf8),
            }
        }
        if let Some(lexeme) = self.pending_number.take() {
            match to_number(&lexeme) {
                Some(n) => self.store(Value::Number(n)),
                None => return self.refuse(FromSliceError::InvalidNumber),
            }
        }
        ControlFlow::Continue(())
    }

    /// Commit whatever is still pending after end of input and hand out
    /// the root value.
    fn into_value(mut self) -> Result<Value, FromSliceError> {
        if self.flush_value().is_break() {
            return Err(self.error.take().unwrap_or(FromSliceError::InvalidNumber));
        }
        self.root
            .ok_or(FromSliceError::Parse(ParseError::UnexpectedEof))
    }
}

impl JsonHandler for ValueBuilder {
    fn on_null(&mut self) -> ControlFlow<()> {
        self.flush_key()?;
        self.store(Value::Null);
        ControlFlow::Continue(())
    }

    fn on_bool(&mut self, value: bool) -> ControlFlow<()> {
        self.flush_key()?;
        self.store(Value::Bool(value));
        ControlFlow::Continue(())
    }

    fn on_number(&mut self, lexeme: &[u8]) -> ControlFlow<()> {
        self.flush_key()?;
        self.pending_number
            .get_or_insert_with(Vec::new)
            .extend_from_slice(lexeme);
        ControlFlow::Continue(())
    }

    fn on_string(&mut self, chunk: &[u8]) -> ControlFlow<()> {
        self.flush_key()?;
        self.pending_string
            .get_or_insert_with(Vec::new)
            .extend_from_slice(chunk);
        ControlFlow::Continue(())
    }

    fn on_object_key(&mut self, chunk: &[u8]) -> ControlFlow<()> {
        self.pending_key
            .get_or_insert_with(Vec::new)
            .extend_from_slice(chunk);
        ControlFlow::Continue(())
    }

    fn on_object_start(&mut self) -> ControlFlow<()> {
        self.flush_key()?;
        let key = self.key.take();
        self.stack.push((key, Value::Object(Map::new())));
        ControlFlow::Continue(())
    }

    fn on_object_end(&mut self) -> ControlFlow<()> {
        self.flush_value()?;
        if let Some((key, value)) = self.stack.pop() {
            self.key = key;
            self.store(value);
        }
        ControlFlow::Continue(())
    }

    fn on_array_start(&mut self) -> ControlFlow<()> {
        self.flush_key()?;
        let key = self.key.take();
        self.stack.push((key, Value::Array(vec![])));
        ControlFlow::Continue(())
    }

    fn on_array_end(&mut self) -> ControlFlow<()> {
        self.flush_value()?;
        if let Some((key, value)) = self.stack.pop() {
            self.key = key;
            self.store(value);
        }
        ControlFlow::Continue(())
    }

    fn on_separator(&mut self) -> ControlFlow<()> {
        self.flush_value()
    }
}

/// Parse a byte slice into a Serde JSON [`Value`]
///
/// ```
/// use serde_json::json;
/// use pushjson::serde_json::from_slice;
///
/// let json = r#"{"name": "Elvis"}"#.as_bytes();
/// let expected = json!({
///     "name": "Elvis"
/// });
/// let actual = from_slice(json).unwrap();
/// assert_eq!(expected, actual);
/// ```
pub fn from_slice(v: &[u8]) -> Result<Value, FromSliceError> {
    let mut parser = JsonParser::new();
    let mut builder = ValueBuilder::default();

    let consumed = parser.exec(&mut builder, v);
    if let Some(error) = parser.error() {
        return Err(error.into());
    }
    if consumed < v.len() {
        // The builder refused a callback.
        return Err(builder.error.take().unwrap_or(FromSliceError::InvalidUtf8));
    }
    if !parser.finish(&mut builder) {
        return Err(parser.error().unwrap_or(ParseError::UnexpectedEof).into());
    }

    builder.into_value()
}

#[cfg(test)]
mod test {
    use serde_json::{from_slice as serde_from_slice, Value};

    use crate::serde_json::{from_slice, FromSliceError};

    /// Test that an empty object is parsed correctly
    #[test]
    fn empty_object() {
        let json = r#"{}"#.as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that a simple object is parsed correctly
    #[test]
    fn simple_object() {
        let json = r#"{"name": "Elvis"}"#.as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that an empty array is parsed correctly
    #[test]
    fn empty_array() {
        let json = r#"[]"#.as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that a simple array is parsed correctly
    #[test]
    fn simple_array() {
        let json = r#"["Elvis", "Max"]"#.as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that an array with mixed values is parsed correctly
    #[test]
    fn mixed_array() {
        let json = r#"["Elvis", 132, "Max", 80.67, true, false, null]"#.as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that embedded objects are parsed correctly
    #[test]
    fn embedded_objects() {
        let json = r#"{
            "name": "Elvis",
            "address": {"street": "Graceland", "city": "Memphis"},
            "albums": [
                "Elvis Presley",
                "Elvis",
                "Elvis' Christmas Album",
                "Elvis Is Back!",
                {
                    "title": "His Hand in Mine",
                    "year": 1960
                },
                "... and many others :)"
            ]
        }"#
        .as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that escapes and `\u00XX` sequences are decoded
    #[test]
    fn escapes() {
        let json = r#"{"tab": "a\tb", "quote": "\"", "letter": "A"}"#.as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that empty strings and keys survive materialisation
    #[test]
    fn empty_strings() {
        let json = r#"{"": ""}"#.as_bytes();
        assert_eq!(
            serde_from_slice::<Value>(json).unwrap(),
            from_slice(json).unwrap()
        );
    }

    /// Test that a top-level number is committed at end of input
    #[test]
    fn top_level_number() {
        assert_eq!(from_slice(b"42").unwrap(), Value::from(42));
        assert_eq!(from_slice(b"-2.5").unwrap(), Value::from(-2.5));
    }

    /// Test that invalid JSON is reported as a parse error
    #[test]
    fn syntax_error() {
        assert!(matches!(
            from_slice(b"{,}").unwrap_err(),
            FromSliceError::Parse(_)
        ));
        assert!(matches!(
            from_slice(b"[1,]").unwrap_err(),
            FromSliceError::Parse(_)
        ));
        assert!(matches!(
            from_slice(b"").unwrap_err(),
            FromSliceError::Parse(_)
        ));
    }

    /// Test that a string with bytes that do not form UTF-8 is refused
    #[test]
    fn invalid_utf8() {
        assert!(matches!(
            from_slice(b"\"\xff\"").unwrap_err(),
            FromSliceError::InvalidUtf8
        ));
        assert!(matches!(
            from_slice(b"{\"\xff\": 1}").unwrap_err(),
            FromSliceError::InvalidUtf8
        ));
    }

    /// Test that a number overflowing every representation is refused
    #[test]
    fn unrepresentable_number() {
        assert!(matches!(
            from_slice(b"1e999").unwrap_err(),
            FromSliceError::InvalidNumber
        ));
    }
}
