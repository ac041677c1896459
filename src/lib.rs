//! # pushjson
//!
//! An incremental, push-based JSON parser.
//!
//! Feed the parser arbitrarily sized chunks of JSON text with
//! [`JsonParser::exec()`] and receive events through a [`JsonHandler`]
//! implementation as tokens are recognised. The parser owns nothing but its
//! syntactic state: strings, keys and numbers are handed out as slices
//! borrowing from the caller's input buffer, and value materialisation is
//! entirely up to the handler.
//!
//! ## Examples
//!
//! ### Collecting values
//!
//! Implement [`JsonHandler`] for the type that consumes the events. Only
//! the events you care about need to be overridden.
//!
//! ```
//! use std::ops::ControlFlow;
//!
//! use pushjson::{JsonHandler, JsonParser};
//!
//! #[derive(Default)]
//! struct Numbers {
//!     lexemes: Vec<String>,
//! }
//!
//! impl JsonHandler for Numbers {
//!     fn on_number(&mut self, lexeme: &[u8]) -> ControlFlow<()> {
//!         self.lexemes
//!             .push(String::from_utf8_lossy(lexeme).into_owned());
//!         ControlFlow::Continue(())
//!     }
//! }
//!
//! let json = b"[1, 2.5, -3e2]";
//!
//! let mut numbers = Numbers::default();
//! let mut parser = JsonParser::new();
//! assert_eq!(parser.exec(&mut numbers, json), json.len());
//! assert!(parser.finish(&mut numbers));
//!
//! assert_eq!(numbers.lexemes, vec!["1", "2.5", "-3e2"]);
//! ```
//!
//! ### Chunked input
//!
//! Chunk boundaries are invisible in the aggregated output: a token that
//! straddles two chunks is delivered as multiple slices that concatenate
//! to the whole token.
//!
//! ```
//! use std::ops::ControlFlow;
//!
//! use pushjson::{JsonHandler, JsonParser};
//!
//! #[derive(Default)]
//! struct Text {
//!     bytes: Vec<u8>,
//! }
//!
//! impl JsonHandler for Text {
//!     fn on_string(&mut self, chunk: &[u8]) -> ControlFlow<()> {
//!         self.bytes.extend_from_slice(chunk);
//!         ControlFlow::Continue(())
//!     }
//! }
//!
//! let mut text = Text::default();
//! let mut parser = JsonParser::new();
//! for chunk in [&br#"["he"#[..], br#"llo"]"#] {
//!     assert_eq!(parser.exec(&mut text, chunk), chunk.len());
//! }
//! assert!(parser.finish(&mut text));
//!
//! assert_eq!(text.bytes, b"hello");
//! ```
//!
//! ### Parsing into a Serde JSON Value
//!
//! For testing and compatibility reasons, pushjson is able to parse a byte
//! slice into a [Serde JSON](https://github.com/serde-rs/json) Value.
//!
//! Heads up: You need to enable the `serde_json` feature for this.
//!
//! ```
//! # #[cfg(feature = "serde_json")] {
//! use pushjson::serde_json::from_slice;
//!
//! let json = r#"{"name": "Elvis"}"#.as_bytes();
//! let value = from_slice(json).unwrap();
//!
//! assert!(value.is_object());
//! assert_eq!(value["name"], "Elvis");
//! # }
//! ```
//!
//! However, if you find yourself doing this, you probably don't need an
//! incremental parser and your data seems to completely fit into memory.
//! In this case, you're most likely better off using Serde JSON directly.

mod handler;
pub mod number;
pub mod options;
mod parser;

#[cfg(feature = "serde_json")]
pub mod serde_json;

pub use handler::JsonHandler;
pub use parser::{JsonParser, ParseError};
