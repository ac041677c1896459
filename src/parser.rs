use std::ops::ControlFlow;

use thiserror::Error;

use crate::{handler::JsonHandler, options::JsonParserOptions};

/// Initial capacity of the container stack and the increment it grows by.
const STACK_CHUNK: usize = 16;

/// An error that kills a parser. Once set, the parser stays dead and
/// consumes no further input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// A string or key contains a byte that is not allowed inside quoted
    /// text (a control byte or DEL).
    #[error("illegal byte inside quoted text: 0x{0:02x}")]
    IllegalByte(u8),

    /// An input byte violates the JSON grammar.
    #[error("unexpected byte: 0x{0:02x}")]
    UnexpectedByte(u8),

    /// A `}` or `]` does not match the innermost open container.
    #[error("container close does not match the innermost open container")]
    MismatchedClose,

    /// The input ended in the middle of a value or with containers still
    /// open.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Opening another container would exceed the configured maximum
    /// nesting depth.
    #[error("maximum nesting depth exceeded")]
    DepthExceeded,
}

/// A container context on the nesting stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object,
    Array,
}

/// Which callback a quoted-text scanner feeds and which state follows the
/// closing quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// A string value; the closing quote completes a value.
    Value,
    /// An object key; the closing quote is followed by a colon.
    Key,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Sticky failure state.
    Dead,

    /// Expecting a value; `}` and `]` may close an empty container here.
    Init,
    /// After an element inside an array: `,` or a closing bracket.
    Next,
    /// After `,` in an array or `:` in an object: a value is mandatory.
    Delim,
    /// Top-level value complete; only whitespace may follow.
    Done,

    NullN,
    NullNu,
    NullNul,

    TrueT,
    TrueTr,
    TrueTru,

    FalseF,
    FalseFa,
    FalseFal,
    FalseFals,

    NumberNegative,
    NumberZero,
    Number,
    NumberPoint,
    NumberDecimals,
    NumberE,
    NumberESign,
    NumberEDigits,

    /// First byte after the opening quote; the text may close immediately.
    TextStart(Scan),
    /// Resume scanning after an escape produced a byte.
    TextMark(Scan),
    /// Accumulating raw text bytes.
    Text(Scan),
    /// After `\`.
    TextEscape(Scan),
    TextU(Scan),
    TextU0(Scan),
    TextU00(Scan),
    TextU00X(Scan),

    /// After `{`: a key or `}`.
    ObjectStart,
    /// After a member value: `,` or `}`.
    ObjectNext,
    /// After `,` inside an object: a key is mandatory.
    Object,
    /// After the closing quote of a key: a colon.
    ObjectKeyEnd,
}

/// Outcome of a structural action that may invoke a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Ok,
    /// A callback returned `Break`; the parser is still alive.
    Refused,
    /// A structural failure; the parser is dead.
    Died,
}

impl From<ControlFlow<()>> for Step {
    fn from(flow: ControlFlow<()>) -> Self {
        match flow {
            ControlFlow::Continue(()) => Step::Ok,
            ControlFlow::Break(()) => Step::Refused,
        }
    }
}

/// What a byte did to an in-progress number.
enum NumberEnd {
    /// The byte terminated the number and has been consumed.
    Delimited,
    /// The byte may extend the lexeme; handle it in the current state.
    Lexeme,
    /// A callback returned `Break`.
    Refused,
    /// A structural failure; the parser is dead.
    Died,
}

/// An incremental push parser for JSON text.
///
/// The parser consumes arbitrarily sized byte chunks via
/// [`exec()`](Self::exec()) and reports tokens to a [`JsonHandler`] as they
/// are recognised. It keeps no copy of the input: strings, keys and numbers
/// are delivered as slices borrowing from the chunk currently being parsed,
/// split as needed at chunk boundaries and around escape sequences.
///
/// A single parser instance handles a single JSON text. It is not
/// internally synchronised; distinct instances share nothing and may be
/// used from different threads.
pub struct JsonParser {
    /// The current machine state.
    state: State,

    /// Open containers, innermost last. The backing allocation only ever
    /// grows.
    stack: Vec<Frame>,

    /// Accumulates the decoded byte of a `\u00XX` escape across the two
    /// hex digits.
    uchar: u8,

    /// Nesting depth at which opening another container fails, if bounded.
    max_depth: Option<usize>,

    /// Why the parser died, once it has.
    error: Option<ParseError>,

    /// Total number of bytes consumed over all `exec()` calls.
    parsed_bytes: usize,
}

impl JsonParser {
    /// Create a new parser with default options.
    pub fn new() -> Self {
        Self::new_with_options(JsonParserOptions::default())
    }

    /// Create a new parser with the given [`JsonParserOptions`].
    pub fn new_with_options(options: JsonParserOptions) -> Self {
        JsonParser {
            state: State::Init,
            stack: Vec::with_capacity(STACK_CHUNK),
            uchar: 0,
            max_depth: options.max_depth,
            error: None,
            parsed_bytes: 0,
        }
    }

    /// `true` once the parser has rejected its input. A dead parser stays
    /// dead; further [`exec()`](Self::exec()) calls consume nothing.
    pub fn is_dead(&self) -> bool {
        self.state == State::Dead
    }

    /// The failure that killed the parser, if it is dead. Handler refusals
    /// do not kill the parser and leave this unset.
    pub fn error(&self) -> Option<ParseError> {
        self.error
    }

    /// Number of containers currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Total number of bytes consumed across all [`exec()`](Self::exec())
    /// calls.
    pub fn parsed_bytes(&self) -> usize {
        self.parsed_bytes
    }

    /// Return the parser to its freshly constructed state so it can parse
    /// another JSON text. The container stack keeps its backing allocation.
    pub fn reset(&mut self) {
        self.state = State::Init;
        self.stack.clear();
        self.uchar = 0;
        self.error = None;
        self.parsed_bytes = 0;
    }

    /// Drive the parser over `buf`, invoking `handler` for every token
    /// boundary encountered, and return the number of bytes consumed.
    ///
    /// An empty `buf` signals end of input: the return value is 0 if the
    /// text parsed so far forms a complete JSON value (trailing whitespace
    /// included), and 1 if the input ended mid-token, in which case the
    /// parser dies.
    ///
    /// For a non-empty `buf` the return value is
    ///
    /// - `buf.len()` if the whole chunk was consumed,
    /// - the offset of the offending byte plus one if that byte violated
    ///   the grammar ([`is_dead()`](Self::is_dead()) becomes `true`, and
    ///   the byte can be inspected at `buf[n - 1]`),
    /// - the offset of the byte being processed when a callback returned
    ///   [`ControlFlow::Break`] (the parser stays alive and can be resumed
    ///   with the remaining input).
    ///
    /// Calling `exec()` on a dead parser consumes nothing and invokes no
    /// callbacks.
    pub fn exec<H: JsonHandler>(&mut self, handler: &mut H, buf: &[u8]) -> usize {
        if self.state == State::Dead {
            return 0;
        }

        if buf.is_empty() {
            // End of input. Trailing spans were already flushed at the end
            // of the chunk that carried them, so the only question left is
            // whether the current state accepts EOF.
            return match self.state {
                State::Done
                | State::NumberZero
                | State::Number
                | State::NumberDecimals
                | State::NumberEDigits => 0,
                _ => {
                    self.die(ParseError::UnexpectedEof);
                    1
                }
            };
        }

        let consumed = self.run(handler, buf);
        self.parsed_bytes += consumed;
        consumed
    }

    /// Signal end of input, equivalent to `exec(handler, &[])`. Returns
    /// `true` if the text parsed so far forms a complete JSON value.
    pub fn finish<H: JsonHandler>(&mut self, handler: &mut H) -> bool {
        !self.is_dead() && self.exec(handler, &[]) == 0
    }

    fn die(&mut self, error: ParseError) {
        self.state = State::Dead;
        self.error = Some(error);
    }

    fn top(&self) -> Option<Frame> {
        self.stack.last().copied()
    }

    /// Push a frame, growing the stack in fixed increments. The backing
    /// allocation never shrinks.
    fn push(&mut self, frame: Frame) -> Step {
        if let Some(max) = self.max_depth {
            if self.stack.len() >= max {
                self.die(ParseError::DepthExceeded);
                return Step::Died;
            }
        }
        if self.stack.len() == self.stack.capacity() {
            self.stack.reserve_exact(STACK_CHUNK);
        }
        self.stack.push(frame);
        Step::Ok
    }

    /// Pop the top frame, which must match `expected`. On mismatch or
    /// underflow the stack is left untouched and the parser dies.
    fn pop(&mut self, expected: Frame) -> Step {
        match self.stack.last() {
            Some(&frame) if frame == expected => {
                self.stack.pop();
                Step::Ok
            }
            _ => {
                self.die(ParseError::MismatchedClose);
                Step::Died
            }
        }
    }

    fn push_object<H: JsonHandler>(&mut self, handler: &mut H) -> Step {
        match self.push(Frame::Object) {
            Step::Ok => Step::from(handler.on_object_start()),
            died => died,
        }
    }

    fn pop_object<H: JsonHandler>(&mut self, handler: &mut H) -> Step {
        match self.pop(Frame::Object) {
            Step::Ok => Step::from(handler.on_object_end()),
            died => died,
        }
    }

    fn push_array<H: JsonHandler>(&mut self, handler: &mut H) -> Step {
        match self.push(Frame::Array) {
            Step::Ok => Step::from(handler.on_array_start()),
            died => died,
        }
    }

    fn pop_array<H: JsonHandler>(&mut self, handler: &mut H) -> Step {
        match self.pop(Frame::Array) {
            Step::Ok => Step::from(handler.on_array_end()),
            died => died,
        }
    }

    /// The state that follows a complete value, picked from the top frame.
    fn next_after_value(&self) -> State {
        match self.top() {
            Some(Frame::Array) => State::Next,
            Some(Frame::Object) => State::ObjectNext,
            None => State::Done,
        }
    }

    fn emit_text<H: JsonHandler>(handler: &mut H, scan: Scan, chunk: &[u8]) -> ControlFlow<()> {
        match scan {
            Scan::Value => handler.on_string(chunk),
            Scan::Key => handler.on_object_key(chunk),
        }
    }

    /// The state that follows the closing quote.
    fn after_text(&self, scan: Scan) -> State {
        match scan {
            Scan::Value => self.next_after_value(),
            Scan::Key => State::ObjectKeyEnd,
        }
    }

    /// Process one byte of quoted text. `span` is the raw run scanned so
    /// far in the current chunk, ending just before `b`.
    fn text_byte<H: JsonHandler>(
        &mut self,
        handler: &mut H,
        scan: Scan,
        span: &[u8],
        b: u8,
    ) -> Step {
        match b {
            b'\\' => {
                if !span.is_empty() && Self::emit_text(handler, scan, span).is_break() {
                    return Step::Refused;
                }
                self.state = State::TextEscape(scan);
                Step::Ok
            }
            b'"' => {
                if !span.is_empty() && Self::emit_text(handler, scan, span).is_break() {
                    return Step::Refused;
                }
                self.state = self.after_text(scan);
                Step::Ok
            }
            _ if is_text_byte(b) => Step::Ok,
            _ => {
                self.die(ParseError::IllegalByte(b));
                Step::Died
            }
        }
    }

    /// Handle a byte that may terminate a number. `span` is the part of
    /// the lexeme accumulated in the current chunk. Numbers have no
    /// explicit terminator, so whitespace, `}`, `]` and `,` all commit the
    /// lexeme and are consumed here.
    fn number_end<H: JsonHandler>(&mut self, handler: &mut H, span: &[u8], b: u8) -> NumberEnd {
        if is_whitespace(b) {
            if !span.is_empty() && handler.on_number(span).is_break() {
                return NumberEnd::Refused;
            }
            self.state = self.next_after_value();
            return NumberEnd::Delimited;
        }

        match b {
            b'}' => {
                if !span.is_empty() && handler.on_number(span).is_break() {
                    return NumberEnd::Refused;
                }
                match self.pop_object(handler) {
                    Step::Ok => {}
                    Step::Refused => return NumberEnd::Refused,
                    Step::Died => return NumberEnd::Died,
                }
                self.state = self.next_after_value();
                NumberEnd::Delimited
            }
            b']' => {
                if !span.is_empty() && handler.on_number(span).is_break() {
                    return NumberEnd::Refused;
                }
                match self.pop_array(handler) {
                    Step::Ok => {}
                    Step::Refused => return NumberEnd::Refused,
                    Step::Died => return NumberEnd::Died,
                }
                self.state = self.next_after_value();
                NumberEnd::Delimited
            }
            b',' => {
                // A separator is only meaningful inside a container.
                let Some(top) = self.top() else {
                    self.die(ParseError::UnexpectedByte(b','));
                    return NumberEnd::Died;
                };
                if !span.is_empty() && handler.on_number(span).is_break() {
                    return NumberEnd::Refused;
                }
                if handler.on_separator().is_break() {
                    return NumberEnd::Refused;
                }
                self.state = match top {
                    Frame::Object => State::Object,
                    Frame::Array => State::Delim,
                };
                NumberEnd::Delimited
            }
            _ => NumberEnd::Lexeme,
        }
    }

    /// The byte-by-byte driver behind [`exec()`](Self::exec()).
    fn run<H: JsonHandler>(&mut self, handler: &mut H, buf: &[u8]) -> usize {
        // Anchors the start of the token span currently being scanned.
        // Span-bearing states entered in a previous chunk expect the span
        // to resume at the start of this one.
        let mut mark = 0usize;

        for (pos, &b) in buf.iter().enumerate() {
            match self.state {
                State::Init | State::Delim => {
                    if self.state == State::Delim && matches!(b, b'}' | b']') {
                        // A value is mandatory after `,` and `:`.
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    match b {
                        b'{' => match self.push_object(handler) {
                            Step::Ok => self.state = State::ObjectStart,
                            Step::Refused => return pos,
                            Step::Died => return pos + 1,
                        },
                        b'}' => match self.pop_object(handler) {
                            Step::Ok => self.state = self.next_after_value(),
                            Step::Refused => return pos,
                            Step::Died => return pos + 1,
                        },
                        b'[' => match self.push_array(handler) {
                            Step::Ok => self.state = State::Init,
                            Step::Refused => return pos,
                            Step::Died => return pos + 1,
                        },
                        b']' => match self.pop_array(handler) {
                            Step::Ok => self.state = self.next_after_value(),
                            Step::Refused => return pos,
                            Step::Died => return pos + 1,
                        },
                        b'n' => self.state = State::NullN,
                        b't' => self.state = State::TrueT,
                        b'f' => self.state = State::FalseF,
                        b'"' => self.state = State::TextStart(Scan::Value),
                        b'-' => {
                            mark = pos;
                            self.state = State::NumberNegative;
                        }
                        b'0' => {
                            mark = pos;
                            self.state = State::NumberZero;
                        }
                        b'1'..=b'9' => {
                            mark = pos;
                            self.state = State::Number;
                        }
                        _ if is_whitespace(b) => {}
                        _ => {
                            self.die(ParseError::UnexpectedByte(b));
                            return pos + 1;
                        }
                    }
                }

                State::Next => {
                    if is_whitespace(b) {
                        continue;
                    }
                    match b {
                        b',' => {
                            if handler.on_separator().is_break() {
                                return pos;
                            }
                            self.state = State::Delim;
                        }
                        b'}' => match self.pop_object(handler) {
                            Step::Ok => self.state = self.next_after_value(),
                            Step::Refused => return pos,
                            Step::Died => return pos + 1,
                        },
                        b']' => match self.pop_array(handler) {
                            Step::Ok => self.state = self.next_after_value(),
                            Step::Refused => return pos,
                            Step::Died => return pos + 1,
                        },
                        _ => {
                            self.die(ParseError::UnexpectedByte(b));
                            return pos + 1;
                        }
                    }
                }

                State::Done => {
                    if !is_whitespace(b) {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                }

                State::ObjectStart => {
                    if is_whitespace(b) {
                        continue;
                    }
                    match b {
                        b'"' => self.state = State::TextStart(Scan::Key),
                        b'}' => match self.pop_object(handler) {
                            Step::Ok => self.state = self.next_after_value(),
                            Step::Refused => return pos,
                            Step::Died => return pos + 1,
                        },
                        _ => {
                            self.die(ParseError::UnexpectedByte(b));
                            return pos + 1;
                        }
                    }
                }

                State::ObjectNext => {
                    if is_whitespace(b) {
                        continue;
                    }
                    match b {
                        b',' => {
                            if handler.on_separator().is_break() {
                                return pos;
                            }
                            self.state = State::Object;
                        }
                        b'}' => match self.pop_object(handler) {
                            Step::Ok => self.state = self.next_after_value(),
                            Step::Refused => return pos,
                            Step::Died => return pos + 1,
                        },
                        _ => {
                            self.die(ParseError::UnexpectedByte(b));
                            return pos + 1;
                        }
                    }
                }

                State::Object => {
                    if is_whitespace(b) {
                        continue;
                    }
                    if b != b'"' {
                        // No trailing comma before `}`.
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = State::TextStart(Scan::Key);
                }

                State::ObjectKeyEnd => {
                    if is_whitespace(b) {
                        continue;
                    }
                    if b != b':' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = State::Delim;
                }

                State::TextStart(scan) => {
                    if b == b'"' {
                        // Empty string or key: report it exactly once so
                        // the handler can tell it apart from no value.
                        if Self::emit_text(handler, scan, &[]).is_break() {
                            return pos;
                        }
                        self.state = self.after_text(scan);
                    } else {
                        mark = pos;
                        self.state = State::Text(scan);
                        match self.text_byte(handler, scan, &buf[mark..pos], b) {
                            Step::Ok => {}
                            Step::Refused => return pos,
                            Step::Died => return pos + 1,
                        }
                    }
                }

                State::TextMark(scan) => {
                    mark = pos;
                    self.state = State::Text(scan);
                    match self.text_byte(handler, scan, &buf[mark..pos], b) {
                        Step::Ok => {}
                        Step::Refused => return pos,
                        Step::Died => return pos + 1,
                    }
                }

                State::Text(scan) => match self.text_byte(handler, scan, &buf[mark..pos], b) {
                    Step::Ok => {}
                    Step::Refused => return pos,
                    Step::Died => return pos + 1,
                },

                State::TextEscape(scan) => {
                    if b == b'u' {
                        self.state = State::TextU(scan);
                    } else if let Some(decoded) = unescape(b) {
                        if Self::emit_text(handler, scan, &[decoded]).is_break() {
                            return pos;
                        }
                        self.state = State::TextMark(scan);
                    } else {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                }

                // Only `\u00XX` escapes are decodable: the first two hex
                // digits must be literal zeroes.
                State::TextU(scan) => {
                    if b != b'0' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = State::TextU0(scan);
                }

                State::TextU0(scan) => {
                    if b != b'0' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = State::TextU00(scan);
                }

                State::TextU00(scan) => match hex_nibble(b) {
                    Some(nibble) => {
                        self.uchar = nibble << 4;
                        self.state = State::TextU00X(scan);
                    }
                    None => {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                },

                State::TextU00X(scan) => match hex_nibble(b) {
                    Some(nibble) => {
                        let decoded = self.uchar | nibble;
                        if Self::emit_text(handler, scan, &[decoded]).is_break() {
                            return pos;
                        }
                        self.state = State::TextMark(scan);
                    }
                    None => {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                },

                State::NumberNegative => match b {
                    b'0' => self.state = State::NumberZero,
                    b'1'..=b'9' => self.state = State::Number,
                    _ => {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                },

                State::NumberZero => match self.number_end(handler, &buf[mark..pos], b) {
                    NumberEnd::Delimited => {}
                    NumberEnd::Refused => return pos,
                    NumberEnd::Died => return pos + 1,
                    NumberEnd::Lexeme => {
                        if b != b'.' {
                            self.die(ParseError::UnexpectedByte(b));
                            return pos + 1;
                        }
                        self.state = State::NumberPoint;
                    }
                },

                State::Number => match self.number_end(handler, &buf[mark..pos], b) {
                    NumberEnd::Delimited => {}
                    NumberEnd::Refused => return pos,
                    NumberEnd::Died => return pos + 1,
                    NumberEnd::Lexeme => match b {
                        b'0'..=b'9' => {}
                        b'.' => self.state = State::NumberPoint,
                        b'e' | b'E' => self.state = State::NumberE,
                        _ => {
                            self.die(ParseError::UnexpectedByte(b));
                            return pos + 1;
                        }
                    },
                },

                State::NumberPoint => match b {
                    b'0'..=b'9' => self.state = State::NumberDecimals,
                    _ => {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                },

                State::NumberDecimals => match self.number_end(handler, &buf[mark..pos], b) {
                    NumberEnd::Delimited => {}
                    NumberEnd::Refused => return pos,
                    NumberEnd::Died => return pos + 1,
                    NumberEnd::Lexeme => match b {
                        b'0'..=b'9' => {}
                        b'e' | b'E' => self.state = State::NumberE,
                        _ => {
                            self.die(ParseError::UnexpectedByte(b));
                            return pos + 1;
                        }
                    },
                },

                State::NumberE => match b {
                    b'0'..=b'9' => self.state = State::NumberEDigits,
                    b'+' | b'-' => self.state = State::NumberESign,
                    _ => {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                },

                State::NumberESign => match b {
                    b'0'..=b'9' => self.state = State::NumberEDigits,
                    _ => {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                },

                State::NumberEDigits => match self.number_end(handler, &buf[mark..pos], b) {
                    NumberEnd::Delimited => {}
                    NumberEnd::Refused => return pos,
                    NumberEnd::Died => return pos + 1,
                    NumberEnd::Lexeme => {
                        if !b.is_ascii_digit() {
                            self.die(ParseError::UnexpectedByte(b));
                            return pos + 1;
                        }
                    }
                },

                State::NullN => {
                    if b != b'u' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = State::NullNu;
                }

                State::NullNu => {
                    if b != b'l' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = State::NullNul;
                }

                State::NullNul => {
                    if b != b'l' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = self.next_after_value();
                    if handler.on_null().is_break() {
                        return pos;
                    }
                }

                State::TrueT => {
                    if b != b'r' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = State::TrueTr;
                }

                State::TrueTr => {
                    if b != b'u' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = State::TrueTru;
                }

                State::TrueTru => {
                    if b != b'e' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = self.next_after_value();
                    if handler.on_bool(true).is_break() {
                        return pos;
                    }
                }

                State::FalseF => {
                    if b != b'a' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = State::FalseFa;
                }

                State::FalseFa => {
                    if b != b'l' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = State::FalseFal;
                }

                State::FalseFal => {
                    if b != b's' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = State::FalseFals;
                }

                State::FalseFals => {
                    if b != b'e' {
                        self.die(ParseError::UnexpectedByte(b));
                        return pos + 1;
                    }
                    self.state = self.next_after_value();
                    if handler.on_bool(false).is_break() {
                        return pos;
                    }
                }

                // Every death path returns out of the loop immediately, so
                // this arm is never entered.
                State::Dead => return pos,
            }
        }

        // Flush the span still being scanned; its continuation arrives
        // with the next chunk, or the token is committed at end of input.
        // A refusal here cannot shorten the return value: the whole chunk
        // has already been examined.
        match self.state {
            State::NumberNegative
            | State::NumberZero
            | State::Number
            | State::NumberPoint
            | State::NumberDecimals
            | State::NumberE
            | State::NumberESign
            | State::NumberEDigits => {
                if mark < buf.len() {
                    let _ = handler.on_number(&buf[mark..]);
                }
            }
            State::Text(scan) => {
                if mark < buf.len() {
                    let _ = Self::emit_text(handler, scan, &buf[mark..]);
                }
            }
            _ => {}
        }

        buf.len()
    }
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes allowed inside quoted text: 0x20 through 0x7E plus every byte
/// with the high bit set. Control bytes and DEL are rejected.
fn is_text_byte(b: u8) -> bool {
    b >= 0x20 && b != 0x7f
}

/// Whitespace skipped between tokens: space, `\t`, `\n`, vertical tab,
/// form feed and `\r`.
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r')
}

/// Decode a single-character escape to the byte it stands for.
fn unescape(b: u8) -> Option<u8> {
    match b {
        b'b' => Some(0x08),
        b't' => Some(0x09),
        b'n' => Some(0x0a),
        b'f' => Some(0x0c),
        b'r' => Some(0x0d),
        b'"' => Some(b'"'),
        b'/' => Some(b'/'),
        b'\\' => Some(b'\\'),
        _ => None,
    }
}

fn hex_nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use std::ops::ControlFlow;

    use super::*;
    use crate::options::JsonParserOptionsBuilder;

    /// Collects number, string and key slices exactly as delivered.
    #[derive(Default)]
    struct Chunks {
        numbers: Vec<Vec<u8>>,
        strings: Vec<Vec<u8>>,
        keys: Vec<Vec<u8>>,
    }

    impl JsonHandler for Chunks {
        fn on_number(&mut self, lexeme: &[u8]) -> ControlFlow<()> {
            self.numbers.push(lexeme.to_vec());
            ControlFlow::Continue(())
        }

        fn on_string(&mut self, chunk: &[u8]) -> ControlFlow<()> {
            self.strings.push(chunk.to_vec());
            ControlFlow::Continue(())
        }

        fn on_object_key(&mut self, chunk: &[u8]) -> ControlFlow<()> {
            self.keys.push(chunk.to_vec());
            ControlFlow::Continue(())
        }
    }

    /// Refuses the first structural callback it sees.
    struct Refuser;

    impl JsonHandler for Refuser {
        fn on_array_start(&mut self) -> ControlFlow<()> {
            ControlFlow::Break(())
        }
    }

    #[test]
    fn whitespace_set() {
        for b in [b' ', b'\t', b'\n', 0x0b, 0x0c, b'\r'] {
            assert!(is_whitespace(b));
        }
        assert!(!is_whitespace(b'x'));
        assert!(!is_whitespace(0x00));
    }

    #[test]
    fn text_byte_predicate() {
        assert!(is_text_byte(b' '));
        assert!(is_text_byte(b'~'));
        assert!(is_text_byte(0x80));
        assert!(is_text_byte(0xff));
        assert!(!is_text_byte(0x1f));
        assert!(!is_text_byte(0x7f));
    }

    #[test]
    fn hex_nibbles() {
        assert_eq!(hex_nibble(b'0'), Some(0));
        assert_eq!(hex_nibble(b'9'), Some(9));
        assert_eq!(hex_nibble(b'a'), Some(10));
        assert_eq!(hex_nibble(b'F'), Some(15));
        assert_eq!(hex_nibble(b'g'), None);
    }

    /// A number split across three chunks is delivered as three slices
    /// that concatenate to the full lexeme.
    #[test]
    fn number_spans_are_stitched() {
        let mut parser = JsonParser::new();
        let mut chunks = Chunks::default();
        for chunk in [&b"-1"[..], b"2.5", b"e3 "] {
            assert_eq!(parser.exec(&mut chunks, chunk), chunk.len());
        }
        assert!(parser.finish(&mut chunks));
        assert_eq!(
            chunks.numbers,
            vec![b"-1".to_vec(), b"2.5".to_vec(), b"e3".to_vec()]
        );
    }

    /// A string split across chunks resumes its span at the chunk start.
    #[test]
    fn string_spans_are_stitched() {
        let mut parser = JsonParser::new();
        let mut chunks = Chunks::default();
        for chunk in [&br#""ab"#[..], br#"cd""#] {
            assert_eq!(parser.exec(&mut chunks, chunk), chunk.len());
        }
        assert!(parser.finish(&mut chunks));
        assert_eq!(chunks.strings, vec![b"ab".to_vec(), b"cd".to_vec()]);
    }

    /// A `\u00XX` escape split between its hex digits carries the high
    /// nibble across the chunk boundary.
    #[test]
    fn unicode_escape_across_chunks() {
        let mut parser = JsonParser::new();
        let mut chunks = Chunks::default();
        for chunk in [&br#""\u00e"#[..], br#"9""#] {
            assert_eq!(parser.exec(&mut chunks, chunk), chunk.len());
        }
        assert!(parser.finish(&mut chunks));
        assert_eq!(chunks.strings, vec![vec![0xe9]]);
    }

    /// Closing the wrong container leaves the stack untouched and kills
    /// the parser.
    #[test]
    fn mismatched_close_dies() {
        let mut parser = JsonParser::new();
        let mut chunks = Chunks::default();
        assert_eq!(parser.exec(&mut chunks, b"[1}"), 3);
        assert!(parser.is_dead());
        assert_eq!(parser.error(), Some(ParseError::MismatchedClose));
        assert_eq!(parser.depth(), 1);
    }

    /// A dead parser consumes nothing and reports no events.
    #[test]
    fn dead_parser_is_inert() {
        let mut parser = JsonParser::new();
        let mut chunks = Chunks::default();
        assert_eq!(parser.exec(&mut chunks, b"%"), 1);
        assert!(parser.is_dead());
        assert_eq!(parser.exec(&mut chunks, b"null"), 0);
        assert!(chunks.numbers.is_empty());
        assert!(!parser.finish(&mut chunks));
    }

    /// Nesting beyond the configured limit dies at the opening byte.
    #[test]
    fn depth_limit() {
        let mut parser = JsonParser::new_with_options(
            JsonParserOptionsBuilder::default().with_max_depth(2).build(),
        );
        let mut chunks = Chunks::default();
        assert_eq!(parser.exec(&mut chunks, b"[[[1]]]"), 3);
        assert!(parser.is_dead());
        assert_eq!(parser.error(), Some(ParseError::DepthExceeded));
    }

    /// A refused callback keeps the parser alive and returns the offset of
    /// the byte being processed.
    #[test]
    fn refusal_does_not_kill() {
        let mut parser = JsonParser::new();
        assert_eq!(parser.exec(&mut Refuser, b" [1]"), 1);
        assert!(!parser.is_dead());
        assert_eq!(parser.error(), None);
    }

    /// `reset()` makes the parser reusable.
    #[test]
    fn reset_reuses_parser() {
        let mut parser = JsonParser::new();
        let mut chunks = Chunks::default();
        assert_eq!(parser.exec(&mut chunks, b"fal"), 3);
        parser.reset();
        let json = b"false";
        assert_eq!(parser.exec(&mut chunks, json), json.len());
        assert!(parser.finish(&mut chunks));
        assert_eq!(parser.parsed_bytes(), json.len());
    }

    /// The byte counter accumulates across chunks.
    #[test]
    fn parsed_bytes_accumulates() {
        let mut parser = JsonParser::new();
        let mut chunks = Chunks::default();
        assert_eq!(parser.exec(&mut chunks, b"[1,"), 3);
        assert_eq!(parser.exec(&mut chunks, b"2]"), 2);
        assert_eq!(parser.parsed_bytes(), 5);
    }
}
