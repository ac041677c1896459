use std::ops::ControlFlow;

use pushjson::JsonHandler;

/// A parser event with its payload aggregated across split deliveries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Null,
    Bool(bool),
    Number(Vec<u8>),
    Str(Vec<u8>),
    Key(Vec<u8>),
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Separator,
}

/// Records events, merging the split deliveries of a single token so that
/// recordings are comparable across chunkings. Consecutive slices always
/// belong to the same token: two tokens of the same kind are separated by
/// at least one structural event.
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<Event>,

    /// Callbacks answered before the recorder starts refusing, if bounded.
    pub accept: Option<usize>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder that refuses every callback after the first `n`.
    pub fn accept_only(n: usize) -> Self {
        Recorder {
            events: vec![],
            accept: Some(n),
        }
    }

    /// Count a callback; `Break` once the allowance is used up.
    fn tick(&mut self) -> ControlFlow<()> {
        if let Some(remaining) = self.accept.as_mut() {
            if *remaining == 0 {
                return ControlFlow::Break(());
            }
            *remaining -= 1;
        }
        ControlFlow::Continue(())
    }

    fn push(&mut self, event: Event) -> ControlFlow<()> {
        self.tick()?;
        self.events.push(event);
        ControlFlow::Continue(())
    }
}

impl JsonHandler for Recorder {
    fn on_null(&mut self) -> ControlFlow<()> {
        self.push(Event::Null)
    }

    fn on_bool(&mut self, value: bool) -> ControlFlow<()> {
        self.push(Event::Bool(value))
    }

    fn on_number(&mut self, lexeme: &[u8]) -> ControlFlow<()> {
        self.tick()?;
        if let Some(Event::Number(buf)) = self.events.last_mut() {
            buf.extend_from_slice(lexeme);
        } else {
            self.events.push(Event::Number(lexeme.to_vec()));
        }
        ControlFlow::Continue(())
    }

    fn on_string(&mut self, chunk: &[u8]) -> ControlFlow<()> {
        self.tick()?;
        if let Some(Event::Str(buf)) = self.events.last_mut() {
            buf.extend_from_slice(chunk);
        } else {
            self.events.push(Event::Str(chunk.to_vec()));
        }
        ControlFlow::Continue(())
    }

    fn on_object_key(&mut self, chunk: &[u8]) -> ControlFlow<()> {
        self.tick()?;
        if let Some(Event::Key(buf)) = self.events.last_mut() {
            buf.extend_from_slice(chunk);
        } else {
            self.events.push(Event::Key(chunk.to_vec()));
        }
        ControlFlow::Continue(())
    }

    fn on_object_start(&mut self) -> ControlFlow<()> {
        self.push(Event::ObjectStart)
    }

    fn on_object_end(&mut self) -> ControlFlow<()> {
        self.push(Event::ObjectEnd)
    }

    fn on_array_start(&mut self) -> ControlFlow<()> {
        self.push(Event::ArrayStart)
    }

    fn on_array_end(&mut self) -> ControlFlow<()> {
        self.push(Event::ArrayEnd)
    }

    fn on_separator(&mut self) -> ControlFlow<()> {
        self.push(Event::Separator)
    }
}
