use std::ops::ControlFlow;

/// Receives the events emitted by [`JsonParser::exec()`](crate::JsonParser::exec()).
///
/// The handler owns value materialisation: the parser hands out raw byte
/// slices pointing into the caller's input buffer and the handler decides
/// what to build from them. All methods default to returning
/// [`ControlFlow::Continue`], so an implementation only needs to override
/// the events it consumes.
///
/// Returning [`ControlFlow::Break`] from any method makes the current
/// [`exec()`](crate::JsonParser::exec()) call return immediately with the
/// number of bytes consumed so far. The parser itself stays intact; it is up
/// to the caller to either resume with the remaining input or to tear the
/// parser down.
pub trait JsonHandler {
    /// Called after `null` has been recognised.
    fn on_null(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called after `true` or `false` has been recognised.
    fn on_bool(&mut self, _value: bool) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called with the raw bytes of a number lexeme.
    ///
    /// A number that crosses chunk boundaries is delivered as several
    /// slices; concatenated in delivery order they form the complete
    /// lexeme. The slice borrows from the input buffer and must be copied
    /// if it is retained.
    fn on_number(&mut self, _lexeme: &[u8]) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called with a decoded piece of a string value.
    ///
    /// A single string may produce several slices: one per contiguous raw
    /// span and one per decoded escape byte. The empty string is reported
    /// exactly once with an empty slice; non-empty strings never produce
    /// empty slices.
    fn on_string(&mut self, _chunk: &[u8]) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called at `{`.
    fn on_object_start(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called with a decoded piece of an object key. Delivery follows the
    /// same rules as [`on_string()`](Self::on_string()). Duplicate keys are
    /// not detected; every key is reported.
    fn on_object_key(&mut self, _chunk: &[u8]) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called at the `}` matching an earlier `{`.
    fn on_object_end(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called at `[`.
    fn on_array_start(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called at the `]` matching an earlier `[`.
    fn on_array_end(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called at every `,` between elements or members.
    fn on_separator(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}
