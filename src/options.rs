/// Options for [`JsonParser`](crate::JsonParser). Use
/// [`JsonParserOptionsBuilder`] to create instances of this struct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonParserOptions {
    /// The maximum nesting depth, if bounded.
    pub(crate) max_depth: Option<usize>,
}

impl Default for JsonParserOptions {
    /// Returns default JSON parser options: the nesting depth is only
    /// bounded by available memory.
    fn default() -> Self {
        Self { max_depth: None }
    }
}

impl JsonParserOptions {
    /// Returns the maximum nesting depth, if one is configured.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}

/// A builder for [`JsonParserOptions`]
///
/// ```rust
/// use pushjson::options::JsonParserOptionsBuilder;
/// use pushjson::JsonParser;
///
/// let mut parser = JsonParser::new_with_options(
///     JsonParserOptionsBuilder::default()
///         .with_max_depth(16)
///         .build(),
/// );
/// ```
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonParserOptionsBuilder {
    options: JsonParserOptions,
}

impl JsonParserOptionsBuilder {
    /// Set the maximum nesting depth. Opening a container beyond this
    /// limit is a structural error: the parser dies at the opening byte.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = Some(max_depth);
        self
    }

    /// Create a new [`JsonParserOptions`] object
    pub fn build(self) -> JsonParserOptions {
        self.options
    }
}
