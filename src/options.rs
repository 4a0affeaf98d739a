/// Nesting limit used by [`ParserOptions::strict`].
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// What to do with tokens that follow the first top-level value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TopLevel {
    /// The document is exactly one value; anything after it is a syntax error.
    #[default]
    Single,
    /// Keep parsing values until end of input and return the last one.
    KeepLast,
}

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    pub top_level: TopLevel,
    /// Maximum number of arrays/objects open at the same time.
    pub max_depth: usize,
}

impl ParserOptions {
    /// One top-level value, nesting up to [`DEFAULT_MAX_DEPTH`].
    pub const fn strict() -> Self {
        Self {
            top_level: TopLevel::Single,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Concatenated top-level values (the last one wins) and deeper nesting.
    pub const fn lenient() -> Self {
        Self {
            top_level: TopLevel::KeepLast,
            max_depth: 1024,
        }
    }

    pub const fn with_top_level(mut self, top_level: TopLevel) -> Self {
        self.top_level = top_level;
        self
    }

    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::strict()
    }
}
