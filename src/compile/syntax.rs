use morel::Syntax;

/// Markers that identify mustaches within text.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Marker {
    /// Beginning of a mustache.
    BeginExpression = 0,
    /// End of a mustache.
    EndExpression = 1,
    /// Same as BeginExpression, but causes the trailing whitespace of the
    /// preceding raw text to be removed.
    BeginExpressionTrim = 2,
    /// Same as EndExpression, but causes the leading whitespace of the
    /// following raw text to be removed.
    EndExpressionTrim = 3,
}

impl From<usize> for Marker {
    fn from(value: usize) -> Self {
        match value {
            0 => Self::BeginExpression,
            1 => Self::EndExpression,
            2 => Self::BeginExpressionTrim,
            3 => Self::EndExpressionTrim,
            _ => unreachable!("syntax only registers four markers"),
        }
    }
}

impl From<Marker> for usize {
    fn from(k: Marker) -> Self {
        k as usize
    }
}

/// Provides methods to build a `Syntax`.
///
/// # Example
///
/// ```
/// use whisker::{Builder, Engine};
///
/// let engine = Engine::new(Builder::new().with_expression("<%", "%>").with_whitespace('-'));
/// let template = engine.compile("hello, <%- name %>!").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    expression: (String, String),
    whitespace: char,
}

impl Builder {
    /// Create a new [`Builder`].
    ///
    /// The `Builder` has default markers:
    ///
    /// ```text
    /// Mustache: {{ name }}
    /// Whitespace: {{~ name ~}}
    /// ```
    ///
    /// To proceed with these defaults, you may immediately call `to_syntax` to receive the
    /// [`Syntax`] instance.
    #[inline]
    pub fn new() -> Self {
        Self {
            expression: ("{{".into(), "}}".into()),
            whitespace: '~',
        }
    }

    /// Set the mustache markers.
    ///
    /// # Panics
    ///
    /// Panics if either marker is empty.
    #[inline]
    pub fn set_expression(&mut self, begin: &str, end: &str) {
        assert!(!begin.is_empty() && !end.is_empty());
        self.expression = (begin.into(), end.into());
    }

    /// Set the mustache markers.
    ///
    /// Returns the [`Builder`], so additional methods may be chained.
    #[inline]
    pub fn with_expression(mut self, begin: &str, end: &str) -> Self {
        self.set_expression(begin, end);

        self
    }

    /// Set the whitespace trim character.
    ///
    /// # Panics
    ///
    /// Panics if the character is whitespace.
    #[inline]
    pub fn set_whitespace(&mut self, character: char) {
        assert!(!character.is_whitespace());
        self.whitespace = character;
    }

    /// Set the whitespace trim character.
    ///
    /// Returns the Builder, so additional methods may be chained.
    #[inline]
    pub fn with_whitespace(mut self, character: char) -> Self {
        self.set_whitespace(character);

        self
    }

    /// Return the whitespace trim character.
    pub fn whitespace(&self) -> char {
        self.whitespace
    }

    /// Return a Syntax instance from the markers in this [`Builder`].
    pub fn to_syntax(&self) -> Syntax {
        let (begin, end) = &self.expression;
        let whitespace = self.whitespace;

        let markers = vec![
            (Marker::BeginExpression.into(), begin.clone()),
            (Marker::EndExpression.into(), end.clone()),
            (Marker::BeginExpressionTrim.into(), format!("{begin}{whitespace}")),
            (Marker::EndExpressionTrim.into(), format!("{whitespace}{end}")),
        ];

        Syntax::new(markers)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
