/// Describes the internal state of a [`Lexer`][`super::Lexer`].
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum CursorState {
    /// Indicates the [`Lexer`][`super::Lexer`] is reading raw text.
    Default,
    /// Indicates the [`Lexer`][`super::Lexer`] is inside of a mustache.
    Inside {
        /// Beginning offset of the mustache, used to point at it when
        /// it is never closed.
        open: usize,
        /// True until the first token inside of the mustache is read.
        first: bool,
        /// True while inside of a triple-stash `{{{ }}}`.
        stash: bool,
    },
}
