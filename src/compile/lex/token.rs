use crate::compile::syntax::Marker;
use std::fmt::Display;

/// Types emitted by the Lexer.
///
/// An abstraction over raw text to make construction of Tree types easier.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Token {
    /// Raw text.
    Raw,
    /// Beginning of a mustache - {{ by default.
    BeginExpression,
    /// End of a mustache - }} by default.
    EndExpression,
    /// Whitespace within a mustache.
    Whitespace,
    /// Identifier (unquoted path segment or helper name).
    Identifier,
    /// Quoted string literal, quotes included.
    String,
    /// Number, sign included.
    Number,
    /// A boolean true.
    True,
    /// A boolean false.
    False,
    /// null or undefined.
    Null,
    /// Bracketed segment literal, brackets included.
    Segment,
    /// An identifier followed by `=`, the region covers the identifier only.
    HashKey,
    /// The whole body of a comment, `{{!` and `}}` excluded.
    Comment,
    /// `else` as the first word of a mustache.
    Else,
    /// # - opens a block.
    Hash,
    /// / - closes a block, or separates path segments.
    Slash,
    /// ^ - opens an inverted block, or stands for else.
    Caret,
    /// > - includes a partial.
    Angle,
    /// & - unescaped output.
    Ampersand,
    /// { - opens a triple-stash.
    OpenStash,
    /// } - closes a triple-stash.
    CloseStash,
    /// (
    OpenParen,
    /// )
    CloseParen,
    /// .
    Period,
    /// ..
    Parent,
    /// @ - prefix of a data variable.
    At,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Raw => write!(f, "raw"),
            Token::BeginExpression => write!(f, "begin mustache"),
            Token::EndExpression => write!(f, "end mustache"),
            Token::Whitespace => write!(f, "whitespace"),
            Token::Identifier => write!(f, "identifier"),
            Token::String => write!(f, "string"),
            Token::Number => write!(f, "number"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Segment => write!(f, "segment literal ([])"),
            Token::HashKey => write!(f, "hash key (=)"),
            Token::Comment => write!(f, "comment"),
            Token::Else => write!(f, "else"),
            Token::Hash => write!(f, "hash (#)"),
            Token::Slash => write!(f, "slash (/)"),
            Token::Caret => write!(f, "caret (^)"),
            Token::Angle => write!(f, "angle (>)"),
            Token::Ampersand => write!(f, "ampersand (&)"),
            Token::OpenStash => write!(f, "open stash ({)"),
            Token::CloseStash => write!(f, "close stash (})"),
            Token::OpenParen => write!(f, "open parenthesis (()"),
            Token::CloseParen => write!(f, "close parenthesis ())"),
            Token::Period => write!(f, "period (.)"),
            Token::Parent => write!(f, "parent (..)"),
            Token::At => write!(f, "at (@)"),
        }
    }
}

impl Token {
    /// Convert the id of a [`Marker`] into a Token.
    ///
    /// Return value includes the resulting Token and a boolean which indicates
    /// if the Token is whitespace trimmed.
    pub(crate) fn from_marker(id: usize) -> (Self, bool) {
        match Marker::from(id) {
            Marker::BeginExpression => (Self::BeginExpression, false),
            Marker::EndExpression => (Self::EndExpression, false),
            Marker::BeginExpressionTrim => (Self::BeginExpression, true),
            Marker::EndExpressionTrim => (Self::EndExpression, true),
        }
    }
}
