use super::{Pointer, RED, RESET};
use crate::region::{Position, Region};
use std::fmt::{Debug, Display, Formatter, Result};

/// Describes an error, and allows adding a contextual help text and a
/// [`Pointer`] into the template source.
///
/// # Examples
///
/// ```
/// use whisker::{Error, Kind, Region};
///
/// let error = Error::build("helper `shout` expects a string")
///     .with_pointer("{{shout 10}}", Region::new(2..7))
///     .with_name("greeting.hbs")
///     .with_help("use quotes to pass a string literal");
///
/// assert_eq!(error.kind(), Kind::Render);
/// assert_eq!(error.position().map(|p| p.column), Some(3));
/// ```
///
/// When printed with `println!("{:#}", error)` the [`Error`] produces this output:
///
/// ```text
/// error: helper `shout` expects a string
///   --> greeting.hbs:1:3
///    |
///  1 | {{shout 10}}
///    |   ^^^^^
///    |
///   = help: use quotes to pass a string literal
/// ```
pub struct Error {
    /// The class of failure.
    kind: Kind,
    /// Describes the cause of the [`Error`].
    reason: String,
    /// Points at the offending area of the template.
    pointer: Option<Pointer>,
    /// Every location involved in the [`Error`], primary location first.
    positions: Vec<Position>,
    /// Additional information to display with the [`Error`].
    help: Option<String>,
    /// The name of the Template that the [`Error`] comes from.
    name: Option<String>,
}

impl Error {
    /// Create a new [`Error`] of the given [`Kind`].
    ///
    /// The reason text is taken from the `Kind`.
    pub fn new(kind: Kind) -> Self {
        Error {
            reason: kind.to_string(),
            kind,
            pointer: None,
            positions: vec![],
            help: None,
            name: None,
        }
    }

    /// Create a new [`Error`] with the given reason text.
    ///
    /// The `Error` is of kind [`Kind::Render`], which is what helpers
    /// should report.
    pub fn build<T>(reason: T) -> Self
    where
        T: Into<String>,
    {
        Error {
            kind: Kind::Render,
            reason: reason.into(),
            pointer: None,
            positions: vec![],
            help: None,
            name: None,
        }
    }

    /// Set the [`Kind`].
    pub fn with_kind(mut self, kind: Kind) -> Self {
        self.kind = kind;

        self
    }

    /// Set the reason text, which is a short summary of the [`Error`].
    pub fn with_reason<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.reason = text.into();

        self
    }

    /// Set the name text, which is the name of the [`Template`][`crate::Template`]
    /// that the [`Error`] is related to.
    pub fn with_name<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.name = Some(text.into());

        self
    }

    /// Point at the given [`Region`] of the source text.
    ///
    /// The position of the `Region` becomes the primary position.
    pub fn with_pointer<T>(mut self, source: &str, region: T) -> Self
    where
        T: Into<Region>,
    {
        let region = region.into();
        self.positions.insert(0, region.position(source));
        self.pointer = Some(Pointer::new(source, region));

        self
    }

    /// Point at the given [`Region`] unless the [`Error`] already points
    /// somewhere.
    ///
    /// Used to locate errors returned by helpers, which do not know
    /// where they were invoked.
    pub fn or_pointer(self, source: &str, region: Region) -> Self {
        if self.pointer.is_some() {
            return self;
        }

        self.with_pointer(source, region)
    }

    /// Record an additional [`Position`] involved in the [`Error`].
    pub fn with_related(mut self, source: &str, region: Region) -> Self {
        self.positions.push(region.position(source));

        self
    }

    /// Set the help text, which is contextual information to accompany the
    /// reason text.
    pub fn with_help<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.help = Some(text.into());

        self
    }

    /// Return the [`Kind`] of the [`Error`].
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Return the reason text.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Return the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Return the name of the `Template` that the error is related to.
    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Return every [`Position`] involved in the [`Error`].
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Return the primary [`Position`], if any.
    pub fn position(&self) -> Option<Position> {
        self.positions.first().copied()
    }
}

impl From<std::fmt::Error> for Error {
    fn from(_: std::fmt::Error) -> Self {
        super::error_write()
    }
}

impl std::error::Error for Error {}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if !f.alternate() {
            writeln!(f, "{self:#}")?;
        }
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("reason", &self.reason)
            .field("name", &self.name)
            .field("positions", &self.positions)
            .field("help", &self.help)
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{RED}error{RESET}: {}", self.reason)?;
        if !f.alternate() {
            return Ok(());
        }

        match &self.pointer {
            Some(pointer) => pointer.display(f, self.name.as_deref(), self.help.as_deref()),
            None => match &self.help {
                Some(help) => write!(f, "\n  = help: {help}\n"),
                None => Ok(()),
            },
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.reason == other.reason
            && self.help == other.help
            && self.name == other.name
            && self.positions == other.positions
    }
}

/// The class of an [`Error`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Kind {
    /// The template text could not be tokenized.
    Lex(LexKind),
    /// The tokens do not form a valid template.
    Parse(ParseKind),
    /// A helper was invoked that is not registered in the engine.
    UnknownHelper,
    /// Rendering failed, usually inside of a helper.
    Render,
    /// Writing to the output failed.
    Write,
}

/// Reasons that tokenizing may fail.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LexKind {
    UnterminatedMustache,
    UnterminatedString,
    InvalidEscape,
    UnterminatedSegment,
    UnexpectedCharacter,
}

/// Reasons that parsing may fail.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseKind {
    /// A close tag does not match the open tag.
    UnbalancedBlock,
    /// A block was never closed.
    UnclosedBlock,
    UnexpectedToken,
    UnexpectedEof,
    MalformedArguments,
    DuplicateHashKey,
    InvalidNumber,
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Kind::Lex(lex) => write!(f, "{lex}"),
            Kind::Parse(parse) => write!(f, "{parse}"),
            Kind::UnknownHelper => write!(f, "unknown helper"),
            Kind::Render => write!(f, "render failure"),
            Kind::Write => write!(f, "write failure"),
        }
    }
}

impl Display for LexKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            LexKind::UnterminatedMustache => write!(f, "unterminated mustache"),
            LexKind::UnterminatedString => write!(f, "unterminated string literal"),
            LexKind::InvalidEscape => write!(f, "invalid escape"),
            LexKind::UnterminatedSegment => write!(f, "unterminated segment literal"),
            LexKind::UnexpectedCharacter => write!(f, "unexpected character"),
        }
    }
}

impl Display for ParseKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            ParseKind::UnbalancedBlock => write!(f, "unbalanced block"),
            ParseKind::UnclosedBlock => write!(f, "unclosed block"),
            ParseKind::UnexpectedToken => write!(f, "unexpected token"),
            ParseKind::UnexpectedEof => write!(f, "unexpected eof"),
            ParseKind::MalformedArguments => write!(f, "malformed arguments"),
            ParseKind::DuplicateHashKey => write!(f, "duplicate hash key"),
            ParseKind::InvalidNumber => write!(f, "unrecognizable number"),
        }
    }
}
