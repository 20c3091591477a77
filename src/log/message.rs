use super::{Error, Kind, LexKind, ParseKind};
use crate::region::Region;
use std::fmt::Display;

pub const UNKNOWN_PARTIAL: &str = "unknown partial";
pub const PARTIAL_RECURSION: &str = "partial recursion";
pub const INVALID_HELPER: &str = "invalid helper";
pub const RESERVED_HELPER: &str = "reserved helper name";
pub const UNSERIALIZABLE: &str = "unserializable data";

/// Return an [`Error`] explaining that the write operation failed.
///
/// This is likely caused by a failure during a `write!` macro operation.
pub fn error_write() -> Error {
    Error::new(Kind::Write).with_help("failed to write result of render, are you low on memory?")
}

/// Return an [`Error`] of the given [`LexKind`] pointing at the [`Region`].
pub fn error_lex(source: &str, region: Region, kind: LexKind) -> Error {
    Error::new(Kind::Lex(kind)).with_pointer(source, region)
}

/// Return an [`Error`] of the given [`ParseKind`] pointing at the [`Region`].
pub fn error_parse(source: &str, region: Region, kind: ParseKind) -> Error {
    Error::new(Kind::Parse(kind)).with_pointer(source, region)
}

/// Return an [`Error`] explaining that the end of source was not expected.
pub fn error_eof<T>(source: &str, expected: T) -> Error
where
    T: Display,
{
    let len = source.len();
    error_parse(source, Region::new(len..len), ParseKind::UnexpectedEof)
        .with_help(format!("expected {expected}, did you close all blocks and mustaches?"))
}

/// Return an [`Error`] describing a helper that was not found.
pub fn error_unknown_helper(source: &str, region: Region, name: &str) -> Error {
    Error::new(Kind::UnknownHelper)
        .with_pointer(source, region)
        .with_help(format!(
            "template wants to call the `{name}` helper, but a helper with that \
            name was not found in this engine, did you add it with `.add_helper`?"
        ))
}

/// Return an [`Error`] describing a partial that was not found.
pub fn error_unknown_partial(source: &str, region: Region, name: &str) -> Error {
    Error::build(UNKNOWN_PARTIAL)
        .with_pointer(source, region)
        .with_help(format!(
            "partial `{name}` not found in engine, add it with `.add_partial`"
        ))
}
