use std::{
    cmp::{max, min},
    fmt::Display,
    ops::{Index, Range},
};

/// Represents an area within source text.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct Region {
    /// The beginning of the range, inclusive.
    pub begin: usize,
    /// The ending of the range, exclusive.
    pub end: usize,
}

impl Region {
    /// Create a new Region from the given range.
    pub fn new(position: Range<usize>) -> Self {
        Self {
            begin: position.start,
            end: position.end,
        }
    }

    /// Return true if this [`Region`] ends where the given `Region` begins,
    /// or this `Region` begins where the given `Region` ends.
    pub fn is_neighbor(&self, other: Self) -> bool {
        self.end == other.begin || other.end == self.begin
    }

    /// Combine will merge the indices of two [`Region`] instances.
    pub fn combine(self, other: Self) -> Self {
        Self {
            begin: min(self.begin, other.begin),
            end: max(self.end, other.end),
        }
    }

    /// Access the literal value of a [`Region`].
    ///
    /// Out of bounds regions produce an empty string.
    pub fn literal<'source>(&self, source: &'source str) -> &'source str {
        source.get(self.begin..self.end).unwrap_or_default()
    }

    /// Return the [`Position`] of the beginning of this [`Region`].
    pub fn position(&self, source: &str) -> Position {
        Position::locate(source, self.begin)
    }
}

impl Index<Region> for str {
    type Output = str;

    fn index(&self, region: Region) -> &Self::Output {
        let Region { begin, end } = region;

        &self[begin..end]
    }
}

impl From<Range<usize>> for Region {
    fn from(value: Range<usize>) -> Self {
        Self {
            begin: value.start,
            end: value.end,
        }
    }
}

/// A one-indexed line and column within source text.
///
/// Columns count characters, not bytes.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Find the [`Position`] of the byte offset within the source text.
    ///
    /// Offsets past the end of the source are clamped to the end.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 1;

        for (index, char) in source.char_indices() {
            if index >= offset {
                break;
            }
            if char == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        Self { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
