pub mod token;

mod state;

use crate::{
    compile::lex::{state::CursorState, token::Token},
    log::{error_lex, Error, LexKind},
    region::Region,
};
use morel::Finder;

pub type LexResult = Result<Option<(Token, Region)>, Error>;

/// Provides methods to read a source string as [`Token`] instances.
pub struct Lexer<'source> {
    /// Reference to the source text.
    pub source: &'source str,
    /// Position within source.
    pub cursor: usize,
    /// Compiled [`Finder`] instance used to search for markers
    /// in the source text.
    finder: &'source Finder,
    /// Tracks the [`Lexer`] state and determines the action taken
    /// when `.next` is called.
    state: CursorState,
    /// When true, the following [`Token::Raw`] will be left trimmed.
    left_trim: bool,
    /// Temporary storage for the [`Token`] that will be read
    /// on the following call to `.next`.
    buffer: Option<(Token, Region)>,
    /// End of an escaped `\{{` marker, the search for the next mustache
    /// resumes from here.
    escaped: Option<usize>,
}

impl<'source> Lexer<'source> {
    /// Create a new [`Lexer`] from the given source and [`Finder`].
    #[inline]
    pub fn new(source: &'source str, finder: &'source Finder) -> Self {
        Self {
            source,
            cursor: 0,
            finder,
            state: CursorState::Default,
            left_trim: false,
            buffer: None,
            escaped: None,
        }
    }

    /// Return the next [`Token`] and [`Region`], or `None` once the
    /// source is exhausted.
    ///
    /// Any instance of [`Token::Whitespace`] and empty [`Token::Raw`] is ignored.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the source cannot be tokenized.
    pub fn next(&mut self) -> LexResult {
        loop {
            // Always prefer taking from the buffer when possible.
            if let Some(next) = self.buffer.take() {
                return Ok(Some(next));
            }
            if self.cursor >= self.source.len() {
                if let CursorState::Inside { open, .. } = self.state {
                    return Err(error_lex(
                        self.source,
                        (open..self.source.len()).into(),
                        LexKind::UnterminatedMustache,
                    )
                    .with_help("did you close the mustache?"));
                }
                return Ok(None);
            }

            let from = self.cursor;
            let result = match self.state {
                CursorState::Default => self.lex_default(from),
                CursorState::Inside { .. } => self.lex_tag(from),
            }?;

            return match result {
                Some((Token::Whitespace, _)) => continue,
                Some((Token::Raw, region)) if region.begin == region.end => continue,
                other => Ok(other),
            };
        }
    }

    /// Return the next [`Token`] and [`Region`] while reading raw text.
    fn lex_default(&mut self, from: usize) -> LexResult {
        let mut search = self.escaped.take().unwrap_or(from);

        loop {
            let Some((id, begin, end)) = self.finder.next(self.source, search) else {
                self.cursor = self.source.len();

                return Ok(Some(self.trim(from, self.source.len(), false)));
            };
            let (token, is_trimmed) = Token::from_marker(id);

            // A closing marker in raw text is just text.
            if token != Token::BeginExpression {
                search = end;
                continue;
            }

            // \{{ is a mustache written as text, the backslash is dropped.
            if begin > from && self.source[..begin].ends_with('\\') {
                self.cursor = begin;
                self.escaped = Some(end);

                return Ok(Some(self.trim(from, begin - 1, false)));
            }

            self.state = CursorState::Inside {
                open: begin,
                first: true,
                stash: false,
            };
            self.cursor = end;

            if from == begin {
                self.left_trim = false;

                return Ok(Some((token, (begin..end).into())));
            }

            self.buffer = Some((token, (begin..end).into()));

            return Ok(Some(self.trim(from, begin, is_trimmed)));
        }
    }

    /// Return a [`Token::Raw`] over the given range, trimmed according
    /// to the surrounding whitespace control markers.
    fn trim(&mut self, mut begin: usize, mut end: usize, right_trim: bool) -> (Token, Region) {
        if right_trim {
            end = begin + self.source[begin..end].trim_end().len();
        }
        if self.left_trim {
            self.left_trim = false;
            begin = end - self.source[begin..end].trim_start().len();
        }

        (Token::Raw, (begin..end).into())
    }

    /// Return the next [`Token`] and [`Region`] while inside of a mustache.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when an unexpected character is found.
    fn lex_tag(&mut self, from: usize) -> LexResult {
        let CursorState::Inside { open, first, stash } = self.state else {
            unreachable!("lexer must be inside of a mustache");
        };

        // `}}}` would otherwise be read as `}}` followed by a stray brace.
        if stash && self.source[from..].starts_with('}') {
            self.state = CursorState::Inside {
                open,
                first: false,
                stash: false,
            };
            self.cursor = from + 1;

            return Ok(Some((Token::CloseStash, (from..from + 1).into())));
        }

        if let Some((id, end)) = self.finder.starts(self.source, from) {
            let (token, is_trimmed) = Token::from_marker(id);
            if token == Token::EndExpression {
                self.state = CursorState::Default;
                self.left_trim = is_trimmed;
                self.cursor = end;

                return Ok(Some((token, (from..end).into())));
            }

            return Err(error_lex(
                self.source,
                (open..from).into(),
                LexKind::UnterminatedMustache,
            )
            .with_help("did you close the previous mustache?"));
        }

        self.state = CursorState::Inside {
            open,
            first: false,
            stash,
        };

        let mut iterator = self.source[from..].chars();
        let Some(char) = iterator.next() else {
            return Ok(None);
        };
        let following = iterator.next();

        match char {
            c if c.is_whitespace() => {
                // Whitespace does not end the first word, `{{ else }}` is allowed.
                self.state = CursorState::Inside { open, first, stash };

                Ok(Some(self.lex_whitespace(from)))
            }
            '!' if first => self.lex_comment(from),
            '#' if first => Ok(Some(self.advance(from, 1, Token::Hash))),
            '^' if first => Ok(Some(self.advance(from, 1, Token::Caret))),
            '>' if first => Ok(Some(self.advance(from, 1, Token::Angle))),
            '&' if first => Ok(Some(self.advance(from, 1, Token::Ampersand))),
            '{' if first => {
                self.state = CursorState::Inside {
                    open,
                    first: false,
                    stash: true,
                };

                Ok(Some(self.advance(from, 1, Token::OpenStash)))
            }
            '/' => Ok(Some(self.advance(from, 1, Token::Slash))),
            '(' => Ok(Some(self.advance(from, 1, Token::OpenParen))),
            ')' => Ok(Some(self.advance(from, 1, Token::CloseParen))),
            '@' => Ok(Some(self.advance(from, 1, Token::At))),
            '.' if following == Some('.') => Ok(Some(self.advance(from, 2, Token::Parent))),
            '.' => Ok(Some(self.advance(from, 1, Token::Period))),
            '[' => self.lex_segment(from),
            '"' | '\'' => self.lex_string(from, char),
            '-' if following.is_some_and(|c| c.is_ascii_digit()) => Ok(Some(self.lex_number(from))),
            c if c.is_ascii_digit() => Ok(Some(self.lex_number(from))),
            c if is_ident(c) => Ok(Some(self.lex_ident(from, first))),
            _ => Err(error_lex(
                self.source,
                (from..from + char.len_utf8()).into(),
                LexKind::UnexpectedCharacter,
            )
            .with_help(
                "expected a path, a helper name, a string or number literal, \
                a hash argument, a sub-expression or the end of the mustache",
            )),
        }
    }

    /// Move the cursor forward and return the given [`Token`].
    fn advance(&mut self, from: usize, length: usize, token: Token) -> (Token, Region) {
        self.cursor = from + length;

        (token, (from..from + length).into())
    }

    /// Return a [`Token::Whitespace`] covering every whitespace character from
    /// the cursor.
    fn lex_whitespace(&mut self, from: usize) -> (Token, Region) {
        let rest = &self.source[from..];
        let length = rest.len() - rest.trim_start().len();

        self.advance(from, length, Token::Whitespace)
    }

    /// Return a [`Token::Comment`] covering the body of a `{{! }}` or `{{!-- --}}`
    /// comment.
    ///
    /// The long form may contain the closing marker, it ends at the first
    /// closing marker preceded by `--`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the comment is never closed.
    fn lex_comment(&mut self, from: usize) -> LexResult {
        let long = self.source[from..].starts_with("!--");
        let body = if long { from + 3 } else { from + 1 };
        let mut search = body;

        while let Some((id, begin, end)) = self.finder.next(self.source, search) {
            search = end;

            let (token, _) = Token::from_marker(id);
            if token != Token::EndExpression {
                continue;
            }
            if !long {
                self.cursor = begin;

                return Ok(Some((Token::Comment, (body..begin).into())));
            }
            if begin >= body + 2 && self.source[..begin].ends_with("--") {
                self.cursor = begin;

                return Ok(Some((Token::Comment, (body..begin - 2).into())));
            }
        }

        let CursorState::Inside { open, .. } = self.state else {
            unreachable!("lexer must be inside of a mustache");
        };

        Err(error_lex(
            self.source,
            (open..self.source.len()).into(),
            LexKind::UnterminatedMustache,
        )
        .with_help(if long {
            "this comment is never closed, close it with `--}}`"
        } else {
            "this comment is never closed"
        }))
    }

    /// Return a [`Token::Segment`], brackets included.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the closing bracket is missing.
    fn lex_segment(&mut self, from: usize) -> LexResult {
        match self.source[from..].find(']') {
            Some(index) => Ok(Some(self.advance(from, index + 1, Token::Segment))),
            None => Err(error_lex(
                self.source,
                (from..from + 1).into(),
                LexKind::UnterminatedSegment,
            )
            .with_help("close the segment literal with `]`")),
        }
    }

    /// Return a [`Token::String`], quotes included.
    ///
    /// Only the quote characters and the backslash may be escaped.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the string is never closed or contains
    /// an unrecognized escape.
    fn lex_string(&mut self, from: usize, quote: char) -> LexResult {
        let start = from + quote.len_utf8();
        let mut iterator = self.source[start..]
            .char_indices()
            .map(|(index, char)| (start + index, char));

        while let Some((index, char)) = iterator.next() {
            match char {
                '\\' => match iterator.next() {
                    Some((_, '\\' | '\'' | '"')) => continue,
                    Some((escaped, char)) => {
                        return Err(error_lex(
                            self.source,
                            (index..escaped + char.len_utf8()).into(),
                            LexKind::InvalidEscape,
                        )
                        .with_help("only `\\'`, `\\\"` and `\\\\` may be escaped"));
                    }
                    None => break,
                },
                c if c == quote => {
                    return Ok(Some(self.advance(from, index + 1 - from, Token::String)));
                }
                _ => continue,
            }
        }

        Err(error_lex(
            self.source,
            (from..start).into(),
            LexKind::UnterminatedString,
        )
        .with_help(format!("this might be an unterminated string, try closing it with `{quote}`")))
    }

    /// Return a [`Token::Number`], or a [`Token::Identifier`] when the digits are
    /// only the beginning of an identifier such as `1st`.
    fn lex_number(&mut self, from: usize) -> (Token, Region) {
        let end = self.source[from + 1..]
            .char_indices()
            .find(|(_, c)| !matches!(c, '0'..='9' | '.'))
            .map(|(index, _)| from + 1 + index)
            .unwrap_or(self.source.len());

        match self.source[end..].chars().next() {
            Some(c) if is_ident(c) && !self.is_marker(end) => self.lex_ident(from, false),
            _ => self.advance(from, end - from, Token::Number),
        }
    }

    /// Return a [`Token::Identifier`], [`Token::HashKey`] or literal keyword.
    fn lex_ident(&mut self, from: usize, first: bool) -> (Token, Region) {
        let end = self.source[from..]
            .char_indices()
            .find(|(index, c)| !is_ident(*c) || (*index > 0 && self.is_marker(from + index)))
            .map(|(index, _)| from + index)
            .unwrap_or(self.source.len());

        if self.source[end..].starts_with('=') {
            self.cursor = end + 1;

            return (Token::HashKey, (from..end).into());
        }

        let token = match &self.source[from..end] {
            "else" if first => Token::Else,
            "true" => Token::True,
            "false" => Token::False,
            "null" | "undefined" => Token::Null,
            _ => Token::Identifier,
        };

        self.advance(from, end - from, token)
    }

    /// Return true if a marker begins at the given offset.
    fn is_marker(&self, at: usize) -> bool {
        self.finder.starts(self.source, at).is_some()
    }
}

/// Return true if the given character may appear in an identifier.
///
/// Anything that is not whitespace or punctuation with a meaning inside of
/// a mustache is accepted, so `kebab-case` and `$name` are identifiers.
fn is_ident(c: char) -> bool {
    !c.is_whitespace()
        && !matches!(
            c,
            '!' | '"'
                | '#'
                | '%'
                | '&'
                | '\''
                | '('
                | ')'
                | '*'
                | '+'
                | ','
                | '.'
                | '/'
                | ';'
                | '<'
                | '='
                | '>'
                | '@'
                | '['
                | '\\'
                | ']'
                | '^'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
        )
}

#[cfg(test)]
mod tests {
    use super::Lexer;
    use crate::{
        compile::{lex::Token, syntax::Builder},
        log::{Kind, LexKind},
        region::Region,
    };
    use morel::Finder;

    #[test]
    fn test_lex_default_no_match() {
        let expect = vec![(Token::Raw, 0..11)];

        helper_lex_next_auto("lorem ipsum", expect)
    }

    #[test]
    fn test_lex_default_match_no_trim() {
        let expect = vec![
            (Token::Raw, 0..12),
            (Token::BeginExpression, 12..14),
            (Token::Identifier, 15..20),
            (Token::EndExpression, 21..23),
        ];

        helper_lex_next_auto("lorem ipsum {{ dolor }}", expect);
    }

    #[test]
    fn test_lex_trim_both_sides() {
        let expect = vec![
            (Token::Raw, 0..11),
            (Token::BeginExpression, 12..15),
            (Token::Identifier, 15..20),
            (Token::EndExpression, 20..23),
            (Token::Raw, 25..28),
        ];

        helper_lex_next_auto("lorem ipsum {{~dolor~}}  sit", expect);
    }

    #[test]
    fn test_lex_trim_does_not_leak() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::Identifier, 2..3),
            (Token::EndExpression, 3..6),
            (Token::BeginExpression, 6..8),
            (Token::Identifier, 8..9),
            (Token::EndExpression, 9..11),
            (Token::Raw, 11..13),
        ];

        helper_lex_next_auto("{{a~}}{{b}} c", expect);
    }

    #[test]
    fn test_lex_block_markers() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::Hash, 2..3),
            (Token::Identifier, 3..5),
            (Token::Identifier, 6..7),
            (Token::EndExpression, 7..9),
            (Token::Raw, 9..10),
            (Token::BeginExpression, 10..12),
            (Token::Else, 12..16),
            (Token::EndExpression, 16..18),
            (Token::BeginExpression, 18..20),
            (Token::Slash, 20..21),
            (Token::Identifier, 21..23),
            (Token::EndExpression, 23..25),
        ];

        helper_lex_next_auto("{{#if x}}a{{else}}{{/if}}", expect);
    }

    #[test]
    fn test_lex_literals() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::Identifier, 2..10),
            (Token::Number, 11..14),
            (Token::Number, 15..21),
            (Token::String, 22..43),
            (Token::HashKey, 44..48),
            (Token::True, 49..53),
            (Token::EndExpression, 53..55),
        ];

        helper_lex_next_auto(
            r#"{{myHelper 123 -98.76 'My "favorite" movie' flag=true}}"#,
            expect,
        );
    }

    #[test]
    fn test_lex_path_segments() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::Parent, 2..4),
            (Token::Slash, 4..5),
            (Token::Identifier, 5..9),
            (Token::Period, 9..10),
            (Token::Segment, 10..13),
            (Token::Period, 13..14),
            (Token::Identifier, 14..17),
            (Token::EndExpression, 17..19),
        ];

        helper_lex_next_auto("{{../args.[0].arg}}", expect);
    }

    #[test]
    fn test_lex_triple_stash() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::OpenStash, 2..3),
            (Token::Identifier, 3..7),
            (Token::CloseStash, 7..8),
            (Token::EndExpression, 8..10),
        ];

        helper_lex_next_auto("{{{html}}}", expect);
    }

    #[test]
    fn test_lex_sub_expression() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::Hash, 2..3),
            (Token::Identifier, 3..5),
            (Token::OpenParen, 6..7),
            (Token::Identifier, 7..14),
            (Token::Identifier, 15..16),
            (Token::Identifier, 17..18),
            (Token::CloseParen, 18..19),
            (Token::EndExpression, 19..21),
        ];

        helper_lex_next_auto("{{#if (isEqual a b)}}", expect);
    }

    #[test]
    fn test_lex_kebab_identifier() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::Identifier, 2..12),
            (Token::Number, 13..14),
            (Token::EndExpression, 14..16),
        ];

        helper_lex_next_auto("{{helper-1ab 1}}", expect);
    }

    #[test]
    fn test_lex_comments() {
        let expect = vec![
            (Token::BeginExpression, 0..2),
            (Token::Comment, 3..9),
            (Token::EndExpression, 9..11),
            (Token::BeginExpression, 11..13),
            (Token::Comment, 16..24),
            (Token::EndExpression, 26..28),
        ];

        helper_lex_next_auto("{{! note }}{{!-- a }} b --}}", expect);
    }

    #[test]
    fn test_lex_escaped_mustache() {
        let expect = vec![
            (Token::Raw, 0..2),
            (Token::Raw, 3..12),
            (Token::BeginExpression, 12..14),
            (Token::Identifier, 14..15),
            (Token::EndExpression, 15..17),
        ];

        helper_lex_next_auto("a \\{{name}} {{b}}", expect);
    }

    #[test]
    fn test_lex_stray_close_is_raw() {
        helper_lex_next_auto("a }} b", vec![(Token::Raw, 0..6)]);
    }

    #[test]
    fn test_error_unterminated_mustache() {
        let error = helper_lex_error("hello {{ name");

        assert_eq!(error.kind(), Kind::Lex(LexKind::UnterminatedMustache));
        assert_eq!(error.position().map(|p| p.column), Some(7));
    }

    #[test]
    fn test_error_unterminated_comment() {
        let error = helper_lex_error("hello {{! never closed");
        assert_eq!(error.kind(), Kind::Lex(LexKind::UnterminatedMustache));
        assert_eq!(error.position().map(|p| p.column), Some(7));

        let error = helper_lex_error("{{!-- x }} y");
        assert_eq!(error.kind(), Kind::Lex(LexKind::UnterminatedMustache));
        assert_eq!(error.position().map(|p| p.column), Some(1));
        assert_eq!(
            error.help(),
            Some("this comment is never closed, close it with `--}}`")
        );
    }

    #[test]
    fn test_error_nested_open() {
        let error = helper_lex_error("hello {{ name {{ }}");

        assert_eq!(error.kind(), Kind::Lex(LexKind::UnterminatedMustache));
    }

    #[test]
    fn test_error_unterminated_string() {
        let error = helper_lex_error("{{helper 'abc}}");

        assert_eq!(error.kind(), Kind::Lex(LexKind::UnterminatedString));
        assert_eq!(error.position().map(|p| p.column), Some(10));
    }

    #[test]
    fn test_error_invalid_escape() {
        let error = helper_lex_error(r"{{helper 'a\nb'}}");

        assert_eq!(error.kind(), Kind::Lex(LexKind::InvalidEscape));
    }

    #[test]
    fn test_error_unterminated_segment() {
        let error = helper_lex_error("{{args.[0}}");

        assert_eq!(error.kind(), Kind::Lex(LexKind::UnterminatedSegment));
    }

    /// Create a lexer on the source string, iterate [expect.len()] times and
    /// compare each result against [lexer.next()].
    fn helper_lex_next_auto<T>(source: &str, expect: Vec<(Token, T)>)
    where
        T: Into<Region>,
    {
        let finder = Finder::new(Builder::new().to_syntax());
        let mut lexer = Lexer::new(source, &finder);
        for (token, region) in expect {
            assert_eq!(lexer.next(), Ok(Some((token, region.into()))))
        }

        assert_eq!(lexer.next(), Ok(None));
        assert_eq!(lexer.next(), Ok(None));
    }

    /// Drain the lexer and return the first error.
    fn helper_lex_error(source: &str) -> crate::log::Error {
        let finder = Finder::new(Builder::new().to_syntax());
        let mut lexer = Lexer::new(source, &finder);
        loop {
            match lexer.next() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected an error from `{source}`"),
                Err(error) => return error,
            }
        }
    }
}
