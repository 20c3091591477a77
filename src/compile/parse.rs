//! Mustache parser.
//!
//! Utilizes a Lexer to receive instances of Token, which it uses to construct
//! the Abstract Syntax Tree of a template.
pub mod scope;
pub mod tree;

mod state;

use crate::{
    compile::{
        lex::{token::Token, LexResult, Lexer},
        parse::{
            scope::Scope,
            state::Frame,
            tree::{
                Block, Call, Expression, Hash, Identifier, Literal, Output, Partial, Path,
                Segment, Tree,
            },
        },
    },
    log::{error_eof, error_parse, Error, ParseKind},
    region::Region,
};
use morel::Finder;
use serde_json::{Number, Value};
use std::fmt::Display;

/// Blocks that are implemented by the engine and take exactly one argument.
const BUILTIN: [&str; 4] = ["if", "unless", "each", "with"];

pub struct Parser<'source> {
    /// Lexer used to pull from source as tokens instead of raw text.
    lexer: Lexer<'source>,
    /// Store peeked tokens.
    ///
    /// Double option is used to remember when the next token is None.
    buffer: Option<Option<(Token, Region)>>,
}

impl<'source> Parser<'source> {
    /// Create a new Parser from the given string and [`Finder`].
    #[inline]
    pub fn new(source: &'source str, finder: &'source Finder) -> Self {
        Self {
            lexer: Lexer::new(source, finder),
            buffer: None,
        }
    }

    /// Parse the whole source.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the source cannot be tokenized, a block is
    /// left unclosed or closed by the wrong tag, or a mustache is malformed.
    pub fn compile(mut self) -> Result<Scope, Error> {
        // Blocks that are still open, innermost last.
        let mut frames: Vec<Frame> = vec![];
        let mut root = Scope::new();

        while let Some((token, region)) = self.next()? {
            match token {
                Token::Raw => scope(&mut frames, &mut root).push(Tree::Raw(region)),
                Token::BeginExpression => self.parse_mustache(region, &mut frames, &mut root)?,
                _ => return Err(self.error_unexpected(token, region, "text or a mustache")),
            }
        }

        if let Some(frame) = frames.iter().rev().find(|frame| !frame.chained) {
            return Err(error_parse(
                self.lexer.source,
                frame.block.region,
                ParseKind::UnclosedBlock,
            )
            .with_help(format!(
                "did you close the `{0}` block with `{{{{/{0}}}}}`?",
                frame.name
            )));
        }

        Ok(root)
    }

    /// Parse everything after the opening marker of a mustache, up to and
    /// including the closing marker.
    fn parse_mustache(
        &mut self,
        open: Region,
        frames: &mut Vec<Frame>,
        root: &mut Scope,
    ) -> Result<(), Error> {
        match self.next_any_must()? {
            (Token::Comment, region) => {
                self.next_must(Token::EndExpression)?;
                scope(frames, root).push(Tree::Comment(region));
            }
            (Token::Hash, _) => {
                let frame = self.parse_open(open, false)?;
                frames.push(frame);
            }
            (Token::Caret, _) => {
                // A lone `{{^}}` is another way to write `{{else}}`.
                if self.next_is(Token::EndExpression)? {
                    let (_, end) = self.next_must(Token::EndExpression)?;
                    self.parse_else(open.combine(end), frames)?;
                } else {
                    let frame = self.parse_open(open, true)?;
                    frames.push(frame);
                }
            }
            (Token::Else, region) => {
                if self.next_is(Token::EndExpression)? {
                    let (_, end) = self.next_must(Token::EndExpression)?;
                    self.parse_else(open.combine(end), frames)?;
                } else {
                    // {{else if x}} nests a block in the inverse of the current one.
                    self.parse_else(open.combine(region), frames)?;
                    let mut frame = self.parse_open(open, false)?;
                    frame.chained = true;
                    frames.push(frame);
                }
            }
            (Token::Slash, _) => self.parse_close(open, frames, root)?,
            (Token::Angle, _) => {
                let partial = self.parse_partial(open)?;
                scope(frames, root).push(Tree::Partial(partial));
            }
            (Token::OpenStash, _) => {
                let expression = self.parse_expression()?;
                self.next_must(Token::CloseStash)?;
                let (_, end) = self.next_must(Token::EndExpression)?;

                scope(frames, root).push(Tree::Output(Output {
                    expression,
                    escape: false,
                    region: open.combine(end),
                }));
            }
            (Token::Ampersand, _) => {
                let expression = self.parse_expression()?;
                let (_, end) = self.next_must(Token::EndExpression)?;

                scope(frames, root).push(Tree::Output(Output {
                    expression,
                    escape: false,
                    region: open.combine(end),
                }));
            }
            (token, region) => {
                let expression = self.parse_expression_from(token, region)?;
                let (_, end) = self.next_must(Token::EndExpression)?;

                scope(frames, root).push(Tree::Output(Output {
                    expression,
                    escape: true,
                    region: open.combine(end),
                }));
            }
        }

        Ok(())
    }

    /// Parse the rest of an open tag such as `{{#name arguments}}`, returning
    /// a [`Frame`] for the new block.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a built-in block does not receive exactly one
    /// argument, or an inverted block receives arguments.
    fn parse_open(&mut self, open: Region, inverted: bool) -> Result<Frame, Error> {
        let source = self.lexer.source;
        let name = self.parse_name("a block name")?;
        let (mut arguments, hash, _) = self.parse_arguments()?;
        let (_, end) = self.next_must(Token::EndExpression)?;
        let region = open.combine(end);
        let text = name.text.clone();

        let keyword = name
            .helper_name()
            .filter(|name| BUILTIN.contains(name))
            .map(str::to_owned);

        if let Some(keyword) = &keyword {
            if arguments.len() != 1 {
                return Err(
                    error_parse(source, region, ParseKind::MalformedArguments).with_help(format!(
                        "`{keyword}` expects exactly one argument, found {}",
                        arguments.len()
                    )),
                );
            }
        }

        let (name, condition, swap) = match keyword.as_deref() {
            Some(keyword @ ("if" | "unless")) => {
                let swap = inverted != (keyword == "unless");

                (keyword_path("if", name.region), arguments.pop().map(boolish), swap)
            }
            Some("each" | "with") if !inverted => (name, None, false),
            _ if inverted && arguments.is_empty() && hash.is_empty() => {
                let condition = boolish(Expression::Path(name.clone()));

                (keyword_path("if", name.region), Some(condition), true)
            }
            _ if inverted => {
                return Err(error_parse(source, region, ParseKind::MalformedArguments)
                    .with_help("an inverted block only accepts a single path, such as `{{^items}}`"));
            }
            _ if arguments.is_empty() && hash.is_empty() => {
                let condition = boolish(Expression::Path(name.clone()));

                (name, Some(condition), false)
            }
            _ => (name, None, false),
        };

        let block = Block {
            name,
            arguments,
            hash,
            condition,
            template: Scope::new(),
            inverse: Scope::new(),
            region,
            close: Region::default(),
        };

        Ok(Frame::new(text, block, swap))
    }

    /// Move the innermost open block into its inverse body.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if no block is open, or the block already
    /// has an `else`.
    fn parse_else(&mut self, region: Region, frames: &mut [Frame]) -> Result<(), Error> {
        let source = self.lexer.source;
        let Some(frame) = frames.last_mut() else {
            return Err(error_parse(source, region, ParseKind::UnexpectedToken)
                .with_help("`else` may only appear inside of a block"));
        };
        if frame.in_inverse {
            return Err(error_parse(source, region, ParseKind::UnexpectedToken)
                .with_related(source, frame.block.region)
                .with_help(format!("the `{}` block already has an `else`", frame.name)));
        }
        frame.in_inverse = true;

        Ok(())
    }

    /// Parse a close tag such as `{{/name}}`, finishing the innermost block
    /// and any `{{else name}}` blocks chained to it.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the name does not match the open tag.
    fn parse_close(
        &mut self,
        open: Region,
        frames: &mut Vec<Frame>,
        root: &mut Scope,
    ) -> Result<(), Error> {
        let source = self.lexer.source;
        let name = self.parse_name("the name of the block to close")?;
        let (_, end) = self.next_must(Token::EndExpression)?;
        let close = open.combine(end);

        loop {
            let Some(frame) = frames.pop() else {
                return Err(
                    error_parse(source, close, ParseKind::UnbalancedBlock).with_help(format!(
                        "`{}` closes a block that was never opened",
                        name.text
                    )),
                );
            };
            if !frame.chained && frame.name != name.text {
                return Err(error_parse(source, close, ParseKind::UnbalancedBlock)
                    .with_related(source, frame.block.region)
                    .with_help(format!(
                        "expected `{{{{/{0}}}}}` to close the `{0}` block, found `{{{{/{1}}}}}`",
                        frame.name, name.text
                    )));
            }

            let chained = frame.chained;
            scope(frames, root).push(frame.finish(close));
            if !chained {
                return Ok(());
            }
        }
    }

    /// Parse a partial such as `{{> name context key=value}}`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if more than one context argument is given.
    fn parse_partial(&mut self, open: Region) -> Result<Partial, Error> {
        let source = self.lexer.source;
        let name = match self.next_any_must()? {
            (Token::String, region) => self.parse_string(region),
            (Token::Segment, region) => source[region.begin + 1..region.end - 1].to_owned(),
            (Token::Identifier, region) => self.parse_path(Token::Identifier, region)?.text,
            (token, region) => return Err(self.error_unexpected(token, region, "a partial name")),
        };
        let (mut arguments, hash, _) = self.parse_arguments()?;
        if let Some(extra) = arguments.get(1) {
            return Err(
                error_parse(source, extra.get_region(), ParseKind::MalformedArguments)
                    .with_help("a partial accepts a single context argument"),
            );
        }
        let (_, end) = self.next_must(Token::EndExpression)?;

        Ok(Partial {
            name,
            context: arguments.pop(),
            hash,
            region: open.combine(end),
        })
    }

    /// Parse the [`Expression`] of an output mustache or a sub-expression.
    fn parse_expression(&mut self) -> Result<Expression, Error> {
        let (token, region) = self.next_any_must()?;

        self.parse_expression_from(token, region)
    }

    /// Parse an [`Expression`] which begins with the given token.
    ///
    /// A lone path or literal is returned as is, anything followed by
    /// arguments is a [`Call`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when arguments follow something other than a
    /// plain helper name.
    fn parse_expression_from(&mut self, token: Token, region: Region) -> Result<Expression, Error> {
        let first = self.parse_operand(token, region)?;
        if self.at_end()? {
            return Ok(first);
        }

        let name = match &first {
            Expression::Path(path) => path.helper_name().map(|name| Identifier {
                name: name.to_owned(),
                region: path.region,
            }),
            _ => None,
        };
        let Some(name) = name else {
            return Err(error_parse(
                self.lexer.source,
                first.get_region(),
                ParseKind::MalformedArguments,
            )
            .with_help("only a helper name may be followed by arguments"));
        };

        let (arguments, hash, end) = self.parse_arguments()?;
        let region = end.map_or(name.region, |end| name.region.combine(end));

        Ok(Expression::Call(Call {
            name,
            arguments,
            hash,
            region,
        }))
    }

    /// Parse a sub-expression, `(name arguments)`.
    fn parse_sub_expression(&mut self, open: Region) -> Result<Call, Error> {
        let (_, region) = self.next_must(Token::Identifier)?;
        let name = Identifier {
            name: self.lexer.source[region].to_owned(),
            region,
        };
        let (arguments, hash, _) = self.parse_arguments()?;
        let (_, close) = self.next_must(Token::CloseParen)?;

        Ok(Call {
            name,
            arguments,
            hash,
            region: open.combine(close),
        })
    }

    /// Parse positional and hash arguments until the end of the mustache or
    /// sub-expression.
    ///
    /// Returns the positional arguments, the hash, and the [`Region`] of
    /// the last argument.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a hash key is repeated, or a positional
    /// argument follows a hash argument.
    fn parse_arguments(&mut self) -> Result<(Vec<Expression>, Hash, Option<Region>), Error> {
        let source = self.lexer.source;
        let mut arguments = vec![];
        let mut hash = Hash::default();
        let mut end = None;

        while !self.at_end()? {
            let (token, region) = self.next_any_must()?;

            if token == Token::HashKey {
                let key = &source[region];
                if let Some((first, _)) = hash.pairs.iter().find(|(name, _)| name.name == key) {
                    return Err(error_parse(source, region, ParseKind::DuplicateHashKey)
                        .with_related(source, first.region)
                        .with_help(format!("`{key}` is already set in this mustache")));
                }

                let (token, next) = self.next_any_must()?;
                let value = self.parse_operand(token, next)?;
                end = Some(value.get_region());
                hash.pairs.push((
                    Identifier {
                        name: key.to_owned(),
                        region,
                    },
                    value,
                ));

                continue;
            }

            if !hash.is_empty() {
                return Err(error_parse(source, region, ParseKind::MalformedArguments)
                    .with_help("positional arguments must come before hash arguments"));
            }

            let value = self.parse_operand(token, region)?;
            end = Some(value.get_region());
            arguments.push(value);
        }

        Ok((arguments, hash, end))
    }

    /// Parse a single argument: a literal, path or sub-expression.
    fn parse_operand(&mut self, token: Token, region: Region) -> Result<Expression, Error> {
        let value = match token {
            Token::String => Value::String(self.parse_string(region)),
            Token::Number => Value::Number(self.parse_number(region)?),
            Token::True => Value::Bool(true),
            Token::False => Value::Bool(false),
            Token::Null => Value::Null,
            Token::OpenParen => return Ok(Expression::Call(self.parse_sub_expression(region)?)),
            Token::Identifier | Token::Period | Token::Parent | Token::Segment | Token::At => {
                return Ok(Expression::Path(self.parse_path(token, region)?))
            }
            Token::HashKey => {
                return Err(
                    error_parse(self.lexer.source, region, ParseKind::MalformedArguments)
                        .with_help("hash arguments must follow a helper name"),
                )
            }
            _ => {
                return Err(self.error_unexpected(
                    token,
                    region,
                    "a path, a literal or a sub-expression",
                ))
            }
        };

        Ok(Expression::Literal(Literal { value, region }))
    }

    /// Parse the name of a block, which is a [`Path`].
    fn parse_name(&mut self, expected: &str) -> Result<Path, Error> {
        match self.next_any_must()? {
            (
                token @ (Token::Identifier
                | Token::Period
                | Token::Parent
                | Token::Segment
                | Token::At),
                region,
            ) => self.parse_path(token, region),
            (token, region) => Err(self.error_unexpected(token, region, expected)),
        }
    }

    /// Parse a [`Path`] which begins with the given token.
    ///
    /// Segments are separated by `.` or `/`, with no whitespace in between.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a separator is not followed by a segment.
    fn parse_path(&mut self, token: Token, region: Region) -> Result<Path, Error> {
        let source = self.lexer.source;
        let (segment, mut last) = self.parse_segment(token, region, true)?;
        let mut segments = vec![segment];

        while let Some((Token::Period | Token::Slash, separator)) = self.peek()? {
            if !last.is_neighbor(separator) {
                break;
            }
            self.next()?;

            let (token, next) = self.next_any_must()?;
            if !separator.is_neighbor(next) {
                return Err(error_parse(source, separator, ParseKind::UnexpectedToken)
                    .with_help("a path separator must be followed by a name, without whitespace"));
            }

            let leading = segments.iter().all(|segment| *segment == Segment::Parent);
            let (segment, next) = self.parse_segment(token, next, leading)?;
            segments.push(segment);
            last = next;
        }

        let region = region.combine(last);

        Ok(Path {
            segments,
            text: source[region].to_owned(),
            region,
        })
    }

    /// Parse one [`Segment`] of a [`Path`].
    ///
    /// Leading segments may be `..`, `.`, `this` or a data variable.
    fn parse_segment(
        &mut self,
        token: Token,
        region: Region,
        leading: bool,
    ) -> Result<(Segment, Region), Error> {
        let source = self.lexer.source;
        let segment = match token {
            Token::Identifier if leading && &source[region] == "this" => Segment::This,
            Token::Parent if leading => Segment::Parent,
            Token::Period if leading => Segment::This,
            Token::Segment => Segment::Literal(source[region.begin + 1..region.end - 1].to_owned()),
            Token::At if leading => {
                let (_, name) = self.next_must(Token::Identifier)?;
                if !region.is_neighbor(name) {
                    return Err(error_parse(source, region, ParseKind::UnexpectedToken)
                        .with_help("a data variable is written without whitespace, such as `@index`"));
                }

                return Ok((Segment::Data(source[name].to_owned()), region.combine(name)));
            }
            Token::Identifier => Segment::Identifier(source[region].to_owned()),
            // Only keys can follow a separator, so `items.0` and `flags.true` are keys.
            Token::Number | Token::True | Token::False | Token::Null if !leading => {
                Segment::Identifier(source[region].to_owned())
            }
            _ => return Err(self.error_unexpected(token, region, "a path segment")),
        };

        Ok((segment, region))
    }

    /// Decode the string literal at the given [`Region`], quotes included.
    ///
    /// The lexer has already rejected unknown escapes.
    fn parse_string(&self, region: Region) -> String {
        let window = &self.lexer.source[region.begin + 1..region.end - 1];
        let mut string = String::with_capacity(window.len());
        let mut iterator = window.chars();

        while let Some(char) = iterator.next() {
            match char {
                '\\' => string.extend(iterator.next()),
                c => string.push(c),
            }
        }

        string
    }

    /// Parse the number literal at the given [`Region`].
    ///
    /// Leading zeros are allowed, and literals with a whole value such as
    /// `1.0` are stored as integers.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the literal is not a valid number.
    fn parse_number(&self, region: Region) -> Result<Number, Error> {
        let source = self.lexer.source;
        let text = &source[region];
        let invalid = || {
            error_parse(source, region, ParseKind::InvalidNumber).with_help(
                "numbers may begin with `-` to indicate a negative number \
                and must not end with a decimal point",
            )
        };

        let digits = text.strip_prefix('-').unwrap_or(text);
        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (digits, None),
        };
        let is_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !is_digits(whole) || fraction.is_some_and(|fraction| !is_digits(fraction)) {
            return Err(invalid());
        }

        if fraction.map_or(true, |fraction| fraction.bytes().all(|b| b == b'0')) {
            let integer = &text[..text.len() - fraction.map_or(0, |f| f.len() + 1)];
            if let Ok(number) = integer.parse::<i64>() {
                return Ok(Number::from(number));
            }
            if let Ok(number) = integer.parse::<u64>() {
                return Ok(Number::from(number));
            }
        }

        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(invalid)
    }

    /// Return true if the next token ends the current argument list.
    fn at_end(&mut self) -> Result<bool, Error> {
        Ok(matches!(
            self.peek()?,
            None | Some((
                Token::EndExpression | Token::CloseStash | Token::CloseParen,
                _
            ))
        ))
    }

    /// Return an [`Error`] describing an unexpected token.
    fn error_unexpected<T>(&self, token: Token, region: Region, expected: T) -> Error
    where
        T: Display,
    {
        error_parse(self.lexer.source, region, ParseKind::UnexpectedToken)
            .with_help(format!("expected {expected}, found {token}"))
    }

    /// Peek the next token.
    ///
    /// # Errors
    ///
    /// Propagates any error reported by the underlying Lexer.
    fn peek(&mut self) -> LexResult {
        if let o @ None = &mut self.buffer {
            *o = Some(self.lexer.next()?);
        }

        Ok(self.buffer.flatten())
    }

    /// Get the next token.
    ///
    /// Prefers to pull a token from the internal buffer first, but will pull from
    /// the lexer when the buffer is empty.
    fn next(&mut self) -> LexResult {
        match self.buffer.take() {
            Some(t) => Ok(t),
            None => self.lexer.next(),
        }
    }

    /// Returns true if the given token matches the upcoming token.
    ///
    /// # Errors
    ///
    /// Propagates any errors reported by the underlying lexer.
    fn next_is(&mut self, expect: Token) -> Result<bool, Error> {
        Ok(self
            .peek()?
            .map(|(token, _)| token == expect)
            .unwrap_or(false))
    }

    /// Get the next token, and compare it to the given token.
    ///
    /// # Errors
    ///
    /// An error is returned if the next token does not match the given token,
    /// or when there are no tokens left.
    fn next_must(&mut self, expect: Token) -> Result<(Token, Region), Error> {
        match self.next()? {
            Some((token, region)) if token == expect => Ok((token, region)),
            Some((token, region)) => Err(self.error_unexpected(token, region, expect)),
            None => Err(error_eof(self.lexer.source, expect)),
        }
    }

    /// Get the next token.
    ///
    /// Similar to `next` but requires that a token is returned.
    ///
    /// # Errors
    ///
    /// An error is returned if no more tokens are left.
    fn next_any_must(&mut self) -> Result<(Token, Region), Error> {
        match self.next()? {
            Some(next) => Ok(next),
            None => Err(error_eof(self.lexer.source, "additional tokens")),
        }
    }
}

/// Return the [`Scope`] that new trees are pushed into.
fn scope<'a>(frames: &'a mut [Frame], root: &'a mut Scope) -> &'a mut Scope {
    match frames.last_mut() {
        Some(frame) => frame.current(),
        None => root,
    }
}

/// Wrap an [`Expression`] that decides between two bodies.
fn boolish(expression: Expression) -> Expression {
    Expression::Boolish(Box::new(expression))
}

/// Return a [`Path`] naming one of the built-in blocks.
fn keyword_path(name: &str, region: Region) -> Path {
    Path {
        segments: vec![Segment::Identifier(name.to_owned())],
        text: name.to_owned(),
        region,
    }
}

#[cfg(test)]
mod tests {
    use super::Parser;
    use crate::{
        compile::{
            lex::token::Token,
            syntax::Builder,
            tree::{Block, Expression, Output, Path, Segment, Tree},
            Scope,
        },
        log::{Error, Kind, ParseKind},
        region::Position,
    };
    use morel::Finder;
    use serde_json::{json, Value};

    fn parse(source: &str) -> Result<Scope, Error> {
        let finder = Finder::new(Builder::new().to_syntax());

        Parser::new(source, &finder).compile()
    }

    fn parse_error(source: &str) -> Kind {
        parse(source).expect_err("source should not parse").kind()
    }

    fn output(tree: &Tree) -> &Output {
        match tree {
            Tree::Output(output) => output,
            other => panic!("expected output, found {other:?}"),
        }
    }

    fn block(tree: &Tree) -> &Block {
        match tree {
            Tree::Block(block) => block,
            other => panic!("expected block, found {other:?}"),
        }
    }

    fn path(expression: &Expression) -> &Path {
        match expression {
            Expression::Path(path) => path,
            other => panic!("expected path, found {other:?}"),
        }
    }

    fn literals(expressions: &[Expression]) -> Vec<Value> {
        expressions
            .iter()
            .map(|expression| match expression {
                Expression::Literal(literal) => literal.value.clone(),
                other => panic!("expected literal, found {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_peek_multiple() {
        let finder = Finder::new(Builder::new().to_syntax());
        let mut parser = Parser::new("{{ one two", &finder);

        assert!(parser.next().is_ok());
        assert_eq!(parser.peek(), Ok(Some((Token::Identifier, (3..6).into()))));
        assert_eq!(parser.peek(), Ok(Some((Token::Identifier, (3..6).into()))));
        assert_eq!(parser.next(), Ok(Some((Token::Identifier, (3..6).into()))));
    }

    #[test]
    fn test_parse_raw_and_output() {
        let scope = parse("hello {{name}}").unwrap();

        assert_eq!(scope.data[0], Tree::Raw((0..6).into()));

        let output = output(&scope.data[1]);
        assert!(output.escape);
        assert_eq!(output.region, (6..14).into());
        assert_eq!(
            path(&output.expression).segments,
            vec![Segment::Identifier("name".into())]
        );
    }

    #[test]
    fn test_parse_call_arguments_and_hash() {
        let scope = parse(r#"{{link "home" 1 true class=active}}"#).unwrap();
        let Expression::Call(call) = &output(&scope.data[0]).expression else {
            panic!("expected call");
        };

        assert_eq!(call.name.name, "link");
        assert_eq!(
            literals(&call.arguments),
            vec![json!("home"), json!(1), json!(true)]
        );
        assert_eq!(call.hash.pairs.len(), 1);
        assert_eq!(call.hash.pairs[0].0.name, "class");
        assert_eq!(
            path(&call.hash.pairs[0].1).segments,
            vec![Segment::Identifier("active".into())]
        );
    }

    #[test]
    fn test_parse_literals() {
        let scope =
            parse(r#"{{h 'My "favorite" movie' "a\"b" 123 4567 -98.76 null 007 1.0 1.50 -0.0}}"#)
                .unwrap();
        let Expression::Call(call) = &output(&scope.data[0]).expression else {
            panic!("expected call");
        };

        assert_eq!(
            literals(&call.arguments),
            vec![
                json!(r#"My "favorite" movie"#),
                json!(r#"a"b"#),
                json!(123),
                json!(4567),
                json!(-98.76),
                Value::Null,
                json!(7),
                json!(1),
                json!(1.5),
                json!(0)
            ]
        );
    }

    #[test]
    fn test_parse_sub_expression_condition() {
        let scope = parse("{{#if (isEqual arg1 arg2)}}True{{/if}}").unwrap();
        let block = block(&scope.data[0]);

        assert_eq!(block.name.text, "if");
        assert!(block.arguments.is_empty());
        assert_eq!(block.template.data, vec![Tree::Raw((27..31).into())]);
        assert_eq!(block.close, (31..38).into());

        let Some(Expression::Boolish(inner)) = &block.condition else {
            panic!("expected a boolish condition");
        };
        let Expression::Call(call) = inner.as_ref() else {
            panic!("expected a sub-expression");
        };
        assert_eq!(call.name.name, "isEqual");
        assert_eq!(call.arguments.len(), 2);
        assert_eq!(call.region, (6..25).into());
    }

    #[test]
    fn test_parse_inverted_section() {
        let scope = parse("{{^items}}none{{/items}}").unwrap();
        let block = block(&scope.data[0]);

        assert_eq!(block.name.text, "if");
        assert!(block.template.is_empty());
        assert_eq!(block.inverse.data, vec![Tree::Raw((10..14).into())]);

        let Some(Expression::Boolish(inner)) = &block.condition else {
            panic!("expected a boolish condition");
        };
        assert_eq!(path(inner).text, "items");
    }

    #[test]
    fn test_parse_unless_swaps_bodies() {
        let scope = parse("{{#unless x}}a{{else}}b{{/unless}}").unwrap();
        let block = block(&scope.data[0]);

        assert_eq!(block.name.text, "if");
        assert_eq!(block.template.data, vec![Tree::Raw((22..23).into())]);
        assert_eq!(block.inverse.data, vec![Tree::Raw((13..14).into())]);
    }

    #[test]
    fn test_parse_caret_as_else() {
        let scope = parse("{{#if x}}a{{^}}b{{/if}}").unwrap();
        let block = block(&scope.data[0]);

        assert_eq!(block.template.data.len(), 1);
        assert_eq!(block.inverse.data, vec![Tree::Raw((15..16).into())]);
    }

    #[test]
    fn test_parse_section_condition() {
        let scope = parse("{{#person}}{{name}}{{/person}}").unwrap();
        let block = block(&scope.data[0]);

        assert_eq!(block.name.text, "person");
        assert!(matches!(block.condition, Some(Expression::Boolish(_))));

        let scope = parse("{{#bold 'x'}}text{{/bold}}").unwrap();
        assert!(block_of(&scope).condition.is_none());
    }

    fn block_of(scope: &Scope) -> &Block {
        block(&scope.data[0])
    }

    #[test]
    fn test_parse_else_if_chain() {
        let scope = parse("{{#if a}}1{{else if b}}2{{else}}3{{/if}}").unwrap();
        let outer = block(&scope.data[0]);

        assert_eq!(outer.template.data.len(), 1);
        assert_eq!(outer.inverse.data.len(), 1);

        let inner = block(&outer.inverse.data[0]);
        assert_eq!(inner.name.text, "if");
        assert_eq!(inner.template.data, vec![Tree::Raw((23..24).into())]);
        assert_eq!(inner.inverse.data, vec![Tree::Raw((32..33).into())]);
        assert_eq!(inner.close, outer.close);
    }

    #[test]
    fn test_parse_else_with_whitespace() {
        let scope = parse("{{#if a}}x{{ else }}y{{/if}}").unwrap();

        assert_eq!(block_of(&scope).inverse.data.len(), 1);
    }

    #[test]
    fn test_parse_paths() {
        let cases = [
            ("{{../name}}", vec![Segment::Parent, Segment::Identifier("name".into())]),
            (
                "{{../../name}}",
                vec![Segment::Parent, Segment::Parent, Segment::Identifier("name".into())],
            ),
            (
                "{{args.[0].arg}}",
                vec![
                    Segment::Identifier("args".into()),
                    Segment::Literal("0".into()),
                    Segment::Identifier("arg".into()),
                ],
            ),
            ("{{[first name]}}", vec![Segment::Literal("first name".into())]),
            ("{{@index}}", vec![Segment::Data("index".into())]),
            (
                "{{@root.title}}",
                vec![Segment::Data("root".into()), Segment::Identifier("title".into())],
            ),
            ("{{this}}", vec![Segment::This]),
            ("{{.}}", vec![Segment::This]),
            ("{{./x}}", vec![Segment::This, Segment::Identifier("x".into())]),
            (
                "{{person/name}}",
                vec![Segment::Identifier("person".into()), Segment::Identifier("name".into())],
            ),
            (
                "{{items.0}}",
                vec![Segment::Identifier("items".into()), Segment::Identifier("0".into())],
            ),
        ];

        for (source, segments) in cases {
            let scope = parse(source).unwrap();

            assert_eq!(path(&output(&scope.data[0]).expression).segments, segments, "{source}");
        }
    }

    #[test]
    fn test_parse_partial() {
        let scope = parse(r#"{{> card person title="Hi"}}{{> "quoted name"}}"#).unwrap();
        let Tree::Partial(partial) = &scope.data[0] else {
            panic!("expected partial");
        };

        assert_eq!(partial.name, "card");
        assert_eq!(path(partial.context.as_ref().unwrap()).text, "person");
        assert_eq!(partial.hash.pairs[0].0.name, "title");

        let Tree::Partial(partial) = &scope.data[1] else {
            panic!("expected partial");
        };
        assert_eq!(partial.name, "quoted name");
        assert!(partial.context.is_none());
    }

    #[test]
    fn test_parse_comments_and_unescaped() {
        let scope = parse("{{! hi }}{{{html}}}{{& raw}}").unwrap();

        assert_eq!(scope.data[0], Tree::Comment((3..7).into()));
        assert!(!output(&scope.data[1]).escape);
        assert_eq!(output(&scope.data[1]).region, (9..19).into());
        assert!(!output(&scope.data[2]).escape);
    }

    #[test]
    fn test_error_unbalanced_block() {
        let error = parse("{{#if a}}\n{{/each}}").unwrap_err();

        assert_eq!(error.kind(), Kind::Parse(ParseKind::UnbalancedBlock));
        assert_eq!(
            error.positions(),
            &[
                Position { line: 2, column: 1 },
                Position { line: 1, column: 1 }
            ]
        );
    }

    #[test]
    fn test_error_close_without_open() {
        assert_eq!(
            parse_error("text {{/if}}"),
            Kind::Parse(ParseKind::UnbalancedBlock)
        );
    }

    #[test]
    fn test_error_unclosed_block() {
        assert_eq!(
            parse_error("{{#each items}}{{this}}"),
            Kind::Parse(ParseKind::UnclosedBlock)
        );
        assert_eq!(
            parse_error("{{#if a}}{{else if b}}"),
            Kind::Parse(ParseKind::UnclosedBlock)
        );
    }

    #[test]
    fn test_error_builtin_arity() {
        assert_eq!(
            parse_error("{{#if}}x{{/if}}"),
            Kind::Parse(ParseKind::MalformedArguments)
        );
        assert_eq!(
            parse_error("{{#each a b}}x{{/each}}"),
            Kind::Parse(ParseKind::MalformedArguments)
        );
    }

    #[test]
    fn test_error_hash_rules() {
        assert_eq!(
            parse_error("{{h a=1 a=2}}"),
            Kind::Parse(ParseKind::DuplicateHashKey)
        );
        assert_eq!(
            parse_error("{{h a=1 b}}"),
            Kind::Parse(ParseKind::MalformedArguments)
        );
    }

    #[test]
    fn test_error_else_outside_block() {
        assert_eq!(
            parse_error("{{else}}"),
            Kind::Parse(ParseKind::UnexpectedToken)
        );
        assert_eq!(
            parse_error("{{#if a}}{{else}}{{else}}{{/if}}"),
            Kind::Parse(ParseKind::UnexpectedToken)
        );
    }

    #[test]
    fn test_error_invalid_number() {
        assert_eq!(
            parse_error("{{h 1.2.3}}"),
            Kind::Parse(ParseKind::InvalidNumber)
        );
    }

    #[test]
    fn test_error_separated_path() {
        assert_eq!(
            parse_error("{{person. name}}"),
            Kind::Parse(ParseKind::UnexpectedToken)
        );
    }
}
