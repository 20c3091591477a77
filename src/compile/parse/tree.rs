//! The Abstract Syntax Tree produced by the [`Parser`][`super::Parser`].
use crate::{compile::Scope, region::Region};
use serde_json::Value;

/// One node of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    /// Literal text.
    Raw(Region),
    /// A mustache that writes the value of an [`Expression`].
    Output(Output),
    /// A block, opened with `{{#name}}` or `{{^name}}`.
    Block(Block),
    /// A partial inclusion, `{{> name}}`.
    Partial(Partial),
    /// A comment, which has no effect on the output.
    Comment(Region),
}

/// A mustache such as `{{ name }}`, `{{{ html }}}` or `{{ helper arg }}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// The path, literal or helper [`Call`] to write.
    pub expression: Expression,
    /// False for `{{{ }}}` and `{{& }}`.
    pub escape: bool,
    /// The area covered by the whole mustache.
    pub region: Region,
}

/// A block and its bodies.
///
/// ```text
/// {{#name arguments hash}} template {{else}} inverse {{/name}}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// The helper name, or the path of a section such as `{{#person}}`.
    pub name: Path,
    /// Positional arguments.
    pub arguments: Vec<Expression>,
    /// Hash arguments.
    pub hash: Hash,
    /// The expression that decides between the two bodies, wrapped in
    /// [`Expression::Boolish`] by the parser.
    ///
    /// Present for `if`, `unless`, inverted blocks and sections.
    pub condition: Option<Expression>,
    /// Rendered when the block is truthy, or by `Options::template`.
    pub template: Scope,
    /// The `{{else}}` body.
    pub inverse: Scope,
    /// The area covered by the opening mustache.
    pub region: Region,
    /// The area covered by the closing mustache.
    pub close: Region,
}

/// A partial inclusion.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    /// The name the partial is registered with.
    pub name: String,
    /// An explicit context, `{{> name context}}`.
    pub context: Option<Expression>,
    /// Values merged over the context, `{{> name key=value}}`.
    pub hash: Hash,
    pub region: Region,
}

/// A value produced while rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A string, number, boolean or null literal.
    Literal(Literal),
    /// A lookup into the context.
    Path(Path),
    /// A helper invocation.
    ///
    /// When it appears as an argument, it is a sub-expression and is
    /// evaluated before the call that contains it.
    Call(Call),
    /// Marks an expression that is used to decide between two bodies.
    ///
    /// Only the parser creates this, and the truthiness pass replaces
    /// every one of them with [`Expression::Truthy`].
    Boolish(Box<Expression>),
    /// Applies the truthiness predicate to the inner expression, producing
    /// a boolean.
    Truthy(Box<Expression>),
}

impl Expression {
    /// Return the area covered by the [`Expression`].
    pub fn get_region(&self) -> Region {
        match self {
            Expression::Literal(literal) => literal.region,
            Expression::Path(path) => path.region,
            Expression::Call(call) => call.region,
            Expression::Boolish(inner) | Expression::Truthy(inner) => inner.get_region(),
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
    pub region: Region,
}

/// A helper invocation, `name arguments hash`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: Identifier,
    pub arguments: Vec<Expression>,
    pub hash: Hash,
    pub region: Region,
}

/// A name within the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub region: Region,
}

/// Hash arguments in the order they were written.
///
/// Keys are unique, the parser rejects duplicates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hash {
    pub pairs: Vec<(Identifier, Expression)>,
}

impl Hash {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A path into the context, such as `../person.[first name]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub segments: Vec<Segment>,
    /// The path as written.
    pub text: String,
    pub region: Region,
}

impl Path {
    /// Return the name of the helper this path could refer to, which is only
    /// possible for a single plain identifier.
    pub fn helper_name(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [Segment::Identifier(name)] => Some(name),
            _ => None,
        }
    }
}

/// One component of a [`Path`].
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// `..`, moves to the parent context.
    Parent,
    /// `this` or `.`, the current value.
    This,
    /// A plain identifier, looked up as a key.
    Identifier(String),
    /// A bracketed segment literal, looked up verbatim as a key or index.
    Literal(String),
    /// A data variable, such as `@index` or `@root`.
    Data(String),
}
