//! Helpers are functions that templates invoke by name.
//!
//! An inline helper is called from a mustache, `{{name arguments}}`, and
//! writes its output to a [`Pipe`]. A block helper is called from a block,
//! `{{#name arguments}} ... {{else}} ... {{/name}}`, and decides which of
//! the two bodies to render through [`Options`].
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use whisker::Engine;
//!
//! let engine = Engine::default()
//!     .with_inline("shout", |pipe, _, arguments| {
//!         for argument in arguments {
//!             pipe.write(&argument.as_str().unwrap_or_default().to_uppercase())?;
//!         }
//!         Ok(())
//!     })
//!     .unwrap()
//!     .with_block("twice", |pipe, options, context, _| {
//!         options.template(pipe, context)?;
//!         options.template(pipe, context)
//!     })
//!     .unwrap();
//!
//! let template = engine.compile("{{#twice}}{{shout name}}{{/twice}}").unwrap();
//! let output = engine.render(&template, &json!({"name": "hey"})).unwrap();
//!
//! assert_eq!(output, "HEYHEY");
//! ```
use crate::{
    compile::lower::Unit,
    log::Error,
    pipe::Pipe,
    render::{stringify, Context, Lookup, Renderer},
};
use serde_json::{Map, Value};
use std::{
    fmt::{Debug, Formatter},
    ops::Index,
    slice::Iter,
    sync::Arc,
};
use tracing::{debug, error, info, trace, warn};

/// Signature of an inline helper.
pub type InlineFn =
    dyn Fn(&mut Pipe, &Context, &Arguments) -> Result<(), Error> + Send + Sync;

/// Signature of a block helper.
pub type BlockFn =
    dyn Fn(&mut Pipe, &Options, &Context, &Arguments) -> Result<(), Error> + Send + Sync;

/// A helper registered with an [`Engine`][`crate::Engine`].
#[derive(Clone)]
pub enum Helper {
    /// Called from a mustache, `{{name arguments}}`.
    Inline(Arc<InlineFn>),
    /// Called from a block, `{{#name arguments}} ... {{/name}}`.
    Block(Arc<BlockFn>),
}

impl Helper {
    /// Create an inline [`Helper`] from the given function.
    pub fn inline<F>(helper: F) -> Self
    where
        F: Fn(&mut Pipe, &Context, &Arguments) -> Result<(), Error> + Send + Sync + 'static,
    {
        Helper::Inline(Arc::new(helper))
    }

    /// Create a block [`Helper`] from the given function.
    pub fn block<F>(helper: F) -> Self
    where
        F: Fn(&mut Pipe, &Options, &Context, &Arguments) -> Result<(), Error>
            + Send
            + Sync
            + 'static,
    {
        Helper::Block(Arc::new(helper))
    }
}

impl Debug for Helper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Helper::Inline(_) => write!(f, "Helper::Inline"),
            Helper::Block(_) => write!(f, "Helper::Block"),
        }
    }
}

/// The evaluated arguments of a helper call, in the order they were written.
///
/// When the call has hash arguments, such as `key=value`, they are collected
/// into an object which is the last argument.
///
/// # Examples
///
/// ```
/// use serde_json::{json, Map};
/// use whisker::Arguments;
///
/// let mut hash = Map::new();
/// hash.insert("item1".into(), json!("val1"));
///
/// let arguments = Arguments::new(vec![json!("foo"), json!("bar")], Some(hash));
///
/// assert_eq!(arguments.len(), 3);
/// assert_eq!(arguments[2], json!({"item1": "val1"}));
/// assert_eq!(arguments.positional(), &[json!("foo"), json!("bar")]);
/// assert_eq!(arguments.named("item1"), Some(&json!("val1")));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<Value>,
    /// True when the last value holds the hash arguments.
    hash: bool,
}

impl Arguments {
    /// Create a new [`Arguments`] from positional values and optional hash
    /// arguments.
    pub fn new(mut values: Vec<Value>, hash: Option<Map<String, Value>>) -> Self {
        let has_hash = hash.is_some();
        if let Some(hash) = hash {
            values.push(Value::Object(hash));
        }

        Self {
            values,
            hash: has_hash,
        }
    }

    /// Return the number of arguments, the hash included.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return the argument at the given index, if any.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Iterate over every argument, the hash included.
    #[inline]
    pub fn iter(&self) -> Iter<'_, Value> {
        self.values.iter()
    }

    /// Return the positional arguments.
    pub fn positional(&self) -> &[Value] {
        match self.hash {
            true => &self.values[..self.values.len() - 1],
            false => &self.values,
        }
    }

    /// Return the hash arguments, if any were written.
    pub fn hash(&self) -> Option<&Map<String, Value>> {
        match self.hash {
            true => self.values.last().and_then(Value::as_object),
            false => None,
        }
    }

    /// Return the hash argument with the given key.
    #[inline]
    pub fn named(&self, key: &str) -> Option<&Value> {
        self.hash().and_then(|hash| hash.get(key))
    }
}

impl Index<usize> for Arguments {
    type Output = Value;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a Value;
    type IntoIter = Iter<'a, Value>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Gives a block helper access to the bodies of its block.
pub struct Options<'r> {
    renderer: &'r Renderer<'r>,
    template: &'r [Unit],
    inverse: &'r [Unit],
}

impl<'r> Options<'r> {
    #[inline]
    pub(crate) fn new(renderer: &'r Renderer<'r>, template: &'r [Unit], inverse: &'r [Unit]) -> Self {
        Self {
            renderer,
            template,
            inverse,
        }
    }

    /// Render the main body of the block with the given [`Context`].
    pub fn template(&self, pipe: &mut Pipe, context: &Context) -> Result<(), Error> {
        self.renderer.render_units(self.template, context, pipe)
    }

    /// Render the `{{else}}` body of the block with the given [`Context`].
    ///
    /// Renders nothing when the block has no `{{else}}`.
    pub fn inverse(&self, pipe: &mut Pipe, context: &Context) -> Result<(), Error> {
        self.renderer.render_units(self.inverse, context, pipe)
    }
}

/// Return the inline helpers that every [`Engine`][`crate::Engine`] starts with.
pub(crate) fn builtins() -> Vec<(&'static str, Helper)> {
    vec![
        ("lookup", Helper::inline(lookup)),
        ("log", Helper::inline(log)),
    ]
}

/// `{{lookup object key}}`, write the member of `object` named by `key`.
fn lookup(pipe: &mut Pipe, _: &Context, arguments: &Arguments) -> Result<(), Error> {
    let [target, key] = arguments.positional() else {
        return Err(Error::build("helper `lookup` expects two arguments")
            .with_help("call it as `{{lookup object key}}`"));
    };

    match target.lookup(&stringify(key)) {
        Some(value) => Ok(pipe.write_value(value)?),
        None => Ok(()),
    }
}

/// `{{log arguments level="info"}}`, emit the arguments as an event.
fn log(_: &mut Pipe, _: &Context, arguments: &Arguments) -> Result<(), Error> {
    let message = arguments
        .positional()
        .iter()
        .map(stringify)
        .collect::<Vec<_>>()
        .join(" ");

    match arguments.named("level").and_then(Value::as_str) {
        Some("trace") => trace!(target: "whisker::log", "{message}"),
        Some("debug") => debug!(target: "whisker::log", "{message}"),
        Some("warn") => warn!(target: "whisker::log", "{message}"),
        Some("error") => error!(target: "whisker::log", "{message}"),
        _ => info!(target: "whisker::log", "{message}"),
    }

    Ok(())
}
