use crate::compile::tree::Segment;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Access to the members of a value by key.
///
/// Arrays are indexed by keys that parse as a number, so `items.[0]`
/// and `items.0` both reach the first item.
pub trait Lookup {
    /// Return the member with the given key, if any.
    fn lookup(&self, key: &str) -> Option<&Value>;
}

impl Lookup for Value {
    fn lookup(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.lookup(key),
            Value::Array(array) => array.as_slice().lookup(key),
            _ => None,
        }
    }
}

impl Lookup for Map<String, Value> {
    #[inline]
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl Lookup for [Value] {
    /// Only canonical indexes reach an item, `01` and `+1` are plain keys.
    fn lookup(&self, key: &str) -> Option<&Value> {
        let canonical = key == "0"
            || (!key.starts_with('0') && !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()));
        if !canonical {
            return None;
        }

        key.parse::<usize>().ok().and_then(|index| self.get(index))
    }
}

/// Data variables of an iteration, available as `@index`, `@key`,
/// `@first` and `@last`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locals {
    pub index: usize,
    /// Present when iterating the members of an object.
    pub key: Option<String>,
    pub first: bool,
    pub last: bool,
}

/// One frame of the context chain that paths are resolved against.
///
/// Frames are never changed, entering a block pushes a new frame that
/// points back at its parent.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use whisker::Context;
///
/// let root = json!({"title": "Inbox", "user": {"name": "taylor"}});
/// let context = Context::new(&root);
/// let user = context.push(&root["user"]);
///
/// assert_eq!(user.value()["name"], "taylor");
/// assert_eq!(user.parent().map(|parent| parent.value()), Some(&root));
/// ```
#[derive(Debug, Clone)]
pub struct Context<'a> {
    value: &'a Value,
    parent: Option<&'a Context<'a>>,
    locals: Option<Locals>,
}

impl<'a> Context<'a> {
    /// Create a root [`Context`] over the given [`Value`].
    #[inline]
    pub fn new(value: &'a Value) -> Self {
        Self {
            value,
            parent: None,
            locals: None,
        }
    }

    /// Return a new [`Context`] for the given [`Value`], with this one as
    /// its parent.
    #[inline]
    pub fn push<'b>(&'b self, value: &'b Value) -> Context<'b> {
        Context {
            value,
            parent: Some(self),
            locals: None,
        }
    }

    /// Set the iteration [`Locals`] of this frame.
    #[inline]
    pub fn with_locals(mut self, locals: Locals) -> Self {
        self.locals = Some(locals);

        self
    }

    /// Return the current value.
    #[inline]
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Return the parent frame, if any.
    #[inline]
    pub fn parent(&self) -> Option<&'a Context<'a>> {
        self.parent
    }

    /// Return the value of the outermost frame.
    pub fn root(&self) -> &'a Value {
        let mut root = self.value;
        let mut parent = self.parent;
        while let Some(frame) = parent {
            root = frame.value;
            parent = frame.parent;
        }

        root
    }

    /// Return the [`Locals`] of the nearest iteration.
    pub fn locals(&self) -> Option<&Locals> {
        if self.locals.is_some() {
            return self.locals.as_ref();
        }

        let mut parent = self.parent;
        while let Some(frame) = parent {
            if frame.locals.is_some() {
                return frame.locals.as_ref();
            }
            parent = frame.parent;
        }

        None
    }

    /// Resolve a path.
    ///
    /// Returns `None` when any part of the path is missing, resolution
    /// never fails.
    pub fn resolve(&self, segments: &[Segment]) -> Option<Cow<'a, Value>> {
        let mut rest = segments;
        let mut frame: Option<&Context<'a>> = Some(self);

        while let [Segment::Parent, tail @ ..] = rest {
            frame = frame.and_then(|frame| frame.parent);
            rest = tail;
        }
        let frame = frame?;

        let (mut current, rest) = match rest {
            [Segment::Data(name), tail @ ..] => (frame.data(name)?, tail),
            _ => (Cow::Borrowed(frame.value), rest),
        };

        for segment in rest {
            let key = match segment {
                Segment::This => continue,
                Segment::Identifier(key) | Segment::Literal(key) | Segment::Data(key) => key,
                Segment::Parent => return None,
            };

            current = match current {
                Cow::Borrowed(value) => Cow::Borrowed(value.lookup(key)?),
                Cow::Owned(value) => Cow::Owned(value.lookup(key)?.clone()),
            };
        }

        Some(current)
    }

    /// Return the value of a data variable such as `@index` or `@root`.
    fn data(&self, name: &str) -> Option<Cow<'a, Value>> {
        if name == "root" {
            return Some(Cow::Borrowed(self.root()));
        }

        let locals = self.locals()?;
        let value = match name {
            "index" => Value::from(locals.index),
            "key" => Value::String(locals.key.clone()?),
            "first" => Value::Bool(locals.first),
            "last" => Value::Bool(locals.last),
            _ => return None,
        };

        Some(Cow::Owned(value))
    }
}
