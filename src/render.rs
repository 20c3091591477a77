mod context;
mod value;

pub use context::{Context, Locals, Lookup};
pub use value::{is_truthy, stringify};

use crate::{
    compile::{lower::Unit, Template},
    log::{Error, PARTIAL_RECURSION},
    pipe::Pipe,
    Engine,
};
use serde_json::Value;
use std::{cell::RefCell, ptr};
use tracing::debug;

/// Render a [`Template`] with a default [`Engine`].
///
/// Provides a shortcut to quickly render a `Template` when no helpers or
/// partials are needed.
///
/// # Errors
///
/// Returns an [`Error`] if the data cannot be serialized, or rendering fails.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use whisker::{compile, render};
///
/// let template = compile("hello, {{ name }}!").unwrap();
/// let output = render(&template, &json!({"name": "taylor"}));
///
/// assert_eq!(output.unwrap(), "hello, taylor!");
/// ```
pub fn render<T>(template: &Template, data: &T) -> Result<String, Error>
where
    T: serde::Serialize,
{
    Engine::default().render(template, data)
}

/// State of a single render call.
///
/// Every call owns its own `Renderer`, so a [`Template`] may be rendered
/// from many threads at once.
pub struct Renderer<'engine> {
    /// The engine that provides helpers and partials.
    engine: &'engine Engine,
    /// Partials currently being rendered, with the address of their context value.
    partials: RefCell<Vec<(String, *const Value)>>,
}

impl<'engine> Renderer<'engine> {
    /// Create a new Renderer.
    #[inline]
    pub fn new(engine: &'engine Engine) -> Self {
        Self {
            engine,
            partials: RefCell::new(vec![]),
        }
    }

    /// Return the [`Engine`] this render belongs to.
    #[inline]
    pub fn engine(&self) -> &'engine Engine {
        self.engine
    }

    /// Render the [`Template`] with the given data as the root context.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if any part of the `Template` fails to render.
    pub fn render(&self, template: &Template, value: &Value) -> Result<String, Error> {
        let mut buffer = String::with_capacity(template.source().len());
        let mut pipe = Pipe::new(&mut buffer, self.engine.get_escape());

        self.render_units(template.units(), &Context::new(value), &mut pipe)?;

        Ok(buffer)
    }

    /// Render each [`Unit`] in order.
    pub(crate) fn render_units(
        &self,
        units: &[Unit],
        context: &Context,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        for unit in units {
            unit(self, context, pipe)?;
        }

        Ok(())
    }

    /// Render a partial [`Template`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the partial is already being rendered with
    /// the same context value, or partials are nested deeper than the
    /// engine allows.
    pub(crate) fn render_partial(
        &self,
        name: &str,
        template: &Template,
        context: &Context,
        pipe: &mut Pipe,
    ) -> Result<(), Error> {
        let address: *const Value = context.value();
        let depth = {
            let partials = self.partials.borrow();
            if partials.len() >= self.engine.get_depth() {
                return Err(Error::build(PARTIAL_RECURSION).with_help(format!(
                    "partials are nested more than {} levels deep, \
                    raise the limit with `.set_depth`",
                    self.engine.get_depth()
                )));
            }
            if partials
                .iter()
                .any(|(entered, pointer)| entered == name && ptr::eq(*pointer, address))
            {
                return Err(Error::build(PARTIAL_RECURSION).with_help(format!(
                    "partial `{name}` includes itself with the same context, \
                    which would never finish"
                )));
            }

            partials.len()
        };

        debug!(partial = name, depth, "entering partial");
        self.partials.borrow_mut().push((name.to_owned(), address));
        let result = self.render_units(template.units(), context, pipe);
        self.partials.borrow_mut().pop();

        result
    }
}
