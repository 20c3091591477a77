mod lex;
mod parse;
mod pass;
mod template;

pub(crate) mod lower;
pub(crate) mod syntax;

pub use crate::compile::{
    parse::{scope::Scope, tree, Parser},
    template::Template,
};

use crate::{log::Error, Engine};
use morel::Finder;
use std::sync::Arc;
use tracing::debug;

/// Compile a [`Template`] from the given text.
///
/// Provides a shortcut to quickly compile a `Template` without creating
/// an `Engine`.
///
/// # Examples
///
/// ```
/// use whisker::compile;
///
/// let template = compile("{{ name }}");
/// assert!(template.is_ok())
/// ```
pub fn compile(text: &str) -> Result<Template, Error> {
    Engine::default().compile(text)
}

/// Compile a [`Template`] with the markers recognized by the given [`Finder`].
///
/// When a name is given, it is attached to every error the `Template`
/// produces while compiling or rendering.
pub(crate) fn compile_with(
    text: &str,
    finder: &Finder,
    name: Option<&str>,
) -> Result<Template, Error> {
    let scope = Parser::new(text, finder).compile().map_err(|error| match name {
        Some(name) => error.with_name(name),
        None => error,
    })?;

    let source: Arc<str> = Arc::from(text);
    let name: Option<Arc<str>> = name.map(Arc::from);
    let units = lower::lower(pass::normalize(scope), source.clone(), name.clone());
    debug!(name = ?name, units = units.len(), "compiled template");

    Ok(Template::new(name, source, units))
}
