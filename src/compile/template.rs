use crate::compile::lower::Unit;
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

/// A compiled [`Template`] that can be rendered with any serializable data.
///
/// Templates are immutable and cheap to clone, the compiled units are shared
/// between clones and may be rendered from many threads at once.
#[derive(Clone)]
pub struct Template {
    /// The name of the [`Template`], present when it was registered as a partial.
    name: Option<Arc<str>>,
    /// Source text the `Template` was compiled from.
    source: Arc<str>,
    units: Arc<[Unit]>,
}

impl Template {
    #[inline]
    pub(crate) fn new(name: Option<Arc<str>>, source: Arc<str>, units: Vec<Unit>) -> Self {
        Self {
            name,
            source,
            units: units.into(),
        }
    }

    /// Return the name of the [`Template`], if it has one.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Return the source text of the [`Template`].
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub(crate) fn units(&self) -> &[Unit] {
        &self.units
    }
}

impl Debug for Template {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("units", &self.units.len())
            .finish()
    }
}
