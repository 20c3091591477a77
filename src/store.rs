use crate::log::{Error, UNSERIALIZABLE};
use serde::Serialize;
use serde_json::{to_value, Map, Value};

/// Provides storage for data that templates can be rendered against.
///
/// A `Store` serializes as an object, with its keys in insertion order.
///
/// # Examples
///
/// ```
/// use whisker::{render, compile, Store};
///
/// let template = compile("{{ greeting }}, {{ name }}!").unwrap();
/// let store = Store::new().with_must("greeting", "hello").with_must("name", "taylor");
///
/// assert_eq!(render(&template, &store).unwrap(), "hello, taylor!");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Store {
    data: Map<String, Value>,
}

impl Store {
    /// Create a new Store.
    #[inline]
    pub fn new() -> Self {
        Self { data: Map::new() }
    }

    /// Insert the value into the Store.
    ///
    /// # Errors
    ///
    /// Returns an error if the serialization fails.
    pub fn insert<S, T>(&mut self, key: S, value: T) -> Result<(), Error>
    where
        S: Into<String>,
        T: Serialize,
    {
        let value = to_value(value)
            .map_err(|error| Error::build(UNSERIALIZABLE).with_help(error.to_string()))?;
        self.data.insert(key.into(), value);

        Ok(())
    }

    /// Insert the value into the Store.
    ///
    /// # Panics
    ///
    /// Will panic if the serialization fails.
    #[inline]
    pub fn insert_must<S, T>(&mut self, key: S, value: T)
    where
        S: Into<String>,
        T: Serialize,
    {
        if let Err(error) = self.insert(key, value) {
            panic!("{error}");
        }
    }

    /// Insert the value into the Store.
    ///
    /// Returns the Store, so additional methods may be chained.
    ///
    /// # Errors
    ///
    /// Returns an error if the serialization fails.
    pub fn with<S, T>(mut self, key: S, value: T) -> Result<Self, Error>
    where
        S: Into<String>,
        T: Serialize,
    {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Insert the value into the Store.
    ///
    /// Returns the Store, so additional methods may be chained.
    ///
    /// # Panics
    ///
    /// Will panic if the serialization fails.
    #[inline]
    pub fn with_must<S, T>(mut self, key: S, value: T) -> Self
    where
        S: Into<String>,
        T: Serialize,
    {
        self.insert_must(key, value);
        self
    }

    /// Get the value of the given key, if any.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}
