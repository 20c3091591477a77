use crate::render::stringify;
use serde_json::Value;
use std::fmt::{Result, Write};

/// Describes how text written through a [`Pipe`] is escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Escape {
    /// Replace `&`, `<`, `>`, `"` and `'` with HTML entities.
    #[default]
    Html,
    /// Write text unchanged.
    None,
}

impl Escape {
    /// Append the text to the buffer, escaped according to this policy.
    fn push(self, buffer: &mut String, text: &str) {
        match self {
            Escape::None => buffer.push_str(text),
            Escape::Html => {
                for char in text.chars() {
                    match char {
                        '&' => buffer.push_str("&amp;"),
                        '<' => buffer.push_str("&lt;"),
                        '>' => buffer.push_str("&gt;"),
                        '"' => buffer.push_str("&quot;"),
                        '\'' => buffer.push_str("&#39;"),
                        c => buffer.push(c),
                    }
                }
            }
        }
    }
}

/// Wraps the output buffer of a render by providing methods that write to it
/// with or without escaping.
///
/// Helpers receive a `Pipe` to write their output.
///
/// # Examples
///
/// ```
/// use std::fmt::Write;
/// use whisker::{Escape, Pipe};
///
/// let mut buffer = String::new();
/// let mut pipe = Pipe::new(&mut buffer, Escape::Html);
///
/// pipe.write("<b>").unwrap();
/// pipe.write_safe("<i>").unwrap();
/// write!(pipe, "{}", 1 < 2).unwrap();
///
/// assert_eq!(buffer, "&lt;b&gt;<i>true");
/// ```
pub struct Pipe<'buffer> {
    buffer: &'buffer mut String,
    escape: Escape,
}

impl<'buffer> Pipe<'buffer> {
    /// Create a new Pipe that writes to the given buffer.
    #[inline]
    pub fn new(buffer: &'buffer mut String, escape: Escape) -> Self {
        Self { buffer, escape }
    }

    /// Return the active [`Escape`] policy.
    #[inline]
    pub fn escape(&self) -> Escape {
        self.escape
    }

    /// Write the text, escaped by the active policy.
    #[inline]
    pub fn write(&mut self, text: &str) -> Result {
        self.escape.push(self.buffer, text);

        Ok(())
    }

    /// Write the text without escaping.
    #[inline]
    pub fn write_safe(&mut self, text: &str) -> Result {
        self.buffer.push_str(text);

        Ok(())
    }

    /// Write the given [`Value`], escaped by the active policy.
    ///
    /// Strings are written verbatim, `null` writes nothing, arrays are
    /// joined with commas and objects are written as `[object Object]`.
    pub fn write_value(&mut self, value: &Value) -> Result {
        self.write(&stringify(value))
    }

    /// Return a [`Pipe`] over the same buffer with another [`Escape`] policy.
    #[inline]
    pub fn scoped(&mut self, escape: Escape) -> Pipe<'_> {
        Pipe {
            buffer: &mut *self.buffer,
            escape,
        }
    }
}

impl Write for Pipe<'_> {
    #[inline]
    fn write_str(&mut self, s: &str) -> Result {
        self.write(s)
    }
}
