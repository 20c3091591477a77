//! Whisker - Template Engine
//!
//! A logic-less template engine in the style of Handlebars. Templates are
//! compiled once into a tree of closures, then rendered any number of times
//! against data that implements `serde::Serialize`.
//!
//! ```
//! use serde_json::json;
//! use whisker::Engine;
//!
//! let engine = Engine::default();
//! let template = engine
//!     .compile("{{#each people}}{{#if @first}}{{else}}, {{/if}}{{name}}{{/each}}")
//!     .unwrap();
//! let output = engine.render(&template, &json!({"people": [{"name": "ada"}, {"name": "bo"}]}));
//!
//! assert_eq!(output.unwrap(), "ada, bo");
//! ```
mod compile;
mod engine;
mod helper;
mod log;
mod pipe;
mod region;
mod render;
mod store;

pub use compile::{compile, syntax::Builder, Template};
pub use engine::Engine;
pub use helper::{Arguments, Helper, Options};
pub use log::{Error, Kind, LexKind, ParseKind};
pub use pipe::{Escape, Pipe};
pub use region::{Position, Region};
pub use render::{is_truthy, render, Context, Locals, Lookup};
pub use store::Store;
