//! Errors and their visualization.
mod error;
mod message;
mod pointer;

pub use error::{Error, Kind, LexKind, ParseKind};
pub use message::*;
pub use pointer::Pointer;

const RED: &str = "\x1B[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1B[0m";
