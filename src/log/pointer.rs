use super::{RESET, YELLOW};
use crate::region::Region;
use std::{
    cmp::max,
    fmt::{Formatter, Result},
};
use unicode_width::UnicodeWidthStr;

const BLANK: &str = "";
const PIPE: &str = "|";
const EQUAL: &str = "=";
const HIGHLIGHT: &str = "^";

/// Points to a specific location within source text.
#[derive(Debug, PartialEq)]
pub struct Pointer {
    /// The line that the Pointer is pointing to, zero indexed.
    line: usize,
    /// The display column that the Pointer is pointing to, zero indexed.
    column: usize,
    /// The display width of the highlighted text.
    length: usize,
    /// The line of text that is being pointed to.
    text: String,
}

impl Pointer {
    /// Create a new Pointer over the given source text and Region.
    pub fn new(source: &str, region: Region) -> Self {
        let lines: Vec<_> = source.split_terminator('\n').collect();
        let (line, column) = locate(&lines, region.begin);
        let highlighted = region.literal(source);
        let length = max(1, highlighted.lines().next().map(width).unwrap_or(0));
        let text = lines
            .get(line)
            .or(lines.last())
            .map(|line| line.to_string())
            .unwrap_or_default();

        Self {
            line,
            column,
            length,
            text,
        }
    }

    /// Write the visualization to the given Formatter.
    pub fn display(
        &self,
        formatter: &mut Formatter<'_>,
        template: Option<&str>,
        help: Option<&str>,
    ) -> Result {
        let num = (self.line + 1).to_string();
        let col = self.column + 1;
        let pad = width(&num);
        let align = self.column + self.length;

        let name = template.unwrap_or("?");
        let text = &self.text;
        let underline = HIGHLIGHT.repeat(self.length);

        write!(
            formatter,
            "\n {BLANK:pad$}--> {name}:{num}:{col}\
             \n {BLANK:pad$} {PIPE}\
             \n {num:>} {PIPE} {text}\
             \n {BLANK:pad$} {PIPE} {YELLOW}{underline:>align$}{RESET}\
             \n {BLANK:pad$} {PIPE}\n",
        )?;

        if let Some(help) = help {
            writeln!(formatter, "{BLANK:pad$} {EQUAL} help: {help}")?;
        }

        Ok(())
    }
}

/// Get the zero indexed line and display column of the byte offset.
fn locate(lines: &[&str], offset: usize) -> (usize, usize) {
    let mut consumed = 0;

    for (index, line) in lines.iter().enumerate() {
        let next = consumed + line.len() + 1;
        if offset < next {
            let prefix = line.get(..offset - consumed).unwrap_or(line);
            return (index, width(prefix));
        }
        consumed = next;
    }

    let last = lines.last().map(|line| width(line)).unwrap_or(0);

    (lines.len().saturating_sub(1), last)
}

fn width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}
