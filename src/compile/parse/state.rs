use crate::{
    compile::{
        tree::{Block, Tree},
        Scope,
    },
    region::Region,
};
use std::mem;

/// A block that has been opened but not yet closed.
pub struct Frame {
    /// The name as written in the open tag, the close tag must repeat it.
    pub name: String,
    /// The [`Block`] under construction.
    pub block: Block,
    /// True once `{{else}}` has been seen.
    pub in_inverse: bool,
    /// True when the bodies trade places at close, as with `{{^name}}`
    /// and `{{#unless}}`.
    pub swap: bool,
    /// True when opened by `{{else name}}`, the block closes with its parent.
    pub chained: bool,
}

impl Frame {
    #[inline]
    pub fn new(name: String, block: Block, swap: bool) -> Self {
        Self {
            name,
            block,
            in_inverse: false,
            swap,
            chained: false,
        }
    }

    /// Return the [`Scope`] that new trees are pushed into.
    pub fn current(&mut self) -> &mut Scope {
        if self.in_inverse {
            &mut self.block.inverse
        } else {
            &mut self.block.template
        }
    }

    /// Close the block, returning the finished [`Tree`].
    pub fn finish(mut self, close: Region) -> Tree {
        if self.swap {
            mem::swap(&mut self.block.template, &mut self.block.inverse);
        }
        self.block.close = close;

        Tree::Block(self.block)
    }
}
