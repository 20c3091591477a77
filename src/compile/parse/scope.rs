use crate::compile::tree::Tree;

/// A distinct set of Tree instances, such as the body of a block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    pub data: Vec<Tree>,
}

impl Scope {
    /// Create a new, empty Scope.
    #[inline]
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    #[inline]
    pub fn push(&mut self, tree: Tree) {
        self.data.push(tree);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
