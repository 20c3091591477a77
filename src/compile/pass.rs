//! Truthiness normalization.
//!
//! The parser wraps every expression that decides between two bodies in
//! [`Expression::Boolish`]. This pass rewrites each of them into
//! [`Expression::Truthy`], which lowering turns into a call to
//! [`is_truthy`][`crate::is_truthy`]. No `Boolish` survives the pass.
use crate::compile::{
    tree::{Block, Call, Expression, Hash, Output, Partial, Tree},
    Scope,
};

/// Rewrite every [`Expression::Boolish`] within the [`Scope`].
pub fn normalize(scope: Scope) -> Scope {
    Scope {
        data: scope.data.into_iter().map(normalize_tree).collect(),
    }
}

fn normalize_tree(tree: Tree) -> Tree {
    match tree {
        Tree::Output(output) => Tree::Output(Output {
            expression: normalize_expression(output.expression),
            ..output
        }),
        Tree::Block(block) => Tree::Block(Block {
            arguments: normalize_all(block.arguments),
            hash: normalize_hash(block.hash),
            condition: block.condition.map(normalize_expression),
            template: normalize(block.template),
            inverse: normalize(block.inverse),
            ..block
        }),
        Tree::Partial(partial) => Tree::Partial(Partial {
            context: partial.context.map(normalize_expression),
            hash: normalize_hash(partial.hash),
            ..partial
        }),
        other => other,
    }
}

fn normalize_expression(expression: Expression) -> Expression {
    match expression {
        Expression::Boolish(inner) | Expression::Truthy(inner) => {
            Expression::Truthy(Box::new(normalize_expression(*inner)))
        }
        Expression::Call(call) => Expression::Call(Call {
            arguments: normalize_all(call.arguments),
            hash: normalize_hash(call.hash),
            ..call
        }),
        other => other,
    }
}

fn normalize_all(expressions: Vec<Expression>) -> Vec<Expression> {
    expressions.into_iter().map(normalize_expression).collect()
}

fn normalize_hash(hash: Hash) -> Hash {
    Hash {
        pairs: hash
            .pairs
            .into_iter()
            .map(|(key, value)| (key, normalize_expression(value)))
            .collect(),
    }
}
