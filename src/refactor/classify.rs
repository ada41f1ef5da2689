//! Three-way classification of a node inside a concatenation chain.

use crate::ast::{BinOp, ExprId, ExprKind, Literal, StringStyle, SyntaxTree};
use crate::types::TypeOracle;

/// How the flattener treats one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'t> {
    /// A string literal leaf, with its unescaped value.
    Literal { text: &'t str, style: StringStyle },
    /// A `+` whose static result type is string; both operands belong to
    /// the chain.
    Concat { left: ExprId, right: ExprId },
    /// Anything else, embedded whole behind a placeholder.
    Opaque,
}

impl Classification<'_> {
    pub fn is_concat(&self) -> bool {
        matches!(self, Classification::Concat { .. })
    }
}

/// Classify `id`.
///
/// A `+` node only counts as a concatenation when the oracle resolves its
/// result type to string. Numeric additions and nodes the oracle cannot
/// resolve are opaque, however string-like they look.
pub fn classify<'t, O>(tree: &'t SyntaxTree, id: ExprId, oracle: &O) -> Classification<'t>
where
    O: TypeOracle + ?Sized,
{
    match tree.kind(id) {
        ExprKind::Literal(Literal::String { value, style }) => Classification::Literal {
            text: value,
            style: *style,
        },
        ExprKind::Binary {
            left,
            op: BinOp::Add,
            right,
        } if oracle.is_string(tree, id) => Classification::Concat {
            left: *left,
            right: *right,
        },
        _ => Classification::Opaque,
    }
}
