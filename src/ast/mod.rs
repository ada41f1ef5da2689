//! Syntax tree types for the expressions the engine rewrites.
//!
//! - **Expression layer** ([`expr`]): the node kinds, operators and the
//!   [`ExprId`] handle used to refer to nodes.
//! - **Tree layer** ([`tree`]): the [`SyntaxTree`] arena that owns the
//!   nodes, their spans, parent links and the original source text.
//!
//! Trees are read-only once built. The engine never rewrites them; it only
//! describes a replacement for a span.

pub mod expr;
pub mod literal;
pub mod span;
pub mod tree;

// Convenience re-exports
pub use expr::*;
pub use literal::{Literal, StringStyle};
pub use span::{Span, Spanned};
pub use tree::SyntaxTree;
pub(crate) use tree::TreeBuilder;
