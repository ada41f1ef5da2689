//! Decomposition of a concatenation chain into its ordered leaves.

use std::convert::Infallible;

use tracing::trace;

use super::classify::{Classification, classify};
use crate::ast::{ExprId, StringStyle, SyntaxTree};
use crate::types::TypeOracle;

/// One operand of a flattened chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leaf {
    Literal(LiteralLeaf),
    /// An expression embedded as-is behind a placeholder.
    Opaque(ExprId),
}

impl Leaf {
    /// The node this leaf was taken from. For a merged literal this is the
    /// first literal of the run.
    pub fn source(&self) -> ExprId {
        match self {
            Leaf::Literal(lit) => lit.source,
            Leaf::Opaque(id) => *id,
        }
    }

    pub fn as_literal(&self) -> Option<&LiteralLeaf> {
        match self {
            Leaf::Literal(lit) => Some(lit),
            Leaf::Opaque(_) => None,
        }
    }
}

/// A string literal operand, holding its unescaped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralLeaf {
    pub text: String,
    pub style: StringStyle,
    pub source: ExprId,
}

/// Climb from `node` to the outermost node of its concatenation chain.
///
/// The climb continues while the parent classifies as a string
/// concatenation. Returns `None` when the node it stops on is not a
/// concatenation itself.
pub fn chain_root<O>(tree: &SyntaxTree, node: ExprId, oracle: &O) -> Option<ExprId>
where
    O: TypeOracle + ?Sized,
{
    match climb_with(tree, node, oracle, |_| Ok::<(), Infallible>(())) {
        Ok(root) => root,
        Err(never) => match never {},
    }
}

/// [`chain_root`] with a callback invoked before each step up. An error
/// from the callback stops the climb.
pub(crate) fn climb_with<O, E>(
    tree: &SyntaxTree,
    node: ExprId,
    oracle: &O,
    mut step: impl FnMut(ExprId) -> Result<(), E>,
) -> Result<Option<ExprId>, E>
where
    O: TypeOracle + ?Sized,
{
    let mut current = node;
    while let Some(parent) = tree.parent(current)
        && classify(tree, parent, oracle).is_concat()
    {
        step(parent)?;
        current = parent;
    }
    Ok(classify(tree, current, oracle)
        .is_concat()
        .then_some(current))
}

/// Flatten the chain rooted at `root` into leaves in source order.
///
/// Every internal node is re-classified, so a numeric `+` nested inside a
/// string chain stays a single opaque leaf.
pub fn flatten<O>(tree: &SyntaxTree, root: ExprId, oracle: &O) -> Vec<Leaf>
where
    O: TypeOracle + ?Sized,
{
    match flatten_with(tree, root, oracle, |_, _| Ok::<(), Infallible>(())) {
        Ok(leaves) => leaves,
        Err(never) => match never {},
    }
}

/// [`flatten`] with a callback invoked once per visited node, receiving the
/// node and the number of leaves collected so far. An error from the
/// callback stops the walk.
pub(crate) fn flatten_with<O, E>(
    tree: &SyntaxTree,
    root: ExprId,
    oracle: &O,
    mut visit: impl FnMut(ExprId, usize) -> Result<(), E>,
) -> Result<Vec<Leaf>, E>
where
    O: TypeOracle + ?Sized,
{
    let mut leaves = Vec::new();
    // Chains nest on the left, one level per operand, so walk with an
    // explicit stack instead of recursing.
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        visit(id, leaves.len())?;
        match classify(tree, id, oracle) {
            Classification::Literal { text, style } => {
                trace!(node = %id, ?style, "literal leaf");
                leaves.push(Leaf::Literal(LiteralLeaf {
                    text: text.to_string(),
                    style,
                    source: id,
                }));
            }
            Classification::Concat { left, right } => {
                stack.push(right);
                stack.push(left);
            }
            Classification::Opaque => {
                trace!(node = %id, text = tree.text(id), "opaque leaf");
                leaves.push(Leaf::Opaque(id));
            }
        }
    }

    Ok(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprKind;
    use crate::parser::parse_expr;
    use crate::types::{Type, TypeEnv};

    fn env() -> TypeEnv {
        TypeEnv::new()
            .with_variable("x", Type::Number)
            .with_variable("y", Type::Number)
            .with_variable("name", Type::String)
            .with_variable("cond", Type::Bool)
    }

    fn leaf_texts(tree: &SyntaxTree, leaves: &[Leaf]) -> Vec<String> {
        leaves
            .iter()
            .map(|leaf| match leaf {
                Leaf::Literal(lit) => format!("lit:{}", lit.text),
                Leaf::Opaque(id) => format!("expr:{}", tree.text(*id)),
            })
            .collect()
    }

    #[test]
    fn test_flatten_preserves_order() {
        let tree = parse_expr(r#""a" + name + "b" + x + "c""#).unwrap();
        let leaves = flatten(&tree, tree.root(), &env());
        assert_eq!(
            leaf_texts(&tree, &leaves),
            vec!["lit:a", "expr:name", "lit:b", "expr:x", "lit:c"]
        );
    }

    #[test]
    fn test_numeric_prefix_stays_whole() {
        // (x + y) + "!" parses as ((x + y) + "!"); the inner sum is numeric.
        let tree = parse_expr(r#"x + y + "!""#).unwrap();
        let leaves = flatten(&tree, tree.root(), &env());
        assert_eq!(leaf_texts(&tree, &leaves), vec!["expr:x + y", "lit:!"]);
    }

    #[test]
    fn test_parenthesized_operand_is_one_leaf() {
        let tree = parse_expr(r#""sum: " + (x + y)"#).unwrap();
        let leaves = flatten(&tree, tree.root(), &env());
        assert_eq!(leaf_texts(&tree, &leaves), vec!["lit:sum: ", "expr:(x + y)"]);
    }

    #[test]
    fn test_chain_root_climbs_from_inner_operator() {
        let tree = parse_expr(r#""a" + name + "b""#).unwrap();
        let ExprKind::Binary { left, .. } = tree.kind(tree.root()) else {
            panic!("expected binary");
        };
        assert_eq!(chain_root(&tree, *left, &env()), Some(tree.root()));

        let leaves = flatten(&tree, chain_root(&tree, *left, &env()).unwrap(), &env());
        assert_eq!(leaves.len(), 3);
    }

    #[test]
    fn test_chain_root_climbs_from_leaf() {
        let tree = parse_expr(r#""a" + name"#).unwrap();
        let name = tree.children(tree.root())[1];
        assert_eq!(chain_root(&tree, name, &env()), Some(tree.root()));
    }

    #[test]
    fn test_chain_root_stops_at_non_string_parent() {
        // The outer + is string-typed only if both sides resolve; `bogus` does not.
        let tree = parse_expr(r#""a" + name + bogus"#).unwrap();
        let ExprKind::Binary { left, .. } = tree.kind(tree.root()) else {
            panic!("expected binary");
        };
        assert_eq!(chain_root(&tree, *left, &env()), Some(*left));
    }

    #[test]
    fn test_chain_root_none_for_non_concat() {
        let tree = parse_expr("x + y").unwrap();
        assert_eq!(chain_root(&tree, tree.root(), &env()), None);
        let tree = parse_expr("name").unwrap();
        assert_eq!(chain_root(&tree, tree.root(), &env()), None);
    }

    #[test]
    fn test_flatten_with_stops_on_error() {
        let tree = parse_expr(r#""a" + name + "b""#).unwrap();
        let mut visited = 0;
        let result = flatten_with(&tree, tree.root(), &env(), |_, _| {
            visited += 1;
            if visited == 3 { Err("stop") } else { Ok(()) }
        });
        assert_eq!(result, Err("stop"));
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_climb_with_stops_on_error() {
        let tree = parse_expr(r#""a" + name + "b" + name"#).unwrap();
        let first = tree.children(tree.children(tree.children(tree.root())[0])[0])[0];
        let mut steps = Vec::new();
        let result = climb_with(&tree, first, &env(), |id| {
            steps.push(id);
            if steps.len() == 2 { Err("stop") } else { Ok(()) }
        });
        assert_eq!(result, Err("stop"));
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_long_literal_chain() {
        let source = (0..500)
            .map(|i| format!("\"{i}\""))
            .collect::<Vec<_>>()
            .join(" + ");
        let tree = parse_expr(&source).unwrap();
        let leaves = flatten(&tree, tree.root(), &TypeEnv::new());
        assert_eq!(leaves.len(), 500);
        assert_eq!(leaves[499].as_literal().map(|l| l.text.as_str()), Some("499"));
    }
}
