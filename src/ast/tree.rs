use super::expr::{Expr, ExprId, ExprKind};
use super::span::{Span, Spanned};

/// An immutable expression tree together with the source it was parsed from.
///
/// Nodes live in an arena and refer to each other through [`ExprId`]
/// handles. Parent links are computed once, when the tree is finished, so
/// consumers can walk upward without any shared ownership.
///
/// Children always precede their parents in the arena, so iterating
/// [`ids`](Self::ids) in order visits every node after its descendants.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<Expr>,
    parents: Vec<Option<ExprId>>,
    root: ExprId,
}

impl SyntaxTree {
    pub fn root(&self) -> ExprId {
        self.root
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.nodes[id.index()].node
    }

    pub fn span(&self, id: ExprId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn parent(&self, id: ExprId) -> Option<ExprId> {
        self.parents[id.index()]
    }

    pub fn children(&self, id: ExprId) -> Vec<ExprId> {
        self.kind(id).children()
    }

    /// The source text covered by a node, exactly as written.
    pub fn text(&self, id: ExprId) -> &str {
        let span = self.span(id);
        &self.source[span.start..span.end]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ExprId> + '_ {
        (0..self.nodes.len()).map(|i| ExprId(i as u32))
    }

    /// The innermost node whose span covers `offset`, if any.
    pub fn node_at(&self, offset: usize) -> Option<ExprId> {
        let mut current = self.root;
        if !self.span(current).contains(offset) {
            return None;
        }
        'descend: loop {
            for child in self.children(current) {
                if self.span(child).contains(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }
}

/// Accumulates nodes bottom-up while parsing.
///
/// Children must be pushed before their parents, which is the natural
/// order for a recursive-descent builder.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    nodes: Vec<Expr>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(Spanned::new(kind, span));
        id
    }

    pub(crate) fn span(&self, id: ExprId) -> Span {
        self.nodes[id.index()].span
    }

    pub(crate) fn finish(self, source: impl Into<String>, root: ExprId) -> SyntaxTree {
        let mut parents = vec![None; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            for child in node.node.children() {
                debug_assert!(child.index() < index, "child pushed after its parent");
                parents[child.index()] = Some(ExprId(index as u32));
            }
        }
        SyntaxTree {
            source: source.into(),
            nodes: self.nodes,
            parents,
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, Literal};

    fn sample() -> SyntaxTree {
        // "a" + x
        let mut b = TreeBuilder::new();
        let lit = b.push(ExprKind::Literal(Literal::string("a")), Span::new(0, 3));
        let x = b.push(ExprKind::Identifier("x".into()), Span::new(6, 7));
        let add = b.push(
            ExprKind::Binary {
                left: lit,
                op: BinOp::Add,
                right: x,
            },
            Span::new(0, 7),
        );
        b.finish("\"a\" + x", add)
    }

    #[test]
    fn test_parents_are_linked() {
        let tree = sample();
        let root = tree.root();
        let children = tree.children(root);
        assert_eq!(children.len(), 2);
        for child in children {
            assert_eq!(tree.parent(child), Some(root));
        }
        assert_eq!(tree.parent(root), None);
    }

    #[test]
    fn test_text_slices_source() {
        let tree = sample();
        let children = tree.children(tree.root());
        assert_eq!(tree.text(children[0]), "\"a\"");
        assert_eq!(tree.text(children[1]), "x");
        assert_eq!(tree.text(tree.root()), "\"a\" + x");
    }

    #[test]
    fn test_ids_visit_children_first() {
        let tree = sample();
        let order: Vec<_> = tree.ids().collect();
        assert_eq!(order.last(), Some(&tree.root()));
        for id in order {
            for child in tree.children(id) {
                assert!(child < id);
            }
        }
        assert_eq!(tree.source(), "\"a\" + x");
    }

    #[test]
    fn test_node_at_finds_innermost() {
        let tree = sample();
        let x = tree.children(tree.root())[1];
        assert_eq!(tree.node_at(6), Some(x));
        assert_eq!(tree.node_at(4), Some(tree.root()));
        assert_eq!(tree.node_at(42), None);
    }
}
