//! Construction of the interpolated string from a leaf sequence.

use std::fmt;

use tracing::trace;

use super::flatten::Leaf;
use crate::ast::{ExprId, SyntaxTree};
use crate::dialect::TemplateDialect;

/// One piece of an interpolated string.
///
/// Every non-empty literal leaf becomes exactly one `Text` segment. Empty
/// literals produce none, since they render to nothing. Two `Text` segments
/// can still be adjacent when a raw literal sits between regular ones, or
/// when an empty raw literal keeps its neighbours apart: `"a" + @"" + "b"`
/// yields `Text("a")`, `Text("b")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, already escaped for the target dialect.
    Text(String),
    /// An embedded expression.
    Placeholder(Placeholder),
}

impl Segment {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Segment::Placeholder(_))
    }
}

/// An embedded expression, carried as its original source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub node: ExprId,
    /// Source text of the node, wrapped in parentheses when
    /// `parenthesized` is set.
    pub expr_text: String,
    pub parenthesized: bool,
}

/// The description of a template string, in segment order.
///
/// Built once per conversion and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterpolatedString {
    segments: Vec<Segment>,
}

impl InterpolatedString {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn placeholder_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_placeholder()).count()
    }

    /// Spell the template in `dialect`, which must be the dialect whose
    /// escaping produced the text segments.
    pub fn render(&self, dialect: &dyn TemplateDialect) -> String {
        let mut out = String::from(dialect.prefix());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Placeholder(p) => out.push_str(&dialect.placeholder(&p.expr_text)),
            }
        }
        out.push_str(dialect.suffix());
        out
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Text(text) => write!(f, "Text({text:?})"),
            Segment::Placeholder(p) => write!(f, "Placeholder({})", p.expr_text),
        }
    }
}

/// Map leaves to segments: literals become escaped text, opaque leaves
/// become placeholders over their unmodified source text.
///
/// Empty literals produce no segment. Binary and conditional expressions
/// are parenthesized whenever the dialect asks for it.
///
/// # Panics
///
/// Panics if `leaves` is empty. Every concatenation has at least two
/// operands, so an empty sequence is a bug in the caller.
pub fn synthesize(
    tree: &SyntaxTree,
    leaves: &[Leaf],
    dialect: &dyn TemplateDialect,
) -> InterpolatedString {
    assert!(
        !leaves.is_empty(),
        "cannot synthesize an interpolated string from an empty leaf sequence"
    );

    let mut segments = Vec::with_capacity(leaves.len());
    for leaf in leaves {
        match leaf {
            Leaf::Literal(lit) => {
                if lit.text.is_empty() {
                    continue;
                }
                segments.push(Segment::Text(dialect.escape_text(&lit.text)));
            }
            Leaf::Opaque(node) => {
                let text = tree.text(*node);
                let parenthesized = dialect.needs_parentheses(tree, *node);
                let expr_text = if parenthesized {
                    format!("({text})")
                } else {
                    text.to_string()
                };
                trace!(node = %node, parenthesized, "placeholder");
                segments.push(Segment::Placeholder(Placeholder {
                    node: *node,
                    expr_text,
                    parenthesized,
                }));
            }
        }
    }

    InterpolatedString::new(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::parser::parse_expr;
    use crate::refactor::flatten::flatten;
    use crate::refactor::merge::merge;
    use crate::types::{Type, TypeEnv};

    fn env() -> TypeEnv {
        TypeEnv::new()
            .with_variable("name", Type::String)
            .with_variable("x", Type::Number)
            .with_variable("y", Type::Number)
            .with_variable("cond", Type::Bool)
    }

    fn synth(source: &str, dialect: &Dialect) -> InterpolatedString {
        let tree = parse_expr(source).unwrap();
        let leaves = merge(flatten(&tree, tree.root(), &env()));
        synthesize(&tree, &leaves, dialect)
    }

    #[test]
    fn test_render_csharp() {
        let cs = Dialect::csharp();
        let out = synth(r#""Hello, " + name + "!""#, &cs);
        assert_eq!(out.render(&cs), r#"$"Hello, {name}!""#);
        assert_eq!(out.placeholder_count(), 1);
    }

    #[test]
    fn test_literal_braces_are_escaped() {
        let cs = Dialect::csharp();
        let out = synth(r#""{" + name + "}""#, &cs);
        assert_eq!(out.render(&cs), r#"$"{{{name}}}""#);
    }

    #[test]
    fn test_numeric_sum_is_parenthesized() {
        let cs = Dialect::csharp();
        let out = synth(r#"x + y + " items""#, &cs);
        assert_eq!(out.render(&cs), r#"$"{(x + y)} items""#);
        let Segment::Placeholder(p) = &out.segments()[0] else {
            panic!("expected placeholder");
        };
        assert!(p.parenthesized);
    }

    #[test]
    fn test_existing_parens_are_not_doubled() {
        let cs = Dialect::csharp();
        let out = synth(r#""n=" + (x + y)"#, &cs);
        assert_eq!(out.render(&cs), r#"$"n={(x + y)}""#);
    }

    #[test]
    fn test_conditional_is_parenthesized() {
        let js = Dialect::javascript();
        let out = synth(r#""a" + (cond ? "t" : "f") + "b""#, &js);
        assert_eq!(out.render(&js), r#"`a${(cond ? "t" : "f")}b`"#);
    }

    #[test]
    fn test_newline_in_literal_is_escaped() {
        let py = Dialect::python();
        let out = synth(r#""line\n" + name"#, &py);
        assert_eq!(out.render(&py), r#"f"line\n{name}""#);
    }

    #[test]
    fn test_empty_literal_produces_no_segment() {
        let cs = Dialect::csharp();
        let out = synth(r#""" + name"#, &cs);
        assert_eq!(out.segments().len(), 1);
        assert_eq!(out.render(&cs), r#"$"{name}""#);
    }

    #[test]
    fn test_empty_raw_literal_keeps_neighbours_apart() {
        let cs = Dialect::csharp();
        let out = synth(r#""a" + @"" + "b" + name"#, &cs);
        let shown: Vec<_> = out.segments().iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec![r#"Text("a")"#, r#"Text("b")"#, "Placeholder(name)"]);
        assert_eq!(out.render(&cs), r#"$"ab{name}""#);
    }

    #[test]
    #[should_panic(expected = "empty leaf sequence")]
    fn test_empty_leaves_panic() {
        let tree = parse_expr("name").unwrap();
        synthesize(&tree, &[], &Dialect::csharp());
    }
}
