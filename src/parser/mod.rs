//! Expression parser, built on [pest](https://pest.rs/).
//!
//! The grammar is defined in `expr.pest`. This module converts pest's
//! parse tree into the arena-backed [`SyntaxTree`] defined in
//! [`crate::ast`], resolving binary operator precedence on the way.
//!
//! Use [`parse_expr`] to turn source text into a tree that the
//! [`refactor`](mod@crate::refactor) engine can inspect.

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest_derive::Parser;

use crate::ast::{
    BinOp, ExprId, ExprKind, Literal, Span, StringStyle, SyntaxTree, TreeBuilder, UnaryOp,
};
use crate::error::ParseError;

#[derive(Parser)]
#[grammar = "parser/expr.pest"]
struct ExprParser;

/// Parse a single expression into a [`SyntaxTree`].
///
/// Returns a list of [`ParseError`]s if the source contains invalid syntax.
/// Each error carries a source [`Span`](crate::Span) for diagnostic formatting.
pub fn parse_expr(source: &str) -> Result<SyntaxTree, Vec<ParseError>> {
    let mut pairs = ExprParser::parse(Rule::expression, source).map_err(|e| {
        let span = pest_span_to_span(&e);
        vec![ParseError::new(span, format!("parse error: {e}"))]
    })?;

    let whole = Span::new(0, source.len());
    let expression = next_pair(&mut pairs, whole, "expression")?;
    let mut inner = expression.into_inner();
    let expr = next_pair(&mut inner, whole, "expression body")?;

    let mut builder = Builder {
        tree: TreeBuilder::new(),
    };
    let root = builder.build_expr(expr)?;
    Ok(builder.tree.finish(source, root))
}

fn pest_span_to_span(e: &pest::error::Error<Rule>) -> Span {
    match &e.location {
        pest::error::InputLocation::Pos(p) => Span::new(*p, *p + 1),
        pest::error::InputLocation::Span((s, e)) => Span::new(*s, *e),
    }
}

fn pair_span(pair: &Pair<Rule>) -> Span {
    let s = pair.as_span();
    Span::new(s.start(), s.end())
}

/// Pull the next child pair. The grammar guarantees presence, so a miss is
/// reported as a parse error rather than a panic.
fn next_pair<'i>(
    pairs: &mut Pairs<'i, Rule>,
    span: Span,
    what: &str,
) -> Result<Pair<'i, Rule>, Vec<ParseError>> {
    pairs
        .next()
        .ok_or_else(|| vec![ParseError::new(span, format!("missing {what}"))])
}

struct Builder {
    tree: TreeBuilder,
}

impl Builder {
    // -- Conditional and binary operators --------------------------------

    fn build_expr(&mut self, pair: Pair<Rule>) -> Result<ExprId, Vec<ParseError>> {
        let span = pair_span(&pair);
        let mut inner = pair.into_inner();

        let condition = self.build_binary(next_pair(&mut inner, span, "operand")?)?;
        let Some(then_pair) = inner.next() else {
            return Ok(condition);
        };
        let then_branch = self.build_expr(then_pair)?;
        let else_branch = self.build_expr(next_pair(&mut inner, span, "else branch")?)?;

        let merged = self.tree.span(condition).merge(self.tree.span(else_branch));
        Ok(self.tree.push(
            ExprKind::Conditional {
                condition,
                then_branch,
                else_branch,
            },
            merged,
        ))
    }

    fn build_binary(&mut self, pair: Pair<Rule>) -> Result<ExprId, Vec<ParseError>> {
        let span = pair_span(&pair);
        let mut inner = pair.into_inner();

        let first = self.build_unary(next_pair(&mut inner, span, "operand")?)?;

        // Shunting-yard over the flat operand/operator run. Popping on equal
        // precedence keeps every operator left-associative.
        let mut operands = vec![first];
        let mut pending: Vec<BinOp> = Vec::new();

        while let Some(op_pair) = inner.next() {
            let op = parse_bin_op(&op_pair)?;
            let right = self.build_unary(next_pair(&mut inner, span, "right operand")?)?;

            while let Some(&top) = pending.last()
                && top.precedence() >= op.precedence()
            {
                pending.pop();
                self.reduce(&mut operands, top, span)?;
            }
            pending.push(op);
            operands.push(right);
        }

        while let Some(op) = pending.pop() {
            self.reduce(&mut operands, op, span)?;
        }

        operands
            .pop()
            .ok_or_else(|| vec![ParseError::new(span, "empty operator chain")])
    }

    fn reduce(
        &mut self,
        operands: &mut Vec<ExprId>,
        op: BinOp,
        span: Span,
    ) -> Result<(), Vec<ParseError>> {
        let (Some(right), Some(left)) = (operands.pop(), operands.pop()) else {
            return Err(vec![ParseError::new(
                span,
                format!("operator '{}' is missing an operand", op.symbol()),
            )]);
        };
        let merged = self.tree.span(left).merge(self.tree.span(right));
        let id = self.tree.push(ExprKind::Binary { left, op, right }, merged);
        operands.push(id);
        Ok(())
    }

    // -- Unary and postfix ---------------------------------------------------

    fn build_unary(&mut self, pair: Pair<Rule>) -> Result<ExprId, Vec<ParseError>> {
        let span = pair_span(&pair);
        let mut ops = Vec::new();
        let mut operand = None;

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::unary_op => {
                    let op = match child.as_str() {
                        "!" => UnaryOp::Not,
                        _ => UnaryOp::Neg,
                    };
                    ops.push((op, pair_span(&child).start));
                }
                _ => operand = Some(self.build_postfix(child)?),
            }
        }

        let mut id =
            operand.ok_or_else(|| vec![ParseError::new(span, "unary operator without operand")])?;

        // The operator closest to the operand applies first.
        for (op, start) in ops.into_iter().rev() {
            let merged = Span::new(start, self.tree.span(id).end);
            id = self.tree.push(ExprKind::Unary { op, operand: id }, merged);
        }
        Ok(id)
    }

    fn build_postfix(&mut self, pair: Pair<Rule>) -> Result<ExprId, Vec<ParseError>> {
        let span = pair_span(&pair);
        let mut inner = pair.into_inner();

        let mut id = self.build_primary(next_pair(&mut inner, span, "primary expression")?)?;
        let start = self.tree.span(id).start;

        for suffix in inner {
            let suffix_span = pair_span(&suffix);
            let kind = match suffix.as_rule() {
                Rule::member_access => {
                    let mut parts = suffix.into_inner();
                    let name = next_pair(&mut parts, suffix_span, "member name")?
                        .as_str()
                        .to_string();
                    ExprKind::Member { target: id, name }
                }
                Rule::call_args => {
                    let mut args = Vec::new();
                    for arg in suffix.into_inner() {
                        args.push(self.build_expr(arg)?);
                    }
                    ExprKind::Call { callee: id, args }
                }
                rule => {
                    return Err(vec![ParseError::new(
                        suffix_span,
                        format!("unexpected rule in postfix position: {rule:?}"),
                    )]);
                }
            };
            id = self.tree.push(kind, Span::new(start, suffix_span.end));
        }

        Ok(id)
    }

    // -- Atoms -----------------------------------------------------------

    fn build_primary(&mut self, pair: Pair<Rule>) -> Result<ExprId, Vec<ParseError>> {
        let span = pair_span(&pair);
        let rule = pair.as_rule();

        let kind = match rule {
            Rule::paren => {
                let mut inner = pair.into_inner();
                let expr = self.build_expr(next_pair(&mut inner, span, "expression")?)?;
                ExprKind::Paren(expr)
            }
            Rule::regular_string => {
                let value = unescape_regular(pair, span)?;
                ExprKind::Literal(Literal::String {
                    value,
                    style: StringStyle::Regular,
                })
            }
            Rule::verbatim_string => {
                let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                ExprKind::Literal(Literal::String {
                    value: raw.replace("\"\"", "\""),
                    style: StringStyle::Raw,
                })
            }
            Rule::number => {
                let n: f64 = pair.as_str().parse().map_err(|_| {
                    vec![ParseError::new(
                        span,
                        format!("invalid number: {}", pair.as_str()),
                    )]
                })?;
                ExprKind::Literal(Literal::Number(n))
            }
            Rule::bool_literal => ExprKind::Literal(Literal::Bool(pair.as_str() == "true")),
            Rule::null_literal => ExprKind::Literal(Literal::Null),
            Rule::identifier => ExprKind::Identifier(pair.as_str().to_string()),
            _ => {
                return Err(vec![ParseError::new(
                    span,
                    format!("unexpected rule in primary position: {rule:?}"),
                )]);
            }
        };

        Ok(self.tree.push(kind, span))
    }
}

// -- Helpers -------------------------------------------------------------

fn parse_bin_op(pair: &Pair<Rule>) -> Result<BinOp, Vec<ParseError>> {
    let op = match pair.as_str() {
        "==" => BinOp::Eq,
        "!=" => BinOp::NotEq,
        "<" => BinOp::Lt,
        ">" => BinOp::Gt,
        "<=" => BinOp::LtEq,
        ">=" => BinOp::GtEq,
        "&&" => BinOp::And,
        "||" => BinOp::Or,
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "%" => BinOp::Rem,
        other => {
            return Err(vec![ParseError::new(
                pair_span(pair),
                format!("unknown operator: {other}"),
            )]);
        }
    };
    Ok(op)
}

/// Decode the body of a `"..."` literal into its semantic value.
fn unescape_regular(pair: Pair<Rule>, span: Span) -> Result<String, Vec<ParseError>> {
    // regular_string = ${ "\"" ~ regular_inner ~ "\"" }
    let inner = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('\\') => result.push('\\'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32);
                match decoded {
                    Some(c) => result.push(c),
                    None => {
                        return Err(vec![
                            ParseError::new(span, format!("invalid unicode escape: \\u{hex}"))
                                .with_hint("expected exactly four hex digits"),
                        ]);
                    }
                }
            }
            Some(c) => {
                return Err(vec![
                    ParseError::new(span, format!("unrecognized escape sequence: \\{c}"))
                        .with_hint("use @\"...\" for text without escape processing"),
                ]);
            }
            None => result.push('\\'),
        }
    }
    Ok(result)
}
