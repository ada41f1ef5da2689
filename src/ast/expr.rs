use std::fmt;

use super::{literal::Literal, span::Spanned};

/// Handle to a node inside a [`SyntaxTree`](super::SyntaxTree).
///
/// Handles are only meaningful for the tree that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(pub(crate) u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type Expr = Spanned<ExprKind>;

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Literal value: "hello", @"C:\temp", 42, true, null
    Literal(Literal),

    /// Bare name: count
    Identifier(String),

    /// Parenthesized expression: (a + b)
    Paren(ExprId),

    /// Member access: user.Name
    Member { target: ExprId, name: String },

    /// Call: Format(x, y), name.ToUpper()
    Call { callee: ExprId, args: Vec<ExprId> },

    /// Unary operation: !flag, -offset
    Unary { op: UnaryOp, operand: ExprId },

    /// Binary operation: a == b, a + b
    Binary {
        left: ExprId,
        op: BinOp,
        right: ExprId,
    },

    /// Conditional: cond ? a : b
    Conditional {
        condition: ExprId,
        then_branch: ExprId,
        else_branch: ExprId,
    },
}

impl ExprKind {
    /// Direct children in left-to-right source order.
    pub fn children(&self) -> Vec<ExprId> {
        match self {
            ExprKind::Literal(_) | ExprKind::Identifier(_) => Vec::new(),
            ExprKind::Paren(inner) => vec![*inner],
            ExprKind::Member { target, .. } => vec![*target],
            ExprKind::Call { callee, args } => {
                let mut out = Vec::with_capacity(args.len() + 1);
                out.push(*callee);
                out.extend(args.iter().copied());
                out
            }
            ExprKind::Unary { operand, .. } => vec![*operand],
            ExprKind::Binary { left, right, .. } => vec![*left, *right],
            ExprKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => vec![*condition, *then_branch, *else_branch],
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, ExprKind::Binary { op: BinOp::Add, .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Comparison
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // Logical
    And,
    Or,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    pub fn precedence(&self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::NotEq => 3,
            BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::Rem => 6,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        }
    }

    pub fn is_comparison(&self) -> bool {
        self.precedence() == 3 || self.precedence() == 4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}
