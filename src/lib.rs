//! # concat-interp
//!
//! Rewrites a chain of string concatenations into a single interpolated
//! string expression, e.g. `"Hello, " + name + "!"` into `$"Hello, {name}!"`.
//!
//! The crate is split into two layers:
//!
//! - **The engine** ([`refactor`](mod@refactor)) classifies, flattens, merges and
//!   synthesizes over a read-only [`SyntaxTree`]. It never guesses types or
//!   template syntax.
//! - **The host** answers type queries through a [`TypeOracle`] and picks a
//!   [`TemplateDialect`] for the target language. [`TypeEnv`] and the
//!   built-in [`Dialect`] presets cover the common cases.
//!
//! ## Quick start
//!
//! ```rust
//! use concat_interp::{refactor, Dialect, Type, TypeEnv};
//!
//! let env = TypeEnv::new().with_variable("count", Type::Number);
//! let conversion = refactor(r#""You have " + count + " items""#, &env, &Dialect::csharp()).unwrap();
//!
//! let replacement = conversion.replacement().unwrap();
//! assert_eq!(replacement.text, r#"$"You have {count} items""#);
//! ```
//!
//! ## Starting from a node
//!
//! Hosts usually start from a cursor position. Parse once, find the node,
//! and convert; the engine climbs to the top of the chain by itself:
//!
//! ```rust
//! use concat_interp::{convert_to_interpolation, parse_expr, Dialect, Type, TypeEnv};
//!
//! let source = r#"Log("id=" + id + ";")"#;
//! let tree = parse_expr(source).unwrap();
//! let env = TypeEnv::new().with_variable("id", Type::Number);
//!
//! let at = source.find("id +").unwrap();
//! let node = tree.node_at(at).unwrap();
//!
//! let conversion = convert_to_interpolation(&tree, node, &env, &Dialect::javascript()).unwrap();
//! let replacement = conversion.into_replacement().unwrap();
//! assert_eq!(replacement.apply(source), "Log(`id=${id};`)");
//! ```
//!
//! ## Not every chain is converted
//!
//! A chain made only of literals has nothing to interpolate, and a `+` the
//! oracle cannot prove to be string-typed is left alone:
//!
//! ```rust
//! use concat_interp::{refactor, Conversion, Dialect, NotApplicable, TypeEnv};
//!
//! let env = TypeEnv::new();
//! let cs = Dialect::csharp();
//!
//! assert_eq!(
//!     refactor(r#""a" + "b""#, &env, &cs).unwrap(),
//!     Conversion::NotApplicable(NotApplicable::NothingToInterpolate),
//! );
//! assert_eq!(
//!     refactor(r#""a" + unknown"#, &env, &cs).unwrap(),
//!     Conversion::NotApplicable(NotApplicable::NotAConcatenation),
//! );
//! ```

pub mod ast;
pub mod dialect;
pub mod error;
mod parser;
pub mod refactor;
pub mod types;

pub use ast::{
    BinOp, Expr, ExprId, ExprKind, Literal, Span, Spanned, StringStyle, SyntaxTree, UnaryOp,
};
pub use dialect::{Dialect, EscapeRule, Registry, TemplateDialect};
pub use error::{EngineError, EngineErrorKind, ParseError};
pub use parser::parse_expr;
pub use refactor::{
    Classification, Conversion, ConvertOptions, InterpolatedString, Leaf, LiteralLeaf,
    NotApplicable, Placeholder, Replacement, Segment, convert_to_interpolation,
    convert_with_options,
};
pub use types::{Type, TypeEnv, TypeOracle, TypeTable};

/// Parse source text and convert the chain at its root in a single step.
pub fn refactor<O>(
    source: &str,
    oracle: &O,
    dialect: &dyn TemplateDialect,
) -> Result<Conversion, RefactorError>
where
    O: TypeOracle + ?Sized,
{
    refactor_with_options(source, oracle, dialect, ConvertOptions::default())
}

/// [`refactor`](fn@refactor) with cancellation and resource limits.
pub fn refactor_with_options<O>(
    source: &str,
    oracle: &O,
    dialect: &dyn TemplateDialect,
    options: ConvertOptions,
) -> Result<Conversion, RefactorError>
where
    O: TypeOracle + ?Sized,
{
    let tree = parser::parse_expr(source).map_err(RefactorError::Parse)?;
    convert_with_options(&tree, tree.root(), oracle, dialect, options)
        .map_err(RefactorError::Engine)
}

/// Combined error type returned by [`refactor`](fn@refactor) and [`refactor_with_options`].
#[derive(Debug)]
pub enum RefactorError {
    /// One or more errors occurred during parsing.
    Parse(Vec<ParseError>),
    /// The conversion was aborted.
    Engine(EngineError),
}

impl std::fmt::Display for RefactorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefactorError::Parse(errors) => {
                for e in errors {
                    writeln!(f, "{e}")?;
                }
                Ok(())
            }
            RefactorError::Engine(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RefactorError {}
