//! The concatenation-to-interpolation engine.
//!
//! A conversion runs four stages over a read-only [`SyntaxTree`]:
//!
//! 1. [`flatten`](flatten::flatten) climbs to the top of the chain and
//!    collects its leaves in source order, checking every `+` through
//!    [`classify`](classify::classify). The [`TypeOracle`] is consulted once
//!    up front and its answers are kept in a [`TypeTable`].
//! 2. [`merge`](merge::merge) folds adjacent regular literals.
//! 3. [`synthesize`](synthesize::synthesize) turns leaves into escaped
//!    text and placeholders for the chosen [`TemplateDialect`].
//! 4. [`should_offer`](offer::should_offer) drops results without a single
//!    placeholder.
//!
//! The engine never mutates the tree. It returns a [`Replacement`]
//! describing the new text for the chain's span, which the host splices in
//! however it likes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, debug_span};

use crate::ast::{ExprId, Span, SyntaxTree};
use crate::dialect::TemplateDialect;
use crate::error::EngineError;
use crate::types::{TypeOracle, TypeTable};

pub mod classify;
pub mod flatten;
pub mod merge;
pub mod offer;
pub mod synthesize;

pub use classify::{Classification, classify};
pub use flatten::{Leaf, LiteralLeaf, chain_root, flatten};
pub use merge::merge;
pub use offer::should_offer;
pub use synthesize::{InterpolatedString, Placeholder, Segment, synthesize};

/// Convert the concatenation chain containing `node` into an interpolated
/// string.
///
/// `node` may be any node of the chain: an inner `+` or one of its
/// operands. The engine first climbs to the outermost string
/// concatenation.
///
/// ```rust
/// use concat_interp::{convert_to_interpolation, parse_expr, Dialect, Type, TypeEnv};
///
/// let tree = parse_expr(r#""Hello, " + name + "!""#).unwrap();
/// let env = TypeEnv::new().with_variable("name", Type::String);
///
/// let conversion =
///     convert_to_interpolation(&tree, tree.root(), &env, &Dialect::csharp()).unwrap();
/// let replacement = conversion.replacement().unwrap();
/// assert_eq!(replacement.text, r#"$"Hello, {name}!""#);
/// ```
pub fn convert_to_interpolation<O>(
    tree: &SyntaxTree,
    node: ExprId,
    oracle: &O,
    dialect: &dyn TemplateDialect,
) -> Result<Conversion, EngineError>
where
    O: TypeOracle + ?Sized,
{
    convert_with_options(tree, node, oracle, dialect, ConvertOptions::default())
}

/// [`convert_to_interpolation`] with cancellation and resource limits.
///
/// ```rust
/// use concat_interp::{
///     convert_with_options, parse_expr, ConvertOptions, Dialect, EngineErrorKind, TypeEnv,
/// };
///
/// let tree = parse_expr(r#""a" + 1 + "b" + 2 + "c""#).unwrap();
/// let opts = ConvertOptions::new().max_leaves(3);
///
/// let err = convert_with_options(&tree, tree.root(), &TypeEnv::new(), &Dialect::csharp(), opts)
///     .unwrap_err();
/// assert_eq!(err.kind, EngineErrorKind::ResourceLimit);
/// ```
pub fn convert_with_options<O>(
    tree: &SyntaxTree,
    node: ExprId,
    oracle: &O,
    dialect: &dyn TemplateDialect,
    options: ConvertOptions,
) -> Result<Conversion, EngineError>
where
    O: TypeOracle + ?Sized,
{
    let span = debug_span!("convert_to_interpolation", node = %node, dialect = dialect.name());
    let _enter = span.enter();

    let guard = Guard::new(&options);
    guard.checkpoint("type resolution")?;

    // One oracle pass per conversion; every later type query is an index.
    let types = TypeTable::build(tree, oracle);
    guard.checkpoint("climb")?;

    let climbed = flatten::climb_with(tree, node, &types, |_| guard.checkpoint("climb"))?;
    let Some(root) = climbed else {
        debug!("no string concatenation at or above node");
        return Ok(Conversion::NotApplicable(NotApplicable::NotAConcatenation));
    };
    debug!(root = %root, text = tree.text(root), "found chain root");

    let leaves = flatten::flatten_with(tree, root, &types, |id, collected| {
        guard.visit(tree, id, collected)
    })?;
    debug!(leaves = leaves.len(), "flattened chain");

    guard.checkpoint("merge")?;
    let leaves = merge(leaves);
    debug!(leaves = leaves.len(), "merged literals");

    guard.checkpoint("synthesis")?;
    let interpolated = synthesize(tree, &leaves, dialect);

    if !should_offer(&interpolated) {
        debug!("chain has no embedded expressions");
        return Ok(Conversion::NotApplicable(NotApplicable::NothingToInterpolate));
    }

    let text = interpolated.render(dialect);
    debug!(segments = interpolated.segments().len(), %text, "conversion offered");
    Ok(Conversion::Offered(Replacement {
        root,
        span: tree.span(root),
        interpolated,
        text,
    }))
}

// ── Outcomes ────────────────────────────────────────────────────────────

/// The outcome of a conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    Offered(Replacement),
    NotApplicable(NotApplicable),
}

impl Conversion {
    pub fn is_offered(&self) -> bool {
        matches!(self, Conversion::Offered(_))
    }

    pub fn replacement(&self) -> Option<&Replacement> {
        match self {
            Conversion::Offered(r) => Some(r),
            Conversion::NotApplicable(_) => None,
        }
    }

    pub fn into_replacement(self) -> Option<Replacement> {
        match self {
            Conversion::Offered(r) => Some(r),
            Conversion::NotApplicable(_) => None,
        }
    }
}

/// Why no conversion is proposed. These are ordinary outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotApplicable {
    /// The climb ended on a node that is not a string concatenation.
    NotAConcatenation,
    /// Every operand was a string literal, so no placeholder would remain.
    NothingToInterpolate,
}

impl std::fmt::Display for NotApplicable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotApplicable::NotAConcatenation => f.write_str("not a string concatenation"),
            NotApplicable::NothingToInterpolate => {
                f.write_str("concatenation contains only string literals")
            }
        }
    }
}

/// New text for the span of a concatenation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Top node of the replaced chain.
    pub root: ExprId,
    /// Source range to replace.
    pub span: Span,
    pub interpolated: InterpolatedString,
    /// The rendered template expression.
    pub text: String,
}

impl Replacement {
    /// Splice the replacement into `source`, the text the tree was built
    /// from.
    pub fn apply(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len() + self.text.len());
        out.push_str(&source[..self.span.start]);
        out.push_str(&self.text);
        out.push_str(&source[self.span.end..]);
        out
    }
}

// ── Conversion options ──────────────────────────────────────────────────

/// Configuration for cancellation and resource limits.
///
/// Create with [`ConvertOptions::new()`] and chain builder methods:
///
/// ```rust
/// use concat_interp::ConvertOptions;
/// use std::sync::Arc;
/// use std::sync::atomic::AtomicBool;
///
/// let token = Arc::new(AtomicBool::new(false));
/// let opts = ConvertOptions::new()
///     .max_leaves(10_000)
///     .cancellation_token(token);
/// ```
#[derive(Clone, Default)]
pub struct ConvertOptions {
    /// Maximum number of operands a chain may have before the conversion
    /// returns a [`ResourceLimit`](crate::EngineErrorKind::ResourceLimit)
    /// error. `None` means unlimited.
    pub max_leaves: Option<u64>,

    /// An external flag that can be set to `true` to cancel an
    /// in-progress conversion. Checked between stages and once per node
    /// while flattening.
    pub cancellation_token: Option<Arc<AtomicBool>>,
}

impl ConvertOptions {
    /// Create a new `ConvertOptions` with all defaults (no limits).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of chain operands.
    pub fn max_leaves(mut self, limit: u64) -> Self {
        self.max_leaves = Some(limit);
        self
    }

    /// Attach a cancellation token. Set the `AtomicBool` to `true` from
    /// another thread to abort the conversion.
    pub fn cancellation_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancellation_token = Some(token);
        self
    }
}

impl std::fmt::Debug for ConvertOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertOptions")
            .field("max_leaves", &self.max_leaves)
            .field("cancellation_token", &self.cancellation_token.is_some())
            .finish()
    }
}

/// Applies [`ConvertOptions`] while a conversion runs.
struct Guard<'o> {
    options: &'o ConvertOptions,
}

impl<'o> Guard<'o> {
    fn new(options: &'o ConvertOptions) -> Self {
        Self { options }
    }

    fn cancelled(&self) -> bool {
        self.options
            .cancellation_token
            .as_ref()
            .is_some_and(|token| token.load(Ordering::Relaxed))
    }

    /// Check cancellation before a stage starts.
    fn checkpoint(&self, stage: &str) -> Result<(), EngineError> {
        if self.cancelled() {
            debug!(stage, "conversion cancelled");
            return Err(EngineError::cancelled(stage));
        }
        Ok(())
    }

    /// Called once per node visited by the flattener.
    fn visit(&self, tree: &SyntaxTree, id: ExprId, collected: usize) -> Result<(), EngineError> {
        if let Some(max) = self.options.max_leaves
            && collected as u64 >= max
        {
            return Err(EngineError::too_many_leaves(max).with_span(tree.span(id)));
        }
        self.checkpoint("flattening")
    }
}
