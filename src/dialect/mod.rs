//! Target template-string syntaxes.
//!
//! The synthesizer never hard-codes how a template string is spelled. It
//! asks a [`TemplateDialect`] for the opening and closing delimiters, the
//! placeholder syntax, and how literal text must be escaped so that it is
//! never read back as a placeholder start.
//!
//! There are two ways to provide a dialect:
//!
//! - **Table-driven**: [`Dialect`] is configured with delimiters and an
//!   ordered escape table. The built-in presets ([`Dialect::csharp`],
//!   [`Dialect::javascript`], [`Dialect::python`]) are built this way.
//! - **Trait-based**: implement [`TemplateDialect`] directly when the
//!   escaping rules cannot be expressed as plain substitutions.
//!
//! A [`Registry`] holds dialects by name for hosts that pick one at runtime.

use std::collections::BTreeMap;

use crate::ast::{ExprId, ExprKind, SyntaxTree};

// ── Trait definition ────────────────────────────────────────────────────

/// The spelling of an interpolated string in one target language.
pub trait TemplateDialect: Send + Sync {
    /// Registry key, e.g. `"csharp"`.
    fn name(&self) -> &str;

    /// Text that opens the template expression, e.g. `$"`.
    fn prefix(&self) -> &str;

    /// Text that closes the template expression, e.g. `"`.
    fn suffix(&self) -> &str;

    /// Escape semantic string content for use as a literal text segment.
    ///
    /// Segments are escaped one at a time and then concatenated, so the
    /// output must stay literal whatever text ends up next to it. A
    /// placeholder opener split across two segments (`$` then `{`) must
    /// not be able to reassemble.
    fn escape_text(&self, text: &str) -> String;

    /// Wrap embedded expression text in placeholder delimiters.
    fn placeholder(&self, expr_text: &str) -> String {
        format!("{{{expr_text}}}")
    }

    /// Whether an embedded expression must be parenthesized to keep its
    /// meaning inside a placeholder.
    ///
    /// The default wraps every binary and conditional expression. An
    /// already-parenthesized node is a `Paren` and is left alone.
    fn needs_parentheses(&self, tree: &SyntaxTree, id: ExprId) -> bool {
        matches!(
            tree.kind(id),
            ExprKind::Binary { .. } | ExprKind::Conditional { .. }
        )
    }
}

// ── Table-driven dialect ────────────────────────────────────────────────

/// One substitution applied while escaping literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeRule {
    pub pattern: String,
    pub replacement: String,
}

impl EscapeRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// A [`TemplateDialect`] described by delimiters and an escape table.
///
/// Escaping is a single left-to-right scan. At each position the first
/// rule whose pattern matches is applied and the scan resumes after the
/// matched text, so a replacement is never escaped a second time.
///
/// ```rust
/// use concat_interp::{Dialect, TemplateDialect};
///
/// let cs = Dialect::csharp();
/// assert_eq!(cs.escape_text("{x} \"q\""), "{{x}} \\\"q\\\"");
/// assert_eq!(cs.placeholder("name"), "{name}");
/// ```
#[derive(Debug, Clone)]
pub struct Dialect {
    name: String,
    prefix: String,
    suffix: String,
    open: String,
    close: String,
    escapes: Vec<EscapeRule>,
}

impl Dialect {
    pub fn new(
        name: impl Into<String>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
            open: "{".to_string(),
            close: "}".to_string(),
            escapes: Vec::new(),
        }
    }

    /// Set the placeholder delimiters.
    pub fn delimiters(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.open = open.into();
        self.close = close.into();
        self
    }

    /// Append an escape rule. Earlier rules win when patterns overlap.
    pub fn escape(mut self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.escapes.push(EscapeRule::new(pattern, replacement));
        self
    }

    /// C# interpolated strings: `$"Hello {name}"`, braces doubled.
    pub fn csharp() -> Self {
        Dialect::new("csharp", "$\"", "\"")
            .escape("\\", "\\\\")
            .escape("\"", "\\\"")
            .escape("\n", "\\n")
            .escape("\r", "\\r")
            .escape("\t", "\\t")
            .escape("\0", "\\0")
            .escape("{", "{{")
            .escape("}", "}}")
    }

    /// JavaScript template literals: `` `Hello ${name}` ``.
    ///
    /// Every `$` is escaped, not just `${`, because a `$` ending one text
    /// segment and a `{` starting the next would otherwise form a
    /// placeholder.
    pub fn javascript() -> Self {
        Dialect::new("javascript", "`", "`")
            .delimiters("${", "}")
            .escape("\\", "\\\\")
            .escape("`", "\\`")
            .escape("$", "\\$")
            .escape("\n", "\\n")
            .escape("\r", "\\r")
            .escape("\t", "\\t")
    }

    /// Python f-strings: `f"Hello {name}"`, braces doubled.
    ///
    /// Only text segments are translated. Placeholders carry the source
    /// expression unchanged, so `c ? "a" : "b"` or double-quoted literals
    /// inside them are not valid Python and need a host-side rewrite.
    pub fn python() -> Self {
        Dialect::new("python", "f\"", "\"")
            .escape("\\", "\\\\")
            .escape("\"", "\\\"")
            .escape("\n", "\\n")
            .escape("\r", "\\r")
            .escape("\t", "\\t")
            .escape("{", "{{")
            .escape("}", "}}")
    }
}

impl TemplateDialect for Dialect {
    fn name(&self) -> &str {
        &self.name
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn suffix(&self) -> &str {
        &self.suffix
    }

    fn escape_text(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        'scan: while let Some(ch) = rest.chars().next() {
            for rule in &self.escapes {
                if !rule.pattern.is_empty() && rest.starts_with(rule.pattern.as_str()) {
                    out.push_str(&rule.replacement);
                    rest = &rest[rule.pattern.len()..];
                    continue 'scan;
                }
            }
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
        out
    }

    fn placeholder(&self, expr_text: &str) -> String {
        format!("{}{expr_text}{}", self.open, self.close)
    }
}

// ── Registry ────────────────────────────────────────────────────────────

/// Stores dialects by name.
///
/// ```rust
/// use concat_interp::{Dialect, Registry, TemplateDialect};
///
/// let mut registry = Registry::new();
/// registry.register(Dialect::new("swift", "\"", "\"").delimiters("\\(", ")"));
///
/// let swift = registry.get("swift").unwrap();
/// assert_eq!(swift.placeholder("name"), "\\(name)");
/// ```
pub struct Registry {
    dialects: BTreeMap<String, Box<dyn TemplateDialect>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            dialects: BTreeMap::new(),
        }
    }

    /// A registry holding the `csharp`, `javascript` and `python` presets.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Dialect::csharp());
        registry.register(Dialect::javascript());
        registry.register(Dialect::python());
        registry
    }

    /// Register a dialect. If a dialect with the same name already exists,
    /// it is replaced.
    pub fn register(&mut self, dialect: impl TemplateDialect + 'static) {
        self.dialects
            .insert(dialect.name().to_string(), Box::new(dialect));
    }

    pub fn get(&self, name: &str) -> Option<&dyn TemplateDialect> {
        self.dialects.get(name).map(|d| d.as_ref())
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dialects.keys().map(String::as_str)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    #[test]
    fn test_csharp_escapes() {
        let cs = Dialect::csharp();
        assert_eq!(cs.escape_text("a{b}c"), "a{{b}}c");
        assert_eq!(cs.escape_text("path\\to"), "path\\\\to");
        assert_eq!(cs.escape_text("line\nnext\t\"q\""), "line\\nnext\\t\\\"q\\\"");
    }

    #[test]
    fn test_javascript_escapes_every_dollar() {
        let js = Dialect::javascript();
        assert_eq!(js.escape_text("cost: ${x} {y}"), "cost: \\${x} {y}");
        assert_eq!(js.escape_text("$5 or $"), "\\$5 or \\$");
        assert_eq!(js.escape_text("`tick`"), "\\`tick\\`");
        assert_eq!(js.placeholder("a + b"), "${a + b}");
    }

    #[test]
    fn test_javascript_split_placeholder_stays_literal() {
        let js = Dialect::javascript();
        let joined = format!("{}{}", js.escape_text("$"), js.escape_text("{x}"));
        assert_eq!(joined, "\\${x}");
    }

    #[test]
    fn test_python_doubles_braces() {
        let py = Dialect::python();
        assert_eq!(py.escape_text("{}"), "{{}}");
        assert_eq!(py.prefix(), "f\"");
    }

    #[test]
    fn test_escape_is_single_pass() {
        // The backslash produced for the quote must not be escaped again.
        let cs = Dialect::csharp();
        assert_eq!(cs.escape_text("\""), "\\\"");
    }

    #[test]
    fn test_escape_keeps_multibyte_text() {
        let cs = Dialect::csharp();
        assert_eq!(cs.escape_text("héllo {ü}"), "héllo {{ü}}");
    }

    #[test]
    fn test_needs_parentheses_default() {
        let cs = Dialect::csharp();
        let tree = parse_expr(r#"f(c ? "t" : "f", a + b, (a + b), name)"#).unwrap();
        let crate::ast::ExprKind::Call { args, .. } = tree.kind(tree.root()) else {
            panic!("expected call");
        };
        assert!(cs.needs_parentheses(&tree, args[0]));
        assert!(cs.needs_parentheses(&tree, args[1]));
        assert!(!cs.needs_parentheses(&tree, args[2]));
        assert!(!cs.needs_parentheses(&tree, args[3]));
    }

    #[test]
    fn test_registry_lookup_and_replace() {
        let mut registry = Registry::with_builtins();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["csharp", "javascript", "python"]
        );
        assert!(registry.get("ruby").is_none());

        registry.register(Dialect::new("csharp", "$@\"", "\""));
        assert_eq!(registry.get("csharp").map(|d| d.prefix()), Some("$@\""));
    }
}
