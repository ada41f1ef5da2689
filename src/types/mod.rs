//! Static result types and the oracle that answers type queries.
//!
//! The engine never guesses whether a `+` is a string concatenation; it
//! asks a [`TypeOracle`]. Hosts with a real semantic model implement the
//! trait over it. [`TypeEnv`] is the bundled implementation, which infers
//! types from literals and a table of declared names.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::ast::{BinOp, ExprId, ExprKind, Literal, SyntaxTree, UnaryOp};

/// A statically inferred result type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    String,
    Number,
    Bool,
    Null,
    /// Any other named type, e.g. `DateTime`.
    Named(String),
}

impl Type {
    pub fn is_string(&self) -> bool {
        matches!(self, Type::String)
    }

    /// Whether `null` may stand in for a value of this type.
    fn accepts_null(&self) -> bool {
        matches!(self, Type::String | Type::Named(_) | Type::Null)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::String => f.write_str("string"),
            Type::Number => f.write_str("number"),
            Type::Bool => f.write_str("bool"),
            Type::Null => f.write_str("null"),
            Type::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for Type {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "string" | "String" => Type::String,
            "number" | "int" | "long" | "float" | "double" | "decimal" => Type::Number,
            "bool" | "boolean" => Type::Bool,
            "null" => Type::Null,
            other => Type::Named(other.to_string()),
        })
    }
}

/// Trait implemented by the host to expose static type information.
///
/// `result_type` returning `None` means the type could not be resolved
/// (undeclared name, erroneous input, unsupported construct). Callers must
/// treat an unresolved node as opaque, never as a string concatenation.
pub trait TypeOracle {
    fn result_type(&self, tree: &SyntaxTree, id: ExprId) -> Option<Type>;

    /// Whether the node's static result type is the built-in string type.
    fn is_string(&self, tree: &SyntaxTree, id: ExprId) -> bool {
        self.result_type(tree, id).is_some_and(|ty| ty.is_string())
    }

    /// Result types of every node in `tree`, indexed by [`ExprId::index`].
    ///
    /// The default asks [`result_type`](Self::result_type) once per node.
    /// Oracles whose lookups walk the subtree should override this with a
    /// single bottom-up pass.
    fn annotate(&self, tree: &SyntaxTree) -> Vec<Option<Type>> {
        tree.ids().map(|id| self.result_type(tree, id)).collect()
    }
}

impl<T: TypeOracle + ?Sized> TypeOracle for &T {
    fn result_type(&self, tree: &SyntaxTree, id: ExprId) -> Option<Type> {
        (**self).result_type(tree, id)
    }

    fn annotate(&self, tree: &SyntaxTree) -> Vec<Option<Type>> {
        (**self).annotate(tree)
    }
}

/// Result types resolved once for a whole tree.
///
/// Lookups are a vector index, so the engine can query every node of a long
/// chain without asking the underlying oracle again.
///
/// ```rust
/// use concat_interp::{parse_expr, Type, TypeEnv, TypeOracle, TypeTable};
///
/// let tree = parse_expr(r#""n=" + n"#).unwrap();
/// let env = TypeEnv::new().with_variable("n", Type::Number);
/// let table = TypeTable::build(&tree, &env);
/// assert!(table.is_string(&tree, tree.root()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTable {
    types: Vec<Option<Type>>,
}

impl TypeTable {
    pub fn build<O: TypeOracle + ?Sized>(tree: &SyntaxTree, oracle: &O) -> Self {
        let types = oracle.annotate(tree);
        debug_assert_eq!(types.len(), tree.len(), "annotation must cover every node");
        Self { types }
    }
}

impl TypeOracle for TypeTable {
    fn result_type(&self, _tree: &SyntaxTree, id: ExprId) -> Option<Type> {
        self.types.get(id.index()).cloned().flatten()
    }

    fn annotate(&self, _tree: &SyntaxTree) -> Vec<Option<Type>> {
        self.types.clone()
    }
}

/// String members with a fixed result type.
const STRING_METHODS: &[&str] = &[
    "ToUpper",
    "ToLower",
    "Trim",
    "TrimStart",
    "TrimEnd",
    "Substring",
    "Replace",
    "PadLeft",
    "PadRight",
];

/// A [`TypeOracle`] backed by declared variable and function types.
///
/// Dotted member paths can be declared directly, which is how hosts
/// without a full member model describe `user.Name`.
///
/// ```rust
/// use concat_interp::{parse_expr, Type, TypeEnv, TypeOracle};
///
/// let env = TypeEnv::new()
///     .with_variable("name", Type::String)
///     .with_variable("count", Type::Number);
///
/// let tree = parse_expr(r#""hi " + name"#).unwrap();
/// assert_eq!(env.result_type(&tree, tree.root()), Some(Type::String));
///
/// let tree = parse_expr("count + 1").unwrap();
/// assert_eq!(env.result_type(&tree, tree.root()), Some(Type::Number));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    variables: HashMap<String, Type>,
    functions: HashMap<String, Type>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable (or dotted member path) with a static type.
    pub fn declare(&mut self, name: impl Into<String>, ty: Type) {
        self.variables.insert(name.into(), ty);
    }

    /// Declare a function by name together with its return type.
    pub fn declare_function(&mut self, name: impl Into<String>, returns: Type) {
        self.functions.insert(name.into(), returns);
    }

    pub fn with_variable(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.declare(name, ty);
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, returns: Type) -> Self {
        self.declare_function(name, returns);
        self
    }

    /// Type of `id` given the types of its descendants, looked up through
    /// `known`.
    fn infer_node(
        &self,
        tree: &SyntaxTree,
        id: ExprId,
        known: impl Fn(ExprId) -> Option<Type>,
    ) -> Option<Type> {
        match tree.kind(id) {
            ExprKind::Literal(lit) => Some(match lit {
                Literal::String { .. } => Type::String,
                Literal::Number(_) => Type::Number,
                Literal::Bool(_) => Type::Bool,
                Literal::Null => Type::Null,
            }),
            ExprKind::Identifier(name) => self.variables.get(name).cloned(),
            ExprKind::Paren(inner) => known(*inner),
            ExprKind::Member { target, name } => {
                self.infer_member(tree, *target, name, known(*target))
            }
            ExprKind::Call { callee, .. } => self.infer_call(tree, *callee, &known),
            ExprKind::Unary { op, operand } => match (op, known(*operand)?) {
                (UnaryOp::Not, Type::Bool) => Some(Type::Bool),
                (UnaryOp::Neg, Type::Number) => Some(Type::Number),
                _ => None,
            },
            ExprKind::Binary { left, op, right } => {
                let left = known(*left)?;
                let right = known(*right)?;
                infer_binary(&left, *op, &right)
            }
            ExprKind::Conditional {
                then_branch,
                else_branch,
                ..
            } => unify(known(*then_branch)?, known(*else_branch)?),
        }
    }

    fn infer_member(
        &self,
        tree: &SyntaxTree,
        target: ExprId,
        name: &str,
        target_type: Option<Type>,
    ) -> Option<Type> {
        if let Some(path) = dotted_path(tree, target) {
            let full = format!("{path}.{name}");
            if let Some(ty) = self.variables.get(&full) {
                return Some(ty.clone());
            }
        }
        match (target_type?, name) {
            (Type::String, "Length") => Some(Type::Number),
            _ => None,
        }
    }

    fn infer_call(
        &self,
        tree: &SyntaxTree,
        callee: ExprId,
        known: &impl Fn(ExprId) -> Option<Type>,
    ) -> Option<Type> {
        match tree.kind(callee) {
            ExprKind::Identifier(name) => self.functions.get(name).cloned(),
            ExprKind::Member { target, name } => {
                if let Some(path) = dotted_path(tree, callee)
                    && let Some(ty) = self.functions.get(&path)
                {
                    return Some(ty.clone());
                }
                let receiver = known(*target)?;
                if name == "ToString" {
                    return Some(Type::String);
                }
                match receiver {
                    Type::String if STRING_METHODS.contains(&name.as_str()) => Some(Type::String),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl TypeOracle for TypeEnv {
    /// Resolves the subtree under `id` bottom-up with an explicit work list,
    /// so chains of any length are handled without recursion.
    fn result_type(&self, tree: &SyntaxTree, id: ExprId) -> Option<Type> {
        let mut subtree = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            subtree.push(next);
            stack.extend(tree.children(next));
        }
        // Children precede their parents in the arena.
        subtree.sort_unstable();

        let mut known: HashMap<ExprId, Option<Type>> = HashMap::with_capacity(subtree.len());
        for node in subtree {
            let ty = self.infer_node(tree, node, |child| known.get(&child).cloned().flatten());
            known.insert(node, ty);
        }
        known.remove(&id).flatten()
    }

    fn annotate(&self, tree: &SyntaxTree) -> Vec<Option<Type>> {
        let mut types: Vec<Option<Type>> = Vec::with_capacity(tree.len());
        for id in tree.ids() {
            let ty = self.infer_node(tree, id, |child| types.get(child.index()).cloned().flatten());
            types.push(ty);
        }
        types
    }
}

fn infer_binary(left: &Type, op: BinOp, right: &Type) -> Option<Type> {
    match op {
        BinOp::Add => match (left, right) {
            (Type::String, _) | (_, Type::String) => Some(Type::String),
            (Type::Number, Type::Number) => Some(Type::Number),
            _ => None,
        },
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => match (left, right) {
            (Type::Number, Type::Number) => Some(Type::Number),
            _ => None,
        },
        BinOp::And | BinOp::Or => match (left, right) {
            (Type::Bool, Type::Bool) => Some(Type::Bool),
            _ => None,
        },
        _ if op.is_comparison() => Some(Type::Bool),
        _ => None,
    }
}

/// The common type of two conditional branches.
fn unify(a: Type, b: Type) -> Option<Type> {
    if a == b {
        return Some(a);
    }
    match (a, b) {
        (Type::Null, other) | (other, Type::Null) if other.accepts_null() => Some(other),
        _ => None,
    }
}

/// `a.b.c` for a chain of identifiers and member accesses, `None` for
/// anything else.
fn dotted_path(tree: &SyntaxTree, id: ExprId) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = id;
    loop {
        match tree.kind(current) {
            ExprKind::Identifier(name) => {
                parts.push(name.as_str());
                break;
            }
            ExprKind::Member { target, name } => {
                parts.push(name.as_str());
                current = *target;
            }
            _ => return None,
        }
    }
    parts.reverse();
    Some(parts.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn type_of(env: &TypeEnv, source: &str) -> Option<Type> {
        let tree = parse_expr(source).expect("parse failed");
        env.result_type(&tree, tree.root())
    }

    fn env() -> TypeEnv {
        TypeEnv::new()
            .with_variable("name", Type::String)
            .with_variable("count", Type::Number)
            .with_variable("flag", Type::Bool)
            .with_variable("when", Type::Named("DateTime".into()))
            .with_variable("user.Name", Type::String)
            .with_function("Describe", Type::String)
    }

    #[test]
    fn test_literals() {
        let env = env();
        assert_eq!(type_of(&env, r#""x""#), Some(Type::String));
        assert_eq!(type_of(&env, "@\"x\""), Some(Type::String));
        assert_eq!(type_of(&env, "1.5"), Some(Type::Number));
        assert_eq!(type_of(&env, "true"), Some(Type::Bool));
        assert_eq!(type_of(&env, "null"), Some(Type::Null));
    }

    #[test]
    fn test_string_plus_anything_is_string() {
        let env = env();
        assert_eq!(type_of(&env, r#""n=" + count"#), Some(Type::String));
        assert_eq!(type_of(&env, r#"when + "!""#), Some(Type::String));
        assert_eq!(type_of(&env, r#""a" + null"#), Some(Type::String));
    }

    #[test]
    fn test_numeric_addition() {
        let env = env();
        assert_eq!(type_of(&env, "count + 1"), Some(Type::Number));
        assert_eq!(type_of(&env, "(count + 1) * 2"), Some(Type::Number));
    }

    #[test]
    fn test_unresolved_propagates() {
        let env = env();
        assert_eq!(type_of(&env, "missing"), None);
        assert_eq!(type_of(&env, r#""a" + missing"#), None);
        assert_eq!(type_of(&env, "flag + 1"), None);
    }

    #[test]
    fn test_conditional_unifies_branches() {
        let env = env();
        assert_eq!(type_of(&env, r#"flag ? "t" : "f""#), Some(Type::String));
        assert_eq!(type_of(&env, r#"flag ? name : null"#), Some(Type::String));
        assert_eq!(type_of(&env, r#"flag ? "t" : 1"#), None);
    }

    #[test]
    fn test_members_and_calls() {
        let env = env();
        assert_eq!(type_of(&env, "user.Name"), Some(Type::String));
        assert_eq!(type_of(&env, "name.Length"), Some(Type::Number));
        assert_eq!(type_of(&env, "name.ToUpper()"), Some(Type::String));
        assert_eq!(type_of(&env, "count.ToString()"), Some(Type::String));
        assert_eq!(type_of(&env, "Describe(count)"), Some(Type::String));
        assert_eq!(type_of(&env, "Unknown()"), None);
        assert_eq!(type_of(&env, "missing.ToString()"), None);
    }

    #[test]
    fn test_comparisons_and_logic() {
        let env = env();
        assert_eq!(type_of(&env, "count > 1"), Some(Type::Bool));
        assert_eq!(type_of(&env, "flag && !flag"), Some(Type::Bool));
    }

    #[test]
    fn test_annotate_matches_result_type() {
        let env = env();
        let tree = parse_expr(r#""a" + (count + 1) + user.Name.ToUpper() + (flag ? name : null)"#)
            .unwrap();
        let types = env.annotate(&tree);
        assert_eq!(types.len(), tree.len());
        for id in tree.ids() {
            assert_eq!(types[id.index()], env.result_type(&tree, id), "node {id}");
        }

        let table = TypeTable::build(&tree, &env);
        assert_eq!(table.result_type(&tree, tree.root()), Some(Type::String));
        assert_eq!(table.annotate(&tree), types);
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let source = (0..20_000)
            .map(|i| if i % 2 == 0 { format!("\"{i}\"") } else { "name".to_string() })
            .collect::<Vec<_>>()
            .join(" + ");
        let tree = parse_expr(&source).unwrap();
        let env = env();

        assert_eq!(env.result_type(&tree, tree.root()), Some(Type::String));
        let types = env.annotate(&tree);
        assert!(types.iter().all(|ty| ty == &Some(Type::String)));
    }

    #[test]
    fn test_type_names_parse() {
        assert_eq!("string".parse::<Type>(), Ok(Type::String));
        assert_eq!("int".parse::<Type>(), Ok(Type::Number));
        assert_eq!("Guid".parse::<Type>(), Ok(Type::Named("Guid".into())));
    }
}
