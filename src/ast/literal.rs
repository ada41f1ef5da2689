/// Lexical flavour of a string literal.
///
/// `Raw` covers verbatim strings (`@"..."`): no escape processing, and the
/// body may contain bare newlines. Concatenating raw content with regular
/// content at the source level is not meaning-preserving, so the merge
/// stage keeps the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringStyle {
    Regular,
    Raw,
}

/// A literal expression as it appears in the tree.
///
/// String values are stored unescaped: `"a\tb"` holds a real tab, and
/// `@"say ""hi"""` holds `say "hi"`.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String { value: String, style: StringStyle },
    Number(f64),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn string(value: impl Into<String>) -> Self {
        Literal::String {
            value: value.into(),
            style: StringStyle::Regular,
        }
    }
}
