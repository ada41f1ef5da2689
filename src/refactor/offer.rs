//! Whether a synthesized result is worth proposing.

use super::synthesize::InterpolatedString;

/// A template with no placeholders is just a string literal; rewriting a
/// chain into one is not a conversion to interpolation.
pub fn should_offer(interpolated: &InterpolatedString) -> bool {
    interpolated.placeholder_count() > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprId;
    use crate::refactor::synthesize::{Placeholder, Segment};

    #[test]
    fn test_text_only_is_not_offered() {
        let result = InterpolatedString::new(vec![Segment::Text("ab".into())]);
        assert!(!should_offer(&result));
        assert!(!should_offer(&InterpolatedString::new(Vec::new())));
    }

    #[test]
    fn test_any_placeholder_is_offered() {
        let result = InterpolatedString::new(vec![Segment::Placeholder(Placeholder {
            node: ExprId(0),
            expr_text: "x".into(),
            parenthesized: false,
        })]);
        assert!(should_offer(&result));
    }
}
