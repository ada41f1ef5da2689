//! Folding of adjacent string literals.

use super::flatten::Leaf;
use crate::ast::StringStyle;

/// Fuse every run of adjacent regular literals into one literal.
///
/// Values are joined at the value level, so escapes never interact. Raw
/// literals are left untouched and also break a run on either side. The
/// merged leaf keeps the source of the first literal in its run.
///
/// The pass is maximal: running it again changes nothing.
pub fn merge(leaves: Vec<Leaf>) -> Vec<Leaf> {
    let mut merged: Vec<Leaf> = Vec::with_capacity(leaves.len());

    for leaf in leaves {
        if let Leaf::Literal(next) = &leaf
            && next.style == StringStyle::Regular
            && let Some(Leaf::Literal(acc)) = merged.last_mut()
            && acc.style == StringStyle::Regular
        {
            acc.text.push_str(&next.text);
            continue;
        }
        merged.push(leaf);
    }

    merged
}
