//! Step chain walking
//!
//! A step chain value is a sequence of literal prefixes such as `GET ` then
//! `/api/users`. Each item of the chain is one prefix; its `next_step` hint
//! covers the rest of the value.

use crate::hints::{CodeHint, HintKind};

/// Follow a step chain through `value`
///
/// Returns the hint that applies at the end of the consumed prefixes together
/// with the remaining text. The value is trimmed before each step, so a chain
/// item ending in a space only matches once something follows it. A non-chain
/// hint is returned as is.
pub fn walk<'h, 'v>(hint: &'h CodeHint, value: &'v str) -> (&'h CodeHint, &'v str) {
    let mut current = hint;
    let mut rest = value.trim();
    loop {
        if current.kind != HintKind::StepChain || rest.is_empty() {
            return (current, rest);
        }
        let Some(item) = current
            .items
            .iter()
            .find(|item| !item.value.is_empty() && rest.starts_with(&item.value))
        else {
            return (current, rest);
        };
        let Some(next) = item.next_step.as_deref() else {
            return (current, rest);
        };
        current = next;
        rest = rest[item.value.len()..].trim();
    }
}

/// Whether the trimmed `value` starts with one of the chain's top-level prefixes
pub fn has_known_prefix(hint: &CodeHint, value: &str) -> bool {
    let value = value.trim();
    hint.items
        .iter()
        .any(|item| !item.value.is_empty() && value.starts_with(&item.value))
}
