//! Hover descriptions

use crate::context::HintContext;
use crate::hints::{CodeHint, HintKind};
use crate::parser::{parse_at_offset, ActiveNode, CursorContext};

/// Move `offset` forward to the next token delimiter
///
/// Hovering anywhere inside a name or value then lands on the token boundary
/// the parser aborts at: `=` after an attribute name, the closing quote of a
/// value, the space after a tag name.
pub fn hover_offset(text: &str, offset: usize) -> usize {
    let Some(rest) = text.get(offset..) else {
        return offset;
    };
    for (index, c) in rest.char_indices() {
        if matches!(c, '<' | '>' | '=' | '"') || c.is_whitespace() || rest[index..].starts_with("/>") {
            return offset + index;
        }
    }
    text.len()
}

/// Hover text for the cursor position
pub fn hover(text: &str, offset: usize, ctx: &HintContext<'_>) -> Option<String> {
    let active = parse_at_offset(text, hover_offset(text, offset))?;
    describe(&active, ctx)
}

/// Description of whatever the active node's cursor points at
pub fn describe(active: &ActiveNode, ctx: &HintContext<'_>) -> Option<String> {
    let node = active.node();
    let def = ctx.model.find(&node.node_path, ctx.relative_path)?;

    let description = match active.context {
        CursorContext::Content => {
            let hint = def.content_hint.as_ref()?;
            if hint.description.is_empty() {
                return None;
            }
            value_description(hint, &node.content)
        }
        CursorContext::Attribute => match active.attribute() {
            None => def.description.clone(),
            Some(name) => {
                let attributes = def.effective_attributes(node);
                let hint = attributes.get(name)?;
                match &active.attribute_value {
                    Some(value) => value_description(hint, &value.value),
                    None => hint.description.clone(),
                }
            }
        },
    };
    (!description.is_empty()).then_some(description)
}

/// Item description for a value, falling back to the hint's own
fn value_description(hint: &CodeHint, value: &str) -> String {
    let item = match hint.kind {
        HintKind::Enum => hint.items.iter().find(|item| item.value == value),
        HintKind::StepChain => hint
            .items
            .iter()
            .find(|item| !item.value.is_empty() && value.starts_with(&item.value)),
        _ => None,
    };
    item.filter(|item| !item.description.is_empty())
        .map(|item| item.description.clone())
        .unwrap_or_else(|| hint.description.clone())
}
