//! Element completions

use super::item::{Suggestion, SuggestionKind};
use crate::context::HintContext;
use crate::hints::NodeHintDefinition;
use crate::parser::ActiveNode;

/// Top-level tags, for an empty document
pub fn complete_roots(ctx: &HintContext<'_>) -> Vec<Suggestion> {
    ctx.model
        .roots(ctx.relative_path)
        .into_iter()
        .enumerate()
        .map(|(index, def)| element_suggestion(def, index))
        .collect()
}

/// Tags that may appear directly inside the active element
///
/// Tags that allow only one instance are left out once present.
pub fn complete_children(active: &ActiveNode, ctx: &HintContext<'_>) -> Vec<Suggestion> {
    let present: Vec<&str> = active
        .document
        .children(active.id)
        .map(|child| child.name.as_str())
        .collect();

    ctx.model
        .children_of(active.path(), active.depth(), ctx.relative_path)
        .into_iter()
        .filter(|def| def.allow_multiple || !present.contains(&def.name.as_str()))
        .enumerate()
        .map(|(index, def)| element_suggestion(def, index))
        .collect()
}

fn element_suggestion(def: &NodeHintDefinition, index: usize) -> Suggestion {
    let insert = if def.snippet.is_empty() {
        format!("<{} />", def.name)
    } else {
        def.snippet.clone()
    };
    let mut suggestion = Suggestion::new(&def.name, SuggestionKind::Element)
        .with_detail(&def.description)
        .with_insert_text(insert)
        .as_snippet()
        .with_priority(index as u32);
    if !def.allow_multiple {
        suggestion = suggestion.with_documentation("Only one allowed per parent");
    }
    suggestion
}
