//! Attribute name completions

use super::item::{Suggestion, SuggestionKind};
use crate::context::HintContext;
use crate::hints::{attribute_snippet, CodeHint, HintKind};
use crate::parser::ActiveNode;

/// Attributes of the active element that are not written yet
pub fn complete_attributes(active: &ActiveNode, ctx: &HintContext<'_>) -> Vec<Suggestion> {
    let node = active.node();
    let Some(def) = ctx.model.find(&node.node_path, ctx.relative_path) else {
        return Vec::new();
    };
    // The name being typed is already in the node; don't hide it
    let typing = active.attribute();

    def.effective_attributes(node)
        .into_iter()
        .filter(|(name, _)| Some(*name) == typing || !node.has_attribute(name))
        .map(|(name, hint)| {
            Suggestion::new(name, SuggestionKind::Attribute)
                .with_detail(format_detail(hint))
                .with_documentation(&hint.description)
                .with_insert_text(attribute_snippet(name, hint))
                .as_snippet()
                .with_priority(if hint.required { 10 } else { 50 })
        })
        .collect()
}

fn format_detail(hint: &CodeHint) -> String {
    let mut parts = vec![format!("Type: {}", kind_name(hint.kind))];
    if hint.required {
        parts.push("Required".to_string());
    }
    if !hint.default_value.is_empty() {
        parts.push(format!("Default: {}", hint.default_value));
    }
    parts.join(" | ")
}

fn kind_name(kind: HintKind) -> &'static str {
    match kind {
        HintKind::Enum => "enum",
        HintKind::EnumWithSharedText => "enum/text",
        HintKind::Script => "script",
        HintKind::ComputerRef => "computer",
        HintKind::ComputerOrDeviceRef => "computer/eos",
        HintKind::FileRef(_) => "file",
        HintKind::Color => "color",
        HintKind::PathRef => "path",
        HintKind::FolderRef => "folder",
        HintKind::StepChain => "step",
    }
}
