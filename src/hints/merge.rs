//! Merge partial hint definitions into one model
//!
//! Definitions are keyed by their exact node path. Later documents win: each
//! incoming attribute, conditional block and content hint is combined with the
//! existing one according to its own [`MergeRule`]. Snippets are generated only
//! once everything has been merged.

use super::loader::HintDocument;
use super::types::{
    CodeHint, ConditionalAttributeHint, HintItem, HintModel, MergeRule, NodeHintDefinition,
};
use indexmap::IndexMap;

/// Soft wrap width for generated element snippets
const SNIPPET_LINE_WIDTH: usize = 120;

/// Merge documents in order and build the final model
pub fn build_model(documents: Vec<HintDocument>) -> HintModel {
    let mut model = HintModel::new();
    let mut merged: IndexMap<String, NodeHintDefinition> = IndexMap::new();

    for document in documents {
        for def in document.definitions {
            merge_into(&mut merged, def);
        }
        model.replace_text.extend(document.replace_text);
        model.shared_text.extend(document.shared_text);
        if let Some(scripts) = document.hacker_scripts {
            model.hacker_scripts.file_trigger = scripts.file_trigger;
            model.hacker_scripts.items.extend(scripts.items);
        }
        model.warnings.extend(document.warnings);
    }

    model.definitions = merged
        .into_values()
        .map(|mut def| {
            def.snippet = element_snippet(&def);
            def
        })
        .collect();
    model
}

/// Add `incoming` to the map, merging with an existing definition of the same path
pub fn merge_into(merged: &mut IndexMap<String, NodeHintDefinition>, incoming: NodeHintDefinition) {
    match merged.get_mut(&incoming.node_path) {
        Some(existing) => merge_definition(existing, incoming),
        None => {
            merged.insert(incoming.node_path.clone(), incoming);
        }
    }
}

/// Combine two definitions of the same tag path
pub fn merge_definition(existing: &mut NodeHintDefinition, incoming: NodeHintDefinition) {
    if !incoming.description.is_empty() {
        existing.description = incoming.description;
    }
    if incoming.file_trigger.is_some() {
        existing.file_trigger = incoming.file_trigger;
    }

    if let Some(content) = incoming.content_hint {
        merge_content(&mut existing.content_hint, content);
    }
    merge_attributes(&mut existing.attribute_hints, incoming.attribute_hints);
    merge_conditionals(&mut existing.conditional_hints, incoming.conditional_hints);
}

fn merge_content(existing: &mut Option<CodeHint>, incoming: CodeHint) {
    match incoming.merge_rule {
        MergeRule::OverrideOrAppend => *existing = Some(incoming),
        MergeRule::Remove => *existing = None,
        rule => {
            let same_kind = existing.as_ref().is_some_and(|c| c.kind == incoming.kind);
            if same_kind {
                if let Some(current) = existing.as_mut() {
                    merge_items(&mut current.items, incoming.items, rule);
                }
            } else if rule == MergeRule::OverrideOrAppendItem {
                *existing = Some(incoming);
            }
        }
    }
}

/// Merge attribute maps, each incoming hint following its own rule
pub fn merge_attributes(existing: &mut IndexMap<String, CodeHint>, incoming: IndexMap<String, CodeHint>) {
    for (name, hint) in incoming {
        match hint.merge_rule {
            MergeRule::OverrideOrAppend => {
                existing.insert(name, hint);
            }
            MergeRule::Remove => {
                existing.shift_remove(&name);
            }
            rule => {
                let same_kind = existing.get(&name).is_some_and(|c| c.kind == hint.kind);
                if same_kind {
                    if let Some(current) = existing.get_mut(&name) {
                        merge_items(&mut current.items, hint.items, rule);
                    }
                } else if rule == MergeRule::OverrideOrAppendItem {
                    existing.insert(name, hint);
                }
            }
        }
    }
}

/// Upsert or remove items by value
fn merge_items(existing: &mut Vec<HintItem>, incoming: Vec<HintItem>, rule: MergeRule) {
    for item in incoming {
        let position = existing.iter().position(|i| i.value == item.value);
        match (rule, position) {
            (MergeRule::RemoveItem, Some(index)) => {
                existing.remove(index);
            }
            (MergeRule::RemoveItem, None) => {}
            (_, Some(index)) => existing[index] = item,
            (_, None) => existing.push(item),
        }
    }
}

fn merge_conditionals(
    existing: &mut Vec<ConditionalAttributeHint>,
    incoming: Vec<ConditionalAttributeHint>,
) {
    for conditional in incoming {
        let position = existing.iter().position(|c| {
            c.trigger_attr == conditional.trigger_attr && c.match_regex == conditional.match_regex
        });
        match (conditional.merge_rule, position) {
            (MergeRule::OverrideOrAppend, Some(index)) => existing[index] = conditional,
            (MergeRule::Remove, Some(index)) => {
                existing.remove(index);
            }
            (MergeRule::OverrideOrAppendItem, Some(index)) => {
                merge_attributes(&mut existing[index].attributes, conditional.attributes)
            }
            (MergeRule::RemoveItem, Some(index)) => {
                let current = &mut existing[index];
                for name in conditional.attributes.keys() {
                    current.attributes.shift_remove(name);
                }
            }
            (MergeRule::OverrideOrAppend | MergeRule::OverrideOrAppendItem, None) => {
                existing.push(conditional)
            }
            (MergeRule::Remove | MergeRule::RemoveItem, None) => {}
        }
    }
}

/// Snippet inserting the element with its required attributes
pub fn element_snippet(def: &NodeHintDefinition) -> String {
    let mut snippet = format!("<{}", def.name);
    let mut index = 1;
    let mut wrap_at = SNIPPET_LINE_WIDTH;

    for (name, hint) in &def.attribute_hints {
        if hint.required {
            snippet.push_str(&format!(
                " {}=\"${{{}:{}}}\"",
                name,
                index,
                escape_snippet(&hint.default_value)
            ));
            index += 1;
        }
        if snippet.len() >= wrap_at {
            snippet.push_str("\n    ");
            wrap_at += SNIPPET_LINE_WIDTH;
        }
    }

    if !def.conditional_hints.is_empty() {
        snippet.push_str(&format!("${{{}}}", index));
        index += 1;
    }

    match &def.content_hint {
        Some(content) if content.default_value.is_empty() => {
            snippet.push_str(&format!(">\n    ${{{}}}\n</{}>", index, def.name));
        }
        Some(content) => {
            snippet.push_str(&format!(
                ">${{{}:{}}}</{}>",
                index,
                escape_snippet(&content.default_value),
                def.name
            ));
        }
        None => snippet.push_str(" />"),
    }
    snippet
}

/// Snippet inserting one attribute
pub fn attribute_snippet(name: &str, hint: &CodeHint) -> String {
    format!("{}=\"${{1:{}}}\" ", name, escape_snippet(&hint.default_value))
}

fn escape_snippet(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('$', "\\$")
        .replace('}', "\\}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::{HintKind, TextHint};
    use crate::path::PathPattern;
    use pretty_assertions::assert_eq;

    fn definition(path: &str) -> NodeHintDefinition {
        NodeHintDefinition::new(PathPattern::parse(path).unwrap())
    }

    fn enum_hint(values: &[&str], rule: MergeRule) -> CodeHint {
        CodeHint::new(HintKind::Enum)
            .with_items(values.iter().map(|v| HintItem::new(*v)).collect())
            .with_merge_rule(rule)
    }

    fn document(defs: Vec<NodeHintDefinition>) -> HintDocument {
        HintDocument {
            definitions: defs,
            ..HintDocument::default()
        }
    }

    fn computer() -> NodeHintDefinition {
        let mut def = definition("Computer");
        def.description = "A computer".into();
        def.attribute_hints
            .insert("type".into(), enum_hint(&["1", "2"], MergeRule::OverrideOrAppend));
        def
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = build_model(vec![document(vec![computer()])]);
        let twice = build_model(vec![document(vec![computer()]), document(vec![computer()])]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_later_include_wins() {
        let mut later = definition("Computer");
        later.description = "Overridden".into();
        later
            .attribute_hints
            .insert("type".into(), enum_hint(&["9"], MergeRule::OverrideOrAppend));

        let model = build_model(vec![document(vec![computer()]), document(vec![later])]);
        let def = &model.definitions[0];
        assert_eq!(def.description, "Overridden");
        assert_eq!(def.attribute_hints["type"].items, vec![HintItem::new("9")]);
    }

    #[test]
    fn test_empty_description_keeps_existing() {
        let model = build_model(vec![
            document(vec![computer()]),
            document(vec![definition("Computer")]),
        ]);
        assert_eq!(model.definitions[0].description, "A computer");
        assert_eq!(model.definitions[0].attribute_hints.len(), 1);
    }

    #[test]
    fn test_item_rules() {
        let mut add = definition("Computer");
        add.attribute_hints.insert(
            "type".into(),
            enum_hint(&["2", "3"], MergeRule::OverrideOrAppendItem),
        );
        let mut remove = definition("Computer");
        remove
            .attribute_hints
            .insert("type".into(), enum_hint(&["1"], MergeRule::RemoveItem));

        let model = build_model(vec![document(vec![computer(), add, remove])]);
        let values: Vec<_> = model.definitions[0].attribute_hints["type"]
            .items
            .iter()
            .map(|i| i.value.as_str())
            .collect();
        assert_eq!(values, vec!["2", "3"]);
    }

    #[test]
    fn test_remove_attribute() {
        let mut remove = definition("Computer");
        remove
            .attribute_hints
            .insert("type".into(), CodeHint::default().with_merge_rule(MergeRule::Remove));
        let model = build_model(vec![document(vec![computer(), remove])]);
        assert!(model.definitions[0].attribute_hints.is_empty());
    }

    #[test]
    fn test_conditional_merge() {
        let conditional = |names: &[&str], rule| {
            let mut attributes = IndexMap::new();
            for name in names {
                attributes.insert(name.to_string(), CodeHint::default());
            }
            ConditionalAttributeHint {
                trigger_attr: "type".into(),
                match_regex: "4".into(),
                attributes,
                merge_rule: rule,
            }
        };

        let mut base = computer();
        base.conditional_hints
            .push(conditional(&["icon"], MergeRule::OverrideOrAppend));
        let mut extend = definition("Computer");
        extend
            .conditional_hints
            .push(conditional(&["color"], MergeRule::OverrideOrAppendItem));
        let mut prune = definition("Computer");
        prune
            .conditional_hints
            .push(conditional(&["icon"], MergeRule::RemoveItem));

        let model = build_model(vec![document(vec![base, extend, prune])]);
        let hints = &model.definitions[0].conditional_hints;
        assert_eq!(hints.len(), 1);
        let names: Vec<_> = hints[0].attributes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["color"]);
    }

    #[test]
    fn test_content_rules() {
        let mut with_content = definition("mission.nextMission");
        with_content.content_hint = Some(CodeHint::new(HintKind::FileRef(
            crate::hints::FileClass::Mission,
        )));
        let mut cleared = definition("mission.nextMission");
        cleared.content_hint = Some(CodeHint::default().with_merge_rule(MergeRule::Remove));

        let model = build_model(vec![document(vec![with_content.clone()])]);
        assert!(model.definitions[0].content_hint.is_some());
        let model = build_model(vec![document(vec![with_content, cleared])]);
        assert!(model.definitions[0].content_hint.is_none());
    }

    #[test]
    fn test_element_snippet() {
        let mut def = definition("Computer");
        let mut id = CodeHint::default().required();
        id.default_value = "core".into();
        def.attribute_hints.insert("id".into(), id);
        def.attribute_hints
            .insert("name".into(), CodeHint::default().required());
        def.attribute_hints.insert("icon".into(), CodeHint::default());
        assert_eq!(
            element_snippet(&def),
            r#"<Computer id="${1:core}" name="${2:}" />"#
        );

        def.conditional_hints.push(ConditionalAttributeHint {
            trigger_attr: "type".into(),
            match_regex: ".*".into(),
            attributes: IndexMap::new(),
            merge_rule: MergeRule::OverrideOrAppend,
        });
        def.content_hint = Some(CodeHint::default());
        assert_eq!(
            element_snippet(&def),
            "<Computer id=\"${1:core}\" name=\"${2:}\"${3}>\n    ${4}\n</Computer>"
        );

        def.content_hint.as_mut().unwrap().default_value = "text".into();
        assert!(element_snippet(&def).ends_with(">${4:text}</Computer>"));
    }

    #[test]
    fn test_snippet_wraps_long_lines() {
        let mut def = definition("Computer");
        for i in 0..12 {
            let mut hint = CodeHint::default().required();
            hint.default_value = "a_rather_long_default".into();
            def.attribute_hints.insert(format!("attribute{}", i), hint);
        }
        let snippet = element_snippet(&def);
        assert!(snippet.lines().count() > 1);
    }

    #[test]
    fn test_attribute_snippet() {
        let mut hint = CodeHint::default();
        hint.default_value = "$5".into();
        assert_eq!(attribute_snippet("cost", &hint), "cost=\"${1:\\$5}\" ");
    }

    #[test]
    fn test_text_sections_concatenate() {
        let text = |value: &str| TextHint {
            value: value.into(),
            kind: "Text".into(),
            ..TextHint::default()
        };
        let first = HintDocument {
            shared_text: vec![text("#A#")],
            ..HintDocument::default()
        };
        let second = HintDocument {
            shared_text: vec![text("#B#")],
            ..HintDocument::default()
        };
        let model = build_model(vec![first, second]);
        assert_eq!(model.shared_text.len(), 2);
    }
}
