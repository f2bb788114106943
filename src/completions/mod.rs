//! Completion: from a cursor position to suggestions

mod attributes;
mod elements;
mod item;
pub mod step;
mod text;
mod values;

pub use attributes::complete_attributes;
pub use elements::{complete_children, complete_roots};
pub use item::{Suggestion, SuggestionKind};
pub use text::{complete_hacker_script, complete_replace_text, is_hacker_script};
pub use values::complete_value;

use crate::context::HintContext;
use crate::parser::{ActiveNode, CursorContext, ParseError, ParseOutcome, Parser};
use tracing::debug;

/// Suggestions for `text` with the cursor at byte `offset`
///
/// Results are ordered by priority; an unparsable document yields none.
pub fn complete(text: &str, offset: usize, ctx: &HintContext<'_>) -> Vec<Suggestion> {
    if let Some(items) = complete_hacker_script(ctx.model, text, offset, ctx.relative_path) {
        return sorted(items);
    }
    if let Some(items) = complete_replace_text(ctx.model, text, offset) {
        return sorted(items);
    }

    let completions = match Parser::new(text).with_target(offset).run() {
        Ok(ParseOutcome::Aborted(active)) => resolve(Some(&active), ctx),
        Ok(ParseOutcome::Complete(_)) | Err(ParseError::Empty) => resolve(None, ctx),
        Err(e) => {
            debug!("no completion at {}: {}", offset, e);
            Vec::new()
        }
    };
    sorted(completions)
}

/// Suggestions for an active node; `None` means there is no element yet
pub fn resolve(active: Option<&ActiveNode>, ctx: &HintContext<'_>) -> Vec<Suggestion> {
    let Some(active) = active else {
        return complete_roots(ctx);
    };
    let node = active.node();

    match active.context {
        CursorContext::Content => {
            let children = complete_children(active, ctx);
            if !children.is_empty() {
                return children;
            }
            ctx.model
                .find(&node.node_path, ctx.relative_path)
                .and_then(|def| def.content_hint.as_ref())
                .map(|hint| complete_value(hint, &node.content, Some(node), ctx))
                .unwrap_or_default()
        }
        CursorContext::Attribute => match (active.attribute(), &active.attribute_value) {
            (Some(name), Some(value)) => {
                let Some(def) = ctx.model.find(&node.node_path, ctx.relative_path) else {
                    return Vec::new();
                };
                def.effective_attributes(node)
                    .get(name)
                    .map(|hint| complete_value(hint, &value.value, Some(node), ctx))
                    .unwrap_or_default()
            }
            _ => complete_attributes(active, ctx),
        },
    }
}

fn sorted(mut completions: Vec<Suggestion>) -> Vec<Suggestion> {
    completions.sort_by_key(|c| c.sort_priority);
    completions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::{build_model, parse_hint_source, HintModel};
    use crate::resources::ResourceIndex;
    use crate::script::ScriptRegistry;
    use crate::workspace::NoFiles;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const HINTS: &str = r#"<HacknetEditorHint>
  <Node name="Computer" desc="A computer node">
    <Attribute name="id" required="true" />
    <Attribute name="type" default="1">
      <Enums>
        <Enum desc="Corporate">1</Enum>
        <Enum desc="eOS">4</Enum>
      </Enums>
    </Attribute>
    <ConditionAttributes attr="type" match="^4$">
      <Attribute name="icon" />
    </ConditionAttributes>
  </Node>
  <Node name="Computer.adminPass" multi="false">
    <Content hint="Enum">
      <Enums><Enum>password</Enum></Enums>
    </Content>
  </Node>
  <Node name="Computer.file" />
</HacknetEditorHint>"#;

    fn model() -> HintModel {
        let doc = parse_hint_source(HINTS, Path::new("hints.xml")).unwrap();
        build_model(vec![doc])
    }

    fn labels(text: &str, offset: usize) -> Vec<String> {
        let model = model();
        let resources = ResourceIndex::default();
        let scripts = ScriptRegistry::new();
        let ctx = HintContext::new(&model, &resources, &NoFiles, &scripts);
        complete(text, offset, &ctx)
            .into_iter()
            .map(|s| s.label)
            .collect()
    }

    #[test]
    fn test_empty_document_offers_roots() {
        assert_eq!(labels("", 0), vec!["Computer"]);
    }

    #[test]
    fn test_attribute_names_then_values() {
        let text = r#"<Computer id="a" type="" />"#;
        // Whitespace before `type`
        assert_eq!(labels(text, 16), vec!["type"]);
        // Inside the empty value
        assert_eq!(labels(text, 23), vec!["1", "4"]);
    }

    #[test]
    fn test_conditional_attribute_appears() {
        let text = r#"<Computer id="a" type="4" ></Computer>"#;
        assert_eq!(labels(text, 25), vec!["icon"]);
    }

    #[test]
    fn test_content_prefers_children_then_content_hint() {
        let text = "<Computer>\n  \n</Computer>";
        assert_eq!(labels(text, 12), vec!["adminPass", "file"]);

        let text = "<Computer><adminPass> </adminPass></Computer>";
        assert_eq!(labels(text, 21), vec!["password"]);
    }

    #[test]
    fn test_malformed_document_yields_nothing() {
        assert!(labels("<Computer id=>", 13).is_empty());
    }
}
