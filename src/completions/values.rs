//! Attribute value and element content completions

use super::item::{Suggestion, SuggestionKind};
use super::step;
use crate::context::HintContext;
use crate::hints::{CodeHint, HintKind};
use crate::parser::Node;
use crate::resources::ResourceClass;
use rand::Rng;
use std::collections::HashSet;
use tracing::warn;

const RANDOM_COLORS: usize = 5;

/// Suggestions for a value governed by `hint`
///
/// `value` is the text typed so far; only step chains look at it.
pub fn complete_value(
    hint: &CodeHint,
    value: &str,
    node: Option<&Node>,
    ctx: &HintContext<'_>,
) -> Vec<Suggestion> {
    let mut completions = match hint.kind {
        HintKind::Enum => Vec::new(),
        HintKind::EnumWithSharedText => ctx.model.shared_text.iter().map(Suggestion::from).collect(),
        HintKind::Script => script_values(hint, node, ctx),
        HintKind::ComputerRef => computer_values(ctx, false),
        HintKind::ComputerOrDeviceRef => computer_values(ctx, true),
        HintKind::FileRef(class) => ctx
            .resources
            .relative_paths(ResourceClass::from(class))
            .into_iter()
            .map(|path| Suggestion::new(path, SuggestionKind::File).with_detail(ResourceClass::from(class).as_str()))
            .collect(),
        HintKind::Color => random_colors(),
        HintKind::PathRef => file_values(hint, ctx, false),
        HintKind::FolderRef => file_values(hint, ctx, true),
        HintKind::StepChain => {
            let (terminal, rest) = step::walk(hint, value);
            if terminal.kind != HintKind::StepChain {
                return complete_value(terminal, rest, node, ctx);
            }
            return literal_items(terminal);
        }
    };

    // Enum items first, then the dynamic list
    if hint.kind == HintKind::Enum || hint.kind == HintKind::EnumWithSharedText {
        let mut items = literal_items(hint);
        items.append(&mut completions);
        return items;
    }
    completions.extend(literal_items(hint));
    completions
}

fn literal_items(hint: &CodeHint) -> Vec<Suggestion> {
    hint.items
        .iter()
        .map(|item| {
            let mut suggestion = Suggestion::from(item);
            if item.kind.is_none() && hint.kind == HintKind::Enum {
                suggestion.kind = SuggestionKind::Enum;
            }
            suggestion
        })
        .collect()
}

fn script_values(hint: &CodeHint, node: Option<&Node>, ctx: &HintContext<'_>) -> Vec<Suggestion> {
    match ctx.scripts.evaluate(&hint.content, &ctx.script_input(node)) {
        Ok(values) => values
            .into_iter()
            .map(|v| {
                let suggestion = Suggestion::new(v.value, SuggestionKind::Value);
                match v.description {
                    Some(desc) => suggestion.with_detail(desc),
                    None => suggestion,
                }
            })
            .collect(),
        Err(e) => {
            warn!("script hint failed: {}", e);
            Vec::new()
        }
    }
}

fn computer_values(ctx: &HintContext<'_>, with_devices: bool) -> Vec<Suggestion> {
    let mut ids = ctx.resources.computer_ids();
    if with_devices {
        ids.extend(ctx.resources.device_ids());
    }
    ids.into_iter()
        .map(|named| {
            Suggestion::new(named.id, SuggestionKind::Reference)
                .with_detail(named.name)
                .with_documentation(&named.record.meta.relative_path)
        })
        .collect()
}

fn random_colors() -> Vec<Suggestion> {
    let mut rng = rand::rng();
    (0..RANDOM_COLORS)
        .map(|_| {
            let mut rgb = [0u8; 3];
            rng.fill(&mut rgb);
            let value = format!("{},{},{}", rgb[0], rgb[1], rgb[2]);
            Suggestion::new(value, SuggestionKind::Color)
                .with_detail("randomly generated colour")
                .with_priority(90)
        })
        .collect()
}

fn file_values(hint: &CodeHint, ctx: &HintContext<'_>, folders: bool) -> Vec<Suggestion> {
    let pattern = hint.content.trim();
    if pattern.is_empty() {
        return Vec::new();
    }
    let kind = if folders {
        SuggestionKind::Folder
    } else {
        SuggestionKind::File
    };
    let mut seen = HashSet::new();
    ctx.files
        .query(pattern, folders)
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .map(|path| Suggestion::new(path, kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::{HintItem, HintModel, TextHint};
    use crate::resources::ResourceIndex;
    use crate::script::ScriptRegistry;
    use crate::workspace::{FileQuery, NoFiles};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    struct FixedFiles(Vec<&'static str>);

    impl FileQuery for FixedFiles {
        fn query(&self, _pattern: &str, folders: bool) -> Vec<String> {
            let files: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
            if folders {
                crate::workspace::expand_folders(&files)
            } else {
                files
            }
        }
    }

    fn resources() -> ResourceIndex {
        let mut index = ResourceIndex::new(None);
        index.index_source(
            Path::new("core.xml"),
            r#"<Computer id="core" name="Core"><eosDevice id="phone" name="Phone"/></Computer>"#,
        );
        index.index_source(Path::new("themes/dark.xml"), "<CustomTheme></CustomTheme>");
        index
    }

    fn values(hint: &CodeHint, value: &str, files: &dyn FileQuery) -> Vec<String> {
        let mut model = HintModel::new();
        model.shared_text.push(TextHint {
            value: "#PLAYERNAME#".into(),
            kind: "Text".into(),
            ..TextHint::default()
        });
        let resources = resources();
        let scripts = ScriptRegistry::new();
        let ctx = HintContext::new(&model, &resources, files, &scripts);
        complete_value(hint, value, None, &ctx)
            .into_iter()
            .map(|s| s.insert_text)
            .collect()
    }

    fn items(values: &[&str]) -> Vec<HintItem> {
        values.iter().map(|v| HintItem::new(*v)).collect()
    }

    #[test]
    fn test_enum_and_shared_text() {
        let hint = CodeHint::new(HintKind::Enum).with_items(items(&["1", "2"]));
        assert_eq!(values(&hint, "", &NoFiles), vec!["1", "2"]);

        let hint = CodeHint::new(HintKind::EnumWithSharedText).with_items(items(&["x"]));
        assert_eq!(values(&hint, "", &NoFiles), vec!["x", "#PLAYERNAME#"]);
    }

    #[test]
    fn test_references() {
        let hint = CodeHint::new(HintKind::ComputerRef).with_items(items(&["#PLAYER#"]));
        assert_eq!(values(&hint, "", &NoFiles), vec!["core", "#PLAYER#"]);

        let hint = CodeHint::new(HintKind::ComputerOrDeviceRef);
        assert_eq!(values(&hint, "", &NoFiles), vec!["core", "phone"]);

        let hint = CodeHint::new(HintKind::FileRef(crate::hints::FileClass::Theme));
        assert_eq!(values(&hint, "", &NoFiles), vec!["themes/dark.xml"]);
    }

    #[test]
    fn test_script_values() {
        let hint = CodeHint::new(HintKind::Script).with_content("Computer.id");
        assert_eq!(values(&hint, "", &NoFiles), vec!["core"]);

        // A failing script degrades to the literal items
        let hint = CodeHint::new(HintKind::Script)
            .with_content("Nope.id")
            .with_items(items(&["fallback"]));
        assert_eq!(values(&hint, "", &NoFiles), vec!["fallback"]);
    }

    #[test]
    fn test_colors() {
        let hint = CodeHint::new(HintKind::Color).with_items(items(&["0,0,0"]));
        let found = values(&hint, "", &NoFiles);
        assert_eq!(found.len(), RANDOM_COLORS + 1);
        assert_eq!(found[RANDOM_COLORS], "0,0,0");
        for color in &found[..RANDOM_COLORS] {
            assert_eq!(color.split(',').count(), 3);
        }
    }

    #[test]
    fn test_paths_and_folders() {
        let files = FixedFiles(vec!["Music/a.ogg", "Music/Sub/b.ogg", "Music/a.ogg"]);
        let hint = CodeHint::new(HintKind::PathRef).with_content("**/*.ogg");
        assert_eq!(values(&hint, "", &files), vec!["Music/a.ogg", "Music/Sub/b.ogg"]);

        let hint = CodeHint::new(HintKind::FolderRef).with_content("**/*.ogg");
        assert_eq!(values(&hint, "", &files), vec!["Music", "./", "Music/Sub"]);
    }

    #[test]
    fn test_step_chain() {
        let next = CodeHint::new(HintKind::Enum).with_items(items(&["/a", "/b"]));
        let hint = CodeHint::new(HintKind::StepChain).with_items(vec![
            HintItem::new("GET ").with_next_step(next.clone()),
            HintItem::new("POST ").with_next_step(next),
        ]);
        assert_eq!(values(&hint, "GET /a", &NoFiles), vec!["/a", "/b"]);
        assert_eq!(values(&hint, "GET ", &NoFiles), vec!["GET ", "POST "]);
        assert_eq!(values(&hint, "", &NoFiles), vec!["GET ", "POST "]);
    }
}
