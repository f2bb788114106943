//! Plain text completions: replace-text tokens and hacker script lines

use super::item::Suggestion;
use crate::hints::HintModel;

/// `ReplaceTextHint` items when the character before `offset` is `#`
///
/// The `#` is already typed, so a leading `#` is dropped from the insert text.
pub fn complete_replace_text(model: &HintModel, text: &str, offset: usize) -> Option<Vec<Suggestion>> {
    if model.replace_text.is_empty() || !text.get(..offset)?.ends_with('#') {
        return None;
    }
    Some(
        model
            .replace_text
            .iter()
            .map(|hint| {
                let suggestion = Suggestion::from(hint);
                let insert = suggestion
                    .insert_text
                    .strip_prefix('#')
                    .map(str::to_string)
                    .unwrap_or_else(|| suggestion.insert_text.clone());
                suggestion.with_insert_text(insert)
            })
            .collect(),
    )
}

/// Hacker script items for a script file, when only whitespace precedes the cursor on its line
pub fn complete_hacker_script(
    model: &HintModel,
    text: &str,
    offset: usize,
    relative_path: Option<&str>,
) -> Option<Vec<Suggestion>> {
    let path = relative_path?;
    if !is_hacker_script(model, path) {
        return None;
    }
    let before = text.get(..offset)?;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    if !before[line_start..].trim().is_empty() {
        return Some(Vec::new());
    }
    Some(
        model
            .hacker_scripts
            .items
            .iter()
            .map(|hint| Suggestion::from(hint).as_snippet())
            .collect(),
    )
}

/// Whether a workspace-relative path is a hacker script file
pub fn is_hacker_script(model: &HintModel, relative_path: &str) -> bool {
    model.hacker_scripts.file_trigger.is_match(relative_path)
}
