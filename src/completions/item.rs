//! Suggestion type returned by completion

use crate::hints::{HintItem, TextHint};
use serde::{Deserialize, Serialize};

/// The kind of a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Element,
    Attribute,
    Value,
    Enum,
    Reference,
    File,
    Folder,
    Color,
    Text,
    Snippet,
    Keyword,
    Function,
    Constant,
    Variable,
}

impl SuggestionKind {
    /// Kind from a name used in hint files (`kind="Reference"`); unknown names mean `Value`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "element" => SuggestionKind::Element,
            "attribute" | "property" => SuggestionKind::Attribute,
            "enum" | "enummember" => SuggestionKind::Enum,
            "reference" => SuggestionKind::Reference,
            "file" => SuggestionKind::File,
            "folder" => SuggestionKind::Folder,
            "color" => SuggestionKind::Color,
            "text" => SuggestionKind::Text,
            "snippet" => SuggestionKind::Snippet,
            "keyword" => SuggestionKind::Keyword,
            "function" | "method" => SuggestionKind::Function,
            "constant" => SuggestionKind::Constant,
            "variable" => SuggestionKind::Variable,
            _ => SuggestionKind::Value,
        }
    }
}

/// A completion suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Display text
    pub label: String,
    pub kind: SuggestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Text to insert (may differ from label)
    pub insert_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_text: Option<String>,
    /// `insert_text` uses `${1:placeholder}` snippet syntax
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_snippet: bool,
    /// Lower = higher priority
    pub sort_priority: u32,
}

impl Suggestion {
    pub fn new(label: impl Into<String>, kind: SuggestionKind) -> Self {
        let label = label.into();
        Self {
            insert_text: label.clone(),
            label,
            kind,
            detail: None,
            documentation: None,
            filter_text: None,
            is_snippet: false,
            sort_priority: 100,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        if !detail.is_empty() {
            self.detail = Some(detail);
        }
        self
    }

    pub fn with_documentation(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }

    pub fn with_insert_text(mut self, text: impl Into<String>) -> Self {
        self.insert_text = text.into();
        self
    }

    pub fn with_filter_text(mut self, text: impl Into<String>) -> Self {
        self.filter_text = Some(text.into());
        self
    }

    /// Mark `insert_text` as a snippet
    pub fn as_snippet(mut self) -> Self {
        self.is_snippet = true;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.sort_priority = priority;
        self
    }
}

impl From<&HintItem> for Suggestion {
    fn from(item: &HintItem) -> Self {
        let kind = item
            .kind
            .as_deref()
            .map(SuggestionKind::from_name)
            .unwrap_or(SuggestionKind::Value);
        let mut suggestion = Suggestion::new(item.label.as_deref().unwrap_or(&item.value), kind)
            .with_insert_text(&item.value)
            .with_detail(&item.description);
        suggestion.filter_text = item.filter_text.clone();
        suggestion
    }
}

impl From<&TextHint> for Suggestion {
    fn from(text: &TextHint) -> Self {
        let mut suggestion = Suggestion::new(
            text.label.as_deref().unwrap_or(&text.value),
            SuggestionKind::from_name(&text.kind),
        )
        .with_insert_text(&text.value)
        .with_detail(&text.description);
        suggestion.filter_text = text.filter_text.clone();
        suggestion.documentation = text.documentation.clone();
        suggestion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hint_item() {
        let mut item = HintItem::new("1").with_description("Corporate");
        item.kind = Some("Constant".into());
        item.label = Some("1 (corp)".into());
        let suggestion = Suggestion::from(&item);
        assert_eq!(suggestion.label, "1 (corp)");
        assert_eq!(suggestion.insert_text, "1");
        assert_eq!(suggestion.kind, SuggestionKind::Constant);
        assert_eq!(suggestion.detail.as_deref(), Some("Corporate"));
    }

    #[test]
    fn test_empty_detail_is_dropped() {
        let suggestion = Suggestion::new("x", SuggestionKind::Value).with_detail("");
        assert!(suggestion.detail.is_none());
        assert_eq!(SuggestionKind::from_name("whatever"), SuggestionKind::Value);
    }
}
