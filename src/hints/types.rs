//! Hint model types

use crate::diagnostics::Severity;
use crate::parser::Node;
use super::pattern::{FileTrigger, ValuePattern};
use crate::path::PathPattern;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Resource files a `FileRef` hint can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileClass {
    Action,
    Theme,
    Mission,
    Faction,
    Person,
}

/// How a hint produces and validates values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HintKind {
    #[default]
    Enum,
    /// Enum items plus the shared text list
    EnumWithSharedText,
    /// Values computed by a script evaluator
    Script,
    ComputerRef,
    /// Computer ids and eOS device ids
    ComputerOrDeviceRef,
    FileRef(FileClass),
    Color,
    PathRef,
    FolderRef,
    StepChain,
}

impl HintKind {
    /// Parse a `hint` keyword, case-insensitively; unknown keywords mean `Enum`
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "enumwithcommonstring" | "enumwithsharedtext" => HintKind::EnumWithSharedText,
            "js" | "javascript" | "script" => HintKind::Script,
            "computer" => HintKind::ComputerRef,
            "computeroreos" => HintKind::ComputerOrDeviceRef,
            "actionfile" => HintKind::FileRef(FileClass::Action),
            "themefile" => HintKind::FileRef(FileClass::Theme),
            "misisonfile" | "missionfile" => HintKind::FileRef(FileClass::Mission),
            "factionfile" => HintKind::FileRef(FileClass::Faction),
            "peoplefile" | "personfile" => HintKind::FileRef(FileClass::Person),
            "color" | "colour" => HintKind::Color,
            "path" => HintKind::PathRef,
            "folder" => HintKind::FolderRef,
            "step" => HintKind::StepChain,
            _ => HintKind::Enum,
        }
    }
}

/// How an incoming definition combines with an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MergeRule {
    #[default]
    OverrideOrAppend,
    Remove,
    OverrideOrAppendItem,
    RemoveItem,
}

impl MergeRule {
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "remove" => MergeRule::Remove,
            "overrideitem" => MergeRule::OverrideOrAppendItem,
            "removeitem" => MergeRule::RemoveItem,
            _ => MergeRule::OverrideOrAppend,
        }
    }
}

/// A literal value offered by a hint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HintItem {
    pub value: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Completion item kind name, e.g. `Text` or `Reference`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Hint covering the remainder of a step chain value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<Box<CodeHint>>,
}

impl HintItem {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_next_step(mut self, next: CodeHint) -> Self {
        self.next_step = Some(Box::new(next));
        self
    }
}

/// Maps a value to the workspace file that defines it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkRule {
    /// `Class.attr`, `Class.child.attr`, `Class.*` or `path`; alternatives joined by `|`
    pub target_expression: String,
    /// Regex; the last capture group becomes the lookup value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_pattern: Option<String>,
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_value: Option<String>,
    /// Regex splitting the value into several lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_pattern: Option<String>,
}

impl LinkRule {
    pub fn new(target_expression: impl Into<String>) -> Self {
        Self {
            target_expression: target_expression.into(),
            ..Self::default()
        }
    }
}

/// Completion and validation rules for one attribute or element content
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CodeHint {
    pub kind: HintKind,
    /// Element text: a script for `Script`, a glob for `PathRef`/`FolderRef`
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub items: Vec<HintItem>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    /// Placeholder used in generated snippets
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub link_rules: Vec<LinkRule>,
    /// Values are only validated when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub merge_rule: MergeRule,
}

impl CodeHint {
    pub fn new(kind: HintKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_items(mut self, items: Vec<HintItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_merge_rule(mut self, rule: MergeRule) -> Self {
        self.merge_rule = rule;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Item whose value equals `value`
    pub fn item(&self, value: &str) -> Option<&HintItem> {
        self.items.iter().find(|i| i.value == value)
    }
}

/// Attributes that apply only while another attribute matches a regex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalAttributeHint {
    pub trigger_attr: String,
    pub match_regex: ValuePattern,
    pub attributes: IndexMap<String, CodeHint>,
    #[serde(default)]
    pub merge_rule: MergeRule,
}

impl ConditionalAttributeHint {
    /// Whether the node's trigger attribute currently matches
    pub fn is_triggered_by(&self, node: &Node) -> bool {
        node.attribute(&self.trigger_attr)
            .is_some_and(|value| self.match_regex.is_match(value))
    }
}

/// Everything known about one tag path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeHintDefinition {
    /// Tag name (last path segment)
    pub name: String,
    pub node_path: String,
    pub pattern: PathPattern,
    pub depth: usize,
    #[serde(default)]
    pub description: String,
    pub attribute_hints: IndexMap<String, CodeHint>,
    #[serde(default)]
    pub conditional_hints: Vec<ConditionalAttributeHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hint: Option<CodeHint>,
    pub allow_multiple: bool,
    pub enabled: bool,
    /// Glob restricting the definition to matching workspace-relative files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_trigger: Option<FileTrigger>,
    #[serde(default)]
    pub snippet: String,
}

impl NodeHintDefinition {
    pub fn new(pattern: PathPattern) -> Self {
        Self {
            name: pattern.name().to_string(),
            node_path: pattern.as_str().to_string(),
            depth: pattern.depth(),
            pattern,
            description: String::new(),
            attribute_hints: IndexMap::new(),
            conditional_hints: Vec::new(),
            content_hint: None,
            allow_multiple: true,
            enabled: true,
            file_trigger: None,
            snippet: String::new(),
        }
    }

    /// Whether this definition applies to a document at `relative_path`
    pub fn applies_to(&self, relative_path: Option<&str>) -> bool {
        match (&self.file_trigger, relative_path) {
            (Some(trigger), Some(path)) => trigger.is_match(path),
            _ => true,
        }
    }

    /// Base attribute hints extended by every triggered conditional hint
    pub fn effective_attributes<'a>(&'a self, node: &Node) -> IndexMap<&'a str, &'a CodeHint> {
        let mut effective: IndexMap<&str, &CodeHint> = self
            .attribute_hints
            .iter()
            .map(|(name, hint)| (name.as_str(), hint))
            .collect();
        for conditional in &self.conditional_hints {
            if conditional.is_triggered_by(node) {
                for (name, hint) in &conditional.attributes {
                    effective.insert(name.as_str(), hint);
                }
            }
        }
        effective
    }
}

/// A literal text snippet from `ReplaceTextHint`, `CommonTextHint` or `HackerScriptsHint`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextHint {
    pub value: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_text: Option<String>,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// Hacker script lines, offered only in matching files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTextHints {
    pub file_trigger: FileTrigger,
    pub items: Vec<TextHint>,
}

impl Default for ScriptTextHints {
    fn default() -> Self {
        Self {
            file_trigger: FileTrigger::new("**/*.txt"),
            items: Vec::new(),
        }
    }
}

/// The merged hint model for a workspace
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HintModel {
    pub definitions: Vec<NodeHintDefinition>,
    #[serde(default)]
    pub replace_text: Vec<TextHint>,
    #[serde(default)]
    pub shared_text: Vec<TextHint>,
    #[serde(default)]
    pub hacker_scripts: ScriptTextHints,
    /// Problems found while loading, e.g. invalid path patterns
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl HintModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Definition for a concrete node path; exact paths win over wildcard patterns
    pub fn find(&self, node_path: &str, relative_path: Option<&str>) -> Option<&NodeHintDefinition> {
        let applicable = || {
            self.definitions
                .iter()
                .filter(move |d| d.enabled && d.applies_to(relative_path))
        };
        applicable()
            .find(|d| d.node_path == node_path)
            .or_else(|| applicable().find(|d| d.pattern.matches(node_path)))
    }

    /// Definitions for top-level tags
    pub fn roots(&self, relative_path: Option<&str>) -> Vec<&NodeHintDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.enabled && d.depth == 1 && !d.pattern.has_wildcard())
            .filter(|d| d.applies_to(relative_path))
            .collect()
    }

    /// Definitions for tags that can appear directly under `parent_path`
    pub fn children_of(
        &self,
        parent_path: &str,
        parent_depth: usize,
        relative_path: Option<&str>,
    ) -> Vec<&NodeHintDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.enabled && d.depth == parent_depth + 1 && !d.pattern.has_wildcard())
            .filter(|d| crate::path::is_direct_parent(parent_path, &d.node_path))
            .filter(|d| d.applies_to(relative_path))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
