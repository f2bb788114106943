//! Load hint-definition XML files
//!
//! The root file (`Hacknet-EditorHint.xml` by default) may pull in further
//! files with `<Include path="..."/>`. Documents are collected depth-first,
//! the root first, and merged in that order.

use super::merge::build_model;
use super::pattern::{FileTrigger, ValuePattern};
use super::types::{
    CodeHint, ConditionalAttributeHint, HintItem, HintKind, HintModel, LinkRule, MergeRule,
    NodeHintDefinition, ScriptTextHints, TextHint,
};
use crate::diagnostics::Severity;
use crate::path::PathPattern;
use indexmap::IndexMap;
use roxmltree::Node as XmlNode;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Root element of a hint-definition file
pub const HINT_ROOT_TAG: &str = "HacknetEditorHint";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("hint file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Xml {
        path: PathBuf,
        source: roxmltree::Error,
    },

    #[error("{path}: root element must be <HacknetEditorHint>, found <{found}>")]
    WrongRoot { path: PathBuf, found: String },
}

/// The content of one hint-definition file, before merging
#[derive(Debug, Clone, Default)]
pub struct HintDocument {
    pub definitions: Vec<NodeHintDefinition>,
    pub includes: Vec<String>,
    pub replace_text: Vec<TextHint>,
    pub shared_text: Vec<TextHint>,
    pub hacker_scripts: Option<ScriptTextHints>,
    pub warnings: Vec<String>,
}

/// Parse a single hint-definition document without following includes
pub fn parse_hint_source(source: &str, path: &Path) -> Result<HintDocument, LoadError> {
    let doc = roxmltree::Document::parse(source).map_err(|e| LoadError::Xml {
        path: path.to_path_buf(),
        source: e,
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != HINT_ROOT_TAG {
        return Err(LoadError::WrongRoot {
            path: path.to_path_buf(),
            found: root.tag_name().name().to_string(),
        });
    }

    let mut out = HintDocument::default();
    for child in root.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "Node" => parse_node(child, &mut out),
            "Include" => {
                if let Some(include) = child.attribute("path") {
                    out.includes.push(include.to_string());
                }
            }
            "ReplaceTextHint" => out.replace_text.extend(parse_text_hints(child)),
            "CommonTextHint" => out.shared_text.extend(parse_text_hints(child)),
            "HackerScriptsHint" => {
                let mut hints = out.hacker_scripts.take().unwrap_or_default();
                if let Some(trigger) = child.attribute("fileTriggerPattern") {
                    hints.file_trigger = FileTrigger::new(trigger);
                    if !hints.file_trigger.is_valid() {
                        out.warnings
                            .push(format!("invalid fileTriggerPattern {:?}", trigger));
                    }
                }
                hints.items.extend(parse_text_hints(child));
                out.hacker_scripts = Some(hints);
            }
            other => debug!("ignoring <{}> in {}", other, path.display()),
        }
    }
    Ok(out)
}

/// Load the hint model rooted at `workspace_root/hint_file`
pub fn load_hint_model(workspace_root: &Path, hint_file: &str) -> Result<HintModel, LoadError> {
    let root_file = workspace_root.join(hint_file);
    if !root_file.is_file() {
        return Err(LoadError::NotFound(root_file));
    }

    let mut loader = Loader {
        workspace_root,
        active: Vec::new(),
        loaded: HashSet::new(),
        documents: Vec::new(),
        warnings: Vec::new(),
    };
    loader.collect(&root_file, true)?;
    let mut model = build_model(loader.documents);
    model.warnings.extend(loader.warnings);
    debug!(
        "loaded {} hint definitions from {}",
        model.definitions.len(),
        root_file.display()
    );
    Ok(model)
}

struct Loader<'a> {
    workspace_root: &'a Path,
    /// Files on the current include chain
    active: Vec<PathBuf>,
    /// Files already collected through any chain
    loaded: HashSet<PathBuf>,
    documents: Vec<HintDocument>,
    warnings: Vec<String>,
}

impl Loader<'_> {
    fn collect(&mut self, path: &Path, is_root: bool) -> Result<(), LoadError> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if self.active.contains(&key) {
            warn!("include cycle at {}, skipping", path.display());
            self.warnings
                .push(format!("include cycle at {}", path.display()));
            return Ok(());
        }
        if !self.loaded.insert(key.clone()) {
            debug!("{} already included", path.display());
            return Ok(());
        }

        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) if is_root => {
                return Err(LoadError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
            Err(e) => {
                warn!("cannot read included hint file {}: {}", path.display(), e);
                return Ok(());
            }
        };

        let document = match parse_hint_source(&source, path) {
            Ok(document) => document,
            Err(e) if is_root => return Err(e),
            Err(e) => {
                warn!("skipping included hint file: {}", e);
                return Ok(());
            }
        };

        let includes = document.includes.clone();
        self.documents.push(document);
        self.active.push(key);
        for include in includes {
            let include_path = self.workspace_root.join(include.trim_start_matches(['/', '\\']));
            self.collect(&include_path, false)?;
        }
        self.active.pop();
        Ok(())
    }
}

fn parse_node(el: XmlNode, out: &mut HintDocument) {
    if !bool_attr(el, "enable", true) {
        return;
    }
    let Some(names) = el.attribute("name") else {
        out.warnings.push("<Node> without a name attribute".to_string());
        return;
    };

    for name in names.split('|').map(str::trim).filter(|n| !n.is_empty()) {
        let pattern = match PathPattern::parse(name) {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!("skipping hint definition: {}", e);
                out.warnings.push(e.to_string());
                continue;
            }
        };

        let mut def = NodeHintDefinition::new(pattern);
        def.description = el.attribute("desc").unwrap_or_default().to_string();
        def.allow_multiple = bool_attr(el, "multi", true);
        def.file_trigger = el.attribute("fileTriggerPattern").map(FileTrigger::new);
        if def.file_trigger.as_ref().is_some_and(|t| !t.is_valid()) {
            out.warnings
                .push(format!("{}: invalid fileTriggerPattern", def.node_path));
        }

        for child in el.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "Attribute" => {
                    if let Some((name, hint)) = parse_attribute(child) {
                        def.attribute_hints.insert(name, hint);
                    }
                }
                "ConditionAttributes" => {
                    if let Some(conditional) = parse_conditional(child, &mut out.warnings) {
                        def.conditional_hints.push(conditional);
                    }
                }
                "Content" => {
                    // The last <Content> wins
                    def.content_hint = Some(parse_code_hint(child).required());
                }
                _ => {}
            }
        }
        out.definitions.push(def);
    }
}

fn parse_attribute(el: XmlNode) -> Option<(String, CodeHint)> {
    let name = el.attribute("name")?;
    Some((name.to_string(), parse_code_hint(el)))
}

fn parse_conditional(el: XmlNode, warnings: &mut Vec<String>) -> Option<ConditionalAttributeHint> {
    let trigger_attr = el.attribute("attr")?.to_string();
    let match_regex = ValuePattern::new(el.attribute("match").unwrap_or_default());
    if !match_regex.is_valid() {
        warnings.push(format!("invalid match pattern {:?}", match_regex.as_str()));
    }

    let attributes: IndexMap<String, CodeHint> = el
        .children()
        .filter(|n| n.has_tag_name("Attribute"))
        .filter_map(parse_attribute)
        .collect();

    Some(ConditionalAttributeHint {
        trigger_attr,
        match_regex,
        attributes,
        merge_rule: MergeRule::from_keyword(el.attribute("repeatRule").unwrap_or_default()),
    })
}

/// Build a hint from an `Attribute`, `Content` or `Next` element
pub(crate) fn parse_code_hint(el: XmlNode) -> CodeHint {
    let kind = HintKind::from_keyword(el.attribute("hint").unwrap_or("enum"));
    let mut hint = CodeHint {
        kind,
        content: direct_text(el),
        items: Vec::new(),
        required: bool_attr(el, "required", false),
        description: el.attribute("desc").unwrap_or_default().to_string(),
        default_value: el.attribute("default").unwrap_or_default().to_string(),
        link_rules: parse_link_rules(el),
        severity: el.attribute("diag").map(Severity::from_keyword),
        merge_rule: MergeRule::from_keyword(el.attribute("repeatRule").unwrap_or_default()),
    };

    if kind == HintKind::StepChain {
        hint.items = parse_steps(el);
    } else {
        for enums in el.children().filter(|n| n.has_tag_name("Enums")) {
            let default_kind = enums.attribute("kind").unwrap_or("enum");
            hint.items.extend(
                enums
                    .children()
                    .filter(|n| n.has_tag_name("Enum"))
                    .map(|item| HintItem {
                        value: direct_text(item),
                        description: item.attribute("desc").unwrap_or_default().to_string(),
                        filter_text: item.attribute("filterText").map(str::to_string),
                        label: item.attribute("label").map(str::to_string),
                        kind: Some(item.attribute("kind").unwrap_or(default_kind).to_string()),
                        next_step: None,
                    }),
            );
        }
    }
    hint
}

fn parse_steps(el: XmlNode) -> Vec<HintItem> {
    el.children()
        .filter(|n| n.has_tag_name("Step"))
        .map(|step| HintItem {
            value: step.attribute("value").unwrap_or_default().to_string(),
            description: step.attribute("desc").unwrap_or_default().to_string(),
            filter_text: step.attribute("filterText").map(str::to_string),
            label: step.attribute("label").map(str::to_string),
            kind: step.attribute("kind").map(str::to_string),
            next_step: step
                .children()
                .find(|n| n.has_tag_name("Next"))
                .map(|next| Box::new(parse_code_hint(next))),
        })
        .collect()
}

fn parse_link_rules(el: XmlNode) -> Vec<LinkRule> {
    let mut rules = Vec::new();
    if let Some(link_by) = el.attribute("linkBy") {
        rules.push(LinkRule::new(link_by));
    }
    for collection in el.children().filter(|n| n.has_tag_name("LinkByCollection")) {
        for item in collection.children().filter(|n| n.has_tag_name("Item")) {
            rules.push(LinkRule {
                target_expression: item.attribute("linkBy").unwrap_or_default().to_string(),
                value_pattern: item.attribute("linkByValuePattern").map(str::to_string),
                case_insensitive: bool_attr(item, "ignoreCase", false),
                override_value: item.attribute("overrideValue").map(str::to_string),
                split_pattern: item.attribute("split").map(str::to_string),
            });
        }
    }
    rules
}

fn parse_text_hints(el: XmlNode) -> Vec<TextHint> {
    el.children()
        .filter(|n| n.has_tag_name("Text"))
        .map(|text| TextHint {
            value: text.attribute("value").unwrap_or_default().to_string(),
            description: text.attribute("desc").unwrap_or_default().to_string(),
            filter_text: text.attribute("filterText").map(str::to_string),
            kind: text.attribute("kind").unwrap_or("Text").to_string(),
            label: text.attribute("label").map(str::to_string),
            documentation: text.attribute("doc").map(str::to_string),
        })
        .collect()
}

/// Text directly inside `el`, ignoring child elements
fn direct_text(el: XmlNode) -> String {
    el.children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn bool_attr(el: XmlNode, name: &str, default: bool) -> bool {
    match el.attribute(name) {
        Some(v) => v.trim().eq_ignore_ascii_case("true"),
        None => default,
    }
}
