//! Validation of a parsed document against the hint model

use super::deps::DependencyKey;
use super::types::{Finding, Range};
use crate::completions::step;
use crate::context::HintContext;
use crate::hints::{CodeHint, HintKind, HINT_ROOT_TAG};
use crate::parser::{Document, Node, NodeId};
use crate::resources::ResourceClass;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::debug;

static COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+(?:\s*,\s*\d+){2,3}$").unwrap());

pub(crate) const SOURCE: &str = "hacknet";

/// An edge recorded while validating one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub key: DependencyKey,
    /// `nodePath>attribute` or `nodePath#content`
    pub locator: String,
}

/// Findings and dependency edges for one document
#[derive(Debug, Clone, Default)]
pub struct Validation {
    pub findings: Vec<Finding>,
    pub dependencies: Vec<Dependency>,
}

impl Validation {
    fn depend(&mut self, key: DependencyKey, locator: &str) {
        self.dependencies.push(Dependency {
            key,
            locator: locator.to_string(),
        });
    }

    /// Record the file a reference resolved to; returns whether it resolved
    fn depend_on_file(&mut self, file: Option<PathBuf>, locator: &str) -> bool {
        match file {
            Some(file) => {
                self.depend(DependencyKey::File(file), locator);
                true
            }
            None => false,
        }
    }
}

/// Validate every node of `doc` against the hint model
///
/// Hint definition files themselves are never validated.
pub fn validate_document(doc: &Document, ctx: &HintContext<'_>) -> Validation {
    let mut out = Validation::default();
    let Some(root) = doc.root_id() else {
        return out;
    };
    if doc.node(root).name == HINT_ROOT_TAG {
        return out;
    }
    validate_node(doc, root, ctx, &mut out);
    out
}

fn validate_node(doc: &Document, id: NodeId, ctx: &HintContext<'_>, out: &mut Validation) {
    let node = doc.node(id);
    let Some(def) = ctx.model.find(&node.node_path, ctx.relative_path) else {
        // Children of an unknown tag are not checked
        out.findings.push(
            Finding::hint(name_range(node), format!("unknown tag <{}>", node.name))
                .with_code("unknown-tag")
                .with_source(SOURCE),
        );
        return;
    };

    if let (Some(hint), Some(token)) = (&def.content_hint, &node.content_token) {
        if hint.severity.is_some() && !is_exempt(node) {
            let locator = format!("{}#content", node.node_path);
            if let Some(message) = check_value(hint, node.content.trim(), node, ctx, &locator, out) {
                out.findings.push(finding(hint, Range::from_span(token.line, token.col, &node.content), message));
            }
        }
    }

    let attributes = def.effective_attributes(node);
    for attribute in node.attributes.values() {
        let Some(hint) = attributes.get(attribute.name.as_str()) else {
            out.findings.push(
                Finding::hint(
                    Range::from_token(&attribute.name_token),
                    format!("unknown attribute {:?}", attribute.name),
                )
                .with_code("unknown-attribute")
                .with_source(SOURCE),
            );
            continue;
        };
        if hint.severity.is_none() {
            continue;
        }
        let locator = format!("{}>{}", node.node_path, attribute.name);
        if let Some(message) = check_value(hint, attribute.value.trim(), node, ctx, &locator, out) {
            let range = attribute
                .value_token
                .as_ref()
                .map(Range::from_token)
                .unwrap_or_else(|| Range::from_token(&attribute.name_token));
            out.findings.push(finding(hint, range, message));
        }
    }

    for &child in &node.children {
        validate_node(doc, child, ctx, out);
    }
}

fn finding(hint: &CodeHint, range: Range, message: String) -> Finding {
    let severity = hint.severity.unwrap_or(super::types::Severity::Hint);
    Finding::new(severity, range, message)
        .with_code("invalid-value")
        .with_source(SOURCE)
}

/// `<mission><nextMission>NONE</nextMission>` ends a mission chain
fn is_exempt(node: &Node) -> bool {
    node.node_path == "mission.nextMission" && node.content.trim().eq_ignore_ascii_case("none")
}

/// Range of a node's tag name, without the `<`
fn name_range(node: &Node) -> Range {
    let token = &node.name_token;
    Range::from_span(token.line, token.col + 1, &node.name)
}

/// Error message when `value` is not allowed by `hint`; records dependency edges
fn check_value(
    hint: &CodeHint,
    value: &str,
    node: &Node,
    ctx: &HintContext<'_>,
    locator: &str,
    out: &mut Validation,
) -> Option<String> {
    let valid = match hint.kind {
        HintKind::Enum => hint.items.iter().any(|item| item.value == value),
        HintKind::StepChain => step::has_known_prefix(hint, value),
        HintKind::EnumWithSharedText => true,
        HintKind::ComputerRef | HintKind::ComputerOrDeviceRef => {
            out.depend(DependencyKey::Class(ResourceClass::Computer), locator);
            let mut defined_in = ctx
                .resources
                .computer_ids()
                .into_iter()
                .find(|c| c.id == value)
                .map(|c| c.record.meta.file_path.clone());
            if defined_in.is_none() && hint.kind == HintKind::ComputerOrDeviceRef {
                defined_in = ctx
                    .resources
                    .device_ids()
                    .into_iter()
                    .find(|d| d.id == value)
                    .map(|d| d.record.meta.file_path.clone());
            }
            out.depend_on_file(defined_in, locator)
        }
        HintKind::FileRef(class) => {
            let class = ResourceClass::from(class);
            out.depend(DependencyKey::Class(class), locator);
            let value = value.replace('\\', "/");
            let defined_in = ctx
                .resources
                .records(class)
                .find(|r| r.meta.relative_path == value)
                .map(|r| r.meta.file_path.clone());
            out.depend_on_file(defined_in, locator)
        }
        HintKind::Script => {
            out.depend(DependencyKey::All, locator);
            match ctx.scripts.evaluate(&hint.content, &ctx.script_input(Some(node))) {
                Ok(values) => values.iter().any(|v| v.value == value),
                Err(e) => {
                    debug!("skipping script check at {}: {}", locator, e);
                    true
                }
            }
        }
        HintKind::Color => COLOR.is_match(value),
        HintKind::PathRef | HintKind::FolderRef => {
            out.depend(DependencyKey::All, locator);
            let folders = hint.kind == HintKind::FolderRef;
            let value = value.replace('\\', "/");
            ctx.files
                .query(hint.content.trim(), folders)
                .iter()
                .any(|path| *path == value)
        }
    };
    if valid {
        return None;
    }

    let message = match hint.kind {
        HintKind::Enum | HintKind::StepChain => {
            let values: Vec<&str> = hint.items.iter().map(|i| i.value.as_str()).collect();
            format!("invalid value {:?}, expected one of [{}]", value, values.join(","))
        }
        HintKind::ComputerRef => format!("no computer with id {:?} in the workspace", value),
        HintKind::ComputerOrDeviceRef => {
            format!("no computer or eOS device with id {:?} in the workspace", value)
        }
        HintKind::FileRef(class) => format!(
            "no {} file {:?} in the workspace",
            ResourceClass::from(class).as_str().to_ascii_lowercase(),
            value
        ),
        HintKind::Script => format!("{:?} is not among the computed values", value),
        HintKind::Color => format!("invalid colour {:?}, expected r,g,b or r,g,b,a", value),
        HintKind::PathRef | HintKind::FolderRef => format!("path {:?} not found in the workspace", value),
        HintKind::EnumWithSharedText => return None,
    };
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::hints::{build_model, parse_hint_source, HintModel};
    use crate::parser::parse;
    use crate::resources::ResourceIndex;
    use crate::script::ScriptRegistry;
    use crate::workspace::NoFiles;
    use std::path::Path;

    const HINTS: &str = r#"<HacknetEditorHint>
  <Node name="Computer">
    <Attribute name="id" />
    <Attribute name="type" diag="W">
      <Enums><Enum>1</Enum><Enum>2</Enum></Enums>
    </Attribute>
    <Attribute name="color" hint="color" diag="E" />
    <Attribute name="theme" hint="ThemeFile" diag="E" />
  </Node>
  <Node name="Computer.link">
    <Attribute name="target" hint="Computer" diag="E" />
  </Node>
  <Node name="mission" />
  <Node name="mission.nextMission">
    <Content hint="MissionFile" diag="W" />
  </Node>
</HacknetEditorHint>"#;

    fn model() -> HintModel {
        build_model(vec![parse_hint_source(HINTS, Path::new("hints.xml")).unwrap()])
    }

    fn run(text: &str) -> Validation {
        let model = model();
        let mut resources = ResourceIndex::new(None);
        resources.index_source(Path::new("Nodes/core.xml"), r#"<Computer id="core"/>"#);
        resources.index_source(Path::new("Missions/intro.xml"), "<mission/>");
        let scripts = ScriptRegistry::new();
        let ctx = HintContext::new(&model, &resources, &NoFiles, &scripts);
        validate_document(&parse(text).unwrap(), &ctx)
    }

    fn messages(validation: &Validation) -> Vec<(Severity, String)> {
        validation
            .findings
            .iter()
            .map(|f| (f.severity, f.code.clone().unwrap_or_default()))
            .collect()
    }

    #[test]
    fn test_valid_document() {
        let out = run(r#"<Computer id="x" type="2" color="10, 20,30"><link target="core"/></Computer>"#);
        assert!(out.findings.is_empty());
        let keys: Vec<_> = out.dependencies.iter().map(|d| d.key.clone()).collect();
        assert_eq!(
            keys,
            vec![
                DependencyKey::Class(ResourceClass::Computer),
                DependencyKey::File(PathBuf::from("Nodes/core.xml")),
            ]
        );
        assert!(out.dependencies.iter().all(|d| d.locator == "Computer.link>target"));
    }

    #[test]
    fn test_invalid_values() {
        let out = run(r#"<Computer type="3" color="red"><link target="nowhere"/></Computer>"#);
        assert_eq!(
            messages(&out),
            vec![
                (Severity::Warning, "invalid-value".to_string()),
                (Severity::Error, "invalid-value".to_string()),
                (Severity::Error, "invalid-value".to_string()),
            ]
        );
        assert_eq!(out.findings[0].message, "invalid value \"3\", expected one of [1,2]");
        // Range covers the quoted value
        assert_eq!(out.findings[0].range, Range::new(0, 15, 0, 18));
    }

    #[test]
    fn test_unknown_tags_and_attributes() {
        let out = run("<Computer foo=\"1\">\n  <Daemon><Port/></Daemon>\n</Computer>");
        assert_eq!(
            messages(&out),
            vec![
                (Severity::Hint, "unknown-attribute".to_string()),
                (Severity::Hint, "unknown-tag".to_string()),
            ]
        );
        // The tag name only, without `<`
        assert_eq!(out.findings[1].range, Range::new(1, 3, 1, 9));
    }

    #[test]
    fn test_file_refs_and_exemption() {
        let out = run("<mission><nextMission>None</nextMission></mission>");
        assert!(out.findings.is_empty());
        assert!(out.dependencies.is_empty());

        let out = run("<mission><nextMission>Missions/next.xml</nextMission></mission>");
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.dependencies.len(), 1);
        assert_eq!(out.dependencies[0].key, DependencyKey::Class(ResourceClass::Mission));
        assert_eq!(out.dependencies[0].locator, "mission.nextMission#content");

        let out = run("<mission><nextMission>Missions\\intro.xml</nextMission></mission>");
        assert!(out.findings.is_empty());
        assert_eq!(
            out.dependencies[1].key,
            DependencyKey::File(PathBuf::from("Missions/intro.xml"))
        );
    }

    #[test]
    fn test_hint_file_is_skipped() {
        let out = run(HINTS);
        assert!(out.findings.is_empty());
    }
}
