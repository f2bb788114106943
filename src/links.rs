//! Go to definition: resolving hinted values to workspace files

use crate::context::HintContext;
use crate::hints::{CodeHint, LinkRule};
use crate::parser::{parse_at_offset, CursorContext};
use crate::resources::{ResourceClass, ResourceIndex};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file a value links to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkTarget {
    pub file_path: PathBuf,
    pub relative_path: String,
}

/// Definition targets for the value under the cursor
pub fn definition(text: &str, offset: usize, ctx: &HintContext<'_>) -> Vec<LinkTarget> {
    let Some(active) = parse_at_offset(text, crate::hover::hover_offset(text, offset)) else {
        return Vec::new();
    };
    let node = active.node();
    let Some(def) = ctx.model.find(&node.node_path, ctx.relative_path) else {
        return Vec::new();
    };

    match active.context {
        CursorContext::Content => match &def.content_hint {
            Some(hint) if !node.content.is_empty() => {
                resolve_links(hint, &node.content, ctx.resources)
            }
            _ => Vec::new(),
        },
        CursorContext::Attribute => {
            let (Some(name), Some(value)) = (active.attribute(), &active.attribute_value) else {
                return Vec::new();
            };
            def.effective_attributes(node)
                .get(name)
                .map(|hint| resolve_links(hint, &value.value, ctx.resources))
                .unwrap_or_default()
        }
    }
}

/// Files that `value` refers to under the hint's link rules
///
/// The first rule whose value pattern matches (or that has none) is used.
pub fn resolve_links(hint: &CodeHint, value: &str, resources: &ResourceIndex) -> Vec<LinkTarget> {
    let mut lookup = value.trim().to_string();
    let rule = hint.link_rules.iter().find(|rule| {
        let Some(pattern) = &rule.value_pattern else {
            return true;
        };
        match Regex::new(pattern).ok().and_then(|re| last_capture(&re, value)) {
            Some(captured) => {
                lookup = captured;
                true
            }
            None => false,
        }
    });
    let Some(rule) = rule else {
        return Vec::new();
    };
    if let Some(value) = &rule.override_value {
        lookup = value.clone();
    }

    let values: Vec<String> = match rule.split_pattern.as_deref().map(Regex::new) {
        Some(Ok(split)) => split
            .split(&lookup)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Err(e)) => {
            debug!("invalid link split pattern: {}", e);
            vec![lookup]
        }
        None => vec![lookup],
    };

    let mut targets = Vec::new();
    for value in &values {
        for target in lookup_expression(rule, value, resources) {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }
    targets
}

fn last_capture(re: &Regex, value: &str) -> Option<String> {
    let captures = re.captures(value)?;
    captures
        .iter()
        .flatten()
        .last()
        .map(|m| m.as_str().to_string())
}

/// Alternatives are tried in order; the first one finding anything wins
fn lookup_expression(rule: &LinkRule, value: &str, resources: &ResourceIndex) -> Vec<LinkTarget> {
    for alternative in rule.target_expression.split('|').map(str::trim) {
        let found = lookup_alternative(alternative, value, rule.case_insensitive, resources);
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

fn lookup_alternative(
    expression: &str,
    value: &str,
    case_insensitive: bool,
    resources: &ResourceIndex,
) -> Vec<LinkTarget> {
    if expression == "path" {
        return path_target(value, resources.root()).into_iter().collect();
    }

    let mut parts = expression.split('.').filter(|p| !p.is_empty());
    let Some(class) = parts.next().and_then(ResourceClass::from_name) else {
        debug!("unknown link target {:?}", expression);
        return Vec::new();
    };
    let fields: Vec<&str> = parts.collect();
    if fields.is_empty() {
        return Vec::new();
    }
    let matcher = match RegexBuilder::new(&format!("^{}$", regex::escape(value)))
        .case_insensitive(case_insensitive)
        .build()
    {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    resources
        .records(class)
        .filter(|record| record.field_values(&fields).iter().any(|v| matcher.is_match(v)))
        .map(|record| LinkTarget {
            file_path: record.meta.file_path.clone(),
            relative_path: record.meta.relative_path.clone(),
        })
        .collect()
}

/// A workspace-relative path that exists on disk
fn path_target(value: &str, root: Option<&Path>) -> Option<LinkTarget> {
    let root = root?;
    let relative = value.trim().replace('\\', "/");
    let relative = relative.trim_start_matches('/');
    let file_path = root.join(relative);
    if !file_path.exists() {
        debug!("linked path {} does not exist", file_path.display());
        return None;
    }
    Some(LinkTarget {
        file_path,
        relative_path: relative.to_string(),
    })
}
