//! Workspace-wide checks for computer definitions

use super::deps::DependencyKey;
use super::types::{Finding, Range};
use super::validate::{Dependency, Validation, SOURCE};
use crate::parser::{Attribute, Document};
use crate::resources::{ResourceClass, ResourceIndex};
use std::path::Path;

const ID_LOCATOR: &str = "Computer>id";
const IP_LOCATOR: &str = "Computer>ip";

/// Report a computer whose id or ip is already used by another file
///
/// Only documents rooted at `<Computer>` are checked. Both checks depend on
/// every computer file in the workspace.
pub fn check_computer(doc: &Document, file: &Path, resources: &ResourceIndex, out: &mut Validation) {
    let Some(root) = doc.root() else {
        return;
    };
    if root.name != "Computer" {
        return;
    }

    let others: Vec<_> = resources
        .records(ResourceClass::Computer)
        .filter(|record| record.meta.file_path != file)
        .collect();

    if let Some(id) = root.attributes.get("id") {
        out.dependencies.push(Dependency {
            key: DependencyKey::Class(ResourceClass::Computer),
            locator: ID_LOCATOR.to_string(),
        });
        let value = id.value.trim();
        if let Some(other) = others.iter().find(|r| !value.is_empty() && r.id() == Some(value)) {
            out.findings.push(
                Finding::error(
                    value_range(id),
                    format!("id重复: {:?} is also defined in {}", value, other.meta.relative_path),
                )
                .with_code("duplicate-id")
                .with_source(SOURCE),
            );
        }
    }

    if let Some(ip) = root.attributes.get("ip") {
        out.dependencies.push(Dependency {
            key: DependencyKey::Class(ResourceClass::Computer),
            locator: IP_LOCATOR.to_string(),
        });
        let value = ip.value.trim();
        if let Some(other) = others
            .iter()
            .find(|r| !value.is_empty() && r.attribute("ip").map(str::trim) == Some(value))
        {
            out.findings.push(
                Finding::warning(
                    value_range(ip),
                    format!("ip {} is also used by {}", value, other.meta.relative_path),
                )
                .with_code("duplicate-ip")
                .with_source(SOURCE),
            );
        }
    }
}

fn value_range(attribute: &Attribute) -> Range {
    attribute
        .value_token
        .as_ref()
        .map(Range::from_token)
        .unwrap_or_else(|| Range::from_token(&attribute.name_token))
}
