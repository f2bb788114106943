//! Index of Hacknet resource files
//!
//! Every indexed XML file is classified by its root tag. The index keeps, per
//! file path, the metadata (absolute path, workspace-relative path, class) next
//! to the root element's attributes and first-level children.

use crate::hints::FileClass;
use crate::parser::{parse, Document};
use crate::workspace::relative_path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Kind of resource a file defines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceClass {
    Computer,
    Mission,
    Action,
    Theme,
    Faction,
    People,
}

impl ResourceClass {
    pub const ALL: [ResourceClass; 6] = [
        ResourceClass::Computer,
        ResourceClass::Mission,
        ResourceClass::Action,
        ResourceClass::Theme,
        ResourceClass::Faction,
        ResourceClass::People,
    ];

    /// Class of a document from its root element name
    pub fn from_root_tag(tag: &str) -> Option<Self> {
        match tag {
            "Computer" => Some(ResourceClass::Computer),
            "mission" => Some(ResourceClass::Mission),
            "ConditionalActions" => Some(ResourceClass::Action),
            "CustomTheme" => Some(ResourceClass::Theme),
            "CustomFaction" => Some(ResourceClass::Faction),
            "Person" => Some(ResourceClass::People),
            _ => None,
        }
    }

    /// Class named in a script or link expression, e.g. `Computer` in `Computer.id`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "computer" => Some(ResourceClass::Computer),
            "mission" => Some(ResourceClass::Mission),
            "action" => Some(ResourceClass::Action),
            "theme" => Some(ResourceClass::Theme),
            "faction" => Some(ResourceClass::Faction),
            "people" | "person" => Some(ResourceClass::People),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Computer => "Computer",
            ResourceClass::Mission => "Mission",
            ResourceClass::Action => "Action",
            ResourceClass::Theme => "Theme",
            ResourceClass::Faction => "Faction",
            ResourceClass::People => "People",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FileClass> for ResourceClass {
    fn from(class: FileClass) -> Self {
        match class {
            FileClass::Action => ResourceClass::Action,
            FileClass::Theme => ResourceClass::Theme,
            FileClass::Mission => ResourceClass::Mission,
            FileClass::Faction => ResourceClass::Faction,
            FileClass::Person => ResourceClass::People,
        }
    }
}

/// Where a resource came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMeta {
    pub file_path: PathBuf,
    /// Relative to the workspace root, `/`-separated
    pub relative_path: String,
    pub class: ResourceClass,
}

/// A first-level child element of a resource, e.g. an `eosDevice`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChild {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    #[serde(default)]
    pub content: String,
}

/// One indexed resource file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub meta: ResourceMeta,
    /// Root element attributes
    pub attributes: IndexMap<String, String>,
    pub children: Vec<RecordChild>,
}

impl ResourceRecord {
    fn from_document(meta: ResourceMeta, doc: &Document) -> Option<Self> {
        let root_id = doc.root_id()?;
        let root = doc.node(root_id);
        let attributes = root
            .attributes
            .values()
            .map(|a| (a.name.clone(), a.value.clone()))
            .collect();
        let children = doc
            .children(root_id)
            .map(|child| RecordChild {
                name: child.name.clone(),
                attributes: child
                    .attributes
                    .values()
                    .map(|a| (a.name.clone(), a.value.clone()))
                    .collect(),
                content: child.content.trim().to_string(),
            })
            .collect();
        Some(Self {
            meta,
            attributes,
            children,
        })
    }

    pub fn class(&self) -> ResourceClass {
        self.meta.class
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn name(&self) -> Option<&str> {
        self.attribute("name")
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Children with the given element name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RecordChild> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Values reached by a field path
    ///
    /// `["id"]` reads a root attribute, `["eosDevice", "id"]` an attribute of
    /// every `eosDevice` child, `["*"]` every root attribute and `["path"]` the
    /// relative file path.
    pub fn field_values(&self, fields: &[&str]) -> Vec<&str> {
        match fields {
            ["path"] => vec![self.meta.relative_path.as_str()],
            ["*"] => self.attributes.values().map(String::as_str).collect(),
            [attr] => self.attribute(attr).into_iter().collect(),
            [child, "*"] => self
                .children
                .iter()
                .filter(|c| c.name == *child)
                .flat_map(|c| c.attributes.values().map(String::as_str))
                .collect(),
            [child, attr] => self
                .children
                .iter()
                .filter(|c| c.name == *child)
                .filter_map(|c| c.attributes.get(*attr).map(String::as_str))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A referencable id with a human-readable name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedId<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub record: &'a ResourceRecord,
}

/// All indexed resources of a workspace, keyed by absolute file path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIndex {
    root: Option<PathBuf>,
    records: BTreeMap<PathBuf, ResourceRecord>,
}

impl ResourceIndex {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            records: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Index (or re-index) one file from its text; returns its class
    ///
    /// Files that fail to parse or have an unknown root tag are dropped from
    /// the index.
    pub fn index_source(&mut self, path: &Path, text: &str) -> Option<ResourceClass> {
        self.records.remove(path);
        let doc = match parse(text) {
            Ok(doc) => doc,
            Err(e) => {
                debug!("not indexing {}: {}", path.display(), e);
                return None;
            }
        };
        let class = ResourceClass::from_root_tag(&doc.root()?.name)?;
        let relative = self
            .root
            .as_deref()
            .and_then(|root| relative_path(root, path))
            .unwrap_or_else(|| path.to_string_lossy().replace('\\', "/"));
        let meta = ResourceMeta {
            file_path: path.to_path_buf(),
            relative_path: relative,
            class,
        };
        let record = ResourceRecord::from_document(meta, &doc)?;
        self.records.insert(path.to_path_buf(), record);
        Some(class)
    }

    /// Read and index a file from disk
    pub fn index_file(&mut self, path: &Path) -> std::io::Result<Option<ResourceClass>> {
        let text = fs::read_to_string(path)?;
        Ok(self.index_source(path, &text))
    }

    /// Index every `.xml` file under the root; returns the number of resources found
    pub fn index_directory(&mut self) -> usize {
        let Some(root) = self.root.clone() else {
            return 0;
        };
        let mut count = 0;
        for entry in WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| is_xml(e.path()))
        {
            match self.index_file(entry.path()) {
                Ok(Some(_)) => count += 1,
                Ok(None) => {}
                Err(e) => debug!("cannot read {}: {}", entry.path().display(), e),
            }
        }
        count
    }

    pub fn remove_file(&mut self, path: &Path) -> Option<ResourceRecord> {
        self.records.remove(path)
    }

    pub fn get(&self, path: &Path) -> Option<&ResourceRecord> {
        self.records.get(path)
    }

    pub fn class_of(&self, path: &Path) -> Option<ResourceClass> {
        self.records.get(path).map(|r| r.meta.class)
    }

    pub fn records(&self, class: ResourceClass) -> impl Iterator<Item = &ResourceRecord> {
        self.records.values().filter(move |r| r.meta.class == class)
    }

    pub fn all(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.records.values()
    }

    /// Every computer id with its display name
    pub fn computer_ids(&self) -> Vec<NamedId<'_>> {
        self.records(ResourceClass::Computer)
            .filter_map(|r| {
                Some(NamedId {
                    id: r.id()?,
                    name: r.name().unwrap_or_default(),
                    record: r,
                })
            })
            .collect()
    }

    /// Every eOS device id declared inside a computer
    pub fn device_ids(&self) -> Vec<NamedId<'_>> {
        self.records(ResourceClass::Computer)
            .flat_map(|r| {
                r.children_named("eosDevice").filter_map(move |device| {
                    Some(NamedId {
                        id: device.attributes.get("id")?.as_str(),
                        name: device.attributes.get("name").map(String::as_str).unwrap_or_default(),
                        record: r,
                    })
                })
            })
            .collect()
    }

    /// Relative paths of all files of a class
    pub fn relative_paths(&self, class: ResourceClass) -> Vec<&str> {
        self.records(class)
            .map(|r| r.meta.relative_path.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub(crate) fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
}
