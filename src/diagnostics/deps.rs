//! Dependency graph between diagnosed values and the resources they consult

use crate::resources::ResourceClass;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};

/// What a diagnosed value depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DependencyKey {
    /// Any change in the workspace
    All,
    /// Any file of one resource class
    Class(ResourceClass),
    /// One specific file
    File(PathBuf),
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKey::All => f.write_str("ALL"),
            DependencyKey::Class(class) => f.write_str(&class.as_str().to_ascii_uppercase()),
            DependencyKey::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A diagnosed value: `file|locator`, e.g. `foo.xml|Computer.Daemon>startupCommand`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    pub file: PathBuf,
    pub locator: String,
}

impl ResourceId {
    pub fn new(file: impl Into<PathBuf>, locator: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            locator: locator.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.file.display(), self.locator)
    }
}

/// Map from a resource to the values that must be re-diagnosed when it changes
///
/// The graph also remembers the class each diagnosed file had, so a file that
/// has since been deleted still reaches the values depending on its class.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: HashMap<DependencyKey, HashSet<ResourceId>>,
    classes: HashMap<PathBuf, ResourceClass>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: DependencyKey, id: ResourceId) {
        self.edges.entry(key).or_default().insert(id);
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.edges.clear();
        self.classes.clear();
    }

    /// Forget the edges recorded while diagnosing `file`, and its class
    pub fn remove_file(&mut self, file: &Path) {
        self.edges.retain(|_, ids| {
            ids.retain(|id| id.file != file);
            !ids.is_empty()
        });
        self.classes.remove(file);
    }

    pub fn set_class(&mut self, file: &Path, class: ResourceClass) {
        self.classes.insert(file.to_path_buf(), class);
    }

    /// Class `file` had when it was last diagnosed
    pub fn class_of(&self, file: &Path) -> Option<ResourceClass> {
        self.classes.get(file).copied()
    }

    pub fn dependents(&self, key: &DependencyKey) -> impl Iterator<Item = &ResourceId> {
        self.edges.get(key).into_iter().flatten()
    }

    /// Files that must be re-diagnosed because `changed` files changed
    ///
    /// Follows edges transitively: a dependent file counts as changed in turn.
    /// `classify` gives the current resource class of a file, if it has one;
    /// the class recorded at its last diagnosis is used as well. The changed
    /// files themselves are not part of the result.
    pub fn affected<F>(&self, changed: &[PathBuf], classify: F) -> Vec<PathBuf>
    where
        F: Fn(&Path) -> Option<ResourceClass>,
    {
        let mut seen: HashSet<&Path> = changed.iter().map(PathBuf::as_path).collect();
        let mut queue: VecDeque<&Path> = changed.iter().map(PathBuf::as_path).collect();
        let mut affected = BTreeSet::new();

        while let Some(file) = queue.pop_front() {
            let mut keys = vec![DependencyKey::All, DependencyKey::File(file.to_path_buf())];
            for class in [classify(file), self.class_of(file)].into_iter().flatten() {
                let key = DependencyKey::Class(class);
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            for key in &keys {
                for id in self.dependents(key) {
                    if seen.insert(id.file.as_path()) {
                        affected.insert(id.file.clone());
                        queue.push_back(id.file.as_path());
                    }
                }
            }
        }
        affected.into_iter().collect()
    }

    /// Number of keys with at least one dependent
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(path: &Path) -> Option<ResourceClass> {
        path.to_str()
            .filter(|p| p.starts_with("Nodes/"))
            .map(|_| ResourceClass::Computer)
    }

    #[test]
    fn test_display() {
        let id = ResourceId::new("foo.xml", "Computer.Daemon>startupCommand");
        assert_eq!(id.to_string(), "foo.xml|Computer.Daemon>startupCommand");
        assert_eq!(DependencyKey::Class(ResourceClass::Computer).to_string(), "COMPUTER");
        assert_eq!(DependencyKey::All.to_string(), "ALL");
    }

    #[test]
    fn test_class_dependency() {
        let mut graph = DependencyGraph::new();
        graph.add(
            DependencyKey::Class(ResourceClass::Computer),
            ResourceId::new("Missions/a.xml", "mission.goals.goal>target"),
        );

        let affected = graph.affected(&[PathBuf::from("Nodes/core.xml")], classify);
        assert_eq!(affected, vec![PathBuf::from("Missions/a.xml")]);
        assert!(graph.affected(&[PathBuf::from("readme.xml")], classify).is_empty());
    }

    #[test]
    fn test_transitive_and_cyclic() {
        let mut graph = DependencyGraph::new();
        graph.add(DependencyKey::File("b.xml".into()), ResourceId::new("a.xml", "x>y"));
        graph.add(DependencyKey::File("c.xml".into()), ResourceId::new("b.xml", "x>y"));
        graph.add(DependencyKey::File("a.xml".into()), ResourceId::new("c.xml", "x>y"));

        let affected = graph.affected(&[PathBuf::from("c.xml")], |_| None);
        assert_eq!(affected, vec![PathBuf::from("a.xml"), PathBuf::from("b.xml")]);
    }

    #[test]
    fn test_deleted_file_keeps_class_until_removed() {
        let mut graph = DependencyGraph::new();
        graph.add(
            DependencyKey::Class(ResourceClass::Computer),
            ResourceId::new("Nodes/core.xml", "Computer>id"),
        );
        graph.set_class(Path::new("Nodes/gone.xml"), ResourceClass::Computer);

        // No longer in the index, but diagnosed as a computer before
        let affected = graph.affected(&[PathBuf::from("Nodes/gone.xml")], |_| None);
        assert_eq!(affected, vec![PathBuf::from("Nodes/core.xml")]);

        graph.remove_file(Path::new("Nodes/gone.xml"));
        assert!(graph.affected(&[PathBuf::from("Nodes/gone.xml")], |_| None).is_empty());
    }

    #[test]
    fn test_remove_file() {
        let mut graph = DependencyGraph::new();
        graph.add(DependencyKey::All, ResourceId::new("a.xml", "x>y"));
        graph.add(DependencyKey::All, ResourceId::new("b.xml", "x>y"));
        graph.remove_file(Path::new("a.xml"));
        assert_eq!(graph.dependents(&DependencyKey::All).count(), 1);

        graph.remove_file(Path::new("b.xml"));
        assert!(graph.is_empty());
    }
}
