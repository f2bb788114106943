//! Workspace root and file queries

use globset::{Glob, GlobMatcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// The workspace the engine serves
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Workspace {
    /// No folder is open; every entry point returns empty results
    #[default]
    Missing,
    Root(PathBuf),
}

impl Workspace {
    pub fn root(&self) -> Option<&Path> {
        match self {
            Workspace::Missing => None,
            Workspace::Root(root) => Some(root),
        }
    }

    /// Path of `file` relative to the root, with `/` separators
    pub fn relative_path(&self, file: &Path) -> Option<String> {
        self.root().and_then(|root| relative_path(root, file))
    }
}

/// Path of `file` relative to `root`, with `/` separators
pub fn relative_path(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    Some(relative.to_string_lossy().replace('\\', "/"))
}

/// Finds workspace files by glob
pub trait FileQuery {
    /// Relative paths of files matching `pattern`, or of the folders containing
    /// them (and every ancestor up to `./`) when `folders` is set
    fn query(&self, pattern: &str, folders: bool) -> Vec<String>;
}

/// A [`FileQuery`] that never finds anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFiles;

impl FileQuery for NoFiles {
    fn query(&self, _pattern: &str, _folders: bool) -> Vec<String> {
        Vec::new()
    }
}

/// [`FileQuery`] walking a directory tree on disk
#[derive(Debug, Clone)]
pub struct WorkspaceFiles {
    root: PathBuf,
}

impl WorkspaceFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative paths of every file matching `matcher`
    fn matching_files(&self, matcher: &GlobMatcher) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| relative_path(&self.root, e.path()))
            .filter(|rel| matcher.is_match(rel))
            .collect();
        files.sort();
        files
    }
}

impl FileQuery for WorkspaceFiles {
    fn query(&self, pattern: &str, folders: bool) -> Vec<String> {
        let matcher = match Glob::new(pattern) {
            Ok(glob) => glob.compile_matcher(),
            Err(e) => {
                warn!("invalid file pattern {:?}: {}", pattern, e);
                return Vec::new();
            }
        };
        let files = self.matching_files(&matcher);
        if folders {
            expand_folders(&files)
        } else {
            files
        }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

/// Folders containing `files` plus all their ancestors; the root is `./`
pub fn expand_folders(files: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut folders = Vec::new();
    for file in files {
        let mut current = file.as_str();
        loop {
            let parent = match current.rfind('/') {
                Some(index) => &current[..index],
                None => "",
            };
            let folder = if parent.is_empty() { "./" } else { parent };
            if seen.insert(folder.to_string()) {
                folders.push(folder.to_string());
            }
            if parent.is_empty() {
                break;
            }
            current = parent;
        }
    }
    folders
}
