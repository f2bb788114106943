//! hacknet-hints: editor intelligence for Hacknet extension XML files
//!
//! A workspace declares its vocabulary in a hint definition file
//! (`Hacknet-EditorHint.xml` by default, root element `HacknetEditorHint`).
//! From that model this crate offers:
//! - completion of tags, attributes and values at a cursor offset
//! - hover descriptions
//! - go to definition for values that name other workspace files
//! - diagnostics with dependency tracking, optionally on a worker thread
//!
//! # Example
//!
//! ```no_run
//! use hacknet_hints::HintEngine;
//! use std::path::Path;
//!
//! let engine = HintEngine::open("path/to/extension");
//! let file = Path::new("path/to/extension/Nodes/core.xml");
//! let text = r#"<Computer id="core" type="" />"#;
//!
//! for item in engine.complete(Some(file), text, 26) {
//!     println!("{}: {}", item.label, item.detail.unwrap_or_default());
//! }
//! ```

pub mod completions;
pub mod config;
mod context;
pub mod diagnostics;
pub mod hints;
pub mod hover;
pub mod links;
pub mod parser;
pub mod path;
pub mod resources;
pub mod script;
pub mod workspace;
pub mod worker;

pub use completions::{Suggestion, SuggestionKind};
pub use config::{Config, ConfigError};
pub use context::HintContext;
pub use diagnostics::{DiagnoseOptions, FileReport, Finding, Severity};
pub use hints::{HintModel, LoadError};
pub use links::LinkTarget;
pub use resources::ResourceIndex;
pub use workspace::Workspace;

use diagnostics::{DiagnosticEngine, FsLoader};
use script::{ScriptEvaluator, ScriptRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use worker::{DiagnoseRequest, DiagnosticWorker, WorkerError};
use workspace::{FileQuery, NoFiles, WorkspaceFiles};

/// Everything needed to serve one workspace
pub struct HintEngine {
    config: Config,
    workspace: Workspace,
    model: HintModel,
    resources: ResourceIndex,
    files: Option<WorkspaceFiles>,
    scripts: Arc<dyn ScriptEvaluator>,
    diagnostics: DiagnosticEngine,
}

impl HintEngine {
    /// Open a workspace: read its config, load the hint model and index resources
    ///
    /// A missing or broken hint file leaves the model empty; the problem is logged.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config = Config::load_default(&root);
        let mut engine = Self {
            config,
            workspace: Workspace::Root(root.clone()),
            model: HintModel::new(),
            resources: ResourceIndex::new(Some(root.clone())),
            files: Some(WorkspaceFiles::new(root)),
            scripts: Arc::new(ScriptRegistry::new()),
            diagnostics: DiagnosticEngine::new(),
        };
        if let Err(e) = engine.reload_hints() {
            warn!("{}", e);
        }
        engine.reindex();
        engine
    }

    /// An engine without a workspace; every entry point returns nothing
    pub fn missing() -> Self {
        Self {
            config: Config::default(),
            workspace: Workspace::Missing,
            model: HintModel::new(),
            resources: ResourceIndex::new(None),
            files: None,
            scripts: Arc::new(ScriptRegistry::new()),
            diagnostics: DiagnosticEngine::new(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use a custom evaluator for `Script` hints
    pub fn with_scripts(mut self, scripts: Arc<dyn ScriptEvaluator>) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn model(&self) -> &HintModel {
        &self.model
    }

    pub fn resources(&self) -> &ResourceIndex {
        &self.resources
    }

    /// Re-read the hint definition file and its includes
    pub fn reload_hints(&mut self) -> Result<(), LoadError> {
        let Some(root) = self.workspace.root() else {
            return Ok(());
        };
        let model = hints::load_hint_model(root, &self.config.hint_file)?;
        for warning in &model.warnings {
            warn!("{}", warning);
        }
        self.model = model;
        Ok(())
    }

    /// Rebuild the resource index from disk
    pub fn reindex(&mut self) -> usize {
        self.resources = ResourceIndex::new(self.workspace.root().map(Path::to_path_buf));
        let count = self.resources.index_directory();
        info!("indexed {} resources", count);
        count
    }

    /// Re-index one file from (possibly unsaved) text
    pub fn update_file(&mut self, path: &Path, text: &str) {
        self.resources.index_source(path, text);
    }

    /// Drop a deleted file from the index; returns the class it had
    ///
    /// Diagnose the path with [`DiagnoseOptions::scan_dependents`] afterwards
    /// to clear findings that depended on it.
    pub fn remove_file(&mut self, path: &Path) -> Option<resources::ResourceClass> {
        self.resources.remove_file(path).map(|record| record.class())
    }

    /// Workspace files the engine diagnoses, as absolute paths
    pub fn document_paths(&self) -> Vec<PathBuf> {
        match (&self.files, self.workspace.root()) {
            (Some(files), Some(root)) => files
                .query(&self.config.xml_glob, false)
                .into_iter()
                .map(|relative| root.join(relative))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn files(&self) -> &dyn FileQuery {
        match &self.files {
            Some(files) => files,
            None => &NoFiles,
        }
    }

    fn with_context<R>(&self, document: Option<&Path>, f: impl FnOnce(&HintContext<'_>) -> R) -> R {
        let relative = document.and_then(|path| self.workspace.relative_path(path));
        let ctx = HintContext::new(&self.model, &self.resources, self.files(), self.scripts.as_ref())
            .for_document(relative.as_deref());
        f(&ctx)
    }

    /// Completion at byte `offset` of `text`; `document` is the file being edited
    pub fn complete(&self, document: Option<&Path>, text: &str, offset: usize) -> Vec<Suggestion> {
        if self.workspace.root().is_none() {
            return Vec::new();
        }
        let mut items = self.with_context(document, |ctx| completions::complete(text, offset, ctx));
        if let Some(max) = self.config.completion.max_items {
            items.truncate(max);
        }
        items
    }

    pub fn hover(&self, document: Option<&Path>, text: &str, offset: usize) -> Option<String> {
        self.workspace.root()?;
        self.with_context(document, |ctx| hover::hover(text, offset, ctx))
    }

    pub fn definition(&self, document: Option<&Path>, text: &str, offset: usize) -> Vec<LinkTarget> {
        if self.workspace.root().is_none() {
            return Vec::new();
        }
        self.with_context(document, |ctx| links::definition(text, offset, ctx))
    }

    /// Diagnose files on the calling thread
    pub fn diagnose(&mut self, paths: &[PathBuf], options: DiagnoseOptions) -> Vec<FileReport> {
        if self.workspace.root().is_none() || !self.config.diagnostics.enabled {
            return Vec::new();
        }
        let files: &dyn FileQuery = match &self.files {
            Some(files) => files,
            None => &NoFiles,
        };
        let ctx = HintContext::new(&self.model, &self.resources, files, self.scripts.as_ref());
        self.diagnostics.run(paths, options, &ctx, &FsLoader)
    }

    /// Start a worker thread sharing this engine's script evaluator
    pub fn spawn_worker(&self) -> Result<DiagnosticWorker, WorkerError> {
        DiagnosticWorker::spawn(Arc::clone(&self.scripts))
    }

    /// A worker request carrying snapshots of the model and the index
    pub fn request(&self, paths: Vec<PathBuf>) -> DiagnoseRequest {
        DiagnoseRequest::new(paths, self.model.clone(), self.resources.clone())
    }

    /// File query for answering worker requests
    pub fn file_query(&self) -> &dyn FileQuery {
        self.files()
    }
}
