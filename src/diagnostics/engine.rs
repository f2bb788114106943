//! Incremental diagnostic engine
//!
//! Owns the dependency graph. A request names changed files; the engine
//! diagnoses them and, when asked, every file whose earlier findings depended
//! on them.

use super::computers::check_computer;
use super::deps::{DependencyGraph, ResourceId};
use super::types::FileReport;
use super::validate::validate_document;
use crate::context::HintContext;
use crate::parser::parse;
use crate::workspace::relative_path;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads document text for the engine
pub trait SourceLoader {
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Reads documents from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// How much work one request does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnoseOptions {
    /// Also re-diagnose files depending on the requested ones
    pub scan_dependents: bool,
    /// Drop the whole dependency graph first
    pub reset_dependency_table: bool,
}

/// Diagnostic engine
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    graph: DependencyGraph,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Diagnose `paths` (and their dependents) and return one report per file
    ///
    /// Files without an `.xml` extension are ignored.
    pub fn run(
        &mut self,
        paths: &[PathBuf],
        options: DiagnoseOptions,
        ctx: &HintContext<'_>,
        loader: &dyn SourceLoader,
    ) -> Vec<FileReport> {
        if options.reset_dependency_table {
            self.graph.clear();
        }

        let mut targets: BTreeSet<PathBuf> = paths.iter().cloned().collect();
        if options.scan_dependents {
            let dependents = self.graph.affected(paths, |p| ctx.resources.class_of(p));
            debug!("{} dependent files to re-diagnose", dependents.len());
            targets.extend(dependents);
        }

        let reports: Vec<FileReport> = targets
            .iter()
            .filter_map(|path| self.diagnose_file(path, ctx, loader))
            .collect();
        info!(
            "diagnosed {} files, {} findings",
            reports.len(),
            reports.iter().map(|r| r.findings.len()).sum::<usize>()
        );
        reports
    }

    /// Diagnose one file from disk
    ///
    /// A file that cannot be read gets an empty report, clearing whatever was
    /// reported for it before.
    pub fn diagnose_file(
        &mut self,
        path: &Path,
        ctx: &HintContext<'_>,
        loader: &dyn SourceLoader,
    ) -> Option<FileReport> {
        if !is_xml(path) {
            return None;
        }
        match loader.load(path) {
            Ok(text) => Some(self.diagnose_text(path, &text, ctx)),
            Err(e) => {
                debug!("cannot read {}: {}", path.display(), e);
                self.graph.remove_file(path);
                Some(FileReport::new(path.to_path_buf()))
            }
        }
    }

    /// Diagnose one document and record its dependency edges
    pub fn diagnose_text(&mut self, path: &Path, text: &str, ctx: &HintContext<'_>) -> FileReport {
        self.graph.remove_file(path);
        let mut report = FileReport::new(path.to_path_buf());

        let doc = match parse(text) {
            Ok(doc) => doc,
            Err(e) => {
                debug!("not diagnosing {}: {}", path.display(), e);
                return report;
            }
        };

        if let Some(class) = ctx.resources.class_of(path) {
            self.graph.set_class(path, class);
        }

        let relative = ctx.resources.root().and_then(|root| relative_path(root, path));
        let ctx = ctx.for_document(relative.as_deref());
        let mut validation = validate_document(&doc, &ctx);
        check_computer(&doc, path, ctx.resources, &mut validation);

        for dependency in validation.dependencies {
            self.graph
                .add(dependency.key, ResourceId::new(path, dependency.locator));
        }
        report.extend(validation.findings);
        report
    }
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DependencyKey;
    use crate::hints::{build_model, parse_hint_source, HintModel};
    use crate::resources::{ResourceClass, ResourceIndex};
    use crate::script::ScriptRegistry;
    use crate::workspace::NoFiles;
    use std::collections::HashMap;

    const HINTS: &str = r#"<HacknetEditorHint>
  <Node name="Computer"><Attribute name="id"/><Attribute name="ip"/></Node>
  <Node name="mission">
    <Attribute name="target" hint="Computer" diag="E"/>
  </Node>
</HacknetEditorHint>"#;

    struct Sources(HashMap<PathBuf, String>);

    impl SourceLoader for Sources {
        fn load(&self, path: &Path) -> io::Result<String> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }
    }

    fn model() -> HintModel {
        build_model(vec![parse_hint_source(HINTS, Path::new("hints.xml")).unwrap()])
    }

    fn sources(files: &[(&str, &str)]) -> (Sources, ResourceIndex) {
        let mut index = ResourceIndex::new(None);
        let mut map = HashMap::new();
        for (path, text) in files {
            index.index_source(Path::new(path), text);
            map.insert(PathBuf::from(path), text.to_string());
        }
        (Sources(map), index)
    }

    #[test]
    fn test_records_dependencies() {
        let model = model();
        let (loader, index) = sources(&[
            ("Missions/a.xml", r#"<mission target="core"/>"#),
            ("Nodes/core.xml", r#"<Computer id="core"/>"#),
        ]);
        let scripts = ScriptRegistry::new();
        let ctx = HintContext::new(&model, &index, &NoFiles, &scripts);
        let mut engine = DiagnosticEngine::new();

        let reports = engine.run(
            &[PathBuf::from("Missions/a.xml")],
            DiagnoseOptions::default(),
            &ctx,
            &loader,
        );
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_clean());
        for key in [
            DependencyKey::Class(ResourceClass::Computer),
            DependencyKey::File(PathBuf::from("Nodes/core.xml")),
        ] {
            assert_eq!(
                engine.graph().dependents(&key).map(|id| id.to_string()).collect::<Vec<_>>(),
                vec!["Missions/a.xml|mission>target"]
            );
        }

        // core.xml was never diagnosed, so only the file edge leads to a.xml
        let affected = engine.graph().affected(&[PathBuf::from("Nodes/core.xml")], |_| None);
        assert_eq!(affected, vec![PathBuf::from("Missions/a.xml")]);
    }

    #[test]
    fn test_scan_dependents() {
        let model = model();
        let (loader, index) = sources(&[
            ("Missions/a.xml", r#"<mission target="core"/>"#),
            ("Nodes/core.xml", r#"<Computer id="core"/>"#),
        ]);
        let scripts = ScriptRegistry::new();
        let ctx = HintContext::new(&model, &index, &NoFiles, &scripts);
        let mut engine = DiagnosticEngine::new();
        engine.run(&[PathBuf::from("Missions/a.xml")], DiagnoseOptions::default(), &ctx, &loader);

        let options = DiagnoseOptions {
            scan_dependents: true,
            ..DiagnoseOptions::default()
        };
        let reports = engine.run(&[PathBuf::from("Nodes/core.xml")], options, &ctx, &loader);
        let paths: Vec<_> = reports.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("Missions/a.xml"), PathBuf::from("Nodes/core.xml")]);

        let reports = engine.run(&[PathBuf::from("Nodes/core.xml")], DiagnoseOptions::default(), &ctx, &loader);
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_deleted_computer_rediagnoses_duplicates() {
        let model = model();
        let (loader, mut index) = sources(&[
            ("Nodes/a.xml", r#"<Computer id="core"/>"#),
            ("Nodes/b.xml", r#"<Computer id="core"/>"#),
        ]);
        let scripts = ScriptRegistry::new();
        let mut engine = DiagnosticEngine::new();
        let both = [PathBuf::from("Nodes/a.xml"), PathBuf::from("Nodes/b.xml")];
        {
            let ctx = HintContext::new(&model, &index, &NoFiles, &scripts);
            let reports = engine.run(&both, DiagnoseOptions::default(), &ctx, &loader);
            assert!(reports.iter().all(|r| r.error_count() == 1));
        }

        index.remove_file(Path::new("Nodes/b.xml"));
        let (loader, _) = sources(&[("Nodes/a.xml", r#"<Computer id="core"/>"#)]);
        let ctx = HintContext::new(&model, &index, &NoFiles, &scripts);
        let options = DiagnoseOptions {
            scan_dependents: true,
            ..DiagnoseOptions::default()
        };
        let reports = engine.run(&[PathBuf::from("Nodes/b.xml")], options, &ctx, &loader);

        let paths: Vec<_> = reports.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, both.to_vec());
        assert!(reports.iter().all(FileReport::is_clean));
        assert_eq!(engine.graph().class_of(Path::new("Nodes/b.xml")), None);
    }

    #[test]
    fn test_reset_and_unreadable_files() {
        let model = model();
        let (loader, index) = sources(&[("Missions/a.xml", r#"<mission target="core"/>"#)]);
        let scripts = ScriptRegistry::new();
        let ctx = HintContext::new(&model, &index, &NoFiles, &scripts);
        let mut engine = DiagnosticEngine::new();

        let reports = engine.run(&[PathBuf::from("Missions/a.xml")], DiagnoseOptions::default(), &ctx, &loader);
        assert_eq!(reports[0].error_count(), 1);
        assert!(!engine.graph().is_empty());

        let options = DiagnoseOptions {
            reset_dependency_table: true,
            ..DiagnoseOptions::default()
        };
        let reports = engine.run(&[PathBuf::from("Missions/gone.xml"), PathBuf::from("notes.txt")], options, &ctx, &loader);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_clean());
        assert!(engine.graph().is_empty());
    }

    #[test]
    fn test_parse_failure_clears_findings() {
        let model = model();
        let index = ResourceIndex::new(None);
        let scripts = ScriptRegistry::new();
        let ctx = HintContext::new(&model, &index, &NoFiles, &scripts);
        let mut engine = DiagnosticEngine::new();

        let report = engine.diagnose_text(Path::new("a.xml"), "<mission target=\"x\"", &ctx);
        assert!(report.is_clean());
    }
}
