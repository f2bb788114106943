//! Everything hint resolution and validation read from

use crate::hints::HintModel;
use crate::parser::Node;
use crate::resources::ResourceIndex;
use crate::script::{ScriptEvaluator, ScriptInput};
use crate::workspace::FileQuery;

/// Borrowed view of the model and its collaborators for one document
#[derive(Clone, Copy)]
pub struct HintContext<'a> {
    pub model: &'a HintModel,
    pub resources: &'a ResourceIndex,
    pub files: &'a dyn FileQuery,
    pub scripts: &'a dyn ScriptEvaluator,
    /// Workspace-relative path of the document, for file-trigger patterns
    pub relative_path: Option<&'a str>,
}

impl<'a> HintContext<'a> {
    pub fn new(
        model: &'a HintModel,
        resources: &'a ResourceIndex,
        files: &'a dyn FileQuery,
        scripts: &'a dyn ScriptEvaluator,
    ) -> Self {
        Self {
            model,
            resources,
            files,
            scripts,
            relative_path: None,
        }
    }

    /// The same context for a document at `relative_path`
    pub fn for_document(self, relative_path: Option<&'a str>) -> Self {
        Self {
            relative_path,
            ..self
        }
    }

    pub fn script_input<'n>(&self, node: Option<&'n Node>) -> ScriptInput<'n>
    where
        'a: 'n,
    {
        ScriptInput {
            node,
            resources: self.resources,
        }
    }
}
