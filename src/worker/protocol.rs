//! Messages exchanged with the diagnostic worker
//!
//! Every message owns its data, so a request carries snapshots of the hint
//! model and the resource index rather than references into host state.

use crate::diagnostics::FileReport;
use crate::hints::HintModel;
use crate::resources::ResourceIndex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One diagnosis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnoseRequest {
    pub paths: Vec<PathBuf>,
    /// Also re-diagnose files depending on `paths`
    #[serde(default)]
    pub scan_dependents: bool,
    /// Drop the dependency graph before diagnosing, as a full rescan does
    #[serde(default)]
    pub reset_dependency_table: bool,
    pub hints: HintModel,
    pub resources: ResourceIndex,
}

impl DiagnoseRequest {
    pub fn new(paths: Vec<PathBuf>, hints: HintModel, resources: ResourceIndex) -> Self {
        Self {
            paths,
            scan_dependents: false,
            reset_dependency_table: false,
            hints,
            resources,
        }
    }

    pub fn with_dependents(mut self) -> Self {
        self.scan_dependents = true;
        self
    }

    /// A full rescan: rebuild the dependency graph from scratch
    pub fn full_rescan(mut self) -> Self {
        self.reset_dependency_table = true;
        self
    }
}

/// Host to worker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    Diagnose(DiagnoseRequest),
    /// Answer to [`WorkerMessage::FileQuery`]
    FileQueryResult { id: u64, paths: Vec<String> },
    Shutdown,
}

/// Worker to host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    /// Findings for one file, replacing any earlier ones
    Report(FileReport),
    /// The worker needs workspace files matching `pattern`
    FileQuery { id: u64, pattern: String, folders: bool },
    /// A request is done
    Finished { diagnosed: usize },
}
