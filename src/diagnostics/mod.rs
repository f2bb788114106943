//! Diagnostics for Hacknet extension files
//!
//! [`DiagnosticEngine`] validates documents against the hint model, checks
//! computer ids and ips across the workspace, and tracks which files depend on
//! which resources so a change re-diagnoses exactly the affected files.

mod computers;
mod deps;
mod engine;
mod store;
mod types;
mod validate;

pub use computers::check_computer;
pub use deps::{DependencyGraph, DependencyKey, ResourceId};
pub use engine::{DiagnoseOptions, DiagnosticEngine, FsLoader, SourceLoader};
pub use store::{FileState, FindingsStore};
pub use types::{FileReport, Finding, Position, Range, Severity};
pub use validate::{validate_document, Dependency, Validation};
