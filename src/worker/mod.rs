//! Background diagnosis
//!
//! [`DiagnosticWorker`] runs the diagnostic engine on its own thread and talks
//! to the host through [`protocol`] messages. [`DiagnosticScheduler`] decides
//! when to send them.

pub mod protocol;
mod schedule;
mod thread;

pub use protocol::{DiagnoseRequest, HostMessage, WorkerMessage};
pub use schedule::{Debouncer, DiagnosticScheduler, ScheduledAction};
pub use thread::{DiagnosticWorker, WorkerError};
