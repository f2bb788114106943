//! The diagnostic worker thread
//!
//! The worker owns a [`DiagnosticEngine`] and with it the dependency graph.
//! Requests are processed one at a time. While diagnosing, file queries are
//! sent back to the host, which answers them from its own [`FileQuery`].

use super::protocol::{DiagnoseRequest, HostMessage, WorkerMessage};
use crate::context::HintContext;
use crate::diagnostics::{DiagnoseOptions, DiagnosticEngine, FindingsStore, FsLoader};
use crate::script::ScriptEvaluator;
use crate::workspace::FileQuery;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, warn};

/// How long the worker waits for the host to answer a file query
const FILE_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("failed to spawn diagnostic worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("diagnostic worker is gone")]
    Disconnected,

    #[error("diagnostic worker panicked")]
    Panicked,
}

/// Handle to the diagnostic worker thread
///
/// Dropping the handle shuts the worker down.
pub struct DiagnosticWorker {
    sender: Sender<HostMessage>,
    receiver: Receiver<WorkerMessage>,
    handle: Option<JoinHandle<()>>,
}

impl DiagnosticWorker {
    pub fn spawn(scripts: Arc<dyn ScriptEvaluator>) -> Result<Self, WorkerError> {
        let (host_tx, host_rx) = mpsc::channel::<HostMessage>();
        let (worker_tx, worker_rx) = mpsc::channel::<WorkerMessage>();

        let handle = thread::Builder::new()
            .name("hacknet-diagnostics".into())
            .spawn(move || worker_loop(scripts, host_rx, worker_tx))?;

        Ok(Self {
            sender: host_tx,
            receiver: worker_rx,
            handle: Some(handle),
        })
    }

    pub fn submit(&self, request: DiagnoseRequest) -> Result<(), WorkerError> {
        self.send(HostMessage::Diagnose(request))
    }

    pub fn answer_file_query(&self, id: u64, paths: Vec<String>) -> Result<(), WorkerError> {
        self.send(HostMessage::FileQueryResult { id, paths })
    }

    fn send(&self, message: HostMessage) -> Result<(), WorkerError> {
        self.sender
            .send(message)
            .map_err(|_| WorkerError::Disconnected)
    }

    pub fn try_recv(&self) -> Result<Option<WorkerMessage>, WorkerError> {
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<WorkerMessage>, WorkerError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }

    /// Handle worker messages until a request finishes or `timeout` passes
    ///
    /// Reports go into `store`, file queries are answered from `files`.
    /// Returns the number of files the finished request diagnosed, or `None`
    /// on timeout.
    pub fn pump(
        &self,
        files: &dyn FileQuery,
        store: &mut FindingsStore,
        timeout: Duration,
    ) -> Result<Option<usize>, WorkerError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Some(message) = self.recv_timeout(remaining)? else {
                return Ok(None);
            };
            match message {
                WorkerMessage::Report(report) => store.apply(report),
                WorkerMessage::FileQuery { id, pattern, folders } => {
                    self.answer_file_query(id, files.query(&pattern, folders))?
                }
                WorkerMessage::Finished { diagnosed } => return Ok(Some(diagnosed)),
            }
        }
    }

    /// Stop the worker and wait for it to exit
    pub fn shutdown(mut self) -> Result<(), WorkerError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), WorkerError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        // The worker may already be gone; joining tells us how it ended
        let _ = self.sender.send(HostMessage::Shutdown);
        handle.join().map_err(|_| WorkerError::Panicked)
    }
}

impl Drop for DiagnosticWorker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("{}", e);
        }
    }
}

fn worker_loop(
    scripts: Arc<dyn ScriptEvaluator>,
    requests: Receiver<HostMessage>,
    replies: Sender<WorkerMessage>,
) {
    let mut engine = DiagnosticEngine::new();
    let pending = RefCell::new(VecDeque::new());
    let shutdown = Cell::new(false);
    let next_query = Cell::new(0u64);

    loop {
        let queued = pending.borrow_mut().pop_front();
        let message = match queued {
            Some(message) => message,
            None => match requests.recv() {
                Ok(message) => message,
                Err(_) => return,
            },
        };

        let request = match message {
            HostMessage::Diagnose(request) => request,
            HostMessage::FileQueryResult { id, .. } => {
                debug!("dropping stale file query result {}", id);
                continue;
            }
            HostMessage::Shutdown => return,
        };

        let files = ChannelFiles {
            requests: &requests,
            replies: &replies,
            pending: &pending,
            shutdown: &shutdown,
            next_query: &next_query,
            cache: RefCell::new(HashMap::new()),
        };
        let options = DiagnoseOptions {
            scan_dependents: request.scan_dependents,
            reset_dependency_table: request.reset_dependency_table,
        };
        let ctx = HintContext::new(&request.hints, &request.resources, &files, scripts.as_ref());

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            engine.run(&request.paths, options, &ctx, &FsLoader)
        }));
        let reports = match result {
            Ok(reports) => reports,
            Err(_) => {
                error!("diagnosis panicked, resetting the dependency graph");
                engine = DiagnosticEngine::new();
                Vec::new()
            }
        };

        let diagnosed = reports.len();
        for report in reports {
            if replies.send(WorkerMessage::Report(report)).is_err() {
                return;
            }
        }
        if replies.send(WorkerMessage::Finished { diagnosed }).is_err() || shutdown.get() {
            return;
        }
    }
}

/// [`FileQuery`] answered by the host over the worker channels
///
/// Requests arriving while a query is outstanding are queued for later.
struct ChannelFiles<'a> {
    requests: &'a Receiver<HostMessage>,
    replies: &'a Sender<WorkerMessage>,
    pending: &'a RefCell<VecDeque<HostMessage>>,
    shutdown: &'a Cell<bool>,
    next_query: &'a Cell<u64>,
    cache: RefCell<HashMap<(String, bool), Vec<String>>>,
}

impl ChannelFiles<'_> {
    fn ask(&self, pattern: &str, folders: bool) -> Vec<String> {
        if self.shutdown.get() {
            return Vec::new();
        }
        let id = self.next_query.get();
        self.next_query.set(id + 1);
        let query = WorkerMessage::FileQuery {
            id,
            pattern: pattern.to_string(),
            folders,
        };
        if self.replies.send(query).is_err() {
            self.shutdown.set(true);
            return Vec::new();
        }

        let deadline = Instant::now() + FILE_QUERY_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.requests.recv_timeout(remaining) {
                Ok(HostMessage::FileQueryResult { id: answered, paths }) if answered == id => {
                    return paths
                }
                Ok(HostMessage::FileQueryResult { id: answered, .. }) => {
                    debug!("dropping stale file query result {}", answered);
                }
                Ok(HostMessage::Shutdown) => {
                    self.shutdown.set(true);
                    return Vec::new();
                }
                Ok(message) => self.pending.borrow_mut().push_back(message),
                Err(RecvTimeoutError::Timeout) => {
                    warn!("file query {:?} timed out", pattern);
                    return Vec::new();
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.shutdown.set(true);
                    return Vec::new();
                }
            }
        }
    }
}

impl FileQuery for ChannelFiles<'_> {
    fn query(&self, pattern: &str, folders: bool) -> Vec<String> {
        let key = (pattern.to_string(), folders);
        if let Some(paths) = self.cache.borrow().get(&key) {
            return paths.clone();
        }
        let paths = self.ask(pattern, folders);
        self.cache.borrow_mut().insert(key, paths.clone());
        paths
    }
}
