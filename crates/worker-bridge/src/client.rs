//! Main-thread client for the geometry worker.
//!
//! Every request gets a fresh correlation id and a pending-reply slot; a
//! router thread matches responses back to their slots, so pipelined
//! requests resolve correctly regardless of arrival order. Readiness is a
//! single flag set exactly once per worker lifetime; any number of waiters
//! observe it, and waiting never issues additional initialization work.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Condvar, Mutex};
use std::thread;

use camber_types::MeshBuffers;

use crate::messages::{WorkerRequest, WorkerResponse};

/// Errors surfaced to callers of the client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkerError {
    /// The worker answered with an `error` response; the message is the
    /// worker's, verbatim.
    #[error("{0}")]
    Worker(String),

    #[error("worker terminated before responding")]
    Disconnected,

    #[error("kernel initialization failed: {0}")]
    InitFailed(String),

    #[error("unexpected response type `{got}`")]
    UnexpectedResponse { got: &'static str },

    #[error("saving export failed: {0}")]
    Save(String),
}

/// Bytes handed back from an export, with the worker-reported filename.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Debug)]
enum ReadyState {
    Pending,
    Ready,
    Failed(String),
}

struct Shared {
    pending: Mutex<HashMap<u64, mpsc::Sender<WorkerResponse>>>,
    ready: Mutex<ReadyState>,
    ready_cv: Condvar,
}

impl Shared {
    /// Set the readiness flag. Only the first transition out of `Pending`
    /// sticks; later signals are no-ops.
    fn set_ready(&self, outcome: Result<(), String>) {
        let mut state = self.ready.lock().unwrap();
        if matches!(*state, ReadyState::Pending) {
            *state = match outcome {
                Ok(()) => ReadyState::Ready,
                Err(message) => ReadyState::Failed(message),
            };
            self.ready_cv.notify_all();
        }
    }
}

/// A reply that has not arrived yet. Resolves exactly once.
pub struct PendingReply {
    id: u64,
    rx: mpsc::Receiver<WorkerResponse>,
}

impl PendingReply {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Block until the matching response or error arrives.
    pub fn wait(self) -> Result<WorkerResponse, WorkerError> {
        self.rx.recv().map_err(|_| WorkerError::Disconnected)
    }

    /// Non-blocking poll; `None` while the request is still in flight.
    pub fn poll(&self) -> Option<Result<WorkerResponse, WorkerError>> {
        match self.rx.try_recv() {
            Ok(response) => Some(Ok(response)),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(WorkerError::Disconnected)),
        }
    }
}

/// Client end of a geometry worker. Cheap to clone; all clones share the
/// same worker, pending map and readiness flag.
pub struct WorkerClient {
    req_tx: mpsc::Sender<WorkerRequest>,
    shared: Arc<Shared>,
    next_id: Arc<AtomicU64>,
}

impl Clone for WorkerClient {
    fn clone(&self) -> Self {
        Self {
            req_tx: self.req_tx.clone(),
            shared: Arc::clone(&self.shared),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl WorkerClient {
    /// Wire a client to a worker's channel endpoints and start the response
    /// router.
    pub(crate) fn new(
        req_tx: mpsc::Sender<WorkerRequest>,
        resp_rx: mpsc::Receiver<WorkerResponse>,
    ) -> Self {
        let shared = Arc::new(Shared {
            pending: Mutex::new(HashMap::new()),
            ready: Mutex::new(ReadyState::Pending),
            ready_cv: Condvar::new(),
        });

        let router_shared = Arc::clone(&shared);
        thread::spawn(move || route_responses(resp_rx, router_shared));

        Self {
            req_tx,
            shared,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    // ── Raw protocol ────────────────────────────────────────────────

    /// Send a request built around a fresh correlation id.
    fn submit(&self, make: impl FnOnce(u64) -> WorkerRequest) -> PendingReply {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::channel();
        self.shared.pending.lock().unwrap().insert(id, tx);

        if self.req_tx.send(make(id)).is_err() {
            // Worker is gone; drop the slot so the reply resolves to
            // Disconnected instead of hanging.
            self.shared.pending.lock().unwrap().remove(&id);
        }
        PendingReply { id, rx }
    }

    pub fn submit_build(&self, source: &str) -> PendingReply {
        let source = source.to_string();
        self.submit(|id| WorkerRequest::Build { id, source })
    }

    pub fn submit_load_step(&self, filename: Option<&str>, data: Vec<u8>) -> PendingReply {
        let filename = filename.map(str::to_string);
        self.submit(|id| WorkerRequest::LoadStep { id, filename, data })
    }

    pub fn submit_export_step(
        &self,
        filename: Option<&str>,
        source: Option<&str>,
    ) -> PendingReply {
        let filename = filename.map(str::to_string);
        let source = source.map(str::to_string);
        self.submit(|id| WorkerRequest::ExportStep {
            id,
            filename,
            source,
        })
    }

    pub fn submit_export_stl(&self, filename: Option<&str>) -> PendingReply {
        let filename = filename.map(str::to_string);
        self.submit(|id| WorkerRequest::ExportStl { id, filename })
    }

    pub fn submit_init(&self) -> PendingReply {
        self.submit(|id| WorkerRequest::Init { id: Some(id) })
    }

    // ── Blocking convenience wrappers ───────────────────────────────

    /// Resolve once the worker's `ready` signal has been observed; returns
    /// immediately if it already was. Fails if initialization failed or the
    /// worker is gone.
    pub fn wait_for_ready(&self) -> Result<(), WorkerError> {
        let mut state = self.shared.ready.lock().unwrap();
        loop {
            match &*state {
                ReadyState::Ready => return Ok(()),
                ReadyState::Failed(message) => {
                    return Err(WorkerError::InitFailed(message.clone()))
                }
                ReadyState::Pending => {
                    state = self.shared.ready_cv.wait(state).unwrap();
                }
            }
        }
    }

    /// Explicit warm-up round trip.
    pub fn init(&self) -> Result<(), WorkerError> {
        match self.submit_init().wait()? {
            WorkerResponse::Ready { .. } => Ok(()),
            WorkerResponse::Error { message, .. } => Err(WorkerError::Worker(message)),
            other => Err(WorkerError::UnexpectedResponse {
                got: other.type_name(),
            }),
        }
    }

    /// Build model source and return the mesh buffers.
    pub fn build(&self, source: &str) -> Result<MeshBuffers, WorkerError> {
        expect_build_result(self.submit_build(source).wait()?)
    }

    /// Load STEP bytes and return the mesh buffers.
    pub fn load_step(
        &self,
        filename: Option<&str>,
        data: Vec<u8>,
    ) -> Result<MeshBuffers, WorkerError> {
        expect_build_result(self.submit_load_step(filename, data).wait()?)
    }

    /// Export the last built/loaded solid as STEP.
    pub fn export_step(
        &self,
        filename: Option<&str>,
        source: Option<&str>,
    ) -> Result<ExportedFile, WorkerError> {
        match self.submit_export_step(filename, source).wait()? {
            WorkerResponse::ExportStepResult { filename, data, .. } => {
                Ok(ExportedFile { filename, data })
            }
            WorkerResponse::Error { message, .. } => Err(WorkerError::Worker(message)),
            other => Err(WorkerError::UnexpectedResponse {
                got: other.type_name(),
            }),
        }
    }

    /// Export the last built/loaded solid as binary STL.
    pub fn export_stl(&self, filename: Option<&str>) -> Result<ExportedFile, WorkerError> {
        match self.submit_export_stl(filename).wait()? {
            WorkerResponse::ExportStlResult { filename, data, .. } => {
                Ok(ExportedFile { filename, data })
            }
            WorkerResponse::Error { message, .. } => Err(WorkerError::Worker(message)),
            other => Err(WorkerError::UnexpectedResponse {
                got: other.type_name(),
            }),
        }
    }
}

fn expect_build_result(response: WorkerResponse) -> Result<MeshBuffers, WorkerError> {
    match response {
        WorkerResponse::BuildResult { buffers, .. } => Ok(buffers),
        WorkerResponse::Error { message, .. } => Err(WorkerError::Worker(message)),
        other => Err(WorkerError::UnexpectedResponse {
            got: other.type_name(),
        }),
    }
}

/// Route worker responses to their pending slots; maintain the readiness
/// flag from unsolicited signals.
fn route_responses(resp_rx: mpsc::Receiver<WorkerResponse>, shared: Arc<Shared>) {
    while let Ok(response) = resp_rx.recv() {
        match &response {
            WorkerResponse::Ready { .. } => shared.set_ready(Ok(())),
            WorkerResponse::Error { id: None, message } => {
                // Fatal startup failure.
                shared.set_ready(Err(message.clone()));
            }
            _ => {}
        }

        if let Some(id) = response.id() {
            let slot = shared.pending.lock().unwrap().remove(&id);
            match slot {
                Some(tx) => {
                    let _ = tx.send(response);
                }
                None => {
                    tracing::debug!(id, "dropping response with no pending request");
                }
            }
        }
    }

    // Worker gone: wake ready-waiters and fail outstanding requests by
    // dropping their reply slots.
    shared.set_ready(Err("worker terminated".to_string()));
    shared.pending.lock().unwrap().clear();
}
