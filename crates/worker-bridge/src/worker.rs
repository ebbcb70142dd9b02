//! The geometry worker host: one background thread owning the kernel.
//!
//! The kernel is created once, at thread startup, by a caller-supplied
//! factory (standing in for the original's asynchronous WASM-module load).
//! Requests that arrive while initialization runs simply queue in the
//! channel, so every early caller shares the single in-flight
//! initialization. On success the worker emits an unsolicited `ready`; on
//! failure it emits `error` once and then answers every kernel-touching
//! request with the stored message. The worker never crashes, it only
//! degrades.

use std::sync::mpsc;
use std::thread;

use camber_types::MeshQuality;
use kernel_host::{Kernel, KernelError, MockKernel, TruckKernel};
use model_script::{ModelBuilder, ScriptBuilder};

use crate::client::WorkerClient;
use crate::messages::{WorkerRequest, WorkerResponse};
use crate::session::{WorkerSession, DEFAULT_STAGING_FILE};

/// Creates the kernel on the worker thread.
pub type KernelFactory = Box<dyn FnOnce() -> Result<Box<dyn Kernel>, KernelError> + Send>;

/// Configuration for one worker.
pub struct WorkerConfig {
    pub quality: MeshQuality,
    pub staging_file: String,
    kernel_factory: KernelFactory,
    builder: Box<dyn ModelBuilder + Send>,
}

impl WorkerConfig {
    pub fn new(kernel_factory: KernelFactory) -> Self {
        Self {
            quality: MeshQuality::default(),
            staging_file: DEFAULT_STAGING_FILE.to_string(),
            kernel_factory,
            builder: Box::new(ScriptBuilder::new()),
        }
    }

    /// The real B-Rep kernel.
    pub fn truck() -> Self {
        Self::new(Box::new(|| Ok(Box::new(TruckKernel::new()) as Box<dyn Kernel>)))
    }

    /// The deterministic mock kernel (tests, headless CI).
    pub fn mock() -> Self {
        Self::new(Box::new(|| Ok(Box::new(MockKernel::new()) as Box<dyn Kernel>)))
    }

    pub fn with_quality(mut self, quality: MeshQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_builder(mut self, builder: Box<dyn ModelBuilder + Send>) -> Self {
        self.builder = builder;
        self
    }
}

/// Spawns geometry workers.
pub struct GeometryWorker;

impl GeometryWorker {
    /// Spawn a worker thread and return the client end.
    ///
    /// Dropping every clone of the client disconnects the request channel,
    /// which ends the worker loop and destroys all kernel state.
    pub fn spawn(config: WorkerConfig) -> WorkerClient {
        let (req_tx, req_rx) = mpsc::channel::<WorkerRequest>();
        let (resp_tx, resp_rx) = mpsc::channel::<WorkerResponse>();

        thread::spawn(move || worker_loop(config, req_rx, resp_tx));

        WorkerClient::new(req_tx, resp_rx)
    }
}

fn worker_loop(
    config: WorkerConfig,
    req_rx: mpsc::Receiver<WorkerRequest>,
    resp_tx: mpsc::Sender<WorkerResponse>,
) {
    let WorkerConfig {
        quality,
        staging_file,
        kernel_factory,
        builder,
    } = config;

    let mut session = match kernel_factory() {
        Ok(kernel) => {
            tracing::info!("geometry kernel initialized");
            let _ = resp_tx.send(WorkerResponse::Ready { id: None });
            WorkerSession::new(kernel, builder, quality, staging_file)
        }
        Err(e) => {
            tracing::error!(error = %e, "geometry kernel failed to initialize");
            let _ = resp_tx.send(WorkerResponse::Error {
                id: None,
                message: format!("kernel initialization failed: {e}"),
            });
            WorkerSession::failed(e.to_string(), builder, quality, staging_file)
        }
    };

    // Inherently serialized: one request runs to completion (triangulation
    // and buffer packaging included) before the next is received.
    while let Ok(request) = req_rx.recv() {
        tracing::debug!(id = ?request.id(), "handling request");
        let response = session.handle(request);
        if resp_tx.send(response).is_err() {
            break;
        }
    }
    tracing::info!("geometry worker shutting down");
}
