//! The worker's session state and per-request handling.
//!
//! Session state is an explicit struct (kernel, last solid, staging
//! filesystem) threaded through the message handler rather than module
//! globals, so a future multi-session worker pool stays possible. The worker
//! retains a single mutable "last solid" slot shared by build, export and
//! load; the surrounding message loop serializes access to it.

use camber_types::{MeshBuffers, MeshQuality};
use kernel_host::extract::{extract_mesh, ExtractError};
use kernel_host::{Kernel, KernelError, SolidHandle};
use model_script::{ModelBuilder, ScriptError};
use step_io::{
    mesh_to_stl, StepReadError, StepStrategy, TransferStatus, WriteStatus,
};

use crate::messages::{WorkerRequest, WorkerResponse};
use crate::vfs::VirtualFs;

/// Default staging name for import/export round-trips.
pub const DEFAULT_STAGING_FILE: &str = "staging.step";

/// Default filename attached to exports when the caller gave none.
pub const DEFAULT_EXPORT_FILE: &str = "model.step";

enum KernelState {
    Ready(Box<dyn Kernel>),
    /// Initialization failed; the message carried here answers every
    /// subsequent kernel-touching request.
    Failed(String),
}

/// Errors raised while handling one request. Converted to `error` responses
/// at the message boundary; the worker itself never dies from one of these.
#[derive(Debug, thiserror::Error)]
enum SessionError {
    #[error("kernel initialization failed: {0}")]
    KernelUnavailable(String),

    #[error("nothing to export: no solid has been built or loaded")]
    NothingToExport,

    #[error(
        "all STEP write strategies failed; last transfer status {transfer:?}, write status {write:?}"
    )]
    ExportFailed {
        transfer: TransferStatus,
        write: WriteStatus,
    },

    #[error("staging file `{0}` missing after write")]
    StagingMissing(String),

    #[error("STEP read failed (NotText): payload is not valid text")]
    PayloadNotText,

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    StepRead(#[from] StepReadError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Session state for one worker.
pub struct WorkerSession {
    kernel: KernelState,
    builder: Box<dyn ModelBuilder + Send>,
    quality: MeshQuality,
    staging_file: String,
    last_solid: Option<SolidHandle>,
    vfs: VirtualFs,
}

impl WorkerSession {
    /// Session around a successfully initialized kernel.
    pub fn new(
        kernel: Box<dyn Kernel>,
        builder: Box<dyn ModelBuilder + Send>,
        quality: MeshQuality,
        staging_file: String,
    ) -> Self {
        Self {
            kernel: KernelState::Ready(kernel),
            builder,
            quality,
            staging_file,
            last_solid: None,
            vfs: VirtualFs::new(),
        }
    }

    /// Session whose kernel failed to initialize. Fatal for this worker:
    /// every kernel-touching request is answered with the stored message.
    pub fn failed(
        message: String,
        builder: Box<dyn ModelBuilder + Send>,
        quality: MeshQuality,
        staging_file: String,
    ) -> Self {
        Self {
            kernel: KernelState::Failed(message),
            builder,
            quality,
            staging_file,
            last_solid: None,
            vfs: VirtualFs::new(),
        }
    }

    /// Handle one request, always producing exactly one response.
    pub fn handle(&mut self, request: WorkerRequest) -> WorkerResponse {
        let id = request.id();
        match self.process(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(request = ?id, error = %e, "request failed");
                WorkerResponse::Error {
                    id,
                    message: e.to_string(),
                }
            }
        }
    }

    fn process(&mut self, request: WorkerRequest) -> Result<WorkerResponse, SessionError> {
        match request {
            WorkerRequest::Init { id } => {
                kernel_or_err(&mut self.kernel)?;
                Ok(WorkerResponse::Ready { id })
            }

            WorkerRequest::Build { id, source } => {
                let buffers = self.build_mesh(&source)?;
                tracing::debug!(
                    vertices = buffers.vertex_count(),
                    triangles = buffers.triangle_count(),
                    "build complete"
                );
                Ok(WorkerResponse::BuildResult { id, buffers })
            }

            WorkerRequest::ExportStep {
                id,
                filename,
                source,
            } => {
                if let Some(source) = source {
                    self.build_solid(&source)?;
                }
                let solid = self.last_solid.ok_or(SessionError::NothingToExport)?;
                let text = self.write_step_with_fallback(&solid)?;

                let filename = filename.unwrap_or_else(|| DEFAULT_EXPORT_FILE.to_string());
                let data = self.stage_round_trip(&filename, text.into_bytes())?;
                Ok(WorkerResponse::ExportStepResult { id, filename, data })
            }

            WorkerRequest::ExportStl { id, filename } => {
                let solid = self.last_solid.ok_or(SessionError::NothingToExport)?;
                let kernel = kernel_or_err(&mut self.kernel)?;
                let faces = kernel.triangulate(&solid, &self.quality)?;
                let buffers = extract_mesh(&faces)?;
                let stl = mesh_to_stl(&buffers);

                let filename = filename.unwrap_or_else(|| "model.stl".to_string());
                let data = self.stage_round_trip(&filename, stl)?;
                Ok(WorkerResponse::ExportStlResult { id, filename, data })
            }

            WorkerRequest::LoadStep { id, filename, data } => {
                let staging = filename.unwrap_or_else(|| self.staging_file.clone());
                let bytes = self.stage_round_trip(&staging, data)?;
                let text =
                    String::from_utf8(bytes).map_err(|_| SessionError::PayloadNotText)?;

                let kernel = kernel_or_err(&mut self.kernel)?;
                let solid = kernel.read_step(&text, &self.quality)?;
                if let Some(previous) = self.last_solid.replace(solid) {
                    kernel.release(previous);
                }

                let faces = kernel.triangulate(&solid, &self.quality)?;
                let buffers = extract_mesh(&faces)?;
                Ok(WorkerResponse::BuildResult { id, buffers })
            }
        }
    }

    /// Build a solid from source, replacing (and releasing) the last one.
    fn build_solid(&mut self, source: &str) -> Result<SolidHandle, SessionError> {
        let kernel = kernel_or_err(&mut self.kernel)?;
        let solid = self.builder.build(kernel, source)?;
        if let Some(previous) = self.last_solid.replace(solid) {
            kernel.release(previous);
        }
        Ok(solid)
    }

    fn build_mesh(&mut self, source: &str) -> Result<MeshBuffers, SessionError> {
        let solid = self.build_solid(source)?;
        let kernel = kernel_or_err(&mut self.kernel)?;
        let faces = kernel.triangulate(&solid, &self.quality)?;
        Ok(extract_mesh(&faces)?)
    }

    /// Try the fixed strategy order; first one that both transfers and
    /// writes wins. All failing keeps the last status pair for the error.
    fn write_step_with_fallback(&mut self, solid: &SolidHandle) -> Result<String, SessionError> {
        let kernel = kernel_or_err(&mut self.kernel)?;
        let mut last = None;
        for strategy in StepStrategy::ORDER {
            match kernel.write_step(solid, strategy) {
                Ok(text) => {
                    tracing::debug!(?strategy, "STEP export strategy succeeded");
                    return Ok(text);
                }
                Err(failure) => {
                    tracing::warn!(?strategy, %failure, "STEP export strategy failed");
                    last = Some(failure);
                }
            }
        }
        let failure = last.unwrap_or_else(|| {
            step_io::StepWriteFailure::transfer(TransferStatus::NoShape)
        });
        Err(SessionError::ExportFailed {
            transfer: failure.transfer,
            write: failure.write,
        })
    }

    /// Stage bytes under `name`, read them back, and remove the entry so a
    /// later call never sees a stale file.
    fn stage_round_trip(&mut self, name: &str, data: Vec<u8>) -> Result<Vec<u8>, SessionError> {
        self.vfs.write(name, data);
        let bytes = self
            .vfs
            .read(name)
            .ok_or_else(|| SessionError::StagingMissing(name.to_string()))?
            .to_vec();
        self.vfs.remove(name);
        Ok(bytes)
    }
}

fn kernel_or_err(state: &mut KernelState) -> Result<&mut dyn Kernel, SessionError> {
    match state {
        KernelState::Ready(kernel) => Ok(kernel.as_mut()),
        KernelState::Failed(message) => Err(SessionError::KernelUnavailable(message.clone())),
    }
}
