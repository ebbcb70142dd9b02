//! Wire messages between the UI side and the geometry worker.
//!
//! Serialized as internally-tagged JSON (`"type": "build"`, ...) so the
//! protocol is inspectable and host-agnostic; in process the enums move
//! through channels untouched, which is what makes the buffer hand-off
//! zero-copy. Binary payloads are base64 when serialized.

use camber_types::MeshBuffers;
use serde::{Deserialize, Serialize};

/// Serde helper for binary payloads: base64 text on the wire, raw bytes in
/// memory.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}

/// Requests into the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerRequest {
    /// Explicit warm-up; answered with `ready`.
    Init { id: Option<u64> },

    /// Execute model source and mesh the result.
    Build { id: u64, source: String },

    /// Serialize the last built/loaded solid to STEP. When `source` is
    /// present, build it first.
    ExportStep {
        id: u64,
        filename: Option<String>,
        source: Option<String>,
    },

    /// Triangulate the last built/loaded solid and return binary STL.
    ExportStl { id: u64, filename: Option<String> },

    /// Stage the bytes, read them back as STEP, and mesh the result.
    LoadStep {
        id: u64,
        filename: Option<String>,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
}

impl WorkerRequest {
    /// The correlation id the response must echo.
    pub fn id(&self) -> Option<u64> {
        match self {
            WorkerRequest::Init { id } => *id,
            WorkerRequest::Build { id, .. }
            | WorkerRequest::ExportStep { id, .. }
            | WorkerRequest::ExportStl { id, .. }
            | WorkerRequest::LoadStep { id, .. } => Some(*id),
        }
    }
}

/// Responses out of the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerResponse {
    /// Kernel is initialized. Sent unsolicited (no id) once at startup, and
    /// with an id in answer to `init`.
    Ready { id: Option<u64> },

    /// Mesh buffers for a `build` or `loadStep` request.
    BuildResult {
        id: u64,
        #[serde(flatten)]
        buffers: MeshBuffers,
    },

    /// STEP bytes for an `exportStep` request.
    ExportStepResult {
        id: u64,
        filename: String,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },

    /// STL bytes for an `exportStl` request.
    ExportStlResult {
        id: u64,
        filename: String,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },

    /// Any failure, echoing the originating id (absent only for a fatal
    /// startup failure).
    Error { id: Option<u64>, message: String },
}

impl WorkerResponse {
    /// The echoed correlation id, if any.
    pub fn id(&self) -> Option<u64> {
        match self {
            WorkerResponse::Ready { id } | WorkerResponse::Error { id, .. } => *id,
            WorkerResponse::BuildResult { id, .. }
            | WorkerResponse::ExportStepResult { id, .. }
            | WorkerResponse::ExportStlResult { id, .. } => Some(*id),
        }
    }

    /// Wire name of the response kind, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            WorkerResponse::Ready { .. } => "ready",
            WorkerResponse::BuildResult { .. } => "buildResult",
            WorkerResponse::ExportStepResult { .. } => "exportStepResult",
            WorkerResponse::ExportStlResult { .. } => "exportStlResult",
            WorkerResponse::Error { .. } => "error",
        }
    }
}
