use serde::{Deserialize, Serialize};

/// STEP model-type strategies for export, tried in this fixed order.
///
/// First strategy that both transfers and writes wins; the order is part of
/// the protocol contract and must not be reshuffled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStrategy {
    /// Write the shape in whatever representation it already has.
    AsIs,
    /// Require a single closed shell and write it as a manifold solid B-Rep.
    ManifoldSolidBrep,
    /// Triangulate and write planar facets (lossy, always representable).
    FacetedBrep,
}

impl StepStrategy {
    /// The fixed trial order for export.
    pub const ORDER: [StepStrategy; 3] = [
        StepStrategy::AsIs,
        StepStrategy::ManifoldSolidBrep,
        StepStrategy::FacetedBrep,
    ];
}

/// Outcome of moving a shape into a strategy's representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    Done,
    /// The shape has no boundary shells to transfer.
    NoShape,
    /// The strategy needs a single closed shell and the shape has several
    /// (or none).
    NotManifold,
    /// Triangulation produced no facets to transfer.
    NoFacets,
}

/// Outcome of rendering the transferred representation to Part 21 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteStatus {
    Done,
    /// The writer produced no output.
    Empty,
    /// Writing was not reached because the transfer failed.
    NotAttempted,
}

/// A single strategy's failure, carrying both status codes so callers can
/// distinguish "nothing to export" from "kernel rejected the geometry".
#[derive(Debug, Clone, thiserror::Error)]
#[error("STEP write failed: transfer status {transfer:?}, write status {write:?}")]
pub struct StepWriteFailure {
    pub transfer: TransferStatus,
    pub write: WriteStatus,
}

impl StepWriteFailure {
    pub fn transfer(status: TransferStatus) -> Self {
        Self {
            transfer: status,
            write: WriteStatus::NotAttempted,
        }
    }

    pub fn write(status: WriteStatus) -> Self {
        Self {
            transfer: TransferStatus::Done,
            write: status,
        }
    }
}

/// Status of a STEP read, reported when the read does not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadStatus {
    /// The payload is not text (STEP files are ASCII).
    NotText,
    /// The Part 21 syntax did not parse.
    SyntaxError,
    /// The exchange structure has no DATA section.
    NoDataSection,
    /// Parsing succeeded but zero root shells transferred.
    ZeroRoots,
    /// Roots transferred but produced no surface geometry.
    EmptyShape,
}

/// Errors from reading STEP bytes back into kernel geometry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StepReadError {
    #[error("STEP read failed ({status:?}): {detail}")]
    Failed { status: ReadStatus, detail: String },
}

impl StepReadError {
    pub fn new(status: ReadStatus, detail: impl Into<String>) -> Self {
        Self::Failed {
            status,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> ReadStatus {
        match self {
            Self::Failed { status, .. } => *status,
        }
    }
}
