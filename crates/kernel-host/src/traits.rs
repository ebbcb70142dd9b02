use camber_types::{FaceTriangulation, MeshQuality};
use step_io::{StepReadError, StepStrategy, StepWriteFailure};

/// Opaque handle to a solid held by the kernel.
/// NEVER persisted. Valid only for the owning kernel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolidHandle(pub(crate) u64);

impl SolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("construction failed: {reason}")]
    Construction { reason: String },

    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("triangulation failed: {reason}")]
    TriangulationFailed { reason: String },

    #[error("unknown solid handle {0:?}")]
    UnknownSolid(SolidHandle),

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

/// Core geometry kernel trait: shape construction, booleans, transforms,
/// triangulation, and STEP read/write.
///
/// Implemented by [`crate::TruckKernel`] (real B-Rep kernel) and
/// [`crate::MockKernel`] (deterministic test double). Object-safe so the
/// worker can hold a `Box<dyn Kernel>` chosen at startup.
///
/// Kernels are single-threaded and non-reentrant; callers serialize access.
pub trait Kernel {
    /// Axis-aligned box from the origin to `(dx, dy, dz)`.
    fn make_box(&mut self, dx: f64, dy: f64, dz: f64) -> Result<SolidHandle, KernelError>;

    /// Cylinder with its base centered at the origin, extending along +Z.
    fn make_cylinder(&mut self, radius: f64, height: f64) -> Result<SolidHandle, KernelError>;

    /// Sphere centered at the origin.
    fn make_sphere(&mut self, radius: f64) -> Result<SolidHandle, KernelError>;

    /// Translate a solid, producing a new solid.
    fn translate(
        &mut self,
        solid: &SolidHandle,
        offset: [f64; 3],
    ) -> Result<SolidHandle, KernelError>;

    /// Rotate a solid around an axis through `origin`, angle in radians.
    fn rotate(
        &mut self,
        solid: &SolidHandle,
        origin: [f64; 3],
        axis: [f64; 3],
        angle: f64,
    ) -> Result<SolidHandle, KernelError>;

    /// Boolean union of two solids.
    fn boolean_union(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError>;

    /// Boolean subtraction: `a` minus `b`.
    fn boolean_subtract(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError>;

    /// Boolean intersection of two solids.
    fn boolean_intersect(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError>;

    /// Triangulate a solid into per-face triangulations in global
    /// coordinates. A kernel that cannot complete triangulation reports
    /// [`KernelError::TriangulationFailed`]; a zero-face solid yields an
    /// empty list, which the extraction engine turns into its own error.
    fn triangulate(
        &mut self,
        solid: &SolidHandle,
        quality: &MeshQuality,
    ) -> Result<Vec<FaceTriangulation>, KernelError>;

    /// Serialize a solid to STEP text using one model-type strategy.
    /// Failures carry the transfer/write status pair for diagnostics; an
    /// unknown handle reports a `NoShape` transfer.
    fn write_step(
        &mut self,
        solid: &SolidHandle,
        strategy: StepStrategy,
    ) -> Result<String, StepWriteFailure>;

    /// Read STEP text, transferring all root shells into one working solid.
    fn read_step(
        &mut self,
        text: &str,
        quality: &MeshQuality,
    ) -> Result<SolidHandle, StepReadError>;

    /// Release a solid. Unknown handles are ignored.
    fn release(&mut self, solid: SolidHandle);
}
