//! The CAD kernel boundary: an object-safe [`Kernel`] trait, the real
//! truck-backed implementation, a deterministic mock for tests, and the
//! build-and-mesh extraction engine that turns face triangulations into
//! renderable buffers.

pub mod extract;
pub mod mock_kernel;
pub mod tessellation;
pub mod traits;
pub mod truck_kernel;
pub mod truck_step;

pub use extract::{extract_mesh, ExtractError};
pub use mock_kernel::MockKernel;
pub use traits::{Kernel, KernelError, SolidHandle};
pub use truck_kernel::TruckKernel;
