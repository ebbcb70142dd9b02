//! STEP and STL format plumbing shared by the kernel backends.
//!
//! This crate is deliberately kernel-free: it holds the status vocabulary for
//! STEP transfer/write/read outcomes, a hand-rolled faceted-B-Rep Part 21
//! writer (the last-resort export strategy), a binary STL writer, and export
//! filename sanitation. Writers operate on the shared `camber-types` data.

pub mod errors;
pub mod faceted;
pub mod filename;
pub mod stl;

pub use errors::{ReadStatus, StepReadError, StepStrategy, StepWriteFailure, TransferStatus, WriteStatus};
pub use faceted::write_faceted_step;
pub use filename::sanitize_step_filename;
pub use stl::mesh_to_stl;
