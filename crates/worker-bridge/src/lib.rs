//! The worker protocol and both of its ends.
//!
//! One background thread owns the CAD kernel and serializes every kernel
//! operation; the main thread talks to it through correlation-id'd messages
//! over channels (the channel endpoints play the role of `postMessage`, and
//! moving a buffer through them is the zero-copy transfer). On top of the
//! raw client sits the viewer bridge: geometry reconstruction with smooth
//! normals and bounding volumes, keep-last-render-on-error, and discarding
//! of superseded responses.

pub mod client;
pub mod geometry;
pub mod messages;
pub mod session;
pub mod vfs;
pub mod viewer;
pub mod worker;

pub use client::{ExportedFile, PendingReply, WorkerClient, WorkerError};
pub use geometry::{rebuild_geometry, BoundingBox, BoundingSphere, Geometry};
pub use messages::{WorkerRequest, WorkerResponse};
pub use viewer::{Viewer, ViewerBridge};
pub use worker::{GeometryWorker, WorkerConfig};
