//! Shared data model for the camber geometry pipeline.
//!
//! Everything that crosses a crate boundary more than once lives here:
//! the transferable mesh buffers, face orientation (and the winding rule
//! derived from it), per-face triangulations, and mesh quality settings.

use serde::{Deserialize, Serialize};

/// Triangle mesh buffers in GPU-ready layout.
///
/// Flat arrays: 3 floats per vertex position, 3 floats per vertex normal
/// (flat, per-triangle normals duplicated into each vertex slot), 3 indices
/// per triangle. Produced once per build or STEP load; ownership moves to the
/// receiver and the buffers are never mutated afterwards. A new build
/// produces a brand-new triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffers {
    /// Vertex positions `[x0, y0, z0, x1, y1, z1, ...]`.
    pub positions: Vec<f32>,
    /// Vertex normals `[nx0, ny0, nz0, ...]`, same length as `positions`.
    pub normals: Vec<f32>,
    /// Triangle indices into the shared position array.
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    /// Number of vertices in the position array.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles in the index array.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Orientation of a face relative to its underlying surface.
///
/// A reversed face's outward side is the surface's back side, so its
/// triangles must be wound in the opposite order to keep outward normals
/// consistent. Winding is a pure function of this enum and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceOrientation {
    Forward,
    Reversed,
}

impl FaceOrientation {
    /// Apply the winding rule to one triangle's node indices.
    ///
    /// Forward faces keep `(n1, n2, n3)`; reversed faces emit `(n1, n3, n2)`.
    pub fn wind(self, [a, b, c]: [u32; 3]) -> [u32; 3] {
        match self {
            FaceOrientation::Forward => [a, b, c],
            FaceOrientation::Reversed => [a, c, b],
        }
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, FaceOrientation::Reversed)
    }
}

/// One face's triangulation, in global coordinates.
///
/// Kernel adapters fold any face-local placement into the node coordinates
/// before handing the face over, so consumers never see kernel transforms.
/// `triangles` index into `nodes`; winding correction has NOT been applied
/// yet, that is the extraction engine's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceTriangulation {
    pub orientation: FaceOrientation,
    pub nodes: Vec<[f64; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

impl FaceTriangulation {
    /// A face whose triangulation produced no geometry.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() || self.triangles.is_empty()
    }
}

/// Triangulation tolerances for interactive preview meshing.
///
/// Coarse enough for interactive preview, not precision export meshing.
/// The linear deflection is the maximum distance between the true surface
/// and its triangulation; the angular deflection bounds the angle between
/// adjacent facet normals (consumed by kernels that honor it).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshQuality {
    /// Linear deflection in model length units.
    pub deflection: f64,
    /// Angular deflection in radians.
    pub angular: f64,
}

impl Default for MeshQuality {
    fn default() -> Self {
        Self {
            deflection: 0.1,
            angular: 0.5,
        }
    }
}
