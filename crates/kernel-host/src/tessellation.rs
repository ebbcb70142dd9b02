//! Truck triangulation adapters.
//!
//! Meshes a truck solid at the session tolerance and converts each meshed
//! face into the kernel-neutral `FaceTriangulation`. Truck emits node
//! coordinates in model space, so face placements are already folded in.

use camber_types::{FaceOrientation, FaceTriangulation, MeshQuality};
use truck_meshalgo::prelude::*;

use crate::traits::KernelError;

type TruckSolid = truck_modeling::Solid;

/// Triangulate a truck solid into per-face triangulations.
///
/// Faces whose triangulation came back null are skipped here; the extraction
/// engine decides whether the remainder amounts to an empty mesh. Truck's
/// mesher consumes the linear deflection only; the angular tolerance in
/// `MeshQuality` is carried for kernels that honor it.
pub fn triangulate_solid(
    solid: &TruckSolid,
    quality: &MeshQuality,
) -> Result<Vec<FaceTriangulation>, KernelError> {
    let meshed_solid = solid.triangulation(quality.deflection);

    let mut faces = Vec::new();
    for shell in meshed_solid.boundaries().iter() {
        for face in shell.face_iter() {
            let maybe_mesh: Option<PolygonMesh> = face.surface();
            let Some(face_mesh) = maybe_mesh else {
                continue;
            };
            let orientation = if face.orientation() {
                FaceOrientation::Forward
            } else {
                FaceOrientation::Reversed
            };
            faces.push(face_triangulation(&face_mesh, orientation));
        }
    }
    Ok(faces)
}

/// Convert one truck `PolygonMesh` into a `FaceTriangulation`.
pub fn face_triangulation(mesh: &PolygonMesh, orientation: FaceOrientation) -> FaceTriangulation {
    let nodes: Vec<[f64; 3]> = mesh
        .positions()
        .iter()
        .map(|p| [p.x, p.y, p.z])
        .collect();

    let triangles: Vec<[u32; 3]> = mesh
        .tri_faces()
        .iter()
        .map(|tri| [tri[0].pos as u32, tri[1].pos as u32, tri[2].pos as u32])
        .collect();

    FaceTriangulation {
        orientation,
        nodes,
        triangles,
    }
}
