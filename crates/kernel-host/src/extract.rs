//! The build-and-mesh extraction engine.
//!
//! Turns per-face triangulations into flat vertex/index/normal buffers for
//! GPU rendering. Face-local node indices are offset by the running global
//! vertex count so the final index buffer addresses one shared concatenated
//! position array; winding follows each face's orientation; normals are flat
//! per-triangle values duplicated into the triangle's vertex slots.

use camber_types::{FaceTriangulation, MeshBuffers};

/// Errors from mesh extraction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// The walk completed without emitting any geometry: an empty solid or
    /// a triangulation that produced no surface. Must never silently become
    /// an empty mesh.
    #[error("no vertices extracted")]
    NoVertices,

    /// A face's triangle referenced a node index outside its node list.
    #[error("triangle index {index} out of range for face with {nodes} nodes")]
    IndexOutOfRange { index: u32, nodes: usize },
}

/// Assemble mesh buffers from face triangulations.
///
/// Faces with a null/empty triangulation are skipped; orientation correction
/// is applied per face, never globally.
pub fn extract_mesh(faces: &[FaceTriangulation]) -> Result<MeshBuffers, ExtractError> {
    let mut positions: Vec<f32> = Vec::new();
    let mut normals: Vec<f32> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut offset: u32 = 0;

    for face in faces {
        if face.is_empty() {
            continue;
        }

        for node in &face.nodes {
            positions.push(node[0] as f32);
            positions.push(node[1] as f32);
            positions.push(node[2] as f32);
        }
        normals.resize(positions.len(), 0.0);

        for tri in &face.triangles {
            let [a, b, c] = face.orientation.wind(*tri);
            for &i in &[a, b, c] {
                if i as usize >= face.nodes.len() {
                    return Err(ExtractError::IndexOutOfRange {
                        index: i,
                        nodes: face.nodes.len(),
                    });
                }
            }

            indices.push(offset + a);
            indices.push(offset + b);
            indices.push(offset + c);

            let n = flat_normal(
                face.nodes[a as usize],
                face.nodes[b as usize],
                face.nodes[c as usize],
            );
            for &i in &[a, b, c] {
                let slot = ((offset + i) * 3) as usize;
                normals[slot] = n[0];
                normals[slot + 1] = n[1];
                normals[slot + 2] = n[2];
            }
        }

        offset += face.nodes.len() as u32;
    }

    if positions.is_empty() {
        return Err(ExtractError::NoVertices);
    }

    Ok(MeshBuffers {
        positions,
        normals,
        indices,
    })
}

/// Flat triangle normal: normalized cross product of the two edge vectors.
fn flat_normal(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [f32; 3] {
    let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let nx = e1[1] * e2[2] - e1[2] * e2[1];
    let ny = e1[2] * e2[0] - e1[0] * e2[2];
    let nz = e1[0] * e2[1] - e1[1] * e2[0];
    let len = (nx * nx + ny * ny + nz * nz).sqrt();
    if len > 1e-12 {
        [(nx / len) as f32, (ny / len) as f32, (nz / len) as f32]
    } else {
        [0.0, 0.0, 0.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_types::FaceOrientation;

    fn quad(orientation: FaceOrientation, z: f64) -> FaceTriangulation {
        FaceTriangulation {
            orientation,
            nodes: vec![
                [0.0, 0.0, z],
                [1.0, 0.0, z],
                [1.0, 1.0, z],
                [0.0, 1.0, z],
            ],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    #[test]
    fn empty_face_list_is_no_vertices() {
        assert_eq!(extract_mesh(&[]).unwrap_err(), ExtractError::NoVertices);
    }

    #[test]
    fn all_empty_faces_is_no_vertices() {
        let face = FaceTriangulation {
            orientation: FaceOrientation::Forward,
            nodes: vec![],
            triangles: vec![],
        };
        assert_eq!(
            extract_mesh(&[face]).unwrap_err(),
            ExtractError::NoVertices
        );
    }

    #[test]
    fn forward_face_keeps_winding() {
        let mesh = extract_mesh(&[quad(FaceOrientation::Forward, 0.0)]).unwrap();
        assert_eq!(&mesh.indices[..3], &[0, 1, 2]);
        assert_eq!(&mesh.indices[3..], &[0, 2, 3]);
    }

    #[test]
    fn reversed_face_swaps_winding_per_triangle() {
        let mesh = extract_mesh(&[quad(FaceOrientation::Reversed, 0.0)]).unwrap();
        assert_eq!(&mesh.indices[..3], &[0, 2, 1]);
        assert_eq!(&mesh.indices[3..], &[0, 3, 2]);
    }

    #[test]
    fn orientation_is_corrected_per_face_not_globally() {
        let mesh = extract_mesh(&[
            quad(FaceOrientation::Forward, 0.0),
            quad(FaceOrientation::Reversed, 1.0),
        ])
        .unwrap();
        // Forward face at base 0, reversed face offset by 4 nodes.
        assert_eq!(&mesh.indices[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(&mesh.indices[6..], &[4, 6, 5, 4, 7, 6]);
    }

    #[test]
    fn vertex_offsets_are_monotonic() {
        let faces = vec![
            quad(FaceOrientation::Forward, 0.0),
            quad(FaceOrientation::Forward, 1.0),
            quad(FaceOrientation::Forward, 2.0),
        ];
        let mesh = extract_mesh(&faces).unwrap();

        // Indices for face k must all be >= the vertex total of faces 1..k-1.
        for (k, chunk) in mesh.indices.chunks(6).enumerate() {
            let base = (k * 4) as u32;
            assert!(chunk.iter().all(|&i| i >= base && i < base + 4));
        }
        // Position length is 3x the summed per-face node counts.
        let node_total: usize = faces.iter().map(|f| f.nodes.len()).sum();
        assert_eq!(mesh.positions.len(), node_total * 3);
    }

    #[test]
    fn flat_normals_duplicated_per_vertex() {
        let mesh = extract_mesh(&[quad(FaceOrientation::Forward, 0.0)]).unwrap();
        // Planar +Z quad: every vertex slot carries (0, 0, 1).
        for v in 0..4 {
            assert_eq!(&mesh.normals[v * 3..v * 3 + 3], &[0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn reversed_face_flat_normal_flips() {
        let mesh = extract_mesh(&[quad(FaceOrientation::Reversed, 0.0)]).unwrap();
        for v in 0..4 {
            assert_eq!(&mesh.normals[v * 3..v * 3 + 3], &[0.0, 0.0, -1.0]);
        }
    }

    #[test]
    fn out_of_range_triangle_index_is_reported() {
        let face = FaceTriangulation {
            orientation: FaceOrientation::Forward,
            nodes: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            triangles: vec![[0, 1, 7]],
        };
        assert_eq!(
            extract_mesh(&[face]).unwrap_err(),
            ExtractError::IndexOutOfRange { index: 7, nodes: 3 }
        );
    }

    #[test]
    fn skips_empty_faces_between_real_ones() {
        let empty = FaceTriangulation {
            orientation: FaceOrientation::Forward,
            nodes: vec![],
            triangles: vec![],
        };
        let mesh = extract_mesh(&[
            quad(FaceOrientation::Forward, 0.0),
            empty,
            quad(FaceOrientation::Forward, 1.0),
        ])
        .unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 4);
    }
}
