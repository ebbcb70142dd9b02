//! Binary STL writer for mesh buffers.

use camber_types::MeshBuffers;

/// Convert mesh buffers to binary STL.
///
/// Binary STL layout:
/// - 80 bytes: header
/// - 4 bytes: u32 LE triangle count
/// - Per triangle (50 bytes each):
///   - 12 bytes: normal vector (3 × f32 LE)
///   - 36 bytes: 3 vertices (3 × 3 × f32 LE)
///   - 2 bytes: attribute byte count (0u16)
pub fn mesh_to_stl(mesh: &MeshBuffers) -> Vec<u8> {
    let tri_count = mesh.indices.len() / 3;
    let mut buf = Vec::with_capacity(84 + tri_count * 50);

    let header = b"Camber STL Export";
    buf.extend_from_slice(header);
    buf.extend_from_slice(&[0u8; 80 - 17]); // zero-pad to 80 bytes

    buf.extend_from_slice(&(tri_count as u32).to_le_bytes());

    for t in 0..tri_count {
        let i0 = mesh.indices[t * 3] as usize;
        let i1 = mesh.indices[t * 3 + 1] as usize;
        let i2 = mesh.indices[t * 3 + 2] as usize;

        let v0 = vertex(mesh, i0);
        let v1 = vertex(mesh, i1);
        let v2 = vertex(mesh, i2);

        // Face normal from the two edge vectors.
        let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        let nx = e1[1] * e2[2] - e1[2] * e2[1];
        let ny = e1[2] * e2[0] - e1[0] * e2[2];
        let nz = e1[0] * e2[1] - e1[1] * e2[0];
        let len = (nx * nx + ny * ny + nz * nz).sqrt();
        let normal = if len > 1e-12 {
            [nx / len, ny / len, nz / len]
        } else {
            [0.0, 0.0, 0.0]
        };

        for c in &normal {
            buf.extend_from_slice(&c.to_le_bytes());
        }
        for v in &[v0, v1, v2] {
            for c in v {
                buf.extend_from_slice(&c.to_le_bytes());
            }
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }

    buf
}

fn vertex(mesh: &MeshBuffers, i: usize) -> [f32; 3] {
    [
        mesh.positions[i * 3],
        mesh.positions[i * 3 + 1],
        mesh.positions[i * 3 + 2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stl_export_empty_mesh() {
        let mesh = MeshBuffers {
            positions: vec![],
            normals: vec![],
            indices: vec![],
        };
        let stl = mesh_to_stl(&mesh);
        assert_eq!(stl.len(), 84);
        assert!(stl[..17].starts_with(b"Camber STL Export"));
        assert_eq!(u32::from_le_bytes([stl[80], stl[81], stl[82], stl[83]]), 0);
    }

    #[test]
    fn stl_export_single_triangle() {
        let mesh = MeshBuffers {
            positions: vec![
                0.0, 0.0, 0.0, // v0
                1.0, 0.0, 0.0, // v1
                0.0, 1.0, 0.0, // v2
            ],
            normals: vec![],
            indices: vec![0, 1, 2],
        };
        let stl = mesh_to_stl(&mesh);
        // 84 header + 1 * 50 = 134
        assert_eq!(stl.len(), 134);
        assert_eq!(u32::from_le_bytes([stl[80], stl[81], stl[82], stl[83]]), 1);

        // Normal should be (0, 0, 1), the cross product of (1,0,0)×(0,1,0).
        let nz = f32::from_le_bytes([stl[92], stl[93], stl[94], stl[95]]);
        assert!((nz - 1.0).abs() < 1e-6);
    }

    #[test]
    fn stl_export_quad() {
        let mesh = MeshBuffers {
            positions: vec![
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                1.0, 1.0, 0.0, //
                0.0, 1.0, 0.0,
            ],
            normals: vec![],
            indices: vec![0, 1, 2, 0, 2, 3],
        };
        let stl = mesh_to_stl(&mesh);
        assert_eq!(stl.len(), 184);
        assert_eq!(u32::from_le_bytes([stl[80], stl[81], stl[82], stl[83]]), 2);
    }
}
