//! Viewer-side geometry reconstruction.
//!
//! Consumes transferred mesh buffers and builds a renderable geometry:
//! smooth vertex normals recomputed from the index buffer (the flat normals
//! in the buffers exist for triangle-level consumers; shading wants smooth),
//! plus bounding box and bounding sphere.

use camber_types::MeshBuffers;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: [f32; 3],
    pub radius: f32,
}

/// A renderable mesh: positions and indices from the worker, normals and
/// bounds recomputed on arrival. Replaced wholesale on each successful
/// build; the viewer disposes the previous one.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    pub bounding_box: BoundingBox,
    pub bounding_sphere: BoundingSphere,
}

/// Build a geometry from transferred buffers. Consumes the buffers; the
/// receiver is their sole owner after transfer.
pub fn rebuild_geometry(buffers: MeshBuffers) -> Geometry {
    let MeshBuffers {
        positions, indices, ..
    } = buffers;

    let normals = compute_vertex_normals(&positions, &indices);
    let bounding_box = compute_bounding_box(&positions);
    let bounding_sphere = compute_bounding_sphere(&positions, &bounding_box);

    Geometry {
        positions,
        normals,
        indices,
        bounding_box,
        bounding_sphere,
    }
}

/// Smooth per-vertex normals: accumulate area-weighted triangle normals
/// into each referenced vertex, then normalize.
pub fn compute_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let mut normals = vec![0.0f32; positions.len()];

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let v0 = [positions[i0 * 3], positions[i0 * 3 + 1], positions[i0 * 3 + 2]];
        let v1 = [positions[i1 * 3], positions[i1 * 3 + 1], positions[i1 * 3 + 2]];
        let v2 = [positions[i2 * 3], positions[i2 * 3 + 1], positions[i2 * 3 + 2]];

        let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        // Unnormalized cross product: magnitude carries the area weight.
        let n = [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ];

        for &i in &[i0, i1, i2] {
            normals[i * 3] += n[0];
            normals[i * 3 + 1] += n[1];
            normals[i * 3 + 2] += n[2];
        }
    }

    for n in normals.chunks_exact_mut(3) {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len > 1e-12 {
            n[0] /= len;
            n[1] /= len;
            n[2] /= len;
        } else {
            n[0] = 0.0;
            n[1] = 0.0;
            n[2] = 1.0;
        }
    }

    normals
}

fn compute_bounding_box(positions: &[f32]) -> BoundingBox {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for p in positions.chunks_exact(3) {
        for i in 0..3 {
            min[i] = min[i].min(p[i]);
            max[i] = max[i].max(p[i]);
        }
    }
    if positions.is_empty() {
        return BoundingBox {
            min: [0.0; 3],
            max: [0.0; 3],
        };
    }
    BoundingBox { min, max }
}

fn compute_bounding_sphere(positions: &[f32], bbox: &BoundingBox) -> BoundingSphere {
    let center = bbox.center();
    let mut radius_sq = 0.0f32;
    for p in positions.chunks_exact(3) {
        let dx = p[0] - center[0];
        let dy = p[1] - center[1];
        let dz = p[2] - center[2];
        radius_sq = radius_sq.max(dx * dx + dy * dy + dz * dz);
    }
    BoundingSphere {
        center,
        radius: radius_sq.sqrt(),
    }
}
