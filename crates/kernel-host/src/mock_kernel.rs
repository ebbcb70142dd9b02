//! `MockKernel` — deterministic test double implementing [`Kernel`].
//!
//! Shapes are synthetic face sets with predictable node/triangle counts: a
//! box is a single 8-node, 12-triangle face set, so the canonical unit-cube
//! expectations (24 position floats, 36 indices, axis-aligned flat normals)
//! hold without a real mesher. Boolean subtraction flips the tool's faces to
//! `Reversed`, which exercises per-face orientation correction downstream.

use std::collections::HashMap;

use camber_types::{FaceOrientation, FaceTriangulation, MeshQuality};
use step_io::{
    write_faceted_step, ReadStatus, StepReadError, StepStrategy, StepWriteFailure, TransferStatus,
};

use crate::traits::{Kernel, KernelError, SolidHandle};

#[derive(Debug, Clone)]
struct MockSolid {
    faces: Vec<FaceTriangulation>,
}

/// Deterministic test double for the geometry kernel.
pub struct MockKernel {
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            solids: HashMap::new(),
        }
    }

    fn store(&mut self, solid: MockSolid) -> SolidHandle {
        let handle = SolidHandle(self.next_handle);
        self.next_handle += 1;
        self.solids.insert(handle.id(), solid);
        handle
    }

    fn solid(&self, handle: &SolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or(KernelError::UnknownSolid(*handle))
    }

    /// A box as one shared-vertex face set: 8 nodes, 12 outward triangles.
    fn box_faces(dx: f64, dy: f64, dz: f64) -> Vec<FaceTriangulation> {
        let nodes = vec![
            [0.0, 0.0, 0.0],
            [dx, 0.0, 0.0],
            [dx, dy, 0.0],
            [0.0, dy, 0.0],
            [0.0, 0.0, dz],
            [dx, 0.0, dz],
            [dx, dy, dz],
            [0.0, dy, dz],
        ];
        let triangles = vec![
            [0, 2, 1],
            [0, 3, 2], // bottom (-z)
            [4, 5, 6],
            [4, 6, 7], // top (+z)
            [0, 1, 5],
            [0, 5, 4], // front (-y)
            [3, 7, 6],
            [3, 6, 2], // back (+y)
            [0, 4, 7],
            [0, 7, 3], // left (-x)
            [1, 2, 6],
            [1, 6, 5], // right (+x)
        ];
        vec![FaceTriangulation {
            orientation: FaceOrientation::Forward,
            nodes,
            triangles,
        }]
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for MockKernel {
    fn make_box(&mut self, dx: f64, dy: f64, dz: f64) -> Result<SolidHandle, KernelError> {
        check_positive("box dimensions", &[dx, dy, dz])?;
        Ok(self.store(MockSolid {
            faces: Self::box_faces(dx, dy, dz),
        }))
    }

    fn make_cylinder(&mut self, radius: f64, height: f64) -> Result<SolidHandle, KernelError> {
        check_positive("cylinder radius/height", &[radius, height])?;
        // Deterministic box stand-in spanning the cylinder's extents.
        let mut faces = Self::box_faces(2.0 * radius, 2.0 * radius, height);
        offset_faces(&mut faces, [-radius, -radius, 0.0]);
        Ok(self.store(MockSolid { faces }))
    }

    fn make_sphere(&mut self, radius: f64) -> Result<SolidHandle, KernelError> {
        check_positive("sphere radius", &[radius])?;
        let mut faces = Self::box_faces(2.0 * radius, 2.0 * radius, 2.0 * radius);
        offset_faces(&mut faces, [-radius, -radius, -radius]);
        Ok(self.store(MockSolid { faces }))
    }

    fn translate(
        &mut self,
        solid: &SolidHandle,
        offset: [f64; 3],
    ) -> Result<SolidHandle, KernelError> {
        let mut faces = self.solid(solid)?.faces.clone();
        offset_faces(&mut faces, offset);
        Ok(self.store(MockSolid { faces }))
    }

    fn rotate(
        &mut self,
        solid: &SolidHandle,
        origin: [f64; 3],
        axis: [f64; 3],
        angle: f64,
    ) -> Result<SolidHandle, KernelError> {
        let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
        if len < 1e-12 {
            return Err(KernelError::Construction {
                reason: "rotation axis has zero length".to_string(),
            });
        }
        let k = [axis[0] / len, axis[1] / len, axis[2] / len];

        let mut faces = self.solid(solid)?.faces.clone();
        for face in &mut faces {
            for node in &mut face.nodes {
                *node = rotate_about(*node, origin, k, angle);
            }
        }
        Ok(self.store(MockSolid { faces }))
    }

    fn boolean_union(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        let mut faces = self.solid(a)?.faces.clone();
        faces.extend(self.solid(b)?.faces.clone());
        Ok(self.store(MockSolid { faces }))
    }

    fn boolean_subtract(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        let mut faces = self.solid(a)?.faces.clone();
        // Tool faces become the cavity boundary: reversed orientation.
        let mut tool = self.solid(b)?.faces.clone();
        for face in &mut tool {
            face.orientation = FaceOrientation::Reversed;
        }
        faces.extend(tool);
        Ok(self.store(MockSolid { faces }))
    }

    fn boolean_intersect(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        self.solid(a)?;
        self.solid(b)?;
        // Deterministic stand-in for the overlap region.
        Ok(self.store(MockSolid {
            faces: Self::box_faces(0.5, 0.5, 0.5),
        }))
    }

    fn triangulate(
        &mut self,
        solid: &SolidHandle,
        _quality: &MeshQuality,
    ) -> Result<Vec<FaceTriangulation>, KernelError> {
        Ok(self.solid(solid)?.faces.clone())
    }

    fn write_step(
        &mut self,
        solid: &SolidHandle,
        _strategy: StepStrategy,
    ) -> Result<String, StepWriteFailure> {
        let Some(mock) = self.solids.get(&solid.id()) else {
            return Err(StepWriteFailure::transfer(TransferStatus::NoShape));
        };
        write_faceted_step(&mock.faces, "mock.step")
    }

    fn read_step(
        &mut self,
        text: &str,
        _quality: &MeshQuality,
    ) -> Result<SolidHandle, StepReadError> {
        let trimmed = text.trim_start();
        if !trimmed.starts_with("ISO-10303-21") {
            return Err(StepReadError::new(
                ReadStatus::SyntaxError,
                "missing ISO-10303-21 header",
            ));
        }
        if !text.contains("END-ISO-10303-21") {
            return Err(StepReadError::new(
                ReadStatus::SyntaxError,
                "unexpected end of file",
            ));
        }
        let roots = text.matches("CLOSED_SHELL").count();
        if roots == 0 {
            return Err(StepReadError::new(
                ReadStatus::ZeroRoots,
                "no root shells in DATA section",
            ));
        }
        if !text.contains("CARTESIAN_POINT") {
            return Err(StepReadError::new(
                ReadStatus::EmptyShape,
                "roots carry no geometry",
            ));
        }
        Ok(self.store(MockSolid {
            faces: Self::box_faces(1.0, 1.0, 1.0),
        }))
    }

    fn release(&mut self, solid: SolidHandle) {
        self.solids.remove(&solid.id());
    }
}

fn check_positive(what: &str, values: &[f64]) -> Result<(), KernelError> {
    if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return Err(KernelError::Construction {
            reason: format!("{what} must be positive and finite"),
        });
    }
    Ok(())
}

fn offset_faces(faces: &mut [FaceTriangulation], offset: [f64; 3]) {
    for face in faces {
        for node in &mut face.nodes {
            node[0] += offset[0];
            node[1] += offset[1];
            node[2] += offset[2];
        }
    }
}

/// Rodrigues rotation of a point around an axis through `origin`.
fn rotate_about(p: [f64; 3], origin: [f64; 3], k: [f64; 3], angle: f64) -> [f64; 3] {
    let v = [p[0] - origin[0], p[1] - origin[1], p[2] - origin[2]];
    let (sin, cos) = angle.sin_cos();
    let kxv = [
        k[1] * v[2] - k[2] * v[1],
        k[2] * v[0] - k[0] * v[2],
        k[0] * v[1] - k[1] * v[0],
    ];
    let kdotv = k[0] * v[0] + k[1] * v[1] + k[2] * v[2];
    let mut out = [0.0; 3];
    for i in 0..3 {
        out[i] = origin[i] + v[i] * cos + kxv[i] * sin + k[i] * kdotv * (1.0 - cos);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_mesh;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn unit_box_matches_canonical_cube_counts() {
        let mut kernel = MockKernel::new();
        let handle = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let faces = kernel.triangulate(&handle, &MeshQuality::default()).unwrap();
        let mesh = extract_mesh(&faces).unwrap();

        assert_eq!(mesh.positions.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
    }

    #[test]
    fn unit_box_flat_normals_are_axis_aligned() {
        let mut kernel = MockKernel::new();
        let handle = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let faces = kernel.triangulate(&handle, &MeshQuality::default()).unwrap();
        let mesh = extract_mesh(&faces).unwrap();

        for n in mesh.normals.chunks(3) {
            let is_axis = [
                [1.0, 0.0, 0.0],
                [-1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, -1.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.0, 0.0, -1.0],
            ]
            .iter()
            .any(|axis| {
                (n[0] - axis[0]).abs() < 1e-6
                    && (n[1] - axis[1]).abs() < 1e-6
                    && (n[2] - axis[2]).abs() < 1e-6
            });
            assert!(is_axis, "normal {n:?} is not a canonical axis vector");
        }
    }

    #[test]
    fn subtract_produces_mixed_orientations() {
        let mut kernel = MockKernel::new();
        let base = kernel.make_box(2.0, 2.0, 2.0).unwrap();
        let tool = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let result = kernel.boolean_subtract(&base, &tool).unwrap();

        let faces = kernel.triangulate(&result, &MeshQuality::default()).unwrap();
        assert!(faces.iter().any(|f| !f.orientation.is_reversed()));
        assert!(faces.iter().any(|f| f.orientation.is_reversed()));
    }

    #[test]
    fn union_merges_face_sets() {
        let mut kernel = MockKernel::new();
        let a = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let b = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let merged = kernel.boolean_union(&a, &b).unwrap();
        let faces = kernel.triangulate(&merged, &MeshQuality::default()).unwrap();
        assert_eq!(faces.len(), 2);
    }

    #[test]
    fn translate_shifts_nodes() {
        let mut kernel = MockKernel::new();
        let base = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let moved = kernel.translate(&base, [5.0, 0.0, 0.0]).unwrap();
        let faces = kernel.triangulate(&moved, &MeshQuality::default()).unwrap();
        assert!(faces[0].nodes.iter().all(|n| n[0] >= 5.0));
    }

    #[test]
    fn rotate_quarter_turn_about_z() {
        let mut kernel = MockKernel::new();
        let base = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let turned = kernel
            .rotate(&base, [0.0; 3], [0.0, 0.0, 1.0], FRAC_PI_2)
            .unwrap();
        let faces = kernel.triangulate(&turned, &MeshQuality::default()).unwrap();
        // (1, 0, 0) maps to (0, 1, 0).
        let node = faces[0].nodes[1];
        assert!((node[0] - 0.0).abs() < 1e-9);
        assert!((node[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn step_round_trip_through_faceted_writer() {
        let mut kernel = MockKernel::new();
        let quality = MeshQuality::default();
        let handle = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let text = kernel.write_step(&handle, StepStrategy::AsIs).unwrap();

        let imported = kernel.read_step(&text, &quality).unwrap();
        let faces = kernel.triangulate(&imported, &quality).unwrap();
        let mesh = extract_mesh(&faces).unwrap();
        assert_eq!(mesh.indices.len(), 36);
    }

    #[test]
    fn truncated_step_text_fails_to_read() {
        let mut kernel = MockKernel::new();
        let err = kernel
            .read_step("ISO-10303-21;\nHEADER;\n", &MeshQuality::default())
            .unwrap_err();
        assert_eq!(err.status(), ReadStatus::SyntaxError);
    }

    #[test]
    fn garbage_bytes_fail_to_read() {
        let mut kernel = MockKernel::new();
        let err = kernel
            .read_step("not a step file at all", &MeshQuality::default())
            .unwrap_err();
        assert_eq!(err.status(), ReadStatus::SyntaxError);
    }

    #[test]
    fn export_unknown_handle_reports_no_shape() {
        let mut kernel = MockKernel::new();
        let err = kernel
            .write_step(&SolidHandle(42), StepStrategy::AsIs)
            .unwrap_err();
        assert_eq!(err.transfer, TransferStatus::NoShape);
    }
}
