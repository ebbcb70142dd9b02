//! `TruckKernel` — real geometry kernel wrapping the truck B-Rep stack.
//!
//! Primitives are built by successive sweeps (truck has no built-in
//! box/cylinder/sphere), booleans go through truck-shapeops, and STEP
//! round-trips through truck-stepio. Imported STEP models are meshed at
//! load and kept alongside their original text, so an as-is re-export
//! returns the text unchanged.

use std::collections::HashMap;
use std::f64::consts::PI;

use camber_types::{FaceTriangulation, MeshQuality};
use step_io::{write_faceted_step, StepReadError, StepStrategy, StepWriteFailure, TransferStatus};
use truck_modeling::builder;
use truck_modeling::topology::{Edge, Solid, Wire};
use truck_modeling::{InnerSpace, Point3, Rad, Vector3};

use crate::tessellation;
use crate::traits::{Kernel, KernelError, SolidHandle};
use crate::truck_step;

enum TruckShape {
    /// A solid modeled in this session.
    Modeled(Solid),
    /// A STEP import: meshed faces plus the original Part 21 text.
    Imported {
        faces: Vec<FaceTriangulation>,
        source: String,
    },
}

/// Real geometry kernel backed by the truck B-Rep library.
pub struct TruckKernel {
    next_handle: u64,
    shapes: HashMap<u64, TruckShape>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            shapes: HashMap::new(),
        }
    }

    fn store(&mut self, shape: TruckShape) -> SolidHandle {
        let handle = SolidHandle(self.next_handle);
        self.next_handle += 1;
        self.shapes.insert(handle.id(), shape);
        handle
    }

    fn shape(&self, handle: &SolidHandle) -> Result<&TruckShape, KernelError> {
        self.shapes
            .get(&handle.id())
            .ok_or(KernelError::UnknownSolid(*handle))
    }

    fn modeled(&self, handle: &SolidHandle, operation: &str) -> Result<&Solid, KernelError> {
        match self.shape(handle)? {
            TruckShape::Modeled(solid) => Ok(solid),
            TruckShape::Imported { .. } => Err(KernelError::NotSupported {
                operation: format!("{operation} on an imported model"),
            }),
        }
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for TruckKernel {
    fn make_box(&mut self, dx: f64, dy: f64, dz: f64) -> Result<SolidHandle, KernelError> {
        check_positive("box dimensions", &[dx, dy, dz])?;
        let v = builder::vertex(Point3::new(0.0, 0.0, 0.0));
        let edge = builder::tsweep(&v, Vector3::new(dx, 0.0, 0.0));
        let face = builder::tsweep(&edge, Vector3::new(0.0, dy, 0.0));
        let solid = builder::tsweep(&face, Vector3::new(0.0, 0.0, dz));
        Ok(self.store(TruckShape::Modeled(solid)))
    }

    fn make_cylinder(&mut self, radius: f64, height: f64) -> Result<SolidHandle, KernelError> {
        check_positive("cylinder radius/height", &[radius, height])?;
        let v = builder::vertex(Point3::new(radius, 0.0, 0.0));
        let wire = builder::rsweep(&v, Point3::new(0.0, 0.0, 0.0), Vector3::unit_z(), Rad(2.0 * PI));
        let face = builder::try_attach_plane(&[wire]).map_err(|e| KernelError::Construction {
            reason: format!("failed to create circular face: {e}"),
        })?;
        let solid = builder::tsweep(&face, Vector3::new(0.0, 0.0, height));
        Ok(self.store(TruckShape::Modeled(solid)))
    }

    fn make_sphere(&mut self, radius: f64) -> Result<SolidHandle, KernelError> {
        check_positive("sphere radius", &[radius])?;

        // Semicircle arc in the XZ plane, closed with a diameter edge, then
        // revolved a full turn around Z.
        let v_right = builder::vertex(Point3::new(radius, 0.0, 0.0));
        let arc_wire = builder::rsweep(
            &v_right,
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
            Rad(PI),
        );
        let v_left = builder::vertex(Point3::new(-radius, 0.0, 0.0));
        let line_edge: Edge = builder::tsweep(&v_left, Vector3::new(2.0 * radius, 0.0, 0.0));

        let mut edges: Vec<Edge> = Vec::new();
        for edge in arc_wire.edge_iter() {
            edges.push(edge.clone());
        }
        edges.push(line_edge);
        let closed_wire = Wire::from_iter(edges);

        let face = builder::try_attach_plane(&[closed_wire]).map_err(|e| {
            KernelError::Construction {
                reason: format!("failed to create semicircle face: {e}"),
            }
        })?;
        let solid = builder::rsweep(
            &face,
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_z(),
            Rad(2.0 * PI),
        );
        Ok(self.store(TruckShape::Modeled(solid)))
    }

    fn translate(
        &mut self,
        solid: &SolidHandle,
        offset: [f64; 3],
    ) -> Result<SolidHandle, KernelError> {
        let source = self.modeled(solid, "translate")?;
        let moved = builder::translated(source, Vector3::new(offset[0], offset[1], offset[2]));
        Ok(self.store(TruckShape::Modeled(moved)))
    }

    fn rotate(
        &mut self,
        solid: &SolidHandle,
        origin: [f64; 3],
        axis: [f64; 3],
        angle: f64,
    ) -> Result<SolidHandle, KernelError> {
        let axis_vec = Vector3::new(axis[0], axis[1], axis[2]);
        if axis_vec.magnitude() < 1e-12 {
            return Err(KernelError::Construction {
                reason: "rotation axis has zero length".to_string(),
            });
        }
        let source = self.modeled(solid, "rotate")?;
        let rotated = builder::rotated(
            source,
            Point3::new(origin[0], origin[1], origin[2]),
            axis_vec.normalize(),
            Rad(angle),
        );
        Ok(self.store(TruckShape::Modeled(rotated)))
    }

    fn boolean_union(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        let solid_a = self.modeled(a, "boolean union")?.clone();
        let solid_b = self.modeled(b, "boolean union")?.clone();
        let result = truck_shapeops::or(&solid_a, &solid_b, 0.05).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "union returned no solid".to_string(),
            }
        })?;
        Ok(self.store(TruckShape::Modeled(result)))
    }

    fn boolean_subtract(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        let solid_a = self.modeled(a, "boolean subtract")?.clone();
        let mut solid_b = self.modeled(b, "boolean subtract")?.clone();

        // Subtraction = A ∩ ¬B. not() mutates in place.
        solid_b.not();
        let result = truck_shapeops::and(&solid_a, &solid_b, 0.05).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "subtraction returned no solid".to_string(),
            }
        })?;
        Ok(self.store(TruckShape::Modeled(result)))
    }

    fn boolean_intersect(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        let solid_a = self.modeled(a, "boolean intersect")?.clone();
        let solid_b = self.modeled(b, "boolean intersect")?.clone();
        let result = truck_shapeops::and(&solid_a, &solid_b, 0.05).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "intersection returned no solid".to_string(),
            }
        })?;
        Ok(self.store(TruckShape::Modeled(result)))
    }

    fn triangulate(
        &mut self,
        solid: &SolidHandle,
        quality: &MeshQuality,
    ) -> Result<Vec<FaceTriangulation>, KernelError> {
        match self.shape(solid)? {
            TruckShape::Modeled(s) => tessellation::triangulate_solid(s, quality),
            TruckShape::Imported { faces, .. } => Ok(faces.clone()),
        }
    }

    fn write_step(
        &mut self,
        solid: &SolidHandle,
        strategy: StepStrategy,
    ) -> Result<String, StepWriteFailure> {
        let Some(shape) = self.shapes.get(&solid.id()) else {
            return Err(StepWriteFailure::transfer(TransferStatus::NoShape));
        };
        match (shape, strategy) {
            (TruckShape::Modeled(s), StepStrategy::AsIs) => truck_step::write_shell_as_is(s),
            (TruckShape::Modeled(s), StepStrategy::ManifoldSolidBrep) => {
                truck_step::write_manifold(s)
            }
            (TruckShape::Modeled(s), StepStrategy::FacetedBrep) => {
                // Export meshing reuses the preview tolerance; faceted STEP
                // is the last-resort representation either way.
                let faces = tessellation::triangulate_solid(s, &MeshQuality::default())
                    .map_err(|_| StepWriteFailure::transfer(TransferStatus::NoFacets))?;
                write_faceted_step(&faces, "model.step")
            }
            (TruckShape::Imported { source, .. }, StepStrategy::AsIs) => Ok(source.clone()),
            (TruckShape::Imported { .. }, StepStrategy::ManifoldSolidBrep) => {
                Err(StepWriteFailure::transfer(TransferStatus::NotManifold))
            }
            (TruckShape::Imported { faces, .. }, StepStrategy::FacetedBrep) => {
                write_faceted_step(faces, "model.step")
            }
        }
    }

    fn read_step(
        &mut self,
        text: &str,
        quality: &MeshQuality,
    ) -> Result<SolidHandle, StepReadError> {
        let faces = truck_step::read_step_faces(text, quality)?;
        Ok(self.store(TruckShape::Imported {
            faces,
            source: text.to_string(),
        }))
    }

    fn release(&mut self, solid: SolidHandle) {
        self.shapes.remove(&solid.id());
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_mesh;

    #[test]
    fn box_triangulates_into_six_faces() {
        let mut kernel = TruckKernel::new();
        let handle = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let faces = kernel.triangulate(&handle, &MeshQuality::default()).unwrap();
        assert_eq!(faces.len(), 6);

        let mesh = extract_mesh(&faces).unwrap();
        assert!(mesh.vertex_count() > 0);
        assert_eq!(mesh.indices.len() % 3, 0);
    }

    #[test]
    fn negative_dimensions_are_rejected() {
        let mut kernel = TruckKernel::new();
        assert!(matches!(
            kernel.make_box(-1.0, 1.0, 1.0),
            Err(KernelError::Construction { .. })
        ));
        assert!(matches!(
            kernel.make_sphere(0.0),
            Err(KernelError::Construction { .. })
        ));
    }

    #[test]
    fn translate_moves_every_node() {
        let mut kernel = TruckKernel::new();
        let quality = MeshQuality::default();
        let base = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let moved = kernel.translate(&base, [10.0, 0.0, 0.0]).unwrap();

        let faces = kernel.triangulate(&moved, &quality).unwrap();
        for face in &faces {
            for node in &face.nodes {
                assert!(node[0] >= 10.0 - 1e-6);
            }
        }
    }

    #[test]
    fn zero_axis_rotation_is_rejected() {
        let mut kernel = TruckKernel::new();
        let base = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        assert!(matches!(
            kernel.rotate(&base, [0.0; 3], [0.0; 3], 1.0),
            Err(KernelError::Construction { .. })
        ));
    }

    #[test]
    fn as_is_export_succeeds_for_box() {
        let mut kernel = TruckKernel::new();
        let handle = kernel.make_box(1.0, 2.0, 3.0).unwrap();
        let text = kernel.write_step(&handle, StepStrategy::AsIs).unwrap();
        assert!(text.starts_with("ISO-10303-21;"));
    }

    #[test]
    fn export_unknown_handle_reports_no_shape() {
        let mut kernel = TruckKernel::new();
        let err = kernel
            .write_step(&SolidHandle(999), StepStrategy::AsIs)
            .unwrap_err();
        assert_eq!(err.transfer, TransferStatus::NoShape);
    }

    #[test]
    fn step_round_trip_recovers_geometry() {
        let quality = MeshQuality::default();
        let mut kernel = TruckKernel::new();
        let handle = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let text = kernel.write_step(&handle, StepStrategy::AsIs).unwrap();

        let imported = kernel.read_step(&text, &quality).unwrap();
        let faces = kernel.triangulate(&imported, &quality).unwrap();
        let mesh = extract_mesh(&faces).unwrap();
        assert!(mesh.triangle_count() > 0);
    }

    #[test]
    fn imported_as_is_export_returns_original_text() {
        let quality = MeshQuality::default();
        let mut kernel = TruckKernel::new();
        let handle = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let text = kernel.write_step(&handle, StepStrategy::AsIs).unwrap();

        let imported = kernel.read_step(&text, &quality).unwrap();
        let re_exported = kernel.write_step(&imported, StepStrategy::AsIs).unwrap();
        assert_eq!(re_exported, text);
    }

    #[test]
    fn release_forgets_the_solid() {
        let mut kernel = TruckKernel::new();
        let handle = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        kernel.release(handle);
        assert!(matches!(
            kernel.triangulate(&handle, &MeshQuality::default()),
            Err(KernelError::UnknownSolid(_))
        ));
    }
}
