//! Faceted-B-Rep STEP writer (ISO 10303-21, AP203).
//!
//! The last-resort export strategy: every triangle becomes a planar FACE
//! bounded by a POLY_LOOP, collected into a CLOSED_SHELL and a FACETED_BREP.
//! Lossy by construction, but representable for any triangulated shape.

use camber_types::FaceTriangulation;

use crate::errors::{StepWriteFailure, TransferStatus, WriteStatus};

/// Accumulates numbered Part 21 entities.
struct StepBuilder {
    entities: Vec<String>,
    next_id: usize,
}

impl StepBuilder {
    fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    fn add_entity(&mut self, entity: String) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.push(format!("#{id} = {entity};"));
        id
    }

    fn finish(self, name: &str) -> String {
        let mut out = String::new();
        out.push_str("ISO-10303-21;\n");
        out.push_str("HEADER;\n");
        out.push_str("FILE_DESCRIPTION((''), '2;1');\n");
        out.push_str(&format!(
            "FILE_NAME('{name}', '', (''), (''), 'camber step-io', '', '');\n"
        ));
        out.push_str("FILE_SCHEMA(('CONFIG_CONTROL_DESIGN'));\n");
        out.push_str("ENDSEC;\n");
        out.push_str("DATA;\n");
        for entity in &self.entities {
            out.push_str(entity);
            out.push('\n');
        }
        out.push_str("ENDSEC;\n");
        out.push_str("END-ISO-10303-21;\n");
        out
    }
}

/// Write face triangulations as a faceted-B-Rep STEP file.
///
/// Node coordinates are shared per face; each triangle's loop follows the
/// face's winding rule so reversed faces keep outward-facing facets.
pub fn write_faceted_step(
    faces: &[FaceTriangulation],
    name: &str,
) -> Result<String, StepWriteFailure> {
    let triangle_count: usize = faces.iter().map(|f| f.triangles.len()).sum();
    if triangle_count == 0 {
        return Err(StepWriteFailure::transfer(TransferStatus::NoFacets));
    }

    let mut builder = StepBuilder::new();
    let mut face_ids: Vec<usize> = Vec::with_capacity(triangle_count);

    for face in faces {
        if face.is_empty() {
            continue;
        }
        let point_ids: Vec<usize> = face
            .nodes
            .iter()
            .map(|&[x, y, z]| {
                builder.add_entity(format!("CARTESIAN_POINT('', ({x:.6}, {y:.6}, {z:.6}))"))
            })
            .collect();

        for tri in &face.triangles {
            let [a, b, c] = face.orientation.wind(*tri);
            let (pa, pb, pc) = (
                point_ids[a as usize],
                point_ids[b as usize],
                point_ids[c as usize],
            );
            let loop_id = builder.add_entity(format!("POLY_LOOP('', (#{pa}, #{pb}, #{pc}))"));
            let bound_id = builder.add_entity(format!("FACE_OUTER_BOUND('', #{loop_id}, .T.)"));
            face_ids.push(builder.add_entity(format!("FACE('', (#{bound_id}))")));
        }
    }

    if face_ids.is_empty() {
        return Err(StepWriteFailure::transfer(TransferStatus::NoFacets));
    }

    let shell_refs = face_ids
        .iter()
        .map(|id| format!("#{id}"))
        .collect::<Vec<_>>()
        .join(", ");
    let shell_id = builder.add_entity(format!("CLOSED_SHELL('', ({shell_refs}))"));
    let brep_id = builder.add_entity(format!("FACETED_BREP('', #{shell_id})"));

    // Minimal representation/product skeleton so viewers find the shape.
    let origin = builder.add_entity("CARTESIAN_POINT('', (0.0, 0.0, 0.0))".to_string());
    let dir_z = builder.add_entity("DIRECTION('', (0.0, 0.0, 1.0))".to_string());
    let dir_x = builder.add_entity("DIRECTION('', (1.0, 0.0, 0.0))".to_string());
    let placement =
        builder.add_entity(format!("AXIS2_PLACEMENT_3D('', #{origin}, #{dir_z}, #{dir_x})"));
    builder.add_entity(format!(
        "FACETED_BREP_SHAPE_REPRESENTATION('{name}', (#{brep_id}, #{placement}), $)"
    ));

    let text = builder.finish(name);
    if text.is_empty() {
        return Err(StepWriteFailure::write(WriteStatus::Empty));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_types::FaceOrientation;

    fn quad_face(orientation: FaceOrientation) -> FaceTriangulation {
        FaceTriangulation {
            orientation,
            nodes: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    #[test]
    fn empty_input_fails_transfer() {
        let err = write_faceted_step(&[], "empty.step").unwrap_err();
        assert_eq!(err.transfer, TransferStatus::NoFacets);
        assert_eq!(err.write, WriteStatus::NotAttempted);
    }

    #[test]
    fn writes_part21_skeleton() {
        let text = write_faceted_step(&[quad_face(FaceOrientation::Forward)], "quad.step").unwrap();
        assert!(text.starts_with("ISO-10303-21;"));
        assert!(text.contains("FILE_NAME('quad.step'"));
        assert!(text.contains("CLOSED_SHELL"));
        assert!(text.contains("FACETED_BREP"));
        assert!(text.ends_with("END-ISO-10303-21;\n"));
    }

    #[test]
    fn one_face_entity_per_triangle() {
        let text = write_faceted_step(&[quad_face(FaceOrientation::Forward)], "quad.step").unwrap();
        let faces = text.matches("= FACE('',").count();
        let loops = text.matches("POLY_LOOP").count();
        assert_eq!(faces, 2);
        assert_eq!(loops, 2);
    }

    #[test]
    fn reversed_face_winds_loops_backwards() {
        let fwd = write_faceted_step(&[quad_face(FaceOrientation::Forward)], "f.step").unwrap();
        let rev = write_faceted_step(&[quad_face(FaceOrientation::Reversed)], "r.step").unwrap();
        // Point entities #1..#4; the first forward loop is (1,2,3), reversed (1,3,2).
        assert!(fwd.contains("POLY_LOOP('', (#1, #2, #3))"));
        assert!(rev.contains("POLY_LOOP('', (#1, #3, #2))"));
    }
}
