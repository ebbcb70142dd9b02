//! STEP read/write through truck-stepio.
//!
//! Export compresses a boundary shell and renders it with truck's Part 21
//! display; import parses with ruststep, transfers root shells from the
//! exchange table, and meshes them at the session tolerance.

use camber_types::{FaceOrientation, FaceTriangulation, MeshQuality};
use step_io::{ReadStatus, StepReadError, StepWriteFailure, TransferStatus, WriteStatus};
use truck_meshalgo::prelude::*;
use truck_stepio::out::{CompleteStepDisplay, StepHeaderDescriptor, StepModel};
use truck_stepio::r#in::{ruststep, Table};

use crate::tessellation::face_triangulation;

type TruckSolid = truck_modeling::Solid;

/// Write a solid's boundary shell as-is (whatever surfaces it carries).
pub fn write_shell_as_is(solid: &TruckSolid) -> Result<String, StepWriteFailure> {
    let Some(shell) = solid.boundaries().first() else {
        return Err(StepWriteFailure::transfer(TransferStatus::NoShape));
    };
    render_shell(shell)
}

/// Write a solid as a manifold solid B-Rep: requires exactly one boundary
/// shell.
pub fn write_manifold(solid: &TruckSolid) -> Result<String, StepWriteFailure> {
    let boundaries = solid.boundaries();
    if boundaries.len() != 1 {
        return Err(StepWriteFailure::transfer(TransferStatus::NotManifold));
    }
    render_shell(&boundaries[0])
}

fn render_shell(shell: &truck_modeling::Shell) -> Result<String, StepWriteFailure> {
    let compressed = shell.compress();
    let text = CompleteStepDisplay::new(
        StepModel::from(&compressed),
        StepHeaderDescriptor {
            organization_system: "camber kernel-host".to_owned(),
            ..Default::default()
        },
    )
    .to_string();

    if text.is_empty() {
        return Err(StepWriteFailure::write(WriteStatus::Empty));
    }
    Ok(text)
}

/// Read STEP text, transferring every root shell and meshing it.
///
/// Fails when the Part 21 syntax does not parse, when the exchange has no
/// DATA section, when zero root shells transfer, or when the transferred
/// roots carry no surface geometry.
pub fn read_step_faces(
    text: &str,
    quality: &MeshQuality,
) -> Result<Vec<FaceTriangulation>, StepReadError> {
    let exchange = ruststep::parser::parse(text)
        .map_err(|e| StepReadError::new(ReadStatus::SyntaxError, e.to_string()))?;

    let Some(section) = exchange.data.first() else {
        return Err(StepReadError::new(
            ReadStatus::NoDataSection,
            "exchange structure has no DATA section",
        ));
    };
    let table = Table::from_data_section(section);

    let mut shell_entries: Vec<_> = table.shell.iter().collect();
    shell_entries.sort_by_key(|(id, _)| **id);

    let mut roots = 0usize;
    let mut faces: Vec<FaceTriangulation> = Vec::new();
    let mut last_transfer_error: Option<String> = None;

    for (shell_id, shell_holder) in shell_entries {
        let compressed = match table.to_compressed_shell(shell_holder) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(shell = shell_id, error = %e, "shell transfer failed");
                last_transfer_error = Some(e.to_string());
                continue;
            }
        };
        roots += 1;

        let meshed = compressed.robust_triangulation(quality.deflection);
        for face in meshed.faces.iter() {
            let Some(face_mesh) = face.surface.as_ref() else {
                continue;
            };
            let orientation = if face.orientation {
                FaceOrientation::Forward
            } else {
                FaceOrientation::Reversed
            };
            faces.push(face_triangulation(face_mesh, orientation));
        }
    }

    if roots == 0 {
        let detail = last_transfer_error
            .unwrap_or_else(|| "no root shells in DATA section".to_string());
        return Err(StepReadError::new(ReadStatus::ZeroRoots, detail));
    }
    if faces.iter().all(|f| f.is_empty()) {
        return Err(StepReadError::new(
            ReadStatus::EmptyShape,
            "transferred roots produced no surface geometry",
        ));
    }
    Ok(faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use truck_modeling::builder;
    use truck_modeling::{Point3, Vector3};

    fn unit_box() -> TruckSolid {
        let v = builder::vertex(Point3::new(0.0, 0.0, 0.0));
        let edge = builder::tsweep(&v, Vector3::new(1.0, 0.0, 0.0));
        let face = builder::tsweep(&edge, Vector3::new(0.0, 1.0, 0.0));
        builder::tsweep(&face, Vector3::new(0.0, 0.0, 1.0))
    }

    #[test]
    fn as_is_write_produces_part21_text() {
        let text = write_shell_as_is(&unit_box()).unwrap();
        assert!(text.starts_with("ISO-10303-21;"));
        assert!(text.contains("DATA;"));
    }

    #[test]
    fn manifold_write_accepts_single_shell_box() {
        let text = write_manifold(&unit_box()).unwrap();
        assert!(!text.is_empty());
    }

    #[test]
    fn garbage_text_is_a_syntax_error() {
        let err = read_step_faces("not a step file", &MeshQuality::default()).unwrap_err();
        assert_eq!(err.status(), ReadStatus::SyntaxError);
    }

    #[test]
    fn truncated_export_fails_to_read() {
        let text = write_shell_as_is(&unit_box()).unwrap();
        let truncated = &text[..text.len() / 2];
        assert!(read_step_faces(truncated, &MeshQuality::default()).is_err());
    }

    #[test]
    fn box_round_trips_through_step() {
        let text = write_shell_as_is(&unit_box()).unwrap();
        let faces = read_step_faces(&text, &MeshQuality::default()).unwrap();
        assert!(!faces.is_empty(), "round trip should recover faces");
        assert!(faces.iter().any(|f| !f.is_empty()));
    }
}
