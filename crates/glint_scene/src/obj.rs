//! Wavefront OBJ loading.
//!
//! Loads the file with a single unified index buffer and triangulated faces,
//! then lifts the flat tobj arrays into a [`Mesh`]. Models containing
//! multiple objects are merged into one mesh.

use std::path::Path;

use glint_math::Vec3;
use thiserror::Error;

use crate::Mesh;

/// Errors that can occur while loading an OBJ file.
#[derive(Error, Debug)]
pub enum ObjError {
    #[error("Failed to parse OBJ: {0}")]
    Parse(#[from] tobj::LoadError),

    #[error("No models found in OBJ file")]
    Empty,
}

/// Load an OBJ file into a mesh.
///
/// Positions, normals and UVs are taken per unified vertex; missing normals
/// are computed by smooth-averaging face normals. Multiple models in the
/// file are concatenated with their indices rebased.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjError> {
    let (models, _materials) = tobj::load_obj(
        path.as_ref(),
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )?;

    if models.is_empty() {
        return Err(ObjError::Empty);
    }

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();
    // Normals are only kept when every model supplies them; a partial set
    // would leave zero vectors, so we recompute instead.
    let mut normals_complete = true;
    let mut any_uvs = false;

    for model in &models {
        let mesh = &model.mesh;
        let base = positions.len() as u32;
        let vertex_count = mesh.positions.len() / 3;

        if mesh.normals.len() != mesh.positions.len() {
            normals_complete = false;
        }

        for i in 0..vertex_count {
            positions.push(Vec3::from_slice(&mesh.positions[i * 3..i * 3 + 3]));

            if mesh.normals.len() == mesh.positions.len() {
                normals.push(Vec3::from_slice(&mesh.normals[i * 3..i * 3 + 3]));
            } else {
                normals.push(Vec3::ZERO);
            }

            if mesh.texcoords.len() == vertex_count * 2 {
                uvs.push([mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]);
                any_uvs = true;
            } else {
                uvs.push([0.0, 0.0]);
            }
        }

        indices.extend(mesh.indices.iter().map(|i| i + base));
    }

    log::info!(
        "Loaded OBJ {}: {} vertices, {} triangles (normals: {}, uvs: {})",
        path.as_ref().display(),
        positions.len(),
        indices.len() / 3,
        normals_complete,
        any_uvs
    );

    let mut mesh = Mesh::new(
        positions,
        indices,
        normals_complete.then_some(normals),
        any_uvs.then_some(uvs),
    );
    mesh.ensure_normals();

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Unit quad split into two triangles, no normals
    const QUAD_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3
f 1/1 3/3 4/4
";

    fn write_temp_obj(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "glint_obj_test_{}_{}.obj",
            std::process::id(),
            contents.len()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_quad() {
        let path = write_temp_obj(QUAD_OBJ);
        let mesh = load_obj(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.has_uvs());

        // Normals were absent in the file, so they were computed
        assert!(mesh.has_normals());
        for normal in mesh.normals.as_ref().unwrap() {
            assert!((normal.z - 1.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_obj("/nonexistent/glint_missing.obj");
        assert!(result.is_err());
    }
}
