//! Sphere scene container and JSON scene files.

use std::path::Path;

use glint_math::{Interval, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::material::{Color, SurfaceKind};
use crate::sphere::{Hit, Sphere};
use crate::Ray;

/// Errors that can occur while loading a scene file.
#[derive(Error, Debug)]
pub enum SceneFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A collection of spheres to be path traced.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
}

impl Scene {
    /// Create an empty scene (renders sky only).
    pub fn new() -> Self {
        Self::default()
    }

    /// The classic three-sphere arrangement over a matte ground.
    ///
    /// A diffuse blue sphere flanked by hollow glass on the left and gold
    /// metal on the right. The glass shell is an outer dielectric sphere
    /// with a negative-radius inner sphere flipping its normals.
    pub fn three_spheres() -> Self {
        let ground = SurfaceKind::Lambertian {
            albedo: Color::new(0.8, 0.8, 0.0),
        };
        let center = SurfaceKind::Lambertian {
            albedo: Color::new(0.1, 0.2, 0.5),
        };
        let glass = SurfaceKind::Dielectric { ior: 1.5 };
        let metal = SurfaceKind::Metal {
            albedo: Color::new(0.8, 0.6, 0.2),
            fuzz: 0.0,
        };

        Self {
            spheres: vec![
                Sphere::new(Vec3::new(0.0, -100.5, -1.0), 100.0, ground),
                Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, center),
                Sphere::new(Vec3::new(-1.0, 0.0, -1.0), 0.5, glass),
                Sphere::new(Vec3::new(-1.0, 0.0, -1.0), -0.45, glass),
                Sphere::new(Vec3::new(1.0, 0.0, -1.0), 0.5, metal),
            ],
        }
    }

    /// Load a scene from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SceneFileError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let file: SceneFile = serde_json::from_str(&contents)?;

        log::info!(
            "Loaded scene {}: {} spheres",
            path.as_ref().display(),
            file.spheres.len()
        );

        Ok(file.into())
    }

    /// Find the closest hit along a ray, if any.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit> {
        let mut closest: Option<Hit> = None;
        let mut closest_so_far = ray_t.max;

        for sphere in &self.spheres {
            if let Some(hit) = sphere.hit(ray, Interval::new(ray_t.min, closest_so_far)) {
                closest_so_far = hit.t;
                closest = Some(hit);
            }
        }

        closest
    }

    /// Get the number of spheres.
    pub fn sphere_count(&self) -> usize {
        self.spheres.len()
    }

    /// Check if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }
}

// ============================================================================
// JSON scene file format
// ============================================================================
//
// Plain-array mirror of the domain types, so scene files stay readable and
// the math types keep serde out of their API.

#[derive(Debug, Serialize, Deserialize)]
struct SceneFile {
    spheres: Vec<SphereFile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SphereFile {
    center: [f32; 3],
    radius: f32,
    surface: SurfaceFile,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SurfaceFile {
    Lambertian { albedo: [f32; 3] },
    Metal { albedo: [f32; 3], fuzz: f32 },
    Dielectric { ior: f32 },
}

impl From<SceneFile> for Scene {
    fn from(file: SceneFile) -> Self {
        Self {
            spheres: file.spheres.into_iter().map(Sphere::from).collect(),
        }
    }
}

impl From<SphereFile> for Sphere {
    fn from(file: SphereFile) -> Self {
        Sphere::new(Vec3::from_array(file.center), file.radius, file.surface.into())
    }
}

impl From<SurfaceFile> for SurfaceKind {
    fn from(file: SurfaceFile) -> Self {
        match file {
            SurfaceFile::Lambertian { albedo } => SurfaceKind::Lambertian {
                albedo: Color::from_array(albedo),
            },
            SurfaceFile::Metal { albedo, fuzz } => SurfaceKind::Metal {
                albedo: Color::from_array(albedo),
                fuzz,
            },
            SurfaceFile::Dielectric { ior } => SurfaceKind::Dielectric { ior },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_spheres_layout() {
        let scene = Scene::three_spheres();

        assert_eq!(scene.sphere_count(), 5);

        // Hollow glass: two dielectric spheres at the same center, the
        // inner one with a negative radius
        let glass: Vec<_> = scene
            .spheres
            .iter()
            .filter(|s| matches!(s.surface, SurfaceKind::Dielectric { .. }))
            .collect();
        assert_eq!(glass.len(), 2);
        assert_eq!(glass[0].center, glass[1].center);
        assert!(glass[0].radius > 0.0);
        assert!(glass[1].radius < 0.0);
    }

    #[test]
    fn test_scene_hit_picks_closest() {
        let grey = SurfaceKind::Lambertian {
            albedo: Color::new(0.5, 0.5, 0.5),
        };
        let mut scene = Scene::new();
        scene.spheres.push(Sphere::new(Vec3::new(0.0, 0.0, -5.0), 0.5, grey));
        scene.spheres.push(Sphere::new(Vec3::new(0.0, 0.0, -2.0), 0.5, grey));

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = scene.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();

        // Nearer sphere wins: front face at z=-1.5
        assert!((hit.t - 1.5).abs() < 0.001);
    }

    #[test]
    fn test_empty_scene_misses() {
        let scene = Scene::new();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        assert!(scene.is_empty());
        assert!(scene.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_scene_json_round_trip() {
        let json = r#"{
            "spheres": [
                {
                    "center": [0.0, 0.0, -1.0],
                    "radius": 0.5,
                    "surface": { "type": "lambertian", "albedo": [0.1, 0.2, 0.5] }
                },
                {
                    "center": [1.0, 0.0, -1.0],
                    "radius": 0.5,
                    "surface": { "type": "metal", "albedo": [0.8, 0.6, 0.2], "fuzz": 0.1 }
                },
                {
                    "center": [-1.0, 0.0, -1.0],
                    "radius": 0.5,
                    "surface": { "type": "dielectric", "ior": 1.5 }
                }
            ]
        }"#;

        let file: SceneFile = serde_json::from_str(json).unwrap();
        let scene: Scene = file.into();

        assert_eq!(scene.sphere_count(), 3);
        assert_eq!(
            scene.spheres[0].surface,
            SurfaceKind::Lambertian {
                albedo: Color::new(0.1, 0.2, 0.5)
            }
        );
        assert_eq!(
            scene.spheres[1].surface,
            SurfaceKind::Metal {
                albedo: Color::new(0.8, 0.6, 0.2),
                fuzz: 0.1
            }
        );
    }

    #[test]
    fn test_scene_file_missing() {
        let result = Scene::from_json_file("/nonexistent/glint_scene.json");
        assert!(matches!(result, Err(SceneFileError::Io(_))));
    }
}
