//! Sphere primitive for ray tracing.

use glint_math::{Interval, Vec3};

use crate::material::SurfaceKind;
use crate::Ray;

/// Record of a ray-sphere intersection.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at the intersection (always points against the ray)
    pub normal: Vec3,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
    /// Surface at the intersection point
    pub surface: SurfaceKind,
}

/// A sphere primitive.
///
/// A negative radius flips the normals, which is how the hollow glass
/// sphere in the classic scene is modeled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub surface: SurfaceKind,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, surface: SurfaceKind) -> Self {
        Self {
            center,
            radius,
            surface,
        }
    }

    /// Test if a ray hits this sphere within the given interval.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<Hit> {
        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let p = ray.at(root);
        let outward_normal = (p - self.center) / self.radius;
        let front_face = ray.direction.dot(outward_normal) < 0.0;

        Some(Hit {
            p,
            normal: if front_face {
                outward_normal
            } else {
                -outward_normal
            },
            t: root,
            front_face,
            surface: self.surface,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Color;

    fn grey_sphere(center: Vec3, radius: f32) -> Sphere {
        Sphere::new(
            center,
            radius,
            SurfaceKind::Lambertian {
                albedo: Color::new(0.5, 0.5, 0.5),
            },
        )
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = grey_sphere(Vec3::new(0.0, 0.0, -1.0), 0.5);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let hit = sphere
            .hit(&ray, Interval::new(0.001, f32::INFINITY))
            .unwrap();

        assert!((hit.t - 0.5).abs() < 0.001); // Front surface at t=0.5
        assert!(hit.front_face);
        assert!((hit.normal - Vec3::Z).length() < 0.001);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = grey_sphere(Vec3::new(0.0, 0.0, -1.0), 0.5);

        // Ray pointing away from the sphere
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        assert!(sphere
            .hit(&ray, Interval::new(0.001, f32::INFINITY))
            .is_none());
    }

    #[test]
    fn test_sphere_hit_from_inside() {
        let sphere = grey_sphere(Vec3::ZERO, 1.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        let hit = sphere
            .hit(&ray, Interval::new(0.001, f32::INFINITY))
            .unwrap();

        // Exits at t=1, back face, normal flipped against the ray
        assert!((hit.t - 1.0).abs() < 0.001);
        assert!(!hit.front_face);
        assert!((hit.normal - Vec3::NEG_X).length() < 0.001);
    }

    #[test]
    fn test_interval_excludes_near_root() {
        let sphere = grey_sphere(Vec3::new(0.0, 0.0, -2.0), 0.5);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        // Near surface at t=1.5, far at t=2.5; exclude the near one
        let hit = sphere.hit(&ray, Interval::new(2.0, f32::INFINITY)).unwrap();
        assert!((hit.t - 2.5).abs() < 0.001);
        assert!(!hit.front_face);
    }
}
