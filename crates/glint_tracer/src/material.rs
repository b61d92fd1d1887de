//! Surface scattering models.
//!
//! Materials are a plain enum rather than trait objects because the scene
//! must also cross the GPU boundary as flat data. The CPU side scatters by
//! matching the same variants the GPU packing encodes.

use glint_math::Vec3;
use rand::RngCore;

use crate::rng::{gen_f32, random_unit_vector};
use crate::sphere::Hit;
use crate::Ray;

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Result of a successful scatter: the bounced ray and its attenuation.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    pub attenuation: Color,
    pub scattered: Ray,
}

/// How a surface responds to an incoming ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceKind {
    /// Diffuse surface scattering cosine-weighted around the normal.
    Lambertian { albedo: Color },
    /// Reflective surface. `fuzz` of 0 is a perfect mirror, 1 is very rough.
    Metal { albedo: Color, fuzz: f32 },
    /// Glass-like surface with the given index of refraction.
    Dielectric { ior: f32 },
}

impl SurfaceKind {
    /// Scatter an incoming ray at a hit point.
    ///
    /// Returns None if the ray is absorbed.
    pub fn scatter(&self, ray_in: &Ray, hit: &Hit, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        match *self {
            SurfaceKind::Lambertian { albedo } => {
                let mut scatter_direction = hit.normal + random_unit_vector(rng);

                // Catch degenerate scatter direction
                if scatter_direction.length_squared() < 1e-8 {
                    scatter_direction = hit.normal;
                }

                Some(ScatterResult {
                    attenuation: albedo,
                    scattered: Ray::new(hit.p, scatter_direction),
                })
            }
            SurfaceKind::Metal { albedo, fuzz } => {
                let reflected = reflect(ray_in.direction.normalize(), hit.normal);
                let scattered_dir = reflected + fuzz.clamp(0.0, 1.0) * random_unit_vector(rng);

                // Only scatter if the bounced ray leaves the surface
                if scattered_dir.dot(hit.normal) > 0.0 {
                    Some(ScatterResult {
                        attenuation: albedo,
                        scattered: Ray::new(hit.p, scattered_dir),
                    })
                } else {
                    None
                }
            }
            SurfaceKind::Dielectric { ior } => {
                let refraction_ratio = if hit.front_face { 1.0 / ior } else { ior };

                let unit_direction = ray_in.direction.normalize();
                let cos_theta = (-unit_direction).dot(hit.normal).min(1.0);
                let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

                // Total internal reflection
                let cannot_refract = refraction_ratio * sin_theta > 1.0;

                let direction = if cannot_refract
                    || reflectance(cos_theta, refraction_ratio) > gen_f32(rng)
                {
                    reflect(unit_direction, hit.normal)
                } else {
                    refract(unit_direction, hit.normal, refraction_ratio)
                };

                Some(ScatterResult {
                    attenuation: Color::ONE,
                    scattered: Ray::new(hit.p, direction),
                })
            }
        }
    }
}

/// Reflect a vector about a normal.
#[inline]
pub(crate) fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a vector through a surface.
#[inline]
pub(crate) fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Schlick's approximation for reflectance.
#[inline]
pub(crate) fn reflectance(cosine: f32, ior: f32) -> f32 {
    let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_hit(normal: Vec3, front_face: bool) -> Hit {
        Hit {
            p: Vec3::ZERO,
            normal,
            t: 1.0,
            front_face,
            surface: SurfaceKind::Lambertian { albedo: Color::ONE },
        }
    }

    #[test]
    fn test_lambertian_scatters_above_surface() {
        let surface = SurfaceKind::Lambertian {
            albedo: Color::new(0.5, 0.5, 0.5),
        };
        let hit = test_hit(Vec3::Y, true);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let result = surface.scatter(&ray, &hit, &mut rng).unwrap();
            assert_eq!(result.attenuation, Color::new(0.5, 0.5, 0.5));
            // normal + unit vector always lands in the normal's hemisphere
            assert!(result.scattered.direction.dot(hit.normal) > -1e-6);
        }
    }

    #[test]
    fn test_metal_mirror_reflection() {
        let surface = SurfaceKind::Metal {
            albedo: Color::new(0.8, 0.6, 0.2),
            fuzz: 0.0,
        };
        let hit = test_hit(Vec3::Y, true);
        // 45 degree incoming ray
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(42);

        let result = surface.scatter(&ray, &hit, &mut rng).unwrap();
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((result.scattered.direction.normalize() - expected).length() < 0.001);
    }

    #[test]
    fn test_metal_absorbs_grazing_fuzz() {
        let surface = SurfaceKind::Metal {
            albedo: Color::ONE,
            fuzz: 1.0,
        };
        let hit = test_hit(Vec3::Y, true);
        // Nearly parallel to the surface so fuzz can push it below
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, -0.001, 0.0));
        let mut rng = StdRng::seed_from_u64(42);

        // With full fuzz some scatters end up below the horizon and are absorbed
        let absorbed = (0..200)
            .filter(|_| surface.scatter(&ray, &hit, &mut rng).is_none())
            .count();
        assert!(absorbed > 0);
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let surface = SurfaceKind::Dielectric { ior: 1.5 };
        // Back face: exiting glass at a grazing angle
        let hit = test_hit(Vec3::Y, false);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, -0.1, 0.0).normalize());
        let mut rng = StdRng::seed_from_u64(42);

        let result = surface.scatter(&ray, &hit, &mut rng).unwrap();
        // Reflected, so the direction keeps a negative y but flips about the normal
        assert!(result.scattered.direction.y > 0.0);
        assert_eq!(result.attenuation, Color::ONE);
    }

    #[test]
    fn test_reflectance_bounds() {
        // Head-on and grazing angles stay within [0, 1]
        assert!((0.0..=1.0).contains(&reflectance(1.0, 1.5)));
        assert!((0.0..=1.0).contains(&reflectance(0.0, 1.5)));
        // Grazing incidence approaches full reflection
        assert!(reflectance(0.0, 1.5) > 0.9);
    }
}
