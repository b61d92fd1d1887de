//! CPU reference renderer.
//!
//! Implements the same Monte Carlo scattering model as the GPU kernel:
//! recursive bounces with configurable depth, sky-gradient miss shading,
//! and gamma-2 output. Rows render in parallel with rayon, seeded per row
//! so a full frame is deterministic.

use std::path::Path;

use glint_math::Interval;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::camera::TracerCamera;
use crate::material::Color;
use crate::scene::Scene;
use crate::Ray;

/// Compute the color seen by a ray.
///
/// This is the core path tracing function. It traces the ray through the
/// scene, bouncing off surfaces and accumulating attenuation.
pub fn ray_color(ray: &Ray, scene: &Scene, depth: u32, rng: &mut dyn RngCore) -> Color {
    // If we've exceeded max depth, return black (no light)
    if depth == 0 {
        return Color::ZERO;
    }

    match scene.hit(ray, Interval::new(0.001, f32::INFINITY)) {
        Some(hit) => match hit.surface.scatter(ray, &hit, rng) {
            Some(result) => {
                result.attenuation * ray_color(&result.scattered, scene, depth - 1, rng)
            }
            // Ray was absorbed
            None => Color::ZERO,
        },
        // Ray didn't hit anything - shade with the sky gradient
        None => sky_gradient(ray),
    }
}

/// Compute sky gradient background.
fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction.normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    const INTENSITY: Interval = Interval {
        min: 0.0,
        max: 0.999,
    };

    let r = (256.0 * INTENSITY.clamp(linear_to_gamma(color.x))) as u8;
    let g = (256.0 * INTENSITY.clamp(linear_to_gamma(color.y))) as u8;
    let b = (256.0 * INTENSITY.clamp(linear_to_gamma(color.z))) as u8;
    [r, g, b, 255]
}

/// Render a single pixel with multi-sampling.
pub fn render_pixel(
    camera: &TracerCamera,
    scene: &Scene,
    x: u32,
    y: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;

    for _ in 0..camera.samples_per_pixel {
        // get_ray already jitters within the pixel for anti-aliasing
        let ray = camera.get_ray(x, y, rng);
        pixel_color += ray_color(&ray, scene, camera.max_depth, rng);
    }

    pixel_color / camera.samples_per_pixel.max(1) as f32
}

/// Simple image buffer for storing render output.
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; (width * height) as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width * self.height * 4) as usize);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }

    /// Save as a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> image::ImageResult<()> {
        image::save_buffer(
            path,
            &self.to_rgba(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )
    }
}

/// Render the scene with rows in parallel.
///
/// Each row seeds its own RNG from the row index, so identical inputs
/// produce identical frames regardless of thread scheduling.
pub fn render(camera: &TracerCamera, scene: &Scene) -> ImageBuffer {
    let width = camera.image_width;
    let height = camera.image_height;
    let mut image = ImageBuffer::new(width, height);
    if image.pixels.is_empty() {
        return image;
    }

    let start = std::time::Instant::now();

    image
        .pixels
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let mut rng = StdRng::seed_from_u64(0x9E37_79B9 ^ (y as u64));
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = render_pixel(camera, scene, x as u32, y as u32, &mut rng);
            }
        });

    log::info!(
        "Rendered {}x{} at {} spp in {:.1}s",
        width,
        height,
        camera.samples_per_pixel,
        start.elapsed().as_secs_f32()
    );

    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec3;

    #[test]
    fn test_sky_gradient() {
        // Ray pointing up should be more blue (less red than white)
        let up_ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let up_color = sky_gradient(&up_ray);

        // Ray pointing down should be more white (more red)
        let down_ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, -1.0, 0.0));
        let down_color = sky_gradient(&down_ray);

        assert!(
            up_color.x < down_color.x,
            "up_color.x={} should be < down_color.x={}",
            up_color.x,
            down_color.x
        );
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_to_rgba_clamps() {
        assert_eq!(color_to_rgba(Color::ZERO), [0, 0, 0, 255]);

        // Overbright values clamp rather than wrap
        let white = color_to_rgba(Color::new(10.0, 10.0, 10.0));
        assert_eq!(white, [255, 255, 255, 255]);
    }

    #[test]
    fn test_render_pixel_hits_sphere() {
        let scene = Scene::three_spheres();
        let mut camera = TracerCamera::new()
            .with_resolution(10, 10)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(90.0, 0.0, 1.0)
            .with_quality(4, 5);
        camera.initialize();

        let mut rng = StdRng::seed_from_u64(42);

        // Center pixel looks straight at the blue sphere
        let color = render_pixel(&camera, &scene, 5, 5, &mut rng);
        assert!(color.length() > 0.0);
        assert!(color.max_element() <= 1.0 + 1e-4);
    }

    #[test]
    fn test_render_is_deterministic() {
        let scene = Scene::three_spheres();
        let mut camera = TracerCamera::classic_view(16, 12);
        camera.samples_per_pixel = 2;
        camera.max_depth = 4;

        let a = render(&camera, &scene);
        let b = render(&camera, &scene);

        assert_eq!(a.pixels, b.pixels);
        assert!(a.pixels.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_render_dimensions() {
        let scene = Scene::new();
        let mut camera = TracerCamera::classic_view(8, 6);
        camera.samples_per_pixel = 1;
        camera.max_depth = 2;

        let image = render(&camera, &scene);

        assert_eq!(image.width, 8);
        assert_eq!(image.height, 6);
        assert_eq!(image.to_rgba().len(), 8 * 6 * 4);

        // Empty scene renders sky: the white blend grows toward the bottom,
        // so the red channel increases down the image
        assert!(image.get(4, 0).x <= image.get(4, 5).x);
    }
}
