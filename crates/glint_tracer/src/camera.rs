//! Camera for ray generation.

use glint_math::Vec3;
use rand::RngCore;

use crate::rng::{gen_f32, random_in_unit_disk};
use crate::Ray;

const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Camera for generating rays into the scene.
///
/// Configure with the builder methods, then call [`initialize`] before
/// generating rays. The interactive mutation methods (`translate`,
/// `rotate_look`, `dolly`) re-initialize automatically.
///
/// [`initialize`]: TracerCamera::initialize
#[derive(Debug, Clone)]
pub struct TracerCamera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,
    pub samples_per_pixel: u32,
    pub max_depth: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,          // Vertical field of view in degrees
    defocus_angle: f32, // Variation angle of rays through each pixel, degrees
    focus_dist: f32,    // Distance from camera to plane of perfect focus

    // Cached computed values (set by initialize())
    pub(crate) center: Vec3,
    pub(crate) pixel00_loc: Vec3,
    pub(crate) pixel_delta_u: Vec3,
    pub(crate) pixel_delta_v: Vec3,
    pub(crate) u: Vec3,
    pub(crate) v: Vec3,
    pub(crate) w: Vec3,
    pub(crate) defocus_disk_u: Vec3,
    pub(crate) defocus_disk_v: Vec3,
    pub(crate) defocus_angle_rad: f32,
}

impl TracerCamera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            image_width: 800,
            image_height: 450,
            samples_per_pixel: 10,
            max_depth: 50,
            look_from: Vec3::new(0.0, 0.0, 0.0),
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::new(0.0, 1.0, 0.0),
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
            // Cached values (initialized to defaults)
            center: Vec3::ZERO,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
            defocus_angle_rad: 0.0,
        }
    }

    /// The elevated diagonal view of the three-sphere scene, initialized
    /// and ready for ray generation.
    pub fn classic_view(width: u32, height: u32) -> Self {
        let look_from = Vec3::new(-2.0, 2.0, 1.0);
        let look_at = Vec3::new(0.0, 0.0, -1.0);

        let mut camera = Self::new()
            .with_resolution(width, height)
            .with_position(look_from, look_at, Vec3::Y)
            .with_lens(30.0, 1.6, (look_at - look_from).length());
        camera.initialize();
        camera
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples;
        self.max_depth = max_depth;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    /// Initialize the camera (must be called before generating rays).
    pub fn initialize(&mut self) {
        self.center = self.look_from;

        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize();
        self.u = self.vup.cross(self.w).normalize();
        self.v = self.w.cross(self.u);

        // Calculate viewport vectors
        let viewport_u = viewport_width * self.u;
        let viewport_v = -viewport_height * self.v;

        // Calculate pixel delta vectors
        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        // Calculate upper left pixel location
        let viewport_upper_left =
            self.center - self.focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;

        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        // Calculate defocus disk basis vectors
        self.defocus_angle_rad = self.defocus_angle.to_radians();
        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = self.u * defocus_radius;
        self.defocus_disk_v = self.v * defocus_radius;
    }

    /// Generate a ray for pixel (i, j) with random sampling.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square(rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        Ray::new(ray_origin, pixel_sample - ray_origin)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }

    /// Camera position.
    pub fn look_from(&self) -> Vec3 {
        self.look_from
    }

    /// Unit vector the camera is looking along.
    pub fn forward(&self) -> Vec3 {
        -self.w
    }

    /// Unit vector to the camera's right.
    pub fn right(&self) -> Vec3 {
        self.u
    }

    /// Move the camera and its target together by a world-space delta.
    pub fn translate(&mut self, delta: Vec3) {
        self.look_from += delta;
        self.look_at += delta;
        self.initialize();
    }

    /// Turn the view direction by yaw/pitch deltas in radians.
    ///
    /// The look target swings around the camera position; pitch is clamped
    /// short of the poles.
    pub fn rotate_look(&mut self, yaw_delta: f32, pitch_delta: f32) {
        let offset = self.look_at - self.look_from;
        let distance = offset.length();
        if distance < 1e-6 {
            return;
        }

        let dir = offset / distance;
        let mut yaw = dir.z.atan2(dir.x);
        let mut pitch = dir.y.asin();

        yaw += yaw_delta;
        pitch = (pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let new_dir = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );

        self.look_at = self.look_from + new_dir * distance;
        self.initialize();
    }

    /// Move the camera along the view direction, keeping the target fixed.
    ///
    /// Stops short of the target so the basis never degenerates.
    pub fn dolly(&mut self, amount: f32) {
        let to_target = self.look_at - self.look_from;
        let distance = to_target.length();

        let amount = amount.min((distance - 0.2).max(0.0));
        if amount.abs() < 1e-6 || distance < 1e-6 {
            return;
        }

        self.look_from += (to_target / distance) * amount;
        self.initialize();
    }
}

impl Default for TracerCamera {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample a random point in the unit square [-0.5, 0.5] x [-0.5, 0.5].
fn sample_square(rng: &mut dyn RngCore) -> Vec3 {
    Vec3::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_camera_initialize() {
        let mut camera = TracerCamera::new()
            .with_resolution(800, 600)
            .with_position(
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, -1.0),
                Vec3::new(0.0, 1.0, 0.0),
            )
            .with_lens(90.0, 0.0, 1.0);

        camera.initialize();

        assert_eq!(camera.center, Vec3::ZERO);
        assert!((camera.w - Vec3::Z).length() < 0.001);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 0.001);
    }

    #[test]
    fn test_camera_ray_direction() {
        let mut camera = TracerCamera::new()
            .with_resolution(100, 100)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(90.0, 0.0, 1.0);

        camera.initialize();

        let mut rng = StdRng::seed_from_u64(42);

        // Center ray should point roughly towards -Z
        let ray = camera.get_ray(50, 50, &mut rng);
        assert!(ray.direction.z < 0.0);
    }

    #[test]
    fn test_classic_view() {
        let camera = TracerCamera::classic_view(1280, 900);

        assert_eq!(camera.image_width, 1280);
        assert_eq!(camera.image_height, 900);
        assert_eq!(camera.look_from(), Vec3::new(-2.0, 2.0, 1.0));

        // Already initialized: forward points from the perch down at the scene
        let expected = (Vec3::new(0.0, 0.0, -1.0) - Vec3::new(-2.0, 2.0, 1.0)).normalize();
        assert!((camera.forward() - expected).length() < 0.001);
    }

    #[test]
    fn test_translate_preserves_direction() {
        let mut camera = TracerCamera::classic_view(100, 100);
        let forward_before = camera.forward();

        camera.translate(Vec3::new(1.0, 0.0, 0.0));

        assert_eq!(camera.look_from(), Vec3::new(-1.0, 2.0, 1.0));
        assert!((camera.forward() - forward_before).length() < 0.001);
    }

    #[test]
    fn test_rotate_look_pitch_clamp() {
        let mut camera = TracerCamera::classic_view(100, 100);

        // Pitch far past vertical; the basis must stay finite
        camera.rotate_look(0.0, 10.0);

        assert!(camera.forward().is_finite());
        assert!(camera.forward().y < 1.0);
        assert!(camera.pixel_delta_u.is_finite());
    }

    #[test]
    fn test_dolly_stops_short_of_target() {
        let mut camera = TracerCamera::classic_view(100, 100);

        // Try to fly well past the target
        camera.dolly(1000.0);

        let remaining = (Vec3::new(0.0, 0.0, -1.0) - camera.look_from()).length();
        assert!(remaining >= 0.19);
    }
}
