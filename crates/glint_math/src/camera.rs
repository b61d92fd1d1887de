use glam::{Mat4, Vec3};

/// Free-flying first person camera driven by keyboard and mouse deltas.
///
/// Orientation is stored as yaw/pitch (radians) rather than a target point
/// so mouse-look composes cleanly frame to frame. Pitch is clamped short of
/// the poles to keep the view basis stable.
#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Mouse-look sensitivity in radians per pixel.
    pub sensitivity: f32,
}

const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;
const MIN_FOV_Y: f32 = 1.0 * std::f32::consts::PI / 180.0;
const MAX_FOV_Y: f32 = 60.0 * std::f32::consts::PI / 180.0;

impl FlyCamera {
    /// Create a camera at the origin looking down -Z.
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: -std::f32::consts::FRAC_PI_2,
            pitch: 0.0,
            fov_y: 45.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 100.0,
            speed: 2.5,
            sensitivity: 0.002,
        }
    }

    /// Unit vector the camera is looking along.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    /// Unit vector to the camera's right, parallel to the ground plane.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Get the view matrix (world -> camera space).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    /// Get the projection matrix (camera -> clip space).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Get the combined view-projection matrix.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update aspect ratio (e.g., on window resize).
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Move along the view direction. Negative dt-scaled amounts move backward.
    pub fn move_forward(&mut self, dt: f32) {
        self.position += self.forward() * self.speed * dt;
    }

    /// Strafe right (negative dt moves left).
    pub fn move_right(&mut self, dt: f32) {
        self.position += self.right() * self.speed * dt;
    }

    /// Move along world up (negative dt moves down).
    pub fn move_up(&mut self, dt: f32) {
        self.position += Vec3::Y * self.speed * dt;
    }

    /// Apply a mouse-look delta in pixels. Screen-space y grows downward.
    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw += delta_x * self.sensitivity;
        self.pitch = (self.pitch - delta_y * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Narrow or widen the field of view, as on a scroll wheel.
    pub fn zoom(&mut self, delta: f32) {
        self.fov_y = (self.fov_y - delta.to_radians()).clamp(MIN_FOV_Y, MAX_FOV_Y);
    }

    /// Point the camera at a world-space target.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.length_squared() < 1e-12 {
            return;
        }
        let dir = dir.normalize();
        self.pitch = dir.y.asin().clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw = dir.z.atan2(dir.x);
    }

    /// Position the camera to frame a bounding box.
    ///
    /// Backs off along a slightly elevated view direction by 1.5x the box
    /// diagonal and scales the clip planes to the scene, so both small
    /// props and large environments frame sensibly.
    pub fn frame(&mut self, center: Vec3, diagonal: f32) {
        let distance = (diagonal * 1.5).max(0.5);
        let offset = Vec3::new(0.0, 0.35, 1.0).normalize() * distance;

        self.position = center + offset;
        self.near = (distance * 0.01).max(0.001);
        self.far = distance * 20.0;
        self.look_at(center);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera() {
        let camera = FlyCamera::new(16.0 / 9.0);
        let vp = camera.view_projection();

        // Looks down -Z and produces a finite matrix
        assert!((camera.forward() - Vec3::NEG_Z).length() < 0.001);
        assert!(vp.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_camera_movement() {
        let mut camera = FlyCamera::new(1.0);
        camera.move_forward(1.0);

        // Default speed 2.5, looking down -Z
        assert!((camera.position - Vec3::new(0.0, 0.0, -2.5)).length() < 0.001);

        camera.move_right(1.0);
        assert!((camera.position.x - (-2.5)).abs() < 0.001);
    }

    #[test]
    fn test_pitch_clamp() {
        let mut camera = FlyCamera::new(1.0);

        // A huge upward drag must not flip over the pole
        camera.rotate(0.0, -100000.0);
        assert!(camera.pitch <= PITCH_LIMIT + 1e-6);

        camera.rotate(0.0, 100000.0);
        assert!(camera.pitch >= -PITCH_LIMIT - 1e-6);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = FlyCamera::new(1.0);

        camera.zoom(1000.0);
        assert!((camera.fov_y - MIN_FOV_Y).abs() < 1e-6);

        camera.zoom(-1000.0);
        assert!((camera.fov_y - MAX_FOV_Y).abs() < 1e-6);
    }

    #[test]
    fn test_look_at() {
        let mut camera = FlyCamera::new(1.0);
        camera.position = Vec3::new(0.0, 0.0, 5.0);
        camera.look_at(Vec3::ZERO);

        assert!((camera.forward() - Vec3::NEG_Z).length() < 0.001);
    }

    #[test]
    fn test_frame_looks_at_center() {
        let mut camera = FlyCamera::new(1.0);
        let center = Vec3::new(1.0, 2.0, 3.0);
        camera.frame(center, 10.0);

        let to_center = (center - camera.position).normalize();
        assert!((camera.forward() - to_center).length() < 0.001);
        assert!(camera.near < camera.far);
    }
}
