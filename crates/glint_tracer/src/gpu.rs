//! Flat GPU layouts for the compute kernel.
//!
//! These structs are byte-for-byte mirrors of the WGSL declarations in the
//! viewport's trace kernel. Field order and padding follow WGSL struct
//! layout rules: vec3 members align to 16 bytes, struct sizes round up to
//! the struct alignment.

use crate::camera::TracerCamera;
use crate::material::SurfaceKind;
use crate::scene::Scene;

/// Surface kind tags shared with the WGSL kernel.
pub const SURFACE_LAMBERTIAN: u32 = 0;
pub const SURFACE_METAL: u32 = 1;
pub const SURFACE_DIELECTRIC: u32 = 2;

/// One sphere in the storage buffer consumed by the kernel.
///
/// `param` carries the fuzz for metal and the index of refraction for
/// dielectric surfaces.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 3],
    pub radius: f32,
    pub albedo: [f32; 3],
    pub param: f32,
    pub kind: u32,
    pub _pad: [u32; 3],
}

impl From<&crate::Sphere> for GpuSphere {
    fn from(sphere: &crate::Sphere) -> Self {
        let (kind, albedo, param) = match sphere.surface {
            SurfaceKind::Lambertian { albedo } => (SURFACE_LAMBERTIAN, albedo, 0.0),
            SurfaceKind::Metal { albedo, fuzz } => (SURFACE_METAL, albedo, fuzz),
            SurfaceKind::Dielectric { ior } => (SURFACE_DIELECTRIC, crate::Vec3::ONE, ior),
        };

        Self {
            center: sphere.center.to_array(),
            radius: sphere.radius,
            albedo: albedo.to_array(),
            param,
            kind,
            _pad: [0; 3],
        }
    }
}

impl Scene {
    /// Pack the scene into the sphere storage buffer layout.
    pub fn gpu_spheres(&self) -> Vec<GpuSphere> {
        self.spheres.iter().map(GpuSphere::from).collect()
    }
}

/// Ray generation inputs for the kernel, derived from [`TracerCamera`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuCamera {
    pub origin: [f32; 3],
    /// Defocus angle in radians; zero disables the lens sample.
    pub defocus_angle: f32,
    pub pixel00: [f32; 3],
    pub _pad0: f32,
    pub pixel_delta_u: [f32; 3],
    pub _pad1: f32,
    pub pixel_delta_v: [f32; 3],
    pub _pad2: f32,
    pub defocus_disk_u: [f32; 3],
    pub _pad3: f32,
    pub defocus_disk_v: [f32; 3],
    pub _pad4: f32,
}

impl TracerCamera {
    /// Export the initialized pixel-grid basis for the kernel.
    pub fn gpu_camera(&self) -> GpuCamera {
        GpuCamera {
            origin: self.center.to_array(),
            defocus_angle: self.defocus_angle_rad,
            pixel00: self.pixel00_loc.to_array(),
            _pad0: 0.0,
            pixel_delta_u: self.pixel_delta_u.to_array(),
            _pad1: 0.0,
            pixel_delta_v: self.pixel_delta_v.to_array(),
            _pad2: 0.0,
            defocus_disk_u: self.defocus_disk_u.to_array(),
            _pad3: 0.0,
            defocus_disk_v: self.defocus_disk_v.to_array(),
            _pad4: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Color;
    use crate::{Sphere, Vec3};

    #[test]
    fn test_gpu_sphere_layout() {
        // Must match the WGSL struct stride
        assert_eq!(std::mem::size_of::<GpuSphere>(), 48);
        assert_eq!(std::mem::size_of::<GpuCamera>(), 96);
    }

    #[test]
    fn test_sphere_packing() {
        let sphere = Sphere::new(
            Vec3::new(1.0, 2.0, 3.0),
            0.5,
            SurfaceKind::Metal {
                albedo: Color::new(0.8, 0.6, 0.2),
                fuzz: 0.3,
            },
        );

        let gpu = GpuSphere::from(&sphere);

        assert_eq!(gpu.center, [1.0, 2.0, 3.0]);
        assert_eq!(gpu.radius, 0.5);
        assert_eq!(gpu.albedo, [0.8, 0.6, 0.2]);
        assert_eq!(gpu.param, 0.3);
        assert_eq!(gpu.kind, SURFACE_METAL);
    }

    #[test]
    fn test_dielectric_packing_carries_ior() {
        let sphere = Sphere::new(Vec3::ZERO, -0.45, SurfaceKind::Dielectric { ior: 1.5 });
        let gpu = GpuSphere::from(&sphere);

        assert_eq!(gpu.kind, SURFACE_DIELECTRIC);
        assert_eq!(gpu.param, 1.5);
        // Negative radius survives for the hollow shell
        assert_eq!(gpu.radius, -0.45);
    }

    #[test]
    fn test_scene_packing() {
        let scene = Scene::three_spheres();
        let spheres = scene.gpu_spheres();

        assert_eq!(spheres.len(), scene.sphere_count());
        assert_eq!(spheres[0].kind, SURFACE_LAMBERTIAN);
    }

    #[test]
    fn test_camera_export() {
        let camera = TracerCamera::classic_view(1280, 900);
        let gpu = camera.gpu_camera();

        assert_eq!(gpu.origin, [-2.0, 2.0, 1.0]);
        assert!(gpu.defocus_angle > 0.0);
        // Pixel deltas step in opposite screen directions
        let du = Vec3::from_array(gpu.pixel_delta_u);
        let dv = Vec3::from_array(gpu.pixel_delta_v);
        assert!(du.length() > 0.0);
        assert!(dv.length() > 0.0);
        assert!(du.dot(dv).abs() < 1e-6);
    }
}
