//! Glint tracer - path tracing scene model and CPU reference renderer.
//!
//! The sphere scene, materials and camera defined here are shared by two
//! renderers: the GPU compute kernel in the viewport (which consumes the
//! flat `Gpu*` layouts) and the Monte Carlo CPU renderer in this crate.
//! Both implement the same scattering model, so a CPU render is ground
//! truth for the kernel output.

mod camera;
mod gpu;
mod material;
mod render;
mod rng;
mod scene;
mod sphere;

pub use camera::TracerCamera;
pub use gpu::{GpuCamera, GpuSphere};
pub use material::{Color, ScatterResult, SurfaceKind};
pub use render::{
    color_to_rgba, linear_to_gamma, ray_color, render, render_pixel, ImageBuffer,
};
pub use rng::gen_f32;
pub use scene::{Scene, SceneFileError};
pub use sphere::{Hit, Sphere};

/// Re-export common math types
pub use glint_math::{Interval, Ray, Vec3};
