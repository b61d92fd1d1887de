//! wgpu windowing and render plumbing shared by the Glint demos.
//!
//! [`GpuContext`] owns the surface, device and queue for one window.
//! [`EguiLayer`] runs the egui overlay as a final render pass. On top of
//! those sit the two demo renderers: [`ForwardRenderer`] draws a textured
//! mesh through an FXAA resolve, [`TraceRenderer`] accumulates a path-traced
//! image with a compute kernel and resolves it to the swapchain.

mod context;
mod egui_layer;
mod forward;
mod fxaa;
mod trace;

pub use context::{FpsCounter, GpuContext};
pub use egui_layer::EguiLayer;
pub use forward::ForwardRenderer;
pub use fxaa::{FxaaSettings, FxaaUniform};
pub use trace::TraceRenderer;
