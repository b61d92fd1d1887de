//! GPU bring-up and surface management.

use anyhow::Result;
use wgpu::{Device, Instance, Queue, Surface, SurfaceConfiguration};

/// Shared wgpu state for one window: surface, device, queue, configuration.
///
/// Both demo renderers own one of these; everything size-dependent they
/// create (offscreen targets, accumulation buffers) is rebuilt when
/// [`resize`](GpuContext::resize) accepts a new size.
pub struct GpuContext {
    pub surface: Surface<'static>,
    pub device: Device,
    pub queue: Queue,
    pub config: SurfaceConfiguration,
    pub size: (u32, u32),
}

impl GpuContext {
    /// Bring up the GPU for the given window.
    pub async fn new(window: std::sync::Arc<winit::window::Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        log::info!("Adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Glint Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Mailbox, // VSync
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        log::info!("Surface configured: {}x{} {:?}", size.width, size.height, surface_format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size: (size.width, size.height),
        })
    }

    /// Reconfigure the surface for a new window size.
    ///
    /// Returns false for zero-area sizes (minimized windows), which are
    /// ignored; callers only rebuild their size-dependent resources on true.
    pub fn resize(&mut self, new_size: (u32, u32)) -> bool {
        if new_size.0 == 0 || new_size.1 == 0 {
            return false;
        }
        self.size = new_size;
        self.config.width = new_size.0;
        self.config.height = new_size.1;
        self.surface.configure(&self.device, &self.config);
        true
    }

    pub fn aspect(&self) -> f32 {
        self.size.0 as f32 / self.size.1 as f32
    }
}

/// Frame-rate tracker. Recomputes the average over half-second windows so
/// the readout is stable enough to display.
pub struct FpsCounter {
    fps: f32,
    frame_count: u32,
    update_timer: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            fps: 0.0,
            frame_count: 0,
            update_timer: 0.0,
        }
    }

    /// Record one frame; `delta_time` is in seconds.
    pub fn tick(&mut self, delta_time: f32) {
        self.frame_count += 1;
        self.update_timer += delta_time;

        if self.update_timer >= 0.5 {
            self.fps = self.frame_count as f32 / self.update_timer;
            self.frame_count = 0;
            self.update_timer = 0.0;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
