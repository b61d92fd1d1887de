//! Progressive GPU path tracer.
//!
//! A compute pass adds a few paths per pixel to a radiance accumulation
//! buffer each frame; a fullscreen display pass divides by the running
//! sample count. Camera moves restart accumulation, so the image sharpens
//! whenever the view holds still.

use std::sync::Arc;

use anyhow::{Context, Result};
use bytemuck::Zeroable;
use glint_tracer::{Color, GpuCamera, GpuSphere, ImageBuffer, Scene, TracerCamera};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::context::{FpsCounter, GpuContext};
use crate::egui_layer::EguiLayer;

/// Uniform block shared by the compute and display passes.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct TraceUniforms {
    camera: GpuCamera,
    width: u32,
    height: u32,
    accumulated_samples: u32,
    samples_per_frame: u32,
    max_depth: u32,
    sphere_count: u32,
    _pad: [u32; 2],
}

/// Per-pixel xorshift32 seeds. Zero is a fixed point of xorshift, so every
/// seed is forced nonzero.
fn seeded_rng_states(pixel_count: usize) -> Vec<u32> {
    let mut rng = StdRng::from_entropy();
    (0..pixel_count).map(|_| rng.gen::<u32>().max(1)).collect()
}

/// Average raw accumulation sums (RGBA32F texels) into a displayable image.
fn average_to_image(sums: &[f32], width: u32, height: u32, samples: u32) -> ImageBuffer {
    let mut image = ImageBuffer::new(width, height);
    let scale = 1.0 / samples.max(1) as f32;

    for (pixel, texel) in image.pixels.iter_mut().zip(sums.chunks_exact(4)) {
        *pixel = Color::new(texel[0], texel[1], texel[2]) * scale;
    }

    image
}

/// Renderer accumulating path traced samples across frames.
pub struct TraceRenderer {
    gpu: GpuContext,
    pub camera: TracerCamera,
    pub samples_per_frame: u32,
    pub max_depth: u32,
    pub paused: bool,
    pub show_ui: bool,

    uniforms: TraceUniforms,
    uniform_buffer: wgpu::Buffer,
    sphere_buffer: wgpu::Buffer,
    sphere_count: u32,
    accum_buffer: wgpu::Buffer,
    rng_buffer: wgpu::Buffer,

    compute_pipeline: wgpu::ComputePipeline,
    compute_bind_group_layout: wgpu::BindGroupLayout,
    compute_bind_group: wgpu::BindGroup,
    display_pipeline: wgpu::RenderPipeline,
    display_bind_group_layout: wgpu::BindGroupLayout,
    display_bind_group: wgpu::BindGroup,

    egui: EguiLayer,

    accumulated_samples: u32,
    needs_reset: bool,
    snapshot_requested: bool,
    snapshot_counter: u32,
    fps: FpsCounter,
}

impl TraceRenderer {
    /// Create a renderer for the given window and sphere scene.
    pub async fn new(window: Arc<Window>, scene: &Scene) -> Result<Self> {
        let gpu = GpuContext::new(window.clone()).await?;
        let device = &gpu.device;

        let limits = device.limits();
        log::info!(
            "Compute limits: workgroup size {}x{}x{}, {} invocations, {} bytes workgroup storage",
            limits.max_compute_workgroup_size_x,
            limits.max_compute_workgroup_size_y,
            limits.max_compute_workgroup_size_z,
            limits.max_compute_invocations_per_workgroup,
            limits.max_compute_workgroup_storage_size,
        );

        let camera = TracerCamera::classic_view(gpu.size.0, gpu.size.1);
        let samples_per_frame = 6;
        let max_depth = camera.max_depth;

        // Scene upload. Zero-sized bindings are rejected, so an empty scene
        // still uploads one placeholder sphere; sphere_count stays 0 and the
        // kernel never reads it.
        let gpu_spheres = scene.gpu_spheres();
        let sphere_count = gpu_spheres.len() as u32;
        log::info!("Scene: {} spheres", sphere_count);

        let sphere_contents = if gpu_spheres.is_empty() {
            vec![GpuSphere::zeroed()]
        } else {
            gpu_spheres
        };
        let sphere_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Buffer"),
            contents: bytemuck::cast_slice(&sphere_contents),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let uniforms = TraceUniforms {
            camera: camera.gpu_camera(),
            width: gpu.size.0,
            height: gpu.size.1,
            accumulated_samples: 0,
            samples_per_frame,
            max_depth,
            sphere_count,
            _pad: [0; 2],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Trace Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let (accum_buffer, rng_buffer) = Self::create_accum_buffers(device, gpu.size);

        // Compute pipeline
        let compute_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Trace Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let compute_bind_group = Self::create_compute_bind_group(
            device,
            &compute_bind_group_layout,
            &uniform_buffer,
            &sphere_buffer,
            &accum_buffer,
            &rng_buffer,
        );

        let trace_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Trace Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/pathtrace.wgsl").into()),
        });

        let compute_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Trace Pipeline Layout"),
                bind_group_layouts: &[&compute_bind_group_layout],
                push_constant_ranges: &[],
            });

        let compute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Trace Pipeline"),
            layout: Some(&compute_pipeline_layout),
            module: &trace_shader,
            entry_point: "cs_main",
            compilation_options: Default::default(),
            cache: None,
        });

        // Display pipeline
        let display_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Display Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let display_bind_group = Self::create_display_bind_group(
            device,
            &display_bind_group_layout,
            &uniform_buffer,
            &accum_buffer,
        );

        let display_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Display Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/display.wgsl").into()),
        });

        let display_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Display Pipeline Layout"),
                bind_group_layouts: &[&display_bind_group_layout],
                push_constant_ranges: &[],
            });

        let display_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Display Pipeline"),
            layout: Some(&display_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &display_shader,
                entry_point: "vs_fullscreen",
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &display_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // Fullscreen triangle
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let egui = EguiLayer::new(&window, device, gpu.config.format);

        Ok(Self {
            gpu,
            camera,
            samples_per_frame,
            max_depth,
            paused: false,
            show_ui: true,
            uniforms,
            uniform_buffer,
            sphere_buffer,
            sphere_count,
            accum_buffer,
            rng_buffer,
            compute_pipeline,
            compute_bind_group_layout,
            compute_bind_group,
            display_pipeline,
            display_bind_group_layout,
            display_bind_group,
            egui,
            accumulated_samples: 0,
            needs_reset: false,
            snapshot_requested: false,
            snapshot_counter: 0,
            fps: FpsCounter::default(),
        })
    }

    /// Allocate the accumulation and RNG state buffers for a drawable size.
    /// New buffers start zeroed, so the accumulation is implicitly reset.
    fn create_accum_buffers(
        device: &wgpu::Device,
        size: (u32, u32),
    ) -> (wgpu::Buffer, wgpu::Buffer) {
        let pixel_count = (size.0 as u64) * (size.1 as u64);

        let accum_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Accumulation Buffer"),
            size: pixel_count * 16, // vec4<f32> per pixel
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let rng_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("RNG State Buffer"),
            contents: bytemuck::cast_slice(&seeded_rng_states(pixel_count as usize)),
            usage: wgpu::BufferUsages::STORAGE,
        });

        (accum_buffer, rng_buffer)
    }

    fn create_compute_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        sphere_buffer: &wgpu::Buffer,
        accum_buffer: &wgpu::Buffer,
        rng_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Trace Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: sphere_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: accum_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: rng_buffer.as_entire_binding(),
                },
            ],
        })
    }

    fn create_display_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        accum_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Display Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: accum_buffer.as_entire_binding(),
                },
            ],
        })
    }

    /// Current drawable size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.gpu.size
    }

    /// Handle window resize: reallocate the per-pixel buffers and restart
    /// accumulation at the new resolution.
    pub fn resize(&mut self, new_size: (u32, u32)) {
        if !self.gpu.resize(new_size) {
            return;
        }

        self.camera.image_width = new_size.0;
        self.camera.image_height = new_size.1;
        self.camera.initialize();

        let (accum_buffer, rng_buffer) = Self::create_accum_buffers(&self.gpu.device, new_size);
        self.accum_buffer = accum_buffer;
        self.rng_buffer = rng_buffer;

        self.compute_bind_group = Self::create_compute_bind_group(
            &self.gpu.device,
            &self.compute_bind_group_layout,
            &self.uniform_buffer,
            &self.sphere_buffer,
            &self.accum_buffer,
            &self.rng_buffer,
        );
        self.display_bind_group = Self::create_display_bind_group(
            &self.gpu.device,
            &self.display_bind_group_layout,
            &self.uniform_buffer,
            &self.accum_buffer,
        );

        self.accumulated_samples = 0;
        self.needs_reset = false;
    }

    /// Call after modifying the camera; restarts accumulation.
    pub fn update_camera(&mut self) {
        self.needs_reset = true;
    }

    /// Throw away accumulated samples and start over.
    pub fn reset_accumulation(&mut self) {
        self.needs_reset = true;
    }

    /// Save the current accumulation to a PNG after the next frame.
    pub fn request_snapshot(&mut self) {
        self.snapshot_requested = true;
    }

    /// Handle egui window event - returns true if event was consumed by egui
    pub fn handle_egui_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        self.egui.on_window_event(window, event)
    }

    /// Whether the UI currently wants the pointer (suppresses camera drag).
    pub fn wants_pointer(&self) -> bool {
        self.egui.wants_pointer()
    }

    /// Update FPS counter (call each frame with delta_time)
    pub fn update_fps(&mut self, delta_time: f32) {
        self.fps.tick(delta_time);
    }

    /// Render a frame: accumulate paths (unless paused), display the
    /// running average, then the UI overlay.
    pub fn render(&mut self, window: &Window) -> Result<()> {
        let output = self.gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Trace Encoder"),
            });

        if self.needs_reset {
            encoder.clear_buffer(&self.accum_buffer, 0, None);
            self.accumulated_samples = 0;
            self.needs_reset = false;
        }

        // Count this frame's samples before the single uniform upload, so
        // the kernel's additions and the display divisor agree.
        if !self.paused {
            self.accumulated_samples = self
                .accumulated_samples
                .saturating_add(self.samples_per_frame);
        }

        self.uniforms = TraceUniforms {
            camera: self.camera.gpu_camera(),
            width: self.gpu.size.0,
            height: self.gpu.size.1,
            accumulated_samples: self.accumulated_samples,
            samples_per_frame: self.samples_per_frame,
            max_depth: self.max_depth,
            sphere_count: self.sphere_count,
            _pad: [0; 2],
        };
        self.gpu
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[self.uniforms]));

        if !self.paused {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Trace Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.compute_pipeline);
            compute_pass.set_bind_group(0, &self.compute_bind_group, &[]);
            compute_pass.dispatch_workgroups(
                self.gpu.size.0.div_ceil(8),
                self.gpu.size.1.div_ceil(8),
                1,
            );
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Display Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.display_pipeline);
            render_pass.set_bind_group(0, &self.display_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        // Build UI - split borrows so the closure does not capture self
        let show_ui = self.show_ui;
        let fps = self.fps.fps();
        let accumulated = self.accumulated_samples;
        let sphere_count = self.sphere_count;
        let size = self.gpu.size;
        let look_from = self.camera.look_from();
        let mut paused = self.paused;
        let mut samples_per_frame = self.samples_per_frame;
        let mut max_depth = self.max_depth;
        let mut reset_clicked = false;
        let mut snapshot_clicked = false;

        self.egui.draw(
            window,
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &view,
            self.gpu.size,
            |ctx| {
                if !show_ui {
                    return;
                }

                egui::SidePanel::left("trace_panel")
                    .default_width(300.0)
                    .show(ctx, |ui| {
                        ui.heading("Glint Path Tracer");
                        ui.separator();

                        ui.label(format!("FPS: {:.1}", fps));
                        ui.label(format!("Accumulated samples: {}", accumulated));
                        ui.separator();

                        ui.checkbox(&mut paused, "Pause (Space)");
                        ui.add(
                            egui::Slider::new(&mut samples_per_frame, 1..=32)
                                .text("Samples/frame"),
                        );
                        ui.add(egui::Slider::new(&mut max_depth, 1..=64).text("Max depth"));

                        if ui.button("Reset accumulation").clicked() {
                            reset_clicked = true;
                        }
                        if ui.button("Save snapshot (P)").clicked() {
                            snapshot_clicked = true;
                        }

                        ui.separator();

                        ui.collapsing("Scene", |ui| {
                            ui.label(format!("Spheres: {}", sphere_count));
                            ui.label(format!("Resolution: {}x{}", size.0, size.1));
                        });

                        ui.separator();

                        ui.collapsing("Camera", |ui| {
                            ui.label(format!(
                                "Position: ({:.2}, {:.2}, {:.2})",
                                look_from.x, look_from.y, look_from.z
                            ));
                        });

                        ui.separator();

                        ui.collapsing("Controls", |ui| {
                            ui.label("W/A/S/D: Move, Q/E: Down/Up");
                            ui.label("Right mouse: Look around");
                            ui.label("Scroll: Dolly");
                            ui.label("Space: Pause, P: Snapshot");
                            ui.label("R: Reset accumulation, U: Toggle UI");
                            ui.label("Esc: Quit");
                        });
                    });
            },
        );

        // Write UI edits back
        self.paused = paused;
        self.samples_per_frame = samples_per_frame;
        if max_depth != self.max_depth {
            // A depth change invalidates everything accumulated so far
            self.max_depth = max_depth;
            self.needs_reset = true;
        }
        if reset_clicked {
            self.needs_reset = true;
        }
        if snapshot_clicked {
            self.snapshot_requested = true;
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if self.snapshot_requested {
            self.snapshot_requested = false;
            if let Err(e) = self.save_snapshot() {
                log::error!("Snapshot failed: {e:#}");
            }
        }

        Ok(())
    }

    /// Read the accumulation buffer back and save the averaged image.
    fn save_snapshot(&mut self) -> Result<()> {
        let (width, height) = self.gpu.size;
        let size_bytes = (width as u64) * (height as u64) * 16;

        let staging = self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Snapshot Staging Buffer"),
            size: size_bytes,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Snapshot Encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.accum_buffer, 0, &staging, 0, size_bytes);
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.gpu.device.poll(wgpu::Maintain::Wait);
        rx.recv().context("Snapshot readback did not complete")??;

        let data = slice.get_mapped_range();
        let image = average_to_image(
            bytemuck::cast_slice(&data),
            width,
            height,
            self.accumulated_samples,
        );
        drop(data);
        staging.unmap();

        self.snapshot_counter += 1;
        let path = format!("glint_snapshot_{:03}.png", self.snapshot_counter);
        image.save_png(&path)?;
        log::info!("Saved {} ({} samples/pixel)", path, self.accumulated_samples);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniforms_layout() {
        // Camera block plus six counters and explicit tail padding
        assert_eq!(std::mem::size_of::<GpuCamera>(), 96);
        assert_eq!(std::mem::size_of::<TraceUniforms>(), 128);
    }

    #[test]
    fn test_rng_states_nonzero() {
        let states = seeded_rng_states(4096);
        assert_eq!(states.len(), 4096);
        assert!(states.iter().all(|&s| s != 0));
    }

    #[test]
    fn test_average_to_image() {
        let sums = [2.0, 4.0, 6.0, 0.0, 1.0, 1.0, 1.0, 0.0];
        let image = average_to_image(&sums, 2, 1, 2);

        assert!((image.get(0, 0) - Color::new(1.0, 2.0, 3.0)).length() < 1e-6);
        assert!((image.get(1, 0) - Color::new(0.5, 0.5, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_average_to_image_zero_samples() {
        // Before any accumulation the divisor clamps to one
        let sums = [3.0, 0.0, 0.0, 0.0];
        let image = average_to_image(&sums, 1, 1, 0);
        assert!((image.get(0, 0).x - 3.0).abs() < 1e-6);
    }
}
