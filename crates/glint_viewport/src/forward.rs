//! Forward mesh renderer with an FXAA post pass.
//!
//! The mesh pass draws into an offscreen color/depth target; the FXAA pass
//! samples that target and writes the antialiased result to the swapchain.

use std::sync::Arc;

use anyhow::Result;
use glint_math::{FlyCamera, Mat4, Vec3};
use glint_scene::{Mesh, Texture};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::context::{FpsCounter, GpuContext};
use crate::egui_layer::EguiLayer;
use crate::fxaa::{self, FxaaSettings};

/// Vertex data for rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Interleave mesh attributes for upload, substituting defaults where the
/// source mesh carries no normals or UVs.
fn mesh_vertices(mesh: &Mesh) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(mesh.positions.len());

    for (i, position) in mesh.positions.iter().enumerate() {
        let normal = mesh
            .normals
            .as_ref()
            .and_then(|normals| normals.get(i))
            .copied()
            .unwrap_or(Vec3::Y);
        let uv = mesh
            .uvs
            .as_ref()
            .and_then(|uvs| uvs.get(i))
            .copied()
            .unwrap_or([0.0, 0.0]);

        vertices.push(Vertex {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
        });
    }

    vertices
}

/// Camera uniform data for shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }

    fn update_view_proj(&mut self, camera: &FlyCamera) {
        self.view_proj = camera.view_projection().to_cols_array_2d();
    }
}

/// Offscreen color and depth pair the mesh pass renders into. The color
/// side is sampled by the FXAA pass, so it gets TEXTURE_BINDING usage.
struct SceneTarget {
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

impl SceneTarget {
    const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
    const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn new(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let extent = wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        };

        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Color Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Self {
            color_view: color_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth_texture.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }
}

/// Renderer drawing a lit, textured mesh with FXAA on the way out.
pub struct ForwardRenderer {
    gpu: GpuContext,
    pub camera: FlyCamera,
    pub settings: FxaaSettings,
    pub show_ui: bool,

    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    mesh_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    texture_bind_group: wgpu::BindGroup,

    scene_target: SceneTarget,
    scene_sampler: wgpu::Sampler,
    fxaa_pipeline: wgpu::RenderPipeline,
    fxaa_uniform_buffer: wgpu::Buffer,
    fxaa_bind_group_layout: wgpu::BindGroupLayout,
    fxaa_bind_group: wgpu::BindGroup,

    egui: EguiLayer,

    mesh_center: Vec3,
    mesh_diagonal: f32,
    num_triangles: u32,
    num_vertices: u32,
    fps: FpsCounter,
}

impl ForwardRenderer {
    /// Create a renderer for the given window, uploading the mesh and its
    /// diffuse texture.
    pub async fn new(window: Arc<Window>, mesh: &Mesh, texture: &Texture) -> Result<Self> {
        let gpu = GpuContext::new(window.clone()).await?;
        let device = &gpu.device;

        log::info!(
            "Mesh: {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        log::info!(
            "Mesh bounds: min={:?}, max={:?}",
            mesh.bounds.min,
            mesh.bounds.max
        );
        log::info!("Mesh center: {:?}, size: {:.2}", mesh.center(), mesh.size());

        let mesh_center = mesh.center();
        let mesh_diagonal = mesh.size();

        // Frame the mesh and scale fly speed to the scene so WASD crosses
        // it in a few seconds regardless of model units.
        let mut camera = FlyCamera::new(gpu.aspect());
        camera.frame(mesh_center, mesh_diagonal);
        camera.speed = (mesh_diagonal * 0.5).max(1.0);

        log::info!(
            "Camera positioned at {:?}, near={:.3}, far={:.1}",
            camera.position,
            camera.near,
            camera.far
        );

        // Camera uniform buffer
        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // Upload the diffuse texture
        let texture_extent = wgpu::Extent3d {
            width: texture.width,
            height: texture.height,
            depth_or_array_layers: 1,
        };

        let diffuse_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Diffuse Texture"),
            size: texture_extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        gpu.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &diffuse_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &texture.rgba8,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * texture.width),
                rows_per_image: Some(texture.height),
            },
            texture_extent,
        );

        let diffuse_view = diffuse_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let diffuse_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Diffuse Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture Bind Group"),
            layout: &texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse_sampler),
                },
            ],
        });

        // Mesh pipeline, rendering into the offscreen scene target
        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let mesh_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Mesh Pipeline Layout"),
                bind_group_layouts: &[&camera_bind_group_layout, &texture_bind_group_layout],
                push_constant_ranges: &[],
            });

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&mesh_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: "vs_main",
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: SceneTarget::COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw, // OBJ uses counter-clockwise winding
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: SceneTarget::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        // Vertex and index buffers
        let vertices = mesh_vertices(mesh);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let scene_target = SceneTarget::new(device, gpu.size);

        // FXAA resources. The sampler must filter linearly; the directional
        // taps rely on bilinear interpolation between pixel centers.
        let scene_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Scene Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let settings = FxaaSettings::default();
        let fxaa_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("FXAA Uniform Buffer"),
            contents: bytemuck::cast_slice(&[settings.to_uniform(gpu.size.0, gpu.size.1)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let fxaa_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("FXAA Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let fxaa_bind_group = Self::create_fxaa_bind_group(
            device,
            &fxaa_bind_group_layout,
            &scene_target.color_view,
            &scene_sampler,
            &fxaa_uniform_buffer,
        );

        let fxaa_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("FXAA Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/fxaa.wgsl").into()),
        });

        let fxaa_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("FXAA Pipeline Layout"),
                bind_group_layouts: &[&fxaa_bind_group_layout],
                push_constant_ranges: &[],
            });

        let fxaa_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("FXAA Pipeline"),
            layout: Some(&fxaa_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &fxaa_shader,
                entry_point: "vs_fullscreen",
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fxaa_shader,
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

        let num_triangles = mesh.triangle_count() as u32;
        let num_vertices = mesh.vertex_count() as u32;
        let num_indices = mesh.indices.len() as u32;

        Ok(Self {
            gpu,
            camera,
            settings,
            show_ui: true,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            mesh_pipeline,
            vertex_buffer,
            index_buffer,
            num_indices,
            texture_bind_group,
            scene_target,
            scene_sampler,
            fxaa_pipeline,
            fxaa_uniform_buffer,
            fxaa_bind_group_layout,
            fxaa_bind_group,
            egui,
            mesh_center,
            mesh_diagonal,
            num_triangles,
            num_vertices,
            fps: FpsCounter::default(),
        })
    }

    fn create_fxaa_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        scene_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        uniform_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("FXAA Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(scene_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        })
    }

    /// Current drawable size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.gpu.size
    }

    /// Handle window resize: reconfigure the surface and rebuild the
    /// offscreen target at the new size.
    pub fn resize(&mut self, new_size: (u32, u32)) {
        if !self.gpu.resize(new_size) {
            return;
        }

        self.scene_target = SceneTarget::new(&self.gpu.device, new_size);
        self.fxaa_bind_group = Self::create_fxaa_bind_group(
            &self.gpu.device,
            &self.fxaa_bind_group_layout,
            &self.scene_target.color_view,
            &self.scene_sampler,
            &self.fxaa_uniform_buffer,
        );

        self.camera.set_aspect(self.gpu.aspect());
        self.update_camera();
    }

    /// Update camera uniform buffer (call after modifying camera)
    pub fn update_camera(&mut self) {
        self.camera_uniform.update_view_proj(&self.camera);
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );
    }

    /// Frame the camera on the loaded mesh
    pub fn frame_mesh(&mut self) {
        self.camera.frame(self.mesh_center, self.mesh_diagonal);
        self.update_camera();
        log::info!(
            "Framed mesh at center {:?}, distance {:.2}",
            self.mesh_center,
            (self.camera.position - self.mesh_center).length()
        );
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

    /// Render a frame: mesh pass, FXAA pass, then the UI overlay.
    pub fn render(&mut self, window: &Window) -> Result<()> {
        self.settings.clamp_ranges();
        let uniform = self.settings.to_uniform(self.gpu.size.0, self.gpu.size.1);
        self.gpu
            .queue
            .write_buffer(&self.fxaa_uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));

        let output = self.gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Mesh pass into the offscreen target
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mesh Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.scene_target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.2,
                            b: 0.3,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.scene_target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.mesh_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_bind_group(1, &self.texture_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.num_indices, 0, 0..1);
        }

        // FXAA pass reads the scene target and writes the swapchain
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("FXAA Pass"),
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

            render_pass.set_pipeline(&self.fxaa_pipeline);
            render_pass.set_bind_group(0, &self.fxaa_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        // Build UI - split borrows so the closure does not capture self
        let show_ui = self.show_ui;
        let fps = self.fps.fps();
        let camera_position = self.camera.position;
        let camera_fov = self.camera.fov_y;
        let num_triangles = self.num_triangles;
        let num_vertices = self.num_vertices;
        let size = self.gpu.size;
        let mut settings = self.settings;
        let mut frame_clicked = false;

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

                egui::SidePanel::left("fxaa_panel")
                    .default_width(300.0)
                    .show(ctx, |ui| {
                        ui.heading("Glint FXAA");
                        ui.separator();

                        ui.label(format!("FPS: {:.1}", fps));
                        ui.separator();

                        ui.checkbox(&mut settings.enabled, "FXAA (3)");
                        ui.checkbox(&mut settings.show_edges, "Show edges (4)");
                        ui.add(
                            egui::Slider::new(&mut settings.luma_threshold, 0.0..=1.0)
                                .text("Luma threshold (1/2)"),
                        );
                        ui.add(
                            egui::Slider::new(
                                &mut settings.mul_reduce_reciprocal,
                                1.0..=fxaa::MAX_MUL_REDUCE_RECIPROCAL,
                            )
                            .text("Mul reduce 1/x"),
                        );
                        ui.add(
                            egui::Slider::new(
                                &mut settings.min_reduce_reciprocal,
                                1.0..=fxaa::MAX_MIN_REDUCE_RECIPROCAL,
                            )
                            .text("Min reduce 1/x"),
                        );
                        ui.add(
                            egui::Slider::new(&mut settings.max_span, 1.0..=fxaa::MAX_SPAN)
                                .text("Max span"),
                        );

                        ui.separator();

                        ui.collapsing("Mesh", |ui| {
                            ui.label(format!("Triangles: {}", num_triangles));
                            ui.label(format!("Vertices: {}", num_vertices));
                            if ui.button("Frame mesh").clicked() {
                                frame_clicked = true;
                            }
                        });

                        ui.separator();

                        ui.collapsing("Camera", |ui| {
                            ui.label(format!(
                                "Position: ({:.2}, {:.2}, {:.2})",
                                camera_position.x, camera_position.y, camera_position.z
                            ));
                            ui.label(format!("FOV: {:.1}\u{b0}", camera_fov.to_degrees()));
                            ui.label(format!("Resolution: {}x{}", size.0, size.1));
                        });

                        ui.separator();

                        ui.collapsing("Controls", |ui| {
                            ui.label("W/A/S/D: Move, Q/E: Down/Up");
                            ui.label("Right mouse: Look around");
                            ui.label("Scroll: Zoom");
                            ui.label("1/2: Luma threshold down/up");
                            ui.label("3: Toggle FXAA, 4: Show edges");
                            ui.label("F: Frame mesh, U: Toggle UI");
                            ui.label("Esc: Quit");
                        });
                    });
            },
        );

        // Write UI edits back
        self.settings = settings;

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if frame_clicked {
            self.frame_mesh();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        // Three attributes, tightly packed
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(Vertex::ATTRIBS.len(), 3);
    }

    #[test]
    fn test_mesh_vertices_interleave() {
        let mesh = Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
            Some(vec![Vec3::Z, Vec3::Z, Vec3::Z]),
            Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
        );

        let vertices = mesh_vertices(&mesh);
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertices[2].uv, [0.0, 1.0]);
    }

    #[test]
    fn test_mesh_vertices_defaults() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2], None, None);

        let vertices = mesh_vertices(&mesh);
        // Missing attributes fall back to up-facing normals and zero UVs
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[0].uv, [0.0, 0.0]);
    }

    #[test]
    fn test_camera_uniform_tracks_camera() {
        let camera = FlyCamera::new(1.5);
        let mut uniform = CameraUniform::new();
        assert_eq!(uniform.view_proj, Mat4::IDENTITY.to_cols_array_2d());

        uniform.update_view_proj(&camera);
        let expected = camera.view_projection().to_cols_array_2d();
        assert_eq!(uniform.view_proj, expected);
    }
}
