//! FXAA viewer: load an OBJ from the command line, render it forward, and
//! antialias the result in a post pass. Keys 1-4 drive the FXAA settings.

use anyhow::Result;
use glint_scene::Texture;
use glint_viewport::ForwardRenderer;
use std::path::{Path, PathBuf};
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Luma threshold change per press of 1 or 2.
const LUMA_STEP: f32 = 0.05;

/// Application state
struct App {
    mesh_path: PathBuf,
    window: Option<std::sync::Arc<Window>>,
    renderer: Option<ForwardRenderer>,

    // Input state
    right_mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    keys_pressed: std::collections::HashSet<KeyCode>,
    last_frame_time: Instant,
}

impl App {
    fn new(mesh_path: PathBuf) -> Self {
        Self {
            mesh_path,
            window: None,
            renderer: None,
            right_mouse_pressed: false,
            last_mouse_pos: None,
            keys_pressed: std::collections::HashSet::new(),
            last_frame_time: Instant::now(),
        }
    }
}

/// Load the diffuse texture next to the model, or fall back to flat grey.
fn load_diffuse(mesh_path: &Path) -> Texture {
    let Some(path) = Texture::sidecar_for(mesh_path) else {
        log::info!("No diffuse map next to the model, using flat grey");
        return Texture::solid_color([180, 180, 180, 255]);
    };

    match Texture::load(&path) {
        Ok(texture) => {
            log::info!("Loaded diffuse map: {}", texture.path);
            texture
        }
        Err(e) => {
            log::warn!("Failed to load {}: {}", path.display(), e);
            Texture::solid_color([180, 180, 180, 255])
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let mesh = match glint_scene::load_obj(&self.mesh_path) {
                Ok(mesh) => mesh,
                Err(e) => {
                    log::error!("Failed to load {}: {}", self.mesh_path.display(), e);
                    event_loop.exit();
                    return;
                }
            };
            let texture = load_diffuse(&self.mesh_path);

            let window_attrs = Window::default_attributes()
                .with_title("Glint FXAA Viewer")
                .with_inner_size(winit::dpi::PhysicalSize::new(1280, 720));

            let window = std::sync::Arc::new(
                event_loop
                    .create_window(window_attrs)
                    .expect("Failed to create window"),
            );

            // Initialize renderer (async in pollster block)
            let renderer =
                pollster::block_on(ForwardRenderer::new(window.clone(), &mesh, &texture))
                    .expect("Failed to initialize renderer");

            self.window = Some(window);
            self.renderer = Some(renderer);

            log::info!("Window and renderer initialized");
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Let egui handle the event first
        if let Some(renderer) = &mut self.renderer {
            if let Some(window) = &self.window {
                if renderer.handle_egui_event(window, &event) {
                    // Event was consumed by egui, don't process it further
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize((physical_size.width, physical_size.height));
                    log::info!("Resized to {}x{}", physical_size.width, physical_size.height);
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if button == MouseButton::Right {
                    let over_ui = self
                        .renderer
                        .as_ref()
                        .is_some_and(|renderer| renderer.wants_pointer());
                    self.right_mouse_pressed = state == ElementState::Pressed && !over_ui;
                    if !self.right_mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.right_mouse_pressed {
                    if let Some(last_pos) = self.last_mouse_pos {
                        let delta_x = position.x - last_pos.0;
                        let delta_y = position.y - last_pos.1;

                        if let Some(renderer) = &mut self.renderer {
                            renderer.camera.rotate(delta_x as f32, delta_y as f32);
                            renderer.update_camera();
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(renderer) = &mut self.renderer {
                    let scroll_amount = match delta {
                        winit::event::MouseScrollDelta::LineDelta(_, y) => y * 2.0,
                        winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.05,
                    };

                    renderer.camera.zoom(scroll_amount);
                    renderer.update_camera();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if let PhysicalKey::Code(keycode) = physical_key {
                    match state {
                        ElementState::Pressed => {
                            self.keys_pressed.insert(keycode);

                            if let Some(renderer) = &mut self.renderer {
                                match keycode {
                                    // OS key repeat keeps these stepping while held
                                    KeyCode::Digit1 => {
                                        renderer.settings.nudge_luma_threshold(-LUMA_STEP);
                                    }
                                    KeyCode::Digit2 => {
                                        renderer.settings.nudge_luma_threshold(LUMA_STEP);
                                    }
                                    KeyCode::Digit3 if !repeat => {
                                        renderer.settings.enabled = !renderer.settings.enabled;
                                        log::info!(
                                            "FXAA {}",
                                            if renderer.settings.enabled { "on" } else { "off" }
                                        );
                                    }
                                    KeyCode::Digit4 if !repeat => {
                                        renderer.settings.show_edges =
                                            !renderer.settings.show_edges;
                                    }
                                    KeyCode::KeyF if !repeat => {
                                        renderer.frame_mesh();
                                    }
                                    KeyCode::KeyU if !repeat => {
                                        renderer.show_ui = !renderer.show_ui;
                                    }
                                    KeyCode::Escape => {
                                        event_loop.exit();
                                    }
                                    _ => {}
                                }
                            }
                        }
                        ElementState::Released => {
                            self.keys_pressed.remove(&keycode);
                        }
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                // Calculate delta time
                let now = Instant::now();
                let delta_time = (now - self.last_frame_time).as_secs_f32();
                self.last_frame_time = now;

                if let Some(renderer) = &mut self.renderer {
                    renderer.update_fps(delta_time);

                    // Handle keyboard movement
                    let mut forward = 0.0;
                    let mut right = 0.0;
                    let mut up = 0.0;

                    if self.keys_pressed.contains(&KeyCode::KeyW) {
                        forward += 1.0;
                    }
                    if self.keys_pressed.contains(&KeyCode::KeyS) {
                        forward -= 1.0;
                    }
                    if self.keys_pressed.contains(&KeyCode::KeyA) {
                        right -= 1.0;
                    }
                    if self.keys_pressed.contains(&KeyCode::KeyD) {
                        right += 1.0;
                    }
                    if self.keys_pressed.contains(&KeyCode::KeyE) {
                        up += 1.0;
                    }
                    if self.keys_pressed.contains(&KeyCode::KeyQ) {
                        up -= 1.0;
                    }

                    if forward != 0.0 || right != 0.0 || up != 0.0 {
                        renderer.camera.move_forward(forward * delta_time);
                        renderer.camera.move_right(right * delta_time);
                        renderer.camera.move_up(up * delta_time);
                        renderer.update_camera();
                    }
                }

                if let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) {
                    if let Err(e) = renderer.render(window) {
                        // Check if it's a surface error we can handle
                        if let Some(surface_err) = e.downcast_ref::<wgpu::SurfaceError>() {
                            match surface_err {
                                wgpu::SurfaceError::Lost => {
                                    // Surface lost, reconfigure
                                    let size = renderer.size();
                                    renderer.resize(size);
                                }
                                wgpu::SurfaceError::OutOfMemory => {
                                    log::error!("Out of memory!");
                                    event_loop.exit();
                                }
                                _ => {
                                    log::error!("Surface error: {:?}", surface_err);
                                }
                            }
                        } else {
                            log::error!("Render error: {:?}", e);
                        }
                    }
                }

                // Request next frame
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Request continuous redraw when keys are pressed for smooth movement
        if !self.keys_pressed.is_empty() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <model.obj>", args[0]);
        std::process::exit(1);
    }

    log::info!("Starting Glint FXAA Viewer");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(PathBuf::from(&args[1]));
    event_loop.run_app(&mut app)?;

    Ok(())
}
