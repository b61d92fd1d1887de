//! Progressive path tracer: accumulate GPU samples of a sphere scene, with
//! keyboard flight, PNG snapshots, and a CPU fallback for offline renders.
//!
//! Usage: pathtracer [scene.json] [--offline <out.png> [samples]]

use anyhow::Result;
use glint_math::Vec3;
use glint_tracer::{Scene, TracerCamera};
use glint_viewport::TraceRenderer;
use std::path::{Path, PathBuf};
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 900;

/// Flight speed in scene units per second.
const MOVE_SPEED: f32 = 1.5;
/// Mouse-look sensitivity in radians per pixel.
const LOOK_SENSITIVITY: f32 = 0.003;

struct Args {
    scene_path: Option<PathBuf>,
    offline: Option<(PathBuf, u32)>,
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} [scene.json] [--offline <out.png> [samples]]");
    std::process::exit(1);
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        scene_path: None,
        offline: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--offline" => {
                let Some(out) = args.get(i + 1) else {
                    usage(&args[0]);
                };
                let mut samples = 32;
                if let Some(n) = args.get(i + 2).and_then(|s| s.parse::<u32>().ok()) {
                    samples = n;
                    i += 1;
                }
                parsed.offline = Some((PathBuf::from(out), samples.max(1)));
                i += 1;
            }
            flag if flag.starts_with('-') => usage(&args[0]),
            path => parsed.scene_path = Some(PathBuf::from(path)),
        }
        i += 1;
    }

    parsed
}

/// Render on the CPU and write a PNG, no window involved.
fn render_offline(scene: &Scene, out_path: &Path, samples: u32) -> Result<()> {
    let mut camera = TracerCamera::classic_view(WIDTH, HEIGHT);
    camera.samples_per_pixel = samples;

    log::info!(
        "Rendering {}x{} at {} samples/pixel on the CPU",
        WIDTH,
        HEIGHT,
        samples
    );
    let image = glint_tracer::render(&camera, scene);
    image.save_png(out_path)?;
    log::info!("Wrote {}", out_path.display());

    Ok(())
}

/// Application state
struct App {
    scene: Scene,
    window: Option<std::sync::Arc<Window>>,
    renderer: Option<TraceRenderer>,

    // Input state
    right_mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    keys_pressed: std::collections::HashSet<KeyCode>,
    last_frame_time: Instant,
}

impl App {
    fn new(scene: Scene) -> Self {
        Self {
            scene,
            window: None,
            renderer: None,
            right_mouse_pressed: false,
            last_mouse_pos: None,
            keys_pressed: std::collections::HashSet::new(),
            last_frame_time: Instant::now(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attrs = Window::default_attributes()
                .with_title("Glint Path Tracer")
                .with_inner_size(winit::dpi::PhysicalSize::new(WIDTH, HEIGHT));

            let window = std::sync::Arc::new(
                event_loop
                    .create_window(window_attrs)
                    .expect("Failed to create window"),
            );

            // Initialize renderer (async in pollster block)
            let renderer = pollster::block_on(TraceRenderer::new(window.clone(), &self.scene))
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
                        let delta_x = (position.x - last_pos.0) as f32;
                        let delta_y = (position.y - last_pos.1) as f32;

                        if let Some(renderer) = &mut self.renderer {
                            renderer.camera.rotate_look(
                                delta_x * LOOK_SENSITIVITY,
                                -delta_y * LOOK_SENSITIVITY,
                            );
                            renderer.update_camera();
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(renderer) = &mut self.renderer {
                    let scroll_amount = match delta {
                        winit::event::MouseScrollDelta::LineDelta(_, y) => y * 0.3,
                        winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.005,
                    };

                    renderer.camera.dolly(scroll_amount);
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
                                    KeyCode::Space if !repeat => {
                                        renderer.paused = !renderer.paused;
                                        log::info!(
                                            "Accumulation {}",
                                            if renderer.paused { "paused" } else { "resumed" }
                                        );
                                    }
                                    KeyCode::KeyP if !repeat => {
                                        renderer.request_snapshot();
                                    }
                                    KeyCode::KeyR if !repeat => {
                                        renderer.reset_accumulation();
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

                    // Handle keyboard flight
                    let mut delta = Vec3::ZERO;
                    if self.keys_pressed.contains(&KeyCode::KeyW) {
                        delta += renderer.camera.forward();
                    }
                    if self.keys_pressed.contains(&KeyCode::KeyS) {
                        delta -= renderer.camera.forward();
                    }
                    if self.keys_pressed.contains(&KeyCode::KeyA) {
                        delta -= renderer.camera.right();
                    }
                    if self.keys_pressed.contains(&KeyCode::KeyD) {
                        delta += renderer.camera.right();
                    }
                    if self.keys_pressed.contains(&KeyCode::KeyE) {
                        delta += Vec3::Y;
                    }
                    if self.keys_pressed.contains(&KeyCode::KeyQ) {
                        delta -= Vec3::Y;
                    }

                    if delta.length_squared() > 0.0 {
                        renderer
                            .camera
                            .translate(delta.normalize() * MOVE_SPEED * delta_time);
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

    let args = parse_args();

    let scene = match &args.scene_path {
        Some(path) => Scene::from_json_file(path)?,
        None => Scene::three_spheres(),
    };

    if let Some((out_path, samples)) = &args.offline {
        return render_offline(&scene, out_path, *samples);
    }

    log::info!("Starting Glint Path Tracer");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(scene);
    event_loop.run_app(&mut app)?;

    Ok(())
}
