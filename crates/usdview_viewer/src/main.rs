use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use usdview_core::{PlugRegistry, Stage, Tokens};
use usdview_math::{CameraController, DVec2};
use usdview_viewport::{
    FrameOutcome, PointerButton, PointerState, ViewerConfig, Viewport,
};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Pixels per scroll line
const LINE_SCROLL_PIXELS: f64 = 20.0;

const FRAME_LOG_INTERVAL: u64 = 600;

#[derive(Parser, Debug)]
#[command(name = "usdview")]
#[command(about = "Interactive viewer for USD stages", long_about = None)]
struct Cli {
    /// USDA file to open (defaults to the built-in scene)
    stage: Option<PathBuf>,

    /// JSON viewer config
    #[arg(short, long, default_value = "usdview.json")]
    config: PathBuf,
}

/// Application state
struct App {
    config: ViewerConfig,
    stage: Arc<Stage>,
    window: Option<Arc<Window>>,
    viewport: Option<Viewport>,

    camera: CameraController,
    pointer: PointerState,
}

impl App {
    fn new(config: ViewerConfig, stage: Arc<Stage>) -> Self {
        let mut camera = CameraController::for_up_axis(stage.up_axis());
        config.apply_to_camera(&mut camera);

        Self {
            config,
            stage,
            window: None,
            viewport: None,
            camera,
            pointer: PointerState::new(),
        }
    }

    fn frame_stage(&mut self) {
        let bounds = self.stage.world_bounds_or_default();
        self.camera.frame_bounds(&bounds);
        log::info!(
            "Framed stage: center {:?}, distance {:.2}",
            bounds.center(),
            self.camera.distance()
        );
    }

    fn reset_camera(&mut self) {
        self.camera.reset();
        log::info!("Camera reset");
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, keycode: KeyCode) {
        match keycode {
            KeyCode::KeyF => self.frame_stage(),
            KeyCode::KeyR => self.reset_camera(),
            KeyCode::Space => {
                if let Some(viewport) = &mut self.viewport {
                    viewport.toggle_playing();
                }
            }
            KeyCode::KeyH => {
                if let Some(viewport) = &mut self.viewport {
                    viewport.toggle_overlay();
                }
            }
            KeyCode::Escape => event_loop.exit(),
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(viewport), Some(window)) = (&mut self.viewport, &self.window) else {
            return;
        };

        match viewport.draw_frame(window, self.camera, self.pointer.mode()) {
            Ok(FrameOutcome::Presented) => {}
            Ok(FrameOutcome::Skipped(reason)) => {
                log::debug!("Frame skipped: {:?}", reason);
            }
            Err(e) => {
                if let Some(wgpu::SurfaceError::OutOfMemory) = e.downcast_ref::<wgpu::SurfaceError>() {
                    log::error!("Out of memory!");
                } else {
                    log::error!("Render error: {:?}", e);
                }
                event_loop.exit();
                return;
            }
        }

        let actions = viewport.take_actions();
        if actions.frame {
            self.frame_stage();
        }
        if actions.reset {
            self.reset_camera();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.as_str())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        // Initialize viewport (async in pollster block)
        match pollster::block_on(Viewport::new(window.clone(), self.stage.clone(), &self.config)) {
            Ok(viewport) => {
                viewport.on_frame(|event| {
                    if event.frame_index % FRAME_LOG_INTERVAL == 0 {
                        log::debug!("Frame {} at time {:.2}", event.frame_index, event.time_code);
                    }
                });
                self.viewport = Some(viewport);
                self.window = Some(window);
                log::info!("Window and viewport initialized");
            }
            Err(e) => {
                log::error!("Failed to initialize viewport: {:?}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Let egui handle the event first
        if let (Some(viewport), Some(window)) = (&mut self.viewport, &self.window) {
            if viewport.handle_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(viewport) = &mut self.viewport {
                    viewport.resize((physical_size.width, physical_size.height));
                    log::debug!("Resized to {}x{}", physical_size.width, physical_size.height);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.pointer.set_modifiers(modifiers.state().into());
            }
            WindowEvent::MouseInput { button, state, .. } => {
                match (state, PointerButton::from_winit(button)) {
                    (ElementState::Pressed, Some(button)) => {
                        self.pointer.press(button);
                        log::debug!("Pointer mode: {:?}", self.pointer.mode());
                    }
                    (ElementState::Released, _) => self.pointer.release(),
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((mode, delta)) = self.pointer.moved(DVec2::new(position.x, position.y)) {
                    mode.apply(&mut self.camera, delta);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y as f64 * LINE_SCROLL_PIXELS,
                    MouseScrollDelta::PixelDelta(pos) => pos.y,
                };
                self.camera.zoom_scroll(scroll);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(keycode),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, keycode),
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);

                // Request next frame
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Register plugins from the environment, the config and the bundle root,
/// applying any environment the bundles need.
fn register_plugins(config: &ViewerConfig) -> PlugRegistry {
    let mut registry = PlugRegistry::new();

    if let Some(root) = &config.bundle_root {
        let plan = registry.register_bundles(root);
        plan.apply();
    }

    let mut paths = PlugRegistry::paths_from_env();
    paths.extend(config.plugin_paths.iter().cloned());
    let added = registry.register_plugins(&paths);
    log::info!("Registered {} plugins from {} search paths", added, paths.len());

    registry
}

fn load_stage(path: Option<&PathBuf>, tokens: Arc<Tokens>) -> Result<Stage> {
    match path {
        Some(path) => {
            Stage::open(path, tokens).with_context(|| format!("Failed to open {}", path.display()))
        }
        None => {
            log::info!("No stage given, using the built-in scene");
            Ok(Stage::default_scene(tokens)?)
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    log::info!("Starting UsdView");

    let config = ViewerConfig::load(&cli.config)?;
    let _plugins = register_plugins(&config);

    let tokens = Arc::new(Tokens::new());
    let stage_path = cli.stage.as_ref().or(config.stage.as_ref());
    let stage = Arc::new(load_stage(stage_path, tokens)?);

    for line in stage.outline() {
        log::info!("{}", line);
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, stage);

    log::info!("Running event loop");
    event_loop.run_app(&mut app)?;

    Ok(())
}
