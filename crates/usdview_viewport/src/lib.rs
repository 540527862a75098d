//! wgpu viewport for USD stages.
//!
//! A [`Viewport`] owns the window surface and drives one frame at a time:
//! it takes a frame permit, advances animation time, asks the
//! [`RenderEngine`] for a colour texture, blits it to the surface, paints
//! the egui overlay and presents.

pub mod blit;
pub mod config;
pub mod engine;
pub mod gate;
pub mod interaction;
pub mod overlay;
pub mod pacing;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use usdview_core::{CallbackHandle, CallbackRegistry, Stage};
use usdview_math::{CameraController, DMat4};

pub use blit::{BlitPass, BLIT_BLEND};
pub use config::ViewerConfig;
pub use engine::{PreviewEngine, RenderEngine, RenderRequest};
pub use gate::{FramePermit, InFlightGate};
pub use interaction::{InteractionMode, Modifiers, PointerButton, PointerState};
pub use overlay::{FpsCounter, Overlay, OverlayActions, OverlayStats};
pub use pacing::FramePacer;

/// Vertical field of view of the viewport camera
pub const FIELD_OF_VIEW_DEGREES: f64 = 60.0;
pub const NEAR_PLANE: f64 = 1.0;
pub const FAR_PLANE: f64 = 100_000.0;

/// Size handed to the engine while the drawable reports zero
pub const FALLBACK_DRAWABLE_SIZE: (u32, u32) = (400, 300);

/// Engines render onto transparent black; the blit composites over the
/// background.
const ENGINE_CLEAR_COLOR: wgpu::Color = wgpu::Color::TRANSPARENT;

/// Why a frame was not presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No surface texture became available in time
    NoDrawable,
    /// The surface was lost or outdated and has been reconfigured
    SurfaceReconfigured,
    /// The engine produced no texture
    NoEngineOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    Skipped(SkipReason),
}

/// Sent to frame listeners after each presented frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEvent {
    pub frame_index: u64,
    pub time_code: f64,
}

/// `size`, or the fallback when either dimension is zero.
pub fn effective_size(size: (u32, u32)) -> (u32, u32) {
    if size.0 == 0 || size.1 == 0 {
        FALLBACK_DRAWABLE_SIZE
    } else {
        size
    }
}

/// Right-handed perspective projection for a viewport of `size` pixels.
pub fn projection_matrix(size: (u32, u32)) -> DMat4 {
    let (width, height) = effective_size(size);
    let aspect = width as f64 / height as f64;
    DMat4::perspective_rh(
        FIELD_OF_VIEW_DEGREES.to_radians(),
        aspect,
        NEAR_PLANE,
        FAR_PLANE,
    )
}

pub struct Viewport {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: (u32, u32),

    stage: Arc<Stage>,
    stage_name: String,
    prim_count: usize,

    engine: Box<dyn RenderEngine>,
    blit: BlitPass,
    overlay: Overlay,
    pacer: FramePacer,
    gate: Arc<InFlightGate>,
    frame_events: CallbackRegistry<FrameEvent>,

    background: wgpu::Color,
    fps: FpsCounter,
    last_present: Option<Instant>,
    frame_index: u64,
    pending_actions: OverlayActions,
}

impl Viewport {
    /// Create a viewport drawing `stage` into `window` with the preview
    /// engine.
    pub async fn new(
        window: Arc<winit::window::Window>,
        stage: Arc<Stage>,
        viewer_config: &ViewerConfig,
    ) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
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
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("UsdView Device"),
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
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("Surface reports no texture formats"))?;

        let (width, height) = effective_size((size.width, size.height));
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let engine: Box<dyn RenderEngine> = Box::new(PreviewEngine::new(&device));
        let blit = BlitPass::new(&device, surface_format);
        let mut overlay = Overlay::new(&device, surface_format, &window);
        overlay.set_visible(viewer_config.show_overlay);

        let mut viewport = Self {
            surface,
            device,
            queue,
            config,
            size: (size.width, size.height),
            stage: stage.clone(),
            stage_name: String::new(),
            prim_count: 0,
            engine,
            blit,
            overlay,
            // Replaced by set_stage below
            pacer: FramePacer::new(0.0, 0.0, 0.0, false),
            gate: Arc::new(InFlightGate::default()),
            frame_events: CallbackRegistry::new(),
            background: viewer_config.background_color(),
            fps: FpsCounter::new(),
            last_present: None,
            frame_index: 0,
            pending_actions: OverlayActions::default(),
        };
        viewport.set_stage(stage, viewer_config.frames_per_second);

        log::info!(
            "Viewport ready: {}x{} {:?}",
            viewport.config.width,
            viewport.config.height,
            surface_format
        );
        Ok(viewport)
    }

    /// Switch to another stage; playback restarts at its first time code.
    pub fn set_stage(&mut self, stage: Arc<Stage>, fps_override: Option<f64>) {
        self.stage_name = stage
            .path()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Default scene".to_string());
        self.prim_count = stage.traverse().len();
        self.pacer = FramePacer::for_stage(&stage, fps_override);
        self.engine.set_stage(stage.clone());
        self.stage = stage;
    }

    pub fn stage(&self) -> &Arc<Stage> {
        &self.stage
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    pub fn toggle_playing(&mut self) {
        self.pacer.toggle_playing();
        log::info!(
            "Playback {}",
            if self.pacer.is_playing() { "resumed" } else { "paused" }
        );
    }

    pub fn toggle_overlay(&mut self) {
        self.overlay.toggle_visible();
    }

    /// The gate frames are drawn under; share it to throttle other
    /// producers against the render loop.
    pub fn gate(&self) -> Arc<InFlightGate> {
        self.gate.clone()
    }

    /// Call `callback` after every presented frame.
    pub fn on_frame<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&FrameEvent) + Send + Sync + 'static,
    {
        self.frame_events.register(callback)
    }

    pub fn remove_frame_callback(&self, handle: CallbackHandle) -> bool {
        self.frame_events.unregister(handle)
    }

    pub fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 > 0 && new_size.1 > 0 {
            self.size = new_size;
            self.config.width = new_size.0;
            self.config.height = new_size.1;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Returns true if the overlay consumed the event.
    pub fn handle_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        self.overlay.handle_event(window, event)
    }

    /// Camera actions requested from the overlay since the last call.
    pub fn take_actions(&mut self) -> OverlayActions {
        std::mem::take(&mut self.pending_actions)
    }

    /// Draw one frame from a snapshot of the camera.
    ///
    /// Transient failures are logged and reported as
    /// [`FrameOutcome::Skipped`]. Errors are fatal
    /// (`wgpu::SurfaceError::OutOfMemory`).
    pub fn draw_frame(
        &mut self,
        window: &winit::window::Window,
        camera: CameraController,
        mode: InteractionMode,
    ) -> Result<FrameOutcome> {
        let gate = self.gate.clone();
        let _permit = gate.acquire();

        let now = Instant::now();
        let time_code = self.pacer.tick(now);
        let size = effective_size(self.size);

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(FrameOutcome::Skipped(SkipReason::SurfaceReconfigured));
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out waiting for a drawable, skipping frame");
                return Ok(FrameOutcome::Skipped(SkipReason::NoDrawable));
            }
            Err(err) => return Err(err.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let request = RenderRequest {
            time_code,
            size,
            view: camera.view_matrix(),
            projection: projection_matrix(size),
            clear_color: ENGINE_CLEAR_COLOR,
        };

        let Some(texture) = self
            .engine
            .render(&self.device, &self.queue, &mut encoder, &request)
        else {
            log::warn!("Render engine produced no texture at time {:.2}", time_code);
            return Ok(FrameOutcome::Skipped(SkipReason::NoEngineOutput));
        };

        self.blit
            .draw(&self.device, &mut encoder, texture, &view, self.background);

        let stats = OverlayStats {
            fps: self.fps.fps(),
            time_code,
            start_time_code: self.pacer.start_time_code(),
            end_time_code: self.pacer.end_time_code(),
            animating: self.pacer.is_animating(),
            playing: self.pacer.is_playing(),
            stage_name: self.stage_name.clone(),
            prim_count: self.prim_count,
            mode,
            eye: camera.eye,
            at: camera.at,
            resolution: (self.config.width, self.config.height),
        };
        let actions = self.overlay.draw(
            &self.device,
            &self.queue,
            &mut encoder,
            window,
            &view,
            (self.config.width, self.config.height),
            &stats,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if let Some(last) = self.last_present.replace(now) {
            self.fps.update(now.duration_since(last).as_secs_f32());
        }
        self.apply_actions(actions);

        self.frame_index += 1;
        self.frame_events.invoke(&FrameEvent {
            frame_index: self.frame_index,
            time_code,
        });

        Ok(FrameOutcome::Presented)
    }

    fn apply_actions(&mut self, actions: OverlayActions) {
        if actions.toggle_play {
            self.toggle_playing();
        }
        if actions.rewind {
            self.pacer.rewind();
        }
        self.pending_actions.frame |= actions.frame;
        self.pending_actions.reset |= actions.reset;
    }
}
