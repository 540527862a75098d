//! egui heads-up panel drawn over the blitted frame.

use usdview_math::DVec3;

use crate::interaction::InteractionMode;

/// Smoothed frames-per-second, refreshed twice a second.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    fps: f32,
    frame_count: u32,
    elapsed: f32,
}

impl FpsCounter {
    const UPDATE_INTERVAL: f32 = 0.5;

    pub fn new() -> Self {
        Self::default()
    }

    /// Count one frame that took `delta_time` seconds.
    pub fn update(&mut self, delta_time: f32) -> f32 {
        self.frame_count += 1;
        self.elapsed += delta_time;

        if self.elapsed >= Self::UPDATE_INTERVAL {
            self.fps = self.frame_count as f32 / self.elapsed;
            self.frame_count = 0;
            self.elapsed = 0.0;
        }
        self.fps
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

/// What the panel shows for one frame.
#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub fps: f32,
    pub time_code: f64,
    pub start_time_code: f64,
    pub end_time_code: f64,
    pub animating: bool,
    pub playing: bool,
    pub stage_name: String,
    pub prim_count: usize,
    pub mode: InteractionMode,
    pub eye: DVec3,
    pub at: DVec3,
    pub resolution: (u32, u32),
}

/// Buttons pressed in the panel this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayActions {
    pub toggle_play: bool,
    pub rewind: bool,
    pub frame: bool,
    pub reset: bool,
}

impl OverlayActions {
    pub fn any(&self) -> bool {
        self.toggle_play || self.rewind || self.frame || self.reset
    }
}

pub struct Overlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    visible: bool,
}

impl Overlay {
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        window: &winit::window::Window,
    ) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(device, target_format, None, 1, false);
        log::info!("egui overlay initialized");

        Self {
            ctx,
            state,
            renderer,
            visible: true,
        }
    }

    /// Returns true if egui consumed the event.
    pub fn handle_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn toggle_visible(&mut self) {
        self.visible = !self.visible;
    }

    /// Run the UI and paint it onto `target`, keeping what is already there.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        target: &wgpu::TextureView,
        size: (u32, u32),
        stats: &OverlayStats,
    ) -> OverlayActions {
        let raw_input = self.state.take_egui_input(window);
        let visible = self.visible;
        let mut actions = OverlayActions::default();

        let full_output = self.ctx.run(raw_input, |ctx| {
            if visible {
                stats_panel(ctx, stats, &mut actions);
            }
        });

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.0, size.1],
            pixels_per_point: window.scale_factor() as f32,
        };

        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }

        self.renderer
            .update_buffers(device, queue, encoder, &paint_jobs, &screen_descriptor);

        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            self.renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }

        actions
    }
}

fn stats_panel(ctx: &egui::Context, stats: &OverlayStats, actions: &mut OverlayActions) {
    egui::SidePanel::left("stats_panel")
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.heading("UsdView");
            ui.label(stats.stage_name.as_str());
            ui.separator();

            ui.label(format!("FPS: {:.1}", stats.fps));
            ui.separator();

            ui.collapsing("Playback", |ui| {
                if stats.animating {
                    ui.label(format!(
                        "Time: {:.2} ({} - {})",
                        stats.time_code, stats.start_time_code, stats.end_time_code
                    ));
                    ui.horizontal(|ui| {
                        let label = if stats.playing { "Pause" } else { "Play" };
                        if ui.button(label).clicked() {
                            actions.toggle_play = true;
                        }
                        if ui.button("Rewind").clicked() {
                            actions.rewind = true;
                        }
                    });
                } else {
                    ui.label("No animation");
                }
            });

            ui.collapsing("Stage", |ui| {
                ui.label(format!("Prims: {}", stats.prim_count));
            });

            ui.collapsing("Camera", |ui| {
                ui.label(format!(
                    "Eye: ({:.2}, {:.2}, {:.2})",
                    stats.eye.x, stats.eye.y, stats.eye.z
                ));
                ui.label(format!(
                    "At: ({:.2}, {:.2}, {:.2})",
                    stats.at.x, stats.at.y, stats.at.z
                ));
                ui.label(format!("Distance: {:.2}", stats.eye.distance(stats.at)));
                ui.label(format!("Gesture: {:?}", stats.mode));
                ui.horizontal(|ui| {
                    if ui.button("Frame").clicked() {
                        actions.frame = true;
                    }
                    if ui.button("Reset").clicked() {
                        actions.reset = true;
                    }
                });
            });

            ui.collapsing("Viewport", |ui| {
                let (w, h) = stats.resolution;
                ui.label(format!("Resolution: {}x{}", w, h));
            });

            ui.separator();

            ui.collapsing("Controls", |ui| {
                ui.label("Left drag: Orbit");
                ui.label("Alt + Left drag: Zoom");
                ui.label("Shift + Left / Right drag: Pan");
                ui.label("Scroll: Zoom");
                ui.label("F: Frame stage  R: Reset camera");
                ui.label("Space: Play/Pause  H: Toggle panel");
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_updates_every_half_second() {
        let mut counter = FpsCounter::new();

        // 0.375 s worth of frames is not enough to refresh
        for _ in 0..3 {
            counter.update(0.125);
        }
        assert_eq!(counter.fps(), 0.0);

        let fps = counter.update(0.125);
        assert!((fps - 8.0).abs() < 1e-3);
    }

    #[test]
    fn test_fps_holds_between_updates() {
        let mut counter = FpsCounter::new();
        counter.update(0.5);
        assert!((counter.fps() - 2.0).abs() < 1e-3);

        counter.update(0.01);
        assert!((counter.fps() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_actions_any() {
        assert!(!OverlayActions::default().any());
        let actions = OverlayActions {
            frame: true,
            ..Default::default()
        };
        assert!(actions.any());
    }
}
