//! Animation time for the render loop.

use std::time::Instant;

use usdview_core::Stage;

/// Advances the stage time code from wall-clock time and loops playback.
#[derive(Debug, Clone)]
pub struct FramePacer {
    start_time_code: f64,
    end_time_code: f64,
    frames_per_second: f64,
    current_time_code: f64,
    last_frame_time: Option<Instant>,
    is_animating: bool,
    playing: bool,
}

impl FramePacer {
    /// `authored` says whether the stage authors a time code range; without
    /// one (or with `end <= start`) time never advances.
    pub fn new(start: f64, end: f64, frames_per_second: f64, authored: bool) -> Self {
        Self {
            start_time_code: start,
            end_time_code: end,
            frames_per_second,
            current_time_code: start,
            last_frame_time: None,
            is_animating: authored && end > start,
            playing: true,
        }
    }

    /// Pacer for `stage`, optionally overriding its frame rate.
    pub fn for_stage(stage: &Stage, fps_override: Option<f64>) -> Self {
        let fps = fps_override.unwrap_or_else(|| stage.frames_per_second());
        let pacer = Self::new(
            stage.start_time_code(),
            stage.end_time_code(),
            fps,
            stage.has_authored_time_code_range(),
        );
        if pacer.is_animating {
            log::info!(
                "Animation: time codes {} to {} at {} fps",
                pacer.start_time_code,
                pacer.end_time_code,
                pacer.frames_per_second
            );
        }
        pacer
    }

    pub fn current_time_code(&self) -> f64 {
        self.current_time_code
    }

    pub fn start_time_code(&self) -> f64 {
        self.start_time_code
    }

    pub fn end_time_code(&self) -> f64 {
        self.end_time_code
    }

    pub fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    pub fn is_animating(&self) -> bool {
        self.is_animating
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        // Resume from the next tick without a jump
        self.last_frame_time = None;
    }

    pub fn toggle_playing(&mut self) {
        self.set_playing(!self.playing);
    }

    /// Jump back to the start time code.
    pub fn rewind(&mut self) {
        self.current_time_code = self.start_time_code;
    }

    /// Advance by `elapsed_seconds`. Returns true when playback wrapped
    /// back to the start.
    pub fn advance(&mut self, elapsed_seconds: f64) -> bool {
        if !self.is_animating || !self.playing {
            return false;
        }

        self.current_time_code += elapsed_seconds * self.frames_per_second;

        if self.current_time_code > self.end_time_code {
            let range = self.end_time_code - self.start_time_code;
            self.current_time_code =
                self.start_time_code + (self.current_time_code - self.end_time_code) % range;
            return true;
        }
        false
    }

    /// Advance from the previous tick to `now` and return the time code to
    /// render. The first tick only records `now`.
    pub fn tick(&mut self, now: Instant) -> f64 {
        if let Some(last) = self.last_frame_time.replace(now) {
            let elapsed = now.saturating_duration_since(last).as_secs_f64();
            if self.advance(elapsed) {
                log::debug!("Playback looped to {:.2}", self.current_time_code);
            }
        }
        self.current_time_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_wraps_past_end() {
        let mut pacer = FramePacer::new(0.0, 10.0, 24.0, true);

        // 0.5 s at 24 fps reaches 12, which wraps to 2
        assert!(pacer.advance(0.5));
        assert!((pacer.current_time_code() - 2.0).abs() < EPS);
    }

    #[test]
    fn test_end_itself_does_not_wrap() {
        let mut pacer = FramePacer::new(0.0, 24.0, 24.0, true);
        assert!(!pacer.advance(1.0));
        assert!((pacer.current_time_code() - 24.0).abs() < EPS);
    }

    #[test]
    fn test_wrap_with_offset_start() {
        let mut pacer = FramePacer::new(100.0, 110.0, 10.0, true);
        assert!(pacer.advance(2.5));
        // 100 + 25 = 125 -> 100 + (15 % 10)
        assert!((pacer.current_time_code() - 105.0).abs() < EPS);
    }

    #[test]
    fn test_unauthored_range_never_advances() {
        let mut pacer = FramePacer::new(0.0, 120.0, 24.0, false);
        assert!(!pacer.is_animating());
        pacer.advance(3.0);
        assert_eq!(pacer.current_time_code(), 0.0);

        let empty = FramePacer::new(5.0, 5.0, 24.0, true);
        assert!(!empty.is_animating());
    }

    #[test]
    fn test_paused_holds_time() {
        let mut pacer = FramePacer::new(0.0, 120.0, 24.0, true);
        pacer.toggle_playing();
        pacer.advance(1.0);
        assert_eq!(pacer.current_time_code(), 0.0);

        pacer.toggle_playing();
        pacer.advance(1.0);
        assert!((pacer.current_time_code() - 24.0).abs() < EPS);

        pacer.rewind();
        assert_eq!(pacer.current_time_code(), 0.0);
    }

    #[test]
    fn test_tick_uses_elapsed_wall_time() {
        let mut pacer = FramePacer::new(0.0, 120.0, 24.0, true);
        let t0 = Instant::now();

        assert_eq!(pacer.tick(t0), 0.0);
        let time = pacer.tick(t0 + Duration::from_millis(250));
        assert!((time - 6.0).abs() < EPS);
    }

    #[test]
    fn test_default_scene_pacer() {
        let stage = Stage::default_scene(std::sync::Arc::new(usdview_core::Tokens::new())).unwrap();
        let pacer = FramePacer::for_stage(&stage, None);
        assert!(pacer.is_animating());
        assert_eq!(pacer.frames_per_second(), 24.0);

        let fast = FramePacer::for_stage(&stage, Some(60.0));
        assert_eq!(fast.frames_per_second(), 60.0);
    }
}
