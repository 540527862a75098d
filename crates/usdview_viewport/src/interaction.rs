//! Pointer gestures and their camera operations.

use usdview_math::{CameraController, DVec2};
use winit::event::MouseButton;
use winit::keyboard::ModifiersState;

/// What a pointer drag currently does to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    None,
    Orbit,
    Pan,
    Zoom,
    /// Reserved; no input combination selects it
    FreeLook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

impl PointerButton {
    pub fn from_winit(button: MouseButton) -> Option<Self> {
        match button {
            MouseButton::Left => Some(PointerButton::Left),
            MouseButton::Right => Some(PointerButton::Right),
            MouseButton::Middle => Some(PointerButton::Middle),
            _ => None,
        }
    }
}

/// Keyboard modifiers held when a button goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    /// Alt, or Option on macOS
    pub alt: bool,
    pub control: bool,
    pub super_key: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        alt: false,
        control: false,
        super_key: false,
    };
}

impl From<ModifiersState> for Modifiers {
    fn from(state: ModifiersState) -> Self {
        Self {
            shift: state.shift_key(),
            alt: state.alt_key(),
            control: state.control_key(),
            super_key: state.super_key(),
        }
    }
}

impl InteractionMode {
    /// Map a button press and modifiers to a mode.
    ///
    /// Shift is checked before Alt, so Shift+Alt+Left pans. Any right-button
    /// press pans. A release (`None`) or any other button selects `None`.
    pub fn classify(press: Option<PointerButton>, modifiers: Modifiers) -> Self {
        match press {
            Some(PointerButton::Left) if modifiers.shift => InteractionMode::Pan,
            Some(PointerButton::Left) if modifiers.alt => InteractionMode::Zoom,
            Some(PointerButton::Left) => InteractionMode::Orbit,
            Some(PointerButton::Right) => InteractionMode::Pan,
            _ => InteractionMode::None,
        }
    }

    /// Apply a drag delta (y up) to the camera.
    pub fn apply(self, camera: &mut CameraController, delta: DVec2) {
        match self {
            InteractionMode::Orbit => camera.orbit(delta),
            InteractionMode::Pan => camera.pan(delta),
            InteractionMode::Zoom => camera.zoom(delta.x),
            InteractionMode::None | InteractionMode::FreeLook => {}
        }
    }
}

/// Tracks the active drag between pointer events.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerState {
    mode: InteractionMode,
    modifiers: Modifiers,
    last_position: Option<DVec2>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    /// A button went down; the mode is fixed until release.
    pub fn press(&mut self, button: PointerButton) {
        self.mode = InteractionMode::classify(Some(button), self.modifiers);
        self.last_position = None;
    }

    pub fn release(&mut self) {
        self.mode = InteractionMode::classify(None, self.modifiers);
        self.last_position = None;
    }

    /// Cursor moved to `position` (window pixels, y down).
    ///
    /// Returns the active mode and the delta since the previous position
    /// with y flipped to point up. The first move after a press only
    /// records the position.
    pub fn moved(&mut self, position: DVec2) -> Option<(InteractionMode, DVec2)> {
        if self.mode == InteractionMode::None {
            return None;
        }

        let last = self.last_position.replace(position)?;
        let delta = DVec2::new(position.x - last.x, -(position.y - last.y));
        Some((self.mode, delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usdview_math::DVec3;

    const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };
    const ALT: Modifiers = Modifiers {
        alt: true,
        ..Modifiers::NONE
    };

    #[test]
    fn test_classify_table() {
        use InteractionMode as M;
        use PointerButton as B;

        assert_eq!(M::classify(Some(B::Left), Modifiers::NONE), M::Orbit);
        assert_eq!(M::classify(Some(B::Left), SHIFT), M::Pan);
        assert_eq!(M::classify(Some(B::Left), ALT), M::Zoom);
        assert_eq!(M::classify(Some(B::Right), Modifiers::NONE), M::Pan);
        assert_eq!(M::classify(Some(B::Right), ALT), M::Pan);
        assert_eq!(M::classify(Some(B::Middle), Modifiers::NONE), M::None);
        assert_eq!(M::classify(None, SHIFT), M::None);
    }

    #[test]
    fn test_shift_wins_over_alt() {
        let both = Modifiers {
            shift: true,
            alt: true,
            ..Modifiers::NONE
        };
        assert_eq!(
            InteractionMode::classify(Some(PointerButton::Left), both),
            InteractionMode::Pan
        );
    }

    #[test]
    fn test_zoom_uses_horizontal_delta() {
        let mut camera = CameraController::default();
        let before = camera.distance();

        InteractionMode::Zoom.apply(&mut camera, DVec2::new(0.0, 50.0));
        assert_eq!(camera.distance(), before);

        InteractionMode::Zoom.apply(&mut camera, DVec2::new(20.0, 0.0));
        assert!((before - camera.distance() - 20.0 * camera.zoom_sensitivity).abs() < 1e-9);
    }

    #[test]
    fn test_none_and_free_look_do_nothing() {
        let mut camera = CameraController::default();
        let before = camera;

        InteractionMode::None.apply(&mut camera, DVec2::new(10.0, 10.0));
        InteractionMode::FreeLook.apply(&mut camera, DVec2::new(10.0, 10.0));
        assert_eq!(camera, before);
    }

    #[test]
    fn test_pointer_state_flips_y() {
        let mut pointer = PointerState::new();
        pointer.press(PointerButton::Left);

        assert_eq!(pointer.moved(DVec2::new(100.0, 100.0)), None);
        assert_eq!(
            pointer.moved(DVec2::new(110.0, 90.0)),
            Some((InteractionMode::Orbit, DVec2::new(10.0, 10.0)))
        );

        pointer.release();
        assert_eq!(pointer.moved(DVec2::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_mode_fixed_at_press() {
        let mut pointer = PointerState::new();
        pointer.press(PointerButton::Left);
        pointer.set_modifiers(SHIFT);
        assert_eq!(pointer.mode(), InteractionMode::Orbit);

        pointer.release();
        pointer.press(PointerButton::Left);
        assert_eq!(pointer.mode(), InteractionMode::Pan);
    }

    #[test]
    fn test_right_drag_pans_camera() {
        let mut camera = CameraController::new(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);
        let mut pointer = PointerState::new();
        pointer.press(PointerButton::Right);
        pointer.moved(DVec2::new(0.0, 0.0));

        let (mode, delta) = pointer.moved(DVec2::new(100.0, 0.0)).unwrap();
        mode.apply(&mut camera, delta);

        // Dragging right moves the view left
        assert!((camera.at.x + 1.0).abs() < 1e-9);
        assert!((camera.distance() - 10.0).abs() < 1e-9);
    }
}
