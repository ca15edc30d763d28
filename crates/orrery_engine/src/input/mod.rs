//! Input plumbing between the window and the camera controller
//!
//! The window layer translates platform events into [`InputEvent`]s so the rest
//! of the crate never touches glfw types.

use bitflags::bitflags;

use crate::render::camera::CameraMovement;

/// Key codes the demo reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// W key
    W,
    /// A key
    A,
    /// S key
    S,
    /// D key
    D,
    /// Escape key
    Escape,
    /// Any key without a binding
    Other,
}

/// Platform-neutral input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Key pressed or released (repeats count as pressed)
    Key {
        /// Which key
        key: KeyCode,
        /// True while the key is down
        pressed: bool,
    },
    /// Absolute pointer position in screen coordinates
    CursorMoved {
        /// Horizontal position, growing rightward
        x: f64,
        /// Vertical position, growing downward
        y: f64,
    },
    /// Vertical scroll wheel offset
    Scroll {
        /// Positive when scrolling away from the user
        dy: f64,
    },
    /// Framebuffer size changed
    FramebufferResized {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
    /// The window gained or lost input focus, or the cursor entered or left it
    Focused {
        /// True when focus was regained
        focused: bool,
    },
    /// The user asked to close the window
    CloseRequested,
}

bitflags! {
    /// Set of camera movement keys currently held down
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MovementKeys: u8 {
        /// W
        const FORWARD = 1 << 0;
        /// S
        const BACKWARD = 1 << 1;
        /// A
        const LEFT = 1 << 2;
        /// D
        const RIGHT = 1 << 3;
    }
}

impl MovementKeys {
    /// Movement flag bound to a key, if any
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::W => Some(Self::FORWARD),
            KeyCode::S => Some(Self::BACKWARD),
            KeyCode::A => Some(Self::LEFT),
            KeyCode::D => Some(Self::RIGHT),
            KeyCode::Escape | KeyCode::Other => None,
        }
    }

    /// Camera movements for every held key, in W, S, A, D order
    pub fn movements(self) -> impl Iterator<Item = CameraMovement> {
        [
            (Self::FORWARD, CameraMovement::Forward),
            (Self::BACKWARD, CameraMovement::Backward),
            (Self::LEFT, CameraMovement::Left),
            (Self::RIGHT, CameraMovement::Right),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, movement)| movement)
    }
}

/// Turns absolute pointer positions into look deltas
///
/// The first sample after construction or [`reset`](Self::reset) only seeds the
/// last known position, so capturing the cursor never causes a jump.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    last: Option<(f32, f32)>,
}

impl PointerTracker {
    /// Create a tracker waiting for its first sample
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the last position; the next sample yields a zero delta
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Delta from the previous sample with y inverted (up is positive)
    pub fn delta(&mut self, x: f32, y: f32) -> (f32, f32) {
        let (last_x, last_y) = self.last.unwrap_or((x, y));
        self.last = Some((x, y));
        (x - last_x, last_y - y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_is_zero_delta() {
        let mut tracker = PointerTracker::new();
        assert_eq!(tracker.delta(400.0, 300.0), (0.0, 0.0));
    }

    #[test]
    fn test_delta_inverts_y() {
        let mut tracker = PointerTracker::new();
        tracker.delta(400.0, 300.0);
        assert_eq!(tracker.delta(410.0, 290.0), (10.0, 10.0));
        assert_eq!(tracker.delta(405.0, 295.0), (-5.0, -5.0));
    }

    #[test]
    fn test_reset_reseeds() {
        let mut tracker = PointerTracker::new();
        tracker.delta(0.0, 0.0);
        tracker.reset();
        assert_eq!(tracker.delta(1000.0, -500.0), (0.0, 0.0));
        assert_eq!(tracker.delta(1001.0, -500.0), (1.0, 0.0));
    }

    #[test]
    fn test_movement_keys() {
        assert_eq!(MovementKeys::from_key(KeyCode::W), Some(MovementKeys::FORWARD));
        assert_eq!(MovementKeys::from_key(KeyCode::Escape), None);

        let held = MovementKeys::FORWARD | MovementKeys::RIGHT;
        let movements: Vec<_> = held.movements().collect();
        assert_eq!(movements, vec![CameraMovement::Forward, CameraMovement::Right]);
        assert_eq!(MovementKeys::empty().movements().count(), 0);
    }
}
