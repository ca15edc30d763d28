//! # Free-fly camera
//!
//! Converts keyboard movement, pointer deltas and scroll input into a position,
//! a yaw/pitch orientation and a zoom (field of view).
//!
//! ## Conventions
//! - Angles are stored in degrees.
//! - `yaw = 0, pitch = 0` looks down -Z. Positive yaw turns toward +X, positive
//!   pitch looks up.
//! - The basis vectors are re-derived from yaw and pitch after every change and
//!   are never integrated, so they cannot drift out of orthonormality.
//! - View matrices are right-handed Y-up; the Vulkan coordinate flip is applied
//!   by the backend, as for every other matrix in the crate.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Pitch limit in degrees, keeps the view from flipping over the pole
///
/// The bound itself is excluded: pitch stays strictly inside `(-89, 89)`.
pub const PITCH_LIMIT: f32 = 89.0;

/// Largest pitch actually reached, just inside [`PITCH_LIMIT`]
const MAX_PITCH: f32 = PITCH_LIMIT - 1.0e-3;

/// Near clipping plane used by the camera projection
pub const NEAR_PLANE: f32 = 0.1;

/// Far clipping plane used by the camera projection
pub const FAR_PLANE: f32 = 100.0;

/// Direction of a keyboard movement step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMovement {
    /// Along the front vector
    Forward,
    /// Against the front vector
    Backward,
    /// Against the right vector
    Left,
    /// Along the right vector
    Right,
}

/// Camera start state and tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Start position in world space
    pub position: [f32; 3],
    /// Start yaw in degrees
    pub yaw: f32,
    /// Start pitch in degrees
    pub pitch: f32,
    /// Units per second for keyboard movement
    pub movement_speed: f32,
    /// Degrees per pointer unit
    pub mouse_sensitivity: f32,
    /// Start field of view in degrees
    pub zoom: f32,
    /// Smallest field of view reachable by scrolling
    pub min_zoom: f32,
    /// Largest field of view reachable by scrolling
    pub max_zoom: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 10.0],
            yaw: 0.0,
            pitch: 0.0,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            zoom: 45.0,
            min_zoom: 1.0,
            max_zoom: 45.0,
        }
    }
}

/// Flight camera driven by yaw/pitch angles
#[derive(Debug, Clone)]
pub struct FlyCamera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    world_up: Vec3,
    movement_speed: f32,
    mouse_sensitivity: f32,
    zoom: f32,
    zoom_range: (f32, f32),
}

impl FlyCamera {
    /// Create a camera from its settings
    ///
    /// The start pitch and zoom are clamped into their valid ranges.
    pub fn new(settings: &CameraSettings) -> Self {
        let [x, y, z] = settings.position;
        let zoom_range = (
            settings.min_zoom.min(settings.max_zoom),
            settings.max_zoom.max(settings.min_zoom),
        );
        let mut camera = Self {
            position: Vec3::new(x, y, z),
            yaw: settings.yaw,
            pitch: settings.pitch.clamp(-MAX_PITCH, MAX_PITCH),
            front: Vec3::new(0.0, 0.0, -1.0),
            right: Vec3::x(),
            up: Vec3::y(),
            world_up: Vec3::y(),
            movement_speed: settings.movement_speed,
            mouse_sensitivity: settings.mouse_sensitivity,
            zoom: settings.zoom.clamp(zoom_range.0, zoom_range.1),
            zoom_range,
        };
        camera.update_vectors();
        camera
    }

    /// Create a camera at `position` with default tuning
    pub fn at(position: Vec3) -> Self {
        Self::new(&CameraSettings {
            position: [position.x, position.y, position.z],
            ..CameraSettings::default()
        })
    }

    /// Move along the front/right basis by `speed * dt`
    ///
    /// # Arguments
    /// * `direction` - Which way to move
    /// * `dt` - Frame time in seconds
    pub fn process_keyboard(&mut self, direction: CameraMovement, dt: f32) {
        let velocity = self.movement_speed * dt;
        match direction {
            CameraMovement::Forward => self.position += self.front * velocity,
            CameraMovement::Backward => self.position -= self.front * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
        }
        log::trace!("Camera moved {:?} to {:?}", direction, self.position);
    }

    /// Rotate by a pointer delta
    ///
    /// `dy` must already be inverted so that positive means "look up".
    pub fn process_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.mouse_sensitivity;
        self.pitch = (self.pitch + dy * self.mouse_sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
        self.update_vectors();
    }

    /// Zoom by a scroll offset; scrolling forward narrows the field of view
    pub fn process_scroll(&mut self, dy: f32) {
        self.zoom = (self.zoom - dy).clamp(self.zoom_range.0, self.zoom_range.1);
    }

    /// World-to-view matrix looking from `position` along `front`
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.front, self.up)
    }

    /// View matrix with translation removed, for backgrounds at infinity
    pub fn rotation_only_view(&self) -> Mat4 {
        self.view_matrix().without_translation()
    }

    /// Perspective projection using the current zoom as vertical field of view
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective(utils::deg_to_rad(self.zoom), aspect, NEAR_PLANE, FAR_PLANE)
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Yaw in degrees
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in degrees
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Field of view in degrees
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Unit view direction
    pub fn front(&self) -> Vec3 {
        self.front
    }

    /// Unit right vector
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Unit up vector
    pub fn up(&self) -> Vec3 {
        self.up
    }

    fn update_vectors(&mut self) {
        let yaw = utils::deg_to_rad(self.yaw);
        let pitch = utils::deg_to_rad(self.pitch);
        self.front = Vec3::new(
            yaw.sin() * pitch.cos(),
            pitch.sin(),
            -yaw.cos() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(&self.world_up).normalize();
        self.up = self.right.cross(&self.front).normalize();
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(&CameraSettings::default())
    }
}
