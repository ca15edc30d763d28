//! Application state and errors
//!
//! [`AppContext`] owns everything that changes between frames: the camera,
//! input state, the particle pool and the clock. The binary feeds it events and
//! one `dt` per frame, then hands [`AppContext::frame_view`] to the scene
//! renderer.

use thiserror::Error;

use crate::assets::AssetError;
use crate::config::{ConfigError, OrreryConfig};
use crate::foundation::math::Vec3;
use crate::input::{InputEvent, KeyCode, MovementKeys, PointerTracker};
use crate::particles::ParticlePool;
use crate::render::camera::FlyCamera;
use crate::render::scene::FrameView;
use crate::render::vulkan::WindowError;
use crate::render::RenderError;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Asset loading failed
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Rendering failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Window creation failed
    #[error("Window error: {0}")]
    Window(#[from] WindowError),
}

/// Per-session state shared by input handling, simulation and rendering
#[derive(Debug)]
pub struct AppContext {
    camera: FlyCamera,
    pointer: PointerTracker,
    held: MovementKeys,
    particles: ParticlePool,
    elapsed: f32,
    close_requested: bool,
    resized: bool,
}

impl AppContext {
    /// State for a fresh session
    ///
    /// The particle pool is seeded from the configuration when a seed is given
    /// and from entropy otherwise.
    pub fn new(config: &OrreryConfig) -> Self {
        let spawn = Vec3::from(config.particles.spawn_position);
        let particles = match config.particles.seed {
            Some(seed) => ParticlePool::seeded(config.particles.capacity, spawn, seed),
            None => ParticlePool::from_entropy(config.particles.capacity, spawn),
        };

        Self::with_particles(FlyCamera::new(&config.camera), particles)
    }

    /// State around an existing camera and pool
    pub fn with_particles(camera: FlyCamera, particles: ParticlePool) -> Self {
        Self {
            camera,
            pointer: PointerTracker::new(),
            held: MovementKeys::empty(),
            particles,
            elapsed: 0.0,
            close_requested: false,
            resized: false,
        }
    }

    /// Apply one input event
    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key {
                key: KeyCode::Escape,
                pressed: true,
            } => {
                log::info!("Escape pressed, closing");
                self.close_requested = true;
            }
            InputEvent::Key { key, pressed } => {
                if let Some(flag) = MovementKeys::from_key(key) {
                    self.held.set(flag, pressed);
                }
            }
            InputEvent::CursorMoved { x, y } => {
                let (dx, dy) = self.pointer.delta(x as f32, y as f32);
                self.camera.process_mouse_delta(dx, dy);
            }
            InputEvent::Scroll { dy } => self.camera.process_scroll(dy as f32),
            InputEvent::FramebufferResized { width, height } => {
                log::debug!("Framebuffer resized to {width}x{height}");
                self.resized = true;
            }
            InputEvent::Focused { focused: true } => {
                log::debug!("Focus regained, reseeding pointer");
                self.pointer.reset();
            }
            InputEvent::Focused { focused: false } => {}
            InputEvent::CloseRequested => self.close_requested = true,
        }
    }

    /// Step the session by `dt` seconds
    ///
    /// The same `dt` drives camera movement and the particle simulation.
    pub fn advance(&mut self, dt: f32) {
        for movement in self.held.movements() {
            self.camera.process_keyboard(movement, dt);
        }
        self.particles.update(dt);
        self.elapsed += dt;
    }

    /// Inputs for rendering the current state
    pub fn frame_view(&self) -> FrameView<'_> {
        FrameView {
            camera: &self.camera,
            particles: self.particles.particles(),
            elapsed: self.elapsed,
        }
    }

    /// Return and clear the resized flag
    pub fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    /// Mark the swapchain as needing recreation
    pub fn mark_resized(&mut self) {
        self.resized = true;
    }

    /// True once Escape or a window close was seen
    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Seconds simulated so far
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Camera
    pub fn camera(&self) -> &FlyCamera {
        &self.camera
    }

    /// Movement keys currently held
    pub fn held_keys(&self) -> MovementKeys {
        self.held
    }

    /// Particle pool
    pub fn particles(&self) -> &ParticlePool {
        &self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParticleConfig;
    use approx::assert_relative_eq;

    fn context() -> AppContext {
        let config = OrreryConfig {
            particles: ParticleConfig {
                capacity: 16,
                seed: Some(7),
                ..ParticleConfig::default()
            },
            ..OrreryConfig::default()
        };
        AppContext::new(&config)
    }

    fn key(key: KeyCode, pressed: bool) -> InputEvent {
        InputEvent::Key { key, pressed }
    }

    #[test]
    fn test_new_uses_config() {
        let app = context();
        assert_eq!(app.particles().len(), 16);
        assert_relative_eq!(app.camera().position(), Vec3::new(0.0, 0.0, 10.0));
        assert!(!app.close_requested());
        assert_eq!(app.elapsed(), 0.0);
    }

    #[test]
    fn test_escape_and_close_request_exit() {
        let mut app = context();
        app.handle_event(key(KeyCode::Escape, false));
        assert!(!app.close_requested());
        app.handle_event(key(KeyCode::Escape, true));
        assert!(app.close_requested());

        let mut app = context();
        app.handle_event(InputEvent::CloseRequested);
        assert!(app.close_requested());
    }

    #[test]
    fn test_held_key_moves_camera_each_advance() {
        let mut app = context();
        app.handle_event(key(KeyCode::W, true));
        assert_eq!(app.held_keys(), MovementKeys::FORWARD);

        app.advance(0.5);
        app.advance(0.5);
        // speed 2.5 along the initial front (0, 0, -1)
        assert_relative_eq!(app.camera().position(), Vec3::new(0.0, 0.0, 7.5), epsilon = 1e-5);

        app.handle_event(key(KeyCode::W, false));
        app.advance(1.0);
        assert_relative_eq!(app.camera().position(), Vec3::new(0.0, 0.0, 7.5), epsilon = 1e-5);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut app = context();
        app.handle_event(key(KeyCode::A, true));
        app.handle_event(key(KeyCode::D, true));
        app.advance(1.0);
        assert_relative_eq!(app.camera().position(), Vec3::new(0.0, 0.0, 10.0), epsilon = 1e-5);
    }

    #[test]
    fn test_pointer_drives_look() {
        let mut app = context();
        app.handle_event(InputEvent::CursorMoved { x: 400.0, y: 300.0 });
        assert_relative_eq!(app.camera().yaw(), 0.0);

        app.handle_event(InputEvent::CursorMoved { x: 410.0, y: 290.0 });
        // sensitivity 0.1: +10 x -> +1 yaw, -10 y (upward) -> +1 pitch
        assert_relative_eq!(app.camera().yaw(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(app.camera().pitch(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_refocus_does_not_jump_camera() {
        let mut app = context();
        app.handle_event(InputEvent::CursorMoved { x: 400.0, y: 300.0 });
        app.handle_event(InputEvent::CursorMoved { x: 401.0, y: 300.0 });
        let yaw = app.camera().yaw();
        assert_relative_eq!(yaw, 0.1, epsilon = 1e-5);

        app.handle_event(InputEvent::Focused { focused: false });
        app.handle_event(InputEvent::Focused { focused: true });
        app.handle_event(InputEvent::CursorMoved { x: 900.0, y: 300.0 });
        assert_relative_eq!(app.camera().yaw(), yaw, epsilon = 1e-5);

        app.handle_event(InputEvent::CursorMoved { x: 910.0, y: 300.0 });
        assert_relative_eq!(app.camera().yaw(), yaw + 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_scroll_zooms() {
        let mut app = context();
        app.handle_event(InputEvent::Scroll { dy: 5.0 });
        assert_relative_eq!(app.camera().zoom(), 40.0);
    }

    #[test]
    fn test_resize_flag_is_taken_once() {
        let mut app = context();
        assert!(!app.take_resized());
        app.handle_event(InputEvent::FramebufferResized { width: 1024, height: 768 });
        assert!(app.take_resized());
        assert!(!app.take_resized());
    }

    #[test]
    fn test_advance_steps_particles_and_clock() {
        let mut app = context();
        let before: Vec<_> = app.particles().iter().cloned().collect();
        app.advance(0.016);
        app.advance(0.016);

        assert_relative_eq!(app.elapsed(), 0.032, epsilon = 1e-6);
        assert_eq!(app.particles().len(), 16);
        assert!(app.particles().iter().ne(before.iter()));

        let view = app.frame_view();
        assert_eq!(view.particles.len(), 16);
        assert_relative_eq!(view.elapsed, 0.032, epsilon = 1e-6);
    }
}
