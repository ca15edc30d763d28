//! Window management using GLFW
//!
//! Creates a Vulkan-ready window with a captured cursor and translates glfw
//! events into [`InputEvent`]s.

use ash::vk;
use thiserror::Error;

use crate::input::{InputEvent, KeyCode};

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// glfw could not be initialized
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// The window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// Other glfw failure
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window without a client API, for use with Vulkan
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl Window {
    /// Open a resizable window and capture the cursor
    pub fn new(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|_| WindowError::InitializationFailed)?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_scroll_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_focus_polling(true);
        window.set_cursor_enter_polling(true);
        window.set_cursor_mode(glfw::CursorMode::Disabled);

        log::info!("Window created: {title} ({width}x{height})");

        Ok(Self { glfw, window, events })
    }

    /// True once the user or the app asked to close
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Ask the window to close at the end of the frame
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Pump the event queue and return the events this crate understands
    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        self.glfw.poll_events();
        glfw::flush_messages(&self.events)
            .filter_map(|(_, event)| translate_event(&event))
            .collect()
    }

    /// Block until an event arrives; used while minimized
    pub fn wait_events(&mut self) {
        self.glfw.wait_events();
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Vulkan instance extensions glfw needs for surface creation
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::GlfwError("Vulkan is not supported by glfw".to_string()))
    }

    /// Create a Vulkan surface for this window
    pub fn create_vulkan_surface(&mut self, instance: vk::Instance) -> WindowResult<vk::SurfaceKHR> {
        let mut surface = vk::SurfaceKHR::null();
        let result = self.window.create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::GlfwError(format!("Failed to create Vulkan surface: {result:?}")))
        }
    }
}

fn translate_key(key: glfw::Key) -> KeyCode {
    match key {
        glfw::Key::W => KeyCode::W,
        glfw::Key::A => KeyCode::A,
        glfw::Key::S => KeyCode::S,
        glfw::Key::D => KeyCode::D,
        glfw::Key::Escape => KeyCode::Escape,
        _ => KeyCode::Other,
    }
}

fn translate_event(event: &glfw::WindowEvent) -> Option<InputEvent> {
    match *event {
        glfw::WindowEvent::Key(key, _, action, _) => Some(InputEvent::Key {
            key: translate_key(key),
            pressed: action != glfw::Action::Release,
        }),
        glfw::WindowEvent::CursorPos(x, y) => Some(InputEvent::CursorMoved { x, y }),
        glfw::WindowEvent::Scroll(_, dy) => Some(InputEvent::Scroll { dy }),
        glfw::WindowEvent::FramebufferSize(width, height) => Some(InputEvent::FramebufferResized {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }),
        glfw::WindowEvent::Focus(focused) | glfw::WindowEvent::CursorEnter(focused) => {
            Some(InputEvent::Focused { focused })
        }
        glfw::WindowEvent::Close => Some(InputEvent::CloseRequested),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_actions() {
        let press = glfw::WindowEvent::Key(glfw::Key::W, 0, glfw::Action::Press, glfw::Modifiers::empty());
        assert_eq!(
            translate_event(&press),
            Some(InputEvent::Key { key: KeyCode::W, pressed: true })
        );

        let repeat = glfw::WindowEvent::Key(glfw::Key::D, 0, glfw::Action::Repeat, glfw::Modifiers::empty());
        assert_eq!(
            translate_event(&repeat),
            Some(InputEvent::Key { key: KeyCode::D, pressed: true })
        );

        let release = glfw::WindowEvent::Key(glfw::Key::Escape, 0, glfw::Action::Release, glfw::Modifiers::empty());
        assert_eq!(
            translate_event(&release),
            Some(InputEvent::Key { key: KeyCode::Escape, pressed: false })
        );

        let unbound = glfw::WindowEvent::Key(glfw::Key::Q, 0, glfw::Action::Press, glfw::Modifiers::empty());
        assert_eq!(
            translate_event(&unbound),
            Some(InputEvent::Key { key: KeyCode::Other, pressed: true })
        );
    }

    #[test]
    fn test_pointer_and_window_events() {
        assert_eq!(
            translate_event(&glfw::WindowEvent::CursorPos(10.0, 20.0)),
            Some(InputEvent::CursorMoved { x: 10.0, y: 20.0 })
        );
        assert_eq!(
            translate_event(&glfw::WindowEvent::Scroll(0.0, -1.0)),
            Some(InputEvent::Scroll { dy: -1.0 })
        );
        assert_eq!(
            translate_event(&glfw::WindowEvent::FramebufferSize(0, 0)),
            Some(InputEvent::FramebufferResized { width: 0, height: 0 })
        );
        assert_eq!(translate_event(&glfw::WindowEvent::Close), Some(InputEvent::CloseRequested));
        assert_eq!(translate_event(&glfw::WindowEvent::Refresh), None);
    }

    #[test]
    fn test_focus_and_cursor_enter() {
        assert_eq!(
            translate_event(&glfw::WindowEvent::Focus(true)),
            Some(InputEvent::Focused { focused: true })
        );
        assert_eq!(
            translate_event(&glfw::WindowEvent::Focus(false)),
            Some(InputEvent::Focused { focused: false })
        );
        assert_eq!(
            translate_event(&glfw::WindowEvent::CursorEnter(true)),
            Some(InputEvent::Focused { focused: true })
        );
    }
}
