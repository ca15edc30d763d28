//! Vulkan backend
//!
//! RAII wrappers over ash plus [`VulkanBackend`], the [`RenderBackend`]
//! implementation the demo runs on. Window creation lives here too because the
//! surface and the required instance extensions come from glfw.
//!
//! [`RenderBackend`]: crate::render::RenderBackend

pub mod backend;
pub mod buffer;
pub mod commands;
pub mod context;
pub mod descriptor;
pub mod framebuffer;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod vertex_layout;
pub mod window;

pub use backend::VulkanBackend;
pub use context::{VulkanContext, VulkanError, VulkanResult};
pub use window::{Window, WindowError, WindowResult};
