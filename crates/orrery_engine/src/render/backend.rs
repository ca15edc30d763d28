//! Backend abstraction for the scene renderer
//!
//! [`RenderBackend`] is the seam between the frame orchestration in
//! `render::scene` and a graphics API. The scene renderer only ever talks to
//! this trait, so it can run against the Vulkan backend or the recording
//! backend used by tests.

use slotmap::new_key_type;
use thiserror::Error;

use crate::assets::{AssetError, CubemapImages, ImageData};
use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::mesh::Mesh;
use crate::render::pipeline_state::PipelineState;
use crate::render::vulkan::VulkanError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

new_key_type! {
    /// Handle to a mesh uploaded to the backend
    pub struct MeshId;

    /// Handle to a 2D or cube texture uploaded to the backend
    pub struct TextureId;
}

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Graphics API failure
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] VulkanError),

    /// Resource could not be loaded
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// The swapchain no longer matches the surface; recreate it and retry
    #[error("Swapchain out of date")]
    SwapchainOutOfDate,

    /// Draw referenced a mesh the backend does not know
    #[error("Unknown mesh {0:?}")]
    UnknownMesh(MeshId),

    /// Draw referenced a texture the backend does not know
    #[error("Unknown texture {0:?}")]
    UnknownTexture(TextureId),

    /// Draw issued outside `begin_frame`/`end_frame`
    #[error("No frame in progress")]
    NoFrameInProgress,
}

/// Values the color and depth attachments are cleared to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearValues {
    /// RGBA clear color
    pub color: [f32; 4],
    /// Depth clear value
    pub depth: f32,
}

impl Default for ClearValues {
    fn default() -> Self {
        Self {
            color: [0.1, 0.1, 0.1, 1.0],
            depth: 1.0,
        }
    }
}

/// Per-frame lighting shared by every lit draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingUniforms {
    /// Point light position in world space
    pub light_position: Vec3,
    /// Eye position in world space, for specular
    pub view_position: Vec3,
    /// Light color
    pub light_color: Vec3,
}

/// Everything one draw needs besides pipeline state
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Mesh to draw
    pub mesh: MeshId,
    /// Model-to-world transform
    pub model: Mat4,
    /// World-to-view transform
    pub view: Mat4,
    /// View-to-clip transform (before the backend's own clip-space fixups)
    pub projection: Mat4,
    /// Object color multiplied into the shaded result
    pub object_color: Vec4,
}

/// Graphics backend used by the scene renderer
///
/// Resource uploads happen before the first frame. Each frame is
/// `begin_frame`, any number of `set_lighting`/`draw`, then `end_frame`.
pub trait RenderBackend {
    /// Upload a mesh and return its handle
    fn upload_mesh(&mut self, mesh: &Mesh) -> BackendResult<MeshId>;

    /// Upload a 2D RGBA texture
    fn upload_texture(&mut self, image: &ImageData) -> BackendResult<TextureId>;

    /// Upload a six-face cube texture
    fn upload_cubemap(&mut self, images: &CubemapImages) -> BackendResult<TextureId>;

    /// Start a frame, clearing color and depth
    fn begin_frame(&mut self, clear: ClearValues) -> BackendResult<()>;

    /// Set the lighting used by subsequent lit draws this frame
    fn set_lighting(&mut self, lighting: &LightingUniforms) -> BackendResult<()>;

    /// Draw a mesh with an explicit pipeline state
    fn draw(&mut self, state: &PipelineState, call: &DrawCall) -> BackendResult<()>;

    /// Finish the frame and present it
    ///
    /// # Errors
    /// [`RenderError::SwapchainOutOfDate`] when the caller must recreate the
    /// swapchain before rendering again.
    fn end_frame(&mut self) -> BackendResult<()>;

    /// Current framebuffer size in pixels
    fn extent(&self) -> (u32, u32);
}
