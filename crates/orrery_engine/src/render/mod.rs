//! # Rendering
//!
//! - **Scene**: per-frame pass orchestration (cube, particles, planet, sun, skybox)
//! - **Camera**: free-fly camera with view and projection matrices
//! - **Pipeline state**: explicit program/depth/blend/texture per draw
//! - **Backend**: the [`RenderBackend`] seam, with a Vulkan implementation and a
//!   recording implementation for tests

pub mod backend;
pub mod camera;
pub mod mesh;
pub mod pipeline_state;
pub mod recording;
pub mod scene;
pub mod vulkan;

pub use backend::{
    BackendResult, ClearValues, DrawCall, LightingUniforms, MeshId, RenderBackend, RenderError, TextureId,
};
pub use camera::{CameraMovement, CameraSettings, FlyCamera};
pub use mesh::{Mesh, Vertex};
pub use pipeline_state::{BlendMode, DepthCompare, PipelineKey, PipelineState, ShaderProgram, TextureBinding};
pub use recording::{RecordedCommand, RecordingBackend};
pub use scene::{FrameView, SceneAssets, SceneLayout, SceneRenderer, SceneResources, LightingParams};
