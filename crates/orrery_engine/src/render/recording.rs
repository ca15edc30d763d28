//! Recording backend
//!
//! Implements [`RenderBackend`] without a GPU by storing every command it
//! receives. Tests render frames into it and assert on the command stream.

use slotmap::SlotMap;

use crate::assets::{CubemapImages, ImageData};
use crate::render::backend::{
    BackendResult, ClearValues, DrawCall, LightingUniforms, MeshId, RenderBackend, RenderError, TextureId,
};
use crate::render::mesh::Mesh;
use crate::render::pipeline_state::{PipelineState, TextureBinding};

/// One command received by the backend
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// `begin_frame`
    BeginFrame(ClearValues),
    /// `set_lighting`
    SetLighting(LightingUniforms),
    /// `draw`
    Draw {
        /// Pipeline state of the draw
        state: PipelineState,
        /// Draw parameters
        call: DrawCall,
    },
    /// `end_frame`
    EndFrame,
}

/// Kind of texture behind a [`TextureId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedTexture {
    /// 2D texture of this size
    Flat {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// Cube texture with this edge length
    Cube {
        /// Face size in pixels
        size: u32,
    },
}

/// Backend that records instead of rendering
#[derive(Debug)]
pub struct RecordingBackend {
    meshes: SlotMap<MeshId, Mesh>,
    textures: SlotMap<TextureId, RecordedTexture>,
    commands: Vec<RecordedCommand>,
    extent: (u32, u32),
    in_frame: bool,
    out_of_date_frames: usize,
}

impl RecordingBackend {
    /// Backend reporting the given framebuffer size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            meshes: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            commands: Vec::new(),
            extent: (width, height),
            in_frame: false,
            out_of_date_frames: 0,
        }
    }

    /// Change the reported framebuffer size
    pub fn set_extent(&mut self, width: u32, height: u32) {
        self.extent = (width, height);
    }

    /// Make the next `count` calls to `end_frame` report an out-of-date swapchain
    pub fn fail_presents(&mut self, count: usize) {
        self.out_of_date_frames = count;
    }

    /// Every command received so far
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Draw commands only, in order
    pub fn draws(&self) -> impl Iterator<Item = (&PipelineState, &DrawCall)> {
        self.commands.iter().filter_map(|command| match command {
            RecordedCommand::Draw { state, call } => Some((state, call)),
            _ => None,
        })
    }

    /// Forget recorded commands, keeping uploaded resources
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Uploaded mesh
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    /// Uploaded texture
    pub fn texture(&self, id: TextureId) -> Option<RecordedTexture> {
        self.textures.get(id).copied()
    }

    fn check_texture(&self, binding: TextureBinding) -> BackendResult<()> {
        let (id, cube) = match binding {
            TextureBinding::None => return Ok(()),
            TextureBinding::Diffuse(id) => (id, false),
            TextureBinding::Cubemap(id) => (id, true),
        };
        match self.textures.get(id) {
            Some(RecordedTexture::Cube { .. }) if cube => Ok(()),
            Some(RecordedTexture::Flat { .. }) if !cube => Ok(()),
            _ => Err(RenderError::UnknownTexture(id)),
        }
    }
}

impl RenderBackend for RecordingBackend {
    fn upload_mesh(&mut self, mesh: &Mesh) -> BackendResult<MeshId> {
        Ok(self.meshes.insert(mesh.clone()))
    }

    fn upload_texture(&mut self, image: &ImageData) -> BackendResult<TextureId> {
        Ok(self.textures.insert(RecordedTexture::Flat {
            width: image.width,
            height: image.height,
        }))
    }

    fn upload_cubemap(&mut self, images: &CubemapImages) -> BackendResult<TextureId> {
        Ok(self.textures.insert(RecordedTexture::Cube { size: images.size() }))
    }

    fn begin_frame(&mut self, clear: ClearValues) -> BackendResult<()> {
        self.in_frame = true;
        self.commands.push(RecordedCommand::BeginFrame(clear));
        Ok(())
    }

    fn set_lighting(&mut self, lighting: &LightingUniforms) -> BackendResult<()> {
        if !self.in_frame {
            return Err(RenderError::NoFrameInProgress);
        }
        self.commands.push(RecordedCommand::SetLighting(*lighting));
        Ok(())
    }

    fn draw(&mut self, state: &PipelineState, call: &DrawCall) -> BackendResult<()> {
        if !self.in_frame {
            return Err(RenderError::NoFrameInProgress);
        }
        if !self.meshes.contains_key(call.mesh) {
            return Err(RenderError::UnknownMesh(call.mesh));
        }
        self.check_texture(state.texture)?;

        self.commands.push(RecordedCommand::Draw {
            state: *state,
            call: call.clone(),
        });
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if !self.in_frame {
            return Err(RenderError::NoFrameInProgress);
        }
        self.in_frame = false;
        self.commands.push(RecordedCommand::EndFrame);

        if self.out_of_date_frames > 0 {
            self.out_of_date_frames -= 1;
            return Err(RenderError::SwapchainOutOfDate);
        }
        Ok(())
    }

    fn extent(&self) -> (u32, u32) {
        self.extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Vec4};

    fn call(mesh: MeshId) -> DrawCall {
        DrawCall {
            mesh,
            model: Mat4::identity(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            object_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
        }
    }

    #[test]
    fn test_records_in_order() {
        let mut backend = RecordingBackend::new(800, 600);
        let mesh = backend.upload_mesh(&Mesh::cube()).unwrap();

        backend.begin_frame(ClearValues::default()).unwrap();
        backend.draw(&PipelineState::lit(TextureBinding::None), &call(mesh)).unwrap();
        backend.end_frame().unwrap();

        assert_eq!(backend.commands().len(), 3);
        assert!(matches!(backend.commands()[0], RecordedCommand::BeginFrame(_)));
        assert_eq!(backend.draws().count(), 1);
        assert_eq!(backend.commands()[2], RecordedCommand::EndFrame);
    }

    #[test]
    fn test_clear_commands_keeps_resources() {
        let mut backend = RecordingBackend::new(800, 600);
        let mesh = backend.upload_mesh(&Mesh::cube()).unwrap();

        backend.begin_frame(ClearValues::default()).unwrap();
        backend.draw(&PipelineState::lit(TextureBinding::None), &call(mesh)).unwrap();
        backend.end_frame().unwrap();
        backend.clear_commands();

        assert!(backend.commands().is_empty());
        assert!(backend.mesh(mesh).is_some());

        backend.begin_frame(ClearValues::default()).unwrap();
        backend.draw(&PipelineState::lit(TextureBinding::None), &call(mesh)).unwrap();
        assert_eq!(backend.draws().count(), 1);
    }

    #[test]
    fn test_draw_outside_frame_fails() {
        let mut backend = RecordingBackend::new(1, 1);
        let mesh = backend.upload_mesh(&Mesh::point()).unwrap();
        let result = backend.draw(&PipelineState::particles(), &call(mesh));
        assert!(matches!(result, Err(RenderError::NoFrameInProgress)));
    }

    #[test]
    fn test_texture_kind_is_checked() {
        let mut backend = RecordingBackend::new(1, 1);
        let mesh = backend.upload_mesh(&Mesh::skybox()).unwrap();
        let flat = backend
            .upload_texture(&ImageData::solid_color(2, 2, [255; 4]))
            .unwrap();
        assert_eq!(backend.texture(flat), Some(RecordedTexture::Flat { width: 2, height: 2 }));

        backend.begin_frame(ClearValues::default()).unwrap();
        let result = backend.draw(&PipelineState::skybox(flat), &call(mesh));
        assert!(matches!(result, Err(RenderError::UnknownTexture(id)) if id == flat));
    }

    #[test]
    fn test_fail_presents() {
        let mut backend = RecordingBackend::new(1, 1);
        backend.fail_presents(1);

        backend.begin_frame(ClearValues::default()).unwrap();
        assert!(matches!(backend.end_frame(), Err(RenderError::SwapchainOutOfDate)));

        backend.begin_frame(ClearValues::default()).unwrap();
        assert!(backend.end_frame().is_ok());
    }
}
