//! Vulkan implementation of [`RenderBackend`]
//!
//! Draws are queued between `begin_frame` and `end_frame`; `end_frame` waits
//! for the frame slot, acquires an image, records every queued draw into one
//! render pass, submits and presents. Pipelines are created on first use and
//! cached by [`PipelineKey`].

use ash::vk;
use slotmap::SlotMap;
use std::collections::HashMap;

use super::buffer::{GpuMesh, UniformBuffer};
use super::commands::{CommandPool, CommandRecorder, TransferContext};
use super::context::{VulkanContext, VulkanError, VulkanResult};
use super::descriptor::{write_scene_set, DescriptorPool, DescriptorSetLayout};
use super::framebuffer::FrameTargets;
use super::render_pass::RenderPass;
use super::shader::{GraphicsPipeline, PipelineLayout, ShaderModule};
use super::sync::FrameSync;
use super::texture::{Texture, TextureKind};
use super::window::Window;
use crate::assets::{CubemapImages, ImageData};
use crate::config::{AssetConfig, RendererConfig};
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::render::backend::{
    BackendResult, ClearValues, DrawCall, LightingUniforms, MeshId, RenderBackend, RenderError, TextureId,
};
use crate::render::mesh::Mesh;
use crate::render::pipeline_state::{PipelineKey, PipelineState, ShaderProgram, TextureBinding};

/// Textures the descriptor pool has room for, placeholder included
const MAX_TEXTURES: u32 = 16;

/// Per-draw data pushed to both shader stages (128 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
struct PushConstants {
    /// `projection * coordinate fixup * view * model`, column-major
    mvp: [f32; 16],
    /// First three rows of the model matrix
    model_rows: [[f32; 4]; 3],
    object_color: [f32; 4],
}

// Only f32 arrays, no padding
unsafe impl bytemuck::Pod for PushConstants {}
unsafe impl bytemuck::Zeroable for PushConstants {}

impl PushConstants {
    fn from_call(call: &DrawCall) -> Self {
        let mvp = call.projection * Mat4::vulkan_coordinate_transform() * call.view * call.model;

        let mut mvp_columns = [0.0; 16];
        mvp_columns.copy_from_slice(mvp.as_slice());

        let m = &call.model;
        let row = |i: usize| [m[(i, 0)], m[(i, 1)], m[(i, 2)], m[(i, 3)]];

        Self {
            mvp: mvp_columns,
            model_rows: [row(0), row(1), row(2)],
            object_color: call.object_color.into(),
        }
    }
}

/// Lighting uniform block, std140
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct LightingBlock {
    light_position: [f32; 4],
    view_position: [f32; 4],
    light_color: [f32; 4],
}

unsafe impl bytemuck::Pod for LightingBlock {}
unsafe impl bytemuck::Zeroable for LightingBlock {}

impl From<&LightingUniforms> for LightingBlock {
    fn from(lighting: &LightingUniforms) -> Self {
        let pad = |v: crate::foundation::math::Vec3| [v.x, v.y, v.z, 1.0];
        Self {
            light_position: pad(lighting.light_position),
            view_position: pad(lighting.view_position),
            light_color: pad(lighting.light_color),
        }
    }
}

/// Resources owned by one frame in flight
struct FrameSlot {
    sync: FrameSync,
    command_buffer: vk::CommandBuffer,
    lighting: UniformBuffer<LightingBlock>,
}

/// Uploaded texture and its descriptor set for each frame slot
struct GpuTexture {
    texture: Texture,
    sets: Vec<vk::DescriptorSet>,
}

struct QueuedDraw {
    key: PipelineKey,
    texture: TextureId,
    mesh: MeshId,
    push: PushConstants,
}

struct PendingFrame {
    clear: ClearValues,
    lighting: Option<LightingUniforms>,
    draws: Vec<QueuedDraw>,
}

/// Vulkan rendering backend
///
/// Field order is drop order; everything created from the device drops before
/// the context.
pub struct VulkanBackend {
    frames: Vec<FrameSlot>,
    pipelines: HashMap<PipelineKey, GraphicsPipeline>,
    shaders: HashMap<ShaderProgram, (ShaderModule, ShaderModule)>,
    pipeline_layout: PipelineLayout,
    textures: SlotMap<TextureId, GpuTexture>,
    meshes: SlotMap<MeshId, GpuMesh>,
    descriptor_pool: DescriptorPool,
    set_layout: DescriptorSetLayout,
    targets: FrameTargets,
    render_pass: RenderPass,
    command_pool: CommandPool,
    context: VulkanContext,
    placeholder: TextureId,
    current_frame: usize,
    pending: Option<PendingFrame>,
}

impl VulkanBackend {
    /// Initialize Vulkan for `window` and load every shader program
    pub fn new(window: &mut Window, renderer: &RendererConfig, assets: &AssetConfig) -> BackendResult<Self> {
        let context = VulkanContext::new(window, &renderer.application_name, renderer.enable_validation)?;
        let device = context.raw_device();
        let frame_count = renderer.max_frames_in_flight.max(1);

        let command_pool = CommandPool::new(device.clone(), context.physical_device().graphics_family)?;
        let render_pass = RenderPass::new_forward_pass(device.clone(), context.swapchain()?.format())?;
        let targets = FrameTargets::new(&device, context.physical_device(), context.swapchain()?, &render_pass)?;

        let set_layout = DescriptorSetLayout::scene(&device)?;
        let descriptor_pool = DescriptorPool::new(device.clone(), MAX_TEXTURES * frame_count as u32)?;
        let pipeline_layout = PipelineLayout::new(
            device.clone(),
            set_layout.handle(),
            std::mem::size_of::<PushConstants>() as u32,
        )?;

        let mut shaders = HashMap::new();
        for program in ShaderProgram::ALL {
            let vertex = ShaderModule::from_file(device.clone(), assets.shader_path(program.file_stem(), "vert"))?;
            let fragment = ShaderModule::from_file(device.clone(), assets.shader_path(program.file_stem(), "frag"))?;
            shaders.insert(program, (vertex, fragment));
        }

        let command_buffers = command_pool.allocate_command_buffers(frame_count as u32)?;
        let frames = command_buffers
            .into_iter()
            .map(|command_buffer| {
                Ok(FrameSlot {
                    sync: FrameSync::new(&device)?,
                    command_buffer,
                    lighting: UniformBuffer::new(device.clone(), context.physical_device())?,
                })
            })
            .collect::<VulkanResult<Vec<_>>>()?;

        let mut backend = Self {
            frames,
            pipelines: HashMap::new(),
            shaders,
            pipeline_layout,
            textures: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            descriptor_pool,
            set_layout,
            targets,
            render_pass,
            command_pool,
            context,
            placeholder: TextureId::default(),
            current_frame: 0,
            pending: None,
        };

        let white = backend.transfer(|ctx| Texture::solid_color(ctx, [255, 255, 255, 255]))?;
        backend.placeholder = backend.register_texture(white)?;

        log::info!("Vulkan backend ready ({frame_count} frames in flight)");
        Ok(backend)
    }

    /// Rebuild the swapchain and its framebuffers at the window's current size
    ///
    /// Call after [`RenderError::SwapchainOutOfDate`] or a resize event, once the
    /// framebuffer size is non-zero.
    pub fn recreate_swapchain(&mut self, window: &Window) -> BackendResult<()> {
        let old_format = self.context.swapchain()?.format();
        self.context.recreate_swapchain(window)?;
        let swapchain = self.context.swapchain()?;

        if swapchain.format() != old_format {
            log::warn!("Swapchain format changed to {:?}; rebuilding pipelines", swapchain.format());
            self.pipelines.clear();
            self.render_pass = RenderPass::new_forward_pass(self.context.raw_device(), swapchain.format())?;
        }

        self.targets = FrameTargets::new(
            &self.context.raw_device(),
            self.context.physical_device(),
            self.context.swapchain()?,
            &self.render_pass,
        )?;
        Ok(())
    }

    fn transfer<T>(&self, upload: impl FnOnce(&TransferContext<'_>) -> VulkanResult<T>) -> VulkanResult<T> {
        let ctx = TransferContext {
            device: &self.context.device().device,
            physical: self.context.physical_device(),
            pool: &self.command_pool,
            queue: self.context.device().graphics_queue,
        };
        upload(&ctx)
    }

    /// Allocate per-frame descriptor sets for `texture` and store it
    fn register_texture(&mut self, texture: Texture) -> VulkanResult<TextureId> {
        let layouts = vec![self.set_layout.handle(); self.frames.len()];
        let sets = self.descriptor_pool.allocate(&layouts)?;

        let device = &self.context.device().device;
        for (set, frame) in sets.iter().zip(&self.frames) {
            write_scene_set(
                device,
                *set,
                (frame.lighting.handle(), frame.lighting.size()),
                (texture.image_view(), texture.sampler()),
            );
        }

        Ok(self.textures.insert(GpuTexture { texture, sets }))
    }

    /// Texture a binding resolves to, checked against the kind the binding expects
    fn resolve_texture(&self, binding: TextureBinding) -> BackendResult<TextureId> {
        let (id, expected) = match binding {
            TextureBinding::None => return Ok(self.placeholder),
            TextureBinding::Diffuse(id) => (id, TextureKind::Flat),
            TextureBinding::Cubemap(id) => (id, TextureKind::Cube),
        };
        match self.textures.get(id) {
            Some(gpu) if gpu.texture.kind() == expected => Ok(id),
            _ => Err(RenderError::UnknownTexture(id)),
        }
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) -> VulkanResult<()> {
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }
        let (vertex, fragment) = self.shaders.get(&key.program).ok_or_else(|| VulkanError::InvalidOperation {
            reason: format!("No shaders loaded for {:?}", key.program),
        })?;
        let pipeline = GraphicsPipeline::new(
            self.context.raw_device(),
            self.render_pass.handle(),
            &self.pipeline_layout,
            key,
            vertex,
            fragment,
        )?;
        self.pipelines.insert(key, pipeline);
        Ok(())
    }

    fn record(&self, slot: &FrameSlot, image_index: u32, frame: &PendingFrame) -> VulkanResult<()> {
        let device = &self.context.device().device;
        let extent = self.context.swapchain()?.extent();
        let framebuffer = self.targets.framebuffer(image_index as usize)?;

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: frame.clear.color,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: frame.clear.depth,
                    stencil: 0,
                },
            },
        ];

        let mut recorder = CommandRecorder::begin(device, slot.command_buffer)?;
        {
            let mut pass = recorder.begin_render_pass(self.render_pass.handle(), framebuffer, extent, &clear_values);
            pass.set_viewport_and_scissor(extent);

            let layout = self.pipeline_layout.handle();
            let mut bound: Option<PipelineKey> = None;
            for draw in &frame.draws {
                if bound != Some(draw.key) {
                    let pipeline = self.pipelines.get(&draw.key).ok_or_else(|| VulkanError::InvalidOperation {
                        reason: format!("Pipeline {:?} missing", draw.key),
                    })?;
                    pass.bind_pipeline(pipeline.handle());
                    bound = Some(draw.key);
                }

                let (Some(texture), Some(mesh)) = (self.textures.get(draw.texture), self.meshes.get(draw.mesh)) else {
                    continue;
                };
                pass.bind_descriptor_set(layout, texture.sets[self.current_frame]);
                pass.push_constants(layout, bytemuck::bytes_of(&draw.push));
                pass.bind_geometry(mesh.vertex_buffer(), mesh.index_buffer());
                pass.draw_indexed(mesh.index_count());
            }
        }
        recorder.end()?;
        Ok(())
    }

    fn submit_and_present(&mut self, frame: PendingFrame) -> BackendResult<()> {
        let slot = &self.frames[self.current_frame];
        slot.sync.in_flight.wait(u64::MAX)?;

        let swapchain = self.context.swapchain()?;
        let acquired = unsafe {
            swapchain.loader().acquire_next_image(
                swapchain.handle(),
                u64::MAX,
                slot.sync.image_available.handle(),
                vk::Fence::null(),
            )
        };
        let image_index = match acquired {
            Ok((index, _suboptimal)) => index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => return Err(RenderError::SwapchainOutOfDate),
            Err(e) => return Err(VulkanError::Api(e).into()),
        };

        if let Some(lighting) = &frame.lighting {
            slot.lighting.update(&LightingBlock::from(lighting))?;
        }

        slot.sync.in_flight.reset()?;
        self.record(slot, image_index, &frame)?;

        let device = self.context.device();
        let wait_semaphores = [slot.sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [slot.sync.render_finished.handle()];
        let command_buffers = [slot.command_buffer];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            device
                .device
                .queue_submit(device.graphics_queue, &[submit_info.build()], slot.sync.in_flight.handle())
        }
        .map_err(VulkanError::Api)?;

        let swapchains = [swapchain.handle()];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);
        let presented = unsafe { swapchain.loader().queue_present(device.present_queue, &present_info) };

        self.current_frame = (self.current_frame + 1) % self.frames.len();

        match presented {
            Ok(false) => Ok(()),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(RenderError::SwapchainOutOfDate),
            Err(e) => Err(VulkanError::Api(e).into()),
        }
    }
}

impl RenderBackend for VulkanBackend {
    fn upload_mesh(&mut self, mesh: &Mesh) -> BackendResult<MeshId> {
        let gpu = GpuMesh::new(
            &self.context.raw_device(),
            self.context.physical_device(),
            &mesh.vertices,
            &mesh.indices,
        )?;
        log::debug!("Uploaded mesh: {} vertices, {} indices", mesh.vertices.len(), mesh.indices.len());
        Ok(self.meshes.insert(gpu))
    }

    fn upload_texture(&mut self, image: &ImageData) -> BackendResult<TextureId> {
        let texture = self.transfer(|ctx| Texture::from_image(ctx, image))?;
        Ok(self.register_texture(texture)?)
    }

    fn upload_cubemap(&mut self, images: &CubemapImages) -> BackendResult<TextureId> {
        let texture = self.transfer(|ctx| Texture::cubemap(ctx, images))?;
        Ok(self.register_texture(texture)?)
    }

    fn begin_frame(&mut self, clear: ClearValues) -> BackendResult<()> {
        if self.pending.is_some() {
            log::warn!("begin_frame called twice; discarding queued draws");
        }
        self.pending = Some(PendingFrame {
            clear,
            lighting: None,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn set_lighting(&mut self, lighting: &LightingUniforms) -> BackendResult<()> {
        let frame = self.pending.as_mut().ok_or(RenderError::NoFrameInProgress)?;
        frame.lighting = Some(*lighting);
        Ok(())
    }

    fn draw(&mut self, state: &PipelineState, call: &DrawCall) -> BackendResult<()> {
        if self.pending.is_none() {
            return Err(RenderError::NoFrameInProgress);
        }
        if !self.meshes.contains_key(call.mesh) {
            return Err(RenderError::UnknownMesh(call.mesh));
        }
        let texture = self.resolve_texture(state.texture)?;
        let key = state.pipeline_key();
        self.ensure_pipeline(key)?;

        let draw = QueuedDraw {
            key,
            texture,
            mesh: call.mesh,
            push: PushConstants::from_call(call),
        };
        if let Some(frame) = self.pending.as_mut() {
            frame.draws.push(draw);
        }
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        let frame = self.pending.take().ok_or(RenderError::NoFrameInProgress)?;

        let extent = self.context.swapchain()?.extent();
        if extent.width == 0 || extent.height == 0 {
            return Ok(());
        }

        self.submit_and_present(frame)
    }

    fn extent(&self) -> (u32, u32) {
        self.context
            .swapchain()
            .map_or((0, 0), |swapchain| (swapchain.extent().width, swapchain.extent().height))
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        unsafe {
            let _ = self.context.device().device.device_wait_idle();
        }
    }
}
