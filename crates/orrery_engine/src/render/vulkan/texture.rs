//! Sampled textures: 2D images, cube maps and solid-color placeholders

use ash::{vk, Device};

use super::buffer::Buffer;
use super::commands::TransferContext;
use super::context::{VulkanError, VulkanResult};
use crate::assets::{CubemapImages, ImageData};

const FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// Shape of a texture's image view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// Single 2D layer with repeating addressing
    Flat,
    /// Six layers viewed as a cube, clamped at the edges
    Cube,
}

impl TextureKind {
    fn layer_count(self) -> u32 {
        match self {
            TextureKind::Flat => 1,
            TextureKind::Cube => 6,
        }
    }
}

/// Device-local texture with view and sampler
pub struct Texture {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    image_view: vk::ImageView,
    sampler: vk::Sampler,
    kind: TextureKind,
}

impl Texture {
    /// 2D texture from decoded RGBA pixels
    pub fn from_image(ctx: &TransferContext<'_>, image: &ImageData) -> VulkanResult<Self> {
        Self::new(ctx, image.width, image.height, TextureKind::Flat, &image.data)
    }

    /// Cube texture, faces uploaded in +X, -X, +Y, -Y, +Z, -Z order
    pub fn cubemap(ctx: &TransferContext<'_>, images: &CubemapImages) -> VulkanResult<Self> {
        let size = images.size();
        let pixels: Vec<u8> = images.faces().iter().flat_map(|face| face.data.iter().copied()).collect();
        Self::new(ctx, size, size, TextureKind::Cube, &pixels)
    }

    /// 1x1 texture of a single color
    pub fn solid_color(ctx: &TransferContext<'_>, color: [u8; 4]) -> VulkanResult<Self> {
        Self::new(ctx, 1, 1, TextureKind::Flat, &color)
    }

    fn new(
        ctx: &TransferContext<'_>,
        width: u32,
        height: u32,
        kind: TextureKind,
        pixels: &[u8],
    ) -> VulkanResult<Self> {
        let layers = kind.layer_count();
        let layer_bytes = width as usize * height as usize * 4;
        if pixels.len() != layer_bytes * layers as usize {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "Texture data is {} bytes, expected {} for {width}x{height}x{layers}",
                    pixels.len(),
                    layer_bytes * layers as usize
                ),
            });
        }

        let device = ctx.device.clone();

        let flags = match kind {
            TextureKind::Flat => vk::ImageCreateFlags::empty(),
            TextureKind::Cube => vk::ImageCreateFlags::CUBE_COMPATIBLE,
        };
        let image_info = vk::ImageCreateInfo::builder()
            .flags(flags)
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D { width, height, depth: 1 })
            .mip_levels(1)
            .array_layers(layers)
            .format(FORMAT)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);
        let image = unsafe { device.create_image(&image_info, None) }.map_err(VulkanError::Api)?;

        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory_type = ctx
            .physical
            .find_memory_type(requirements.memory_type_bits, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);
        let memory = unsafe { device.allocate_memory(&alloc_info, None) }.map_err(VulkanError::Api)?;
        unsafe { device.bind_image_memory(image, memory, 0) }.map_err(VulkanError::Api)?;

        let staging = Buffer::with_data(device.clone(), ctx.physical, vk::BufferUsageFlags::TRANSFER_SRC, pixels)?;
        ctx.pool.submit_once(ctx.queue, |device, command_buffer| {
            record_upload(device, command_buffer, staging.handle(), image, width, height, layers);
        })?;

        let subresource_range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: layers,
        };
        let view_type = match kind {
            TextureKind::Flat => vk::ImageViewType::TYPE_2D,
            TextureKind::Cube => vk::ImageViewType::CUBE,
        };
        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(view_type)
            .format(FORMAT)
            .subresource_range(subresource_range);
        let image_view = unsafe { device.create_image_view(&view_info, None) }.map_err(VulkanError::Api)?;

        let address_mode = match kind {
            TextureKind::Flat => vk::SamplerAddressMode::REPEAT,
            TextureKind::Cube => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        };
        let sampler_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(address_mode)
            .address_mode_v(address_mode)
            .address_mode_w(address_mode)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR);
        let sampler = unsafe { device.create_sampler(&sampler_info, None) }.map_err(VulkanError::Api)?;

        log::debug!("Uploaded {kind:?} texture {width}x{height}");

        Ok(Self {
            device,
            image,
            memory,
            image_view,
            sampler,
            kind,
        })
    }

    /// Image view for descriptor writes
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    /// Sampler for descriptor writes
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    /// Flat or cube
    pub fn kind(&self) -> TextureKind {
        self.kind
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
            self.device.destroy_image_view(self.image_view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Transition to transfer-dst, copy every layer, transition to shader-read
fn record_upload(
    device: &Device,
    command_buffer: vk::CommandBuffer,
    staging: vk::Buffer,
    image: vk::Image,
    width: u32,
    height: u32,
    layers: u32,
) {
    let range = vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: layers,
    };

    let to_transfer = vk::ImageMemoryBarrier::builder()
        .old_layout(vk::ImageLayout::UNDEFINED)
        .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(range)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE)
        .build();

    let layer_bytes = vk::DeviceSize::from(width) * vk::DeviceSize::from(height) * 4;
    let regions: Vec<vk::BufferImageCopy> = (0..layers)
        .map(|layer| {
            vk::BufferImageCopy::builder()
                .buffer_offset(layer_bytes * vk::DeviceSize::from(layer))
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: layer,
                    layer_count: 1,
                })
                .image_extent(vk::Extent3D { width, height, depth: 1 })
                .build()
        })
        .collect();

    let to_shader = vk::ImageMemoryBarrier::builder()
        .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
        .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(range)
        .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
        .dst_access_mask(vk::AccessFlags::SHADER_READ)
        .build();

    unsafe {
        device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[to_transfer],
        );
        device.cmd_copy_buffer_to_image(
            command_buffer,
            staging,
            image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &regions,
        );
        device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[to_shader],
        );
    }
}
