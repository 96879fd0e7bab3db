use crate::handle::{BufferAccessType, ImageAccessType};
use crate::pool::ResourcePool;
use wgpu::{
    BufferDescriptor, BufferUsages, Extent3d, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameGraphTextureDescriptor {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub usage: TextureUsages,
    pub sample_count: u32,
    pub mip_level_count: u32,
}

impl FrameGraphTextureDescriptor {
    pub fn image_2d(format: TextureFormat, width: u32, height: u32, usage: TextureUsages) -> Self {
        Self {
            format,
            width,
            height,
            usage,
            sample_count: 1,
            mip_level_count: 1,
        }
    }

    pub fn to_wgpu_descriptor<'a>(&self, label: Option<&'a str>) -> TextureDescriptor<'a> {
        TextureDescriptor {
            label,
            size: Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: self.mip_level_count,
            sample_count: self.sample_count,
            dimension: TextureDimension::D2,
            format: self.format,
            usage: self.usage,
            view_formats: &[],
        }
    }

    pub fn has_depth_stencil_aspect(&self) -> bool {
        self.format.has_depth_aspect() || self.format.has_stencil_aspect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameGraphBufferDescriptor {
    pub size: u64,
    pub usage: BufferUsages,
    pub mapped_at_creation: bool,
}

impl FrameGraphBufferDescriptor {
    pub fn to_wgpu_descriptor<'a>(&self, label: Option<&'a str>) -> BufferDescriptor<'a> {
        BufferDescriptor {
            label,
            size: self.size,
            usage: self.usage,
            mapped_at_creation: self.mapped_at_creation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceDesc {
    Buffer(FrameGraphBufferDescriptor),
    Image(FrameGraphTextureDescriptor),
}

impl ResourceDesc {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Buffer(_) => "buffer",
            Self::Image(_) => "image",
        }
    }
}

pub enum FrameResource<P: ResourcePool> {
    Buffer(P::Buffer),
    RenderTarget(P::RenderTarget),
}

pub struct ResourceData<P: ResourcePool> {
    pub(crate) name: String,
    pub(crate) desc: ResourceDesc,
    pub(crate) creator_pass: Option<u32>,
    pub(crate) version: u32,
    pub(crate) ref_count: u32,
    pub(crate) imported: bool,
    pub(crate) resource: Option<FrameResource<P>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessKind {
    Buffer(BufferAccessType),
    Image(ImageAccessType),
}

/// One declared read or write, appended to the owning pass in declaration
/// order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResourceAccess {
    pub resource_index: u32,
    pub version: u32,
    pub kind: AccessKind,
}

impl ResourceAccess {
    pub fn is_write(&self) -> bool {
        match self.kind {
            AccessKind::Buffer(access) => access.is_write(),
            AccessKind::Image(access) => access.is_write(),
        }
    }
}
