use crate::blackboard::Blackboard;
use crate::context::PassExecutionContext;
use crate::graph::FrameGraph;
use crate::handle::{
    BufferHandle, BufferReadType, BufferWriteType, ImageReadType, ImageWriteType,
    RenderTargetHandle,
};
use crate::pool::{ResourcePool, ViewportDesc};
use crate::resource::{
    FrameGraphBufferDescriptor, FrameGraphTextureDescriptor, ResourceDesc,
};
use crate::Result;
use wgpu::BufferUsages;

/// Declarative surface handed to each pass producer's `setup`. The only way
/// passes and resource accesses enter the graph.
pub struct FrameGraphBuilder<'g, P: ResourcePool> {
    pub(crate) graph: &'g mut FrameGraph<P>,
    pub(crate) producer_index: u32,
}

impl<'g, P: ResourcePool> FrameGraphBuilder<'g, P> {
    pub fn add_pass(&mut self, name: impl Into<String>) -> FrameGraphPassBuilder<'_, P> {
        let pass_index = self.graph.add_pass(name.into(), self.producer_index);
        FrameGraphPassBuilder {
            graph: &mut *self.graph,
            pass_index,
        }
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.graph.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.graph.blackboard
    }

    /// Handle to this frame's imported back buffer.
    pub fn main_color_target(&self) -> RenderTargetHandle {
        let handle = self.graph.main_color;
        assert!(handle.is_valid(), "main color target not imported yet");
        handle
    }

    /// Handle to this frame's imported depth-stencil target.
    pub fn main_depth_stencil_target(&self) -> RenderTargetHandle {
        let handle = self.graph.main_depth;
        assert!(handle.is_valid(), "main depth-stencil target not imported yet");
        handle
    }

    pub fn viewport_desc(&self) -> ViewportDesc {
        self.graph
            .viewport_desc
            .expect("viewport descriptor not bound yet")
    }
}

/// Builder for one pass's resource accesses and callback.
pub struct FrameGraphPassBuilder<'g, P: ResourcePool> {
    pub(crate) graph: &'g mut FrameGraph<P>,
    pub(crate) pass_index: u32,
}

impl<'g, P: ResourcePool> FrameGraphPassBuilder<'g, P> {
    pub fn create_buffer(
        &mut self,
        name: impl Into<String>,
        desc: FrameGraphBufferDescriptor,
    ) -> BufferHandle {
        let index = self
            .graph
            .create_resource(name.into(), ResourceDesc::Buffer(desc), self.pass_index);
        BufferHandle {
            index,
            version: 0,
            access: BufferWriteType::Undefined.into(),
        }
    }

    /// Declares a storage buffer sized for `element_count` values of `T`.
    pub fn create_structured_buffer<T>(
        &mut self,
        name: impl Into<String>,
        element_count: usize,
    ) -> BufferHandle {
        self.create_buffer(
            name,
            FrameGraphBufferDescriptor {
                size: (size_of::<T>() * element_count) as u64,
                usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            },
        )
    }

    pub fn create_image(
        &mut self,
        name: impl Into<String>,
        desc: FrameGraphTextureDescriptor,
    ) -> RenderTargetHandle {
        let index = self
            .graph
            .create_resource(name.into(), ResourceDesc::Image(desc), self.pass_index);
        RenderTargetHandle {
            index,
            version: 0,
            access: ImageWriteType::Undefined.into(),
        }
    }

    pub fn read_buffer(&mut self, handle: BufferHandle, read: BufferReadType) -> BufferHandle {
        self.graph
            .declare_buffer_access(self.pass_index, handle, read.into())
    }

    pub fn read_image(&mut self, handle: RenderTargetHandle, read: ImageReadType) -> RenderTargetHandle {
        self.graph
            .declare_image_access(self.pass_index, handle, read.into())
    }

    pub fn write_buffer(&mut self, handle: BufferHandle) -> BufferHandle {
        self.graph.declare_buffer_access(
            self.pass_index,
            handle,
            BufferWriteType::UnorderedAccess.into(),
        )
    }

    /// Declares a render-target write; whether it binds as a color or a
    /// depth-stencil target is derived from the image's format aspect.
    pub fn write_render_target(&mut self, handle: RenderTargetHandle) -> RenderTargetHandle {
        self.graph.declare_render_target_write(self.pass_index, handle)
    }

    pub fn write_uav(&mut self, handle: RenderTargetHandle) -> RenderTargetHandle {
        self.graph.declare_image_access(
            self.pass_index,
            handle,
            ImageWriteType::UnorderedAccess.into(),
        )
    }

    pub fn set_function<F>(&mut self, callback: F)
    where
        F: FnMut(&mut PassExecutionContext<'_, P>) -> Result<()> + 'static,
    {
        self.graph.set_pass_function(self.pass_index, Box::new(callback));
    }
}
