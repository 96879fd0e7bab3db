use crate::resource::{FrameGraphBufferDescriptor, FrameGraphTextureDescriptor};
use log::trace;
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::{Buffer, Device, Texture, TextureFormat, TextureView, TextureViewDescriptor};

/// Backend allocator for transient graph resources. The pool owns aliasing
/// and reuse policy; the graph only requests on demand during its allocate
/// phase and calls `reset` once the frame has been submitted.
pub trait ResourcePool {
    type Buffer;
    type RenderTarget;

    fn create_buffer(&mut self, name: &str, desc: &FrameGraphBufferDescriptor) -> Self::Buffer;
    fn create_render_target(
        &mut self,
        name: &str,
        desc: &FrameGraphTextureDescriptor,
    ) -> Self::RenderTarget;
    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supplies the externally-owned color target the graph imports each frame.
pub trait Viewport<P: ResourcePool> {
    fn current_color_target(&mut self) -> P::RenderTarget;
    fn desc(&self) -> ViewportDesc;
}

pub struct WgpuRenderTarget {
    pub texture: Arc<Texture>,
    pub view: TextureView,
    pub desc: FrameGraphTextureDescriptor,
}

/// Default wgpu-backed pool. Allocations handed out during a frame are
/// recycled by descriptor once both the frame and any external holders have
/// released them.
pub struct WgpuResourcePool {
    device: Arc<Device>,
    free_buffers: HashMap<FrameGraphBufferDescriptor, Vec<Arc<Buffer>>>,
    free_targets: HashMap<FrameGraphTextureDescriptor, Vec<Arc<WgpuRenderTarget>>>,
    in_flight_buffers: Vec<(FrameGraphBufferDescriptor, Arc<Buffer>)>,
    in_flight_targets: Vec<(FrameGraphTextureDescriptor, Arc<WgpuRenderTarget>)>,
}

impl WgpuResourcePool {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            free_buffers: HashMap::new(),
            free_targets: HashMap::new(),
            in_flight_buffers: Vec::new(),
            in_flight_targets: Vec::new(),
        }
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Drops every cached allocation, e.g. after a surface resize.
    pub fn purge(&mut self) {
        self.free_buffers.clear();
        self.free_targets.clear();
        self.in_flight_buffers.clear();
        self.in_flight_targets.clear();
    }

    fn take_free_buffer(&mut self, desc: &FrameGraphBufferDescriptor) -> Option<Arc<Buffer>> {
        let free = self.free_buffers.get_mut(desc)?;
        while let Some(buffer) = free.pop() {
            // Skip entries something outside the pool still holds on to.
            if Arc::strong_count(&buffer) == 1 {
                return Some(buffer);
            }
        }
        None
    }

    fn take_free_target(
        &mut self,
        desc: &FrameGraphTextureDescriptor,
    ) -> Option<Arc<WgpuRenderTarget>> {
        let free = self.free_targets.get_mut(desc)?;
        while let Some(target) = free.pop() {
            if Arc::strong_count(&target) == 1 {
                return Some(target);
            }
        }
        None
    }
}

impl ResourcePool for WgpuResourcePool {
    type Buffer = Arc<Buffer>;
    type RenderTarget = Arc<WgpuRenderTarget>;

    fn create_buffer(&mut self, name: &str, desc: &FrameGraphBufferDescriptor) -> Arc<Buffer> {
        let buffer = match self.take_free_buffer(desc) {
            Some(buffer) => {
                trace!("pool reusing buffer for '{name}'");
                buffer
            }
            None => {
                trace!("pool allocating buffer for '{name}' ({} bytes)", desc.size);
                Arc::new(self.device.create_buffer(&desc.to_wgpu_descriptor(Some(name))))
            }
        };
        self.in_flight_buffers.push((desc.clone(), buffer.clone()));
        buffer
    }

    fn create_render_target(
        &mut self,
        name: &str,
        desc: &FrameGraphTextureDescriptor,
    ) -> Arc<WgpuRenderTarget> {
        let target = match self.take_free_target(desc) {
            Some(target) => {
                trace!("pool reusing render target for '{name}'");
                target
            }
            None => {
                trace!(
                    "pool allocating {}x{} {:?} render target for '{name}'",
                    desc.width, desc.height, desc.format
                );
                let texture = self.device.create_texture(&desc.to_wgpu_descriptor(Some(name)));
                let view = texture.create_view(&TextureViewDescriptor::default());
                Arc::new(WgpuRenderTarget {
                    texture: Arc::new(texture),
                    view,
                    desc: desc.clone(),
                })
            }
        };
        self.in_flight_targets.push((desc.clone(), target.clone()));
        target
    }

    fn reset(&mut self) {
        for (desc, buffer) in self.in_flight_buffers.drain(..) {
            self.free_buffers.entry(desc).or_default().push(buffer);
        }
        for (desc, target) in self.in_flight_targets.drain(..) {
            self.free_targets.entry(desc).or_default().push(target);
        }
    }
}
