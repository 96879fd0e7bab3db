use crate::blackboard::Blackboard;
use crate::builder::FrameGraphBuilder;
use crate::context::{ExecutionContext, PassExecutionContext, Rect};
use crate::handle::{
    BufferAccessType, BufferHandle, ImageAccessType, ImageWriteType, RenderTargetHandle,
};
use crate::pass::{PassCallback, PassData, PassProducer};
use crate::pool::{ResourcePool, Viewport, ViewportDesc};
use crate::resource::{
    AccessKind, FrameGraphBufferDescriptor, FrameGraphTextureDescriptor, FrameResource,
    ResourceAccess, ResourceData, ResourceDesc,
};
use crate::Result;
use log::{debug, trace};
use std::mem;
use wgpu::{TextureFormat, TextureUsages};

/// A per-frame dataflow scheduler over declared GPU work. Producers declare
/// passes and resource accesses, the compile step culls work nothing
/// observes, and the executor allocates survivors and runs their callbacks
/// in declaration order. Every instance is built, executed, and torn down
/// within a single frame.
pub struct FrameGraph<P: ResourcePool> {
    pool: P,
    viewport: Option<Box<dyn Viewport<P>>>,
    producers: Vec<Box<dyn PassProducer<P>>>,
    pub(crate) resources: Vec<ResourceData<P>>,
    pub(crate) passes: Vec<PassData<P>>,
    pub(crate) blackboard: Blackboard,
    pub(crate) main_color: RenderTargetHandle,
    pub(crate) main_depth: RenderTargetHandle,
    pub(crate) viewport_desc: Option<ViewportDesc>,
}

impl<P: ResourcePool> FrameGraph<P> {
    pub fn new(pool: P) -> Self {
        Self {
            pool,
            viewport: None,
            producers: Vec::new(),
            resources: Vec::new(),
            passes: Vec::new(),
            blackboard: Blackboard::new(),
            main_color: RenderTargetHandle::INVALID,
            main_depth: RenderTargetHandle::INVALID,
            viewport_desc: None,
        }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut P {
        &mut self.pool
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn register_viewport(&mut self, viewport: Box<dyn Viewport<P>>) {
        self.viewport = Some(viewport);
    }

    pub fn add_pass_producer(&mut self, producer: Box<dyn PassProducer<P>>) {
        self.producers.push(producer);
    }

    /// Binds an externally-owned render target into this frame's resource
    /// table. Imported resources are never culled or allocated by the graph.
    pub fn import_render_target(
        &mut self,
        name: impl Into<String>,
        resource: P::RenderTarget,
        desc: FrameGraphTextureDescriptor,
        access: ImageAccessType,
    ) -> RenderTargetHandle {
        let index = self.push_imported(
            name.into(),
            ResourceDesc::Image(desc),
            FrameResource::RenderTarget(resource),
        );
        RenderTargetHandle {
            index,
            version: 0,
            access,
        }
    }

    pub fn import_buffer(
        &mut self,
        name: impl Into<String>,
        resource: P::Buffer,
        desc: FrameGraphBufferDescriptor,
        access: BufferAccessType,
    ) -> BufferHandle {
        let index = self.push_imported(
            name.into(),
            ResourceDesc::Buffer(desc),
            FrameResource::Buffer(resource),
        );
        BufferHandle {
            index,
            version: 0,
            access,
        }
    }

    fn push_imported(
        &mut self,
        name: String,
        desc: ResourceDesc,
        resource: FrameResource<P>,
    ) -> u32 {
        let index = self.resources.len() as u32;
        trace!("imported {} '{name}'", desc.kind_name());
        self.resources.push(ResourceData {
            name,
            desc,
            creator_pass: None,
            version: 0,
            ref_count: 1,
            imported: true,
            resource: Some(resource),
        });
        index
    }

    /// Runs one frame: import, declare, compile, allocate, execute, finish.
    /// The graph is reset afterwards whether or not a pass callback failed;
    /// `finish` is only invoked on the context for a fully executed frame.
    pub fn execute(&mut self, context: &mut dyn ExecutionContext<P>) -> Result<()> {
        let mut viewport = self
            .viewport
            .take()
            .expect("no viewport registered for this frame");
        let viewport_desc = viewport.desc();
        self.viewport_desc = Some(viewport_desc);

        let color_desc = FrameGraphTextureDescriptor::image_2d(
            viewport_desc.format,
            viewport_desc.width,
            viewport_desc.height,
            TextureUsages::RENDER_ATTACHMENT,
        );
        let color = viewport.current_color_target();
        self.main_color = self.import_render_target(
            "MainColorTarget",
            color,
            color_desc,
            ImageWriteType::ColorTarget.into(),
        );

        let depth_desc = FrameGraphTextureDescriptor::image_2d(
            TextureFormat::Depth32FloatStencil8,
            viewport_desc.width,
            viewport_desc.height,
            TextureUsages::RENDER_ATTACHMENT,
        );
        let depth = self.pool.create_render_target("MainDepthTarget", &depth_desc);
        self.main_depth = self.import_render_target(
            "MainDepthTarget",
            depth,
            depth_desc,
            ImageWriteType::DepthStencilTarget.into(),
        );

        let mut producers = mem::take(&mut self.producers);
        for (producer_index, producer) in producers.iter_mut().enumerate() {
            let mut builder = FrameGraphBuilder {
                graph: &mut *self,
                producer_index: producer_index as u32,
            };
            producer.setup(&mut builder);
        }
        self.producers = producers;

        self.compile();
        self.allocate();

        let result = self.dispatch(context);
        if result.is_ok() {
            context.finish();
        }
        self.reset();
        self.pool.reset();
        result
    }

    /// Reference-counted dead-code elimination over the declared accesses.
    /// A pass's count is its number of writes; a resource's count is its
    /// number of readers (plus one for imports). Unread resources seed a
    /// stack, and culling a creator pass releases everything it read.
    pub(crate) fn compile(&mut self) {
        for pass in &mut self.passes {
            pass.ref_count = pass.write_count();
        }
        for resource in &mut self.resources {
            resource.ref_count = u32::from(resource.imported);
        }
        for pass in &self.passes {
            for access in &pass.accesses {
                if !access.is_write() {
                    self.resources[access.resource_index as usize].ref_count += 1;
                }
            }
        }

        let mut dead: Vec<u32> = self
            .resources
            .iter()
            .enumerate()
            .filter(|(_, resource)| resource.ref_count == 0)
            .map(|(index, _)| index as u32)
            .collect();

        while let Some(resource_index) = dead.pop() {
            let resource = &self.resources[resource_index as usize];
            if resource.imported {
                continue;
            }
            let Some(creator_index) = resource.creator_pass else {
                continue;
            };
            let pass = &mut self.passes[creator_index as usize];
            // A creator can already be dead here: a pass that creates a
            // resource it never writes (or performs no writes at all) starts
            // at 0, and its remaining created resources still pop off the
            // stack. Reads are released only on the 1 -> 0 transition.
            if pass.ref_count == 0 {
                continue;
            }
            pass.ref_count -= 1;
            if pass.ref_count != 0 {
                continue;
            }
            trace!("culling pass '{}' (producer {})", pass.name, pass.producer_index);
            let read_indices: Vec<u32> = pass
                .accesses
                .iter()
                .filter(|access| !access.is_write())
                .map(|access| access.resource_index)
                .collect();
            for read_index in read_indices {
                let read_resource = &mut self.resources[read_index as usize];
                debug_assert!(
                    read_resource.ref_count > 0,
                    "ref count underflow on resource '{}'",
                    read_resource.name
                );
                read_resource.ref_count = read_resource.ref_count.saturating_sub(1);
                if read_resource.ref_count == 0 {
                    dead.push(read_index);
                }
            }
        }

        let live = self.passes.iter().filter(|pass| pass.ref_count > 0).count();
        debug!("compiled frame graph: {live}/{} passes live", self.passes.len());
    }

    fn allocate(&mut self) {
        for resource in &mut self.resources {
            if resource.imported || resource.ref_count == 0 || resource.resource.is_some() {
                continue;
            }
            trace!("allocating {} '{}'", resource.desc.kind_name(), resource.name);
            resource.resource = Some(match &resource.desc {
                ResourceDesc::Buffer(desc) => {
                    FrameResource::Buffer(self.pool.create_buffer(&resource.name, desc))
                }
                ResourceDesc::Image(desc) => {
                    FrameResource::RenderTarget(self.pool.create_render_target(&resource.name, desc))
                }
            });
        }
    }

    fn dispatch(&mut self, context: &mut dyn ExecutionContext<P>) -> Result<()> {
        let viewport_desc = self.viewport_desc.expect("viewport descriptor not bound");
        let full_viewport = Rect {
            x: 0.0,
            y: 0.0,
            width: viewport_desc.width as f32,
            height: viewport_desc.height as f32,
        };

        for pass_index in 0..self.passes.len() {
            if self.passes[pass_index].ref_count == 0 {
                debug!("skipping culled pass '{}'", self.passes[pass_index].name);
                continue;
            }

            let mut callback = self.passes[pass_index].execute.take();
            {
                let pass = &self.passes[pass_index];
                let mut bound: Vec<u32> = Vec::new();
                let mut colors: Vec<&P::RenderTarget> = Vec::new();
                let mut depth_stencil: Option<&P::RenderTarget> = None;
                for access in &pass.accesses {
                    let AccessKind::Image(ImageAccessType::Write(write)) = access.kind else {
                        continue;
                    };
                    if !matches!(
                        write,
                        ImageWriteType::ColorTarget | ImageWriteType::DepthStencilTarget
                    ) {
                        continue;
                    }
                    if bound.contains(&access.resource_index) {
                        continue;
                    }
                    bound.push(access.resource_index);
                    let resource = &self.resources[access.resource_index as usize];
                    let Some(FrameResource::RenderTarget(target)) = &resource.resource else {
                        // A written target nobody reads was culled along with
                        // its allocation; there is nothing to bind.
                        continue;
                    };
                    match write {
                        ImageWriteType::ColorTarget => colors.push(target),
                        ImageWriteType::DepthStencilTarget => {
                            debug_assert!(
                                depth_stencil.is_none(),
                                "pass '{}' binds two depth-stencil targets",
                                pass.name
                            );
                            depth_stencil = Some(target);
                        }
                        _ => unreachable!(),
                    }
                }
                context.set_render_targets(&colors, depth_stencil);
                context.set_viewport(full_viewport);
            }

            if let Some(callback) = &mut callback {
                trace!("executing pass '{}'", self.passes[pass_index].name);
                let mut pass_context = PassExecutionContext {
                    context: &mut *context,
                    resources: &self.resources,
                    blackboard: &self.blackboard,
                };
                callback(&mut pass_context)?;
            }
        }
        Ok(())
    }

    /// Clears all per-frame state in bulk, retaining allocation capacity.
    pub(crate) fn reset(&mut self) {
        self.resources.clear();
        self.passes.clear();
        self.producers.clear();
        self.blackboard.clear();
        self.viewport = None;
        self.main_color = RenderTargetHandle::INVALID;
        self.main_depth = RenderTargetHandle::INVALID;
        self.viewport_desc = None;
    }

    pub(crate) fn add_pass(&mut self, name: String, producer_index: u32) -> u32 {
        let pass_index = self.passes.len() as u32;
        trace!("producer {producer_index} added pass '{name}'");
        self.passes.push(PassData::new(name, producer_index));
        pass_index
    }

    pub(crate) fn create_resource(
        &mut self,
        name: String,
        desc: ResourceDesc,
        creator_pass: u32,
    ) -> u32 {
        let index = self.resources.len() as u32;
        trace!(
            "pass '{}' created {} '{name}'",
            self.passes[creator_pass as usize].name,
            desc.kind_name()
        );
        self.resources.push(ResourceData {
            name,
            desc,
            creator_pass: Some(creator_pass),
            version: 0,
            ref_count: 0,
            imported: false,
            resource: None,
        });
        index
    }

    pub(crate) fn declare_buffer_access(
        &mut self,
        pass_index: u32,
        handle: BufferHandle,
        access: BufferAccessType,
    ) -> BufferHandle {
        let version = self.declare_access(pass_index, handle.index, AccessKind::Buffer(access));
        BufferHandle {
            index: handle.index,
            version,
            access,
        }
    }

    pub(crate) fn declare_image_access(
        &mut self,
        pass_index: u32,
        handle: RenderTargetHandle,
        access: ImageAccessType,
    ) -> RenderTargetHandle {
        let version = self.declare_access(pass_index, handle.index, AccessKind::Image(access));
        RenderTargetHandle {
            index: handle.index,
            version,
            access,
        }
    }

    pub(crate) fn declare_render_target_write(
        &mut self,
        pass_index: u32,
        handle: RenderTargetHandle,
    ) -> RenderTargetHandle {
        let resource = self
            .resources
            .get(handle.index as usize)
            .unwrap_or_else(|| panic!("resource index {} out of range", handle.index));
        let write = match &resource.desc {
            ResourceDesc::Image(desc) if desc.has_depth_stencil_aspect() => {
                ImageWriteType::DepthStencilTarget
            }
            ResourceDesc::Image(_) => ImageWriteType::ColorTarget,
            ResourceDesc::Buffer(_) => panic!(
                "write_render_target called on buffer resource '{}'",
                resource.name
            ),
        };
        self.declare_image_access(pass_index, handle, write.into())
    }

    fn declare_access(&mut self, pass_index: u32, resource_index: u32, kind: AccessKind) -> u32 {
        let resource = self
            .resources
            .get_mut(resource_index as usize)
            .unwrap_or_else(|| panic!("resource index {resource_index} out of range"));
        match (&kind, &resource.desc) {
            (AccessKind::Buffer(_), ResourceDesc::Buffer(_)) => {}
            (AccessKind::Image(_), ResourceDesc::Image(_)) => {}
            _ => panic!(
                "{} access declared on {} resource '{}'",
                match kind {
                    AccessKind::Buffer(_) => "buffer",
                    AccessKind::Image(_) => "image",
                },
                resource.desc.kind_name(),
                resource.name
            ),
        }

        let access = ResourceAccess {
            resource_index,
            version: resource.version + 1,
            kind,
        };
        if !access.is_write() {
            assert!(
                access.version > 1 || resource.imported,
                "pass '{}' is reading from a resource that has just been created: '{}'",
                self.passes[pass_index as usize].name,
                resource.name
            );
        }
        resource.version = access.version;
        trace!(
            "pass '{}' {} '{}' v{}",
            self.passes[pass_index as usize].name,
            if access.is_write() { "writes" } else { "reads" },
            resource.name,
            access.version
        );
        self.passes[pass_index as usize].accesses.push(access);
        access.version
    }

    pub(crate) fn set_pass_function(&mut self, pass_index: u32, callback: PassCallback<P>) {
        let pass = &mut self.passes[pass_index as usize];
        assert!(
            pass.execute.is_none(),
            "pass '{}' already has an execution function",
            pass.name
        );
        pass.execute = Some(callback);
    }
}
