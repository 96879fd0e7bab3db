//! A per-frame declarative frame graph: rendering subsystems declare passes
//! and resource accesses without knowing about each other, dead work is
//! culled by reference counting, and only surviving resources are allocated
//! before pass callbacks run in declaration order.

mod blackboard;
mod builder;
mod context;
mod graph;
mod handle;
mod pass;
mod pool;
mod resource;

pub use blackboard::Blackboard;
pub use builder::{FrameGraphBuilder, FrameGraphPassBuilder};
pub use context::{
    ExecutionContext, LoadAction, MAX_RENDER_TARGETS, PassExecutionContext, Rect,
    RenderTargetLoadOperations, RenderTargetStoreOperations, StoreAction,
};
pub use graph::FrameGraph;
pub use handle::{
    BufferAccessType, BufferHandle, BufferReadType, BufferWriteType, ImageAccessType,
    ImageReadType, ImageWriteType, INVALID_RESOURCE_INDEX, RenderTargetHandle,
};
pub use pass::PassProducer;
pub use pool::{ResourcePool, Viewport, ViewportDesc, WgpuRenderTarget, WgpuResourcePool};
pub use resource::{FrameGraphBufferDescriptor, FrameGraphTextureDescriptor, ResourceDesc};

#[derive(Debug, thiserror::Error)]
pub enum FrameGraphError {
    #[error("Resource '{resource}' was culled and never allocated")]
    ResourceNotAllocated { resource: String },

    #[error("{operation} called on {actual} resource '{resource}'")]
    ResourceKindMismatch {
        operation: String,
        actual: String,
        resource: String,
    },

    #[error("Pass execution failed: {reason}")]
    PassExecution { reason: String },
}

pub type Result<T> = std::result::Result<T, FrameGraphError>;
