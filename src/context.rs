use crate::blackboard::Blackboard;
use crate::handle::{BufferHandle, RenderTargetHandle};
use crate::pool::ResourcePool;
use crate::resource::{FrameResource, ResourceData, ResourceDesc};
use crate::{FrameGraphError, Result};
use std::any::Any;
use wgpu::Color;

pub const MAX_RENDER_TARGETS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadAction<T> {
    #[default]
    Load,
    Clear(T),
    Discard,
}

impl<T> LoadAction<T> {
    fn is_default(&self) -> bool {
        matches!(self, Self::Load)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreAction {
    #[default]
    Store,
    Discard,
}

/// Per-pass load configuration for the bound render targets. Defaults to
/// loading everything; each slot may be configured at most once.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderTargetLoadOperations {
    pub colors: [LoadAction<Color>; MAX_RENDER_TARGETS],
    pub depth: LoadAction<f32>,
    pub stencil: LoadAction<u32>,
}

impl RenderTargetLoadOperations {
    pub fn clear_color(mut self, index: usize, color: Color) -> Self {
        debug_assert!(
            self.colors[index].is_default(),
            "color target {index} load operation set twice"
        );
        self.colors[index] = LoadAction::Clear(color);
        self
    }

    pub fn discard_color(mut self, index: usize) -> Self {
        debug_assert!(
            self.colors[index].is_default(),
            "color target {index} load operation set twice"
        );
        self.colors[index] = LoadAction::Discard;
        self
    }

    pub fn clear_depth(mut self, depth: f32) -> Self {
        debug_assert!(self.depth.is_default(), "depth load operation set twice");
        self.depth = LoadAction::Clear(depth);
        self
    }

    pub fn discard_depth(mut self) -> Self {
        debug_assert!(self.depth.is_default(), "depth load operation set twice");
        self.depth = LoadAction::Discard;
        self
    }

    pub fn clear_stencil(mut self, stencil: u32) -> Self {
        debug_assert!(self.stencil.is_default(), "stencil load operation set twice");
        self.stencil = LoadAction::Clear(stencil);
        self
    }

    pub fn discard_stencil(mut self) -> Self {
        debug_assert!(self.stencil.is_default(), "stencil load operation set twice");
        self.stencil = LoadAction::Discard;
        self
    }
}

/// Per-pass store configuration for the bound render targets. Defaults to
/// storing everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderTargetStoreOperations {
    pub colors: [StoreAction; MAX_RENDER_TARGETS],
    pub depth: StoreAction,
    pub stencil: StoreAction,
}

impl RenderTargetStoreOperations {
    pub fn discard_color(mut self, index: usize) -> Self {
        debug_assert!(
            self.colors[index] == StoreAction::Store,
            "color target {index} store operation set twice"
        );
        self.colors[index] = StoreAction::Discard;
        self
    }

    pub fn discard_depth(mut self) -> Self {
        debug_assert!(self.depth == StoreAction::Store, "depth store operation set twice");
        self.depth = StoreAction::Discard;
        self
    }

    pub fn discard_stencil(mut self) -> Self {
        debug_assert!(
            self.stencil == StoreAction::Store,
            "stencil store operation set twice"
        );
        self.stencil = StoreAction::Discard;
        self
    }
}

/// Backend surface the executor drives: once per live pass to bind state and
/// invoke work, once per frame to finalize and submit.
pub trait ExecutionContext<P: ResourcePool> {
    fn set_render_targets(
        &mut self,
        colors: &[&P::RenderTarget],
        depth_stencil: Option<&P::RenderTarget>,
    );
    fn set_render_target_load_operations(&mut self, operations: RenderTargetLoadOperations);
    fn set_render_target_store_operations(&mut self, operations: RenderTargetStoreOperations);
    fn set_viewport(&mut self, viewport: Rect);
    fn draw(&mut self, data: &dyn Any);
    fn finish(&mut self);
}

/// What a pass callback receives: the backend context plus read access to the
/// frame's resources and blackboard.
pub struct PassExecutionContext<'a, P: ResourcePool> {
    pub(crate) context: &'a mut dyn ExecutionContext<P>,
    pub(crate) resources: &'a [ResourceData<P>],
    pub(crate) blackboard: &'a Blackboard,
}

impl<'a, P: ResourcePool> PassExecutionContext<'a, P> {
    pub fn context(&mut self) -> &mut dyn ExecutionContext<P> {
        &mut *self.context
    }

    pub fn blackboard(&self) -> &Blackboard {
        self.blackboard
    }

    pub fn get_buffer(&self, handle: BufferHandle) -> Result<&P::Buffer> {
        let resource = self.resource(handle.index, handle.version);
        match &resource.resource {
            Some(FrameResource::Buffer(buffer)) => Ok(buffer),
            Some(FrameResource::RenderTarget(_)) => Err(FrameGraphError::ResourceKindMismatch {
                operation: "get_buffer".into(),
                actual: "image".into(),
                resource: resource.name.clone(),
            }),
            None => Err(FrameGraphError::ResourceNotAllocated {
                resource: resource.name.clone(),
            }),
        }
    }

    pub fn get_render_target(&self, handle: RenderTargetHandle) -> Result<&P::RenderTarget> {
        let resource = self.resource(handle.index, handle.version);
        match &resource.resource {
            Some(FrameResource::RenderTarget(target)) => Ok(target),
            Some(FrameResource::Buffer(_)) => Err(FrameGraphError::ResourceKindMismatch {
                operation: "get_render_target".into(),
                actual: "buffer".into(),
                resource: resource.name.clone(),
            }),
            None => Err(FrameGraphError::ResourceNotAllocated {
                resource: resource.name.clone(),
            }),
        }
    }

    pub fn resource_name(&self, index: u32) -> &str {
        &self.resource_data(index).name
    }

    pub fn resource_desc(&self, index: u32) -> &ResourceDesc {
        &self.resource_data(index).desc
    }

    fn resource(&self, index: u32, version: u32) -> &ResourceData<P> {
        let resource = self.resource_data(index);
        // A handle version the resource never reached means the handle
        // outlived the graph instance it came from.
        assert!(
            version <= resource.version,
            "stale handle (v{version}) for resource '{}' at v{}",
            resource.name,
            resource.version
        );
        resource
    }

    fn resource_data(&self, index: u32) -> &ResourceData<P> {
        self.resources
            .get(index as usize)
            .unwrap_or_else(|| panic!("resource index {index} out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_operations_default_to_loading() {
        let operations = RenderTargetLoadOperations::default();
        assert!(operations.colors.iter().all(|color| *color == LoadAction::Load));
        assert_eq!(operations.depth, LoadAction::Load);
        assert_eq!(operations.stencil, LoadAction::Load);
    }

    #[test]
    fn load_operations_configure_per_slot() {
        let operations = RenderTargetLoadOperations::default()
            .clear_color(0, Color::BLACK)
            .discard_color(1)
            .clear_depth(1.0)
            .clear_stencil(0);
        assert_eq!(operations.colors[0], LoadAction::Clear(Color::BLACK));
        assert_eq!(operations.colors[1], LoadAction::Discard);
        assert_eq!(operations.colors[2], LoadAction::Load);
        assert_eq!(operations.depth, LoadAction::Clear(1.0));
        assert_eq!(operations.stencil, LoadAction::Clear(0));
    }

    #[test]
    #[should_panic(expected = "set twice")]
    fn double_configured_color_slot_panics() {
        let _ = RenderTargetLoadOperations::default()
            .clear_color(0, Color::BLACK)
            .discard_color(0);
    }

    #[test]
    fn store_operations_discard_per_slot() {
        let operations = RenderTargetStoreOperations::default()
            .discard_color(3)
            .discard_depth();
        assert_eq!(operations.colors[3], StoreAction::Discard);
        assert_eq!(operations.colors[0], StoreAction::Store);
        assert_eq!(operations.depth, StoreAction::Discard);
        assert_eq!(operations.stencil, StoreAction::Store);
    }
}
