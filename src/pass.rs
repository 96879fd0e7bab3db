use crate::builder::FrameGraphBuilder;
use crate::context::PassExecutionContext;
use crate::pool::ResourcePool;
use crate::resource::ResourceAccess;
use crate::Result;

pub(crate) type PassCallback<P> =
    Box<dyn FnMut(&mut PassExecutionContext<'_, P>) -> Result<()>>;

/// A rendering subsystem that declares passes into the graph each frame.
/// `setup` runs exactly once per frame, in registration order.
pub trait PassProducer<P: ResourcePool> {
    fn setup(&mut self, builder: &mut FrameGraphBuilder<'_, P>);
}

pub(crate) struct PassData<P: ResourcePool> {
    pub name: String,
    pub producer_index: u32,
    pub ref_count: u32,
    pub accesses: Vec<ResourceAccess>,
    pub execute: Option<PassCallback<P>>,
}

impl<P: ResourcePool> PassData<P> {
    pub fn new(name: String, producer_index: u32) -> Self {
        Self {
            name,
            producer_index,
            ref_count: 0,
            accesses: Vec::new(),
            execute: None,
        }
    }

    pub fn write_count(&self) -> u32 {
        self.accesses.iter().filter(|access| access.is_write()).count() as u32
    }
}
