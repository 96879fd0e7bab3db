pub const INVALID_RESOURCE_INDEX: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageWriteType {
    Undefined,
    TransferDestination,
    UnorderedAccess,
    ColorTarget,
    DepthStencilTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageReadType {
    TransferSource,
    ShaderResource,
    DepthRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferWriteType {
    Undefined,
    TransferDestination,
    UnorderedAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferReadType {
    TransferSource,
    ShaderResource,
    IndirectArgument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageAccessType {
    Write(ImageWriteType),
    Read(ImageReadType),
}

impl ImageAccessType {
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write(_))
    }
}

impl From<ImageWriteType> for ImageAccessType {
    fn from(write: ImageWriteType) -> Self {
        Self::Write(write)
    }
}

impl From<ImageReadType> for ImageAccessType {
    fn from(read: ImageReadType) -> Self {
        Self::Read(read)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferAccessType {
    Write(BufferWriteType),
    Read(BufferReadType),
}

impl BufferAccessType {
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write(_))
    }
}

impl From<BufferWriteType> for BufferAccessType {
    fn from(write: BufferWriteType) -> Self {
        Self::Write(write)
    }
}

impl From<BufferReadType> for BufferAccessType {
    fn from(read: BufferReadType) -> Self {
        Self::Read(read)
    }
}

/// Capability to reference a graph buffer at a specific point in its
/// access history. Version 0 means the resource has not been accessed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    pub index: u32,
    pub version: u32,
    pub access: BufferAccessType,
}

impl BufferHandle {
    pub const INVALID: Self = Self {
        index: INVALID_RESOURCE_INDEX,
        version: 0,
        access: BufferAccessType::Write(BufferWriteType::Undefined),
    };

    pub fn is_valid(&self) -> bool {
        self.index != INVALID_RESOURCE_INDEX
    }
}

/// Capability to reference a graph render target at a specific point in its
/// access history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetHandle {
    pub index: u32,
    pub version: u32,
    pub access: ImageAccessType,
}

impl RenderTargetHandle {
    pub const INVALID: Self = Self {
        index: INVALID_RESOURCE_INDEX,
        version: 0,
        access: ImageAccessType::Write(ImageWriteType::Undefined),
    };

    pub fn is_valid(&self) -> bool {
        self.index != INVALID_RESOURCE_INDEX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_handles_are_invalid() {
        assert!(!BufferHandle::INVALID.is_valid());
        assert!(!RenderTargetHandle::INVALID.is_valid());
    }

    #[test]
    fn handles_compare_by_index_and_version() {
        let a = BufferHandle {
            index: 3,
            version: 1,
            access: BufferWriteType::UnorderedAccess.into(),
        };
        let b = BufferHandle { version: 2, ..a };
        assert_ne!(a, b);
        assert_eq!(a, BufferHandle { ..a });
    }

    #[test]
    fn access_conversions_preserve_direction() {
        let write: ImageAccessType = ImageWriteType::ColorTarget.into();
        assert!(write.is_write());
        let read: ImageAccessType = ImageReadType::ShaderResource.into();
        assert!(!read.is_write());
        let read: BufferAccessType = BufferReadType::IndirectArgument.into();
        assert!(!read.is_write());
    }
}
