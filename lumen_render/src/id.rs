use slotmap::new_key_type;
use std::num::NonZeroU32;

new_key_type! {
    pub struct VertexBufferId;
    pub struct IndexBufferId;
    pub struct VertexArrayId;
    pub struct ShaderId;
    pub struct FramebufferId;
}

/// Raw name of an object living on the graphics API side.
///
/// This is the opaque numeric identifier handed to the UI layer, e.g. the
/// colour attachment of the scene framebuffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct GpuHandle(pub NonZeroU32);

impl GpuHandle {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct UniformLocation(pub u32);
