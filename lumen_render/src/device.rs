use glam::{Mat4, Vec4};
use slotmap::SlotMap;
use std::error::Error;

use crate::{
    buffer::{IndexBuffer, VertexArray, VertexBuffer},
    framebuffer::Framebuffer,
    id::{
        FramebufferId, GpuHandle, IndexBufferId, ShaderId, UniformLocation, VertexArrayId,
        VertexBufferId,
    },
    shader::Shader,
};

pub type DeviceError = Box<dyn Error>;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferTarget {
    Vertex,
    Index,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttributeKind {
    Float,
    Int,
    Bool,
}

/// One attribute pointer as recorded into a vertex array.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VertexAttribute {
    pub index: u32,
    pub components: u32,
    pub kind: AttributeKind,
    pub normalized: bool,
    pub stride: u32,
    pub offset: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Float3(glam::Vec3),
    Float4(Vec4),
    Mat4(Mat4),
}

/// The graphics API as seen by the rendering core.
///
/// Every call must be issued from the thread that owns the current context.
/// Creation calls return `Err` only when the API itself refuses to hand out
/// an object; compile and link diagnostics come back as the driver's log text.
pub trait GraphicsApi {
    fn create_buffer(&self, target: BufferTarget, data: &[u8]) -> Result<GpuHandle, DeviceError>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<GpuHandle>);
    fn delete_buffer(&self, buffer: GpuHandle);

    fn create_vertex_array(&self) -> Result<GpuHandle, DeviceError>;
    fn bind_vertex_array(&self, vertex_array: Option<GpuHandle>);
    fn vertex_attribute(&self, attribute: &VertexAttribute);
    fn delete_vertex_array(&self, vertex_array: GpuHandle);

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<GpuHandle, String>;
    fn delete_shader(&self, shader: GpuHandle);
    fn create_program(&self) -> Result<GpuHandle, DeviceError>;
    /// Links whatever stages compiled. A missing stage still goes through the
    /// link step, which then reports the failure.
    fn link_program(&self, program: GpuHandle, stages: &[Option<GpuHandle>]) -> Result<(), String>;
    fn use_program(&self, program: Option<GpuHandle>);
    fn delete_program(&self, program: GpuHandle);
    fn uniform_location(&self, program: GpuHandle, name: &str) -> Option<UniformLocation>;
    fn set_uniform(&self, location: UniformLocation, value: &UniformValue);

    fn create_color_texture(&self, width: u32, height: u32) -> Result<GpuHandle, DeviceError>;
    fn resize_color_texture(&self, texture: GpuHandle, width: u32, height: u32);
    fn delete_texture(&self, texture: GpuHandle);
    fn create_depth_stencil(&self, width: u32, height: u32) -> Result<GpuHandle, DeviceError>;
    fn resize_depth_stencil(&self, renderbuffer: GpuHandle, width: u32, height: u32);
    fn delete_renderbuffer(&self, renderbuffer: GpuHandle);
    fn create_framebuffer(
        &self,
        color: GpuHandle,
        depth_stencil: GpuHandle,
    ) -> Result<GpuHandle, DeviceError>;
    fn framebuffer_complete(&self, framebuffer: GpuHandle) -> bool;
    fn bind_framebuffer(&self, framebuffer: Option<GpuHandle>);
    fn delete_framebuffer(&self, framebuffer: GpuHandle);

    fn viewport(&self, x: i32, y: i32, width: u32, height: u32);
    /// Depth test with a "less" comparison.
    fn enable_depth_test(&self);
    /// Standard `src_alpha, one_minus_src_alpha` blending.
    fn enable_alpha_blending(&self);
    fn set_clear_color(&self, color: Vec4);
    /// Clears colour and depth of the bound target.
    fn clear(&self);
    /// Draws `count` `u32` indices as triangles from the bound vertex array.
    fn draw_indexed(&self, count: u32);
}

/// Owns the graphics API and every GPU resource created through it.
///
/// Resources are handed out as generational keys; a key that outlived its
/// resource no longer resolves, so nothing in the core can reference a
/// destroyed object.
pub struct Device {
    pub(crate) api: Box<dyn GraphicsApi>,

    pub(crate) vertex_buffers: SlotMap<VertexBufferId, VertexBuffer>,
    pub(crate) index_buffers: SlotMap<IndexBufferId, IndexBuffer>,
    pub(crate) vertex_arrays: SlotMap<VertexArrayId, VertexArray>,
    pub(crate) shaders: SlotMap<ShaderId, Shader>,
    pub(crate) framebuffers: SlotMap<FramebufferId, Framebuffer>,
}

impl Device {
    pub fn new(api: impl GraphicsApi + 'static) -> Self {
        Self {
            api: Box::new(api),
            vertex_buffers: SlotMap::with_key(),
            index_buffers: SlotMap::with_key(),
            vertex_arrays: SlotMap::with_key(),
            shaders: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
        }
    }

    pub fn api(&self) -> &dyn GraphicsApi {
        self.api.as_ref()
    }

    pub fn viewport(&self, width: u32, height: u32) {
        self.api.viewport(0, 0, width, height);
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        let api = self.api.as_ref();

        for (_, vertex_array) in self.vertex_arrays.drain() {
            vertex_array.release(api);
        }

        for (_, buffer) in self.vertex_buffers.drain() {
            buffer.release(api);
        }

        for (_, buffer) in self.index_buffers.drain() {
            buffer.release(api);
        }

        for (_, shader) in self.shaders.drain() {
            shader.release(api);
        }

        for (_, framebuffer) in self.framebuffers.drain() {
            framebuffer.release(api);
        }
    }
}
