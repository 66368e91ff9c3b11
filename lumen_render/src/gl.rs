use glam::Vec4;
use glow::HasContext;
use std::sync::Arc;

use crate::{
    device::{
        AttributeKind, BufferTarget, DeviceError, GraphicsApi, ShaderStage, UniformValue,
        VertexAttribute,
    },
    id::{GpuHandle, UniformLocation},
};

/// OpenGL 3.3 core backend over a context made current by the windowing layer.
pub struct GlowApi {
    gl: Arc<glow::Context>,
}

impl GlowApi {
    pub fn new(gl: glow::Context) -> Self {
        Self { gl: Arc::new(gl) }
    }

    /// Shares a context that the UI layer also renders with.
    pub fn from_shared(gl: Arc<glow::Context>) -> Self {
        Self { gl }
    }

    pub fn context(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    fn check_error(&self, what: &str) -> Result<(), DeviceError> {
        let error = unsafe { self.gl.get_error() };
        if error == glow::NO_ERROR {
            Ok(())
        } else {
            Err(format!("{what} failed with GL error {error:#x}").into())
        }
    }
}

/// GL keeps at most one pending flag per error kind; a lost context may
/// report one forever.
const MAX_PENDING_ERRORS: usize = 8;

/// Pops queued error flags until `NO_ERROR`, returning how many were stale.
fn drain_errors(mut next_error: impl FnMut() -> u32) -> usize {
    let mut stale = 0;
    while stale < MAX_PENDING_ERRORS {
        let error = next_error();
        if error == glow::NO_ERROR {
            break;
        }
        tracing::debug!("discarding stale GL error {error:#x}");
        stale += 1;
    }
    stale
}

fn target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Vertex => glow::ARRAY_BUFFER,
        BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn size(value: u32) -> i32 {
    value.min(i32::MAX as u32) as i32
}

impl GraphicsApi for GlowApi {
    fn create_buffer(&self, kind: BufferTarget, data: &[u8]) -> Result<GpuHandle, DeviceError> {
        unsafe {
            drain_errors(|| self.gl.get_error());
            let buffer = self.gl.create_buffer()?;
            self.gl.bind_buffer(target(kind), Some(buffer));
            self.gl
                .buffer_data_u8_slice(target(kind), data, glow::STATIC_DRAW);
            if let Err(err) = self.check_error("buffer upload") {
                self.gl.delete_buffer(buffer);
                return Err(err);
            }
            Ok(GpuHandle(buffer.0))
        }
    }

    fn bind_buffer(&self, kind: BufferTarget, buffer: Option<GpuHandle>) {
        unsafe {
            self.gl
                .bind_buffer(target(kind), buffer.map(|b| glow::NativeBuffer(b.0)))
        };
    }

    fn delete_buffer(&self, buffer: GpuHandle) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) };
    }

    fn create_vertex_array(&self) -> Result<GpuHandle, DeviceError> {
        let vertex_array = unsafe { self.gl.create_vertex_array()? };
        Ok(GpuHandle(vertex_array.0))
    }

    fn bind_vertex_array(&self, vertex_array: Option<GpuHandle>) {
        unsafe {
            self.gl
                .bind_vertex_array(vertex_array.map(|v| glow::NativeVertexArray(v.0)))
        };
    }

    fn vertex_attribute(&self, attribute: &VertexAttribute) {
        let components = size(attribute.components);
        let stride = size(attribute.stride);
        let offset = size(attribute.offset);

        unsafe {
            self.gl.enable_vertex_attrib_array(attribute.index);
            match attribute.kind {
                AttributeKind::Float => self.gl.vertex_attrib_pointer_f32(
                    attribute.index,
                    components,
                    glow::FLOAT,
                    attribute.normalized,
                    stride,
                    offset,
                ),
                AttributeKind::Int => self.gl.vertex_attrib_pointer_i32(
                    attribute.index,
                    components,
                    glow::INT,
                    stride,
                    offset,
                ),
                AttributeKind::Bool => self.gl.vertex_attrib_pointer_i32(
                    attribute.index,
                    components,
                    glow::UNSIGNED_BYTE,
                    stride,
                    offset,
                ),
            }
        }
    }

    fn delete_vertex_array(&self, vertex_array: GpuHandle) {
        unsafe {
            self.gl
                .delete_vertex_array(glow::NativeVertexArray(vertex_array.0))
        };
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<GpuHandle, String> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };

        unsafe {
            let shader = self.gl.create_shader(kind)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(log);
            }
            Ok(GpuHandle(shader.0))
        }
    }

    fn delete_shader(&self, shader: GpuHandle) {
        unsafe { self.gl.delete_shader(glow::NativeShader(shader.0)) };
    }

    fn create_program(&self) -> Result<GpuHandle, DeviceError> {
        let program = unsafe { self.gl.create_program()? };
        Ok(GpuHandle(program.0))
    }

    fn link_program(&self, program: GpuHandle, stages: &[Option<GpuHandle>]) -> Result<(), String> {
        let program = glow::NativeProgram(program.0);
        let stages: Vec<glow::NativeShader> = stages
            .iter()
            .flatten()
            .map(|stage| glow::NativeShader(stage.0))
            .collect();

        unsafe {
            for stage in &stages {
                self.gl.attach_shader(program, *stage);
            }
            self.gl.link_program(program);
            let linked = self.gl.get_program_link_status(program);
            for stage in &stages {
                self.gl.detach_shader(program, *stage);
            }

            if linked {
                Ok(())
            } else {
                Err(self.gl.get_program_info_log(program))
            }
        }
    }

    fn use_program(&self, program: Option<GpuHandle>) {
        unsafe {
            self.gl
                .use_program(program.map(|p| glow::NativeProgram(p.0)))
        };
    }

    fn delete_program(&self, program: GpuHandle) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) };
    }

    fn uniform_location(&self, program: GpuHandle, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
                .map(|location| UniformLocation(location.0))
        }
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let location = glow::NativeUniformLocation(location.0);
        let location = Some(&location);

        unsafe {
            match value {
                UniformValue::Int(value) => self.gl.uniform_1_i32(location, *value),
                UniformValue::Float(value) => self.gl.uniform_1_f32(location, *value),
                UniformValue::Float3(value) => {
                    self.gl.uniform_3_f32(location, value.x, value.y, value.z)
                }
                UniformValue::Float4(value) => {
                    self.gl
                        .uniform_4_f32(location, value.x, value.y, value.z, value.w)
                }
                UniformValue::Mat4(value) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(location, false, &value.to_cols_array())
                }
            }
        }
    }

    fn create_color_texture(&self, width: u32, height: u32) -> Result<GpuHandle, DeviceError> {
        unsafe {
            let texture = self.gl.create_texture()?;
            let handle = GpuHandle(texture.0);
            self.resize_color_texture(handle, width, height);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            Ok(handle)
        }
    }

    fn resize_color_texture(&self, texture: GpuHandle, width: u32, height: u32) {
        unsafe {
            self.gl
                .bind_texture(glow::TEXTURE_2D, Some(glow::NativeTexture(texture.0)));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGB as i32,
                size(width),
                size(height),
                0,
                glow::RGB,
                glow::UNSIGNED_BYTE,
                None,
            );
        }
    }

    fn delete_texture(&self, texture: GpuHandle) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) };
    }

    fn create_depth_stencil(&self, width: u32, height: u32) -> Result<GpuHandle, DeviceError> {
        let renderbuffer = unsafe { self.gl.create_renderbuffer()? };
        let handle = GpuHandle(renderbuffer.0);
        self.resize_depth_stencil(handle, width, height);
        Ok(handle)
    }

    fn resize_depth_stencil(&self, renderbuffer: GpuHandle, width: u32, height: u32) {
        unsafe {
            self.gl.bind_renderbuffer(
                glow::RENDERBUFFER,
                Some(glow::NativeRenderbuffer(renderbuffer.0)),
            );
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH24_STENCIL8,
                size(width),
                size(height),
            );
        }
    }

    fn delete_renderbuffer(&self, renderbuffer: GpuHandle) {
        unsafe {
            self.gl
                .delete_renderbuffer(glow::NativeRenderbuffer(renderbuffer.0))
        };
    }

    fn create_framebuffer(
        &self,
        color: GpuHandle,
        depth_stencil: GpuHandle,
    ) -> Result<GpuHandle, DeviceError> {
        unsafe {
            let framebuffer = self.gl.create_framebuffer()?;
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(glow::NativeTexture(color.0)),
                0,
            );
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_STENCIL_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(glow::NativeRenderbuffer(depth_stencil.0)),
            );
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            Ok(GpuHandle(framebuffer.0))
        }
    }

    fn framebuffer_complete(&self, framebuffer: GpuHandle) -> bool {
        unsafe {
            self.gl.bind_framebuffer(
                glow::FRAMEBUFFER,
                Some(glow::NativeFramebuffer(framebuffer.0)),
            );
            let status = self.gl.check_framebuffer_status(glow::FRAMEBUFFER);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            status == glow::FRAMEBUFFER_COMPLETE
        }
    }

    fn bind_framebuffer(&self, framebuffer: Option<GpuHandle>) {
        unsafe {
            self.gl.bind_framebuffer(
                glow::FRAMEBUFFER,
                framebuffer.map(|f| glow::NativeFramebuffer(f.0)),
            )
        };
    }

    fn delete_framebuffer(&self, framebuffer: GpuHandle) {
        unsafe {
            self.gl
                .delete_framebuffer(glow::NativeFramebuffer(framebuffer.0))
        };
    }

    fn viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        unsafe { self.gl.viewport(x, y, size(width), size(height)) };
    }

    fn enable_depth_test(&self) {
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            self.gl.depth_func(glow::LESS);
        }
    }

    fn enable_alpha_blending(&self) {
        unsafe {
            self.gl.enable(glow::BLEND);
            self.gl
                .blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        }
    }

    fn set_clear_color(&self, color: Vec4) {
        unsafe { self.gl.clear_color(color.x, color.y, color.z, color.w) };
    }

    fn clear(&self) {
        unsafe {
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT)
        };
    }

    fn draw_indexed(&self, count: u32) {
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, size(count), glow::UNSIGNED_INT, 0)
        };
    }
}
