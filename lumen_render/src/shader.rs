use glam::{Mat4, Vec3, Vec4};

use crate::{
    device::{Device, DeviceError, GraphicsApi, ShaderStage, UniformValue},
    id::{GpuHandle, ShaderId},
};

/// A linked vertex + fragment program.
///
/// A program that failed to compile or link is still kept: it binds and
/// accepts uniform uploads, but draws with it produce nothing.
#[derive(Debug)]
pub struct Shader {
    program: GpuHandle,
    linked: bool,
}

impl Shader {
    pub fn program(&self) -> GpuHandle {
        self.program
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub(crate) fn release(self, api: &dyn GraphicsApi) {
        api.delete_program(self.program);
    }
}

fn compile_stage(api: &dyn GraphicsApi, stage: ShaderStage, source: &str) -> Option<GpuHandle> {
    match api.compile_shader(stage, source) {
        Ok(handle) => Some(handle),
        Err(log) => {
            tracing::error!(?stage, "shader compilation failed: {log}");
            None
        }
    }
}

impl Device {
    pub fn create_shader(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderId, DeviceError> {
        let api = self.api();
        let vertex = compile_stage(api, ShaderStage::Vertex, vertex_source);
        let fragment = compile_stage(api, ShaderStage::Fragment, fragment_source);

        let delete_stages = || {
            for stage in [vertex, fragment].into_iter().flatten() {
                api.delete_shader(stage);
            }
        };

        let program = match api.create_program() {
            Ok(program) => program,
            Err(err) => {
                delete_stages();
                return Err(err);
            }
        };
        let linked = match api.link_program(program, &[vertex, fragment]) {
            Ok(()) => true,
            Err(log) => {
                tracing::error!("shader linking failed: {log}");
                false
            }
        };
        delete_stages();

        if linked {
            tracing::info!("shader created");
        }

        Ok(self.shaders.insert(Shader { program, linked }))
    }

    pub fn shader(&self, id: ShaderId) -> Option<&Shader> {
        self.shaders.get(id)
    }

    pub fn bind_shader(&self, id: ShaderId) {
        match self.shaders.get(id) {
            Some(shader) => self.api().use_program(Some(shader.program)),
            None => tracing::warn!("bind of a destroyed shader"),
        }
    }

    pub fn unbind_shader(&self) {
        self.api().use_program(None);
    }

    /// Uploads `value` under `name`. The location is looked up on every call;
    /// names the program does not expose are ignored.
    pub fn set_uniform(&self, id: ShaderId, name: &str, value: UniformValue) {
        let Some(shader) = self.shaders.get(id) else {
            return;
        };
        if let Some(location) = self.api().uniform_location(shader.program, name) {
            self.api().set_uniform(location, &value);
        }
    }

    pub fn set_int(&self, id: ShaderId, name: &str, value: i32) {
        self.set_uniform(id, name, UniformValue::Int(value));
    }

    pub fn set_float(&self, id: ShaderId, name: &str, value: f32) {
        self.set_uniform(id, name, UniformValue::Float(value));
    }

    pub fn set_float3(&self, id: ShaderId, name: &str, value: Vec3) {
        self.set_uniform(id, name, UniformValue::Float3(value));
    }

    pub fn set_float4(&self, id: ShaderId, name: &str, value: Vec4) {
        self.set_uniform(id, name, UniformValue::Float4(value));
    }

    pub fn set_mat4(&self, id: ShaderId, name: &str, value: Mat4) {
        self.set_uniform(id, name, UniformValue::Mat4(value));
    }

    pub fn destroy_shader(&mut self, id: ShaderId) {
        if let Some(shader) = self.shaders.remove(id) {
            shader.release(self.api());
        }
    }
}
