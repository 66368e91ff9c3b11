use glam::Vec4;

use crate::{device::Device, id::ShaderId};

/// Surface parameters drawn with a shared shader.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub shader: ShaderId,
    pub color: Vec4,
    pub shininess: f32,
    pub metallic: f32,
    pub roughness: f32,
}

impl Material {
    pub fn new(shader: ShaderId) -> Self {
        Self {
            shader,
            color: Vec4::ONE,
            shininess: 32.0,
            metallic: 0.0,
            roughness: 0.5,
        }
    }

    /// Binds the shader and uploads the `u_Material.*` block.
    pub fn bind(&self, device: &Device) {
        device.bind_shader(self.shader);
        device.set_float4(self.shader, "u_Material.color", self.color);
        device.set_float(self.shader, "u_Material.shininess", self.shininess);
        device.set_float(self.shader, "u_Material.metallic", self.metallic);
        device.set_float(self.shader, "u_Material.roughness", self.roughness);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        device::UniformValue,
        headless::{GpuCommand, HeadlessApi},
    };

    #[test]
    fn bind_selects_program_then_uploads_properties() {
        let api = HeadlessApi::new();
        let log = api.log();
        let mut device = Device::new(api);
        let shader = device.create_shader("v", "f").unwrap();
        let program = device.shader(shader).unwrap().program();

        let mut material = Material::new(shader);
        material.color = Vec4::new(0.8, 0.2, 0.2, 1.0);
        let start = log.len();
        material.bind(&device);

        let commands = log.since(start);
        assert_eq!(commands[0], GpuCommand::UseProgram(Some(program)));
        assert_eq!(
            log.uniforms_with_prefix("u_Material.")
                .into_iter()
                .map(|(name, _)| name)
                .collect::<Vec<_>>(),
            vec![
                "u_Material.color",
                "u_Material.shininess",
                "u_Material.metallic",
                "u_Material.roughness",
            ]
        );
        assert_eq!(
            log.last_uniform("u_Material.roughness"),
            Some(UniformValue::Float(0.5))
        );
    }
}
