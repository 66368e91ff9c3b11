use glam::Vec3;

use crate::{device::Device, id::ShaderId};

/// Lights of one kind beyond this many are not uploaded for a draw. The
/// built-in shader sizes its light arrays from the same constant.
pub const MAX_LIGHTS_PER_KIND: usize = 4;

const DEFAULT_DIRECTION: Vec3 = Vec3::NEG_Y;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Directional {
        direction: Vec3,
    },
    Point {
        position: Vec3,
        attenuation: Attenuation,
    },
    /// Cutoff angles are in degrees.
    Spot {
        position: Vec3,
        direction: Vec3,
        inner_cutoff: f32,
        outer_cutoff: f32,
    },
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LightType {
    Directional,
    Point,
    Spot,
}

impl LightType {
    /// Name of the shader-side array holding lights of this type.
    pub fn uniform_array(self) -> &'static str {
        match self {
            LightType::Directional => "u_DirectionalLights",
            LightType::Point => "u_PointLights",
            LightType::Spot => "u_SpotLights",
        }
    }

    pub fn count_uniform(self) -> &'static str {
        match self {
            LightType::Directional => "u_DirectionalLightCount",
            LightType::Point => "u_PointLightCount",
            LightType::Spot => "u_SpotLightCount",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
}

fn normalized(direction: Vec3) -> Vec3 {
    direction.try_normalize().unwrap_or(DEFAULT_DIRECTION)
}

impl Light {
    pub fn directional(direction: Vec3) -> Self {
        Self::new(LightKind::Directional {
            direction: normalized(direction),
        })
    }

    pub fn point(position: Vec3) -> Self {
        Self::new(LightKind::Point {
            position,
            attenuation: Attenuation::default(),
        })
    }

    pub fn spot(position: Vec3, direction: Vec3) -> Self {
        Self::new(LightKind::Spot {
            position,
            direction: normalized(direction),
            inner_cutoff: 12.5,
            outer_cutoff: 17.5,
        })
    }

    fn new(kind: LightKind) -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            kind,
        }
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn light_type(&self) -> LightType {
        match self.kind {
            LightKind::Directional { .. } => LightType::Directional,
            LightKind::Point { .. } => LightType::Point,
            LightKind::Spot { .. } => LightType::Spot,
        }
    }

    /// Normalizes `value`. Point lights have no direction and ignore it, as
    /// does a zero vector.
    pub fn set_direction(&mut self, value: Vec3) {
        let Some(value) = value.try_normalize() else {
            tracing::warn!("ignoring zero-length light direction");
            return;
        };
        match &mut self.kind {
            LightKind::Directional { direction } | LightKind::Spot { direction, .. } => {
                *direction = value
            }
            LightKind::Point { .. } => {}
        }
    }

    pub fn set_position(&mut self, value: Vec3) {
        match &mut self.kind {
            LightKind::Point { position, .. } | LightKind::Spot { position, .. } => {
                *position = value
            }
            LightKind::Directional { .. } => {}
        }
    }

    pub fn set_attenuation(&mut self, value: Attenuation) {
        if let LightKind::Point { attenuation, .. } = &mut self.kind {
            *attenuation = value;
        }
    }

    pub fn set_cutoff(&mut self, inner: f32, outer: f32) {
        if let LightKind::Spot {
            inner_cutoff,
            outer_cutoff,
            ..
        } = &mut self.kind
        {
            *inner_cutoff = inner;
            *outer_cutoff = outer;
        }
    }

    /// Writes this light into slot `index` of its type's uniform array.
    /// Spot cutoffs go up as cosines.
    pub fn upload(&self, device: &Device, shader: ShaderId, index: usize) {
        let prefix = format!("{}[{index}]", self.light_type().uniform_array());
        let name = |member: &str| format!("{prefix}.{member}");

        match self.kind {
            LightKind::Directional { direction } => {
                device.set_float3(shader, &name("direction"), direction);
                device.set_float3(shader, &name("color"), self.color);
                device.set_float(shader, &name("intensity"), self.intensity);
            }
            LightKind::Point {
                position,
                attenuation,
            } => {
                device.set_float3(shader, &name("position"), position);
                device.set_float3(shader, &name("color"), self.color);
                device.set_float(shader, &name("intensity"), self.intensity);
                device.set_float(shader, &name("constant"), attenuation.constant);
                device.set_float(shader, &name("linear"), attenuation.linear);
                device.set_float(shader, &name("quadratic"), attenuation.quadratic);
            }
            LightKind::Spot {
                position,
                direction,
                inner_cutoff,
                outer_cutoff,
            } => {
                device.set_float3(shader, &name("position"), position);
                device.set_float3(shader, &name("direction"), direction);
                device.set_float3(shader, &name("color"), self.color);
                device.set_float(shader, &name("intensity"), self.intensity);
                device.set_float(shader, &name("innerCutOff"), inner_cutoff.to_radians().cos());
                device.set_float(shader, &name("outerCutOff"), outer_cutoff.to_radians().cos());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{device::UniformValue, headless::HeadlessApi};

    fn device_with_shader() -> (Device, ShaderId, crate::headless::CommandLog) {
        let api = HeadlessApi::new();
        let log = api.log();
        let mut device = Device::new(api);
        let shader = device
            .create_shader("void main() {}", "void main() {}")
            .unwrap();
        (device, shader, log)
    }

    #[test]
    fn defaults() {
        let light = Light::point(Vec3::ZERO);
        assert_eq!(light.color, Vec3::ONE);
        assert_eq!(light.intensity, 1.0);
        assert_eq!(
            light.kind,
            LightKind::Point {
                position: Vec3::ZERO,
                attenuation: Attenuation {
                    constant: 1.0,
                    linear: 0.09,
                    quadratic: 0.032,
                },
            }
        );
    }

    #[test]
    fn directions_are_normalized() {
        let mut light = Light::directional(Vec3::new(0.0, -4.0, 0.0));
        assert_eq!(light.kind, LightKind::Directional { direction: Vec3::NEG_Y });

        light.set_direction(Vec3::new(3.0, 0.0, 4.0));
        let LightKind::Directional { direction } = light.kind else {
            panic!("kind changed");
        };
        assert!(direction.abs_diff_eq(Vec3::new(0.6, 0.0, 0.8), 1e-6));

        light.set_direction(Vec3::ZERO);
        assert_eq!(light.kind, LightKind::Directional { direction });
    }

    #[test]
    fn directional_upload_uses_indexed_slot() {
        let (device, shader, log) = device_with_shader();
        let light = Light::directional(Vec3::NEG_Y).with_intensity(0.5);

        light.upload(&device, shader, 2);

        let uploads = log.uniforms_with_prefix("u_DirectionalLights[2]");
        let names: Vec<&str> = uploads.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "u_DirectionalLights[2].direction",
                "u_DirectionalLights[2].color",
                "u_DirectionalLights[2].intensity",
            ]
        );
        assert_eq!(uploads[2].1, UniformValue::Float(0.5));
    }

    #[test]
    fn spot_cutoffs_upload_as_cosines() {
        let (device, shader, log) = device_with_shader();
        let mut light = Light::spot(Vec3::Y, Vec3::NEG_Y);
        light.set_cutoff(0.0, 60.0);

        light.upload(&device, shader, 0);

        let Some(UniformValue::Float(inner)) = log.last_uniform("u_SpotLights[0].innerCutOff")
        else {
            panic!("inner cutoff missing");
        };
        let Some(UniformValue::Float(outer)) = log.last_uniform("u_SpotLights[0].outerCutOff")
        else {
            panic!("outer cutoff missing");
        };
        assert!((inner - 1.0).abs() < 1e-6);
        assert!((outer - 0.5).abs() < 1e-6);
    }

    #[test]
    fn point_upload_carries_attenuation() {
        let (device, shader, log) = device_with_shader();
        Light::point(Vec3::new(1.0, 2.0, 3.0)).upload(&device, shader, 1);

        assert_eq!(log.uniforms_with_prefix("u_PointLights[1]").len(), 6);
        assert_eq!(
            log.last_uniform("u_PointLights[1].quadratic"),
            Some(UniformValue::Float(0.032))
        );
    }
}
