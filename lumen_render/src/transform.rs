use glam::{Mat4, Vec3};

/// Position, Euler rotation in degrees, and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Translate, then rotate about X, Y, Z, then scale.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_scale(self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn scale_applies_before_translation() {
        let transform = Transform::from_position(Vec3::new(0.0, -1.0, 0.0))
            .with_scale(Vec3::new(10.0, 0.2, 10.0));

        let corner = transform.matrix().transform_point3(Vec3::new(0.5, 0.5, 0.5));
        assert!(corner.abs_diff_eq(Vec3::new(5.0, -0.9, 5.0), 1e-6));
    }

    #[test]
    fn rotation_is_in_degrees() {
        let transform = Transform::default().with_rotation(Vec3::new(0.0, 0.0, 90.0));
        let x = transform.matrix().transform_vector3(Vec3::X);
        assert!(x.abs_diff_eq(Vec3::Y, 1e-6));
    }
}
