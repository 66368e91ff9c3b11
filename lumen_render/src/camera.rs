use glam::{Mat4, Vec3};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ProjectionKind {
    #[default]
    Perspective,
    Orthographic,
}

/// Projection plus a view derived from position and Euler rotation.
///
/// Angles are in degrees. The projection only changes through
/// [`Camera::set_perspective`] and [`Camera::set_orthographic`]; the view is
/// rebuilt whenever position or rotation change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    kind: ProjectionKind,
    projection: Mat4,
    position: Vec3,
    rotation: Vec3,
    view: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(ProjectionKind::Perspective)
    }
}

impl Camera {
    pub fn new(kind: ProjectionKind) -> Self {
        Self {
            kind,
            projection: Mat4::IDENTITY,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            view: Mat4::IDENTITY,
        }
    }

    pub fn set_perspective(&mut self, fov: f32, aspect: f32, near: f32, far: f32) {
        self.kind = ProjectionKind::Perspective;
        self.projection = Mat4::perspective_rh_gl(fov.to_radians(), aspect, near, far);
    }

    /// `size` is the half-height of the view volume.
    pub fn set_orthographic(&mut self, size: f32, aspect: f32, near: f32, far: f32) {
        self.kind = ProjectionKind::Orthographic;
        self.projection = Mat4::orthographic_rh_gl(
            -size * aspect,
            size * aspect,
            -size,
            size,
            near,
            far,
        );
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recalculate_view();
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.recalculate_view();
    }

    /// Replaces the view with a look-at from `eye` towards `target`. The
    /// stored position follows `eye`; the stored rotation is left as is.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.position = eye;
        self.view = Mat4::look_at_rh(eye, target, up);
    }

    fn recalculate_view(&mut self) {
        let transform = Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_z(self.rotation.z.to_radians());
        self.view = transform.inverse();
    }

    pub fn projection_kind(&self) -> ProjectionKind {
        self.kind
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn perspective_matches_closed_form() {
        let mut camera = Camera::default();
        camera.set_perspective(45.0, 16.0 / 9.0, 0.1, 1000.0);

        let (fov, aspect, near, far) = (45.0f32.to_radians(), 16.0f32 / 9.0, 0.1f32, 1000.0f32);
        let f = 1.0 / (fov / 2.0).tan();
        let expected = Mat4::from_cols(
            Vec4::new(f / aspect, 0.0, 0.0, 0.0),
            Vec4::new(0.0, f, 0.0, 0.0),
            Vec4::new(0.0, 0.0, (far + near) / (near - far), -1.0),
            Vec4::new(0.0, 0.0, 2.0 * far * near / (near - far), 0.0),
        );

        assert_eq!(camera.projection_kind(), ProjectionKind::Perspective);
        assert!(camera.projection().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn orthographic_switches_kind() {
        let mut camera = Camera::default();
        camera.set_orthographic(2.0, 2.0, -1.0, 1.0);

        assert_eq!(camera.projection_kind(), ProjectionKind::Orthographic);
        let corner = camera.projection().project_point3(Vec3::new(4.0, 2.0, 0.0));
        assert!(corner.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn view_inverts_position() {
        let mut camera = Camera::default();
        camera.set_position(Vec3::new(0.0, 0.0, 5.0));

        let origin = camera.view().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-6));
    }

    #[test]
    fn view_inverts_rotation_about_y() {
        let mut camera = Camera::default();
        camera.set_rotation(Vec3::new(0.0, 90.0, 0.0));

        // Camera turned to face -X sees a point on -X straight ahead.
        let ahead = camera.view().transform_point3(Vec3::new(-1.0, 0.0, 0.0));
        assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
    }

    #[test]
    fn view_projection_is_projection_times_view() {
        let mut camera = Camera::default();
        camera.set_perspective(60.0, 1.5, 0.1, 100.0);
        camera.set_position(Vec3::new(1.0, 2.0, 3.0));
        camera.set_rotation(Vec3::new(10.0, 20.0, 30.0));

        let expected = camera.projection() * camera.view();
        assert!(camera.view_projection().abs_diff_eq(expected, 1e-6));
    }
}
