use glam::Vec3;

use crate::camera::Camera;

const PITCH_LIMIT: f32 = 89.0;
const MIN_ZOOM: f32 = 1.0;
const MAX_ZOOM: f32 = 90.0;

/// Starting state and tuning of a [`CameraController`]. Angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSettings {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    /// Initial vertical field of view.
    pub zoom: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 10.0),
            yaw: -90.0,
            pitch: 0.0,
            movement_speed: 5.0,
            mouse_sensitivity: 0.1,
            zoom: 45.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Held movement keys.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MovementIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Fly-camera state driving a [`Camera`].
///
/// Orientation vectors are re-derived from yaw/pitch before the view is
/// rebuilt, and the view always comes from a look-at along `front`.
#[derive(Clone, Debug)]
pub struct CameraController {
    settings: CameraSettings,
    position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    zoom: f32,
    aspect: f32,
    intent: MovementIntent,
    camera: Camera,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraSettings::default())
    }
}

impl CameraController {
    pub fn new(settings: CameraSettings) -> Self {
        let mut controller = Self {
            settings,
            position: settings.position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw: settings.yaw,
            pitch: settings.pitch,
            zoom: settings.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            aspect: settings.aspect,
            intent: MovementIntent::default(),
            camera: Camera::default(),
        };
        controller.update_projection();
        controller.update_vectors();
        controller
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Moves along front/right/world-up for every held direction.
    pub fn on_update(&mut self, delta_time: f32) {
        let velocity = self.settings.movement_speed * delta_time;
        let intent = self.intent;
        let mut position = self.position;

        if intent.forward {
            position += self.front * velocity;
        }
        if intent.backward {
            position -= self.front * velocity;
        }
        if intent.left {
            position -= self.right * velocity;
        }
        if intent.right {
            position += self.right * velocity;
        }
        if intent.up {
            position += self.world_up * velocity;
        }
        if intent.down {
            position -= self.world_up * velocity;
        }

        if position != self.position {
            self.position = position;
            self.update_view();
        }
    }

    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, constrain_pitch: bool) {
        self.yaw += x_offset * self.settings.mouse_sensitivity;
        self.pitch += y_offset * self.settings.mouse_sensitivity;

        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }

        self.update_vectors();
    }

    /// Narrows or widens the field of view, keeping the current aspect.
    pub fn process_mouse_scroll(&mut self, y_offset: f32) {
        self.zoom = (self.zoom - y_offset).clamp(MIN_ZOOM, MAX_ZOOM);
        self.update_projection();
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            tracing::warn!(width, height, "ignoring degenerate viewport size");
            return;
        }
        self.aspect = width / height;
        self.update_projection();
    }

    pub fn set_movement(&mut self, intent: MovementIntent) {
        self.intent = intent;
    }

    pub fn movement(&self) -> MovementIntent {
        self.intent
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_view();
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw;
        self.update_vectors();
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
        self.update_vectors();
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    fn update_projection(&mut self) {
        self.camera.set_perspective(
            self.zoom,
            self.aspect,
            self.settings.near,
            self.settings.far,
        );
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());

        self.front = front.normalize();
        // Undefined straight up or down; keep the previous basis there.
        if let Some(right) = self.front.cross(self.world_up).try_normalize() {
            self.right = right;
        }
        self.up = self.right.cross(self.front).normalize();

        self.update_view();
    }

    fn update_view(&mut self) {
        self.camera
            .look_at(self.position, self.position + self.front, self.up);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn defaults_look_down_negative_z() {
        let controller = CameraController::default();

        assert_eq!(controller.position(), Vec3::new(0.0, 5.0, 10.0));
        assert!(controller.front().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(controller.right().abs_diff_eq(Vec3::X, 1e-6));
        assert!(controller.up().abs_diff_eq(Vec3::Y, 1e-6));

        let expected = Mat4::look_at_rh(
            Vec3::new(0.0, 5.0, 10.0),
            Vec3::new(0.0, 5.0, 9.0),
            Vec3::Y,
        );
        assert!(controller.camera().view().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn constrained_pitch_stops_at_limit() {
        let mut controller = CameraController::default();
        for _ in 0..100 {
            controller.process_mouse_movement(0.0, 50.0, true);
        }
        assert!(controller.pitch() <= 89.0);
        assert_eq!(controller.pitch(), 89.0);

        for _ in 0..100 {
            controller.process_mouse_movement(0.0, -50.0, true);
        }
        assert_eq!(controller.pitch(), -89.0);
    }

    #[test]
    fn unconstrained_pitch_is_unbounded() {
        let mut controller = CameraController::default();
        for _ in 0..100 {
            controller.process_mouse_movement(0.0, 50.0, false);
        }
        assert!(controller.pitch() > 89.0);
        assert!(controller.front().is_finite());
    }

    #[test]
    fn mouse_offsets_scale_by_sensitivity() {
        let mut controller = CameraController::default();
        controller.process_mouse_movement(100.0, 20.0, true);

        assert!((controller.yaw() - -80.0).abs() < 1e-4);
        assert!((controller.pitch() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn scroll_clamps_zoom() {
        let mut controller = CameraController::default();
        controller.process_mouse_scroll(100.0);
        assert_eq!(controller.zoom(), 1.0);

        controller.process_mouse_scroll(-500.0);
        assert_eq!(controller.zoom(), 90.0);
    }

    #[test]
    fn scroll_keeps_current_aspect() {
        let mut controller = CameraController::default();
        controller.set_viewport_size(800.0, 800.0);
        controller.process_mouse_scroll(5.0);

        let expected = Mat4::perspective_rh_gl(40.0f32.to_radians(), 1.0, 0.1, 1000.0);
        assert!(controller.camera().projection().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn degenerate_viewport_is_ignored() {
        let mut controller = CameraController::default();
        controller.set_viewport_size(800.0, 0.0);
        assert_eq!(controller.aspect(), 16.0 / 9.0);
    }

    #[test]
    fn update_integrates_held_directions() {
        let mut controller = CameraController::default();
        controller.set_movement(MovementIntent {
            forward: true,
            up: true,
            ..Default::default()
        });
        controller.on_update(0.5);

        let expected = Vec3::new(0.0, 7.5, 7.5);
        assert!(controller.position().abs_diff_eq(expected, 1e-5));
        assert!(controller
            .camera()
            .view()
            .transform_point3(expected)
            .abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut controller = CameraController::default();
        controller.set_movement(MovementIntent {
            left: true,
            right: true,
            ..Default::default()
        });
        controller.on_update(1.0);
        assert!(controller
            .position()
            .abs_diff_eq(Vec3::new(0.0, 5.0, 10.0), 1e-6));
    }
}
