use glam::{Vec3, Vec4};
use lumen_render::camera_controller::CameraSettings;

#[derive(Clone, Debug)]
pub struct EditorConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub clear_color: Vec4,
    pub light_direction: Vec3,
    pub light_color: Vec3,
    pub light_intensity: f32,
    pub mesh_segments: u32,
    pub camera: CameraSettings,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            clear_color: Vec4::new(0.1, 0.1, 0.12, 1.0),
            light_direction: Vec3::new(-0.2, -1.0, -0.3),
            light_color: Vec3::ONE,
            light_intensity: 1.0,
            mesh_segments: 32,
            camera: CameraSettings::default(),
        }
    }
}
