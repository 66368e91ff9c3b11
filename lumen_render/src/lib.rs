pub mod asset;
pub mod buffer;
pub mod camera;
pub mod camera_controller;
pub mod device;
pub mod framebuffer;
pub mod gl;
pub mod headless;
pub mod id;
pub mod light;
pub mod material;
pub mod mesh;
pub mod shader;
pub mod shaders;
pub mod shapes;
pub mod transform;

use camera::Camera;
use glam::{Mat4, Vec3, Vec4};
use id::VertexArrayId;
use light::{Light, LightType, MAX_LIGHTS_PER_KIND};
use material::Material;

pub use device::{Device, DeviceError, GraphicsApi};

/// Per-frame state shared by every draw between `begin_scene` and
/// `end_scene`.
#[derive(Clone, Debug)]
pub struct SceneData {
    pub view_projection: Mat4,
    pub camera_position: Vec3,
    pub lights: Vec<Light>,
}

impl Default for SceneData {
    fn default() -> Self {
        Self {
            view_projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            lights: Vec::new(),
        }
    }
}

/// Counters for the frame started by the last `begin_scene`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RenderStats {
    pub draw_calls: u32,
    pub indices: u64,
    /// Light uploads skipped because their kind was already full.
    pub lights_dropped: u32,
}

pub struct Renderer {
    pub device: Device,
    scene: Option<SceneData>,
    stats: RenderStats,
}

impl Renderer {
    pub fn new(api: impl GraphicsApi + 'static) -> Self {
        Self {
            device: Device::new(api),
            scene: None,
            stats: RenderStats::default(),
        }
    }

    pub fn init(&mut self) {
        if self.scene.is_some() {
            return;
        }
        self.scene = Some(SceneData::default());
        tracing::info!("Renderer initialized");
    }

    pub fn shutdown(&mut self) {
        if self.scene.take().is_some() {
            tracing::info!("Renderer shut down");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.scene.is_some()
    }

    fn scene_mut(&mut self) -> &mut SceneData {
        self.init();
        self.scene.get_or_insert_with(SceneData::default)
    }

    pub fn scene(&self) -> Option<&SceneData> {
        self.scene.as_ref()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Captures the camera and sets depth testing and alpha blending.
    pub fn begin_scene(&mut self, camera: &Camera) {
        let scene = self.scene_mut();
        scene.view_projection = camera.view_projection();
        scene.camera_position = camera.position();
        self.stats = RenderStats::default();

        let api = self.device.api();
        api.enable_depth_test();
        api.enable_alpha_blending();
    }

    /// Draws `vertex_array` immediately with `material`.
    ///
    /// At most [`MAX_LIGHTS_PER_KIND`] lights of each kind are uploaded, the
    /// first ones in scene order; the rest are skipped for this draw.
    pub fn submit(&mut self, vertex_array: VertexArrayId, material: &Material, transform: Mat4) {
        self.init();
        let Some(index_count) = self.device.index_count(vertex_array) else {
            tracing::warn!("skipping draw of a vertex array without an index buffer");
            return;
        };
        let Some(scene) = self.scene.as_ref() else {
            return;
        };

        let device = &self.device;
        let shader = material.shader;
        material.bind(device);
        device.set_mat4(shader, "u_ViewProjection", scene.view_projection);
        device.set_mat4(shader, "u_Transform", transform);
        device.set_float3(shader, "u_CameraPosition", scene.camera_position);

        let mut counts = [0usize; 3];
        let mut dropped = 0;
        for light in &scene.lights {
            let count = &mut counts[light_slot(light.light_type())];
            if *count < MAX_LIGHTS_PER_KIND {
                light.upload(device, shader, *count);
                *count += 1;
            } else {
                dropped += 1;
            }
        }

        for kind in [LightType::Directional, LightType::Point, LightType::Spot] {
            device.set_int(shader, kind.count_uniform(), counts[light_slot(kind)] as i32);
        }

        device.bind_vertex_array(vertex_array);
        device.api().draw_indexed(index_count);

        self.stats.draw_calls += 1;
        self.stats.indices += u64::from(index_count);
        self.stats.lights_dropped += dropped;
    }

    /// Does nothing. Draws are issued by `submit` as they arrive.
    pub fn end_scene(&mut self) {}

    pub fn add_light(&mut self, light: Light) {
        self.scene_mut().lights.push(light);
    }

    pub fn clear_lights(&mut self) {
        self.scene_mut().lights.clear();
    }

    pub fn lights(&self) -> &[Light] {
        self.scene
            .as_ref()
            .map(|scene| scene.lights.as_slice())
            .unwrap_or_default()
    }

    pub fn set_clear_color(&self, color: Vec4) {
        self.device.api().set_clear_color(color);
    }

    pub fn clear(&self) {
        self.device.api().clear();
    }
}

fn light_slot(kind: LightType) -> usize {
    match kind {
        LightType::Directional => 0,
        LightType::Point => 1,
        LightType::Spot => 2,
    }
}
