use glam::{Vec2, Vec3, Vec4};
use lumen_ecs::{Entity, World};
use lumen_render::{
    asset::{Assets, Handle},
    camera_controller::{CameraController, MovementIntent},
    framebuffer::MAX_FRAMEBUFFER_SIZE,
    id::{FramebufferId, GpuHandle, ShaderId},
    light::Light,
    material::Material,
    shaders,
    transform::Transform,
    DeviceError, Renderer,
};

use crate::{
    config::EditorConfig,
    input::ViewportInput,
    mesh_library::{MeshKind, MeshLibrary},
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityName(pub String);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct EntityId(pub u32);

const FIRST_USER_ENTITY_ID: u32 = 100;

/// Scene view of the editor: owns the entities, their materials and the
/// offscreen target the scene is drawn into.
pub struct EditorLayer {
    config: EditorConfig,
    world: World,
    materials: Assets<Material>,
    default_material: Handle<Material>,
    meshes: MeshLibrary,
    shader: ShaderId,
    framebuffer: FramebufferId,
    camera: CameraController,
    viewport_size: (u32, u32),
    selected: Option<Entity>,
    next_entity_id: u32,
    camera_rotating: bool,
    last_mouse_position: Vec2,
}

impl EditorLayer {
    pub fn on_attach(renderer: &mut Renderer, config: EditorConfig) -> Result<Self, DeviceError> {
        let device = &mut renderer.device;
        let meshes = MeshLibrary::upload(device, config.mesh_segments)?;
        let shader = device.create_shader(
            &shaders::standard_vertex_source(),
            &shaders::standard_fragment_source(),
        )?;
        let framebuffer = device.create_framebuffer(config.viewport_width, config.viewport_height)?;

        let mut materials = Assets::new();
        let default_material = materials.push(Material::new(shader));
        let scene_light = Light::directional(config.light_direction)
            .with_color(config.light_color)
            .with_intensity(config.light_intensity);

        let mut camera = CameraController::new(config.camera);
        camera.set_viewport_size(config.viewport_width as f32, config.viewport_height as f32);

        let mut layer = Self {
            viewport_size: (config.viewport_width, config.viewport_height),
            config,
            world: World::new(),
            materials,
            default_material,
            meshes,
            shader,
            framebuffer,
            camera,
            selected: None,
            next_entity_id: FIRST_USER_ENTITY_ID,
            camera_rotating: false,
            last_mouse_position: Vec2::ZERO,
        };
        layer.world.set_singleton(scene_light);
        layer.spawn_sample_scene();

        tracing::info!("EditorLayer attached");
        Ok(layer)
    }

    fn spawn_sample_scene(&mut self) {
        let camera_position = self.camera.position();
        self.spawn(
            "Camera",
            EntityId(1),
            MeshKind::None,
            Transform::from_position(camera_position),
        );
        self.spawn(
            "Directional Light",
            EntityId(2),
            MeshKind::None,
            Transform::from_position(Vec3::new(0.0, 10.0, 0.0)),
        );
        let player = self.spawn(
            "Player",
            EntityId(3),
            MeshKind::Capsule,
            Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
        );
        let ground = self.spawn(
            "Ground",
            EntityId(4),
            MeshKind::Cube,
            Transform::from_position(Vec3::new(0.0, -0.1, 0.0)).with_scale(Vec3::new(
                10.0, 0.2, 10.0,
            )),
        );
        let environment = self.spawn(
            "Environment",
            EntityId(5),
            MeshKind::None,
            Transform::default(),
        );
        if let Err(err) = self.world.set_parent(player, environment) {
            tracing::warn!("failed to parent Player: {err}");
        }

        self.set_color(player, Vec4::new(0.2, 0.4, 0.9, 1.0));
        self.set_color(ground, Vec4::new(0.5, 0.5, 0.5, 1.0));

        let sphere = self.create_entity("Sphere", MeshKind::Sphere);
        if let Ok(mut transform) = self.world.component_mut::<Transform>(sphere) {
            transform.position = Vec3::new(2.0, 0.5, 0.0);
        }
    }

    fn spawn(&mut self, name: &str, id: EntityId, mesh: MeshKind, transform: Transform) -> Entity {
        let material = self
            .materials
            .duplicate(self.default_material)
            .unwrap_or(self.default_material);
        self.world
            .spawn((EntityName(name.to_string()), id, transform, mesh, material))
    }

    /// Spawns an entity with its own copy of the default material.
    pub fn create_entity(&mut self, name: &str, mesh: MeshKind) -> Entity {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        let entity = self.spawn(name, id, mesh, Transform::default());
        tracing::info!("Created entity {name} ({})", id.0);
        entity
    }

    /// Despawns `entity`; its children are promoted to roots.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if self.world.despawn(entity).is_err() {
            return false;
        }
        if self.selected == Some(entity) {
            self.selected = None;
        }
        true
    }

    /// The directional light every frame is lit by.
    pub fn scene_light_mut(&mut self) -> Option<&mut Light> {
        self.world.singleton_mut::<Light>()
    }

    pub fn set_color(&mut self, entity: Entity, color: Vec4) {
        let Ok(handle) = self.world.component::<Handle<Material>>(entity).map(|h| *h) else {
            return;
        };
        if let Some(material) = self.materials.get_mut(handle) {
            material.color = color;
        }
    }

    pub fn select(&mut self, entity: Entity) -> bool {
        let Ok(name) = self.world.component::<EntityName>(entity) else {
            return false;
        };
        tracing::info!("Selected: {}", name.0);
        drop(name);
        self.selected = Some(entity);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<Entity> {
        self.selected
    }

    pub fn find_entity(&self, name: &str) -> Option<Entity> {
        self.world
            .query::<&EntityName>()
            .iter()
            .find(|(_, entity_name)| entity_name.0 == name)
            .map(|(entity, _)| entity)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    pub fn material(&self, entity: Entity) -> Option<&Material> {
        let handle = *self.world.component::<Handle<Material>>(entity).ok()?;
        self.materials.get(handle)
    }

    /// Camera controls only react while the viewport has focus or the mouse.
    pub fn on_update(&mut self, delta_time: f32, input: &ViewportInput) {
        self.viewport_size = (input.size.x.max(0.0) as u32, input.size.y.max(0.0) as u32);

        if !input.is_active() {
            self.camera.set_movement(MovementIntent::default());
            self.camera_rotating = false;
            self.camera.on_update(delta_time);
            return;
        }

        self.camera.set_movement(input.movement());

        if input.right_mouse_down {
            if self.camera_rotating {
                let delta = input.mouse_position - self.last_mouse_position;
                // Screen y grows downwards; dragging up looks up.
                self.camera.process_mouse_movement(delta.x, -delta.y, true);
            }
            self.camera_rotating = true;
            self.last_mouse_position = input.mouse_position;
        } else {
            self.camera_rotating = false;
        }

        if input.hovered && input.scroll != 0.0 {
            self.camera.process_mouse_scroll(input.scroll);
        }

        self.camera.on_update(delta_time);
    }

    /// Draws every entity that has a mesh into the scene framebuffer and
    /// returns the colour attachment for the UI to display.
    pub fn render_scene(&mut self, renderer: &mut Renderer) -> Option<GpuHandle> {
        let (width, height) = self.viewport_size;
        let current = renderer
            .device
            .framebuffer(self.framebuffer)
            .map(|framebuffer| (framebuffer.width(), framebuffer.height()))?;
        let in_range = |size: u32| (1..=MAX_FRAMEBUFFER_SIZE).contains(&size);
        if current != (width, height) && in_range(width) && in_range(height) {
            renderer.device.resize_framebuffer(self.framebuffer, width, height);
            if let Some(framebuffer) = renderer.device.framebuffer(self.framebuffer) {
                self.camera
                    .set_viewport_size(framebuffer.width() as f32, framebuffer.height() as f32);
            }
        }

        renderer.device.bind_framebuffer(self.framebuffer);
        renderer.set_clear_color(self.config.clear_color);
        renderer.clear();

        renderer.clear_lights();
        if let Some(light) = self.world.singleton::<Light>().map(|light| *light) {
            renderer.add_light(light);
        }

        renderer.begin_scene(self.camera.camera());

        let mut draws = Vec::new();
        for (_, (id, transform, mesh, material)) in self
            .world
            .query::<(&EntityId, &Transform, &MeshKind, &Handle<Material>)>()
            .iter()
        {
            if let Some(mesh) = self.meshes.get(*mesh) {
                draws.push((*id, mesh.vertex_array, transform.matrix(), *material));
            }
        }
        draws.sort_by_key(|(id, ..)| *id);

        for (_, vertex_array, transform, material) in draws {
            if let Some(material) = self.materials.get(material) {
                renderer.submit(vertex_array, material, transform);
            }
        }

        renderer.end_scene();
        renderer.device.unbind_framebuffer();

        renderer
            .device
            .framebuffer(self.framebuffer)
            .map(|framebuffer| framebuffer.color_attachment())
    }

    /// Logs the entity tree, children indented under their parent.
    pub fn log_hierarchy(&self) {
        for root in self.world.roots() {
            self.log_node(root, 0);
        }
    }

    fn log_node(&self, entity: Entity, depth: usize) {
        if let Ok(name) = self.world.component::<EntityName>(entity) {
            let marker = if self.selected == Some(entity) { "*" } else { "" };
            tracing::info!("{:indent$}{}{}", "", name.0, marker, indent = depth * 2);
        }
        for child in self.world.children(entity) {
            self.log_node(child, depth + 1);
        }
    }

    pub fn on_detach(self, renderer: &mut Renderer) {
        let device = &mut renderer.device;
        self.meshes.destroy(device);
        device.destroy_shader(self.shader);
        device.destroy_framebuffer(self.framebuffer);
        tracing::info!("EditorLayer detached");
    }
}
