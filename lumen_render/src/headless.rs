use glam::Vec4;
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    num::NonZeroU32,
    rc::Rc,
};

use crate::{
    device::{
        BufferTarget, DeviceError, GraphicsApi, ShaderStage, UniformValue, VertexAttribute,
    },
    framebuffer::MAX_FRAMEBUFFER_SIZE,
    id::{GpuHandle, UniformLocation},
};

/// One call received by [`HeadlessApi`].
#[derive(Clone, Debug, PartialEq)]
pub enum GpuCommand {
    CreateBuffer {
        target: BufferTarget,
        handle: GpuHandle,
        size: usize,
    },
    BindBuffer {
        target: BufferTarget,
        buffer: Option<GpuHandle>,
    },
    DeleteBuffer(GpuHandle),
    CreateVertexArray(GpuHandle),
    BindVertexArray(Option<GpuHandle>),
    VertexAttribute(VertexAttribute),
    DeleteVertexArray(GpuHandle),
    CompileShader {
        stage: ShaderStage,
        handle: Option<GpuHandle>,
    },
    DeleteShader(GpuHandle),
    CreateProgram(GpuHandle),
    LinkProgram {
        program: GpuHandle,
        linked: bool,
    },
    UseProgram(Option<GpuHandle>),
    DeleteProgram(GpuHandle),
    SetUniform {
        program: GpuHandle,
        name: String,
        value: UniformValue,
    },
    CreateTexture {
        handle: GpuHandle,
        width: u32,
        height: u32,
    },
    ResizeTexture {
        handle: GpuHandle,
        width: u32,
        height: u32,
    },
    DeleteTexture(GpuHandle),
    CreateRenderbuffer {
        handle: GpuHandle,
        width: u32,
        height: u32,
    },
    ResizeRenderbuffer {
        handle: GpuHandle,
        width: u32,
        height: u32,
    },
    DeleteRenderbuffer(GpuHandle),
    CreateFramebuffer {
        handle: GpuHandle,
        color: GpuHandle,
        depth_stencil: GpuHandle,
    },
    BindFramebuffer(Option<GpuHandle>),
    DeleteFramebuffer(GpuHandle),
    Viewport {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    EnableDepthTest,
    EnableAlphaBlending,
    SetClearColor(Vec4),
    Clear,
    DrawIndexed {
        count: u32,
        vertex_array: Option<GpuHandle>,
        program: Option<GpuHandle>,
    },
}

/// Shared view of everything a [`HeadlessApi`] was asked to do.
#[derive(Clone, Debug, Default)]
pub struct CommandLog {
    commands: Rc<RefCell<Vec<GpuCommand>>>,
}

impl CommandLog {
    fn push(&self, command: GpuCommand) {
        self.commands.borrow_mut().push(command);
    }

    pub fn commands(&self) -> Vec<GpuCommand> {
        self.commands.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.commands.borrow_mut().clear();
    }

    /// Commands recorded after the first `start` entries.
    pub fn since(&self, start: usize) -> Vec<GpuCommand> {
        self.commands
            .borrow()
            .iter()
            .skip(start)
            .cloned()
            .collect()
    }

    /// Most recent value uploaded under `name`, on any program.
    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.commands
            .borrow()
            .iter()
            .rev()
            .find_map(|command| match command {
                GpuCommand::SetUniform {
                    name: uploaded,
                    value,
                    ..
                } if uploaded == name => Some(*value),
                _ => None,
            })
    }

    /// Every upload whose name starts with `prefix`, in order.
    pub fn uniforms_with_prefix(&self, prefix: &str) -> Vec<(String, UniformValue)> {
        self.commands
            .borrow()
            .iter()
            .filter_map(|command| match command {
                GpuCommand::SetUniform { name, value, .. } if name.starts_with(prefix) => {
                    Some((name.clone(), *value))
                }
                _ => None,
            })
            .collect()
    }

    pub fn draw_counts(&self) -> Vec<u32> {
        self.commands
            .borrow()
            .iter()
            .filter_map(|command| match command {
                GpuCommand::DrawIndexed { count, .. } => Some(*count),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&GpuCommand) -> bool) -> usize {
        self.commands
            .borrow()
            .iter()
            .filter(|command| predicate(command))
            .count()
    }
}

#[derive(Default)]
struct Program {
    linked: bool,
    locations: HashMap<String, UniformLocation>,
}

#[derive(Default)]
struct State {
    programs: HashMap<GpuHandle, Program>,
    uniform_names: HashMap<UniformLocation, (GpuHandle, String)>,
    textures: HashMap<GpuHandle, (u32, u32)>,
    renderbuffers: HashMap<GpuHandle, (u32, u32)>,
    framebuffers: HashMap<GpuHandle, (GpuHandle, GpuHandle)>,
    bound_vertex_array: Option<GpuHandle>,
    bound_program: Option<GpuHandle>,
}

/// A graphics API that never touches a GPU.
///
/// Handles are handed out from a counter, driver-side validation is mimicked
/// where the rendering core depends on it, and every call lands in a
/// [`CommandLog`].
pub struct HeadlessApi {
    log: CommandLog,
    next_handle: Cell<u32>,
    next_location: Cell<u32>,
    buffer_budget: Cell<Option<usize>>,
    object_budget: Cell<Option<usize>>,
    state: RefCell<State>,
}

impl HeadlessApi {
    pub fn new() -> Self {
        Self {
            log: CommandLog::default(),
            next_handle: Cell::new(1),
            next_location: Cell::new(0),
            buffer_budget: Cell::new(None),
            object_budget: Cell::new(None),
            state: RefCell::new(State::default()),
        }
    }

    /// Rejects every buffer allocation past the first `budget`.
    pub fn with_buffer_budget(self, budget: usize) -> Self {
        self.buffer_budget.set(Some(budget));
        self
    }

    /// Rejects every object creation past the first `budget`: buffers,
    /// vertex arrays, shader stages, programs, attachments and framebuffers.
    pub fn with_object_budget(self, budget: usize) -> Self {
        self.object_budget.set(Some(budget));
        self
    }

    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }

    fn take_budget(budget: &Cell<Option<usize>>) -> Result<(), String> {
        match budget.get() {
            Some(0) => Err("out of memory".to_string()),
            Some(left) => {
                budget.set(Some(left - 1));
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn allocate(&self) -> GpuHandle {
        let raw = self.next_handle.get();
        self.next_handle.set(raw + 1);
        // Counter starts at one and only grows.
        GpuHandle(NonZeroU32::MIN.saturating_add(raw - 1))
    }
}

impl Default for HeadlessApi {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsApi for HeadlessApi {
    fn create_buffer(&self, target: BufferTarget, data: &[u8]) -> Result<GpuHandle, DeviceError> {
        Self::take_budget(&self.buffer_budget)?;
        Self::take_budget(&self.object_budget)?;

        let handle = self.allocate();
        self.log.push(GpuCommand::CreateBuffer {
            target,
            handle,
            size: data.len(),
        });
        Ok(handle)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<GpuHandle>) {
        self.log.push(GpuCommand::BindBuffer { target, buffer });
    }

    fn delete_buffer(&self, buffer: GpuHandle) {
        self.log.push(GpuCommand::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&self) -> Result<GpuHandle, DeviceError> {
        Self::take_budget(&self.object_budget)?;
        let handle = self.allocate();
        self.log.push(GpuCommand::CreateVertexArray(handle));
        Ok(handle)
    }

    fn bind_vertex_array(&self, vertex_array: Option<GpuHandle>) {
        self.state.borrow_mut().bound_vertex_array = vertex_array;
        self.log.push(GpuCommand::BindVertexArray(vertex_array));
    }

    fn vertex_attribute(&self, attribute: &VertexAttribute) {
        self.log.push(GpuCommand::VertexAttribute(*attribute));
    }

    fn delete_vertex_array(&self, vertex_array: GpuHandle) {
        let mut state = self.state.borrow_mut();
        if state.bound_vertex_array == Some(vertex_array) {
            state.bound_vertex_array = None;
        }
        self.log.push(GpuCommand::DeleteVertexArray(vertex_array));
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<GpuHandle, String> {
        if source.trim().is_empty() {
            self.log.push(GpuCommand::CompileShader {
                stage,
                handle: None,
            });
            return Err("ERROR: 0:1: '' : syntax error, empty source".to_string());
        }
        Self::take_budget(&self.object_budget)?;

        let handle = self.allocate();
        self.log.push(GpuCommand::CompileShader {
            stage,
            handle: Some(handle),
        });
        Ok(handle)
    }

    fn delete_shader(&self, shader: GpuHandle) {
        self.log.push(GpuCommand::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<GpuHandle, DeviceError> {
        Self::take_budget(&self.object_budget)?;
        let handle = self.allocate();
        self.state
            .borrow_mut()
            .programs
            .insert(handle, Program::default());
        self.log.push(GpuCommand::CreateProgram(handle));
        Ok(handle)
    }

    fn link_program(&self, program: GpuHandle, stages: &[Option<GpuHandle>]) -> Result<(), String> {
        let linked = stages.len() >= 2 && stages.iter().all(Option::is_some);
        if let Some(entry) = self.state.borrow_mut().programs.get_mut(&program) {
            entry.linked = linked;
        }
        self.log.push(GpuCommand::LinkProgram { program, linked });

        if linked {
            Ok(())
        } else {
            Err("error: program is missing a vertex or fragment stage".to_string())
        }
    }

    fn use_program(&self, program: Option<GpuHandle>) {
        self.state.borrow_mut().bound_program = program;
        self.log.push(GpuCommand::UseProgram(program));
    }

    fn delete_program(&self, program: GpuHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.programs.remove(&program) {
            for location in entry.locations.values() {
                state.uniform_names.remove(location);
            }
        }
        if state.bound_program == Some(program) {
            state.bound_program = None;
        }
        self.log.push(GpuCommand::DeleteProgram(program));
    }

    fn uniform_location(&self, program: GpuHandle, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.borrow_mut();
        let entry = state.programs.get_mut(&program)?;
        if !entry.linked {
            return None;
        }
        if let Some(location) = entry.locations.get(name) {
            return Some(*location);
        }

        let location = UniformLocation(self.next_location.get());
        self.next_location.set(location.0 + 1);
        entry.locations.insert(name.to_string(), location);
        state
            .uniform_names
            .insert(location, (program, name.to_string()));
        Some(location)
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let state = self.state.borrow();
        let Some((program, name)) = state.uniform_names.get(&location) else {
            tracing::debug!(location = location.0, "uniform upload to an unknown location");
            return;
        };
        self.log.push(GpuCommand::SetUniform {
            program: *program,
            name: name.clone(),
            value: *value,
        });
    }

    fn create_color_texture(&self, width: u32, height: u32) -> Result<GpuHandle, DeviceError> {
        Self::take_budget(&self.object_budget)?;
        let handle = self.allocate();
        self.state
            .borrow_mut()
            .textures
            .insert(handle, (width, height));
        self.log.push(GpuCommand::CreateTexture {
            handle,
            width,
            height,
        });
        Ok(handle)
    }

    fn resize_color_texture(&self, texture: GpuHandle, width: u32, height: u32) {
        self.state
            .borrow_mut()
            .textures
            .insert(texture, (width, height));
        self.log.push(GpuCommand::ResizeTexture {
            handle: texture,
            width,
            height,
        });
    }

    fn delete_texture(&self, texture: GpuHandle) {
        self.state.borrow_mut().textures.remove(&texture);
        self.log.push(GpuCommand::DeleteTexture(texture));
    }

    fn create_depth_stencil(&self, width: u32, height: u32) -> Result<GpuHandle, DeviceError> {
        Self::take_budget(&self.object_budget)?;
        let handle = self.allocate();
        self.state
            .borrow_mut()
            .renderbuffers
            .insert(handle, (width, height));
        self.log.push(GpuCommand::CreateRenderbuffer {
            handle,
            width,
            height,
        });
        Ok(handle)
    }

    fn resize_depth_stencil(&self, renderbuffer: GpuHandle, width: u32, height: u32) {
        self.state
            .borrow_mut()
            .renderbuffers
            .insert(renderbuffer, (width, height));
        self.log.push(GpuCommand::ResizeRenderbuffer {
            handle: renderbuffer,
            width,
            height,
        });
    }

    fn delete_renderbuffer(&self, renderbuffer: GpuHandle) {
        self.state.borrow_mut().renderbuffers.remove(&renderbuffer);
        self.log.push(GpuCommand::DeleteRenderbuffer(renderbuffer));
    }

    fn create_framebuffer(
        &self,
        color: GpuHandle,
        depth_stencil: GpuHandle,
    ) -> Result<GpuHandle, DeviceError> {
        Self::take_budget(&self.object_budget)?;
        let handle = self.allocate();
        self.state
            .borrow_mut()
            .framebuffers
            .insert(handle, (color, depth_stencil));
        self.log.push(GpuCommand::CreateFramebuffer {
            handle,
            color,
            depth_stencil,
        });
        Ok(handle)
    }

    fn framebuffer_complete(&self, framebuffer: GpuHandle) -> bool {
        let state = self.state.borrow();
        let Some((color, depth_stencil)) = state.framebuffers.get(&framebuffer) else {
            return false;
        };
        let (Some(color_size), Some(depth_size)) = (
            state.textures.get(color),
            state.renderbuffers.get(depth_stencil),
        ) else {
            return false;
        };

        let in_range = |size: u32| size > 0 && size <= MAX_FRAMEBUFFER_SIZE;
        color_size == depth_size && in_range(color_size.0) && in_range(color_size.1)
    }

    fn bind_framebuffer(&self, framebuffer: Option<GpuHandle>) {
        self.log.push(GpuCommand::BindFramebuffer(framebuffer));
    }

    fn delete_framebuffer(&self, framebuffer: GpuHandle) {
        self.state.borrow_mut().framebuffers.remove(&framebuffer);
        self.log.push(GpuCommand::DeleteFramebuffer(framebuffer));
    }

    fn viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        self.log.push(GpuCommand::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn enable_depth_test(&self) {
        self.log.push(GpuCommand::EnableDepthTest);
    }

    fn enable_alpha_blending(&self) {
        self.log.push(GpuCommand::EnableAlphaBlending);
    }

    fn set_clear_color(&self, color: Vec4) {
        self.log.push(GpuCommand::SetClearColor(color));
    }

    fn clear(&self) {
        self.log.push(GpuCommand::Clear);
    }

    fn draw_indexed(&self, count: u32) {
        let state = self.state.borrow();
        self.log.push(GpuCommand::DrawIndexed {
            count,
            vertex_array: state.bound_vertex_array,
            program: state.bound_program,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique() {
        let api = HeadlessApi::new();
        let a = api.create_buffer(BufferTarget::Vertex, &[0; 4]).unwrap();
        let b = api.create_vertex_array().unwrap();
        let c = api.create_program().unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(a.get(), 1);
    }

    #[test]
    fn object_budget_covers_every_kind_of_object() {
        let api = HeadlessApi::new().with_object_budget(2);
        assert!(api.create_color_texture(64, 64).is_ok());
        assert!(api.create_vertex_array().is_ok());

        assert!(api.create_depth_stencil(64, 64).is_err());
        assert!(api.compile_shader(ShaderStage::Vertex, "void main() {}").is_err());
        assert!(api.create_buffer(BufferTarget::Index, &[0; 4]).is_err());
    }

    #[test]
    fn empty_source_fails_to_compile() {
        let api = HeadlessApi::new();
        assert!(api.compile_shader(ShaderStage::Vertex, "   \n").is_err());
        assert!(api
            .compile_shader(ShaderStage::Fragment, "void main() {}")
            .is_ok());
    }

    #[test]
    fn unlinked_program_resolves_no_uniforms() {
        let api = HeadlessApi::new();
        let vertex = api.compile_shader(ShaderStage::Vertex, "void main() {}").ok();
        let program = api.create_program().unwrap();

        assert!(api.link_program(program, &[vertex, None]).is_err());
        assert_eq!(api.uniform_location(program, "u_Transform"), None);
    }

    #[test]
    fn uniform_uploads_are_recorded_by_name() {
        let api = HeadlessApi::new();
        let log = api.log();
        let vertex = api.compile_shader(ShaderStage::Vertex, "v").ok();
        let fragment = api.compile_shader(ShaderStage::Fragment, "f").ok();
        let program = api.create_program().unwrap();
        api.link_program(program, &[vertex, fragment]).unwrap();

        let location = api.uniform_location(program, "u_PointLightCount").unwrap();
        assert_eq!(api.uniform_location(program, "u_PointLightCount"), Some(location));
        api.set_uniform(location, &UniformValue::Int(3));

        assert_eq!(
            log.last_uniform("u_PointLightCount"),
            Some(UniformValue::Int(3))
        );
    }

    #[test]
    fn framebuffer_completeness_follows_attachment_sizes() {
        let api = HeadlessApi::new();
        let color = api.create_color_texture(1280, 720).unwrap();
        let depth = api.create_depth_stencil(1280, 720).unwrap();
        let framebuffer = api.create_framebuffer(color, depth).unwrap();
        assert!(api.framebuffer_complete(framebuffer));

        api.resize_color_texture(color, 0, 720);
        assert!(!api.framebuffer_complete(framebuffer));
    }

    #[test]
    fn draws_capture_bound_state() {
        let api = HeadlessApi::new();
        let log = api.log();
        let vertex_array = api.create_vertex_array().unwrap();
        api.bind_vertex_array(Some(vertex_array));
        api.draw_indexed(6);

        assert_eq!(log.draw_counts(), vec![6]);
        assert!(log.commands().contains(&GpuCommand::DrawIndexed {
            count: 6,
            vertex_array: Some(vertex_array),
            program: None,
        }));
    }
}
