use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::{
    buffer::{BufferElement, BufferLayout, ShaderDataType},
    device::{Device, DeviceError},
    id::{IndexBufferId, VertexArrayId, VertexBufferId},
};

/// Position + normal, laid out as six consecutive `f32`s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

/// CPU-side triangle mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Attribute layout matching [`Vertex`]: location 0 position, 1 normal.
    pub fn layout() -> BufferLayout {
        BufferLayout::new(vec![
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float3, "a_Normal"),
        ])
    }

    /// Interleaved `[x, y, z, nx, ny, nz, ...]`.
    pub fn floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// GPU copy of a [`MeshData`], drawable through its vertex array.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GpuMesh {
    pub vertex_array: VertexArrayId,
    pub vertex_buffer: VertexBufferId,
    pub index_buffer: IndexBufferId,
    pub index_count: u32,
}

impl Device {
    pub fn upload_mesh(&mut self, mesh: &MeshData) -> Result<GpuMesh, DeviceError> {
        let vertex_buffer = self.create_vertex_buffer(&mesh.vertices)?;
        self.set_vertex_buffer_layout(vertex_buffer, MeshData::layout());
        let index_buffer = match self.create_index_buffer(&mesh.indices) {
            Ok(index_buffer) => index_buffer,
            Err(err) => {
                self.destroy_vertex_buffer(vertex_buffer);
                return Err(err);
            }
        };

        let vertex_array = match self.create_vertex_array() {
            Ok(vertex_array) => vertex_array,
            Err(err) => {
                self.destroy_vertex_buffer(vertex_buffer);
                self.destroy_index_buffer(index_buffer);
                return Err(err);
            }
        };
        self.add_vertex_buffer(vertex_array, vertex_buffer);
        self.set_index_buffer(vertex_array, index_buffer);
        self.unbind_vertex_array();

        tracing::debug!(
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "mesh uploaded"
        );

        Ok(GpuMesh {
            vertex_array,
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        })
    }

    pub fn destroy_mesh(&mut self, mesh: GpuMesh) {
        self.destroy_vertex_array(mesh.vertex_array);
        self.destroy_vertex_buffer(mesh.vertex_buffer);
        self.destroy_index_buffer(mesh.index_buffer);
    }
}
