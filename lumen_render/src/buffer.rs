use bytemuck::Pod;

use crate::{
    device::{AttributeKind, BufferTarget, Device, DeviceError, GraphicsApi, VertexAttribute},
    id::{GpuHandle, IndexBufferId, VertexArrayId, VertexBufferId},
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ShaderDataType {
    Float,
    Float2,
    Float3,
    Float4,
    Mat3,
    Mat4,
    Int,
    Int2,
    Int3,
    Int4,
    Bool,
}

impl ShaderDataType {
    /// Size in bytes.
    pub fn size(self) -> u32 {
        match self {
            ShaderDataType::Float => 4,
            ShaderDataType::Float2 => 4 * 2,
            ShaderDataType::Float3 => 4 * 3,
            ShaderDataType::Float4 => 4 * 4,
            ShaderDataType::Mat3 => 4 * 3 * 3,
            ShaderDataType::Mat4 => 4 * 4 * 4,
            ShaderDataType::Int => 4,
            ShaderDataType::Int2 => 4 * 2,
            ShaderDataType::Int3 => 4 * 3,
            ShaderDataType::Int4 => 4 * 4,
            ShaderDataType::Bool => 1,
        }
    }

    pub fn component_count(self) -> u32 {
        match self {
            ShaderDataType::Float | ShaderDataType::Int | ShaderDataType::Bool => 1,
            ShaderDataType::Float2 | ShaderDataType::Int2 => 2,
            ShaderDataType::Float3 | ShaderDataType::Int3 => 3,
            ShaderDataType::Float4 | ShaderDataType::Int4 => 4,
            ShaderDataType::Mat3 => 3 * 3,
            ShaderDataType::Mat4 => 4 * 4,
        }
    }

    fn attribute_kind(self) -> AttributeKind {
        match self {
            ShaderDataType::Int
            | ShaderDataType::Int2
            | ShaderDataType::Int3
            | ShaderDataType::Int4 => AttributeKind::Int,
            ShaderDataType::Bool => AttributeKind::Bool,
            _ => AttributeKind::Float,
        }
    }

    /// Matrices take one attribute slot per column.
    fn attribute_slots(self) -> u32 {
        match self {
            ShaderDataType::Mat3 => 3,
            ShaderDataType::Mat4 => 4,
            _ => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BufferElement {
    name: String,
    data_type: ShaderDataType,
    size: u32,
    offset: u32,
    normalized: bool,
}

impl BufferElement {
    pub fn new(data_type: ShaderDataType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type,
            size: data_type.size(),
            offset: 0,
            normalized: false,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> ShaderDataType {
        self.data_type
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }
}

/// Ordered attribute description of one vertex stream. Element order is the
/// attribute binding order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BufferLayout {
    elements: Vec<BufferElement>,
    stride: u32,
}

impl BufferLayout {
    pub fn new(elements: Vec<BufferElement>) -> Self {
        let mut layout = Self {
            elements,
            stride: 0,
        };
        layout.calculate_offsets_and_stride();
        layout
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn elements(&self) -> &[BufferElement] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BufferElement> {
        self.elements.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn calculate_offsets_and_stride(&mut self) {
        let mut offset = 0;
        for element in &mut self.elements {
            element.offset = offset;
            offset += element.size;
        }
        self.stride = offset;
    }
}

impl<'a> IntoIterator for &'a BufferLayout {
    type Item = &'a BufferElement;
    type IntoIter = std::slice::Iter<'a, BufferElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[derive(Debug)]
pub struct VertexBuffer {
    handle: GpuHandle,
    size: usize,
    layout: BufferLayout,
}

impl VertexBuffer {
    pub fn handle(&self) -> GpuHandle {
        self.handle
    }

    /// Size of the uploaded data in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    pub(crate) fn release(self, api: &dyn GraphicsApi) {
        api.delete_buffer(self.handle);
    }
}

#[derive(Debug)]
pub struct IndexBuffer {
    handle: GpuHandle,
    count: u32,
}

impl IndexBuffer {
    pub fn handle(&self) -> GpuHandle {
        self.handle
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub(crate) fn release(self, api: &dyn GraphicsApi) {
        api.delete_buffer(self.handle);
    }
}

/// Binds vertex streams and one index buffer together. Holds keys only; the
/// buffers stay owned by the [`Device`].
#[derive(Debug)]
pub struct VertexArray {
    handle: GpuHandle,
    vertex_buffers: Vec<VertexBufferId>,
    index_buffer: Option<IndexBufferId>,
    next_attribute: u32,
}

impl VertexArray {
    pub fn handle(&self) -> GpuHandle {
        self.handle
    }

    pub fn vertex_buffers(&self) -> &[VertexBufferId] {
        &self.vertex_buffers
    }

    pub fn index_buffer(&self) -> Option<IndexBufferId> {
        self.index_buffer
    }

    pub(crate) fn release(self, api: &dyn GraphicsApi) {
        api.delete_vertex_array(self.handle);
    }
}

impl Device {
    pub fn create_vertex_buffer<T: Pod>(
        &mut self,
        vertices: &[T],
    ) -> Result<VertexBufferId, DeviceError> {
        let data: &[u8] = bytemuck::cast_slice(vertices);
        let handle = self.api().create_buffer(BufferTarget::Vertex, data)?;

        Ok(self.vertex_buffers.insert(VertexBuffer {
            handle,
            size: data.len(),
            layout: BufferLayout::default(),
        }))
    }

    pub fn vertex_buffer(&self, id: VertexBufferId) -> Option<&VertexBuffer> {
        self.vertex_buffers.get(id)
    }

    pub fn set_vertex_buffer_layout(&mut self, id: VertexBufferId, layout: BufferLayout) {
        match self.vertex_buffers.get_mut(id) {
            Some(buffer) => buffer.layout = layout,
            None => tracing::warn!("layout set on a destroyed vertex buffer"),
        }
    }

    pub fn bind_vertex_buffer(&self, id: VertexBufferId) {
        if let Some(buffer) = self.vertex_buffers.get(id) {
            self.api().bind_buffer(BufferTarget::Vertex, Some(buffer.handle));
        }
    }

    pub fn unbind_vertex_buffer(&self) {
        self.api().bind_buffer(BufferTarget::Vertex, None);
    }

    pub fn destroy_vertex_buffer(&mut self, id: VertexBufferId) {
        if let Some(buffer) = self.vertex_buffers.remove(id) {
            buffer.release(self.api());
        }
    }

    pub fn create_index_buffer(&mut self, indices: &[u32]) -> Result<IndexBufferId, DeviceError> {
        let handle = self
            .api()
            .create_buffer(BufferTarget::Index, bytemuck::cast_slice(indices))?;

        Ok(self.index_buffers.insert(IndexBuffer {
            handle,
            count: indices.len() as u32,
        }))
    }

    pub fn index_buffer(&self, id: IndexBufferId) -> Option<&IndexBuffer> {
        self.index_buffers.get(id)
    }

    pub fn bind_index_buffer(&self, id: IndexBufferId) {
        if let Some(buffer) = self.index_buffers.get(id) {
            self.api().bind_buffer(BufferTarget::Index, Some(buffer.handle));
        }
    }

    pub fn unbind_index_buffer(&self) {
        self.api().bind_buffer(BufferTarget::Index, None);
    }

    pub fn destroy_index_buffer(&mut self, id: IndexBufferId) {
        if let Some(buffer) = self.index_buffers.remove(id) {
            buffer.release(self.api());
        }
    }

    pub fn create_vertex_array(&mut self) -> Result<VertexArrayId, DeviceError> {
        let handle = self.api().create_vertex_array()?;

        Ok(self.vertex_arrays.insert(VertexArray {
            handle,
            vertex_buffers: Vec::new(),
            index_buffer: None,
            next_attribute: 0,
        }))
    }

    pub fn vertex_array(&self, id: VertexArrayId) -> Option<&VertexArray> {
        self.vertex_arrays.get(id)
    }

    /// Appends a vertex stream, recording one attribute pointer per layout
    /// element. Attribute indices continue where the previous stream ended.
    pub fn add_vertex_buffer(&mut self, vertex_array: VertexArrayId, buffer: VertexBufferId) {
        let Some(array) = self.vertex_arrays.get_mut(vertex_array) else {
            tracing::warn!("vertex buffer added to a destroyed vertex array");
            return;
        };
        let Some(vertex_buffer) = self.vertex_buffers.get(buffer) else {
            tracing::warn!("destroyed vertex buffer added to a vertex array");
            return;
        };
        if vertex_buffer.layout.is_empty() {
            tracing::warn!("vertex buffer added without a layout");
        }

        let api = self.api.as_ref();
        api.bind_vertex_array(Some(array.handle));
        api.bind_buffer(BufferTarget::Vertex, Some(vertex_buffer.handle));

        let layout = &vertex_buffer.layout;
        for element in layout {
            let data_type = element.data_type();
            let slots = data_type.attribute_slots();
            let components = data_type.component_count() / slots;
            let column_size = data_type.size() / slots;

            for slot in 0..slots {
                api.vertex_attribute(&VertexAttribute {
                    index: array.next_attribute,
                    components,
                    kind: data_type.attribute_kind(),
                    normalized: element.is_normalized(),
                    stride: layout.stride(),
                    offset: element.offset() + column_size * slot,
                });
                array.next_attribute += 1;
            }
        }

        array.vertex_buffers.push(buffer);
    }

    /// Replaces any previous index buffer binding. Ownership stays with the
    /// device.
    pub fn set_index_buffer(&mut self, vertex_array: VertexArrayId, buffer: IndexBufferId) {
        let Some(array) = self.vertex_arrays.get_mut(vertex_array) else {
            tracing::warn!("index buffer set on a destroyed vertex array");
            return;
        };
        let Some(index_buffer) = self.index_buffers.get(buffer) else {
            tracing::warn!("destroyed index buffer set on a vertex array");
            return;
        };

        let api = self.api.as_ref();
        api.bind_vertex_array(Some(array.handle));
        api.bind_buffer(BufferTarget::Index, Some(index_buffer.handle));
        array.index_buffer = Some(buffer);
    }

    /// Index count of the buffer currently bound to `vertex_array`.
    pub fn index_count(&self, vertex_array: VertexArrayId) -> Option<u32> {
        let array = self.vertex_arrays.get(vertex_array)?;
        let buffer = self.index_buffers.get(array.index_buffer?)?;
        Some(buffer.count)
    }

    pub fn bind_vertex_array(&self, id: VertexArrayId) {
        if let Some(array) = self.vertex_arrays.get(id) {
            self.api().bind_vertex_array(Some(array.handle));
        }
    }

    pub fn unbind_vertex_array(&self) {
        self.api().bind_vertex_array(None);
    }

    /// Releases the vertex array object only; its buffers stay alive.
    pub fn destroy_vertex_array(&mut self, id: VertexArrayId) {
        if let Some(array) = self.vertex_arrays.remove(id) {
            array.release(self.api());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{GpuCommand, HeadlessApi};

    fn position_normal_layout() -> BufferLayout {
        BufferLayout::new(vec![
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float3, "a_Normal"),
        ])
    }

    #[test]
    fn layout_offsets_accumulate_sizes() {
        let layout = BufferLayout::new(vec![
            BufferElement::new(ShaderDataType::Float, "a_Weight"),
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float, "a_Id"),
        ]);

        let offsets: Vec<u32> = layout.iter().map(BufferElement::offset).collect();
        assert_eq!(offsets, vec![0, 4, 16]);
        assert_eq!(layout.stride(), 20);
    }

    #[test]
    fn empty_layout_has_zero_stride() {
        let layout = BufferLayout::default();
        assert!(layout.is_empty());
        assert_eq!(layout.stride(), 0);
    }

    #[test]
    fn data_type_sizes() {
        assert_eq!(ShaderDataType::Mat3.size(), 36);
        assert_eq!(ShaderDataType::Mat4.size(), 64);
        assert_eq!(ShaderDataType::Bool.size(), 1);
        assert_eq!(ShaderDataType::Int4.component_count(), 4);
    }

    #[test]
    fn vertex_array_records_one_attribute_per_element() {
        let api = HeadlessApi::new();
        let log = api.log();
        let mut device = Device::new(api);

        let vertices = [0.0f32; 12];
        let vb = device.create_vertex_buffer(&vertices).unwrap();
        device.set_vertex_buffer_layout(vb, position_normal_layout());
        let va = device.create_vertex_array().unwrap();
        device.add_vertex_buffer(va, vb);

        let attributes: Vec<VertexAttribute> = log
            .commands()
            .into_iter()
            .filter_map(|command| match command {
                GpuCommand::VertexAttribute(attribute) => Some(attribute),
                _ => None,
            })
            .collect();

        assert_eq!(attributes.len(), 2);
        assert_eq!((attributes[0].index, attributes[0].offset), (0, 0));
        assert_eq!((attributes[1].index, attributes[1].offset), (1, 12));
        assert!(attributes.iter().all(|a| a.stride == 24 && a.components == 3));
        assert_eq!(device.vertex_buffer(vb).unwrap().size(), 48);
    }

    #[test]
    fn matrix_attributes_span_one_slot_per_column() {
        let api = HeadlessApi::new();
        let log = api.log();
        let mut device = Device::new(api);

        let vb = device.create_vertex_buffer(&[0.0f32; 16]).unwrap();
        device.set_vertex_buffer_layout(
            vb,
            BufferLayout::new(vec![BufferElement::new(ShaderDataType::Mat4, "a_Model")]),
        );
        let va = device.create_vertex_array().unwrap();
        device.add_vertex_buffer(va, vb);

        let offsets: Vec<u32> = log
            .commands()
            .into_iter()
            .filter_map(|command| match command {
                GpuCommand::VertexAttribute(attribute) => Some(attribute.offset),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![0, 16, 32, 48]);
    }

    #[test]
    fn set_index_buffer_replaces_previous_binding() {
        let api = HeadlessApi::new();
        let mut device = Device::new(api);

        let first = device.create_index_buffer(&[0, 1, 2]).unwrap();
        let second = device.create_index_buffer(&[0, 1, 2, 2, 3, 0]).unwrap();
        let va = device.create_vertex_array().unwrap();

        device.set_index_buffer(va, first);
        assert_eq!(device.index_count(va), Some(3));
        device.set_index_buffer(va, second);
        assert_eq!(device.index_count(va), Some(6));
        assert!(device.index_buffer(first).is_some());
    }

    #[test]
    fn destroyed_buffer_no_longer_resolves_through_vertex_array() {
        let api = HeadlessApi::new();
        let mut device = Device::new(api);

        let ib = device.create_index_buffer(&[0, 1, 2]).unwrap();
        let va = device.create_vertex_array().unwrap();
        device.set_index_buffer(va, ib);
        device.destroy_index_buffer(ib);

        assert_eq!(device.index_count(va), None);
    }

    #[test]
    fn destroy_releases_exactly_once() {
        let api = HeadlessApi::new();
        let log = api.log();
        let mut device = Device::new(api);

        let vb = device.create_vertex_buffer(&[1.0f32, 2.0, 3.0]).unwrap();
        let handle = device.vertex_buffer(vb).unwrap().handle();
        device.destroy_vertex_buffer(vb);
        device.destroy_vertex_buffer(vb);
        drop(device);

        let deletes = log
            .commands()
            .into_iter()
            .filter(|command| *command == GpuCommand::DeleteBuffer(handle))
            .count();
        assert_eq!(deletes, 1);
    }

    #[test]
    fn dropping_device_releases_live_resources() {
        let api = HeadlessApi::new();
        let log = api.log();
        let mut device = Device::new(api);

        device.create_vertex_buffer(&[1.0f32]).unwrap();
        device.create_index_buffer(&[0]).unwrap();
        device.create_vertex_array().unwrap();
        drop(device);

        let commands = log.commands();
        let buffer_deletes = commands
            .iter()
            .filter(|command| matches!(command, GpuCommand::DeleteBuffer(_)))
            .count();
        assert_eq!(buffer_deletes, 2);
        assert!(commands
            .iter()
            .any(|command| matches!(command, GpuCommand::DeleteVertexArray(_))));
    }

    #[test]
    fn rejected_upload_fails_creation() {
        let api = HeadlessApi::new().with_buffer_budget(1);
        let mut device = Device::new(api);

        assert!(device.create_vertex_buffer(&[0.0f32; 3]).is_ok());
        assert!(device.create_index_buffer(&[0, 1, 2]).is_err());
    }
}
