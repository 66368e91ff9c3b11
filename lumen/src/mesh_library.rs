use lumen_render::{mesh::GpuMesh, shapes, Device, DeviceError};

/// Which built-in mesh an entity draws.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MeshKind {
    #[default]
    None,
    Cube,
    Sphere,
    Capsule,
}

/// Built-in meshes, uploaded once and shared by every entity.
pub struct MeshLibrary {
    cube: GpuMesh,
    sphere: GpuMesh,
    capsule: GpuMesh,
}

impl MeshLibrary {
    pub fn upload(device: &mut Device, segments: u32) -> Result<Self, DeviceError> {
        Ok(Self {
            cube: device.upload_mesh(&shapes::cube(1.0))?,
            sphere: device.upload_mesh(&shapes::sphere(0.5, segments))?,
            capsule: device.upload_mesh(&shapes::capsule(1.0, 0.5, segments))?,
        })
    }

    pub fn get(&self, kind: MeshKind) -> Option<&GpuMesh> {
        match kind {
            MeshKind::None => None,
            MeshKind::Cube => Some(&self.cube),
            MeshKind::Sphere => Some(&self.sphere),
            MeshKind::Capsule => Some(&self.capsule),
        }
    }

    pub fn destroy(self, device: &mut Device) {
        device.destroy_mesh(self.cube);
        device.destroy_mesh(self.sphere);
        device.destroy_mesh(self.capsule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_render::headless::HeadlessApi;

    #[test]
    fn every_drawable_kind_resolves() {
        let mut device = Device::new(HeadlessApi::new());
        let library = MeshLibrary::upload(&mut device, 16).unwrap();

        assert!(library.get(MeshKind::None).is_none());
        assert_eq!(library.get(MeshKind::Cube).unwrap().index_count, 36);
        assert_eq!(library.get(MeshKind::Sphere).unwrap().index_count, 16 * 16 * 6);
        assert!(library.get(MeshKind::Capsule).is_some());
    }
}
