//! Procedural meshes. Every shape is centred on the origin with +Y up.

use glam::Vec3;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::mesh::{MeshData, Vertex};

/// Axis-aligned cube with faceted normals: four vertices per face.
pub fn cube(size: f32) -> MeshData {
    let h = size * 0.5;

    // Corner order per face matches the 0, 1, 2, 2, 3, 0 winding below.
    let faces: [(Vec3, [[f32; 3]; 4]); 6] = [
        (Vec3::Z, [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
        (Vec3::NEG_Z, [[-h, -h, -h], [h, -h, -h], [h, h, -h], [-h, h, -h]]),
        (Vec3::NEG_X, [[-h, h, h], [-h, h, -h], [-h, -h, -h], [-h, -h, h]]),
        (Vec3::X, [[h, h, h], [h, h, -h], [h, -h, -h], [h, -h, h]]),
        (Vec3::NEG_Y, [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]),
        (Vec3::Y, [[-h, h, -h], [h, h, -h], [h, h, h], [-h, h, h]]),
    ];

    let mut mesh = MeshData::default();
    for (normal, corners) in faces {
        let base = mesh.vertices.len() as u32;
        mesh.vertices.extend(
            corners
                .into_iter()
                .map(|corner| Vertex::new(Vec3::from_array(corner), normal)),
        );
        mesh.indices
            .extend([0, 1, 2, 2, 3, 0].into_iter().map(|i| base + i));
    }
    mesh
}

/// UV sphere with `(segments + 1)^2` vertices and `6 * segments^2` indices.
pub fn sphere(radius: f32, segments: u32) -> MeshData {
    let segments = segments.max(1);
    let mut mesh = MeshData::default();

    push_rings(&mut mesh, segments, segments, PI, |unit| {
        Vertex::new(unit * radius, unit)
    });
    push_grid_indices(&mut mesh, 0, segments, segments);
    mesh
}

/// Cylinder of `height` capped by two hemispheres of `radius`.
///
/// Vertices come in three runs: the cylinder's paired top/bottom ring, then
/// the top hemisphere, then the bottom one.
pub fn capsule(height: f32, radius: f32, segments: u32) -> MeshData {
    let segments = segments.max(2);
    let half_height = height * 0.5;
    let mut mesh = MeshData::default();

    for i in 0..=segments {
        let angle = i as f32 * TAU / segments as f32;
        let normal = Vec3::new(angle.cos(), 0.0, angle.sin());
        let rim = normal * radius;

        mesh.vertices
            .push(Vertex::new(rim + Vec3::Y * half_height, normal));
        mesh.vertices
            .push(Vertex::new(rim - Vec3::Y * half_height, normal));
    }

    for i in 0..segments {
        let top_left = i * 2;
        let bottom_left = top_left + 1;
        let top_right = (i + 1) * 2;
        let bottom_right = top_right + 1;

        mesh.indices.extend([
            top_left,
            bottom_left,
            top_right,
            top_right,
            bottom_left,
            bottom_right,
        ]);
    }

    let cylinder_vertices = (segments + 1) * 2;
    let hemisphere_segments = segments / 2;
    let hemisphere_vertices = (hemisphere_segments + 1) * (segments + 1);

    push_rings(&mut mesh, hemisphere_segments, segments, FRAC_PI_2, |unit| {
        Vertex::new(unit * radius + Vec3::Y * half_height, unit)
    });
    push_grid_indices(&mut mesh, cylinder_vertices, hemisphere_segments, segments);

    push_rings(&mut mesh, hemisphere_segments, segments, FRAC_PI_2, |unit| {
        let unit = unit * Vec3::new(1.0, -1.0, 1.0);
        Vertex::new(unit * radius - Vec3::Y * half_height, unit)
    });
    push_grid_indices(
        &mut mesh,
        cylinder_vertices + hemisphere_vertices,
        hemisphere_segments,
        segments,
    );

    mesh
}

/// Latitude rings from the +Y pole down to `sweep` radians, each with
/// `longitudes + 1` vertices so the seam is duplicated.
fn push_rings(
    mesh: &mut MeshData,
    latitudes: u32,
    longitudes: u32,
    sweep: f32,
    vertex: impl Fn(Vec3) -> Vertex,
) {
    for lat in 0..=latitudes {
        let theta = lat as f32 * sweep / latitudes as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for lon in 0..=longitudes {
            let phi = lon as f32 * TAU / longitudes as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let unit = Vec3::new(cos_phi * sin_theta, cos_theta, sin_phi * sin_theta);
            mesh.vertices.push(vertex(unit));
        }
    }
}

fn push_grid_indices(mesh: &mut MeshData, offset: u32, latitudes: u32, longitudes: u32) {
    for lat in 0..latitudes {
        for lon in 0..longitudes {
            let first = offset + lat * (longitudes + 1) + lon;
            let second = first + longitudes + 1;

            mesh.indices
                .extend([first, second, first + 1, second, second + 1, first + 1]);
        }
    }
}
