//! Mesh representation
//!
//! Backend-agnostic geometry: the Vulkan vertex input layout for [`Vertex`] lives
//! in `render::vulkan::vertex_layout`.

/// Vertex with position, normal and texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Unit normal
    pub normal: [f32; 3],
    /// Texture coordinate
    pub tex_coord: [f32; 2],
}

// Only f32 arrays, no padding
unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }

    /// Vertex carrying only a position
    pub fn at(position: [f32; 3]) -> Self {
        Self::new(position, [0.0, 0.0, 0.0], [0.0, 0.0])
    }
}

/// Triangle (or point) list with indices
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,
    /// Index data
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Unit cube centered at the origin (half-extent 0.5) with per-face normals
    ///
    /// Faces are counter-clockwise seen from outside, four vertices each so the
    /// normals stay flat.
    pub fn cube() -> Self {
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u_axis, v_axis) in CUBE_FACES {
            let base = vertices.len() as u32;
            for (u, v) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = [
                    0.5 * (normal[0] + u * u_axis[0] + v * v_axis[0]),
                    0.5 * (normal[1] + u * u_axis[1] + v * v_axis[1]),
                    0.5 * (normal[2] + u * u_axis[2] + v * v_axis[2]),
                ];
                let tex_coord = [(u + 1.0) * 0.5, (v + 1.0) * 0.5];
                vertices.push(Vertex::new(position, normal, tex_coord));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self::new(vertices, indices)
    }

    /// Cube spanning [-1, 1] on every axis, seen from inside
    ///
    /// Positions double as cubemap sample directions, so no normals or UVs are set.
    pub fn skybox() -> Self {
        let vertices = (0..8u32)
            .map(|corner| {
                let axis = |bit: u32| if corner & bit == 0 { -1.0 } else { 1.0 };
                Vertex::at([axis(1), axis(2), axis(4)])
            })
            .collect();

        // Corner index bits: 1 = +X, 2 = +Y, 4 = +Z. Winding faces inward.
        let indices = vec![
            // -Z
            0, 1, 3, 3, 2, 0,
            // +Z
            4, 6, 7, 7, 5, 4,
            // -X
            0, 2, 6, 6, 4, 0,
            // +X
            1, 5, 7, 7, 3, 1,
            // -Y
            0, 4, 5, 5, 1, 0,
            // +Y
            2, 3, 7, 7, 6, 2,
        ];

        Self::new(vertices, indices)
    }

    /// Single point at the origin, drawn as a point list
    pub fn point() -> Self {
        Self::new(vec![Vertex::at([0.0, 0.0, 0.0])], vec![0])
    }

    /// Number of indices to draw
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// (outward normal, u axis, v axis) with u x v = normal
const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        let vertex = Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.25]);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&vertex));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 0.0, 1.0, 0.0, 0.5, 0.25]);
    }

    #[test]
    fn test_cube_faces_wind_outward() {
        let cube = Mesh::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.index_count(), 36);

        for triangle in cube.indices.chunks(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| Vec3::from(cube.vertices[i as usize].position));
            let face_normal = (b - a).cross(&(c - a)).normalize();
            let stored = Vec3::from(cube.vertices[triangle[0] as usize].normal);
            assert!(face_normal.dot(&stored) > 0.99);
        }

        for vertex in &cube.vertices {
            assert!(vertex.position.iter().all(|c| c.abs() == 0.5));
        }
    }

    #[test]
    fn test_skybox_winds_inward() {
        let skybox = Mesh::skybox();
        assert_eq!(skybox.vertices.len(), 8);
        assert_eq!(skybox.index_count(), 36);

        for triangle in skybox.indices.chunks(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| Vec3::from(skybox.vertices[i as usize].position));
            let face_normal = (b - a).cross(&(c - a));
            let center = (a + b + c) / 3.0;
            assert!(face_normal.dot(&center) < 0.0);
        }
    }

    #[test]
    fn test_point_mesh() {
        let point = Mesh::point();
        assert_eq!(point.vertices.len(), 1);
        assert_eq!(point.indices, vec![0]);
    }
}
