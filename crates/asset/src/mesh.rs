//! CPU-side mesh representation and procedural geometry.

/// Vertex with position/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both buffers are non-empty and every index is in range.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty()
            && !self.indices.is_empty()
            && self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|&i| (i as usize) < self.vertices.len())
    }

    /// Axis-aligned box centred on the origin.
    ///
    /// Each face gets its own four vertices so normals stay flat; triangles
    /// wind counter-clockwise seen from outside.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = [width * 0.5, height * 0.5, depth * 0.5];

        // (normal, u axis, v axis) with u x v == normal
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        const CORNERS: [([f32; 2], [f32; 2]); 4] = [
            ([-1.0, -1.0], [0.0, 1.0]),
            ([1.0, -1.0], [1.0, 1.0]),
            ([1.0, 1.0], [1.0, 0.0]),
            ([-1.0, 1.0], [0.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(FACES.len() * 4);
        let mut indices = Vec::with_capacity(FACES.len() * 6);

        for (normal, u, v) in FACES {
            let base = vertices.len() as u32;
            for ([su, sv], uv) in CORNERS {
                let position =
                    std::array::from_fn(|k| (normal[k] + u[k] * su + v[k] * sv) * half[k]);
                vertices.push(MeshVertex::new(position, normal, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_data_validity() {
        let data = MeshData::new(vec![MeshVertex::default(); 3], vec![0, 1, 2]);
        assert!(data.is_valid());

        let dangling = MeshData::new(vec![MeshVertex::default()], vec![0, 1, 2]);
        assert!(!dangling.is_valid());
    }

    #[test]
    fn cuboid_has_flat_faces() {
        let mesh = MeshData::cuboid(1.0, 1.0, 1.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert!(mesh.is_valid());

        for v in &mesh.vertices {
            assert!(v.position.iter().all(|c| (c.abs() - 0.5).abs() < 1e-6));
            // the face normal points along the axis the vertex sits on
            let along: f32 = (0..3).map(|k| v.position[k] * v.normal[k]).sum();
            assert!((along - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn cuboid_winding_faces_outward() {
        let mesh = MeshData::cuboid(2.0, 1.0, 3.0);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| mesh.vertices[tri[i] as usize]);
            let e1: [f32; 3] = std::array::from_fn(|k| b.position[k] - a.position[k]);
            let e2: [f32; 3] = std::array::from_fn(|k| c.position[k] - a.position[k]);
            let cross = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            let facing: f32 = (0..3).map(|k| cross[k] * a.normal[k]).sum();
            assert!(facing > 0.0);
        }
    }
}
