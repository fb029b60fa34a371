//! Scene graph: mesh nodes and point lights.

use crate::{Vec3, transform::Transform};

/// Index of a mesh node inside its [`Scene`].
pub type NodeId = usize;

/// Geometry a node draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeshKind {
    Box { width: f32, height: f32, depth: f32 },
}

impl MeshKind {
    pub const UNIT_BOX: Self = Self::Box {
        width: 1.0,
        height: 1.0,
        depth: 1.0,
    };
}

#[derive(Clone, Copy, Debug)]
pub struct MeshNode {
    pub transform: Transform,
    pub mesh: MeshKind,
}

/// Omnidirectional light; `color` is linear RGB.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
}

impl PointLight {
    /// Light from a `0xRRGGBB` color.
    pub fn from_hex(rgb: u32, position: Vec3) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        Self {
            position,
            color: Vec3::new(channel(16), channel(8), channel(0)),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: Vec<MeshNode>,
    lights: Vec<PointLight>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: MeshKind, transform: Transform) -> NodeId {
        self.nodes.push(MeshNode { transform, mesh });
        self.nodes.len() - 1
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    pub fn nodes(&self) -> &[MeshNode] {
        &self.nodes
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// Rotate every node by `delta` radians.
    pub fn rotate_all(&mut self, delta: Vec3) {
        for node in &mut self.nodes {
            node.transform.rotate_by(delta);
        }
    }
}
