//! GPU uniform block shared by the vertex and fragment shaders.

use bytemuck::{Pod, Zeroable};

/// Layout of `@group(0) @binding(0)`.
///
/// ```text
/// struct Scene {
///     model_view: mat4x4<f32>,
///     projection: mat4x4<f32>,
///     light_position: vec4<f32>, // view space
///     light_color: vec4<f32>,
///     resolution: vec2<f32>,
///     time: f32,
/// };
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_position: [f32; 4],
    pub light_color: [f32; 4],
    pub resolution: [f32; 2],
    pub time: f32,
    pub _pad: f32,
}

impl SceneUniforms {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}
