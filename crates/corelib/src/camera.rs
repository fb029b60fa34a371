use crate::{Mat4, Vec3};

/// Right-handed perspective camera looking at a fixed target.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_deg: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl Camera {
    /// Camera at `position` looking at the origin with +Y up.
    pub fn perspective(position: Vec3, fov_y_deg: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            position,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_deg,
            z_near,
            z_far,
            aspect,
        }
    }

    /// Aspect ratio from a pixel size; zero dimensions are treated as one.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Depth maps to [0, 1], matching wgpu clip space.
    #[inline]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }
}
