use crate::{EulerRot, Mat4, Quat, Vec3};

/// Object placement: translation, Euler XYZ rotation (radians) and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation_euler: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation_euler: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Add `delta` radians to each Euler angle.
    #[inline]
    pub fn rotate_by(&mut self, delta: Vec3) {
        self.rotation_euler += delta;
    }

    /// Model matrix = T * R * S.
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        let r = self.rotation_euler;
        let q = Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z);
        Mat4::from_scale_rotation_translation(self.scale, q, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
