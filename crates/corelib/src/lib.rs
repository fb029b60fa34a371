//! Core types: math re-exports, scene, camera and the owned render session.

pub use glam::{EulerRot, Mat4, Quat, Vec3, vec3};

pub mod camera;
pub mod frame;
pub mod scene;
pub mod session;
pub mod transform;
pub mod uniforms;

pub use frame::{FrameClock, FrameLoop};
pub use session::{Animation, RenderSession};
pub use uniforms::SceneUniforms;

#[cfg(test)]
mod tests {
    use super::*;

    use crate::scene::MeshKind;
    use crate::transform::Transform;

    #[test]
    fn identity_transform_is_identity_matrix() {
        assert_eq!(Transform::IDENTITY.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn translation_lands_in_last_column() {
        let t = Transform {
            scale: vec3(2.0, 2.0, 2.0),
            ..Transform::from_translation(vec3(1.0, 2.0, 3.0))
        };
        let m = t.matrix().to_cols_array();
        assert!((m[12] - 1.0).abs() < 1e-6);
        assert!((m[13] - 2.0).abs() < 1e-6);
        assert!((m[14] - 3.0).abs() < 1e-6);
        assert!((m[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn uniform_block_matches_shader_layout() {
        assert_eq!(SceneUniforms::SIZE, 176);
        assert_eq!(SceneUniforms::SIZE % 16, 0);
    }

    #[test]
    fn update_advances_one_step() {
        let mut session = RenderSession::demo(800, 600);
        assert_eq!(session.time(), 0.0);

        session.update();
        session.update();

        assert!((session.time() - 0.2).abs() < 1e-6);
        let rot = session.scene().nodes()[0].transform.rotation_euler;
        assert!((rot.x - 0.2).abs() < 1e-6);
        assert!((rot.y - 0.2).abs() < 1e-6);
        assert_eq!(rot.z, 0.0);
    }

    #[test]
    fn demo_scene_matches_layout() {
        let session = RenderSession::demo(1280, 720);
        assert_eq!(session.scene().nodes().len(), 1);
        assert_eq!(session.scene().nodes()[0].mesh, MeshKind::UNIT_BOX);

        let light = session.scene().lights()[0];
        assert_eq!(light.position, vec3(0.0, 300.0, 200.0));
        assert_eq!(light.color, Vec3::ONE);

        assert_eq!(session.camera().position, vec3(0.0, 0.0, 5.0));
        assert!((session.camera().aspect - 1280.0 / 720.0).abs() < 1e-6);
        assert_eq!(session.resolution(), [1280.0, 720.0]);
    }

    #[test]
    fn viewport_clamps_zero_size() {
        let mut session = RenderSession::demo(10, 10);
        session.set_viewport(0, 0);
        assert_eq!(session.resolution(), [1.0, 1.0]);
        assert_eq!(session.camera().aspect, 1.0);
    }

    #[test]
    fn uniforms_carry_time_and_view_space_light() {
        let mut session = RenderSession::demo(640, 480);
        session.update();
        let node = session.scene().nodes()[0];
        let u = session.uniforms_for(&node);

        assert!((u.time - 0.1).abs() < 1e-6);
        assert_eq!(u.resolution, [640.0, 480.0]);
        // camera sits at z = 5 looking down -Z, so view space shifts z by -5
        assert!((u.light_position[1] - 300.0).abs() < 1e-3);
        assert!((u.light_position[2] - 195.0).abs() < 1e-3);
        assert!(u.projection.iter().flatten().all(|f| f.is_finite()));
    }
}
