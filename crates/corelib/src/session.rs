//! Owned render state: the scene, its camera and the animated uniforms.

use crate::{
    Vec3,
    camera::Camera,
    scene::{MeshKind, MeshNode, PointLight, Scene},
    transform::Transform,
    uniforms::SceneUniforms,
};

/// Per-frame mutation applied by [`RenderSession::update`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation {
    /// Added to the `time` uniform every frame.
    pub time_step: f32,
    /// Euler radians added to every node's rotation every frame.
    pub spin: Vec3,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            time_step: 0.1,
            spin: Vec3::new(0.1, 0.1, 0.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderSession {
    scene: Scene,
    camera: Camera,
    animation: Animation,
    time: f32,
    resolution: [f32; 2],
}

impl RenderSession {
    pub fn new(scene: Scene, camera: Camera, animation: Animation) -> Self {
        Self {
            scene,
            camera,
            animation,
            time: 0.0,
            resolution: [1.0, 1.0],
        }
    }

    /// Unit box at the origin, white light at (0, 300, 200), camera at z = 5.
    pub fn demo(width: u32, height: u32) -> Self {
        let mut scene = Scene::new();
        scene.add_light(PointLight::from_hex(0xffffff, Vec3::new(0.0, 300.0, 200.0)));
        scene.add_mesh(MeshKind::UNIT_BOX, Transform::IDENTITY);

        let camera = Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 75.0, 1.0, 0.1, 1000.0);

        let mut session = Self::new(scene, camera, Animation::default());
        session.set_viewport(width, height);
        session
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn resolution(&self) -> [f32; 2] {
        self.resolution
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.camera.set_viewport(width, height);
        self.resolution = [width as f32, height as f32];
    }

    /// Advance one frame.
    pub fn update(&mut self) {
        self.time += self.animation.time_step;
        self.scene.rotate_all(self.animation.spin);
    }

    /// Uniform block for drawing `node` this frame.
    pub fn uniforms_for(&self, node: &MeshNode) -> SceneUniforms {
        let view = self.camera.view();
        let (light_position, light_color) = match self.scene.lights().first() {
            Some(light) => (view.transform_point3(light.position), light.color),
            None => (Vec3::ZERO, Vec3::ZERO),
        };

        SceneUniforms {
            model_view: (view * node.transform.matrix()).to_cols_array_2d(),
            projection: self.camera.projection().to_cols_array_2d(),
            light_position: light_position.extend(1.0).to_array(),
            light_color: light_color.extend(1.0).to_array(),
            resolution: self.resolution,
            time: self.time,
            _pad: 0.0,
        }
    }
}
