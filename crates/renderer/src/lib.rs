//! Renderer: wgpu init + depth + custom shader material over a [`RenderSession`].
//! wgpu = 26.x, winit = 0.30.x

mod error;

use std::sync::Arc;

use asset::{
    ShaderSources,
    mesh::{MeshData, MeshVertex},
};
use bytemuck::{Pod, Zeroable};
use corelib::{RenderSession, SceneUniforms, scene::MeshKind};
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device, DeviceDescriptor,
    ErrorFilter, Extent3d, FragmentState, Instance, InstanceDescriptor, Limits, LoadOp,
    Operations, PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    ShaderModule, ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp, Surface,
    SurfaceConfiguration, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureView, TextureViewDescriptor, VertexBufferLayout, VertexState,
    VertexStepMode, util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

pub use error::RenderError;
pub use wgpu::{Backends, SurfaceError};

/// Vertex: position + normal + uv (locations 0, 1, 2).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
    };
}

impl From<&MeshVertex> for Vertex {
    fn from(v: &MeshVertex) -> Self {
        Self {
            position: v.position,
            normal: v.normal,
            uv: v.uv,
        }
    }
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// GPU buffers for one scene node.
struct NodeBuffers {
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,
    uniform_buf: Buffer,
    bind_group: BindGroup,
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Material
    pipeline: RenderPipeline,
    nodes: Vec<NodeBuffers>,

    // Depth
    depth_view: TextureView,
}

impl GpuState {
    /// Create GPU state bound to an `Arc<Window>` and compile the loaded
    /// vertex/fragment pair into the material pipeline.
    pub async fn new(
        window: Arc<Window>,
        backends: Backends,
        sources: &ShaderSources,
        session: &RenderSession,
    ) -> Result<Self, RenderError> {
        let PhysicalSize { width, height } = window.inner_size();

        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("shaderbox device"),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                ..Default::default()
            })
            .await?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or_default(),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders: one module per loaded source ====
        let vertex_module = compile_wgsl(&device, "vertex", &sources.vertex).await?;
        let fragment_module = compile_wgsl(&device, "fragment", &sources.fragment).await?;

        // ==== Scene uniforms BGL ====
        let uniform_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Scene BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(SceneUniforms::SIZE),
                },
                count: None,
            }],
        });

        let pipeline = create_pipeline(
            &device,
            &uniform_bgl,
            &vertex_module,
            &fragment_module,
            surface_format,
        )
        .await?;

        let nodes = session
            .scene()
            .nodes()
            .iter()
            .map(|node| {
                let mesh = mesh_for(node.mesh);
                create_node_buffers(&device, &uniform_bgl, &mesh, &session.uniforms_for(node))
            })
            .collect();

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline,
            nodes,
            depth_view,
        })
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width.max(1);
        self.surface_config.height = height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    /// Render one frame: upload uniforms + clear + draw every node.
    pub fn render(&mut self, session: &RenderSession) -> Result<(), SurfaceError> {
        for (node, buffers) in session.scene().nodes().iter().zip(&self.nodes) {
            let uniforms = session.uniforms_for(node);
            self.queue
                .write_buffer(&buffers.uniform_buf, 0, bytemuck::bytes_of(&uniforms));
        }

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color::BLACK),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            for node in &self.nodes {
                rpass.set_bind_group(0, &node.bind_group, &[]);
                rpass.set_vertex_buffer(0, node.vertex_buf.slice(..));
                rpass.set_index_buffer(node.index_buf.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..node.index_count, 0, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.surface_config.width, self.surface_config.height);
    }
}

/// Compile WGSL, surfacing validation errors instead of panicking.
async fn compile_wgsl(
    device: &Device,
    stage: &'static str,
    source: &str,
) -> Result<ShaderModule, RenderError> {
    device.push_error_scope(ErrorFilter::Validation);
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(stage),
        source: ShaderSource::Wgsl(source.into()),
    });
    match device.pop_error_scope().await {
        Some(err) => Err(RenderError::Shader {
            stage,
            message: err.to_string(),
        }),
        None => Ok(module),
    }
}

async fn create_pipeline(
    device: &Device,
    uniform_bgl: &BindGroupLayout,
    vertex_module: &ShaderModule,
    fragment_module: &ShaderModule,
    surface_format: TextureFormat,
) -> Result<RenderPipeline, RenderError> {
    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("Material PipelineLayout"),
        bind_group_layouts: &[uniform_bgl],
        push_constant_ranges: &[],
    });

    device.push_error_scope(ErrorFilter::Validation);
    // Entry points are resolved from each module's single vertex/fragment fn.
    let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("Material Pipeline"),
        layout: Some(&layout),
        vertex: VertexState {
            module: vertex_module,
            entry_point: None,
            buffers: &[Vertex::LAYOUT],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: fragment_module,
            entry_point: None,
            targets: &[Some(ColorTargetState {
                format: surface_format,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    match device.pop_error_scope().await {
        Some(err) => Err(RenderError::Pipeline(err.to_string())),
        None => Ok(pipeline),
    }
}

fn mesh_for(kind: MeshKind) -> MeshData {
    match kind {
        MeshKind::Box {
            width,
            height,
            depth,
        } => MeshData::cuboid(width, height, depth),
    }
}

fn create_node_buffers(
    device: &Device,
    uniform_bgl: &BindGroupLayout,
    mesh: &MeshData,
    uniforms: &SceneUniforms,
) -> NodeBuffers {
    let vertices: Vec<Vertex> = mesh.vertices.iter().map(Vertex::from).collect();

    let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Node VB"),
        contents: bytemuck::cast_slice(&vertices),
        usage: BufferUsages::VERTEX,
    });
    let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Node IB"),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: BufferUsages::INDEX,
    });
    let uniform_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Scene UBO"),
        contents: bytemuck::bytes_of(uniforms),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Scene BG"),
        layout: uniform_bgl,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buf.as_entire_binding(),
        }],
    });

    NodeBuffers {
        vertex_buf,
        index_buf,
        index_count: mesh.indices.len() as u32,
        uniform_buf,
        bind_group,
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(Vertex::LAYOUT.array_stride, 32);
        assert_eq!(Vertex::LAYOUT.attributes.len(), 3);
        assert_eq!(Vertex::LAYOUT.attributes[2].offset, 24);
    }

    #[test]
    fn box_node_maps_to_cuboid() {
        let mesh = mesh_for(MeshKind::UNIT_BOX);
        assert_eq!(mesh, MeshData::cuboid(1.0, 1.0, 1.0));
        let first = Vertex::from(&mesh.vertices[0]);
        assert_eq!(first.position, mesh.vertices[0].position);
    }

    #[test]
    fn default_shaders_validate() {
        use naga::valid::{Capabilities, ValidationFlags, Validator};

        for (name, src) in [
            ("vertex", include_str!("../../../shaders/vertex.wgsl")),
            ("fragment", include_str!("../../../shaders/fragment.wgsl")),
        ] {
            let module = match naga::front::wgsl::parse_str(src) {
                Ok(module) => module,
                Err(err) => panic!("{name} shader: {}", err.emit_to_string(src)),
            };
            assert_eq!(module.entry_points.len(), 1, "{name} shader entry points");
            Validator::new(ValidationFlags::all(), Capabilities::all())
                .validate(&module)
                .unwrap_or_else(|err| panic!("{name} shader invalid: {err:?}"));
        }
    }
}
