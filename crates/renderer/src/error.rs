use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("{stage} shader rejected: {message}")]
    Shader { stage: &'static str, message: String },
    #[error("render pipeline rejected: {0}")]
    Pipeline(String),
}
