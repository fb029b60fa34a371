//! Command-line configuration.

use std::path::PathBuf;

pub const DEFAULT_VERTEX: &str = "shaders/vertex.wgsl";
pub const DEFAULT_FRAGMENT: &str = "shaders/fragment.wgsl";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub backends: wgpu::Backends,
    pub width: u32,
    pub height: u32,
    pub show_fps: bool,
    pub root: PathBuf,
    pub vertex: String,
    pub fragment: String,
    pub max_frames: Option<u64>,
    pub log_filter: Option<String>,
    /// Problems found while parsing; logged once the logger is up.
    pub warnings: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            width: 1280,
            height: 720,
            show_fps: false,
            root: PathBuf::from("."),
            vertex: DEFAULT_VERTEX.to_string(),
            fragment: DEFAULT_FRAGMENT.to_string(),
            max_frames: None,
            log_filter: None,
            warnings: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Parse `--key=value` style flags; the program name must already be skipped.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cfg = Self::default();

        for arg in args {
            let arg = arg.as_ref();
            if arg == "--show-fps" {
                cfg.show_fps = true;
            } else if let Some(val) = arg.strip_prefix("--show-fps=") {
                cfg.show_fps = matches!(
                    val.to_ascii_lowercase().as_str(),
                    "1" | "true" | "on" | "yes"
                );
            } else if let Some(val) = arg.strip_prefix("--gpu-backend=") {
                cfg.backends = parse_backend(val).unwrap_or_else(|| {
                    cfg.warnings
                        .push(format!("Unknown backend '{val}', falling back to auto."));
                    wgpu::Backends::all()
                });
            } else if let Some(val) = arg.strip_prefix("--size=") {
                match val.split_once(['x', 'X']) {
                    Some((w, h)) => {
                        cfg.width = parse_dim(w, cfg.width, &mut cfg.warnings);
                        cfg.height = parse_dim(h, cfg.height, &mut cfg.warnings);
                    }
                    None => cfg
                        .warnings
                        .push(format!("Ignoring malformed --size '{val}', expected WxH.")),
                }
            } else if let Some(val) = arg.strip_prefix("--width=") {
                cfg.width = parse_dim(val, cfg.width, &mut cfg.warnings);
            } else if let Some(val) = arg.strip_prefix("--height=") {
                cfg.height = parse_dim(val, cfg.height, &mut cfg.warnings);
            } else if let Some(val) = arg.strip_prefix("--vertex=") {
                cfg.vertex = val.to_string();
            } else if let Some(val) = arg.strip_prefix("--fragment=") {
                cfg.fragment = val.to_string();
            } else if let Some(val) = arg.strip_prefix("--root=") {
                cfg.root = PathBuf::from(val);
            } else if let Some(val) = arg.strip_prefix("--max-frames=") {
                match val.parse::<u64>() {
                    Ok(n) => cfg.max_frames = Some(n),
                    Err(_) => cfg
                        .warnings
                        .push(format!("Ignoring invalid --max-frames '{val}'.")),
                }
            } else if let Some(val) = arg.strip_prefix("--log=") {
                cfg.log_filter = Some(val.to_string());
            } else {
                cfg.warnings.push(format!("Ignoring unknown argument '{arg}'."));
            }
        }

        cfg
    }
}

fn parse_backend(val: &str) -> Option<wgpu::Backends> {
    let backends = match val.to_ascii_lowercase().as_str() {
        "auto" => wgpu::Backends::all(),
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" | "d3d12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" | "opengl" | "gles" => wgpu::Backends::GL,
        _ => return None,
    };
    Some(backends)
}

fn parse_dim(val: &str, current: u32, warnings: &mut Vec<String>) -> u32 {
    match val.parse::<u32>() {
        Ok(v) => v.max(1),
        Err(_) => {
            warnings.push(format!("Ignoring invalid window dimension '{val}'."));
            current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_flags() {
        let cfg = AppConfig::from_args(std::iter::empty::<&str>());
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.vertex, "shaders/vertex.wgsl");
        assert_eq!(cfg.fragment, "shaders/fragment.wgsl");
        assert_eq!((cfg.width, cfg.height), (1280, 720));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = AppConfig::from_args([
            "--gpu-backend=Vulkan",
            "--size=800x600",
            "--vertex=shader/vertex.vert",
            "--fragment=shader/fragment.frag",
            "--root=/srv/demo",
            "--max-frames=120",
            "--show-fps",
            "--log=debug",
        ]);
        assert_eq!(cfg.backends, wgpu::Backends::VULKAN);
        assert_eq!((cfg.width, cfg.height), (800, 600));
        assert_eq!(cfg.vertex, "shader/vertex.vert");
        assert_eq!(cfg.fragment, "shader/fragment.frag");
        assert_eq!(cfg.root, PathBuf::from("/srv/demo"));
        assert_eq!(cfg.max_frames, Some(120));
        assert!(cfg.show_fps);
        assert_eq!(cfg.log_filter.as_deref(), Some("debug"));
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn bad_values_fall_back_with_warnings() {
        let cfg = AppConfig::from_args([
            "--gpu-backend=glide",
            "--width=abc",
            "--height=0",
            "--max-frames=-1",
            "--bogus",
        ]);
        assert_eq!(cfg.backends, wgpu::Backends::all());
        assert_eq!(cfg.width, 1280);
        assert_eq!(cfg.height, 1);
        assert_eq!(cfg.max_frames, None);
        assert_eq!(cfg.warnings.len(), 4);
    }
}
