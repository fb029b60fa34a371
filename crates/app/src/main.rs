//! Entry point for shaderbox.
//! Loads the vertex/fragment pair, then renders the demo scene with it.

mod config;

use anyhow::{Context, Result};
use asset::{FsFetcher, LoadProgress, SequentialTextLoader};
use corelib::{FrameLoop, RenderSession};
use platform::SessionConfig;

use crate::config::AppConfig;

fn init_logging(filter: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(filter) = filter {
        builder.parse_filters(filter);
    }
    builder.init();
}

fn log_progress(p: &LoadProgress<'_>) {
    match p.total {
        Some(total) => log::debug!("{} resource '{}': {}/{} bytes", p.stage, p.url, p.loaded, total),
        None => log::debug!("{} resource '{}': {} bytes", p.stage, p.url, p.loaded),
    }
}

fn main() -> Result<()> {
    let config = AppConfig::from_args(std::env::args().skip(1));
    init_logging(config.log_filter.as_deref());
    for warning in &config.warnings {
        log::warn!("{warning}");
    }

    log::info!(
        "Starting shaderbox. Backend: {:?}, show_fps={}, window_size={}x{}",
        config.backends,
        config.show_fps,
        config.width,
        config.height
    );

    // The runtime lives only for the load; the window loop owns the main thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("failed to start async runtime")?;
    let loader = SequentialTextLoader::new(FsFetcher::new(&config.root));
    let sources = runtime
        .block_on(loader.load(&config.vertex, &config.fragment, log_progress))
        .context("failed to load shader sources")?;
    drop(runtime);

    let session = RenderSession::demo(config.width, config.height);
    let frame_loop = match config.max_frames {
        Some(n) => FrameLoop::new().with_max_frames(n),
        None => FrameLoop::new(),
    };

    platform::run_session(
        SessionConfig {
            width: config.width,
            height: config.height,
            backends: config.backends,
            show_fps: config.show_fps,
            ..SessionConfig::default()
        },
        sources,
        session,
        frame_loop,
    )?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
