//! Asset loading: shader sources and CPU-side meshes.
//! Shader text is fetched through a [`TextFetcher`] and delivered as a
//! [`ShaderSources`] pair by the [`SequentialTextLoader`].

pub mod error;
pub mod fetch;
pub mod loader;
pub mod mesh;

pub use error::{FetchError, LoadError};
pub use fetch::{FsFetcher, MemoryFetcher, ResourceRequest, TextFetcher};
pub use loader::{LoadCallbacks, LoadProgress, LoadStage, SequentialTextLoader, ShaderSources};
