//! Sequential loading of a vertex/fragment shader source pair.
//!
//! The first resource is fetched, then the second; the pair is only
//! produced once both fetches succeeded, in that order. A failure at either
//! step ends the sequence.

use std::fmt;

use crate::{
    error::LoadError,
    fetch::{ResourceRequest, TextFetcher},
};

/// Which step of the load sequence an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadStage {
    First,
    Second,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStage::First => f.write_str("first"),
            LoadStage::Second => f.write_str("second"),
        }
    }
}

/// Progress of one underlying fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadProgress<'a> {
    pub stage: LoadStage,
    pub url: &'a str,
    pub loaded: u64,
    pub total: Option<u64>,
}

/// Result of a completed load: both texts, in request order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

type OnLoad<'a> = Box<dyn FnOnce(String, String) + 'a>;
type OnProgress<'a> = Box<dyn FnMut(&LoadProgress<'_>) + 'a>;
type OnError<'a> = Box<dyn FnOnce(LoadError) + 'a>;

/// Handlers for one callback-style load.
pub struct LoadCallbacks<'a> {
    on_load: OnLoad<'a>,
    on_progress: Option<OnProgress<'a>>,
    on_error: Option<OnError<'a>>,
}

impl<'a> LoadCallbacks<'a> {
    pub fn new(on_load: impl FnOnce(String, String) + 'a) -> Self {
        Self {
            on_load: Box::new(on_load),
            on_progress: None,
            on_error: None,
        }
    }

    pub fn on_progress(mut self, on_progress: impl FnMut(&LoadProgress<'_>) + 'a) -> Self {
        self.on_progress = Some(Box::new(on_progress));
        self
    }

    pub fn on_error(mut self, on_error: impl FnOnce(LoadError) + 'a) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }
}

impl fmt::Debug for LoadCallbacks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadCallbacks")
            .field("on_progress", &self.on_progress.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

/// Fetches two text resources one after the other.
///
/// Holds nothing but the fetcher, so independent loads on the same loader
/// share no state.
#[derive(Clone, Debug, Default)]
pub struct SequentialTextLoader<F> {
    fetcher: F,
}

impl<F: TextFetcher> SequentialTextLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch `first_url`, then `second_url`.
    ///
    /// The second fetch is only issued after the first succeeded.
    /// `on_progress` sees events from both fetches and nothing after the
    /// returned future resolves.
    pub async fn load(
        &self,
        first_url: &str,
        second_url: &str,
        mut on_progress: impl FnMut(&LoadProgress<'_>),
    ) -> Result<ShaderSources, LoadError> {
        let vertex = self
            .fetch_stage(LoadStage::First, first_url, &mut on_progress)
            .await?;
        let fragment = self
            .fetch_stage(LoadStage::Second, second_url, &mut on_progress)
            .await?;
        Ok(ShaderSources { vertex, fragment })
    }

    /// Callback flavour of [`load`](Self::load).
    ///
    /// `on_load` runs at most once, in the same poll that completed the
    /// second fetch. Without an error handler a failure is only logged.
    pub async fn load_with(&self, first_url: &str, second_url: &str, callbacks: LoadCallbacks<'_>) {
        let LoadCallbacks {
            on_load,
            mut on_progress,
            on_error,
        } = callbacks;

        let result = self
            .load(first_url, second_url, |progress| {
                if let Some(cb) = on_progress.as_mut() {
                    cb(progress);
                }
            })
            .await;

        match result {
            Ok(ShaderSources { vertex, fragment }) => on_load(vertex, fragment),
            Err(err) => match on_error {
                Some(cb) => cb(err),
                None => log::warn!("unhandled load failure: {err}"),
            },
        }
    }

    async fn fetch_stage(
        &self,
        stage: LoadStage,
        url: &str,
        on_progress: &mut impl FnMut(&LoadProgress<'_>),
    ) -> Result<String, LoadError> {
        log::debug!("fetching {stage} resource '{url}'");
        let request = ResourceRequest::new(url);
        let mut report = |loaded: u64, total: Option<u64>| {
            on_progress(&LoadProgress {
                stage,
                url,
                loaded,
                total,
            });
        };

        match self.fetcher.fetch(&request, &mut report).await {
            Ok(text) => {
                log::info!("loaded {stage} resource '{url}' ({} bytes)", text.len());
                Ok(text)
            }
            Err(source) => Err(LoadError {
                stage,
                url: url.to_owned(),
                source,
            }),
        }
    }
}
