//! Loader error types.

use std::io;

use thiserror::Error;

use crate::loader::LoadStage;

/// Failure of a single text fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("resource identifier is empty")]
    EmptyUrl,
    #[error("resource not found: {url}")]
    NotFound { url: String },
    #[error("failed to read {url}")]
    Io {
        url: String,
        #[source]
        source: io::Error,
    },
    #[error("{url} is not valid UTF-8 text")]
    InvalidUtf8 { url: String },
}

impl FetchError {
    pub(crate) fn from_io(url: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                url: url.to_owned(),
            },
            _ => Self::Io {
                url: url.to_owned(),
                source: err,
            },
        }
    }
}

/// Terminal failure of a load sequence.
///
/// Carries the step that failed so callers can tell the two resources apart.
#[derive(Debug, Error)]
#[error("failed to load {stage} resource '{url}'")]
pub struct LoadError {
    pub stage: LoadStage,
    pub url: String,
    #[source]
    pub source: FetchError,
}
