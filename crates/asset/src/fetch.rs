//! Fetch mechanisms: where text resources come from.

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

use tokio::{fs::File, io::AsyncReadExt};

use crate::error::FetchError;

/// Read granularity of [`FsFetcher`]; one progress event per chunk.
const CHUNK_SIZE: usize = 8 * 1024;

/// Identifies one text resource (URL or path).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceRequest {
    pub url: String,
}

impl ResourceRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Asynchronous source of text resources.
///
/// `progress` receives `(loaded_bytes, total_bytes)` zero or more times
/// before the returned future resolves.
#[allow(async_fn_in_trait)]
pub trait TextFetcher {
    async fn fetch(
        &self,
        request: &ResourceRequest,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<String, FetchError>;
}

impl<T: TextFetcher> TextFetcher for &T {
    async fn fetch(
        &self,
        request: &ResourceRequest,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<String, FetchError> {
        (**self).fetch(request, progress).await
    }
}

/// Reads resources from the local filesystem.
///
/// Relative identifiers resolve against `root`; a leading `file://` is
/// accepted and stripped. File I/O runs on Tokio's blocking pool, so the
/// returned future must be polled inside a Tokio runtime and suspends at
/// every open and chunk read.
#[derive(Clone, Debug)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an identifier to the path that will be opened.
    pub fn resolve(&self, url: &str) -> PathBuf {
        let raw = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl Default for FsFetcher {
    fn default() -> Self {
        Self::new(".")
    }
}

impl TextFetcher for FsFetcher {
    async fn fetch(
        &self,
        request: &ResourceRequest,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<String, FetchError> {
        let url = request.url.as_str();
        if url.trim().is_empty() {
            return Err(FetchError::EmptyUrl);
        }

        let path = self.resolve(url);
        let mut file = File::open(&path)
            .await
            .map_err(|e| FetchError::from_io(url, e))?;
        let total = file.metadata().await.ok().map(|m| m.len());

        let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            let n = match file.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FetchError::from_io(url, e)),
            };
            bytes.extend_from_slice(&chunk[..n]);
            progress(bytes.len() as u64, total);
        }

        String::from_utf8(bytes).map_err(|_| FetchError::InvalidUtf8 {
            url: url.to_owned(),
        })
    }
}

/// In-memory resources keyed by identifier.
#[derive(Clone, Debug, Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(url, text);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(url.into(), text.into());
    }
}

impl TextFetcher for MemoryFetcher {
    async fn fetch(
        &self,
        request: &ResourceRequest,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<String, FetchError> {
        if request.url.trim().is_empty() {
            return Err(FetchError::EmptyUrl);
        }
        let text = self
            .entries
            .get(&request.url)
            .ok_or_else(|| FetchError::NotFound {
                url: request.url.clone(),
            })?;
        let len = text.len() as u64;
        progress(len, Some(len));
        Ok(text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{fs, future::poll_fn, pin::pin};

    async fn fetch_text(
        fetcher: &impl TextFetcher,
        url: &str,
    ) -> (Result<String, FetchError>, Vec<(u64, Option<u64>)>) {
        let mut events = Vec::new();
        let result = fetcher
            .fetch(&ResourceRequest::new(url), &mut |loaded: u64, total: Option<u64>| {
                events.push((loaded, total))
            })
            .await;
        (result, events)
    }

    #[tokio::test]
    async fn fs_fetcher_reads_relative_to_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("shader")).expect("mkdir");
        fs::write(dir.path().join("shader/vertex.vert"), "VERTEX").expect("write");

        let fetcher = FsFetcher::new(dir.path());
        let (result, events) = fetch_text(&fetcher, "shader/vertex.vert").await;
        assert_eq!(result.expect("fetch"), "VERTEX");
        assert_eq!(events, vec![(6, Some(6))]);
    }

    #[tokio::test]
    async fn fs_fetcher_accepts_file_scheme() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        fs::write(&path, "text").expect("write");

        let fetcher = FsFetcher::default();
        let url = format!("file://{}", path.display());
        let (result, _) = fetch_text(&fetcher, &url).await;
        assert_eq!(result.expect("fetch"), "text");
    }

    #[tokio::test]
    async fn fs_fetcher_reports_chunked_progress() {
        let dir = tempfile::tempdir().expect("tempdir");
        let body = "x".repeat(CHUNK_SIZE * 2 + 17);
        fs::write(dir.path().join("big.wgsl"), &body).expect("write");

        let fetcher = FsFetcher::new(dir.path());
        let (result, events) = fetch_text(&fetcher, "big.wgsl").await;
        assert_eq!(result.expect("fetch").len(), body.len());

        let total = body.len() as u64;
        assert!(events.len() >= 2);
        assert!(events.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(events.last(), Some(&(total, Some(total))));
    }

    #[tokio::test]
    async fn fs_fetcher_missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fetcher = FsFetcher::new(dir.path());
        let (result, events) = fetch_text(&fetcher, "missing.txt").await;
        assert!(matches!(result, Err(FetchError::NotFound { url }) if url == "missing.txt"));
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn fs_fetcher_rejects_binary_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00]).expect("write");
        let fetcher = FsFetcher::new(dir.path());
        let (result, _) = fetch_text(&fetcher, "blob.bin").await;
        assert!(matches!(result, Err(FetchError::InvalidUtf8 { .. })));
    }

    #[tokio::test]
    async fn fs_fetcher_directory_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("shaders")).expect("mkdir");
        let fetcher = FsFetcher::new(dir.path());
        let (result, events) = fetch_text(&fetcher, "shaders").await;
        assert!(matches!(result, Err(FetchError::Io { url, .. }) if url == "shaders"));
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn fs_fetcher_suspends_while_reading() {
        let dir = tempfile::tempdir().expect("tempdir");
        let body = "y".repeat(CHUNK_SIZE * 64);
        fs::write(dir.path().join("large.wgsl"), &body).expect("write");

        let fetcher = FsFetcher::new(dir.path());
        let request = ResourceRequest::new("large.wgsl");
        let mut chunks = 0usize;
        let mut pending = 0usize;
        let text = {
            let mut count = |_: u64, _: Option<u64>| chunks += 1;
            let mut fetch = pin!(fetcher.fetch(&request, &mut count));
            poll_fn(|cx| {
                let poll = fetch.as_mut().poll(cx);
                if poll.is_pending() {
                    pending += 1;
                }
                poll
            })
            .await
        }
        .expect("fetch");

        assert_eq!(text.len(), body.len());
        // open and reads run off the polling thread
        assert!(pending > 0);
        assert!(chunks >= 64);
    }

    #[tokio::test]
    async fn empty_identifier_is_rejected() {
        let (result, _) = fetch_text(&FsFetcher::default(), "  ").await;
        assert!(matches!(result, Err(FetchError::EmptyUrl)));
        let (result, _) = fetch_text(&MemoryFetcher::new(), "").await;
        assert!(matches!(result, Err(FetchError::EmptyUrl)));
    }

    #[tokio::test]
    async fn memory_fetcher_serves_inserted_text() {
        let fetcher = MemoryFetcher::new().with("a.txt", "hello");
        let (result, events) = fetch_text(&fetcher, "a.txt").await;
        assert_eq!(result.expect("fetch"), "hello");
        assert_eq!(events, vec![(5, Some(5))]);

        let (result, _) = fetch_text(&fetcher, "b.txt").await;
        assert!(matches!(result, Err(FetchError::NotFound { .. })));
    }
}
