use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::models::{DownloadOutcome, DownloadTarget};

const USER_AGENT: &str = "unsplash-scraper/0.1";
const IMAGE_EXTENSION: &str = "jpg";

// ── Error types ──────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("upstream returned {0}")]
    Status(u16),
    #[error("body stream failed: {0}")]
    Body(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("invalid url {0:?}")]
    InvalidUrl(String),
    #[error("url {0:?} has no file name")]
    NoFileName(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

// ── Fetcher ──────────────────────────────────────────────────────────────────

pub type ByteStream = BoxStream<'static, Result<Bytes, FetchError>>;

/// Issues a GET and hands back the response body as a stream of chunks.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ByteStream, FetchError>;
}

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<ByteStream, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Request(format!("TimeoutError: {}", e))
            } else if e.is_connect() {
                FetchError::Request(format!("ConnectError: {}", e))
            } else {
                FetchError::Request(format!("RequestError: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| FetchError::Body(e.to_string())))
            .boxed())
    }
}

// ── Downloader ───────────────────────────────────────────────────────────────

/// Saves images under `<library>/<folder>/<last path segment>.jpg`.
pub struct Downloader<F: Fetcher> {
    fetcher: F,
    library: PathBuf,
    concurrency: Option<usize>,
}

impl<F: Fetcher> Downloader<F> {
    pub fn with_fetcher(library: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            fetcher,
            library: library.into(),
            concurrency: None,
        }
    }

    /// Cap the number of downloads in flight. `None` launches them all at once.
    pub fn concurrency(mut self, limit: Option<usize>) -> Self {
        self.concurrency = limit.filter(|n| *n > 0);
        self
    }

    pub fn folder_path(&self, folder: &str) -> PathBuf {
        self.library.join(folder)
    }

    /// Create the library root if it is missing.
    pub async fn prepare(&self) -> io::Result<()> {
        fs::create_dir_all(&self.library).await
    }

    /// Create `<library>/<folder>` if it is missing. Safe to call repeatedly;
    /// returns whether this call created it.
    pub async fn ensure_folder(&self, folder: &str) -> io::Result<bool> {
        let path = self.folder_path(folder);
        if fs::try_exists(&path).await? {
            return Ok(false);
        }
        fs::create_dir_all(&path).await?;
        tracing::debug!("created {}", path.display());
        Ok(true)
    }

    pub fn target(&self, index: usize, url: &str, folder: &Path) -> Result<DownloadTarget, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::InvalidUrl(url.to_string()))?;
        let name = parsed
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DownloadError::NoFileName(url.to_string()))?;

        Ok(DownloadTarget {
            index,
            url: url.to_string(),
            destination: folder.join(format!("{}.{}", name, IMAGE_EXTENSION)),
        })
    }

    /// Download every URL into `folder` and wait for all of them to settle.
    ///
    /// One failure never affects the others; outcomes come back in input order.
    pub async fn download_all(&self, urls: &[String], folder: &str) -> io::Result<Vec<DownloadOutcome>> {
        self.ensure_folder(folder).await?;
        let folder_path = self.folder_path(folder);
        let limit = self.concurrency.unwrap_or(urls.len()).max(1);

        let mut outcomes: Vec<DownloadOutcome> = stream::iter(urls.iter().enumerate())
            .map(|(index, url)| self.download_one(index, url, &folder_path))
            .buffer_unordered(limit)
            .collect()
            .await;

        outcomes.sort_by_key(DownloadOutcome::index);
        Ok(outcomes)
    }

    async fn download_one(&self, index: usize, url: &str, folder: &Path) -> DownloadOutcome {
        let result = match self.target(index, url, folder) {
            Ok(target) => self.save(&target).await.map(|bytes| (target.destination, bytes)),
            Err(e) => Err(e),
        };

        match result {
            Ok((path, bytes)) => {
                tracing::info!(index, bytes, "image download complete");
                DownloadOutcome::Success {
                    index,
                    url: url.to_string(),
                    path,
                    bytes,
                }
            }
            Err(e) => {
                tracing::warn!(index, url, error = %e, "image download failed");
                DownloadOutcome::Failed {
                    index,
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn save(&self, target: &DownloadTarget) -> Result<u64, DownloadError> {
        let mut body = self.fetcher.fetch(&target.url).await?;

        let mut file = fs::File::create(&target.destination).await?;
        match write_body(&mut file, &mut body).await {
            Ok(written) => Ok(written),
            Err(e) => {
                drop(file);
                if let Err(rm) = fs::remove_file(&target.destination).await {
                    tracing::debug!("could not remove partial {}: {}", target.destination.display(), rm);
                }
                Err(e)
            }
        }
    }
}

impl Downloader<ReqwestFetcher> {
    pub fn new(library: impl Into<PathBuf>, timeout: Option<Duration>) -> Result<Self, FetchError> {
        Ok(Self::with_fetcher(library, ReqwestFetcher::new(timeout)?))
    }
}

async fn write_body(file: &mut fs::File, body: &mut ByteStream) -> Result<u64, DownloadError> {
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
