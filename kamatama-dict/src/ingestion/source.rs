//! Byte sources for corpus locations.

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::{DictError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

/// Forward-only stream of corpus bytes.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Opens a corpus location as a byte stream.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Failing to open the location is `DictError::StreamUnavailable`; later
    /// read failures are reported through the stream itself.
    async fn open(&self, location: &str) -> Result<ByteStream>;
}

/// Streams a response body over HTTP(S).
///
/// `Content-Encoding: gzip` is decoded transparently. The body length is never
/// assumed and there is no timeout once the body starts arriving.
#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CorpusSource for HttpSource {
    async fn open(&self, location: &str) -> Result<ByteStream> {
        info!("Fetching corpus from {}", location);
        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| DictError::unavailable(location, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DictError::unavailable(
                location,
                format!("HTTP status {status}"),
            ));
        }
        debug!(
            "Corpus response {} (content length {:?})",
            status,
            response.content_length()
        );

        Ok(response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed())
    }
}

/// Streams a local file in fixed-size reads.
#[derive(Debug, Clone)]
pub struct FileSource {
    chunk_size: usize,
}

impl FileSource {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

#[async_trait]
impl CorpusSource for FileSource {
    async fn open(&self, location: &str) -> Result<ByteStream> {
        let file = tokio::fs::File::open(location)
            .await
            .map_err(|e| DictError::unavailable(location, e))?;
        info!("Reading corpus from {}", location);
        Ok(ReaderStream::with_capacity(file, self.chunk_size).boxed())
    }
}

/// Dispatches `http://` and `https://` locations to [`HttpSource`] and
/// everything else to [`FileSource`].
#[derive(Debug, Clone, Default)]
pub struct LocationSource {
    http: HttpSource,
    file: FileSource,
}

impl LocationSource {
    pub fn new(http: HttpSource, file: FileSource) -> Self {
        Self { http, file }
    }

    pub fn is_remote(location: &str) -> bool {
        let lower = location.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

#[async_trait]
impl CorpusSource for LocationSource {
    async fn open(&self, location: &str) -> Result<ByteStream> {
        if Self::is_remote(location) {
            self.http.open(location).await
        } else {
            self.file.open(location).await
        }
    }
}
