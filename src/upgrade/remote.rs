//! Remote artifact sources.
//!
//! A [`Remote`] turns a URL into a byte stream and, separately, reports when
//! the resource was last modified. [`HttpRemote`] serves `http(s)://`
//! through reqwest and `file://` straight from the local filesystem.

use crate::core::UpdateError;
use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest::header::LAST_MODIFIED;
use std::future::Future;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

const FILE_CHUNK_SIZE: usize = 64 * 1024;

/// A byte stream opened from a remote location.
pub trait RemoteStream: Send {
    /// Next chunk of bytes, or `None` at the end of the stream.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, UpdateError>> + Send;
}

/// Capability to read artifacts from remote locations.
pub trait Remote: Send + Sync {
    type Stream: RemoteStream;

    /// Open `url` for reading.
    fn open(&self, url: &Url) -> impl Future<Output = Result<Self::Stream, UpdateError>> + Send;

    /// Last modification time of `url`, or `None` if the remote does not
    /// report one.
    fn last_modified(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<Option<DateTime<Utc>>, UpdateError>> + Send;
}

impl<T: Remote> Remote for &T {
    type Stream = T::Stream;

    fn open(&self, url: &Url) -> impl Future<Output = Result<Self::Stream, UpdateError>> + Send {
        (**self).open(url)
    }

    fn last_modified(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<Option<DateTime<Utc>>, UpdateError>> + Send {
        (**self).last_modified(url)
    }
}

/// [`Remote`] for `http://`, `https://` and `file://` locations.
#[derive(Debug, Clone, Default)]
pub struct HttpRemote {
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client, e.g. one with a proxy.
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<reqwest::Response, UpdateError> {
        let response = request.send().await.map_err(|e| fetch_error(url, &e))?;

        if !response.status().is_success() {
            warn!("Remote {} answered HTTP {}", url, response.status());
            return Err(UpdateError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        Ok(response)
    }
}

impl Remote for HttpRemote {
    type Stream = HttpStream;

    async fn open(&self, url: &Url) -> Result<HttpStream, UpdateError> {
        debug!("Opening remote {}", url);
        match url.scheme() {
            "http" | "https" => {
                let response = self.send(self.client.get(url.clone()), url).await?;
                Ok(HttpStream::Http {
                    response,
                    url: url.clone(),
                })
            }
            "file" => {
                let path = file_path(url)?;
                let file = tokio::fs::File::open(&path)
                    .await
                    .map_err(|e| UpdateError::io("open remote file", &path, e))?;
                Ok(HttpStream::File {
                    file,
                    path,
                })
            }
            _ => Err(UpdateError::UnsupportedScheme {
                url: url.to_string(),
            }),
        }
    }

    async fn last_modified(&self, url: &Url) -> Result<Option<DateTime<Utc>>, UpdateError> {
        let modified = match url.scheme() {
            "http" | "https" => {
                let response = self.send(self.client.head(url.clone()), url).await?;
                response
                    .headers()
                    .get(LAST_MODIFIED)
                    .and_then(|value| value.to_str().ok())
                    .and_then(parse_http_date)
            }
            "file" => {
                let path = file_path(url)?;
                let metadata = tokio::fs::metadata(&path)
                    .await
                    .map_err(|e| UpdateError::io("read metadata of", &path, e))?;
                metadata.modified().ok().map(DateTime::<Utc>::from)
            }
            _ => {
                return Err(UpdateError::UnsupportedScheme {
                    url: url.to_string(),
                });
            }
        };

        let modified = modified.filter(|time| time.timestamp() != 0);
        debug!("Remote {} last modified: {:?}", url, modified);
        Ok(modified)
    }
}

/// Stream returned by [`HttpRemote::open`].
#[derive(Debug)]
pub enum HttpStream {
    Http {
        response: reqwest::Response,
        url: Url,
    },
    File {
        file: tokio::fs::File,
        path: std::path::PathBuf,
    },
}

impl RemoteStream for HttpStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, UpdateError> {
        match self {
            Self::Http {
                response,
                url,
            } => {
                let chunk = response.chunk().await.map_err(|e| fetch_error(url, &e))?;
                Ok(chunk.map(|bytes| bytes.to_vec()))
            }
            Self::File {
                file,
                path,
            } => {
                let mut buffer = vec![0; FILE_CHUNK_SIZE];
                let read = file.read(&mut buffer).await.map_err(|e| UpdateError::io("read", path, e))?;
                if read == 0 {
                    return Ok(None);
                }
                buffer.truncate(read);
                Ok(Some(buffer))
            }
        }
    }
}

/// Parse an HTTP date (`Last-Modified`) into UTC.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value).ok().map(|time| time.with_timezone(&Utc))
}

fn file_path(url: &Url) -> Result<std::path::PathBuf, UpdateError> {
    url.to_file_path().map_err(|()| UpdateError::Fetch {
        url: url.to_string(),
        reason: "not a local file path".to_string(),
    })
}

fn fetch_error(url: &Url, error: &reqwest::Error) -> UpdateError {
    UpdateError::Fetch {
        url: url.to_string(),
        reason: error.to_string(),
    }
}
