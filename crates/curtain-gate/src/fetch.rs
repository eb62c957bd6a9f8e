//! Resource fetchers.
//!
//! A [`ResourceFetcher`] performs one best-effort fetch of one URL and
//! reports the number of bytes received. Fetchers never retry; the
//! preloader turns every error into a settled `Failed` outcome.
//!
//! Two implementations are provided:
//!
//! - [`FsFetcher`] reads assets from a local directory (a built site's
//!   `public/` folder).
//! - [`HttpFetcher`] downloads assets from an HTTP(S) origin.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::{Buf, Bytes};
use http::{Request, Uri, header};
use http_body_util::{BodyExt, Empty};
use hyper::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Asset root used when no fetcher is configured.
pub const DEFAULT_ASSET_ROOT: &str = "public";

/// User agent sent by [`HttpFetcher`].
const USER_AGENT: &str = concat!("curtain/", env!("CARGO_PKG_VERSION"));

/// Read size for local assets.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Errors from a single fetch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The URL cannot be mapped to a fetchable location.
    #[error("invalid resource URL {url:?}: {reason}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The resource does not exist.
    #[error("resource not found: {url}")]
    NotFound {
        /// Resource URL.
        url: String,
    },

    /// Local I/O failed.
    #[error("failed to read {url}: {error}")]
    Io {
        /// Resource URL.
        url: String,
        /// Underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The origin answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Resource URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The request could not be completed.
    #[error("request for {url} failed: {message}")]
    Network {
        /// Resource URL.
        url: String,
        /// Transport error message.
        message: String,
    },
}

/// One-shot resource fetch.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetches `url` in full and returns the number of bytes received.
    async fn fetch(&self, url: &str) -> Result<u64, FetchError>;
}

// =============================================================================
// Local directory
// =============================================================================

/// Fetches assets from a local directory.
///
/// Site-absolute URLs (`/images/x.jpg`) resolve relative to the root. A URL
/// that would escape the root is rejected without touching the filesystem.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    /// Creates a fetcher rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the asset root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a URL to a path under the asset root.
    ///
    /// Query strings and fragments are dropped and the path is
    /// percent-decoded; `..`, absolute and prefix components are rejected
    /// after decoding.
    pub fn resolve(&self, url: &str) -> Result<PathBuf, FetchError> {
        let raw = url.split(['?', '#']).next().unwrap_or_default();
        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|e| FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("path is not UTF-8 after decoding: {e}"),
            })?;
        let path = decoded.trim_start_matches('/');

        if path.is_empty() {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: "no path".to_string(),
            });
        }

        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {},
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(FetchError::InvalidUrl {
                        url: url.to_string(),
                        reason: "path escapes the asset root".to_string(),
                    });
                },
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl ResourceFetcher for FsFetcher {
    async fn fetch(&self, url: &str) -> Result<u64, FetchError> {
        let path = self.resolve(url)?;
        let io_error = |error: std::io::Error| {
            if error.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound {
                    url: url.to_string(),
                }
            } else {
                FetchError::Io {
                    url: url.to_string(),
                    error,
                }
            }
        };

        let mut file = tokio::fs::File::open(&path).await.map_err(io_error)?;
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            let read = file.read(&mut chunk).await.map_err(io_error)?;
            if read == 0 {
                return Ok(total);
            }
            total += read as u64;
        }
    }
}

// =============================================================================
// HTTP origin
// =============================================================================

/// Fetches assets from an HTTP(S) origin.
///
/// Relative URLs are joined onto the origin; absolute `http(s)://` URLs are
/// fetched as given. The whole body is downloaded before the fetch
/// settles.
#[derive(Clone)]
pub struct HttpFetcher {
    origin: String,
    client: Client<HttpsConnector<HttpConnector>, Empty<Bytes>>,
}

impl HttpFetcher {
    /// Creates a fetcher for `origin` (for example `https://example.com`).
    pub fn new(origin: &str) -> Result<Self, FetchError> {
        let uri: Uri = origin.parse().map_err(|e: http::uri::InvalidUri| {
            FetchError::InvalidUrl {
                url: origin.to_string(),
                reason: e.to_string(),
            }
        })?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(FetchError::InvalidUrl {
                url: origin.to_string(),
                reason: "origin must include scheme and host".to_string(),
            });
        }

        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            origin: origin.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Returns the origin with any trailing slash removed.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Joins `url` onto the origin.
    #[must_use]
    pub fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.origin, url.trim_start_matches('/'))
        }
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<u64, FetchError> {
        let target = self.absolute_url(url);
        let request = Request::builder()
            .method("GET")
            .uri(&target)
            .header(header::USER_AGENT, USER_AGENT)
            .body(Empty::<Bytes>::new())
            .map_err(|e| FetchError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        debug!(url = %target, "fetching resource");

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e: hyper_util::client::legacy::Error| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        // Drain the body either way so the connection settles like a
        // completed download.
        let bytes = drain_body(response.into_body())
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(bytes)
    }
}

/// Reads `body` to the end frame by frame and returns its length.
async fn drain_body<B>(mut body: B) -> Result<u64, B::Error>
where
    B: Body + Unpin,
{
    let mut total = 0u64;
    while let Some(frame) = body.frame().await {
        if let Some(data) = frame?.data_ref() {
            total += data.remaining() as u64;
        }
    }
    Ok(total)
}
