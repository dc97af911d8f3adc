//! Resource fetching: turn referenced URLs into base64 data URIs.
//!
//! `ResourceFetcher` is the seam to the network. `HttpFetcher` is the default
//! implementation (HTTP(S) through `reqwest`, `file://` through `tokio::fs`);
//! `StaticFetcher` serves preloaded payloads and is handy for offline rendering.

use crate::{Error, RenderConfig, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// MIME type used when neither the response nor the path says otherwise
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// A fetched resource, keyed by the reference it was requested with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// The reference exactly as it appeared in the source text
    pub url: String,
    /// MIME type without parameters
    pub mime: String,
    /// Raw payload
    pub bytes: Vec<u8>,
}

impl Resource {
    /// The payload as a `data:<mime>;base64,...` URI
    pub fn data_uri(&self) -> String {
        to_data_uri(&self.mime, &self.bytes)
    }

    /// The payload decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Encode bytes as a base64 data URI
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Whether a reference is already an inline `data:` URI and needs no fetch
pub fn is_inline(reference: &str) -> bool {
    reference
        .get(..5)
        .map(|p| p.eq_ignore_ascii_case("data:"))
        .unwrap_or(false)
}

/// Guess a MIME type from a path's extension
pub fn guess_mime(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "css" => "text/css",
        "html" | "htm" => "text/html",
        _ => return None,
    };
    Some(mime)
}

/// Source of resource payloads for referenced URLs
pub trait ResourceFetcher: Send + Sync {
    /// Fetch one reference. Non-success responses and transport failures are errors.
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Resource>>;
}

/// Fetch every reference concurrently; results pair one-to-one with `urls`.
///
/// The first failure fails the whole batch. `concurrency == 0` issues all
/// requests at once, otherwise at most `concurrency` are in flight.
pub async fn fetch_all<F>(fetcher: &F, urls: &[String], concurrency: usize) -> Result<Vec<Resource>>
where
    F: ResourceFetcher + ?Sized,
{
    if concurrency == 0 {
        try_join_all(urls.iter().map(|u| fetcher.fetch(u))).await
    } else {
        stream::iter(urls.iter().map(|u| fetcher.fetch(u)))
            .buffered(concurrency)
            .try_collect()
            .await
    }
}

/// Fetches `http(s)://` references with `reqwest` and `file://` references from disk.
///
/// Relative references are resolved against `RenderConfig::base_url`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Option<Url>,
}

impl HttpFetcher {
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::ConfigError(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::ConfigError(format!("Invalid header value for '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .as_deref()
            .map(|b| {
                Url::parse(b).map_err(|e| Error::ConfigError(format!("Invalid base URL '{}': {}", b, e)))
            })
            .transpose()?;

        Ok(Self { client, base_url })
    }

    /// Resolve a reference to an absolute URL
    pub fn resolve(&self, reference: &str) -> Result<Url> {
        match Url::parse(reference) {
            Ok(u) => Ok(u),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| Error::InvalidUrl {
                    url: reference.to_string(),
                    reason: "relative reference and no base URL configured".into(),
                })?;
                base.join(reference).map_err(|e| Error::InvalidUrl {
                    url: reference.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(Error::InvalidUrl {
                url: reference.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn fetch_http(&self, reference: &str, url: Url) -> Result<Resource> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::NetworkError(format!("GET {} failed: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let declared = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty());

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::NetworkError(format!("Failed to read body of {}: {}", url, e)))?;

        let mime = declared
            .or_else(|| guess_mime(url.path()).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        Ok(Resource {
            url: reference.to_string(),
            mime,
            bytes: bytes.to_vec(),
        })
    }

    async fn fetch_file(&self, reference: &str, url: Url) -> Result<Resource> {
        let path = url.to_file_path().map_err(|_| Error::InvalidUrl {
            url: url.to_string(),
            reason: "not a local file path".into(),
        })?;
        let bytes = tokio::fs::read(&path).await?;
        let mime = guess_mime(url.path()).unwrap_or(FALLBACK_MIME).to_string();

        Ok(Resource {
            url: reference.to_string(),
            mime,
            bytes,
        })
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Resource>> {
        async move {
            let resolved = self.resolve(url)?;
            debug!("fetching {} as {}", url, resolved);
            let resource = match resolved.scheme() {
                "http" | "https" => self.fetch_http(url, resolved).await?,
                "file" => self.fetch_file(url, resolved).await?,
                other => {
                    return Err(Error::InvalidUrl {
                        url: url.to_string(),
                        reason: format!("unsupported scheme '{}'", other),
                    })
                }
            };
            debug!("fetched {} ({} bytes, {})", url, resource.bytes.len(), resource.mime);
            Ok(resource)
        }
        .boxed()
    }
}

/// Serves preloaded payloads keyed by reference; unknown references fail with status 404.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    entries: HashMap<String, (String, Vec<u8>)>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload for `url`
    pub fn insert(&mut self, url: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(url.into(), (mime.into(), bytes.into()));
    }

    /// Builder-style `insert`
    pub fn with(mut self, url: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(url, mime, bytes);
        self
    }
}

impl ResourceFetcher for StaticFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Resource>> {
        async move {
            let (mime, bytes) = self.entries.get(url).ok_or_else(|| Error::FetchStatus {
                url: url.to_string(),
                status: 404,
            })?;
            Ok(Resource {
                url: url.to_string(),
                mime: mime.clone(),
                bytes: bytes.clone(),
            })
        }
        .boxed()
    }
}
