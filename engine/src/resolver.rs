//! Theme -> playable video locator.
//!
//! Resolution first asks a remote indirection service for a direct link to
//! the theme's video. The service is an optimization only: any failure or
//! malformed answer silently degrades to a locator built directly from the
//! same path, so [`ResourceResolver::resolve`] never fails. Whether that
//! locator actually plays is decided later, by the load step.

use crate::common::ResolveError;
use crate::model::{Theme, ThemeVideos};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Expected shape of the indirection payload, used in error messages.
const EXPECTED_PAYLOAD: &str = r#"{"success": bool, "data": {"url": string}}"#;

/// Longest body excerpt kept in an [`ResolveError::InvalidResponse`].
const BODY_EXCERPT_LEN: usize = 120;

/// Remote lookup turning a resource path into a direct media URL.
#[async_trait]
pub trait RemoteIndirection: Send + Sync {
    /// Returns the direct URL for `path`.
    ///
    /// # Errors
    ///
    /// Any [`ResolveError`]; the resolver treats all of them alike.
    async fn lookup(&self, path: &str) -> Result<String, ResolveError>;
}

#[derive(Debug, Deserialize)]
struct IndirectionResponse {
    success: bool,
    #[serde(default)]
    data: Option<IndirectionData>,
}

#[derive(Debug, Deserialize)]
struct IndirectionData {
    #[serde(default)]
    url: Option<String>,
}

/// Interprets an indirection response body.
pub fn parse_indirection_body(path: &str, body: &str) -> Result<String, ResolveError> {
    let response: IndirectionResponse =
        serde_json::from_str(body).map_err(|e| ResolveError::InvalidResponse {
            expected: EXPECTED_PAYLOAD.to_string(),
            actual: format!("{} ({e})", excerpt(body)),
        })?;

    if !response.success {
        return Err(ResolveError::Unsuccessful {
            path: path.to_string(),
        });
    }

    response
        .data
        .and_then(|data| data.url)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ResolveError::MissingUrl {
            path: path.to_string(),
        })
}

fn excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_LEN {
        body.to_string()
    } else {
        let cut: String = body.chars().take(BODY_EXCERPT_LEN).collect();
        format!("{cut}...")
    }
}

/// Builds the HTTP client shared by the indirection and probe adapters.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ResolveError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ResolveError::ClientCreation {
            reason: e.to_string(),
        })
}

/// Indirection over HTTP: `GET {endpoint}?path={path}`.
#[derive(Debug, Clone)]
pub struct HttpIndirection {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIndirection {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteIndirection for HttpIndirection {
    async fn lookup(&self, path: &str) -> Result<String, ResolveError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("path", path)])
            .send()
            .await
            .map_err(|e| ResolveError::RequestFailed {
                url: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::RequestFailed {
                url: self.endpoint.clone(),
                reason: format!("failed to read body: {e}"),
            })?;

        parse_indirection_body(path, &body)
    }
}

/// Builds the direct-access locator for `path` under `direct_base`.
///
/// Path segments are percent-encoded (already encoded segments are decoded
/// first, so the result does not depend on how the path was written). Paths
/// that already are absolute `http(s)` URLs are returned unchanged. The
/// result is never empty.
pub fn fallback_locator(direct_base: &str, path: &str) -> String {
    let path = path.trim();
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    let encoded: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let decoded = urlencoding::decode(segment)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            urlencoding::encode(&decoded).into_owned()
        })
        .collect();

    format!("{}/{}", direct_base.trim_end_matches('/'), encoded.join("/"))
}

/// Resolves and caches one locator per theme for the session.
///
/// Cloning is cheap; clones share the cache.
#[derive(Clone)]
pub struct ResourceResolver {
    remote: Option<Arc<dyn RemoteIndirection>>,
    direct_base: String,
    videos: ThemeVideos,
    cache: Arc<RwLock<HashMap<Theme, String>>>,
}

impl std::fmt::Debug for ResourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceResolver")
            .field("remote", &self.remote.is_some())
            .field("direct_base", &self.direct_base)
            .field("videos", &self.videos)
            .finish()
    }
}

impl ResourceResolver {
    pub fn new(
        remote: Option<Arc<dyn RemoteIndirection>>,
        direct_base: impl Into<String>,
        videos: ThemeVideos,
    ) -> Self {
        Self {
            remote,
            direct_base: direct_base.into(),
            videos,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn videos(&self) -> &ThemeVideos {
        &self.videos
    }

    /// Returns the locator for `theme`, resolving it on first use.
    ///
    /// Never fails: remote problems yield the fallback locator.
    pub async fn resolve(&self, theme: Theme) -> String {
        if let Some(url) = self.cached(theme).await {
            log::debug!("Using cached video locator for {theme}");
            return url;
        }

        let path = &self.videos.get(theme).path;
        let url = match self.lookup_remote(theme, path).await {
            Some(url) => url,
            None => fallback_locator(&self.direct_base, path),
        };

        self.cache.write().await.insert(theme, url.clone());
        url
    }

    /// Locator cached for `theme`, if resolution already happened.
    pub async fn cached(&self, theme: Theme) -> Option<String> {
        self.cache.read().await.get(&theme).cloned()
    }

    /// Forgets the cached locator so the next resolve goes remote again.
    pub async fn invalidate(&self, theme: Theme) {
        if self.cache.write().await.remove(&theme).is_some() {
            log::debug!("Dropped cached video locator for {theme}");
        }
    }

    async fn lookup_remote(&self, theme: Theme, path: &str) -> Option<String> {
        let Some(remote) = &self.remote else {
            log::debug!("No indirection service configured, using direct locator for {theme}");
            return None;
        };
        if path.starts_with("http://") || path.starts_with("https://") {
            log::debug!("Video path for {theme} is already absolute, skipping indirection");
            return None;
        }

        match remote.lookup(path).await {
            Ok(url) => {
                log::info!("Resolved {theme} video through indirection service");
                Some(url)
            }
            Err(e) => {
                log::warn!("Indirection failed for {theme} video, using direct locator: {e}");
                None
            }
        }
    }
}
