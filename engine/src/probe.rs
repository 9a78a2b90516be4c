use crate::common::ProbeError;
use async_trait::async_trait;

/// Lightweight existence check for a media locator.
///
/// Used for pre-warming: it must not fetch the full content.
#[async_trait]
pub trait ResourceProbe: Send + Sync {
    async fn exists(&self, url: &str) -> Result<(), ProbeError>;
}

/// Existence check through an HTTP `HEAD` request.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceProbe for HttpProbe {
    async fn exists(&self, url: &str) -> Result<(), ProbeError> {
        let response =
            self.client
                .head(url)
                .send()
                .await
                .map_err(|e| ProbeError::Unreachable {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }
}
