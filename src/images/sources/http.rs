//! HTTP(S) image source.

use std::sync::OnceLock;

use async_trait::async_trait;

use crate::error::PromptError;
use crate::images::sources::{ImageSource, SourcePayload};
use crate::types::HttpConfig;

/// Downloads images from `http://` and `https://` URLs.
///
/// The async client is built eagerly; the blocking client (which runs its
/// own I/O thread) is only created when a synchronous fetch is actually
/// made. The server-declared `Content-Type` is reported on the payload when
/// present so it can take precedence over extension guessing.
pub struct HttpSource {
    config: HttpConfig,
    async_client: reqwest::Client,
    blocking_client: OnceLock<reqwest::blocking::Client>,
}

impl HttpSource {
    pub fn new(config: HttpConfig) -> Result<Self, PromptError> {
        let async_client = config.build_async_client()?;
        Ok(Self {
            config,
            async_client,
            blocking_client: OnceLock::new(),
        })
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client, PromptError> {
        if self.blocking_client.get().is_none() {
            let client = self.config.build_blocking_client()?;
            let _ = self.blocking_client.set(client);
        }
        self.blocking_client.get().ok_or_else(|| {
            PromptError::Configuration("blocking HTTP client unavailable".to_string())
        })
    }

    fn fetch_error(url: &str, err: &reqwest::Error) -> PromptError {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        PromptError::SourceFetch {
            path: url.to_string(),
            reason,
        }
    }

    fn status_error(url: &str, status: reqwest::StatusCode) -> PromptError {
        PromptError::SourceFetch {
            path: url.to_string(),
            reason: format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string(),
        }
    }

    fn content_type(headers: &reqwest::header::HeaderMap) -> Option<String> {
        headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

#[async_trait]
impl ImageSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    fn can_handle(&self, path: &str) -> bool {
        path.starts_with("http://") || path.starts_with("https://")
    }

    fn fetch(&self, url: &str) -> Result<SourcePayload, PromptError> {
        let response = self
            .blocking_client()?
            .get(url)
            .send()
            .map_err(|e| Self::fetch_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(url, status));
        }

        let media_type = Self::content_type(response.headers());
        let bytes = response
            .bytes()
            .map_err(|e| Self::fetch_error(url, &e))?
            .to_vec();
        Ok(SourcePayload::new(bytes, media_type))
    }

    async fn fetch_async(&self, url: &str) -> Result<SourcePayload, PromptError> {
        let response = self
            .async_client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::fetch_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(url, status));
        }

        let media_type = Self::content_type(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::fetch_error(url, &e))?
            .to_vec();
        Ok(SourcePayload::new(bytes, media_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> HttpSource {
        HttpSource::new(HttpConfig::default()).unwrap()
    }

    #[test]
    fn handles_http_schemes_only() {
        let source = source();
        assert!(source.can_handle("http://example.com/a.png"));
        assert!(source.can_handle("https://example.com/a.png"));
        assert!(!source.can_handle("/tmp/a.png"));
        assert!(!source.can_handle("s3://bucket/a.png"));
    }

    #[tokio::test]
    async fn reports_server_content_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/pic")
            .with_status(200)
            .with_header("content-type", "image/webp; charset=binary")
            .with_body(b"payload")
            .create_async()
            .await;

        let payload = source()
            .fetch_async(&format!("{}/pic", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(payload.bytes, b"payload");
        assert_eq!(payload.media_type.as_deref(), Some("image/webp"));
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/missing.png", server.url());
        let err = source().fetch_async(&url).await.unwrap_err();
        match err {
            PromptError::SourceFetch { path, reason } => {
                assert_eq!(path, url);
                assert!(reason.contains("404"), "reason was: {reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blocking_fetch_maps_status() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/a.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"abc")
            .create();

        let payload = source().fetch(&format!("{}/a.png", server.url())).unwrap();
        mock.assert();
        assert_eq!(payload.bytes, b"abc");
        assert_eq!(payload.media_type.as_deref(), Some("image/png"));
    }
}
