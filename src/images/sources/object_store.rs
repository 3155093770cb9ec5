//! Object-storage image source for `s3://` URIs.

use std::sync::OnceLock;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::PromptError;
use crate::images::sources::{ImageSource, SourcePayload};
use crate::types::HttpConfig;

/// Configuration for an S3-compatible object store.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// Base URL of the S3-compatible gateway, e.g. a MinIO endpoint or a
    /// bucket website host. `s3://bucket/key` resolves to
    /// `{endpoint}/{bucket}/{key}`.
    pub endpoint: String,
    /// Optional bearer token sent with every request.
    pub access_token: Option<SecretString>,
}

/// Fetches objects addressed as `s3://bucket/key` over an S3-compatible
/// HTTP endpoint.
///
/// Access-denied responses (HTTP 403) are reported as such; any other
/// non-success status maps to the same fetch-error class.
pub struct ObjectStoreSource {
    store: ObjectStoreConfig,
    http: HttpConfig,
    async_client: reqwest::Client,
    blocking_client: OnceLock<reqwest::blocking::Client>,
}

impl ObjectStoreSource {
    pub fn new(store: ObjectStoreConfig, http: HttpConfig) -> Result<Self, PromptError> {
        if store.endpoint.is_empty() {
            return Err(PromptError::Configuration(
                "object store endpoint must not be empty".to_string(),
            ));
        }
        let async_client = http.build_async_client()?;
        Ok(Self {
            store,
            http,
            async_client,
            blocking_client: OnceLock::new(),
        })
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client, PromptError> {
        if self.blocking_client.get().is_none() {
            let client = self.http.build_blocking_client()?;
            let _ = self.blocking_client.set(client);
        }
        self.blocking_client.get().ok_or_else(|| {
            PromptError::Configuration("blocking HTTP client unavailable".to_string())
        })
    }

    /// Translate an `s3://bucket/key` URI into a gateway URL.
    fn object_url(&self, path: &str) -> Result<String, PromptError> {
        let rest = path
            .strip_prefix("s3://")
            .ok_or_else(|| PromptError::UnsupportedSource {
                path: path.to_string(),
            })?;
        let (bucket, key) = rest.split_once('/').ok_or_else(|| PromptError::SourceFetch {
            path: path.to_string(),
            reason: "object URI is missing a key (expected s3://bucket/key)".to_string(),
        })?;
        if bucket.is_empty() || key.is_empty() {
            return Err(PromptError::SourceFetch {
                path: path.to_string(),
                reason: "object URI is missing a bucket or key".to_string(),
            });
        }
        Ok(format!(
            "{}/{}/{}",
            self.store.endpoint.trim_end_matches('/'),
            bucket,
            key
        ))
    }

    fn status_error(path: &str, status: reqwest::StatusCode) -> PromptError {
        let reason = if status == reqwest::StatusCode::FORBIDDEN {
            "access denied (HTTP 403)".to_string()
        } else {
            format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string()
        };
        PromptError::SourceFetch {
            path: path.to_string(),
            reason,
        }
    }

    fn fetch_error(path: &str, err: &reqwest::Error) -> PromptError {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        PromptError::SourceFetch {
            path: path.to_string(),
            reason,
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
impl ImageSource for ObjectStoreSource {
    fn name(&self) -> &'static str {
        "object-store"
    }

    fn can_handle(&self, path: &str) -> bool {
        path.starts_with("s3://")
    }

    fn fetch(&self, path: &str) -> Result<SourcePayload, PromptError> {
        let url = self.object_url(path)?;
        let mut request = self.blocking_client()?.get(&url);
        if let Some(token) = &self.store.access_token {
            request = request.bearer_auth(token.expose_secret());
        }
        let response = request.send().map_err(|e| Self::fetch_error(path, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(path, status));
        }
        let media_type = Self::content_type(response.headers());
        let bytes = response
            .bytes()
            .map_err(|e| Self::fetch_error(path, &e))?
            .to_vec();
        Ok(SourcePayload::new(bytes, media_type))
    }

    async fn fetch_async(&self, path: &str) -> Result<SourcePayload, PromptError> {
        let url = self.object_url(path)?;
        let mut request = self.async_client.get(&url);
        if let Some(token) = &self.store.access_token {
            request = request.bearer_auth(token.expose_secret());
        }
        let response = request
            .send()
            .await
            .map_err(|e| Self::fetch_error(path, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(path, status));
        }
        let media_type = Self::content_type(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::fetch_error(path, &e))?
            .to_vec();
        Ok(SourcePayload::new(bytes, media_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_for(endpoint: &str, token: Option<&str>) -> ObjectStoreSource {
        ObjectStoreSource::new(
            ObjectStoreConfig {
                endpoint: endpoint.to_string(),
                access_token: token.map(|t| SecretString::from(t.to_string())),
            },
            HttpConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn object_url_translation() {
        let source = source_for("https://storage.example.com/", None);
        assert_eq!(
            source.object_url("s3://bucket/dir/key.png").unwrap(),
            "https://storage.example.com/bucket/dir/key.png"
        );

        let err = source.object_url("s3://bucket-only").unwrap_err();
        assert!(matches!(err, PromptError::SourceFetch { .. }));
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let result = ObjectStoreSource::new(
            ObjectStoreConfig {
                endpoint: String::new(),
                access_token: None,
            },
            HttpConfig::default(),
        );
        assert!(matches!(result, Err(PromptError::Configuration(_))));
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/bucket/key.png")
            .match_header("authorization", "Bearer secret-token")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"object-bytes")
            .create_async()
            .await;

        let source = source_for(&server.url(), Some("secret-token"));
        let payload = source.fetch_async("s3://bucket/key.png").await.unwrap();

        mock.assert_async().await;
        assert_eq!(payload.bytes, b"object-bytes");
        assert_eq!(payload.media_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn forbidden_maps_to_access_denied() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/bucket/secret.png")
            .with_status(403)
            .create_async()
            .await;

        let source = source_for(&server.url(), None);
        let err = source
            .fetch_async("s3://bucket/secret.png")
            .await
            .unwrap_err();
        match err {
            PromptError::SourceFetch { path, reason } => {
                assert_eq!(path, "s3://bucket/secret.png");
                assert!(reason.contains("access denied"), "reason was: {reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
