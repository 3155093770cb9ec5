//! Local filesystem image source.

use async_trait::async_trait;

use crate::error::PromptError;
use crate::images::sources::{ImageSource, SourcePayload};
use crate::utils::mime;

/// Loads images from the local filesystem.
///
/// Handles any path that does not carry a remote scheme prefix
/// (`http://`, `https://`, `s3://`).
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSource;

impl LocalFileSource {
    pub fn new() -> Self {
        Self
    }

    fn payload(path: &str, bytes: Vec<u8>) -> SourcePayload {
        SourcePayload::new(bytes, mime::media_type_from_path(path))
    }
}

#[async_trait]
impl ImageSource for LocalFileSource {
    fn name(&self) -> &'static str {
        "local-file"
    }

    fn can_handle(&self, path: &str) -> bool {
        !(path.starts_with("http://") || path.starts_with("https://") || path.starts_with("s3://"))
    }

    fn fetch(&self, path: &str) -> Result<SourcePayload, PromptError> {
        let bytes = std::fs::read(path).map_err(|e| PromptError::SourceFetch {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::payload(path, bytes))
    }

    async fn fetch_async(&self, path: &str) -> Result<SourcePayload, PromptError> {
        // tokio::fs offloads the read to the blocking pool so the event loop
        // is never stalled by disk I/O.
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PromptError::SourceFetch {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::payload(path, bytes))
    }
}
