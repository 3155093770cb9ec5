//! Image sources: strategies for retrieving raw bytes from one class of
//! location, and the resolver that dispatches a path to the right strategy.
//!
//! Sources do no caching; deduplication is the registry's job one layer up.

mod http;
mod local;
mod object_store;

pub use http::HttpSource;
pub use local::LocalFileSource;
pub use object_store::{ObjectStoreConfig, ObjectStoreSource};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PromptError;
use crate::types::HttpConfig;
use crate::utils::mime;

/// Bytes retrieved from a source, plus the media type the source itself
/// reported (e.g. an HTTP `Content-Type` header). `None` when the source has
/// no opinion; the caller falls back to sniffing and extension guessing.
#[derive(Debug, Clone)]
pub struct SourcePayload {
    pub bytes: Vec<u8>,
    pub media_type: Option<String>,
}

impl SourcePayload {
    pub fn new(bytes: Vec<u8>, media_type: Option<String>) -> Self {
        Self { bytes, media_type }
    }
}

/// Capability interface for one class of image location.
///
/// `can_handle` must be a pure predicate on the path's shape, with no I/O.
/// Built-in predicates are scheme-prefix based and mutually exclusive
/// (plain paths, `http://`/`https://`, `s3://`); implementations added by
/// callers should preserve that property so dispatch stays unambiguous.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Whether this source can retrieve the given path. Pure, no I/O.
    fn can_handle(&self, path: &str) -> bool;

    /// Retrieve the image, blocking the calling thread.
    ///
    /// Failures (missing file, non-2xx status, access denied, timeout) map
    /// to [`PromptError::SourceFetch`].
    fn fetch(&self, path: &str) -> Result<SourcePayload, PromptError>;

    /// Retrieve the image without blocking the async runtime. Same failure
    /// contract as [`ImageSource::fetch`].
    async fn fetch_async(&self, path: &str) -> Result<SourcePayload, PromptError>;

    /// Guess the media type from the path alone. No I/O; returns `None`
    /// when indeterminable.
    fn media_type(&self, path: &str) -> Option<String> {
        mime::media_type_from_path(path)
    }
}

/// Ordered first-match dispatch over registered sources.
///
/// Sources are consulted in registration order, built-ins first: local file,
/// then HTTP(S), then object storage when configured. Registration order is
/// what makes ambiguous paths resolve predictably.
pub struct SourceResolver {
    sources: Vec<Arc<dyn ImageSource>>,
}

impl SourceResolver {
    /// An empty resolver with no sources registered.
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// A resolver with the built-in local-file and HTTP(S) sources.
    pub fn with_defaults(http_config: &HttpConfig) -> Result<Self, PromptError> {
        let mut resolver = Self::empty();
        resolver.register(Arc::new(LocalFileSource::new()));
        resolver.register(Arc::new(HttpSource::new(http_config.clone())?));
        Ok(resolver)
    }

    /// Defaults plus an object-storage source for `s3://` URIs.
    pub fn with_object_store(
        http_config: &HttpConfig,
        store_config: ObjectStoreConfig,
    ) -> Result<Self, PromptError> {
        let mut resolver = Self::with_defaults(http_config)?;
        resolver.register(Arc::new(ObjectStoreSource::new(
            store_config,
            http_config.clone(),
        )?));
        Ok(resolver)
    }

    /// Append a source; it is consulted after everything registered before it.
    pub fn register(&mut self, source: Arc<dyn ImageSource>) {
        self.sources.push(source);
    }

    /// The first registered source whose `can_handle` matches.
    pub fn resolve(&self, path: &str) -> Result<Arc<dyn ImageSource>, PromptError> {
        self.sources
            .iter()
            .find(|source| source.can_handle(path))
            .cloned()
            .ok_or_else(|| PromptError::UnsupportedSource {
                path: path.to_string(),
            })
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no sources are registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for SourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("SourceResolver").field("sources", &names).finish()
    }
}
