//! Batch image downloading with partial-failure aggregation.
//!
//! The downloader orchestrates source resolution and record creation. A
//! single image's failure never aborts a batch: every pending image is
//! attempted, and the failures are either aggregated into one
//! [`PromptError::BatchDownload`] (strict variants) or returned alongside
//! the registry for callers that prefer to log and continue (lenient
//! variants). Already-fetched registry entries are skipped, so repeated
//! calls perform no duplicate retrievals.

use futures::future::join_all;

use crate::error::{DownloadFailure, PromptError};
use crate::images::record::ImageRecord;
use crate::images::registry::ImageRegistry;
use crate::images::sources::{ObjectStoreConfig, SourceResolver};
use crate::types::HttpConfig;

/// Fetches images through a [`SourceResolver`] into an [`ImageRegistry`].
#[derive(Debug)]
pub struct Downloader {
    resolver: SourceResolver,
}

impl Downloader {
    /// A downloader with the built-in local-file and HTTP(S) sources.
    pub fn new() -> Result<Self, PromptError> {
        Self::with_http_config(HttpConfig::default())
    }

    /// A downloader with built-in sources using the given HTTP settings.
    pub fn with_http_config(config: HttpConfig) -> Result<Self, PromptError> {
        Ok(Self {
            resolver: SourceResolver::with_defaults(&config)?,
        })
    }

    /// A downloader that additionally resolves `s3://` URIs.
    pub fn with_object_store(
        config: HttpConfig,
        store: ObjectStoreConfig,
    ) -> Result<Self, PromptError> {
        Ok(Self {
            resolver: SourceResolver::with_object_store(&config, store)?,
        })
    }

    /// A downloader over a caller-assembled resolver.
    pub fn with_resolver(resolver: SourceResolver) -> Self {
        Self { resolver }
    }

    /// The resolver in use.
    pub fn resolver(&self) -> &SourceResolver {
        &self.resolver
    }

    /// Mutable access for registering additional sources.
    pub fn resolver_mut(&mut self) -> &mut SourceResolver {
        &mut self.resolver
    }

    /// Fetch a single image, blocking. Errors are returned directly,
    /// not aggregated.
    pub fn fetch_one(&self, path: &str) -> Result<ImageRecord, PromptError> {
        let source = self.resolver.resolve(path)?;
        tracing::debug!(path, source = source.name(), "fetching image");
        let payload = source.fetch(path)?;
        ImageRecord::with_bytes(path, payload.bytes, payload.media_type)
    }

    /// Fetch a single image without blocking the runtime. Errors are
    /// returned directly, not aggregated.
    pub async fn fetch_one_async(&self, path: &str) -> Result<ImageRecord, PromptError> {
        let source = self.resolver.resolve(path)?;
        tracing::debug!(path, source = source.name(), "fetching image");
        let payload = source.fetch_async(path).await?;
        ImageRecord::with_bytes(path, payload.bytes, payload.media_type)
    }

    /// Register `paths` and fetch every pending entry sequentially.
    ///
    /// Attempts every image before failing; if any fetches failed, returns
    /// [`PromptError::BatchDownload`] naming each `(path, cause)` pair.
    /// Successful records remain in `registry` either way.
    pub fn fetch_into<I, S>(
        &self,
        paths: I,
        registry: &mut ImageRegistry,
    ) -> Result<(), PromptError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let failures = self.fetch_into_lenient(paths, registry);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PromptError::BatchDownload(failures))
        }
    }

    /// Non-raising form of [`Downloader::fetch_into`]: failures are logged
    /// and returned, and failed entries stay registered without bytes.
    pub fn fetch_into_lenient<I, S>(
        &self,
        paths: I,
        registry: &mut ImageRegistry,
    ) -> Vec<DownloadFailure>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            registry.register_path(path);
        }
        self.fill_pending(registry)
    }

    /// Register `paths` and fetch every pending entry concurrently.
    /// Same aggregation contract as [`Downloader::fetch_into`].
    pub async fn fetch_into_async<I, S>(
        &self,
        paths: I,
        registry: &mut ImageRegistry,
    ) -> Result<(), PromptError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let failures = self.fetch_into_lenient_async(paths, registry).await;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PromptError::BatchDownload(failures))
        }
    }

    /// Non-raising form of [`Downloader::fetch_into_async`].
    pub async fn fetch_into_lenient_async<I, S>(
        &self,
        paths: I,
        registry: &mut ImageRegistry,
    ) -> Vec<DownloadFailure>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            registry.register_path(path);
        }
        self.fill_pending_async(registry).await
    }

    /// Fetch `paths` into a fresh registry, blocking, strict.
    pub fn fetch_many<I, S>(&self, paths: I) -> Result<ImageRegistry, PromptError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = ImageRegistry::new();
        self.fetch_into(paths, &mut registry)?;
        Ok(registry)
    }

    /// Fetch `paths` into a fresh registry, blocking, non-raising.
    pub fn fetch_many_lenient<I, S>(&self, paths: I) -> (ImageRegistry, Vec<DownloadFailure>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = ImageRegistry::new();
        let failures = self.fetch_into_lenient(paths, &mut registry);
        (registry, failures)
    }

    /// Fetch `paths` into a fresh registry, concurrently, strict.
    pub async fn fetch_many_async<I, S>(&self, paths: I) -> Result<ImageRegistry, PromptError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = ImageRegistry::new();
        self.fetch_into_async(paths, &mut registry).await?;
        Ok(registry)
    }

    /// Fetch `paths` into a fresh registry, concurrently, non-raising.
    pub async fn fetch_many_lenient_async<I, S>(
        &self,
        paths: I,
    ) -> (ImageRegistry, Vec<DownloadFailure>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = ImageRegistry::new();
        let failures = self.fetch_into_lenient_async(paths, &mut registry).await;
        (registry, failures)
    }

    /// Fetch every registered-but-unfetched entry, one at a time.
    fn fill_pending(&self, registry: &mut ImageRegistry) -> Vec<DownloadFailure> {
        let mut failures = Vec::new();
        for path in registry.pending_paths() {
            match self.fetch_one(&path) {
                Ok(record) => registry.register_record(record),
                Err(err) => {
                    tracing::warn!(path = %path, error = %err, "image fetch failed");
                    failures.push(DownloadFailure::new(path, err.to_string()));
                }
            }
        }
        failures
    }

    /// Fetch every registered-but-unfetched entry concurrently and await
    /// the whole group; completion order does not matter.
    async fn fill_pending_async(&self, registry: &mut ImageRegistry) -> Vec<DownloadFailure> {
        let pending = registry.pending_paths();
        if pending.is_empty() {
            return Vec::new();
        }
        tracing::debug!(count = pending.len(), "fetching pending images concurrently");

        let fetches = pending.into_iter().map(|path| async move {
            let result = self.fetch_one_async(&path).await;
            (path, result)
        });

        let mut failures = Vec::new();
        for (path, result) in join_all(fetches).await {
            match result {
                Ok(record) => registry.register_record(record),
                Err(err) => {
                    tracing::warn!(path = %path, error = %err, "image fetch failed");
                    failures.push(DownloadFailure::new(path, err.to_string()));
                }
            }
        }
        failures
    }
}
