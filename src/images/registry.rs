//! The deduplicating store of image records for one prompt build.

use std::collections::HashMap;

use crate::error::PromptError;
use crate::images::record::ImageRecord;

/// Keyed store of [`ImageRecord`] by source path.
///
/// The registry is the single source of truth for image state during one
/// prompt build: an image referenced by several messages or consumed by
/// several providers is fetched and stored exactly once. It holds at most
/// one record per path; registering a record for an existing path replaces
/// it (last write wins), while registering a bare path never disturbs an
/// already-fetched record.
///
/// The registry is not synchronized. During a build session exactly one
/// logical writer (the downloader, then the adapter) mutates it; provider
/// formatters read it only after the build phase completes.
#[derive(Debug, Default, Clone)]
pub struct ImageRegistry {
    records: HashMap<String, ImageRecord>,
}

impl ImageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path, creating an empty record if absent. No-op when the
    /// path is already registered, fetched or not.
    pub fn register_path(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.records
            .entry(path.clone())
            .or_insert_with(|| ImageRecord::new(path));
    }

    /// Upsert a record by its path key.
    pub fn register_record(&mut self, record: ImageRecord) {
        self.records
            .insert(record.source_path().to_string(), record);
    }

    /// Look up a record.
    pub fn get(&self, path: &str) -> Option<&ImageRecord> {
        self.records.get(path)
    }

    /// All records, in no particular order.
    pub fn all(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.values()
    }

    /// All registered paths, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Registered paths whose records have no bytes yet.
    pub fn pending_paths(&self) -> Vec<String> {
        self.records
            .values()
            .filter(|record| !record.is_fetched())
            .map(|record| record.source_path().to_string())
            .collect()
    }

    /// Whether a path is registered.
    pub fn has(&self, path: &str) -> bool {
        self.records.contains_key(path)
    }

    /// Number of registered records.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove every record. Call between independent builds.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Cache an encoded representation on a registered record.
    ///
    /// Fails with [`PromptError::UnknownImage`] when the path was never
    /// registered; the registry does not silently create records here.
    pub fn add_encoded(
        &mut self,
        path: &str,
        provider_id: &str,
        encoded: String,
    ) -> Result<(), PromptError> {
        let record = self
            .records
            .get_mut(path)
            .ok_or_else(|| PromptError::UnknownImage {
                path: path.to_string(),
            })?;
        record.add_encoded(provider_id, encoded);
        Ok(())
    }
}
