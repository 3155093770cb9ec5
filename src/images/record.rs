//! Per-image state.

use std::collections::HashMap;
use std::io::Cursor;

use crate::error::PromptError;
use crate::utils::mime;

/// State for one image across a prompt build: raw bytes, decoded dimensions,
/// media type, and the per-provider cache of encoded representations.
///
/// Records start empty (path only) and are populated by the downloader.
/// Byte assignment validates the payload immediately: corrupt bytes fail at
/// assignment, not later when dimensions are requested. Raw bytes are only
/// ever replaced wholesale, never mutated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageRecord {
    source_path: String,
    raw_bytes: Option<Vec<u8>>,
    media_type: Option<String>,
    dimensions: Option<(u32, u32)>,
    encoded: HashMap<String, String>,
}

impl ImageRecord {
    /// Create an empty record for a path that has not been fetched yet.
    pub fn new(source_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            raw_bytes: None,
            media_type: None,
            dimensions: None,
            encoded: HashMap::new(),
        }
    }

    /// Create a fetched record in one step. Fails if the bytes do not decode
    /// as an image.
    pub fn with_bytes(
        source_path: impl Into<String>,
        bytes: Vec<u8>,
        media_type: Option<String>,
    ) -> Result<Self, PromptError> {
        let mut record = Self::new(source_path);
        record.assign_bytes(bytes, media_type)?;
        Ok(record)
    }

    /// Assign fetched bytes, replacing any previous payload wholesale.
    ///
    /// Dimensions are derived here so that invalid bytes fail immediately
    /// with [`PromptError::ImageDecode`]. When `media_type` is `None` the
    /// record falls back to magic-number sniffing and then the path
    /// extension; the media type stays unknown if neither works.
    pub fn assign_bytes(
        &mut self,
        bytes: Vec<u8>,
        media_type: Option<String>,
    ) -> Result<(), PromptError> {
        let dimensions = probe_dimensions(&self.source_path, &bytes)?;
        self.media_type =
            media_type.or_else(|| mime::guess_media_type(Some(&bytes), Some(&self.source_path)));
        self.dimensions = Some(dimensions);
        self.raw_bytes = Some(bytes);
        Ok(())
    }

    /// The path or URI this record was created from.
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// Whether bytes have been fetched.
    pub fn is_fetched(&self) -> bool {
        self.raw_bytes.is_some()
    }

    /// The raw image bytes, if fetched.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.raw_bytes.as_deref()
    }

    /// The media type, if known.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Decoded `(width, height)`; present exactly when bytes are fetched.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// Cache an encoded representation for a provider. Re-encoding
    /// overwrites the previous entry.
    pub fn add_encoded(&mut self, provider_id: impl Into<String>, encoded: String) {
        self.encoded.insert(provider_id.into(), encoded);
    }

    /// The encoded representation for a provider.
    ///
    /// Fails with [`PromptError::NotEncoded`] when the provider has no
    /// cached encoding; callers must encode before formatting.
    pub fn encoded_for(&self, provider_id: &str) -> Result<&str, PromptError> {
        self.encoded
            .get(provider_id)
            .map(String::as_str)
            .ok_or_else(|| PromptError::NotEncoded {
                path: self.source_path.clone(),
                provider: provider_id.to_string(),
            })
    }

    /// Whether an encoding is cached for the provider.
    pub fn has_encoding(&self, provider_id: &str) -> bool {
        self.encoded.contains_key(provider_id)
    }

    /// Provider ids with a cached encoding.
    pub fn encoded_providers(&self) -> impl Iterator<Item = &str> {
        self.encoded.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ImageRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRecord")
            .field("source_path", &self.source_path)
            .field("bytes", &self.raw_bytes.as_ref().map(Vec::len))
            .field("media_type", &self.media_type)
            .field("dimensions", &self.dimensions)
            .field("encoded_providers", &self.encoded.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Decode just enough of the payload to learn its pixel dimensions.
fn probe_dimensions(path: &str, bytes: &[u8]) -> Result<(u32, u32), PromptError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PromptError::ImageDecode {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
    reader
        .into_dimensions()
        .map_err(|e| PromptError::ImageDecode {
            path: path.to_string(),
            reason: e.to_string(),
        })
}
