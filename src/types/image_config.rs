//! Provider image requirements.

use serde::{Deserialize, Serialize};

/// Image handling requirements for one provider.
///
/// Providers differ in whether they want inline base64 payloads or remote
/// URLs, how large an encoded image may be, and which media types they
/// accept. The downloader and adapter consult this descriptor; the provider
/// formatters supply their own defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageConfig {
    /// Whether images must be base64-encoded for this provider.
    #[serde(default)]
    pub requires_base64: bool,
    /// Maximum allowed encoded size in bytes.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Whether image bytes must be downloaded at all. When `false`, paths
    /// are passed through as remote references and never fetched.
    #[serde(default = "default_needs_download")]
    pub needs_download: bool,
    /// Media types the provider accepts.
    #[serde(default = "default_media_types")]
    pub supported_media_types: Vec<String>,
}

fn default_max_size() -> usize {
    5_000_000
}

fn default_needs_download() -> bool {
    true
}

fn default_media_types() -> Vec<String> {
    vec!["image/png".to_string(), "image/jpeg".to_string()]
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            requires_base64: false,
            max_size: default_max_size(),
            needs_download: default_needs_download(),
            supported_media_types: default_media_types(),
        }
    }
}

impl ImageConfig {
    /// Whether the provider accepts the given media type.
    pub fn supports(&self, media_type: &str) -> bool {
        self.supported_media_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(media_type))
    }
}
