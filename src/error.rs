//! Error handling for pic-prompt.
//!
//! The crate uses a single error type, [`PromptError`], across all modules.
//! Batch downloads collect per-image failures into one
//! [`PromptError::BatchDownload`] so a caller sees every failing path and its
//! cause in a single report instead of the first failure only.

use thiserror::Error;

/// One failed image from a batch download: the path that failed and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    /// The path or URI as the caller supplied it.
    pub path: String,
    /// Human-readable cause (status code, I/O error, decode error, ...).
    pub reason: String,
}

impl DownloadFailure {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for DownloadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Error type for all pic-prompt operations.
#[derive(Debug, Error)]
pub enum PromptError {
    /// No registered image source can handle the given path.
    #[error("no registered image source can handle path: {path}")]
    UnsupportedSource { path: String },

    /// Network, disk, status, or timeout failure while fetching one image.
    #[error("failed to fetch '{path}': {reason}")]
    SourceFetch { path: String, reason: String },

    /// One or more images in a batch failed to download. The message
    /// enumerates every `(path, cause)` pair, one per line.
    #[error("{}", format_batch(.0))]
    BatchDownload(Vec<DownloadFailure>),

    /// The fetched bytes are not a decodable image.
    #[error("could not decode image '{path}': {reason}")]
    ImageDecode { path: String, reason: String },

    /// Every adaptation tier was exhausted without meeting the byte budget.
    #[error("image '{path}' cannot be reduced to {max_size} bytes for provider '{provider}'")]
    ImageTooLarge {
        path: String,
        provider: String,
        max_size: usize,
    },

    /// An operation referenced a path that was never registered.
    #[error("image '{path}' is not registered")]
    UnknownImage { path: String },

    /// A record was asked to adapt or encode before its bytes were fetched.
    #[error("image '{path}' has not been fetched")]
    NotFetched { path: String },

    /// No encoded representation exists for the given provider.
    /// Callers must encode before formatting.
    #[error("image '{path}' has no encoded data for provider '{provider}'")]
    NotEncoded { path: String, provider: String },

    /// Invalid client or source configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// HTTP transport failure outside a per-image fetch (e.g. client build).
    #[error("HTTP error: {0}")]
    Http(String),

    /// I/O failure outside a per-image fetch.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Coarse-grained error category for dispatching on failure classes
/// without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Resolution or retrieval of a single image failed.
    Source,
    /// A batch completed with one or more per-image failures.
    Batch,
    /// Image bytes could not be decoded or re-encoded.
    Decode,
    /// A provider byte budget could not be met.
    Budget,
    /// The caller violated an API precondition (unregistered path,
    /// unfetched record, missing encoding).
    Usage,
    /// Configuration or transport plumbing failed.
    Infrastructure,
}

impl PromptError {
    /// Map this error to its [`ErrorCategory`].
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedSource { .. } | Self::SourceFetch { .. } => ErrorCategory::Source,
            Self::BatchDownload(_) => ErrorCategory::Batch,
            Self::ImageDecode { .. } => ErrorCategory::Decode,
            Self::ImageTooLarge { .. } => ErrorCategory::Budget,
            Self::UnknownImage { .. } | Self::NotFetched { .. } | Self::NotEncoded { .. } => {
                ErrorCategory::Usage
            }
            Self::Configuration(_) | Self::Http(_) | Self::Io(_) => ErrorCategory::Infrastructure,
        }
    }

    /// Whether retrying the same operation could reasonably succeed.
    ///
    /// The crate itself never retries; this is a hint for callers that
    /// implement a retry policy one layer up.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SourceFetch { .. } | Self::BatchDownload(_) | Self::Http(_)
        )
    }

    /// The failures behind a [`PromptError::BatchDownload`], if any.
    pub fn batch_failures(&self) -> Option<&[DownloadFailure]> {
        match self {
            Self::BatchDownload(failures) => Some(failures),
            _ => None,
        }
    }
}

fn format_batch(failures: &[DownloadFailure]) -> String {
    let mut out = format!("{} image(s) failed to download:", failures.len());
    for failure in failures {
        out.push_str("\n  ");
        out.push_str(&failure.to_string());
    }
    out
}

impl From<reqwest::Error> for PromptError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_message_lists_every_failure() {
        let err = PromptError::BatchDownload(vec![
            DownloadFailure::new("s3://bucket/a.png", "access denied (HTTP 403)"),
            DownloadFailure::new("https://example.com/b.jpg", "HTTP 404 Not Found"),
        ]);
        let message = err.to_string();
        assert!(message.starts_with("2 image(s) failed to download:"));
        assert!(message.contains("s3://bucket/a.png: access denied (HTTP 403)"));
        assert!(message.contains("https://example.com/b.jpg: HTTP 404 Not Found"));
    }

    #[test]
    fn categories() {
        let fetch = PromptError::SourceFetch {
            path: "x".into(),
            reason: "timed out".into(),
        };
        assert_eq!(fetch.category(), ErrorCategory::Source);
        assert!(fetch.is_retryable());

        let unknown = PromptError::UnknownImage { path: "x".into() };
        assert_eq!(unknown.category(), ErrorCategory::Usage);
        assert!(!unknown.is_retryable());

        let too_large = PromptError::ImageTooLarge {
            path: "x".into(),
            provider: "anthropic".into(),
            max_size: 1024,
        };
        assert_eq!(too_large.category(), ErrorCategory::Budget);
        assert!(!too_large.is_retryable());
    }

    #[test]
    fn batch_failures_accessor() {
        let err = PromptError::BatchDownload(vec![DownloadFailure::new("a", "b")]);
        assert_eq!(err.batch_failures().map(<[_]>::len), Some(1));
        assert!(
            PromptError::Configuration("x".into())
                .batch_failures()
                .is_none()
        );
    }
}
