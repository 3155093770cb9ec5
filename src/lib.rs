//! # Pic Prompt - Provider-Aware Image Normalization for LLM Prompts
//!
//! Pic Prompt normalizes chat-style prompts (text + images) into the wire
//! shapes different LLM providers expect, doing the heavy lifting in the
//! image pipeline: acquiring bytes from heterogeneous sources (local files,
//! HTTP(S), S3-compatible object storage) and adapting them to each
//! provider's size and format constraints.
//!
#![deny(unsafe_code)]
//! ## Features
//!
//! - **Pluggable sources**: one capability trait covers local files,
//!   HTTP(S), and object storage; a resolver dispatches each path to the
//!   first source that can handle it.
//! - **Deduplicating registry**: every image is fetched once per build
//!   session and encoded once per provider, no matter how many messages or
//!   providers reference it.
//! - **Budget-safe adaptation**: a three-tier encode/resample/resize
//!   escalation guarantees the encoded artifact fits the provider's byte
//!   budget or fails loudly, never silently oversized.
//! - **Whole-batch error reporting**: a failing image never aborts a batch;
//!   all failures are aggregated into one report.
//! - **Sync and async**: blocking fetches for simple callers, concurrent
//!   batch downloads on Tokio for the rest.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use pic_prompt::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut builder = PromptBuilder::new()?;
//!     builder.add_provider(Arc::new(AnthropicFormat::new()));
//!     builder.add_provider(Arc::new(OpenAiFormat::new()));
//!
//!     builder.add_system_message("You are a helpful assistant.");
//!     builder.add_user_message("What is in this photo?");
//!     builder.add_image_message("https://example.com/photo.jpg");
//!
//!     builder.build_async().await?;
//!
//!     let prompt = builder.prompt_for("anthropic").unwrap();
//!     println!("{prompt}");
//!     Ok(())
//! }
//! ```
//!
//! ## Working a layer lower
//!
//! The builder is a thin sequencing layer; each stage is usable on its own:
//!
//! ```rust,no_run
//! use pic_prompt::images::{Downloader, ImageAdapter};
//! use pic_prompt::types::ImageConfig;
//!
//! # fn main() -> Result<(), pic_prompt::PromptError> {
//! let downloader = Downloader::new()?;
//! let registry = downloader.fetch_many(["./cat.png", "https://example.com/dog.jpg"])?;
//!
//! let adapter = ImageAdapter::new();
//! let config = ImageConfig { requires_base64: true, ..ImageConfig::default() };
//! let artifact = adapter.adapt(registry.get("./cat.png").unwrap(), "anthropic", &config)?;
//! # let _ = artifact;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod images;
pub mod observability;
pub mod providers;
pub mod types;
pub mod utils;

pub use error::{DownloadFailure, ErrorCategory, PromptError};

/// Common imports for typical usage.
pub mod prelude {
    pub use crate::builder::PromptBuilder;
    pub use crate::error::{DownloadFailure, ErrorCategory, PromptError};
    pub use crate::images::{
        AdaptedImage, Downloader, ImageAdapter, ImageRecord, ImageRegistry, ImageSource,
        ObjectStoreConfig, SourceResolver,
    };
    pub use crate::providers::{AnthropicFormat, GeminiFormat, OpenAiFormat, ProviderFormat};
    pub use crate::types::{ContentPart, HttpConfig, ImageConfig, MessageRole, PromptMessage};
}
