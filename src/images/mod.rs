//! The image acquisition and adaptation pipeline.
//!
//! Paths are registered in an [`ImageRegistry`], fetched through pluggable
//! [`sources`] by the [`Downloader`], and adapted to per-provider byte
//! budgets by the [`ImageAdapter`]. The registry deduplicates work across
//! providers and messages: each image is fetched once and encoded once per
//! provider, regardless of how many places reference it.

pub mod adapter;
pub mod downloader;
pub mod record;
pub mod registry;
pub mod sources;

pub use adapter::{AdaptedImage, ImageAdapter};
pub use downloader::Downloader;
pub use record::ImageRecord;
pub use registry::ImageRegistry;
pub use sources::{
    HttpSource, ImageSource, LocalFileSource, ObjectStoreConfig, ObjectStoreSource, SourcePayload,
    SourceResolver,
};
