//! Configuration and data-model types.

pub mod http;
pub mod image_config;
pub mod message;

pub use http::{HttpConfig, HttpConfigBuilder};
pub use image_config::ImageConfig;
pub use message::{ContentPart, MessageRole, PromptMessage};
