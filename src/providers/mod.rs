//! Per-provider prompt formatting.
//!
//! Formatters read fetched and encoded image state from the registry and
//! shape messages into each provider's content layout. They cover text and
//! image parts only; full provider wire schemas (tool calls, sampling
//! parameters, and so on) are out of scope here.

mod anthropic;
mod gemini;
mod openai;

pub use anthropic::AnthropicFormat;
pub use gemini::GeminiFormat;
pub use openai::OpenAiFormat;

use crate::error::PromptError;
use crate::images::ImageRegistry;
use crate::types::{ImageConfig, PromptMessage};

/// A provider-specific message serializer.
///
/// Implementations only read the registry; images that a provider needs
/// encoded must be adapted before formatting, or formatting fails with
/// [`PromptError::NotEncoded`].
pub trait ProviderFormat: Send + Sync {
    /// Stable provider identifier, also the key for encoded-image caches.
    fn provider_id(&self) -> &'static str;

    /// The provider's image requirements.
    fn image_config(&self) -> ImageConfig;

    /// Serialize the messages into the provider's content layout.
    fn format_messages(
        &self,
        messages: &[PromptMessage],
        registry: &ImageRegistry,
    ) -> Result<serde_json::Value, PromptError>;
}
