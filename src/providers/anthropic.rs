//! Anthropic Messages formatter.

use serde_json::{Value, json};

use crate::error::PromptError;
use crate::images::ImageRegistry;
use crate::providers::ProviderFormat;
use crate::types::{ContentPart, ImageConfig, PromptMessage};

/// Formats messages for the Anthropic Messages API.
///
/// Anthropic takes inline base64 image sources, so every image must be
/// downloaded and encoded under the `anthropic` provider key before
/// formatting.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnthropicFormat;

impl AnthropicFormat {
    pub fn new() -> Self {
        Self
    }

    fn image_value(
        &self,
        source_path: &str,
        registry: &ImageRegistry,
    ) -> Result<Value, PromptError> {
        let record = registry
            .get(source_path)
            .ok_or_else(|| PromptError::UnknownImage {
                path: source_path.to_string(),
            })?;
        let encoded = record.encoded_for(self.provider_id())?;
        Ok(json!({
            "type": "image",
            "source": {
                "type": "base64",
                "media_type": record.media_type().unwrap_or("image/jpeg"),
                "data": encoded,
            },
        }))
    }
}

impl ProviderFormat for AnthropicFormat {
    fn provider_id(&self) -> &'static str {
        "anthropic"
    }

    fn image_config(&self) -> ImageConfig {
        ImageConfig {
            requires_base64: true,
            max_size: 5_000_000,
            needs_download: true,
            supported_media_types: vec![
                "image/png".to_string(),
                "image/jpeg".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
        }
    }

    fn format_messages(
        &self,
        messages: &[PromptMessage],
        registry: &ImageRegistry,
    ) -> Result<Value, PromptError> {
        let mut formatted = Vec::with_capacity(messages.len());
        for message in messages {
            let mut content = Vec::with_capacity(message.content.len());
            for part in &message.content {
                let value = match part {
                    ContentPart::Text { text } => json!({ "type": "text", "text": text }),
                    ContentPart::Image { source_path } => {
                        self.image_value(source_path, registry)?
                    }
                };
                content.push(value);
            }
            formatted.push(json!({
                "role": message.role.as_str(),
                "content": content,
            }));
        }
        Ok(json!({ "messages": formatted }))
    }
}
