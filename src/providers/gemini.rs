//! Google Gemini formatter.

use serde_json::{Value, json};

use crate::error::PromptError;
use crate::images::ImageRegistry;
use crate::providers::ProviderFormat;
use crate::types::{ContentPart, ImageConfig, MessageRole, PromptMessage};

/// Formats messages for the Gemini `generateContent` API.
///
/// Gemini takes inline base64 data parts; the assistant role maps to
/// `model` on the wire.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiFormat;

impl GeminiFormat {
    pub fn new() -> Self {
        Self
    }

    fn role_name(role: MessageRole) -> &'static str {
        match role {
            MessageRole::Assistant => "model",
            other => other.as_str(),
        }
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
            "inline_data": {
                "mime_type": record.media_type().unwrap_or("image/jpeg"),
                "data": encoded,
            },
        }))
    }
}

impl ProviderFormat for GeminiFormat {
    fn provider_id(&self) -> &'static str {
        "gemini"
    }

    fn image_config(&self) -> ImageConfig {
        ImageConfig {
            requires_base64: true,
            max_size: 10_000_000,
            needs_download: true,
            supported_media_types: vec![
                "image/png".to_string(),
                "image/jpeg".to_string(),
                "image/webp".to_string(),
                "image/heic".to_string(),
            ],
        }
    }

    fn format_messages(
        &self,
        messages: &[PromptMessage],
        registry: &ImageRegistry,
    ) -> Result<Value, PromptError> {
        let mut contents = Vec::with_capacity(messages.len());
        for message in messages {
            let mut parts = Vec::with_capacity(message.content.len());
            for part in &message.content {
                let value = match part {
                    ContentPart::Text { text } => json!({ "text": text }),
                    ContentPart::Image { source_path } => {
                        self.image_value(source_path, registry)?
                    }
                };
                parts.push(value);
            }
            contents.push(json!({
                "role": Self::role_name(message.role),
                "parts": parts,
            }));
        }
        Ok(json!({ "contents": contents }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageRecord;

    #[test]
    fn assistant_maps_to_model_role() {
        let registry = ImageRegistry::new();
        let messages = vec![
            PromptMessage::user("hi"),
            PromptMessage::assistant("hello"),
        ];
        let value = GeminiFormat::new()
            .format_messages(&messages, &registry)
            .unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["contents"][1]["parts"][0]["text"], "hello");
    }

    #[test]
    fn images_become_inline_data() {
        let png = {
            use image::{DynamicImage, ImageFormat, RgbImage};
            let mut buf = Vec::new();
            DynamicImage::ImageRgb8(RgbImage::new(2, 2))
                .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
                .unwrap();
            buf
        };
        let mut record = ImageRecord::with_bytes("a.png", png, None).unwrap();
        record.add_encoded("gemini", "aW1n".into());
        let mut registry = ImageRegistry::new();
        registry.register_record(record);

        let value = GeminiFormat::new()
            .format_messages(&[PromptMessage::image("a.png")], &registry)
            .unwrap();
        let inline = &value["contents"][0]["parts"][0]["inline_data"];
        assert_eq!(inline["mime_type"], "image/png");
        assert_eq!(inline["data"], "aW1n");
    }

    #[test]
    fn fetched_but_unencoded_is_not_encoded_error() {
        let png = {
            use image::{DynamicImage, ImageFormat, RgbImage};
            let mut buf = Vec::new();
            DynamicImage::ImageRgb8(RgbImage::new(2, 2))
                .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
                .unwrap();
            buf
        };
        let mut registry = ImageRegistry::new();
        registry.register_record(ImageRecord::with_bytes("a.png", png, None).unwrap());

        let err = GeminiFormat::new()
            .format_messages(&[PromptMessage::image("a.png")], &registry)
            .unwrap_err();
        assert!(matches!(err, PromptError::NotEncoded { .. }));
    }
}
