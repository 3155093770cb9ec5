//! OpenAI chat-completions formatter.

use serde_json::{Value, json};

use crate::error::PromptError;
use crate::images::ImageRegistry;
use crate::providers::ProviderFormat;
use crate::types::{ContentPart, ImageConfig, PromptMessage};

/// Formats messages for the OpenAI chat completions API.
///
/// OpenAI accepts remote image URLs directly, so images are passed through
/// as references by default and no download is required. When a record
/// carries an OpenAI encoding anyway (e.g. for a local file that was
/// fetched for another provider), it is embedded as a `data:` URI.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiFormat;

impl OpenAiFormat {
    pub fn new() -> Self {
        Self
    }

    fn image_value(&self, source_path: &str, registry: &ImageRegistry) -> Value {
        if let Some(record) = registry.get(source_path)
            && let Ok(encoded) = record.encoded_for(self.provider_id())
        {
            let media_type = record.media_type().unwrap_or("image/jpeg");
            return json!({
                "type": "image_url",
                "image_url": { "url": format!("data:{media_type};base64,{encoded}") },
            });
        }
        json!({
            "type": "image_url",
            "image_url": { "url": source_path },
        })
    }
}

impl ProviderFormat for OpenAiFormat {
    fn provider_id(&self) -> &'static str {
        "openai"
    }

    fn image_config(&self) -> ImageConfig {
        ImageConfig {
            requires_base64: false,
            max_size: 5_000_000,
            needs_download: false,
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
            let content: Vec<Value> = message
                .content
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => json!({ "type": "text", "text": text }),
                    ContentPart::Image { source_path } => self.image_value(source_path, registry),
                })
                .collect();
            formatted.push(json!({
                "role": message.role.as_str(),
                "content": content,
            }));
        }
        Ok(json!({ "messages": formatted }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageRecord;
    use crate::types::MessageRole;

    #[test]
    fn urls_pass_through_without_download() {
        let registry = ImageRegistry::new();
        let mut message = PromptMessage::user("describe");
        message.add_image("https://example.com/cat.png");

        let value = OpenAiFormat::new()
            .format_messages(&[message], &registry)
            .unwrap();
        assert_eq!(
            value["messages"][0]["content"][1]["image_url"]["url"],
            "https://example.com/cat.png"
        );
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn encoded_records_become_data_uris() {
        let png = {
            use image::{DynamicImage, ImageFormat, RgbImage};
            let mut buf = Vec::new();
            DynamicImage::ImageRgb8(RgbImage::new(2, 2))
                .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
                .unwrap();
            buf
        };
        let mut record = ImageRecord::with_bytes("local.png", png, None).unwrap();
        record.add_encoded("openai", "QUJD".into());
        let mut registry = ImageRegistry::new();
        registry.register_record(record);

        let message = PromptMessage::image("local.png");
        let value = OpenAiFormat::new()
            .format_messages(&[message], &registry)
            .unwrap();
        assert_eq!(
            value["messages"][0]["content"][0]["image_url"]["url"],
            "data:image/png;base64,QUJD"
        );
    }

    #[test]
    fn roles_serialize_by_wire_name() {
        let registry = ImageRegistry::new();
        let messages = vec![
            PromptMessage::system("be brief"),
            PromptMessage::new(MessageRole::Assistant),
        ];
        let value = OpenAiFormat::new()
            .format_messages(&messages, &registry)
            .unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "assistant");
    }
}
