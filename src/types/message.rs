//! Prompt message data model.
//!
//! A deliberately small model: messages carry a role and a list of content
//! parts, and image parts carry only an opaque `source_path`. Roles are never
//! interpreted by the image pipeline; they exist for the provider formatters.

use serde::{Deserialize, Serialize};

/// Message sender role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One piece of message content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    /// Plain text.
    Text { text: String },
    /// An image referenced by path or URI; bytes are resolved later by the
    /// image pipeline.
    Image { source_path: String },
}

impl ContentPart {
    /// Create a text content part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an image content part from a path or URI
    pub fn image(source_path: impl Into<String>) -> Self {
        Self::Image {
            source_path: source_path.into(),
        }
    }

    /// Check if this is an image part
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }

    /// Get the image path if this is an image part
    pub fn as_image_path(&self) -> Option<&str> {
        match self {
            Self::Image { source_path } => Some(source_path),
            _ => None,
        }
    }
}

/// A single chat message: a role plus ordered content parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: Vec<ContentPart>,
}

impl PromptMessage {
    /// Create an empty message with the given role.
    pub fn new(role: MessageRole) -> Self {
        Self {
            role,
            content: Vec::new(),
        }
    }

    /// Create a system message with one text part.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: vec![ContentPart::text(text)],
        }
    }

    /// Create a user message with one text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentPart::text(text)],
        }
    }

    /// Create an assistant message with one text part.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: vec![ContentPart::text(text)],
        }
    }

    /// Create a user message with one image part.
    pub fn image(source_path: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentPart::image(source_path)],
        }
    }

    /// Append a text part.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.content.push(ContentPart::text(text));
    }

    /// Append an image part.
    pub fn add_image(&mut self, source_path: impl Into<String>) {
        self.content.push(ContentPart::image(source_path));
    }

    /// Paths of every image part, in order.
    pub fn image_paths(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(ContentPart::as_image_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_and_paths() {
        let mut message = PromptMessage::user("look at these");
        message.add_image("a.png");
        message.add_image("https://example.com/b.jpg");

        assert_eq!(message.role, MessageRole::User);
        let paths: Vec<&str> = message.image_paths().collect();
        assert_eq!(paths, vec!["a.png", "https://example.com/b.jpg"]);
    }

    #[test]
    fn content_part_serde_shape() {
        let json = serde_json::to_value(ContentPart::image("x.png")).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["source_path"], "x.png");
    }
}
