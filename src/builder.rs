//! The prompt builder facade.
//!
//! Sequences one build session: collect messages, download every referenced
//! image once, adapt each image to each configured provider's budget, then
//! format per provider. The registry lives for the session and is reused
//! across providers, so an image referenced by three messages and consumed
//! by two providers is fetched exactly once and encoded once per provider.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::PromptError;
use crate::images::{Downloader, ImageAdapter, ImageRegistry};
use crate::providers::ProviderFormat;
use crate::types::{ImageConfig, PromptMessage};

/// Builds provider-ready prompts from accumulated messages.
pub struct PromptBuilder {
    messages: Vec<PromptMessage>,
    providers: Vec<Arc<dyn ProviderFormat>>,
    downloader: Downloader,
    adapter: ImageAdapter,
    registry: ImageRegistry,
    prompts: HashMap<String, Value>,
}

impl PromptBuilder {
    /// A builder with the default downloader (local-file + HTTP sources).
    pub fn new() -> Result<Self, PromptError> {
        Ok(Self::with_downloader(Downloader::new()?))
    }

    /// A builder over a caller-configured downloader (custom sources,
    /// object storage, HTTP settings).
    pub fn with_downloader(downloader: Downloader) -> Self {
        Self {
            messages: Vec::new(),
            providers: Vec::new(),
            downloader,
            adapter: ImageAdapter::new(),
            registry: ImageRegistry::new(),
            prompts: HashMap::new(),
        }
    }

    /// Append a system message.
    pub fn add_system_message(&mut self, text: impl Into<String>) {
        self.push(PromptMessage::system(text));
    }

    /// Append a user message.
    pub fn add_user_message(&mut self, text: impl Into<String>) {
        self.push(PromptMessage::user(text));
    }

    /// Append an assistant message.
    pub fn add_assistant_message(&mut self, text: impl Into<String>) {
        self.push(PromptMessage::assistant(text));
    }

    /// Append a user message referencing one image by path or URI.
    pub fn add_image_message(&mut self, source_path: impl Into<String>) {
        self.push(PromptMessage::image(source_path));
    }

    /// Append one image message per path.
    pub fn add_image_messages<I, S>(&mut self, source_paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in source_paths {
            self.add_image_message(path);
        }
    }

    /// Append an arbitrary message.
    pub fn push(&mut self, message: PromptMessage) {
        self.messages.push(message);
        // Any cached prompts are stale now.
        self.prompts.clear();
    }

    /// Register a provider formatter. Re-registering a provider id
    /// replaces the previous formatter.
    pub fn add_provider(&mut self, provider: Arc<dyn ProviderFormat>) {
        self.providers
            .retain(|p| p.provider_id() != provider.provider_id());
        self.providers.push(provider);
        self.prompts.clear();
    }

    /// The session's image registry.
    pub fn registry(&self) -> &ImageRegistry {
        &self.registry
    }

    /// Download, adapt, and format for every configured provider,
    /// blocking. Already-fetched images are not fetched again.
    pub fn build(&mut self) -> Result<(), PromptError> {
        if self.should_download() {
            let paths = self.referenced_image_paths();
            self.downloader.fetch_into(paths, &mut self.registry)?;
            self.encode_images()?;
        }
        self.format_prompts()
    }

    /// Concurrent-download variant of [`PromptBuilder::build`].
    pub async fn build_async(&mut self) -> Result<(), PromptError> {
        if self.should_download() {
            let paths = self.referenced_image_paths();
            self.downloader
                .fetch_into_async(paths, &mut self.registry)
                .await?;
            self.encode_images()?;
        }
        self.format_prompts()
    }

    /// The formatted prompt for a provider; `None` until built or for an
    /// unregistered provider id.
    pub fn prompt_for(&self, provider_id: &str) -> Option<&Value> {
        self.prompts.get(provider_id)
    }

    /// Reset messages, registry, and cached prompts for an independent
    /// build. Configured providers and sources are kept.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.registry.clear();
        self.prompts.clear();
    }

    /// Image paths referenced by the messages, deduplicated, in first-use
    /// order.
    fn referenced_image_paths(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for message in &self.messages {
            for path in message.image_paths() {
                if !seen.iter().any(|s: &String| s == path) {
                    seen.push(path.to_string());
                }
            }
        }
        seen
    }

    /// Whether any configured provider wants image bytes at all.
    fn should_download(&self) -> bool {
        self.providers
            .iter()
            .any(|provider| provider.image_config().needs_download)
    }

    fn encode_images(&mut self) -> Result<(), PromptError> {
        let provider_configs: Vec<(String, ImageConfig)> = self
            .providers
            .iter()
            .map(|p| (p.provider_id().to_string(), p.image_config()))
            .collect();
        let paths: Vec<String> = self.registry.paths().map(str::to_string).collect();

        for path in &paths {
            for (provider_id, config) in &provider_configs {
                if config.needs_download && config.requires_base64 {
                    self.adapter
                        .adapt_into_registry(&mut self.registry, path, provider_id, config)?;
                }
            }
        }
        Ok(())
    }

    fn format_prompts(&mut self) -> Result<(), PromptError> {
        for provider in &self.providers {
            let value = provider.format_messages(&self.messages, &self.registry)?;
            self.prompts
                .insert(provider.provider_id().to_string(), value);
        }
        Ok(())
    }
}
