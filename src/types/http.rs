//! HTTP configuration types.
//!
//! [`HttpConfig`] configures the HTTP behavior shared by every remote image
//! source: timeouts, user agent, and extra headers. Both the asynchronous and
//! the blocking `reqwest` clients are built from the same configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PromptError;

/// Default request timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connect timeout applied when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout
    #[serde(with = "duration_option_serde")]
    pub timeout: Option<Duration>,
    /// Connection timeout
    #[serde(with = "duration_option_serde")]
    pub connect_timeout: Option<Duration>,
    /// Custom headers sent with every request
    pub headers: HashMap<String, String>,
    /// User agent
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            headers: HashMap::new(),
            user_agent: Some(format!("pic-prompt/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl HttpConfig {
    /// Returns a builder for constructing `HttpConfig`
    pub fn builder() -> HttpConfigBuilder {
        HttpConfigBuilder::new()
    }

    /// Build the asynchronous `reqwest` client for this configuration.
    pub fn build_async_client(&self) -> Result<reqwest::Client, PromptError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder = builder.default_headers(self.header_map()?);
        builder
            .build()
            .map_err(|e| PromptError::Configuration(format!("failed to build HTTP client: {e}")))
    }

    /// Build the blocking `reqwest` client for this configuration.
    ///
    /// Blocking clients must not be used from inside an async runtime;
    /// they back the synchronous fetch paths only.
    pub fn build_blocking_client(&self) -> Result<reqwest::blocking::Client, PromptError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder = builder.default_headers(self.header_map()?);
        builder
            .build()
            .map_err(|e| PromptError::Configuration(format!("failed to build HTTP client: {e}")))
    }

    fn header_map(&self) -> Result<reqwest::header::HeaderMap, PromptError> {
        let mut map = reqwest::header::HeaderMap::new();
        for (key, value) in &self.headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| PromptError::Configuration(format!("invalid header '{key}': {e}")))?;
            let value = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| PromptError::Configuration(format!("invalid header '{key}': {e}")))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Builder for `HttpConfig` to construct configuration in a unified and safe way
#[derive(Debug, Clone, Default)]
pub struct HttpConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    headers: HashMap<String, String>,
    user_agent: Option<String>,
}

impl HttpConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = Some(connect_timeout);
        self
    }
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Build the configuration
    pub fn build(self) -> HttpConfig {
        let defaults = HttpConfig::default();
        HttpConfig {
            timeout: self.timeout.or(defaults.timeout),
            connect_timeout: self.connect_timeout.or(defaults.connect_timeout),
            headers: self.headers,
            user_agent: self.user_agent.or(defaults.user_agent),
        }
    }
}

// Helper module for Duration serialization
mod duration_option_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_secs().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
