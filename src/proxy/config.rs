//! Proxy configuration.

use serde::Deserialize;

/// Configuration of a [`RestProxy`](super::RestProxy).
///
/// Deserializable so services can ship endpoints in a config file:
///
/// ```rust,ignore
/// let config: ProxyConfig = serde_json::from_str(
///     r#"{ "url_format": "https://api.example.com/{}/", "binding_required": true }"#,
/// )?;
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Base URL, or a format with `{}` placeholders when binding is required.
    pub url_format: String,

    /// Whether calls need [`RestProxy::bind`](super::RestProxy::bind) first.
    pub binding_required: bool,

    /// User-Agent applied to every call.
    pub user_agent: Option<String>,
}

impl ProxyConfig {
    /// Config for a fixed base URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url_format: url.into(),
            ..Default::default()
        }
    }

    /// Mark the URL as a format that needs binding.
    pub fn binding_required(mut self, required: bool) -> Self {
        self.binding_required = required;
        self
    }

    /// Set the User-Agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }
}
