//! The service endpoint calls are made against.
//!
//! A [`RestProxy`] owns the base URL (possibly a format that must be bound
//! first), the User-Agent and the [`HttpExecutor`] every call of the service
//! goes through. Calls hold an `Arc` to it and only ever read from it.

pub mod config;

pub use config::ProxyConfig;

use crate::base::callerror::CallError;
use crate::call::ProxyCall;
use crate::executor::{HttpExecutor, HyperExecutor};
use crate::http::builder::{Endpoint, PrepareHook};
use parking_lot::RwLock;
use std::sync::Arc;

const PLACEHOLDER: &str = "{}";

/// A REST service endpoint.
pub struct RestProxy {
    url_format: String,
    binding_required: bool,
    bound_url: RwLock<Option<String>>,
    user_agent: RwLock<Option<String>>,
    executor: Arc<dyn HttpExecutor>,
    prepare: Option<Arc<dyn PrepareHook>>,
}

impl RestProxy {
    /// Proxy for a fixed URL using the default [`HyperExecutor`].
    pub fn new(url: impl Into<String>) -> Arc<Self> {
        Self::with_config(ProxyConfig::new(url), Arc::new(HyperExecutor::new()))
    }

    /// Proxy from a configuration and an executor.
    pub fn with_config(config: ProxyConfig, executor: Arc<dyn HttpExecutor>) -> Arc<Self> {
        Arc::new(Self::from_parts(config, executor, None))
    }

    pub fn builder() -> RestProxyBuilder {
        RestProxyBuilder::default()
    }

    fn from_parts(
        config: ProxyConfig,
        executor: Arc<dyn HttpExecutor>,
        prepare: Option<Arc<dyn PrepareHook>>,
    ) -> Self {
        let bound_url = if config.binding_required {
            None
        } else {
            Some(config.url_format.clone())
        };
        Self {
            url_format: config.url_format,
            binding_required: config.binding_required,
            bound_url: RwLock::new(bound_url),
            user_agent: RwLock::new(config.user_agent),
            executor,
            prepare,
        }
    }

    pub fn url_format(&self) -> &str {
        &self.url_format
    }

    pub fn binding_required(&self) -> bool {
        self.binding_required
    }

    /// The URL calls currently go to, if bound.
    pub fn bound_url(&self) -> Option<String> {
        self.bound_url.read().clone()
    }

    /// Fill the `{}` placeholders of the URL format, in order.
    ///
    /// Fails with [`CallError::InvalidUrl`] if the number of values does not
    /// match the number of placeholders; the previous binding is kept.
    pub fn bind(&self, values: &[&str]) -> Result<(), CallError> {
        let expected = self.url_format.matches(PLACEHOLDER).count();
        if values.len() != expected {
            tracing::error!(
                format = %self.url_format,
                expected,
                given = values.len(),
                "wrong number of binding values"
            );
            return Err(CallError::InvalidUrl(format!(
                "{} expects {} binding values, got {}",
                self.url_format,
                expected,
                values.len()
            )));
        }

        let mut url = String::with_capacity(self.url_format.len());
        let mut pieces = self.url_format.split(PLACEHOLDER);
        if let Some(first) = pieces.next() {
            url.push_str(first);
        }
        for (piece, value) in pieces.zip(values) {
            url.push_str(value);
            url.push_str(piece);
        }

        tracing::debug!(url = %url, "proxy bound");
        *self.bound_url.write() = Some(url);
        Ok(())
    }

    pub fn user_agent(&self) -> Option<String> {
        self.user_agent.read().clone()
    }

    /// Set or clear the User-Agent used by calls built from now on.
    pub fn set_user_agent(&self, agent: Option<&str>) {
        *self.user_agent.write() = agent.map(str::to_string);
    }

    pub fn executor(&self) -> &Arc<dyn HttpExecutor> {
        &self.executor
    }

    /// Snapshot of what the request builder needs from the proxy.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            bound_url: self.bound_url(),
            binding_required: self.binding_required,
            user_agent: self.user_agent(),
        }
    }

    /// New call using the proxy's prepare hook, if any.
    pub fn new_call(self: &Arc<Self>) -> ProxyCall {
        ProxyCall::new(Arc::clone(self), self.prepare.clone())
    }

    /// New call with its own prepare hook, e.g. a signing step.
    pub fn new_call_with_hook(self: &Arc<Self>, hook: Arc<dyn PrepareHook>) -> ProxyCall {
        ProxyCall::new(Arc::clone(self), Some(hook))
    }
}

impl std::fmt::Debug for RestProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestProxy")
            .field("url_format", &self.url_format)
            .field("binding_required", &self.binding_required)
            .field("bound_url", &*self.bound_url.read())
            .field("user_agent", &*self.user_agent.read())
            .field("prepare", &self.prepare.is_some())
            .finish()
    }
}

/// Fluent construction of a [`RestProxy`].
#[derive(Default)]
pub struct RestProxyBuilder {
    config: ProxyConfig,
    executor: Option<Arc<dyn HttpExecutor>>,
    prepare: Option<Arc<dyn PrepareHook>>,
}

impl RestProxyBuilder {
    pub fn url_format(mut self, url: impl Into<String>) -> Self {
        self.config.url_format = url.into();
        self
    }

    pub fn binding_required(mut self, required: bool) -> Self {
        self.config.binding_required = required;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(agent.into());
        self
    }

    /// Transport to use instead of the default [`HyperExecutor`].
    pub fn executor(mut self, executor: Arc<dyn HttpExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Hook run on every call created with [`RestProxy::new_call`].
    pub fn prepare_hook(mut self, hook: Arc<dyn PrepareHook>) -> Self {
        self.prepare = Some(hook);
        self
    }

    pub fn build(self) -> Arc<RestProxy> {
        let executor = self
            .executor
            .unwrap_or_else(|| Arc::new(HyperExecutor::new()));
        Arc::new(RestProxy::from_parts(self.config, executor, self.prepare))
    }
}
