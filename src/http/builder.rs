//! Request builder: turns a call's accumulated configuration into a wire
//! request.
//!
//! The steps run in a fixed order:
//! 1. resolve the proxy's bound URL and append the call's function,
//! 2. run the prepare hook (signing, extra params),
//! 3. encode parameters as a URL-encoded form or as multipart,
//! 4. apply the proxy user agent, then the call's own headers on top.

use crate::base::callerror::CallError;
use crate::http::headers::Headers;
use crate::http::params::Params;
use crate::http::requestbody::RequestBody;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, Method, Request};
use url::Url;

/// Configuration a call accumulates before it runs.
#[derive(Debug, Clone)]
pub struct CallConfig {
    method: String,
    function: Option<String>,
    params: Params,
    headers: Headers,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            function: None,
            params: Params::new(),
            headers: Headers::new(),
        }
    }
}

impl CallConfig {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn set_method(&mut self, method: impl Into<String>) {
        self.method = method.into();
    }

    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    pub fn set_function(&mut self, function: Option<String>) {
        self.function = function;
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }
}

/// Proxy-side inputs to a build, snapshotted from the proxy.
#[derive(Debug, Clone, Default)]
pub struct Endpoint {
    pub bound_url: Option<String>,
    pub binding_required: bool,
    pub user_agent: Option<String>,
}

impl Endpoint {
    /// The base URL calls are sent to.
    pub fn base_url(&self) -> Result<&str, CallError> {
        match self.bound_url.as_deref() {
            Some(url) => Ok(url),
            None => {
                tracing::error!(
                    binding_required = self.binding_required,
                    "URL requires binding and is unbound"
                );
                Err(CallError::Unbound)
            }
        }
    }
}

/// Hook run right before encoding, e.g. to sign a call.
///
/// It sees the composed URL and may change anything in the configuration;
/// changes persist on the call. An error aborts the build unchanged.
///
/// The call is not locked while the hook runs, so the hook may read the
/// call through its own API. Changes must go through `config`: it replaces
/// the call's configuration once the build succeeds.
pub trait PrepareHook: Send + Sync {
    fn prepare(&self, url: &str, config: &mut CallConfig) -> Result<(), CallError>;
}

impl<F> PrepareHook for F
where
    F: Fn(&str, &mut CallConfig) -> Result<(), CallError> + Send + Sync,
{
    fn prepare(&self, url: &str, config: &mut CallConfig) -> Result<(), CallError> {
        self(url, config)
    }
}

/// Join a base URL and a function with exactly one `/`.
pub fn compose_url(base: &str, function: Option<&str>) -> String {
    match function {
        None => base.to_string(),
        Some(function) => match (base.ends_with('/'), function.starts_with('/')) {
            (true, true) => format!("{}{}", base, &function[1..]),
            (false, false) => format!("{}/{}", base, function),
            _ => format!("{}{}", base, function),
        },
    }
}

/// Methods whose string parameters travel in the query string.
fn params_in_query(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::DELETE)
}

/// Build the wire request for a call.
pub fn build_request(
    endpoint: &Endpoint,
    config: &mut CallConfig,
    hook: Option<&dyn PrepareHook>,
) -> Result<Request<Bytes>, CallError> {
    let url = compose_url(endpoint.base_url()?, config.function());

    if let Some(hook) = hook {
        hook.prepare(&url, config)?;
    }

    let mut method = Method::from_bytes(config.method().as_bytes())
        .map_err(|_| CallError::InvalidMethod(config.method().to_string()))?;
    let mut url = Url::parse(&url).map_err(|e| CallError::InvalidUrl(format!("{url}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        tracing::error!(url = %url, "unsupported URL scheme");
        return Err(CallError::InvalidUrl(format!(
            "{url}: unsupported scheme {}",
            url.scheme()
        )));
    }

    let params = config.params();
    let body = if params.are_strings() {
        if params_in_query(&method) {
            if !params.is_empty() {
                url.query_pairs_mut().extend_pairs(params.as_string_pairs());
            }
            RequestBody::Empty
        } else {
            RequestBody::url_encoded(params)
        }
    } else {
        method = Method::POST;
        RequestBody::multipart(params)
    };

    let mut headers = HeaderMap::new();
    if let Some(agent) = endpoint.user_agent.as_deref() {
        let value = HeaderValue::from_str(agent)
            .map_err(|_| CallError::InvalidHeader(USER_AGENT.to_string()))?;
        headers.insert(USER_AGENT, value);
    }
    if let Some(mime) = body.content_type() {
        let value = HeaderValue::from_str(mime)
            .map_err(|_| CallError::InvalidHeader(CONTENT_TYPE.to_string()))?;
        headers.insert(CONTENT_TYPE, value);
    }
    config.headers().apply_to(&mut headers)?;

    tracing::debug!(
        method = %method,
        url = %url,
        multipart = body.is_multipart(),
        body_len = body.len(),
        "built request"
    );

    let mut request = Request::builder()
        .method(method)
        .uri(url.as_str())
        .body(body.into_bytes())
        .map_err(|e| CallError::InvalidUrl(e.to_string()))?;
    *request.headers_mut() = headers;
    Ok(request)
}
