//! Encoded request body.

use crate::http::multipart::Form;
use crate::http::params::Params;
use bytes::Bytes;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Body produced from a call's parameters.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body (parameters went into the query string, or there are none).
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` body.
    UrlEncoded(Bytes),
    /// `multipart/form-data` body.
    Multipart { content_type: String, body: Bytes },
}

impl RequestBody {
    /// URL-encode string pairs into a form body.
    pub fn url_encoded(params: &Params) -> Self {
        RequestBody::UrlEncoded(Bytes::from(encode_pairs(params)))
    }

    /// Encode every parameter as a multipart part.
    pub fn multipart(params: &Params) -> Self {
        let form = Form::from_params(params);
        RequestBody::Multipart {
            content_type: form.content_type(),
            body: form.into_body(),
        }
    }

    /// Content-Type header value for this body.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            RequestBody::Empty => None,
            RequestBody::UrlEncoded(_) => Some(FORM_URLENCODED),
            RequestBody::Multipart { content_type, .. } => Some(content_type),
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart { .. })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            RequestBody::Empty => 0,
            RequestBody::UrlEncoded(b) => b.len(),
            RequestBody::Multipart { body, .. } => body.len(),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            RequestBody::Empty => Bytes::new(),
            RequestBody::UrlEncoded(b) => b,
            RequestBody::Multipart { body, .. } => body,
        }
    }
}

/// `application/x-www-form-urlencoded` serialization of the string params.
pub fn encode_pairs(params: &Params) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.as_string_pairs())
        .finish()
}
