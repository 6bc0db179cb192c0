//! Call parameters.
//!
//! A [`Param`] is either a plain string or a binary blob carrying a file name
//! and content type. [`Params`] keeps them unique by name, in insertion order.

use bytes::Bytes;

/// Kind of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Blob,
}

/// A named request value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    kind: ParamKind,
    content: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
}

impl Param {
    /// Create a plain string parameter.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::String,
            content: Bytes::from(value.into()),
            content_type: Some("text/plain".to_string()),
            file_name: None,
        }
    }

    /// Create a binary parameter sent as a file part.
    pub fn blob<B>(name: impl Into<String>, content: B, content_type: impl Into<String>) -> Self
    where
        B: Into<Bytes>,
    {
        Self {
            name: name.into(),
            kind: ParamKind::Blob,
            content: content.into(),
            content_type: Some(content_type.into()),
            file_name: None,
        }
    }

    /// Set the file name reported for a blob.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn is_string(&self) -> bool {
        self.kind == ParamKind::String
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Text value of a string parameter.
    ///
    /// Returns `None` for blobs.
    pub fn as_str(&self) -> Option<&str> {
        match self.kind {
            ParamKind::String => std::str::from_utf8(&self.content).ok(),
            ParamKind::Blob => None,
        }
    }
}

/// Ordered set of parameters with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    params: Vec<Param>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, replacing any existing one with the same name.
    ///
    /// A replaced parameter keeps its position.
    pub fn add(&mut self, param: Param) {
        if let Some(existing) = self.params.iter_mut().find(|p| p.name == param.name) {
            *existing = param;
        } else {
            self.params.push(param);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Param> {
        let index = self.params.iter().position(|p| p.name == name)?;
        Some(self.params.remove(index))
    }

    /// Iterate `(name, param)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> + Clone {
        self.params.iter().map(|p| (p.name.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Whether every parameter is a plain string.
    ///
    /// An empty set counts as all strings.
    pub fn are_strings(&self) -> bool {
        self.params.iter().all(Param::is_string)
    }

    /// `(name, value)` pairs of the string parameters, for form encoding.
    pub fn as_string_pairs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .filter_map(|p| p.as_str().map(|v| (p.name.as_str(), v)))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
