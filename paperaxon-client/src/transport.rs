//! HTTP transport for the PaperAxon backend
//!
//! Performs exactly one request per call and normalizes every failure into
//! [`AxonError::Http`] (the backend answered with a non-2xx status) or
//! [`AxonError::Network`] (no answer at all). Nothing is retried or cached here.

use paperaxon_core::{AxonError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Every backend endpoint lives under this prefix.
pub const API_PREFIX: &str = "/api";

/// How the 2xx body should be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseKind {
    #[default]
    Json,
    /// Prose such as interpretation output
    Text,
    /// Binary media
    Bytes,
}

/// A single file sent as `multipart/form-data`.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl FilePart {
    fn into_form(self) -> Result<Form> {
        let mut part = Part::bytes(self.bytes).file_name(self.filename);
        if let Some(content_type) = &self.content_type {
            part = part.mime_str(content_type).map_err(|e| {
                AxonError::InvalidArgument(format!("bad content type '{}': {}", content_type, e))
            })?;
        }
        Ok(Form::new().part(self.field, part))
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(FilePart),
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Serialized in order as `k=v` pairs joined by `&`
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub expect: ResponseKind,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, pairs: &[(String, String)]) -> Self {
        self.query.extend(pairs.iter().cloned());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, file: FilePart) -> Self {
        self.body = RequestBody::Multipart(file);
        self
    }

    pub fn expect(mut self, kind: ResponseKind) -> Self {
        self.expect = kind;
        self
    }
}

/// Decoded 2xx body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn into_json(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
            Self::Bytes(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text,
            Self::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Json(value) => value.to_string().into_bytes(),
            Self::Text(text) => text.into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transport {
    api_root: String,
    client: reqwest::Client,
}

impl Transport {
    /// Transport without any request timeout.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AxonError::network("failed to build HTTP client", e))?;
        Ok(Self {
            api_root: api_root(base_url),
            client,
        })
    }

    /// `<base_url>/api`, without a trailing slash.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Absolute URL for a path relative to the API root.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Payload> {
        let url = self.url(path);
        let mut req = self.client.request(method.clone(), &url);
        if !options.query.is_empty() {
            req = req.query(&options.query);
        }
        req = match options.body {
            RequestBody::Empty => req,
            RequestBody::Json(body) => req.json(&body),
            RequestBody::Multipart(file) => req.multipart(file.into_form()?),
        };

        debug!(%method, path, "sending request");
        let resp = req
            .send()
            .await
            .map_err(|e| AxonError::network(format!("{} {} failed", method, path), e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(err) => {
                    warn!(%method, path, error = %err, "could not read error body");
                    String::new()
                }
            };
            debug!(%method, path, status = status.as_u16(), "request failed");
            return Err(AxonError::Http {
                status: status.as_u16(),
                body,
            });
        }
        debug!(%method, path, status = status.as_u16(), "request succeeded");

        let read_err = |e: reqwest::Error| {
            AxonError::network(format!("reading {} {} response failed", method, path), e)
        };
        match options.expect {
            ResponseKind::Json => {
                let text = resp.text().await.map_err(read_err)?;
                if text.trim().is_empty() {
                    Ok(Payload::Json(Value::Null))
                } else {
                    Ok(Payload::Json(serde_json::from_str(&text)?))
                }
            }
            ResponseKind::Text => Ok(Payload::Text(resp.text().await.map_err(read_err)?)),
            ResponseKind::Bytes => Ok(Payload::Bytes(
                resp.bytes().await.map_err(read_err)?.to_vec(),
            )),
        }
    }
}

fn api_root(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.ends_with(API_PREFIX) {
        base.to_string()
    } else {
        format!("{}{}", base, API_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_root_normalization() {
        assert_eq!(api_root("http://localhost:18527"), "http://localhost:18527/api");
        assert_eq!(api_root("http://localhost:18527/"), "http://localhost:18527/api");
        assert_eq!(api_root("http://localhost:18527/api/"), "http://localhost:18527/api");
        assert_eq!(api_root(""), "/api");
    }

    #[test]
    fn payload_conversions() {
        assert_eq!(
            Payload::Text("hello".into()).into_json(),
            Value::String("hello".into())
        );
        assert_eq!(Payload::Bytes(b"abc".to_vec()).into_text(), "abc");
        assert_eq!(
            Payload::Json(serde_json::json!({"a": 1})).into_text(),
            r#"{"a":1}"#
        );
    }

    #[test]
    fn options_builder_appends_query_in_order() {
        let opts = RequestOptions::new()
            .query(&[("limit".into(), "5".into())])
            .query(&[("offset".into(), "10".into())])
            .expect(ResponseKind::Text);
        assert_eq!(opts.query[0].0, "limit");
        assert_eq!(opts.query[1].0, "offset");
        assert_eq!(opts.expect, ResponseKind::Text);
    }

    #[test]
    fn url_joins_api_root_and_path() {
        let transport = Transport::new("http://127.0.0.1:9").unwrap();
        assert_eq!(transport.url("/tasks/t1"), "http://127.0.0.1:9/api/tasks/t1");
    }
}
