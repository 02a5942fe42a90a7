//! Declarative description of a single HTTP call.
//!
//! # Design
//! `RequestDescriptor` is an immutable value assembled with consuming
//! `with_*` methods. It never touches the network: `build` composes the URL
//! and produces the `HttpRequest` the transport will execute. URL and body
//! failures are detected here, so a bad descriptor never reaches a
//! transport.

use std::time::Duration;

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use url::Url;

use crate::error::ApiError;
use crate::http::{find_header, HttpMethod, HttpRequest};

pub const CONTENT_TYPE: &str = "content-type";
pub const APPLICATION_JSON: &str = "application/json";

/// Everything except RFC 3986 unreserved characters is escaped, so a space
/// becomes `%20` and `+`, `&`, `=` survive as data.
const QUERY_ITEM: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Immutable description of one HTTP call before it is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    base_url: String,
    path: String,
    method: HttpMethod,
    query_items: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    timeout: Option<Duration>,
    retries: u32,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
            method,
            query_items: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: None,
            retries: 0,
        }
    }

    pub fn get(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, base_url, path)
    }

    pub fn post(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, base_url, path)
    }

    pub fn put(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, base_url, path)
    }

    pub fn patch(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, base_url, path)
    }

    pub fn delete(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, base_url, path)
    }

    /// Append a query item. Items keep their insertion order and are
    /// percent-encoded when the URL is composed.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_items.push((key.into(), value.into()));
        self
    }

    /// Set a header, replacing any previous value for the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.with_header("Authorization", value)
    }

    /// Attach raw body bytes. Ignored by `build` for GET.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body. GET never sends a body, so the
    /// value is not serialized at all for GET.
    pub fn with_json<B: Serialize + ?Sized>(self, value: &B) -> Result<Self, ApiError> {
        if !self.method.allows_body() {
            return Ok(self);
        }
        let body = serde_json::to_vec(value).map_err(ApiError::EncodingFailed)?;
        Ok(self.with_body(body))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Extra attempts after a failed one. Zero means a single attempt.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn query_items(&self) -> &[(String, String)] {
        &self.query_items
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The body as it will be sent: always `None` for GET.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref().filter(|_| self.method.allows_body())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Compose base URL, path and query items into an absolute URL.
    ///
    /// The base URL must be absolute with a host on its own; the path is
    /// never allowed to supply the host.
    pub fn url(&self) -> Result<Url, ApiError> {
        let joined = join_url(&self.base_url, &self.path);
        let invalid = || ApiError::InvalidUrl(joined.clone());

        let base = Url::parse(&self.base_url).map_err(|_| invalid())?;
        if base.cannot_be_a_base() || !base.has_host() {
            return Err(invalid());
        }
        let mut url = Url::parse(&joined).map_err(|_| invalid())?;
        if url.host_str() != base.host_str() || url.port() != base.port() {
            return Err(invalid());
        }

        if !self.query_items.is_empty() {
            let encoded = self
                .query_items
                .iter()
                .map(|(key, value)| {
                    format!(
                        "{}={}",
                        utf8_percent_encode(key, QUERY_ITEM),
                        utf8_percent_encode(value, QUERY_ITEM)
                    )
                })
                .collect::<Vec<_>>()
                .join("&");
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                _ => encoded,
            };
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    /// Produce the transport request.
    ///
    /// A `content-type: application/json` header is added when a body is
    /// present and the descriptor does not set its own content type.
    pub fn build(&self) -> Result<HttpRequest, ApiError> {
        let url = self.url()?;
        let body = self.body().cloned();
        let mut headers = self.headers.clone();
        if body.is_some() && find_header(&headers, CONTENT_TYPE).is_none() {
            headers.push((CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()));
        }
        Ok(HttpRequest {
            method: self.method,
            url: url.into(),
            headers,
            body,
            timeout: self.timeout,
        })
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}
