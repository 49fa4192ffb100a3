//! # HTTP Request
//!
//! Request wrapper decoupled from hyper's streaming body: the body is
//! collected once (bounded by the configured limit) and headers are kept
//! for middleware and request-id propagation.

use crate::error::{Error, Result};
use crate::json::parse_json_bytes;
use crate::router::Method;
use crate::types::ParamValue;
use crate::validation::{FieldError, ValidationErrors};
use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_LENGTH};
use hyper::{HeaderMap, Request};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;

/// HTTP request as seen by middleware and handlers
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Request path (without query string)
    pub path: String,
    /// Typed path parameters, filled in after routing
    pub typed_params: HashMap<String, ParamValue>,
    /// Request headers
    headers: HeaderMap,
    /// Request body (collected)
    body: Option<Bytes>,
    /// When the request reached the server
    received_at: Instant,
}

impl HttpRequest {
    /// Create a request manually (for testing/internal use)
    ///
    /// Any query string on `path` is dropped.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        headers_map: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> Self {
        let mut path = path.into();
        if let Some(idx) = path.find('?') {
            path.truncate(idx);
        }

        let mut headers = HeaderMap::new();
        for (k, v) in headers_map {
            if let (Ok(n), Ok(v)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(&v),
            ) {
                headers.insert(n, v);
            }
        }

        Self {
            method,
            path,
            typed_params: HashMap::new(),
            headers,
            body,
            received_at: Instant::now(),
        }
    }

    /// Create from hyper request with body size limit
    ///
    /// # Errors
    ///
    /// - `Error::MethodNotAllowed` for methods the router never serves
    /// - `Error::PayloadTooLarge` if the declared or actual body exceeds
    ///   `max_body_size`
    /// - `Error::Http` if the body stream fails
    pub async fn from_hyper_with_limit(
        req: Request<hyper::body::Incoming>,
        max_body_size: usize,
    ) -> Result<Self> {
        let received_at = Instant::now();
        let path = req.uri().path().to_string();
        let method = Method::from_hyper(req.method()).ok_or_else(|| Error::MethodNotAllowed {
            method: req.method().to_string(),
            path: path.clone(),
        })?;

        let headers = req.headers().clone();
        let declared_len = headers
            .get(CONTENT_LENGTH)
            .and_then(|len| len.to_str().ok())
            .and_then(|len| len.parse::<usize>().ok());
        if let Some(content_len) = declared_len {
            if content_len > max_body_size {
                return Err(Error::PayloadTooLarge {
                    limit: max_body_size,
                    actual: content_len,
                });
            }
        }

        let bytes = req.into_body().collect().await?.to_bytes();
        if bytes.len() > max_body_size {
            return Err(Error::PayloadTooLarge {
                limit: max_body_size,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            method,
            path,
            typed_params: HashMap::new(),
            headers,
            body: if bytes.is_empty() { None } else { Some(bytes) },
            received_at,
        })
    }

    /// Instant the request was received
    #[must_use]
    pub const fn received_at(&self) -> Instant {
        self.received_at
    }

    /// Get a header value by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set or override a header
    pub fn set_header(&mut self, name: &str, value: &str) {
        if let (Ok(n), Ok(v)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(n, v);
        }
    }

    /// Get the request body as bytes
    #[must_use]
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Parse the body as JSON
    ///
    /// A missing or malformed body is a validation failure on the `body`
    /// field, reported as 422 like any other schema mismatch.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the body is absent or not valid JSON.
    pub fn json(&self) -> Result<Value> {
        let Some(body) = self.body_bytes() else {
            let mut errors = ValidationErrors::new();
            errors.add_required("body");
            return Err(Error::Validation(errors));
        };

        let mut bytes = body.to_vec();
        parse_json_bytes(&mut bytes).map_err(|e| {
            let mut errors = ValidationErrors::new();
            errors.add(FieldError::invalid_format("body", e));
            Error::Validation(errors)
        })
    }
}
