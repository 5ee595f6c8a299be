//! # HTTP Transport
//!
//! The single seam between the client and the network.
//!
//! ```text
//! ┌──────────────┐   HttpRequest    ┌──────────────────┐   HTTPS   ┌─────────┐
//! │  Performer   │ ───────────────► │  HttpTransport   │ ────────► │ Gateway │
//! │              │ ◄─────────────── │ (ReqwestTransport│ ◄──────── │         │
//! └──────────────┘  HttpReply / Err └──────────────────┘           └─────────┘
//! ```
//!
//! A transport only moves bytes. Interpreting the reply (JSON parsing,
//! synthetic `!` fields) belongs to the [`Performer`](crate::Performer).

use std::fmt;

use thiserror::Error;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Request / Reply
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing request, fully resolved.
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Header values carry the shared secret.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.headers.iter().map(|(n, _)| *n).collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &names)
            .field("body_len", &self.body.as_ref().map(String::len))
            .finish()
    }
}

/// Status line, the raw `X-Origin` header and the undecoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub origin: Option<String>,
    pub body: Vec<u8>,
}

/// The exchange did not complete (DNS, connect, TLS, read).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

// =============================================================================
// Transport Trait
// =============================================================================

/// Sends one request and waits for the full reply.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError>;
}

// =============================================================================
// Reqwest Implementation
// =============================================================================

/// Blocking `reqwest` client.
///
/// With `verify_tls == false` the peer certificate and host name are not
/// checked. The gateway ships with a self-signed certificate.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(verify_tls: bool) -> ClientResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| ClientError::InvalidConfiguration(format!("HTTP client: {}", e)))?;
        Ok(ReqwestTransport { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let origin = response
            .headers()
            .get("X-Origin")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpReply {
            status,
            origin,
            body: body.to_vec(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_header_lookup_ignores_case() {
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "https://h/ping".into(),
            headers: vec![("X-Secret", "s".into())],
            body: None,
        };
        assert_eq!(request.header("x-secret"), Some("s"));
        assert_eq!(request.header("X-Idempotency-Key"), None);
    }

    #[test]
    fn test_request_debug_hides_header_values() {
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: "https://h/kkm/1/sell".into(),
            headers: vec![("X-Secret", "top-secret".into())],
            body: Some("{}".into()),
        };
        let debug = format!("{:?}", request);
        assert!(debug.contains("X-Secret"));
        assert!(!debug.contains("top-secret"));
    }

    #[test]
    fn test_connection_refused_is_transport_error() {
        let transport = ReqwestTransport::new(false).unwrap();
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "https://127.0.0.1:1/ping".into(),
            headers: Vec::new(),
            body: None,
        };
        let err = transport.send(&request).unwrap_err();
        assert!(!err.0.is_empty());
    }
}
