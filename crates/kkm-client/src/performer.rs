//! # Performer
//!
//! Executes one GET or POST against the gateway and normalizes the outcome.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          perform_*_method                               │
//! │                                                                         │
//! │  1. normalize path          "/kkm/123/status/"  →  "kkm/123/status"    │
//! │  2. build request           https://{host}/{path}                      │
//! │                             X-Secret, X-Idempotency-Key                │
//! │                             (POST) Content-Type + JSON body            │
//! │  3. send + time             elapsed in milliseconds                    │
//! │  4. normalize               ┌── transport error ──► failure envelope   │
//! │                             ├── body not object ──► "Bad response"     │
//! │                             └── object ──────────► body + ! fields     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No retries. One call is one round trip.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use kkm_core::Details;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::conn::ConnParams;
use crate::envelope::{parse_origin, Envelope, BAD_RESPONSE};
use crate::error::ClientResult;
use crate::idempotency::generate_key;
use crate::transport::{HttpMethod, HttpRequest, HttpTransport, ReqwestTransport};

pub const SECRET_HEADER: &str = "X-Secret";
pub const IDEMPOTENCY_KEY_HEADER: &str = "X-Idempotency-Key";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

// =============================================================================
// Path Normalization
// =============================================================================

fn is_path_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Strips leading and trailing `/` and `\` from a method path.
pub fn normalize_path(path: &str) -> String {
    path.trim_matches(is_path_separator).to_string()
}

/// Joins whitespace-trimmed segments with `/`, then normalizes the result.
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    let joined = segments
        .iter()
        .map(|s| s.as_ref().trim())
        .collect::<Vec<_>>()
        .join("/");
    normalize_path(&joined)
}

// =============================================================================
// Performer
// =============================================================================

/// Connection descriptor plus a shared transport.
#[derive(Clone)]
pub struct Performer {
    conn: ConnParams,
    transport: Arc<dyn HttpTransport>,
}

impl Performer {
    /// Uses the default `reqwest` transport with TLS verification disabled.
    pub fn new(conn: ConnParams) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(false)?;
        Ok(Self::with_transport(conn, Arc::new(transport)))
    }

    pub fn with_transport(conn: ConnParams, transport: Arc<dyn HttpTransport>) -> Self {
        Performer { conn, transport }
    }

    pub fn conn_params(&self) -> &ConnParams {
        &self.conn
    }

    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&self.transport)
    }

    /// Read-only request. A key is generated when none is given.
    pub fn perform_get_method(&self, path: &str, key: Option<&str>) -> Envelope {
        let key = key.map_or_else(generate_key, str::to_string);
        let headers = vec![
            (SECRET_HEADER, self.conn.secret().to_string()),
            (IDEMPOTENCY_KEY_HEADER, key),
        ];
        self.execute(HttpMethod::Get, path, headers, None)
    }

    /// Mutating request with a JSON body (`{}` when details are empty).
    pub fn perform_post_method(&self, path: &str, details: &Details, key: &str) -> Envelope {
        let body = details.to_body().to_string();
        let headers = vec![
            (SECRET_HEADER, self.conn.secret().to_string()),
            (IDEMPOTENCY_KEY_HEADER, key.to_string()),
            (CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE.to_string()),
        ];
        self.execute(HttpMethod::Post, path, headers, Some(body))
    }

    fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        headers: Vec<(&'static str, String)>,
        body: Option<String>,
    ) -> Envelope {
        let path = normalize_path(path);
        let request = HttpRequest {
            method,
            url: format!("https://{}/{}", self.conn.host(), path),
            headers,
            body,
        };

        debug!(
            method = %method,
            host = %self.conn.host(),
            path = %path,
            key = request.header(IDEMPOTENCY_KEY_HEADER).unwrap_or(""),
            "Dispatching request"
        );

        let started = Instant::now();
        let reply = match self.transport.send(&request) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(method = %method, path = %path, error = %e, "Transport error");
                return Envelope::failure(e.to_string(), "");
            }
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let origin = reply.origin.as_deref().map(parse_origin).unwrap_or_default();

        match serde_json::from_slice::<Value>(&reply.body) {
            Ok(Value::Object(body)) => {
                info!(
                    method = %method,
                    path = %path,
                    status = reply.status,
                    origin = %origin,
                    elapsed_ms,
                    "Request completed"
                );
                Envelope::from_reply(body, reply.status, &origin, elapsed_ms)
            }
            _ => {
                warn!(
                    method = %method,
                    path = %path,
                    status = reply.status,
                    body_len = reply.body.len(),
                    "Response body is not a JSON object"
                );
                Envelope::failure(BAD_RESPONSE, origin)
            }
        }
    }
}

impl fmt::Debug for Performer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Performer")
            .field("conn", &self.conn)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
