//! Recording transport for unit tests.

use std::sync::Mutex;

use serde_json::Value;

use crate::transport::{HttpReply, HttpRequest, HttpTransport, TransportError};

pub(crate) struct MockTransport {
    outcome: Result<HttpReply, TransportError>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn replying(status: u16, origin: Option<&str>, body: &str) -> Self {
        Self::replying_bytes(status, origin, body.as_bytes())
    }

    pub(crate) fn replying_bytes(status: u16, origin: Option<&str>, body: &[u8]) -> Self {
        MockTransport {
            outcome: Ok(HttpReply {
                status,
                origin: origin.map(str::to_string),
                body: body.to_vec(),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn ok() -> Self {
        Self::replying(200, Some("kkm"), r#"{"success":true}"#)
    }

    pub(crate) fn failing(message: &str) -> Self {
        MockTransport {
            outcome: Err(TransportError(message.to_string())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Body of the last request parsed as JSON.
    pub(crate) fn last_body(&self) -> Value {
        let request = self.last_request().expect("no request recorded");
        serde_json::from_str(request.body.as_deref().expect("request has no body"))
            .expect("body is not JSON")
    }
}

impl HttpTransport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcome.clone()
    }
}
