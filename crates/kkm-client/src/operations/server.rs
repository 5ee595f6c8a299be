//! Gateway-level operations.

use crate::capabilities::{learn_setter, LearnDetails};
use crate::operation::{define_operation, DetailSetter, GetOperation, PostOperation};
use crate::server::Server;

define_operation!(
    /// Liveness check of the gateway itself.
    Ping, Server, "ping"
);

impl GetOperation for Ping {}

define_operation!(
    /// Searches for a device on the given connection and registers it.
    Learn, Server, "kkm/learn"
);

impl LearnDetails for Learn {}

impl PostOperation for Learn {
    fn detail_setter(key: &str) -> Option<DetailSetter<Self>> {
        learn_setter(key)
    }
}

define_operation!(
    /// Forgets every registered device.
    ResetRegistry, Server, "kkm/reset-registry"
);

impl PostOperation for ResetRegistry {
    fn detail_setter(_key: &str) -> Option<DetailSetter<Self>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use super::*;
    use crate::conn::ConnParams;
    use crate::error::ClientError;
    use crate::operation::Operation;
    use crate::testing::MockTransport;

    fn server(mock: &Arc<MockTransport>) -> Server {
        Server::with_transport(ConnParams::new("127.11.22.33:5757", "s", ""), mock.clone())
    }

    #[test]
    fn test_ping_path() {
        let mock = Arc::new(MockTransport::ok());
        let envelope = server(&mock).ping().perform();

        assert_eq!(envelope.http_status(), 200);
        assert_eq!(mock.last_request().unwrap().url, "https://127.11.22.33:5757/ping");
    }

    #[test]
    fn test_learn_sends_conn_params() {
        let mock = Arc::new(MockTransport::ok());
        let mut learn = server(&mock).learn();
        learn.set_conn_params("com,4").set_idempotency_key(None);
        learn.perform().unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(request.url, "https://127.11.22.33:5757/kkm/learn");
        assert_eq!(mock.last_body(), json!({"connParams": "com,4"}));
    }

    #[test]
    fn test_learn_bulk_and_reset_registry_keys() {
        let mock = Arc::new(MockTransport::ok());
        let Value::Object(bulk) = json!({"connParams": "tcpip,172.0.0.1"}) else {
            unreachable!()
        };

        let mut learn = server(&mock).learn();
        learn.set_details(&bulk, false).unwrap();
        assert_eq!(learn.details().get("connParams"), Some(&json!("tcpip,172.0.0.1")));

        let mut reset = server(&mock).reset_registry();
        assert!(matches!(
            reset.set_details(&bulk, false),
            Err(ClientError::UnknownDetailKey { method: "kkm/reset-registry", .. })
        ));
    }
}
