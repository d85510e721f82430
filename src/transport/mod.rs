//! Transport layer between the client and the server.
//!
//! A [`Transport`] carries one [`Request`] and returns the server's
//! [`Response`]. `Err` means the network layer failed; a `Response` with
//! `errors` is an application-layer failure and is returned as `Ok`.

mod mock;

use std::sync::Arc;

use tracing::trace;

use crate::error::{BooksError, TransportError};
use crate::ir::{from_json, to_json_pretty, Request, Response};
use crate::server::LibraryServer;

pub use mock::{MockTransport, MockedResponse, MockedResult};

/// Sends requests to a server.
pub trait Transport: Send + Sync {
    /// Execute `request` and return the server's response.
    ///
    /// # Errors
    /// Returns a [`TransportError`] when the request never reached the server
    /// or no response came back.
    fn execute(&self, request: &Request) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).execute(request)
    }
}

/// Calls a [`LibraryServer`] in the same process.
///
/// Requests go through a JSON round trip so that anything the server sees
/// could also have been sent over the wire.
#[derive(Clone)]
pub struct InProcessTransport {
    server: Arc<LibraryServer>,
}

impl InProcessTransport {
    /// Wrap `server`.
    #[must_use]
    pub fn new(server: Arc<LibraryServer>) -> Self {
        Self { server }
    }

    /// The server behind this transport.
    #[must_use]
    pub fn server(&self) -> &LibraryServer {
        &self.server
    }
}

fn transport_error(err: BooksError) -> TransportError {
    match err {
        BooksError::Transport(inner) => inner,
        other => TransportError::Serialization {
            message: other.to_string(),
        },
    }
}

impl Transport for InProcessTransport {
    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        let wire = to_json_pretty(request).map_err(transport_error)?;
        trace!(request_id = %request.request_id, bytes = wire.len(), "in-process request");
        let decoded = from_json(&wire).map_err(transport_error)?;
        Ok(self.server.execute(&decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::catalog;
    use serde_json::json;

    #[test]
    fn in_process_transport_reaches_the_server() {
        let server = Arc::new(LibraryServer::in_memory());
        server.seed_author("Octavia", "Butler").unwrap();
        let transport = InProcessTransport::new(server);

        let res = transport
            .execute(&Request::new(&catalog::authors(), json!({ "filter": {} })))
            .unwrap();
        assert_eq!(res.data.unwrap()["authors"][0]["lastName"], json!("Butler"));
    }

    #[test]
    fn arc_transport_delegates() {
        let transport: Arc<dyn Transport> = Arc::new(InProcessTransport::new(Arc::new(LibraryServer::in_memory())));
        let res = transport
            .execute(&Request::new(&catalog::books(), serde_json::Value::Null))
            .unwrap();
        assert_eq!(res.data.unwrap()["books"], json!([]));
    }
}
