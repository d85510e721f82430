//! Scripted transport for tests.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::error::TransportError;
use crate::ir::{GraphQlError, Request, Response};

use super::Transport;

/// What a scripted request answers with.
#[derive(Debug, Clone, PartialEq)]
pub enum MockedResult {
    /// A successful response with this `data`.
    Data(Value),
    /// An application-layer failure.
    Errors(Vec<GraphQlError>),
    /// A network-layer failure.
    NetworkError(String),
}

/// One scripted exchange. Each is consumed by the first request it matches.
#[derive(Debug, Clone, PartialEq)]
pub struct MockedResponse {
    /// Operation the exchange answers.
    pub operation_name: String,
    /// Variables the request must carry; `None` matches any.
    pub variables: Option<Value>,
    /// What the transport returns.
    pub result: MockedResult,
}

impl MockedResponse {
    /// Answer `operation_name` with `data`.
    #[must_use]
    pub fn data(operation_name: impl Into<String>, data: Value) -> Self {
        Self {
            operation_name: operation_name.into(),
            variables: None,
            result: MockedResult::Data(data),
        }
    }

    /// Answer `operation_name` with a single GraphQL error.
    #[must_use]
    pub fn error(operation_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            variables: None,
            result: MockedResult::Errors(vec![GraphQlError::new(message)]),
        }
    }

    /// Fail `operation_name` at the network layer.
    #[must_use]
    pub fn network_error(operation_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            variables: None,
            result: MockedResult::NetworkError(message.into()),
        }
    }

    /// Only match requests carrying exactly `variables`.
    #[must_use]
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    fn matches(&self, request: &Request) -> bool {
        self.operation_name == request.operation_name
            && self
                .variables
                .as_ref()
                .map_or(true, |vars| *vars == request.variables)
    }
}

#[derive(Debug, Default)]
struct MockState {
    pending: VecDeque<MockedResponse>,
    history: Vec<Request>,
}

/// A [`Transport`] answering from a script.
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    /// A transport with the given script.
    #[must_use]
    pub fn new(mocks: impl IntoIterator<Item = MockedResponse>) -> Self {
        Self {
            state: Mutex::new(MockState {
                pending: mocks.into_iter().collect(),
                history: Vec::new(),
            }),
        }
    }

    /// Append a scripted exchange.
    pub fn push(&self, mock: MockedResponse) {
        self.state.lock().pending.push_back(mock);
    }

    /// Scripted exchanges not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().history.clone()
    }

    /// Operation names of every request received, in order.
    #[must_use]
    pub fn operation_names(&self) -> Vec<String> {
        self.state
            .lock()
            .history
            .iter()
            .map(|r| r.operation_name.clone())
            .collect()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        let mut state = self.state.lock();
        state.history.push(request.clone());

        let Some(index) = state.pending.iter().position(|m| m.matches(request)) else {
            debug!(operation = %request.operation_name, "no mocked response");
            return Err(TransportError::NoMockedResponse {
                operation: request.operation_name.clone(),
            });
        };
        let Some(mock) = state.pending.remove(index) else {
            return Err(TransportError::NoMockedResponse {
                operation: request.operation_name.clone(),
            });
        };

        match mock.result {
            MockedResult::Data(data) => Ok(Response::ok(data)),
            MockedResult::Errors(errors) => Ok(Response { data: None, errors }),
            MockedResult::NetworkError(message) => Err(TransportError::Network { message }),
        }
    }
}
