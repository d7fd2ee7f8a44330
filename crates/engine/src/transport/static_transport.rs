use async_trait::async_trait;
use attrform_interchange::{parse_callback_response, CallbackResponse};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{CallbackTransport, TransportError};
use crate::callback::CallbackRequest;

#[derive(Debug, Clone)]
enum Canned {
    Respond(serde_json::Value),
    Fail(String),
}

/// A transport that answers from canned responses keyed by the name of
/// the descriptor whose callback fired.
///
/// Every dispatched request is recorded. Useful for tests and offline
/// runs where callback results are known ahead of time.
#[derive(Debug, Default)]
pub struct StaticTransport {
    responses: HashMap<String, Canned>,
    calls: Mutex<Vec<CallbackRequest>>,
}

impl StaticTransport {
    pub fn new() -> Self {
        StaticTransport::default()
    }

    /// Build from a JSON object mapping descriptor names to raw responses.
    pub fn from_json(doc: &serde_json::Value) -> Option<Self> {
        let obj = doc.as_object()?;
        let mut transport = StaticTransport::new();
        for (name, response) in obj {
            transport = transport.respond(name, response.clone());
        }
        Some(transport)
    }

    /// Answer callbacks of `name` with a raw response body.
    pub fn respond(mut self, name: &str, response: serde_json::Value) -> Self {
        self.responses
            .insert(name.to_string(), Canned::Respond(response));
        self
    }

    /// Fail callbacks of `name`.
    pub fn fail(mut self, name: &str, message: &str) -> Self {
        self.responses
            .insert(name.to_string(), Canned::Fail(message.to_string()));
        self
    }

    /// Requests dispatched so far, in order.
    pub fn calls(&self) -> Vec<CallbackRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CallbackTransport for StaticTransport {
    async fn dispatch(&self, request: &CallbackRequest) -> Result<CallbackResponse, TransportError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        match self.responses.get(&request.request.name) {
            Some(Canned::Respond(doc)) => parse_callback_response(doc)
                .map_err(|e| TransportError::InvalidResponse(e.to_string())),
            Some(Canned::Fail(message)) => Err(TransportError::Rejected(message.clone())),
            None => Err(TransportError::Rejected(format!(
                "no canned response for '{}'",
                request.request.name
            ))),
        }
    }

    fn transport_id(&self) -> &str {
        "static"
    }
}
