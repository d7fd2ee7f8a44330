//! Callback transport over HTTP.

use async_trait::async_trait;
use attrform_interchange::{parse_callback_response, CallbackResponse, CallbackScope};
use std::time::Duration;

use super::{CallbackTransport, TransportConfig, TransportError};
use crate::callback::CallbackRequest;

/// Posts callback requests to the platform API.
///
/// Requests run on the blocking pool since `ureq` is synchronous.
pub struct HttpTransport {
    agent: ureq::Agent,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();
        HttpTransport { agent, config }
    }

    /// Endpoint for a callback scope.
    pub fn url_for(&self, scope: &CallbackScope) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match scope {
            CallbackScope::Connector {
                function_group_code,
                connector_uuid,
                kind,
            } => format!(
                "{}/v1/connectors/{}/{}/{}/callback",
                base, connector_uuid, function_group_code, kind
            ),
            CallbackScope::Resource {
                resource,
                parent_uuid,
            } => format!("{}/v1/{}/{}/callback", base, resource, parent_uuid),
        }
    }
}

fn post(
    agent: ureq::Agent,
    url: String,
    token: Option<String>,
    body: serde_json::Value,
) -> Result<serde_json::Value, TransportError> {
    let mut request = agent.post(&url).header("content-type", "application/json");
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }
    let response = request
        .send_json(&body)
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
        let message = response
            .into_body()
            .read_to_string()
            .unwrap_or_default();
        return Err(TransportError::Status { status, message });
    }
    response
        .into_body()
        .read_json()
        .map_err(|e| TransportError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl CallbackTransport for HttpTransport {
    async fn dispatch(&self, request: &CallbackRequest) -> Result<CallbackResponse, TransportError> {
        let scope = request.scope.as_ref().ok_or(TransportError::MissingScope)?;
        let url = self.url_for(scope);
        let body = serde_json::to_value(&request.request)
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        tracing::debug!(target: "attrform::transport", %url, callback = %request.callback_id, "posting callback");

        let agent = self.agent.clone();
        let token = self.config.auth_token.clone();
        let doc = tokio::task::spawn_blocking(move || post(agent, url, token, body))
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))??;

        parse_callback_response(&doc).map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }

    fn transport_id(&self) -> &str {
        "http"
    }
}
