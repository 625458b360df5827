use super::builder::{self, IMAGE_FIELD, Payload};
use super::state::{ForwardEvent, ForwardStateMachine};
use super::types::{
    FailureKind, InferenceFailure, InferenceOutcome, MenuInferenceInput, MenuInferenceRequest,
    MenuItem,
};
use crate::{Result, config::BackendConfig};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const INFER_MENU_PATH: &str = "/api/infer-menu";

const GENERIC_FAILURE: &str = "Failed to infer menu";

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Sends one payload upstream. Never retries.
    async fn forward(&self, payload: Payload) -> InferenceOutcome;
}

/// Validates, builds and forwards a caller's request.
pub async fn infer_menu(
    backend: &dyn InferenceBackend,
    input: MenuInferenceInput,
) -> InferenceOutcome {
    let payload = match MenuInferenceRequest::try_from(input).and_then(|r| builder::build(&r)) {
        Ok(payload) => payload,
        Err(failure) => {
            info!("Rejected menu inference request: {}", failure.message);
            return failure.into();
        }
    };
    backend.forward(payload).await
}

pub struct HttpInferenceBackend {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpInferenceBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        // One POST per call; a 3xx is reported, not followed.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), INFER_MENU_PATH);

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, payload: Payload) -> std::result::Result<Vec<MenuItem>, InferenceFailure> {
        let request = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json");

        // Multipart content type and boundary come from reqwest.
        let request = match payload {
            Payload::Json(body) => request.json(&body),
            Payload::Multipart {
                file_name,
                content_type,
                bytes,
            } => {
                let mut part = multipart::Part::bytes(bytes).file_name(file_name);
                if let Some(content_type) = content_type {
                    part = part.mime_str(&content_type).map_err(|e| {
                        InferenceFailure::invalid_request(format!(
                            "Invalid upload content type '{content_type}': {e}"
                        ))
                    })?;
                }
                request.multipart(multipart::Form::new().part(IMAGE_FIELD, part))
            }
        };

        let response = request.send().await.map_err(|e| self.transport_failure(e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_failure(e))?;

        debug!(
            "Inference backend answered {} with {} bytes",
            status,
            body.len()
        );

        if !status.is_success() {
            return Err(failure_from_status(status.as_u16(), &body));
        }
        parse_menu_items(&body)
    }

    fn transport_failure(&self, error: reqwest::Error) -> InferenceFailure {
        if error.is_timeout() {
            InferenceFailure::new(
                FailureKind::Timeout,
                format!(
                    "Inference backend did not respond within {}s",
                    self.timeout.as_secs_f32()
                ),
            )
        } else {
            InferenceFailure::new(
                FailureKind::NetworkError,
                format!("Could not reach inference backend: {error}"),
            )
        }
    }
}

#[async_trait]
impl InferenceBackend for HttpInferenceBackend {
    async fn forward(&self, payload: Payload) -> InferenceOutcome {
        let mut fsm = ForwardStateMachine::new();
        advance(&mut fsm, ForwardEvent::Send);

        debug!(
            "Forwarding {:?} payload to {}",
            payload.content_kind(),
            self.endpoint
        );

        let (event, outcome) = match self.send(payload).await {
            Ok(items) => {
                info!("Inference backend returned {} menu items", items.len());
                (ForwardEvent::Responded, InferenceOutcome::Success { items })
            }
            Err(failure) => {
                warn!(
                    kind = ?failure.kind,
                    status = ?failure.status,
                    "Menu inference failed: {}",
                    failure.message
                );
                (ForwardEvent::Faulted(failure.kind), failure.into())
            }
        };

        advance(&mut fsm, event);
        outcome
    }
}

fn advance(fsm: &mut ForwardStateMachine, event: ForwardEvent) {
    if let Err(e) = fsm.transition(event) {
        warn!("Forward state machine rejected {:?}: {}", event, e);
    }
}

pub fn map_status(status: u16) -> FailureKind {
    match status {
        400 => FailureKind::UpstreamBadRequest,
        422 => FailureKind::UpstreamValidation,
        _ => FailureKind::UpstreamServerError,
    }
}

fn failure_from_status(status: u16, body: &[u8]) -> InferenceFailure {
    let kind = map_status(status);
    let backend_message = extract_error_message(body);

    let message = match (kind, backend_message) {
        (FailureKind::UpstreamServerError, Some(msg)) => format!("{GENERIC_FAILURE}: {msg}"),
        (_, Some(msg)) => msg,
        (_, None) => format!("{GENERIC_FAILURE} (backend status {status})"),
    };

    InferenceFailure::new(kind, message).with_status(status)
}

/// Pulls a readable message out of `{"detail": ..}` or `{"error": ..}`.
pub fn extract_error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;

    ["detail", "error"].iter().find_map(|field| match value.get(field)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    })
}

/// A success status without a `menu_items` array is still a failure.
pub fn parse_menu_items(body: &[u8]) -> std::result::Result<Vec<MenuItem>, InferenceFailure> {
    let malformed = |detail: String| {
        InferenceFailure::new(
            FailureKind::MalformedResponse,
            format!("Inference backend returned an unusable response: {detail}"),
        )
    };

    let value: Value =
        serde_json::from_slice(body).map_err(|e| malformed(format!("invalid JSON ({e})")))?;

    match value.get("menu_items") {
        Some(items @ Value::Array(_)) => serde_json::from_value(items.clone())
            .map_err(|e| malformed(format!("invalid menu item ({e})"))),
        Some(_) => Err(malformed("menu_items is not a list".to_string())),
        None => Err(malformed("menu_items is missing".to_string())),
    }
}
