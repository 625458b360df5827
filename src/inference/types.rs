use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A candidate item typed in by a user. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualItemInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
}

/// A complete manual item as sent to the inference backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualItem {
    pub name: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Inbound request as it arrives from the caller, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuInferenceInput {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub manual_items: Option<Vec<ManualItemInput>>,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

/// Exactly one way of describing a menu.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuInferenceRequest {
    ImageUrl(String),
    ImageUpload(ImageUpload),
    ManualItems(Vec<ManualItemInput>),
}

impl TryFrom<MenuInferenceInput> for MenuInferenceRequest {
    type Error = InferenceFailure;

    fn try_from(input: MenuInferenceInput) -> Result<Self, Self::Error> {
        let url = input.url.filter(|u| !u.trim().is_empty());
        let manual_items = input.manual_items.filter(|items| !items.is_empty());
        let image = input.image.filter(|upload| !upload.bytes.is_empty());

        match (url, image, manual_items) {
            (Some(url), None, None) => Ok(Self::ImageUrl(url.trim().to_string())),
            (None, Some(upload), None) => Ok(Self::ImageUpload(upload)),
            (None, None, Some(items)) => Ok(Self::ManualItems(items)),
            (None, None, None) => Err(InferenceFailure::invalid_request(
                "Provide an image URL, an image upload, or manual items",
            )),
            _ => Err(InferenceFailure::invalid_request(
                "Provide only one of image URL, image upload, or manual items",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidRequest,
    UpstreamBadRequest,
    UpstreamValidation,
    UpstreamServerError,
    Timeout,
    NetworkError,
    MalformedResponse,
}

impl FailureKind {
    /// Timeouts and transport faults never reached the backend's logic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::NetworkError)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct InferenceFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Status returned by the backend, when it answered at all.
    pub status: Option<u16>,
}

impl InferenceFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidRequest, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Status to report to the browser-facing caller.
    pub fn http_status(&self) -> StatusCode {
        match self.kind {
            FailureKind::InvalidRequest | FailureKind::UpstreamBadRequest => {
                StatusCode::BAD_REQUEST
            }
            FailureKind::UpstreamValidation => StatusCode::UNPROCESSABLE_ENTITY,
            FailureKind::UpstreamServerError => self
                .status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            FailureKind::NetworkError | FailureKind::MalformedResponse => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    Success { items: Vec<MenuItem> },
    Failure(InferenceFailure),
}

impl InferenceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn into_result(self) -> Result<Vec<MenuItem>, InferenceFailure> {
        match self {
            Self::Success { items } => Ok(items),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl From<InferenceFailure> for InferenceOutcome {
    fn from(failure: InferenceFailure) -> Self {
        Self::Failure(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn upload() -> ImageUpload {
        ImageUpload {
            file_name: Some("menu.png".to_string()),
            content_type: Some("image/png".to_string()),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }
    }

    #[test]
    fn test_empty_input_is_invalid() {
        let err = MenuInferenceRequest::try_from(MenuInferenceInput::default()).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidRequest);
    }

    #[test]
    fn test_blank_values_count_as_absent() {
        let input = MenuInferenceInput {
            url: Some("   ".to_string()),
            manual_items: Some(vec![]),
            image: Some(ImageUpload {
                bytes: vec![],
                ..upload()
            }),
        };
        let err = MenuInferenceRequest::try_from(input).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidRequest);
    }

    #[test]
    fn test_two_variants_are_invalid() {
        let input = MenuInferenceInput {
            url: Some("https://example.com/menu.jpg".to_string()),
            image: Some(upload()),
            ..Default::default()
        };
        let err = MenuInferenceRequest::try_from(input).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidRequest);
        assert!(err.message.contains("only one"));
    }

    #[test]
    fn test_single_variant_is_accepted() {
        let input = MenuInferenceInput {
            url: Some(" https://example.com/menu.jpg ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            MenuInferenceRequest::try_from(input).unwrap(),
            MenuInferenceRequest::ImageUrl("https://example.com/menu.jpg".to_string())
        );

        let input = MenuInferenceInput {
            image: Some(upload()),
            ..Default::default()
        };
        assert_eq!(
            MenuInferenceRequest::try_from(input).unwrap(),
            MenuInferenceRequest::ImageUpload(upload())
        );
    }

    #[test]
    fn test_menu_item_omits_missing_optional_fields() {
        let item = MenuItem {
            name: "Tea".to_string(),
            price: "2.50".to_string(),
            description: None,
            category: None,
        };
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            serde_json::json!({"name": "Tea", "price": "2.50"})
        );
    }

    #[test]
    fn test_http_status_preserves_upstream_errors() {
        let failure = InferenceFailure::new(FailureKind::UpstreamServerError, "down")
            .with_status(503);
        assert_eq!(failure.http_status(), StatusCode::SERVICE_UNAVAILABLE);

        let failure = InferenceFailure::new(FailureKind::UpstreamServerError, "odd")
            .with_status(302);
        assert_eq!(failure.http_status(), StatusCode::BAD_GATEWAY);

        let failure = InferenceFailure::new(FailureKind::Timeout, "slow");
        assert_eq!(failure.http_status(), StatusCode::GATEWAY_TIMEOUT);
        assert!(failure.kind.is_retryable());
    }
}
