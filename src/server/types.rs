use crate::inference::{FailureKind, MenuItem};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct InferMenuResponse {
    pub menu_items: Vec<MenuItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InferenceErrorResponse {
    pub error: String,
    pub kind: FailureKind,
}

#[derive(Debug, Deserialize)]
pub struct ImportMenuRequest {
    pub menu_items: Vec<MenuItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}
