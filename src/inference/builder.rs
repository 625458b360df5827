//! Turns a validated [`MenuInferenceRequest`] into the body we send upstream.
//!
//! Nothing here touches the network, so payload shapes can be checked in
//! isolation.

use super::types::{ImageUpload, InferenceFailure, ManualItem, ManualItemInput, MenuInferenceRequest};
use serde_json::{Value, json};
use tracing::debug;

pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Name used for uploads that arrive without one.
pub const DEFAULT_UPLOAD_NAME: &str = "menu-image";

/// Multipart field the backend reads the image from.
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Multipart,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Multipart {
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl Payload {
    pub fn content_kind(&self) -> ContentKind {
        match self {
            Self::Json(_) => ContentKind::Json,
            Self::Multipart { .. } => ContentKind::Multipart,
        }
    }
}

pub fn build(request: &MenuInferenceRequest) -> Result<Payload, InferenceFailure> {
    let payload = match request {
        MenuInferenceRequest::ImageUpload(upload) => multipart_payload(upload),
        MenuInferenceRequest::ImageUrl(url) => {
            validate_image_url(url)?;
            Payload::Json(json!({ "url": url }))
        }
        MenuInferenceRequest::ManualItems(items) => {
            let complete = complete_items(items);
            if complete.is_empty() {
                return Err(InferenceFailure::invalid_request(
                    "Every manual item needs both a name and a price",
                ));
            }
            debug!(
                "Kept {} of {} manual items",
                complete.len(),
                items.len()
            );
            Payload::Json(json!({ "manual_items": complete }))
        }
    };
    Ok(payload)
}

fn multipart_payload(upload: &ImageUpload) -> Payload {
    let file_name = upload
        .file_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_UPLOAD_NAME)
        .to_string();

    Payload::Multipart {
        file_name,
        content_type: upload.content_type.clone(),
        bytes: upload.bytes.clone(),
    }
}

/// Drops entries missing a name or a price, keeping the order of the rest.
pub fn complete_items(items: &[ManualItemInput]) -> Vec<ManualItem> {
    items
        .iter()
        .filter_map(|item| {
            let name = non_blank(item.name.as_deref())?;
            let price = non_blank(item.price.as_deref())?;
            Some(ManualItem {
                name: name.to_string(),
                price: price.to_string(),
            })
        })
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn validate_image_url(raw: &str) -> Result<(), InferenceFailure> {
    let url = reqwest::Url::parse(raw)
        .map_err(|e| InferenceFailure::invalid_request(format!("Invalid image URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(InferenceFailure::invalid_request(format!(
            "Invalid image URL: unsupported scheme '{}'",
            url.scheme()
        )));
    }

    let extension = url
        .path()
        .rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(InferenceFailure::invalid_request(format!(
            "Invalid image URL: expected one of {}",
            ALLOWED_IMAGE_EXTENSIONS.join(", ")
        ))),
    }
}
