use super::types::{
    ErrorResponse, ImportMenuRequest, InferMenuResponse, InferenceErrorResponse, WelcomeResponse,
};
use crate::{
    Error,
    inference::{
        self, ImageUpload, InferenceBackend, InferenceFailure, MenuInferenceInput,
        builder::IMAGE_FIELD,
    },
    store::{MenuStore, NewMenuItem, OrderLine, Selection, StoredMenuItem},
};
use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn InferenceBackend>,
    pub store: Arc<MenuStore>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the team menu ordering API".to_string(),
    })
}

/// Accepts `{"url": ..}`, `{"manual_items": [..]}` or a multipart `image` upload.
pub async fn infer_menu(State(state): State<AppState>, request: Request) -> Response {
    let input = match read_inference_input(request).await {
        Ok(input) => input,
        Err(response) => return response,
    };

    match inference::infer_menu(state.backend.as_ref(), input)
        .await
        .into_result()
    {
        Ok(menu_items) => {
            info!("Inferred {} menu items", menu_items.len());
            Json(InferMenuResponse { menu_items }).into_response()
        }
        Err(failure) => failure_response(failure),
    }
}

async fn read_inference_input(request: Request) -> Result<MenuInferenceInput, Response> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(input) = Json::<MenuInferenceInput>::from_request(request, &())
            .await
            .map_err(|rejection| rejected_body(rejection.status(), rejection.body_text()))?;
        return Ok(input);
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| rejected_body(rejection.status(), rejection.body_text()))?;

    let mut input = MenuInferenceInput::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejected_body(e.status(), e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| rejected_body(e.status(), e.body_text()))?;

        input.image = Some(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(input)
}

/// Unreadable inbound bodies are invalid requests; oversized ones keep their 413.
fn rejected_body(status: StatusCode, message: String) -> Response {
    let failure = InferenceFailure::invalid_request(message);
    let status = if status == StatusCode::PAYLOAD_TOO_LARGE {
        status
    } else {
        failure.http_status()
    };
    error_response(status, failure)
}

fn failure_response(failure: InferenceFailure) -> Response {
    error_response(failure.http_status(), failure)
}

fn error_response(status: StatusCode, failure: InferenceFailure) -> Response {
    warn!(
        "Menu inference request failed with {} ({:?}): {}",
        status, failure.kind, failure.message
    );
    (
        status,
        Json(InferenceErrorResponse {
            error: failure.message,
            kind: failure.kind,
        }),
    )
        .into_response()
}

pub async fn list_menu(State(state): State<AppState>) -> Result<Json<Vec<StoredMenuItem>>, ApiError> {
    let items = state.store.list_items().await.map_err(api_error)?;
    Ok(Json(items))
}

pub async fn create_menu_item(
    State(state): State<AppState>,
    Json(item): Json<NewMenuItem>,
) -> Result<(StatusCode, Json<StoredMenuItem>), ApiError> {
    let stored = state.store.create_item(item).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Saves an inferred menu as-is, keeping its order.
pub async fn import_menu(
    State(state): State<AppState>,
    Json(request): Json<ImportMenuRequest>,
) -> Result<(StatusCode, Json<Vec<StoredMenuItem>>), ApiError> {
    let items = request.menu_items.into_iter().map(NewMenuItem::from).collect();
    let stored = state.store.import_items(items).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_item(&item_id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn order_summary(State(state): State<AppState>) -> Result<Json<Vec<OrderLine>>, ApiError> {
    let lines = state.store.order_summary().await.map_err(api_error)?;
    Ok(Json(lines))
}

pub async fn clear_order(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.clear_order().await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn select_item(
    State(state): State<AppState>,
    Json(selection): Json<Selection>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .select_item(&selection.member, &selection.item_id)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::CREATED)
}

pub async fn deselect_item(
    State(state): State<AppState>,
    Json(selection): Json<Selection>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .deselect_item(&selection.member, &selection.item_id)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

fn api_error(e: Error) -> ApiError {
    let status = match &e {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::MenuItemNotFound { .. } => StatusCode::NOT_FOUND,
        _ => {
            error!("Menu store failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}
