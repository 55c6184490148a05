use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::{
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
        validate_input,
    },
    services::items::{CreateItemInput, ItemFilter, ItemView, UpdateItemInput},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/items",
    summary = "List items",
    params(ItemFilter),
    responses((status = 200, description = "Items ordered by code", body = [ItemView])),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .items
        .list_items(filter)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/items/{id}",
    summary = "Get item",
    params(("id" = i32, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item found", body = ItemView),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .services
        .items
        .get_item(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

#[utoipa::path(
    post,
    path = "/api/items",
    summary = "Create item",
    request_body = CreateItemInput,
    responses(
        (status = 201, description = "Item created", body = ItemView),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Item code already in use", body = crate::errors::ErrorResponse),
    ),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let item = state
        .services
        .items
        .create_item(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(item))
}

#[utoipa::path(
    put,
    path = "/api/items/{id}",
    summary = "Update item",
    params(("id" = i32, Path, description = "Item id")),
    request_body = UpdateItemInput,
    responses(
        (status = 200, description = "Item updated", body = ItemView),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Item code already in use", body = crate::errors::ErrorResponse),
    ),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateItemInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let item = state
        .services
        .items
        .update_item(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    summary = "Delete item",
    params(("id" = i32, Path, description = "Item id")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Item is referenced by invoices", body = crate::errors::ErrorResponse),
    ),
    tag = "items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .items
        .delete_item(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
}
