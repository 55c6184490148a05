use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::{
    entities::purchase,
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
        validate_input,
    },
    services::{
        purchases::{CreatePurchaseInput, PurchaseDetail},
        DateRange,
    },
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/purchases",
    summary = "List purchases",
    params(DateRange),
    responses(
        (status = 200, description = "Purchases, newest first", body = [purchase::Model]),
        (status = 400, description = "Invalid date range", body = crate::errors::ErrorResponse),
    ),
    tag = "purchases"
)]
pub async fn list_purchases(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let purchases = state
        .services
        .purchases
        .list_purchases(range)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(purchases))
}

#[utoipa::path(
    get,
    path = "/api/purchases/{id}",
    summary = "Get purchase with lines",
    params(("id" = i32, Path, description = "Purchase id")),
    responses(
        (status = 200, description = "Purchase found", body = PurchaseDetail),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
    ),
    tag = "purchases"
)]
pub async fn get_purchase(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = state
        .services
        .purchases
        .get_purchase(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(purchase))
}

#[utoipa::path(
    post,
    path = "/api/purchases",
    summary = "Record purchase",
    description = "Stores the invoice with its lines and adds the quantities to stock in one transaction.",
    request_body = CreatePurchaseInput,
    responses(
        (status = 201, description = "Purchase recorded", body = PurchaseDetail),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice already recorded for the vendor", body = crate::errors::ErrorResponse),
    ),
    tag = "purchases"
)]
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(payload): Json<CreatePurchaseInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let purchase = state
        .services
        .purchases
        .create_purchase(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(purchase))
}

#[utoipa::path(
    delete,
    path = "/api/purchases/{id}",
    summary = "Delete purchase",
    params(("id" = i32, Path, description = "Purchase id")),
    responses(
        (status = 204, description = "Purchase deleted and stock reversed"),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Purchased stock has already been sold", body = crate::errors::ErrorResponse),
    ),
    tag = "purchases"
)]
pub async fn delete_purchase(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .purchases
        .delete_purchase(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_purchases).post(create_purchase))
        .route("/:id", get(get_purchase).delete(delete_purchase))
}
