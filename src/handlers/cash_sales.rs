use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::{
    entities::cash_sale,
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
        validate_input,
    },
    services::{
        cash_sale::{CashSaleDetail, CreateCashSaleInput},
        DateRange,
    },
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/cashsales",
    summary = "List cash sales",
    params(DateRange),
    responses(
        (status = 200, description = "Cash sales, newest first", body = [cash_sale::Model]),
        (status = 400, description = "Invalid date range", body = crate::errors::ErrorResponse),
    ),
    tag = "cash-sales"
)]
pub async fn list_cash_sales(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = state
        .services
        .cash_sales
        .list_cash_sales(range)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(sales))
}

#[utoipa::path(
    get,
    path = "/api/cashsales/{id}",
    summary = "Get cash sale with lines",
    params(("id" = i32, Path, description = "Cash sale id")),
    responses(
        (status = 200, description = "Cash sale found", body = CashSaleDetail),
        (status = 404, description = "Cash sale not found", body = crate::errors::ErrorResponse),
    ),
    tag = "cash-sales"
)]
pub async fn get_cash_sale(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = state
        .services
        .cash_sales
        .get_cash_sale(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(sale))
}

#[utoipa::path(
    post,
    path = "/api/cashsales",
    summary = "Record cash sale",
    description = "Stores the sale and takes the quantities out of stock. If any item is short the whole sale is rejected.",
    request_body = CreateCashSaleInput,
    responses(
        (status = 201, description = "Cash sale recorded", body = CashSaleDetail),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice number already in use", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
    ),
    tag = "cash-sales"
)]
pub async fn create_cash_sale(
    State(state): State<AppState>,
    Json(payload): Json<CreateCashSaleInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let sale = state
        .services
        .cash_sales
        .create_cash_sale(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(sale))
}

#[utoipa::path(
    delete,
    path = "/api/cashsales/{id}",
    summary = "Delete cash sale",
    params(("id" = i32, Path, description = "Cash sale id")),
    responses(
        (status = 204, description = "Cash sale deleted and stock restored"),
        (status = 404, description = "Cash sale not found", body = crate::errors::ErrorResponse),
    ),
    tag = "cash-sales"
)]
pub async fn delete_cash_sale(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .cash_sales
        .delete_cash_sale(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn cash_sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cash_sales).post(create_cash_sale))
        .route("/:id", get(get_cash_sale).delete(delete_cash_sale))
}
