use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use super::common::{map_service_error, success_response};
use crate::{
    errors::ApiError,
    services::{
        reports::{ItemSales, PurchaseSummaryReport, SalesSummaryReport, StockReport},
        DateRange,
    },
    AppState,
};

/// Current stock of every item with valuation and low-stock flags
#[utoipa::path(
    get,
    path = "/api/reports/stock",
    summary = "Stock report",
    responses((status = 200, description = "Stock report", body = StockReport)),
    tag = "reports"
)]
pub async fn stock_report(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .reports
        .stock_report()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(report))
}

/// Cash sales per day
#[utoipa::path(
    get,
    path = "/api/reports/sales-summary",
    summary = "Sales summary",
    params(DateRange),
    responses(
        (status = 200, description = "Sales per day", body = SalesSummaryReport),
        (status = 400, description = "Invalid date range", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn sales_summary(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .reports
        .sales_summary(range)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(report))
}

/// Purchases per vendor
#[utoipa::path(
    get,
    path = "/api/reports/purchase-summary",
    summary = "Purchase summary",
    params(DateRange),
    responses(
        (status = 200, description = "Purchases per vendor", body = PurchaseSummaryReport),
        (status = 400, description = "Invalid date range", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn purchase_summary(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .reports
        .purchase_summary(range)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(report))
}

/// Quantity and amount sold per item
#[utoipa::path(
    get,
    path = "/api/reports/item-sales",
    summary = "Item sales",
    params(DateRange),
    responses(
        (status = 200, description = "Sales per item", body = [ItemSales]),
        (status = 400, description = "Invalid date range", body = crate::errors::ErrorResponse),
    ),
    tag = "reports"
)]
pub async fn item_sales(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .reports
        .item_sales(range)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(rows))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/stock", get(stock_report))
        .route("/sales-summary", get(sales_summary))
        .route("/purchase-summary", get(purchase_summary))
        .route("/item-sales", get(item_sales))
}
