use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::{
    entities::city,
    errors::ApiError,
    handlers::common::{created_response, map_service_error, success_response, validate_input},
    services::cities::CreateCityInput,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/cities",
    summary = "List cities",
    responses((status = 200, description = "Cities ordered by name", body = [city::Model])),
    tag = "school"
)]
pub async fn list_cities(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let cities = state
        .services
        .cities
        .list_cities()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(cities))
}

#[utoipa::path(
    post,
    path = "/api/cities",
    summary = "Create city",
    request_body = CreateCityInput,
    responses(
        (status = 201, description = "City created", body = city::Model),
        (status = 400, description = "Blank name", body = crate::errors::ErrorResponse),
        (status = 409, description = "City already exists", body = crate::errors::ErrorResponse),
    ),
    tag = "school"
)]
pub async fn create_city(
    State(state): State<AppState>,
    Json(payload): Json<CreateCityInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let city = state
        .services
        .cities
        .create_city(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(city))
}

pub fn city_routes() -> Router<AppState> {
    Router::new().route("/", get(list_cities).post(create_city))
}
