use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::{
    entities::group,
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
        validate_input,
    },
    services::groups::{CreateGroupInput, UpdateGroupInput},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/groups",
    summary = "List groups",
    responses(
        (status = 200, description = "Groups ordered by number", body = [group::Model]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "groups"
)]
pub async fn list_groups(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let groups = state
        .services
        .groups
        .list_groups()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(groups))
}

#[utoipa::path(
    get,
    path = "/api/groups/{id}",
    summary = "Get group",
    params(("id" = i32, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group found", body = group::Model),
        (status = 404, description = "Group not found", body = crate::errors::ErrorResponse),
    ),
    tag = "groups"
)]
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let group = state
        .services
        .groups
        .get_group(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(group))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    summary = "Create group",
    request_body = CreateGroupInput,
    responses(
        (status = 201, description = "Group created", body = group::Model),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Group number already in use", body = crate::errors::ErrorResponse),
    ),
    tag = "groups"
)]
pub async fn create_group(
    State(state): State<AppState>,
    Json(payload): Json<CreateGroupInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let group = state
        .services
        .groups
        .create_group(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(group))
}

#[utoipa::path(
    put,
    path = "/api/groups/{id}",
    summary = "Update group",
    description = "Renames or renumbers a group. Renumbering re-composes the numbers of all its categories.",
    params(("id" = i32, Path, description = "Group id")),
    request_body = UpdateGroupInput,
    responses(
        (status = 200, description = "Group updated", body = group::Model),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Group number already in use", body = crate::errors::ErrorResponse),
    ),
    tag = "groups"
)]
pub async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateGroupInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let group = state
        .services
        .groups
        .update_group(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(group))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{id}",
    summary = "Delete group",
    params(("id" = i32, Path, description = "Group id")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 404, description = "Group not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Group still has categories", body = crate::errors::ErrorResponse),
    ),
    tag = "groups"
)]
pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .groups
        .delete_group(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/:id", get(get_group).put(update_group).delete(delete_group))
}
