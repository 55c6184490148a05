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
    services::teachers::{CreateTeacherInput, TeacherFilter, TeacherView, UpdateTeacherInput},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/teachers",
    summary = "List teachers",
    params(TeacherFilter),
    responses(
        (status = 200, description = "Teachers ordered by name", body = [TeacherView]),
        (status = 404, description = "City not found", body = crate::errors::ErrorResponse),
    ),
    tag = "school"
)]
pub async fn list_teachers(
    State(state): State<AppState>,
    Query(filter): Query<TeacherFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let teachers = state
        .services
        .teachers
        .list_teachers(filter)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(teachers))
}

#[utoipa::path(
    get,
    path = "/api/teachers/{id}",
    summary = "Get teacher",
    params(("id" = i32, Path, description = "Teacher id")),
    responses(
        (status = 200, description = "Teacher found", body = TeacherView),
        (status = 404, description = "Teacher not found", body = crate::errors::ErrorResponse),
    ),
    tag = "school"
)]
pub async fn get_teacher(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let teacher = state
        .services
        .teachers
        .get_teacher(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(teacher))
}

#[utoipa::path(
    post,
    path = "/api/teachers",
    summary = "Create teacher",
    request_body = CreateTeacherInput,
    responses(
        (status = 201, description = "Teacher created", body = TeacherView),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    tag = "school"
)]
pub async fn create_teacher(
    State(state): State<AppState>,
    Json(payload): Json<CreateTeacherInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let teacher = state
        .services
        .teachers
        .create_teacher(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(teacher))
}

#[utoipa::path(
    put,
    path = "/api/teachers/{id}",
    summary = "Update teacher",
    params(("id" = i32, Path, description = "Teacher id")),
    request_body = UpdateTeacherInput,
    responses(
        (status = 200, description = "Teacher updated", body = TeacherView),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Teacher not found", body = crate::errors::ErrorResponse),
    ),
    tag = "school"
)]
pub async fn update_teacher(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTeacherInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let teacher = state
        .services
        .teachers
        .update_teacher(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(teacher))
}

#[utoipa::path(
    delete,
    path = "/api/teachers/{id}",
    summary = "Delete teacher",
    params(("id" = i32, Path, description = "Teacher id")),
    responses(
        (status = 204, description = "Teacher deleted"),
        (status = 404, description = "Teacher not found", body = crate::errors::ErrorResponse),
    ),
    tag = "school"
)]
pub async fn delete_teacher(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .teachers
        .delete_teacher(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

pub fn teacher_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teachers).post(create_teacher))
        .route(
            "/:id",
            get(get_teacher).put(update_teacher).delete(delete_teacher),
        )
}
