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
    services::categories::{
        CategoryFilter, CategoryView, CreateCategoryInput, NextCategoryNumber, NextNumberQuery,
        NumberingIssue, UpdateCategoryInput,
    },
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/categories",
    summary = "List categories",
    params(CategoryFilter),
    responses(
        (status = 200, description = "Categories ordered by group and sequence", body = [CategoryView]),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .services
        .categories
        .list_categories(filter)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(categories))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    summary = "Get category",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category found", body = CategoryView),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .services
        .categories
        .get_category(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(category))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    summary = "Create category",
    description = "Creates a category under a group. When `category_number` is omitted the next number of the group is assigned (group 3: 31, 32 ... 39, 310).",
    request_body = CreateCategoryInput,
    responses(
        (status = 201, description = "Category created", body = CategoryView),
        (status = 400, description = "Invalid request data or number outside the group", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category number already in use", body = crate::errors::ErrorResponse),
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let category = state
        .services
        .categories
        .create_category(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(category))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    summary = "Rename category",
    params(("id" = i32, Path, description = "Category id")),
    request_body = UpdateCategoryInput,
    responses(
        (status = 200, description = "Category updated", body = CategoryView),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let category = state
        .services
        .categories
        .update_category(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(category))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    summary = "Delete category",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category still has items", body = crate::errors::ErrorResponse),
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .categories
        .delete_category(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

#[utoipa::path(
    get,
    path = "/api/categories-next-number",
    summary = "Next category number",
    description = "Number the next category of the group would receive. Nothing is reserved.",
    params(NextNumberQuery),
    responses(
        (status = 200, description = "Next number", body = NextCategoryNumber),
        (status = 404, description = "Group not found", body = crate::errors::ErrorResponse),
    ),
    tag = "categories"
)]
pub async fn next_category_number(
    State(state): State<AppState>,
    Query(query): Query<NextNumberQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let next = state
        .services
        .categories
        .next_number(query.group_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(next))
}

#[utoipa::path(
    get,
    path = "/api/categories/audit",
    summary = "Audit category numbers",
    description = "Categories whose stored number does not match their group number and sequence.",
    responses(
        (status = 200, description = "Inconsistent categories", body = [NumberingIssue]),
    ),
    tag = "categories"
)]
pub async fn audit_category_numbers(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let issues = state
        .services
        .categories
        .audit_numbers()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(issues))
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/audit", get(audit_category_numbers))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}
