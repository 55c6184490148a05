use crate::errors::{ApiError, ServiceError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::groups::CreateGroupInput;

    #[test]
    fn validation_failure_becomes_api_error() {
        let input = CreateGroupInput {
            group_number: 0,
            group_name: String::new(),
        };
        let err = validate_input(&input).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(msg) if msg.starts_with("Validation failed")));
    }

    #[test]
    fn response_helpers_set_status() {
        assert_eq!(success_response(1).status(), StatusCode::OK);
        assert_eq!(created_response(1).status(), StatusCode::CREATED);
        assert_eq!(no_content_response().status(), StatusCode::NO_CONTENT);
    }
}
