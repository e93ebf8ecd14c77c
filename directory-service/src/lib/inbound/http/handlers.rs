use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::domain::auth::errors::AuthError;
use crate::domain::department::errors::DepartmentError;
use crate::domain::user::errors::UserError;

pub mod departments;
pub mod sign_in;
pub mod users;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<ApiResponseBody<T>>);

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::ExpiredToken
            | AuthError::DisabledToken
            | AuthError::InvalidToken
            | AuthError::NotAuthenticated
            | AuthError::InvalidLogin => ApiError::Unauthorized(err.to_string()),
            AuthError::Verification(cause) => {
                tracing::error!(error = %cause, "Token verification failed unexpectedly");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NoProvidedData | UserError::InactiveDepartment => {
                ApiError::BadRequest(err.to_string())
            }
            UserError::NotFound | UserError::DepartmentNotFound => {
                ApiError::NotFound(err.to_string())
            }
            UserError::Conflict(_) => ApiError::Conflict(err.to_string()),
            UserError::Auth(auth_err) => ApiError::from(auth_err),
            UserError::Database(cause) | UserError::Internal(cause) => {
                tracing::error!(error = %cause, "User operation failed unexpectedly");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

impl From<DepartmentError> for ApiError {
    fn from(err: DepartmentError) -> Self {
        match err {
            DepartmentError::NoProvidedData | DepartmentError::InactiveManager => {
                ApiError::BadRequest(err.to_string())
            }
            DepartmentError::NotFound | DepartmentError::ManagerNotFound => {
                ApiError::NotFound(err.to_string())
            }
            DepartmentError::Conflict(_) => ApiError::Conflict(err.to_string()),
            DepartmentError::Database(cause) => {
                tracing::error!(error = %cause, "Department operation failed unexpectedly");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponseBody<T: Serialize> {
    status_code: u16,
    data: T,
}

impl<T: Serialize> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}
