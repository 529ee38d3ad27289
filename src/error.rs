use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{ApiResponse, FilterError};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{error, warn};
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Envelope message of every failed request.
pub const FAILED_MESSAGE: &str = "Failed to process request";
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized!";

/// Client mistakes are `Warn`, server faults are `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warn,
    Error,
}

/// Error returned by handlers, services and middleware.
///
/// Renders as `{status:false, message:"Failed to process request", errors:[..], data:null}`.
#[derive(Debug, Error)]
#[error("{status}: {}", .messages.join("; "))]
pub struct ApiError {
    status: StatusCode,
    severity: Severity,
    messages: Vec<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn warn(status: StatusCode, message: impl Into<String>) -> Self {
        Self::with_messages(status, Severity::Warn, vec![message.into()])
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::with_messages(status, Severity::Error, vec![message.into()])
    }

    pub fn with_messages(status: StatusCode, severity: Severity, messages: Vec<String>) -> Self {
        Self {
            status,
            severity,
            messages,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::warn(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::warn(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized() -> Self {
        Self::warn(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::warn(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::warn(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.severity {
            Severity::Warn => warn!(status = %self.status, errors = ?self.messages, "request rejected"),
            Severity::Error => error!(status = %self.status, errors = ?self.messages, "request failed"),
        }

        let body: ApiResponse<()> = ApiResponse::failure(FAILED_MESSAGE, self.messages);
        (self.status, Json(body)).into_response()
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                warn!("unique constraint violated: {}", detail);
                return ApiError::conflict("Data already exists");
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                warn!("foreign key constraint violated: {}", detail);
                return ApiError::conflict("Data is still referenced by other records");
            }
            _ => {}
        }

        match err {
            DbErr::RecordNotFound(what) => ApiError::not_found(format!("Failed, {what} not found")),
            DbErr::RecordNotUpdated => ApiError::not_found("Failed, record not found"),
            other => {
                error!("database error: {}", other);
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_validation_messages(None, &errors, &mut messages);
        messages.sort();
        ApiError::with_messages(StatusCode::BAD_REQUEST, Severity::Warn, messages)
    }
}

fn collect_validation_messages(
    prefix: Option<&str>,
    errors: &ValidationErrors,
    out: &mut Vec<String>,
) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.extend(
                    field_errors
                        .iter()
                        .map(|e| format!("{path}: {}", describe_validation_error(e))),
                );
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_validation_messages(Some(&path), inner, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_validation_messages(Some(&format!("{path}[{index}]")), inner, out);
                }
            }
        }
    }
}

/// Human readable text for one failed rule.
pub fn describe_validation_error(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    match error.code.as_ref() {
        "required" => "This field is required".to_string(),
        "email" => "This field must be a valid email".to_string(),
        "length" => match error.params.get("min") {
            Some(min) if min.as_u64() == Some(1) => "This field is required".to_string(),
            Some(min) => format!("This field must be at least {min} characters"),
            None => "This field is too long".to_string(),
        },
        "range" => match (error.params.get("min"), error.params.get("max")) {
            (Some(min), None) => match min.as_f64() {
                Some(min) if min.fract() == 0.0 => {
                    format!("This field must be greater than {}", min as i64 - 1)
                }
                _ => format!("This field must be at least {min}"),
            },
            (Some(min), Some(max)) => format!("This field must be between {min} and {max}"),
            (None, Some(max)) => format!("This field must be at most {max}"),
            (None, None) => "This field is out of range".to_string(),
        },
        code => format!("Failed on {code} tag"),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::bad_request(err.body_text())
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        warn!("rejected token: {}", err);
        ApiError::unauthorized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(length(min = 1))]
        nama: String,
        #[validate(email)]
        email: String,
        #[validate(range(min = 1))]
        kuantitas: i32,
        #[validate(required)]
        no_telp: Option<String>,
    }

    #[test]
    fn validation_errors_are_translated_per_field() {
        let err: ApiError = Signup {
            nama: String::new(),
            email: "nope".into(),
            kuantitas: 0,
            no_telp: None,
        }
        .validate()
        .unwrap_err()
        .into();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.messages(),
            &[
                "email: This field must be a valid email".to_string(),
                "kuantitas: This field must be greater than 0".to_string(),
                "nama: This field is required".to_string(),
                "no_telp: This field is required".to_string(),
            ]
        );
    }

    #[test]
    fn record_not_found_maps_to_404() {
        let err: ApiError = DbErr::RecordNotFound("category".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.messages(), &["Failed, category not found".to_string()]);
    }

    #[test]
    fn unexpected_database_errors_are_internal() {
        let err: ApiError = DbErr::Custom("disk full".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.severity(), Severity::Error);
        assert_eq!(err.messages(), &["Internal server error".to_string()]);
    }

    #[test]
    fn filter_errors_are_bad_requests() {
        let err: ApiError = FilterError::OrderByNotAllowed("kata_sandi".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.messages(),
            &["Order by column 'kata_sandi' is not allowed!".to_string()]
        );
    }
}
