use crate::util::extractor::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::error::ErrorKind;
use std::error::Error;
use std::fmt;
use validator::ValidationErrors;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Debug)]
pub struct ErrorMessage {
    pub code: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),

    PathError(u16, String),

    JsonRejection(JsonRejection),

    ValidationError(ValidationErrors),

    Sqlx(sqlx::Error),

    Anyhow(anyhow::Error),

    Any(ErrorMessage),
}

impl ApiError {
    fn code(&self) -> u16 {
        use ApiError::*;

        match self {
            BadRequest(_) | ValidationError(_) => 400,
            NotFound(_) => 404,
            PathError(code, _) => *code,
            JsonRejection(err) => match err {
                axum::extract::rejection::JsonRejection::MissingJsonContentType(_) => 415,
                _ => 400,
            },
            Sqlx(err) if is_unavailable(err) => 503,
            Sqlx(_) | Anyhow(_) => 500,
            Any(message) => message.code,
        }
    }

    fn reason(&self) -> &str {
        match StatusCode::from_u16(self.code()) {
            Ok(status) => status.canonical_reason().unwrap_or("Unknown error"),
            Err(_e) => "Unknown error",
        }
    }

    fn message(&self) -> Option<String> {
        use ApiError::*;

        match self {
            BadRequest(msg) | NotFound(msg) => Some(msg.clone()),
            PathError(_, message) => Some(message.clone()),
            JsonRejection(error) => Some(error.body_text()),
            ValidationError(err) => Some(err.to_string().replace('\n', "; ")),
            Sqlx(err) if is_unavailable(err) => Some("Storage temporarily unavailable".to_string()),
            Sqlx(_) | Anyhow(_) => None,
            Any(msg) => msg.message.clone(),
        }
    }

    fn to_default_json(&self) -> Response {
        self.to_json(self.code(), self.reason(), self.message().as_deref())
    }

    fn to_json(&self, code: u16, error: &str, message: Option<&str>) -> Response {
        (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(ErrorMessage {
                code,
                error: error.to_string(),
                message: message.map(String::from),
            }),
        )
            .into_response()
    }
}

// Errors the caller may retry: the store was unreachable rather than the request being wrong.
fn is_unavailable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use ApiError::*;
        use ErrorKind::*;

        match self {
            Sqlx(ref error) => {
                tracing::error!("sqlx error: {:?}", error);
                match error {
                    sqlx::Error::Database(dbe) => match dbe.kind() {
                        UniqueViolation => {
                            self.to_json(409, "Conflict", Some("Unique value already in use"))
                        }
                        ForeignKeyViolation => {
                            self.to_json(400, "Bad Request", Some("Missing related record"))
                        }
                        NotNullViolation => {
                            self.to_json(400, "Bad Request", Some("Missing required field"))
                        }
                        CheckViolation => {
                            self.to_json(400, "Bad Request", Some("Invalid input value"))
                        }
                        _ => self.to_default_json(),
                    },
                    sqlx::Error::RowNotFound => {
                        self.to_json(404, "Not Found", Some("Data not found"))
                    }
                    _ => self.to_default_json(),
                }
            }
            Anyhow(ref error) => {
                tracing::error!("generic error: {:?}", error);
                self.to_default_json()
            }
            _ => self.to_default_json(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {}", self.reason(), message),
            None => write!(f, "{}", self.reason()),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use ApiError::*;

        match self {
            JsonRejection(err) => Some(err),
            ValidationError(err) => Some(err),
            Sqlx(err) => Some(err),
            Anyhow(err) => err.source(),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Sqlx(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Anyhow(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Anyhow(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::JsonRejection(rejection)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        ApiError::ValidationError(err)
    }
}

pub fn bad_request(msg: &str) -> ApiError {
    ApiError::BadRequest(msg.to_string())
}

pub fn not_found(msg: &str) -> ApiError {
    ApiError::NotFound(msg.to_string())
}

pub fn any_error(code: u16, error: &str, message: Option<&str>) -> ApiError {
    ApiError::Any(ErrorMessage {
        code,
        error: error.to_string(),
        message: message.map(String::from),
    })
}
