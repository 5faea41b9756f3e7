use crate::errors::ApiError;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

/// an extractor that internally uses `axum::extract::Json` but has a custom rejection
#[derive(FromRequest)]
#[from_request(via(axum::extract::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        let Self(value) = self;
        axum::Json(value).into_response()
    }
}

/// an extractor that internally uses `crate::util::extractor::Json` and adds validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = ApiError>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// an extractor that internally uses `axum::extract::Path` but has a custom rejection
pub struct Path<T>(pub T);

impl<S, T> FromRequestParts<S> for Path<T>
where
    // these trait bounds are copied from `impl FromRequest for axum::extract::path::Path`
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        use axum::extract::path::ErrorKind::*;
        use ApiError::PathError;

        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(match rejection {
                PathRejection::FailedToDeserializePathParams(inner) => {
                    let kind = inner.into_kind();

                    match &kind {
                        WrongNumberOfParameters { .. }
                        | ParseErrorAtKey { .. }
                        | ParseErrorAtIndex { .. }
                        | ParseError { .. }
                        | InvalidUtf8InPathParam { .. } => PathError(400, kind.to_string()),

                        // nested maps and the like: a programming error, not a client one
                        UnsupportedType { .. } => PathError(500, kind.to_string()),

                        Message(msg) => PathError(400, msg.to_string()),
                        _ => PathError(400, format!("Unhandled deserialization error: {kind}")),
                    }
                }
                PathRejection::MissingPathParams(error) => PathError(500, error.to_string()),
                _ => PathError(500, format!("Unhandled path rejection: {rejection}")),
            }),
        }
    }
}
