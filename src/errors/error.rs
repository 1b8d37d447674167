use crate::catalog::{Outcome, ReturnCode};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ApiError {
    /// A protocol step refused the request; answered with its catalog entry.
    Rejected(Outcome, ReturnCode),
    ResourceNotFound,
    Internal(anyhow::Error),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Rejected(outcome, code) => {
                write!(f, "Rejected with {outcome} ({}): {}", code.code, code.comment)
            }
            ApiError::ResourceNotFound => f.write_str("The requested resource could not be found."),
            ApiError::Internal(_) => {
                write!(f, "An internal error occurred. Please try again later.")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Rejected(outcome, code) => {
                tracing::debug!("Request rejected with {outcome}");
                (StatusCode::BAD_REQUEST, Json(code)).into_response()
            }
            ApiError::ResourceNotFound => {
                (StatusCode::NOT_FOUND, self.to_string()).into_response()
            }
            ApiError::Internal(ref err) => {
                tracing::error!("{:?}", err);
                err.chain()
                    .skip(1)
                    .for_each(|cause| tracing::error!("Because: {}", cause));
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(value: E) -> Self {
        Self::Internal(value.into())
    }
}
