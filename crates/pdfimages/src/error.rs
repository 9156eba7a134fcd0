use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Errors surfaced to HTTP clients of the `serve` subcommand.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Missing upload: {0}")]
    MissingUpload(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Unprocessable document: {0}")]
    Unprocessable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::MissingUpload(_) | Error::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            Error::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Io(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<pdf::PdfError> for Error {
    fn from(err: pdf::PdfError) -> Self {
        match err {
            pdf::PdfError::Io(io) => Error::Io(io),
            other => Error::Unprocessable(other.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{self}");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
