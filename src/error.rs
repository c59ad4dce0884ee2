use axum::http::StatusCode;
use thiserror::Error;

use crate::{caption::GenerateError, labels::DetectError};

/// Body text of the 400 response.
pub const NO_IMAGE_MESSAGE: &str = "No image provided in the request body.";
/// Body text of every 500 response. Callers never see the underlying cause.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred.";
/// Body text of the 413 response.
pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body is too large.";

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("no image provided in the request body")]
    InvalidRequest,
    #[error("request body rejected: {0}")]
    BodyTooLarge(String),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("image payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("label detection failed: {0}")]
    Detection(#[from] DetectError),
    #[error("caption generation failed: {0}")]
    Generation(#[from] GenerateError),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type AnalyzeResult<T> = Result<T, AnalyzeError>;

impl AnalyzeError {
    /// Status code mapping. A missing image is the caller's fault and an
    /// oversized body is refused before decoding; a bad payload and a
    /// downstream outage are reported the same way.
    pub fn status(&self) -> StatusCode {
        match self {
            AnalyzeError::InvalidRequest => StatusCode::BAD_REQUEST,
            AnalyzeError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AnalyzeError::MalformedBody(_)
            | AnalyzeError::Decode(_)
            | AnalyzeError::Detection(_)
            | AnalyzeError::Generation(_)
            | AnalyzeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            AnalyzeError::InvalidRequest => NO_IMAGE_MESSAGE,
            AnalyzeError::BodyTooLarge(_) => BODY_TOO_LARGE_MESSAGE,
            _ => INTERNAL_ERROR_MESSAGE,
        }
    }
}

/// First `max_chars` characters of an upstream body, for logs and errors.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
