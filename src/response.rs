use std::collections::BTreeMap;

use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AnalyzeError, AnalyzeResult};

pub const NO_LABELS_MESSAGE: &str = "Could not detect any labels with high confidence.";

/// What the function returns: a status code, headers and a JSON body string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Serialize)]
struct AnalysisBody<'a> {
    labels: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

pub fn cors_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        (
            "Access-Control-Allow-Headers".to_string(),
            "Content-Type".to_string(),
        ),
        (
            "Access-Control-Allow-Methods".to_string(),
            "OPTIONS,POST".to_string(),
        ),
    ])
}

/// Builds the terminal responses of the pipeline. Only the success response
/// carries CORS headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn success(&self, labels: &[String], description: &str) -> AnalyzeResult<InvocationResponse> {
        let body = serde_json::to_string(&AnalysisBody {
            labels,
            description: Some(description),
        })
        .map_err(|e| AnalyzeError::Internal(e.to_string()))?;
        Ok(InvocationResponse {
            status_code: StatusCode::OK.as_u16(),
            headers: cors_headers(),
            body,
        })
    }

    pub fn no_labels(&self) -> AnalyzeResult<InvocationResponse> {
        let body = serde_json::to_string(&AnalysisBody {
            labels: &[],
            description: Some(NO_LABELS_MESSAGE),
        })
        .map_err(|e| AnalyzeError::Internal(e.to_string()))?;
        Ok(InvocationResponse {
            status_code: StatusCode::OK.as_u16(),
            headers: BTreeMap::new(),
            body,
        })
    }

    pub fn error(&self, err: &AnalyzeError) -> InvocationResponse {
        InvocationResponse {
            status_code: err.status().as_u16(),
            headers: BTreeMap::new(),
            body: json!({ "error": err.public_message() }).to_string(),
        }
    }
}

impl IntoResponse for InvocationResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }
        response
    }
}
