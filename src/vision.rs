//! Google Cloud Vision label detection.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::excerpt,
    labels::{DetectError, DetectionParams, Label, LabelDetector},
    request::DecodedImage,
};

pub const DEFAULT_VISION_API_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

#[derive(Clone)]
pub struct VisionLabelDetector {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl VisionLabelDetector {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Serialize)]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    label_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Converts an annotate response into labels in service order. Vision scores
/// are in `0..=1` and are scaled to percentages.
fn labels_from_response(response: AnnotateResponse) -> Result<Vec<Label>, DetectError> {
    let image = response.responses.into_iter().next().unwrap_or_default();
    if let Some(status) = image.error {
        return Err(DetectError::Service {
            code: status.code,
            message: status.message,
        });
    }
    Ok(image
        .label_annotations
        .into_iter()
        .map(|annotation| Label::new(annotation.description, annotation.score * 100.0))
        .collect())
}

#[async_trait]
impl LabelDetector for VisionLabelDetector {
    async fn detect_labels(
        &self,
        image: &DecodedImage,
        params: DetectionParams,
    ) -> Result<Vec<Label>, DetectError> {
        let payload = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: general_purpose::STANDARD.encode(image.as_bytes()),
                },
                features: vec![Feature {
                    kind: "LABEL_DETECTION",
                    max_results: params.max_labels,
                }],
            }],
        };

        debug!(bytes = image.len(), "sending image to label detection");

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;
        debug!(%status, body = %excerpt(&response_text, 500), "label detection responded");

        if !status.is_success() {
            return Err(DetectError::Status {
                status,
                body: excerpt(&response_text, 500),
            });
        }

        let parsed: AnnotateResponse = serde_json::from_str(&response_text)?;
        labels_from_response(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<Vec<Label>, DetectError> {
        labels_from_response(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn scales_scores_to_percent() {
        let labels = parse(json!({
            "responses": [{
                "labelAnnotations": [
                    { "mid": "/m/0bt9lr", "description": "Dog", "score": 0.952, "topicality": 0.952 },
                    { "mid": "/m/0jbk", "description": "Animal", "score": 0.88 }
                ]
            }]
        }))
        .unwrap();

        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].name, "Dog");
        assert!((labels[0].confidence - 95.2).abs() < 0.01);
        assert_eq!(labels[1].name, "Animal");
    }

    #[test]
    fn empty_response_has_no_labels() {
        assert!(parse(json!({ "responses": [{}] })).unwrap().is_empty());
        assert!(parse(json!({})).unwrap().is_empty());
    }

    #[test]
    fn per_image_error_is_service_error() {
        let err = parse(json!({
            "responses": [{ "error": { "code": 3, "message": "Bad image data." } }]
        }))
        .unwrap_err();

        match err {
            DetectError::Service { code, message } => {
                assert_eq!(code, 3);
                assert_eq!(message, "Bad image data.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn request_body_shape() {
        let payload = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: "aGVsbG8=".into(),
                },
                features: vec![Feature {
                    kind: "LABEL_DETECTION",
                    max_results: 10,
                }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "requests": [{
                    "image": { "content": "aGVsbG8=" },
                    "features": [{ "type": "LABEL_DETECTION", "maxResults": 10 }]
                }]
            })
        );
    }
}
