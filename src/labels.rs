use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::DecodedImage;

pub const MAX_LABELS: usize = 10;
pub const MIN_CONFIDENCE: f32 = 80.0;

/// A detected object or concept. `confidence` is a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub confidence: f32,
}

impl Label {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    pub max_labels: usize,
    pub min_confidence: f32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            max_labels: MAX_LABELS,
            min_confidence: MIN_CONFIDENCE,
        }
    }
}

impl DetectionParams {
    /// Keeps labels at or above the threshold, in the order given, up to
    /// `max_labels` of them.
    pub fn select(&self, labels: impl IntoIterator<Item = Label>) -> Vec<Label> {
        labels
            .into_iter()
            .filter(|label| label.confidence >= self.min_confidence)
            .take(self.max_labels)
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("request to detection service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("detection service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("detection service reported error {code}: {message}")]
    Service { code: i64, message: String },
    #[error("unexpected detection response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Outbound label-detection capability.
#[async_trait]
pub trait LabelDetector: Send + Sync {
    async fn detect_labels(
        &self,
        image: &DecodedImage,
        params: DetectionParams,
    ) -> Result<Vec<Label>, DetectError>;
}
