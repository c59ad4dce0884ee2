use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    caption::{CaptionGenerator, CAPTION_FALLBACK},
    error::{AnalyzeError, AnalyzeResult},
    labels::{DetectionParams, LabelDetector},
    request::{decode_request, InvocationEvent},
    response::{InvocationResponse, ResponseEncoder},
};

/// The analysis pipeline: decode, detect labels, caption, encode.
///
/// Holds the outbound capabilities; cloning is cheap and shares them.
#[derive(Clone)]
pub struct Analyzer {
    detector: Arc<dyn LabelDetector>,
    captioner: Arc<dyn CaptionGenerator>,
    params: DetectionParams,
    encoder: ResponseEncoder,
}

impl Analyzer {
    pub fn new(detector: Arc<dyn LabelDetector>, captioner: Arc<dyn CaptionGenerator>) -> Self {
        Self {
            detector,
            captioner,
            params: DetectionParams::default(),
            encoder: ResponseEncoder,
        }
    }

    pub fn with_params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }

    /// Runs one invocation. Never fails: every error becomes a response.
    #[tracing::instrument(name = "analyze", skip_all)]
    pub async fn handle(&self, event: InvocationEvent) -> InvocationResponse {
        match self.analyze(event).await {
            Ok(response) => response,
            Err(err) => self.reject(&err),
        }
    }

    /// Logs `err` and encodes its response.
    pub fn reject(&self, err: &AnalyzeError) -> InvocationResponse {
        match err {
            AnalyzeError::InvalidRequest => warn!("rejected request: {err}"),
            _ => error!("An unexpected error occurred: {err}"),
        }
        self.encoder.error(err)
    }

    pub async fn analyze(&self, event: InvocationEvent) -> AnalyzeResult<InvocationResponse> {
        let image = decode_request(&event)?;
        info!(bytes = image.len(), "received image");

        let detected = self.detector.detect_labels(&image, self.params).await?;
        drop(image);

        let labels: Vec<String> = self
            .params
            .select(detected)
            .into_iter()
            .map(|label| label.name)
            .collect();

        if labels.is_empty() {
            info!("no labels above confidence threshold");
            return self.encoder.no_labels();
        }
        info!(count = labels.len(), ?labels, "detected labels");

        let description = self.describe(&labels).await;
        self.encoder.success(&labels, &description)
    }

    async fn describe(&self, labels: &[String]) -> String {
        match self.captioner.describe(labels).await {
            Ok(caption) => caption,
            Err(err) => {
                error!(error = %err, "Error calling Gemini API");
                CAPTION_FALLBACK.to_string()
            }
        }
    }
}
