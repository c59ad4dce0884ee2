// Shared helpers for integration tests; not every test file uses all of them.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use base64::{engine::general_purpose, Engine as _};
use image_analyzer::{
    caption::GenerateError,
    labels::DetectError,
    server::{router, AppState, ServerOptions},
    Analyzer, CaptionGenerator, DecodedImage, DetectionParams, Label, LabelDetector,
};

pub const FAKE_JPEG: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF\x00dog";

pub fn encoded_image() -> String {
    general_purpose::STANDARD.encode(FAKE_JPEG)
}

/// Detector returning a fixed result.
pub struct FixedDetector(pub Result<Vec<Label>, String>);

#[async_trait]
impl LabelDetector for FixedDetector {
    async fn detect_labels(
        &self,
        _image: &DecodedImage,
        _params: DetectionParams,
    ) -> Result<Vec<Label>, DetectError> {
        match &self.0 {
            Ok(labels) => Ok(labels.clone()),
            Err(message) => Err(DetectError::Service {
                code: 14,
                message: message.clone(),
            }),
        }
    }
}

/// Captioner returning a fixed result.
pub struct FixedCaptioner(pub Option<String>);

#[async_trait]
impl CaptionGenerator for FixedCaptioner {
    async fn describe(&self, _labels: &[String]) -> Result<String, GenerateError> {
        self.0.clone().ok_or_else(|| GenerateError::Status {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "overloaded".into(),
        })
    }
}

/// The test router allows 1 MiB bodies.
pub fn app_with(detector: FixedDetector, captioner: FixedCaptioner) -> Router {
    app_with_options(detector, captioner, false)
}

pub fn app_with_options(
    detector: FixedDetector,
    captioner: FixedCaptioner,
    cors_all_responses: bool,
) -> Router {
    let analyzer = Analyzer::new(Arc::new(detector), Arc::new(captioner));
    let options = ServerOptions {
        max_body_bytes: 1024 * 1024,
        cors_all_responses,
    };
    router(AppState::new(analyzer), options)
}

pub fn dog_app() -> Router {
    app_with(
        FixedDetector(Ok(vec![
            Label::new("Dog", 95.2),
            Label::new("Animal", 88.0),
        ])),
        FixedCaptioner(Some("A dog is present.".into())),
    )
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("mock upstream address");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("mock upstream error: {}", e);
        }
    });
    format!("http://{}", addr)
}
