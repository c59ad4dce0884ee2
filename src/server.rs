use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::{Config, DEFAULT_MAX_BODY_BYTES},
    error::AnalyzeError,
    handler::Analyzer,
    request::InvocationEvent,
};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

/// HTTP settings that sit outside the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    pub max_body_bytes: usize,
    /// Wraps every route in the CORS layer instead of only answering
    /// preflight requests.
    pub cors_all_responses: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            cors_all_responses: false,
        }
    }
}

impl From<&Config> for ServerOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_body_bytes: config.max_body_bytes,
            cors_all_responses: config.cors_all_responses,
        }
    }
}

/// `*` origin, `Content-Type` header, `OPTIONS` and `POST`.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::OPTIONS, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn router(state: AppState, options: ServerOptions) -> Router {
    // The layer answers preflights itself; a bare OPTIONS falls through.
    let analyze_route = post(analyze).merge(
        axum::routing::options(|| async { StatusCode::NO_CONTENT }).layer(cors_layer()),
    );

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/analyze", analyze_route)
        .layer(DefaultBodyLimit::max(options.max_body_bytes));

    let app = if options.cors_all_responses {
        app.layer(cors_layer())
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Turns the HTTP body into an invocation event. An empty body is an absent
/// one; a body the extractor refuses still gets a JSON error.
async fn analyze(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let err = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AnalyzeError::BodyTooLarge(rejection.body_text())
            } else {
                AnalyzeError::MalformedBody(rejection.body_text())
            };
            return state.analyzer.reject(&err).into_response();
        }
    };

    let event = if body.is_empty() {
        InvocationEvent::default()
    } else {
        match String::from_utf8(body.to_vec()) {
            Ok(text) => InvocationEvent::with_body(text),
            Err(e) => {
                let err = AnalyzeError::MalformedBody(e.to_string());
                return state.analyzer.reject(&err).into_response();
            }
        }
    };

    state.analyzer.handle(event).await.into_response()
}

async fn health() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store")],
        Json(json!({ "status": "ok" })),
    )
}

async fn index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}
