//! Image analysis function: base64 image in, detected labels and a generated
//! caption out.
//!
//! The pipeline lives in [`handler::Analyzer`]; the outbound services are
//! reached through the [`labels::LabelDetector`] and
//! [`caption::CaptionGenerator`] traits so they can be swapped for stubs.

pub mod caption;
pub mod config;
pub mod error;
pub mod handler;
pub mod labels;
pub mod request;
pub mod response;
pub mod server;
pub mod vision;

pub use caption::{CaptionGenerator, GeminiCaptioner};
pub use config::Config;
pub use error::AnalyzeError;
pub use handler::Analyzer;
pub use labels::{DetectionParams, Label, LabelDetector};
pub use request::{DecodedImage, InvocationEvent};
pub use response::InvocationResponse;
pub use vision::VisionLabelDetector;
