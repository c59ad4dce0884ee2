use base64::{
    alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AnalyzeError, AnalyzeResult};

/// One invocation of the function, shaped like an HTTP proxy event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationEvent {
    /// Raw JSON text of the request body. `None` is read as `{}`.
    #[serde(default)]
    pub body: Option<String>,
}

impl InvocationEvent {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }
}

/// Image bytes owned by a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage(Vec<u8>);

impl DecodedImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Reads the `image` field of the event body and decodes it.
///
/// A missing or falsy `image` is the only [`AnalyzeError::InvalidRequest`].
/// Anything else that goes wrong here (body not a JSON object, `image` not a
/// string, bad base64) is reported as an internal failure.
pub fn decode_request(event: &InvocationEvent) -> AnalyzeResult<DecodedImage> {
    let body = event.body.as_deref().unwrap_or("{}");
    let value: Value =
        serde_json::from_str(body).map_err(|e| AnalyzeError::MalformedBody(e.to_string()))?;

    let Value::Object(fields) = value else {
        return Err(AnalyzeError::MalformedBody(
            "expected a JSON object".to_string(),
        ));
    };

    let image = match fields.get("image") {
        Some(image) if is_truthy(image) => image,
        _ => return Err(AnalyzeError::InvalidRequest),
    };

    let Some(encoded) = image.as_str() else {
        return Err(AnalyzeError::MalformedBody(
            "`image` must be a base64 string".to_string(),
        ));
    };

    decode_base64(encoded)
}

/// Standard alphabet with required padding. Non-zero bits after the last
/// full byte are ignored, so `QR==` decodes to `A`.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decodes standard base64, ignoring line breaks and other ASCII whitespace.
pub fn decode_base64(encoded: &str) -> AnalyzeResult<DecodedImage> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = LENIENT_STANDARD.decode(compact)?;
    Ok(DecodedImage::new(bytes))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose;
    use serde_json::json;

    fn event(body: Value) -> InvocationEvent {
        InvocationEvent::with_body(body.to_string())
    }

    #[test]
    fn decodes_image_field() {
        let encoded = general_purpose::STANDARD.encode(b"\xff\xd8\xff\xe0jpeg");
        let image = decode_request(&event(json!({ "image": encoded }))).unwrap();
        assert_eq!(image.as_bytes(), b"\xff\xd8\xff\xe0jpeg");
    }

    #[test]
    fn missing_body_is_invalid_request() {
        let err = decode_request(&InvocationEvent::default()).unwrap_err();
        assert!(matches!(err, AnalyzeError::InvalidRequest));
    }

    #[test]
    fn missing_or_falsy_image_is_invalid_request() {
        for body in [
            json!({}),
            json!({ "image": null }),
            json!({ "image": "" }),
            json!({ "image": false }),
            json!({ "image": 0 }),
            json!({ "image": [] }),
            json!({ "picture": "aGVsbG8=" }),
        ] {
            let err = decode_request(&event(body.clone())).unwrap_err();
            assert!(matches!(err, AnalyzeError::InvalidRequest), "{body}");
        }
    }

    #[test]
    fn malformed_base64_is_not_invalid_request() {
        let err = decode_request(&event(json!({ "image": "not base64!!" }))).unwrap_err();
        assert!(matches!(err, AnalyzeError::Decode(_)));
    }

    #[test]
    fn non_object_body_is_malformed() {
        for body in ["[1, 2]", "null", "{not json"] {
            let err = decode_request(&InvocationEvent::with_body(body)).unwrap_err();
            assert!(matches!(err, AnalyzeError::MalformedBody(_)), "{body}");
        }
    }

    #[test]
    fn non_string_image_is_malformed() {
        let err = decode_request(&event(json!({ "image": 42 }))).unwrap_err();
        assert!(matches!(err, AnalyzeError::MalformedBody(_)));
    }

    #[test]
    fn non_canonical_trailing_bits_are_accepted() {
        assert_eq!(decode_base64("QR==").unwrap().as_bytes(), b"A");
        assert_eq!(decode_base64("QQ==").unwrap().as_bytes(), b"A");
    }

    #[test]
    fn missing_padding_is_rejected() {
        assert!(matches!(decode_base64("QQ"), Err(AnalyzeError::Decode(_))));
    }

    #[test]
    fn wrapped_base64_is_accepted() {
        let image = decode_base64("aGVs\nbG8g\r\nd29y bGQ=").unwrap();
        assert_eq!(image.as_bytes(), b"hello world");
    }
}
