//! Response validation. A malformed success response is never accepted.

use altar_core::{ClassifiedError, GenerateAltarResponse, UploadPhotoResponse};
use serde_json::{Map, Value};

/// Parse a body that must be a JSON object
pub fn parse_object(body: &str) -> Result<Map<String, Value>, ClassifiedError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ClassifiedError::invalid_response_format()),
    }
}

fn required(map: &Map<String, Value>, field: &str) -> Result<String, ClassifiedError> {
    match map.get(field) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        _ => Err(ClassifiedError::incomplete_response()),
    }
}

/// `{ photoUrl, s3Key }`
pub fn parse_upload_response(map: &Map<String, Value>) -> Result<UploadPhotoResponse, ClassifiedError> {
    Ok(UploadPhotoResponse {
        photo_url: required(map, "photoUrl")?,
        s3_key: required(map, "s3Key")?,
    })
}

/// `{ altarImageUrl, altarImageS3Key }`
pub fn parse_generate_response(
    map: &Map<String, Value>,
) -> Result<GenerateAltarResponse, ClassifiedError> {
    Ok(GenerateAltarResponse {
        altar_image_url: required(map, "altarImageUrl")?,
        altar_image_s3_key: required(map, "altarImageS3Key")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use altar_core::ErrorCode;

    #[test]
    fn non_object_bodies_are_invalid() {
        for body in ["", "null", "[]", "\"ok\"", "42", "{not json"] {
            let err = parse_object(body).unwrap_err();
            assert_eq!(err.code(), &ErrorCode::InvalidResponse, "{body}");
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn missing_or_empty_fields_are_incomplete() {
        let map = parse_object(r#"{"photoUrl":"u"}"#).unwrap();
        assert_eq!(
            parse_upload_response(&map).unwrap_err(),
            ClassifiedError::incomplete_response()
        );

        let map = parse_object(r#"{"altarImageUrl":"","altarImageS3Key":"k"}"#).unwrap();
        assert!(parse_generate_response(&map).is_err());

        let map = parse_object(r#"{"photoUrl":"u","s3Key":7}"#).unwrap();
        assert!(parse_upload_response(&map).is_err());
    }

    #[test]
    fn complete_bodies_parse() {
        let map = parse_object(r#"{"photoUrl":"u","s3Key":"k1","extra":true}"#).unwrap();
        let upload = parse_upload_response(&map).unwrap();
        assert_eq!(upload.photo_url, "u");
        assert_eq!(upload.s3_key, "k1");
    }
}
