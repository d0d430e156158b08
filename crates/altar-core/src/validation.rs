//! Input validation consumed before pipeline entry
//!
//! - Photo size bounds and magic-number type detection (JPEG, PNG, WEBP)
//! - Food description length bounds (trimmed, 10..=500 characters)
//! - Description sanitization

use crate::error::ErrorCode;
use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_DESCRIPTION_LENGTH: usize = 10;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_FILE_SIZE_MB: usize = 10;
pub const MAX_FILE_SIZE_BYTES: usize = MAX_FILE_SIZE_MB * 1024 * 1024;

/// Bytes needed to inspect every supported signature
pub const SIGNATURE_LEN: usize = 12;

const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];
const PNG_SIGNATURE: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];
const RIFF_SIGNATURE: [u8; 4] = [0x52, 0x49, 0x46, 0x46];
const WEBP_SIGNATURE: [u8; 4] = [0x57, 0x45, 0x42, 0x50];

static UNSAFE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"[<>]", r"(?i)javascript:", r"(?i)on\w+=", r"(?i)data:", r"(?i)vbscript:"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Validation failures (messages are user-facing)
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("El archivo está vacío")]
    EmptyFile,

    #[error("El archivo es demasiado pequeño para ser una imagen válida")]
    FileTooSmall,

    #[error("La imagen es demasiado grande ({size_mb:.2}MB). Debe ser menor a 10MB")]
    FileTooLarge { size_mb: f64 },

    #[error("Por favor, sube una imagen JPEG, PNG o WEBP")]
    UnsupportedType,

    #[error("La descripción no puede estar vacía")]
    EmptyDescription,

    #[error("La descripción debe tener al menos 10 caracteres")]
    DescriptionTooShort,

    #[error("La descripción no debe exceder 500 caracteres")]
    DescriptionTooLong,
}

impl ValidationError {
    /// Remote-taxonomy code of the failure
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyDescription | Self::DescriptionTooShort | Self::DescriptionTooLong => {
                ErrorCode::InvalidDescriptionLength
            }
            Self::EmptyFile | Self::FileTooSmall | Self::FileTooLarge { .. } | Self::UnsupportedType => {
                ErrorCode::InvalidRequest
            }
        }
    }
}

/// Image formats accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// Identify the format from leading bytes, if supported
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&JPEG_SIGNATURE) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(&PNG_SIGNATURE) {
            return Some(Self::Png);
        }
        if bytes.len() >= SIGNATURE_LEN
            && bytes.starts_with(&RIFF_SIGNATURE)
            && bytes[8..SIGNATURE_LEN] == WEBP_SIGNATURE
        {
            return Some(Self::Webp);
        }
        None
    }
}

/// Check the photo is non-empty and at most 10 MiB
pub fn validate_file_size(len: usize) -> Result<(), ValidationError> {
    if len == 0 {
        return Err(ValidationError::EmptyFile);
    }
    if len > MAX_FILE_SIZE_BYTES {
        #[allow(clippy::cast_precision_loss)]
        let size_mb = len as f64 / (1024.0 * 1024.0);
        return Err(ValidationError::FileTooLarge { size_mb });
    }
    Ok(())
}

/// Check the photo signature. Files under 12 bytes are rejected before any
/// signature inspection.
pub fn validate_file_type(bytes: &[u8]) -> Result<ImageKind, ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::EmptyFile);
    }
    if bytes.len() < SIGNATURE_LEN {
        return Err(ValidationError::FileTooSmall);
    }
    ImageKind::detect(&bytes[..SIGNATURE_LEN]).ok_or(ValidationError::UnsupportedType)
}

/// Size first (cheaper), then type
pub fn validate_file(bytes: &[u8]) -> Result<ImageKind, ValidationError> {
    validate_file_size(bytes.len())?;
    validate_file_type(bytes)
}

/// Check the trimmed description is within 10..=500 characters
pub fn validate_food_description(description: &str) -> Result<(), ValidationError> {
    let len = description.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::EmptyDescription);
    }
    if len < MIN_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooShort);
    }
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(())
}

/// Trim and strip markup/script fragments from a description
#[must_use]
pub fn sanitize_food_description(description: &str) -> String {
    UNSAFE_PATTERNS
        .iter()
        .fold(description.trim().to_string(), |acc, re| {
            re.replace_all(&acc, "").into_owned()
        })
}

/// Characters left before the description limit (negative when over)
#[must_use]
pub fn remaining_characters(description: &str) -> i64 {
    let used = i64::try_from(description.chars().count()).unwrap_or(i64::MAX);
    i64::try_from(MAX_DESCRIPTION_LENGTH).unwrap_or(i64::MAX) - used
}

/// Human readable size, e.g. `1.5 MB`
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn padded(prefix: &[u8]) -> Vec<u8> {
        let mut bytes = prefix.to_vec();
        bytes.resize(16, 0);
        bytes
    }

    #[test]
    fn detects_supported_signatures() {
        assert_eq!(validate_file_type(&padded(&[0xFF, 0xD8, 0xFF, 0xE0])), Ok(ImageKind::Jpeg));
        assert_eq!(validate_file_type(&padded(&PNG_SIGNATURE)), Ok(ImageKind::Png));

        let mut webp = padded(b"RIFF");
        webp[8..12].copy_from_slice(b"WEBP");
        assert_eq!(validate_file_type(&webp), Ok(ImageKind::Webp));
    }

    #[test]
    fn riff_without_webp_marker_is_rejected() {
        let mut wav = padded(b"RIFF");
        wav[8..12].copy_from_slice(b"WAVE");
        assert_eq!(validate_file_type(&wav), Err(ValidationError::UnsupportedType));
    }

    #[test]
    fn short_and_empty_files_fail_before_inspection() {
        assert_eq!(validate_file_type(&[]), Err(ValidationError::EmptyFile));
        // a valid JPEG prefix is still too short
        assert_eq!(
            validate_file_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]),
            Err(ValidationError::FileTooSmall)
        );
    }

    #[test]
    fn file_size_bounds() {
        assert_eq!(validate_file_size(0), Err(ValidationError::EmptyFile));
        assert!(validate_file_size(MAX_FILE_SIZE_BYTES).is_ok());
        assert!(matches!(
            validate_file_size(MAX_FILE_SIZE_BYTES + 1),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn description_length_counts_trimmed_characters() {
        assert_eq!(validate_food_description("   "), Err(ValidationError::EmptyDescription));
        assert_eq!(validate_food_description("  mole  "), Err(ValidationError::DescriptionTooShort));
        assert!(validate_food_description("Pan de muerto y mole").is_ok());
        // multibyte characters count once
        assert!(validate_food_description("ñññññññññü").is_ok());
        assert_eq!(
            ValidationError::DescriptionTooLong.code(),
            ErrorCode::InvalidDescriptionLength
        );
    }

    #[test]
    fn sanitize_strips_markup_and_protocols() {
        let dirty = "  <b>Tamales</b> onclick=JavaScript:alert(1) data:x VBScript:y ";
        assert_eq!(sanitize_food_description(dirty), "bTamales/b alert(1) x y");
    }

    #[test]
    fn formats_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
    }

    #[test]
    fn remaining_characters_goes_negative() {
        assert_eq!(remaining_characters(""), 500);
        assert_eq!(remaining_characters(&"x".repeat(510)), -10);
    }

    proptest! {
        #[test]
        fn prop_description_in_range_is_valid(len in MIN_DESCRIPTION_LENGTH..=MAX_DESCRIPTION_LENGTH, pad in 0usize..5) {
            let text = format!("{}{}{}", " ".repeat(pad), "a".repeat(len), " ".repeat(pad));
            prop_assert!(validate_food_description(&text).is_ok());
        }

        #[test]
        fn prop_description_out_of_range_is_invalid(len in prop_oneof![1usize..MIN_DESCRIPTION_LENGTH, (MAX_DESCRIPTION_LENGTH + 1)..800]) {
            let text = "a".repeat(len);
            let err = validate_food_description(&text).unwrap_err();
            prop_assert_eq!(err.code(), ErrorCode::InvalidDescriptionLength);
            if len < MIN_DESCRIPTION_LENGTH {
                prop_assert_eq!(err, ValidationError::DescriptionTooShort);
            } else {
                prop_assert_eq!(err, ValidationError::DescriptionTooLong);
            }
        }

        #[test]
        fn prop_small_files_never_validate(bytes in proptest::collection::vec(any::<u8>(), 0..SIGNATURE_LEN)) {
            prop_assert!(validate_file_type(&bytes).is_err());
        }
    }
}
