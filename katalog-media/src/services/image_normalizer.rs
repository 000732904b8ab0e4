//! Image validation and re-encoding
//!
//! The detected format is taken from the bytes alone. URL extensions and
//! server-declared content types are not trusted.
//!
//! Two profiles exist:
//! - `Batch`: legacy migration, 1200×1200 box, hard failure on any fault
//! - `Interactive`: per-request uploads, 800×800 box, falls back to the
//!   original bytes when normalization fails (see `normalize_or_passthrough`)

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use thiserror::Error;

/// JPEG quality used for every re-encoded image
pub const JPEG_QUALITY: u8 = 85;

/// Content type of every normalized image
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Normalization errors
#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("Invalid image data: no image format detected")]
    UnrecognizedFormat,

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image processing failed: {0}")]
    ProcessingFailed(String),
}

/// Which caller is normalizing, and therefore which rules apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeProfile {
    Batch,
    Interactive,
}

impl NormalizeProfile {
    /// Bounding box edge in pixels
    pub fn max_dimension(&self) -> u32 {
        match self {
            NormalizeProfile::Batch => 1200,
            NormalizeProfile::Interactive => 800,
        }
    }

    /// Formats this profile will re-encode
    pub fn accepts(&self, format: ImageFormat) -> bool {
        match self {
            NormalizeProfile::Batch => matches!(
                format,
                ImageFormat::Jpeg
                    | ImageFormat::Png
                    | ImageFormat::WebP
                    | ImageFormat::Gif
                    | ImageFormat::Bmp
                    | ImageFormat::Tiff
            ),
            NormalizeProfile::Interactive => {
                matches!(format, ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP)
            }
        }
    }
}

/// Re-encoded image ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Validate `raw` and re-encode it as a bounded JPEG
pub fn normalize(raw: &[u8], profile: NormalizeProfile) -> Result<NormalizedImage, NormalizationError> {
    let format = image::guess_format(raw).map_err(|_| NormalizationError::UnrecognizedFormat)?;

    if !profile.accepts(format) {
        return Err(NormalizationError::UnsupportedFormat(format_name(format)));
    }

    let mut reader = ImageReader::with_format(Cursor::new(raw), format);
    reader.no_limits();

    let decoded = reader
        .decode()
        .map_err(|e| NormalizationError::ProcessingFailed(e.to_string()))?;

    tracing::debug!(
        format = %format_name(format),
        width = decoded.width(),
        height = decoded.height(),
        "Decoded image"
    );

    let bounded = fit_within(decoded, profile.max_dimension());
    let bytes = encode_jpeg(bounded)?;

    tracing::debug!(
        input_bytes = raw.len(),
        output_bytes = bytes.len(),
        "Image normalized"
    );

    Ok(NormalizedImage {
        bytes,
        content_type: JPEG_CONTENT_TYPE.to_string(),
    })
}

/// Interactive-upload normalization
///
/// Any normalization failure, including a recognized but unsupported
/// format, forwards the original bytes and declared content type.
pub fn normalize_or_passthrough(raw: Vec<u8>, declared_content_type: &str) -> NormalizedImage {
    match normalize(&raw, NormalizeProfile::Interactive) {
        Ok(normalized) => normalized,
        Err(e) => {
            tracing::warn!(error = %e, "Image normalization failed, using original upload");
            NormalizedImage {
                bytes: raw,
                content_type: declared_content_type.to_string(),
            }
        }
    }
}

/// Shrink to fit inside a `max`×`max` box; never upscale
fn fit_within(image: DynamicImage, max: u32) -> DynamicImage {
    if image.width() <= max && image.height() <= max {
        return image;
    }
    image.resize(max, max, FilterType::Lanczos3)
}

fn encode_jpeg(image: DynamicImage) -> Result<Vec<u8>, NormalizationError> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| NormalizationError::ProcessingFailed(e.to_string()))?;

    Ok(bytes)
}

fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| format!("{:?}", format).to_lowercase())
}
