//! Photo preparation before upload: bound the size, re-encode as JPEG.
//!
//! Preparation never blocks the flow. If the bytes cannot be decoded or
//! re-encoded the original file is sent unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, ImageError};
use thiserror::Error;

/// Neither side of an uploaded photo exceeds this.
pub const MAX_DIMENSION: u32 = 1024;

pub const JPEG_QUALITY: u8 = 85;

const JPEG_MIME: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum ImageInputError {
    #[error("{} is not an image", .0.display())]
    NotAnImage(PathBuf),

    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Bytes ready to be sent as the `image` part.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
    /// Output dimensions; `None` when the original was passed through
    pub dimensions: Option<(u32, u32)>,
}

impl PreparedImage {
    /// Whether the bytes were re-encoded.
    pub fn is_reencoded(&self) -> bool {
        self.dimensions.is_some()
    }
}

/// Scale `(width, height)` so the larger side is at most `max`, keeping the
/// aspect ratio. Never upscales.
pub fn target_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }

    let scale = |side: u32, long: u32| -> u32 {
        let scaled = (side as u64 * max as u64 + long as u64 / 2) / long as u64;
        (scaled as u32).max(1)
    };

    if width >= height {
        (max, scale(height, width))
    } else {
        (scale(width, height), max)
    }
}

/// MIME type for a path, or `None` if it is not an image.
pub fn image_mime_for(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map(|mime| mime.essence_str().to_string())
}

/// Filter for dropped or selected files: only images get through.
pub fn accept_image(path: &Path) -> Option<&Path> {
    image_mime_for(path).map(|_| path)
}

/// Read and prepare a photo from disk.
pub fn prepare_file(path: &Path) -> Result<PreparedImage, ImageInputError> {
    let mime_type =
        image_mime_for(path).ok_or_else(|| ImageInputError::NotAnImage(path.to_path_buf()))?;

    let bytes = fs::read(path).map_err(|source| ImageInputError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());

    Ok(prepare_image(bytes, &file_name, &mime_type))
}

/// Resize and re-encode; falls back to the original bytes on any failure.
pub fn prepare_image(original: Vec<u8>, file_name: &str, mime_type: &str) -> PreparedImage {
    match reencode(&original) {
        Ok((bytes, dimensions)) => PreparedImage {
            bytes,
            mime_type: JPEG_MIME.to_string(),
            file_name: jpeg_file_name(file_name),
            dimensions: Some(dimensions),
        },
        Err(e) => {
            tracing::debug!(error = %e, file_name = %file_name, "Sending original image bytes");
            PreparedImage {
                bytes: original,
                mime_type: mime_type.to_string(),
                file_name: file_name.to_string(),
                dimensions: None,
            }
        }
    }
}

fn reencode(original: &[u8]) -> Result<(Vec<u8>, (u32, u32)), ImageError> {
    let img = image::load_from_memory(original)?;
    let (width, height) = target_dimensions(img.width(), img.height(), MAX_DIMENSION);

    let img = if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Triangle)
    };

    let rgb = img.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode(
        rgb.as_raw(),
        width,
        height,
        ColorType::Rgb8.into(),
    )?;

    Ok((bytes, (width, height)))
}

fn jpeg_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "photo".to_string());
    format!("{}.jpg", stem)
}
