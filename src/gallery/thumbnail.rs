use super::{Gallery, GalleryError, Thumbnail};
use crate::ThumbnailConfig;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba, imageops::FilterType};
use std::io::Cursor;
use tracing::{debug, error, warn};

/// Side length of the generated stand-in used when the placeholder asset
/// itself cannot be decoded.
const FALLBACK_PLACEHOLDER_SIZE: u32 = 64;

/// Height from the `height` query value. Anything that is not a positive
/// integer gets the default; oversized requests are clamped.
pub fn parse_height(raw: Option<&str>, config: &ThumbnailConfig) -> u32 {
    raw.filter(|value| !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|&height| height > 0)
        .map(|height| height.min(config.max_height.max(1)))
        .unwrap_or(config.default_height)
}

/// Width that keeps the aspect ratio of a `width` x `height` image scaled to
/// `target_height`.
pub fn scaled_width(width: u32, height: u32, target_height: u32) -> u32 {
    if height == 0 {
        return width.max(1);
    }
    let scaled = (f64::from(width) * f64::from(target_height) / f64::from(height)).round();
    (scaled as u32).max(1)
}

/// Output size for a `width` x `height` source scaled to `target_height`.
///
/// When the aspect-preserving width would exceed `max_width` the width is
/// clamped and the height shrinks with it, so the output never grows past
/// `max_width` x `target_height`.
pub fn thumbnail_dimensions(
    width: u32,
    height: u32,
    target_height: u32,
    max_width: u32,
) -> (u32, u32) {
    let max_width = max_width.max(1);
    let scaled = scaled_width(width, height, target_height);
    if scaled <= max_width {
        return (scaled, target_height);
    }

    let fitted = (f64::from(target_height) * f64::from(max_width) / f64::from(scaled)).round();
    (max_width, (fitted as u32).clamp(1, target_height.max(1)))
}

fn resize_to_fit(img: &DynamicImage, target_height: u32, max_width: u32) -> DynamicImage {
    let (width, height) = thumbnail_dimensions(img.width(), img.height(), target_height, max_width);
    img.resize_exact(width, height, FilterType::Lanczos3)
}

/// First successful encoding, falling back once before giving up with an
/// empty body.
fn encoded_or_fallback(
    primary: Result<Vec<u8>, GalleryError>,
    fallback: impl FnOnce() -> Result<Vec<u8>, GalleryError>,
) -> Vec<u8> {
    let error = match primary {
        Ok(bytes) => return bytes,
        Err(e) => e,
    };

    warn!("Failed to encode thumbnail, trying placeholder: {}", error);
    match fallback() {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to encode placeholder thumbnail: {}", e);
            Vec::new()
        }
    }
}

fn encode_png(img: DynamicImage) -> Result<Vec<u8>, GalleryError> {
    // The PNG encoder has no float pixel support.
    let img = match img {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            DynamicImage::ImageRgba8(img.to_rgba8())
        }
        other => other,
    };

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

impl Gallery {
    /// Produce a PNG of the image at `request_path` scaled to `height`.
    ///
    /// Never fails: missing files, directories, non-images and paths outside
    /// the gallery all yield the placeholder instead.
    pub fn thumbnail(&self, request_path: &str, height: u32) -> Thumbnail {
        let source = match self.load_source(request_path) {
            Ok(img) => img,
            Err(e) => {
                debug!(
                    "Using placeholder thumbnail for {:?}: {}",
                    request_path, e
                );
                self.placeholder_image()
            }
        };

        self.encode_thumbnail(source, height)
    }

    /// The placeholder scaled to `height`.
    pub fn placeholder_thumbnail(&self, height: u32) -> Thumbnail {
        self.encode_thumbnail(self.placeholder_image(), height)
    }

    fn encode_thumbnail(&self, source: DynamicImage, height: u32) -> Thumbnail {
        let max_width = self.config.thumbnail.max_width;
        let bytes = encoded_or_fallback(encode_png(resize_to_fit(&source, height, max_width)), || {
            encode_png(resize_to_fit(&self.placeholder_image(), height, max_width))
        });

        Thumbnail {
            bytes,
            content_type: "image/png",
        }
    }

    fn load_source(&self, request_path: &str) -> Result<DynamicImage, GalleryError> {
        let (_, target) = self.resolve(request_path)?;
        if !target.is_file() {
            return Err(GalleryError::NotFound);
        }

        let reader = image::ImageReader::open(&target)?.with_guessed_format()?;
        Ok(reader.decode()?)
    }

    fn placeholder_image(&self) -> DynamicImage {
        let decoded = image::ImageReader::open(self.placeholder_path())
            .map_err(GalleryError::from)
            .and_then(|reader| Ok(reader.with_guessed_format()?.decode()?));

        match decoded {
            Ok(img) => img,
            Err(e) => {
                warn!(
                    "Placeholder {:?} unavailable ({}), using a blank image",
                    self.placeholder_path(),
                    e
                );
                DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
                    FALLBACK_PLACEHOLDER_SIZE,
                    FALLBACK_PLACEHOLDER_SIZE,
                    Rgba([200, 200, 200, 255]),
                ))
            }
        }
    }
}
