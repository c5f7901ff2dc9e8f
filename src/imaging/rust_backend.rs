//! Pure Rust codec backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image::ImageReader` with content sniffing |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless only) |
//! | Encode → TIFF / BMP | `image::codecs::{tiff, bmp}` |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |

use super::backend::{BackendError, ImageBackend};
use super::params::Quality;
use crate::types::OutputFormat;
use image::codecs::avif::AvifEncoder;
use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

/// Input extensions whose decoders are compiled in.
///
/// AVIF is absent: the `image` crate's `"avif"` feature only enables the
/// encoder, while `ImageFormat::reading_enabled()` still reports `true` for it.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has one of the [`supported_input_extensions`].
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| supported_input_extensions().contains(&e.as_str()))
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: ImageError) -> BackendError {
    match err {
        ImageError::IoError(source) => BackendError::Read {
            path: path.to_path_buf(),
            source,
        },
        ImageError::Unsupported(e) => {
            BackendError::UnsupportedFormat(format!("{}: {e}", path.display()))
        }
        other => BackendError::Decode {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        let read_err = |source| BackendError::Read {
            path: path.to_path_buf(),
            source,
        };
        // Sniff content so a mislabelled extension still decodes
        ImageReader::open(path)
            .map_err(read_err)?
            .with_guessed_format()
            .map_err(read_err)?
            .decode()
            .map_err(|e| decode_error(path, e))
    }

    fn encode(
        &self,
        image: &RgbImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let mut buf = Cursor::new(Vec::new());
        let (w, h) = image.dimensions();
        let raw = image.as_raw();
        let q = quality.value() as u8;

        let result = match format {
            OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut buf, q).write_image(
                raw,
                w,
                h,
                ExtendedColorType::Rgb8,
            ),
            OutputFormat::Png => {
                PngEncoder::new(&mut buf).write_image(raw, w, h, ExtendedColorType::Rgb8)
            }
            OutputFormat::WebP => {
                WebPEncoder::new_lossless(&mut buf).write_image(raw, w, h, ExtendedColorType::Rgb8)
            }
            OutputFormat::Tiff => {
                TiffEncoder::new(&mut buf).write_image(raw, w, h, ExtendedColorType::Rgb8)
            }
            OutputFormat::Bmp => {
                BmpEncoder::new(&mut buf).write_image(raw, w, h, ExtendedColorType::Rgb8)
            }
            OutputFormat::Avif => AvifEncoder::new_with_speed_quality(&mut buf, 6, q)
                .write_image(raw, w, h, ExtendedColorType::Rgb8),
        };

        result.map_err(|e| BackendError::Encode {
            format,
            message: e.to_string(),
        })?;
        Ok(buf.into_inner())
    }
}
