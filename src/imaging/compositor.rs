//! Pixel work: resample a source onto its canvas and composite the result.
//!
//! [`render`] takes a decoded source plus the [`Geometry`] resolved for it
//! and produces the final RGB canvas:
//!
//! | Mode | Steps |
//! |---|---|
//! | Fit | background (color or blurred source) → scaled source at the fitted rect |
//! | Fill | crop window from the source → scale to canvas |
//! | Stretch | scale whole source to canvas |
//!
//! A watermark, if any, is blended last. Resampling is Lanczos3 throughout,
//! and a resize to the same dimensions is a plain copy so an already-conforming
//! source passes through unchanged.

use super::calculations::{Geometry, Mapping};
use super::watermark;
use crate::types::{BackgroundSpec, ErrorKind, Rgb, WatermarkSpec};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use thiserror::Error;

/// Longest edge of the working image the background blur runs on.
const BLUR_WORK_EDGE: u32 = 512;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositeError {
    #[error("watermark opacity {0} is outside 0..=1")]
    Opacity(f32),
    #[error("watermark scale {0} is outside (0, 1]")]
    Scale(f32),
    #[error("watermark font size {0} is outside 1..=4096")]
    FontSize(u32),
    #[error("watermark text is empty")]
    EmptyText,
    #[error("watermark image has no pixels")]
    EmptyImage,
    #[error("blur radius {0} must be finite and non-negative")]
    BlurRadius(f32),
    #[error("geometry was resolved for {expected:?} but the source is {actual:?}")]
    SourceMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

impl CompositeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompositeError::SourceMismatch { .. } => ErrorKind::InvalidDimension,
            _ => ErrorKind::CompositeError,
        }
    }
}

/// Render `source` onto the canvas described by `geometry`.
///
/// `background` only matters in Fit mode; `None` pads with black. The
/// output always has exactly `geometry.canvas` dimensions.
pub fn render(
    source: &DynamicImage,
    geometry: &Geometry,
    background: Option<&BackgroundSpec>,
    watermark: Option<&WatermarkSpec>,
) -> Result<RgbImage, CompositeError> {
    let actual = (source.width(), source.height());
    if actual != geometry.source {
        return Err(CompositeError::SourceMismatch {
            expected: geometry.source,
            actual,
        });
    }
    if let Some(&BackgroundSpec::BlurredSource { radius }) = background {
        if !radius.is_finite() || radius < 0.0 {
            return Err(CompositeError::BlurRadius(radius));
        }
    }
    if let Some(spec) = watermark {
        watermark::validate(spec)?;
    }

    let src = source.to_rgb8();
    let (cw, ch) = geometry.canvas;

    let mut canvas = match geometry.mapping {
        Mapping::Fit { fitted, .. } => {
            let mut base = match background {
                Some(BackgroundSpec::BlurredSource { radius }) => {
                    blurred_backdrop(&src, geometry.canvas, *radius)
                }
                Some(BackgroundSpec::SolidColor(color)) => solid(geometry.canvas, *color),
                None => solid(geometry.canvas, Rgb::BLACK),
            };
            let scaled = resample(&src, fitted.width, fitted.height);
            imageops::replace(&mut base, &scaled, fitted.x as i64, fitted.y as i64);
            base
        }
        Mapping::Fill { crop, .. } => {
            let window = if (crop.width, crop.height) == actual {
                src
            } else {
                imageops::crop_imm(&src, crop.x, crop.y, crop.width, crop.height).to_image()
            };
            resample(&window, cw, ch)
        }
        Mapping::Stretch { .. } => resample(&src, cw, ch),
    };

    if let Some(spec) = watermark {
        watermark::apply(&mut canvas, spec)?;
    }
    Ok(canvas)
}

fn solid(size: (u32, u32), color: Rgb) -> RgbImage {
    RgbImage::from_pixel(size.0, size.1, image::Rgb(color.0))
}

/// Lanczos3 resize; same-size requests return a copy.
pub fn resample(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

/// Whole source stretched to the canvas and blurred with sigma `radius`.
///
/// The blur runs on a copy whose long edge is at most [`BLUR_WORK_EDGE`],
/// with sigma scaled to match, then is resampled up to the canvas. Sigma is
/// capped at the working copy's long edge.
fn blurred_backdrop(src: &RgbImage, canvas: (u32, u32), radius: f32) -> RgbImage {
    if radius == 0.0 {
        return resample(src, canvas.0, canvas.1);
    }
    let shrink = (BLUR_WORK_EDGE as f32 / canvas.0.max(canvas.1) as f32).min(1.0);
    let work_w = ((canvas.0 as f32 * shrink).round() as u32).max(1);
    let work_h = ((canvas.1 as f32 * shrink).round() as u32).max(1);
    let sigma = (radius * shrink).clamp(0.1, work_w.max(work_h) as f32);

    let small = resample(src, work_w, work_h);
    let blurred = imageops::blur(&small, sigma);
    resample(&blurred, canvas.0, canvas.1)
}
