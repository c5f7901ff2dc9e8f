//! Geometry resolution: where a source image lands on an aspect-ratio canvas.
//!
//! All functions here are pure integer/float math, testable without any I/O
//! or pixels. [`resolve`] is the entry point; the compositor consumes the
//! [`Geometry`] it returns.
//!
//! ## Rounding
//!
//! - Canvas: the largest rectangle of the target ratio inside the source.
//!   The limiting axis keeps the source length exactly, the other axis is
//!   rounded to nearest.
//! - Fit: the limiting axis fills the canvas exactly, the other axis is
//!   floored so the fitted image never exceeds the canvas. Odd padding puts
//!   the extra pixel on the bottom/right.
//! - Fill: the crop window (in source pixels) keeps the full source length on
//!   the limiting axis and rounds the other to nearest, centered.

use super::params::SizePolicy;
use crate::types::{AspectRatio, ResizeMode};
use thiserror::Error;

/// Largest canvas, in pixels, the resolver hands to the compositor.
pub const MAX_CANVAS_PIXELS: u64 = 1 << 28;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("invalid source dimensions {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },
    #[error("invalid aspect ratio {width}:{height}")]
    InvalidRatio { width: u32, height: u32 },
    #[error("canvas {width}x{height} exceeds the {MAX_CANVAS_PIXELS} pixel limit")]
    CanvasTooLarge { width: u32, height: u32 },
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Uncovered canvas bands around a Fit placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Padding {
    pub fn is_zero(&self) -> bool {
        *self == Padding::default()
    }
}

/// How source pixels map onto the canvas, per mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mapping {
    /// `fitted` is in canvas coordinates.
    Fit { scale: f64, fitted: Rect },
    /// `crop` is in source coordinates; it is scaled to the full canvas.
    Fill { scale: f64, crop: Rect },
    Stretch { scale_x: f64, scale_y: f64 },
}

/// Resolved placement of one source on one canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub source: (u32, u32),
    pub canvas: (u32, u32),
    pub mapping: Mapping,
}

impl Geometry {
    pub fn mode(&self) -> ResizeMode {
        match self.mapping {
            Mapping::Fit { .. } => ResizeMode::Fit,
            Mapping::Fill { .. } => ResizeMode::Fill,
            Mapping::Stretch { .. } => ResizeMode::Stretch,
        }
    }

    /// Canvas area not covered by the source. Always zero outside Fit.
    pub fn padding(&self) -> Padding {
        match self.mapping {
            Mapping::Fit { fitted, .. } => Padding {
                top: fitted.y,
                bottom: self.canvas.1 - fitted.bottom(),
                left: fitted.x,
                right: self.canvas.0 - fitted.right(),
            },
            _ => Padding::default(),
        }
    }
}

/// Resolve geometry with the default never-upscale policy.
///
/// # Examples
/// ```
/// # use framefit::imaging::{resolve, Mapping};
/// # use framefit::types::{AspectRatio, ResizeMode};
/// let g = resolve(1920, 1080, AspectRatio::SQUARE, ResizeMode::Fit).unwrap();
/// assert_eq!(g.canvas, (1080, 1080));
/// let padding = g.padding();
/// assert_eq!((padding.top, padding.bottom), (236, 237));
/// ```
pub fn resolve(
    src_w: u32,
    src_h: u32,
    ratio: AspectRatio,
    mode: ResizeMode,
) -> Result<Geometry, GeometryError> {
    resolve_with_policy(src_w, src_h, ratio, mode, SizePolicy::NeverUpscale)
}

pub fn resolve_with_policy(
    src_w: u32,
    src_h: u32,
    ratio: AspectRatio,
    mode: ResizeMode,
    policy: SizePolicy,
) -> Result<Geometry, GeometryError> {
    if src_w == 0 || src_h == 0 {
        return Err(GeometryError::InvalidDimension {
            width: src_w,
            height: src_h,
        });
    }
    if ratio.width == 0 || ratio.height == 0 {
        return Err(GeometryError::InvalidRatio {
            width: ratio.width,
            height: ratio.height,
        });
    }

    let source = (src_w, src_h);
    let aspect = (ratio.width, ratio.height);
    let canvas = calculate_canvas_size(source, aspect, policy);
    if canvas.0 as u64 * canvas.1 as u64 > MAX_CANVAS_PIXELS {
        return Err(GeometryError::CanvasTooLarge {
            width: canvas.0,
            height: canvas.1,
        });
    }
    let mapping = match mode {
        ResizeMode::Fit => fit_mapping(source, canvas),
        ResizeMode::Fill => fill_mapping(source, canvas),
        ResizeMode::Stretch => Mapping::Stretch {
            scale_x: canvas.0 as f64 / src_w as f64,
            scale_y: canvas.1 as f64 / src_h as f64,
        },
    };

    Ok(Geometry {
        source,
        canvas,
        mapping,
    })
}

/// Canvas dimensions for a source and ratio under a size policy.
pub fn calculate_canvas_size(source: (u32, u32), aspect: (u32, u32), policy: SizePolicy) -> (u32, u32) {
    let inscribed = largest_inscribed(source, aspect);
    match policy {
        SizePolicy::NeverUpscale => inscribed,
        SizePolicy::MinShortEdge(min) if inscribed.0.min(inscribed.1) < min => {
            dimensions_for_short_edge(aspect, min)
        }
        SizePolicy::MinShortEdge(_) => inscribed,
    }
}

/// Largest rectangle of `aspect` that fits inside `source`.
fn largest_inscribed(source: (u32, u32), aspect: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = (source.0 as u64, source.1 as u64);
    let (aw, ah) = (aspect.0 as u64, aspect.1 as u64);

    if sw * ah <= sh * aw {
        // Width-limited
        (source.0, round_div(sw * ah, aw).clamp(1, sh) as u32)
    } else {
        (round_div(sh * aw, ah).clamp(1, sw) as u32, source.1)
    }
}

/// Dimensions of `aspect` with the given short edge.
///
/// ```
/// # use framefit::imaging::dimensions_for_short_edge;
/// assert_eq!(dimensions_for_short_edge((4, 5), 400), (400, 500));
/// assert_eq!(dimensions_for_short_edge((16, 9), 180), (320, 180));
/// ```
pub fn dimensions_for_short_edge(aspect: (u32, u32), short_edge: u32) -> (u32, u32) {
    let (aw, ah) = (aspect.0 as u64, aspect.1 as u64);
    let short = short_edge.max(1) as u64;

    if aw <= ah {
        // Portrait or square: width is the short edge
        (short as u32, clamp_u32(round_div(short * ah, aw)))
    } else {
        (clamp_u32(round_div(short * aw, ah)), short as u32)
    }
}

fn fit_mapping(source: (u32, u32), canvas: (u32, u32)) -> Mapping {
    let (sw, sh) = (source.0 as u64, source.1 as u64);
    let (cw, ch) = (canvas.0 as u64, canvas.1 as u64);
    let scale = (cw as f64 / sw as f64).min(ch as f64 / sh as f64);

    let (fw, fh) = if sw * ch >= sh * cw {
        // Source relatively wider: width fills the canvas
        (cw, (sh * cw / sw).clamp(1, ch))
    } else {
        ((sw * ch / sh).clamp(1, cw), ch)
    };

    Mapping::Fit {
        scale,
        fitted: Rect {
            x: ((cw - fw) / 2) as u32,
            y: ((ch - fh) / 2) as u32,
            width: fw as u32,
            height: fh as u32,
        },
    }
}

fn fill_mapping(source: (u32, u32), canvas: (u32, u32)) -> Mapping {
    let (sw, sh) = (source.0 as u64, source.1 as u64);
    let (cw, ch) = (canvas.0 as u64, canvas.1 as u64);
    let scale = (cw as f64 / sw as f64).max(ch as f64 / sh as f64);

    let crop = if sw * ch > sh * cw {
        // Source relatively wider: trim left and right
        let crop_w = round_div(sh * cw, ch).clamp(1, sw);
        Rect {
            x: ((sw - crop_w) / 2) as u32,
            y: 0,
            width: crop_w as u32,
            height: source.1,
        }
    } else {
        let crop_h = round_div(sw * ch, cw).clamp(1, sh);
        Rect {
            x: 0,
            y: ((sh - crop_h) / 2) as u32,
            width: source.0,
            height: crop_h as u32,
        }
    };

    Mapping::Fill { scale, crop }
}

/// `n / d` rounded half up.
fn round_div(n: u64, d: u64) -> u64 {
    (2 * n + d) / (2 * d)
}

fn clamp_u32(v: u64) -> u32 {
    v.min(u32::MAX as u64) as u32
}
