//! Watermark layers and alpha blending onto a finished canvas.
//!
//! Text is drawn with the embedded 8x8 bitmap font from `font8x8`, scaled by
//! nearest-neighbor to the requested size and blended glyph block by glyph
//! block, so only the part that lands on the canvas is ever touched. Image
//! watermarks are resized to a fraction of the canvas width. Either way
//! pixels are blended with straight-alpha "over" at `pixel_alpha * opacity`,
//! clipped to the canvas.

use super::compositor::CompositeError;
use crate::types::{Anchor, ImageWatermark, Placement, Rgb, TextWatermark, WatermarkSpec};
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage, RgbImage};

/// Glyph cell edge of the bitmap font, in font pixels.
const GLYPH: u32 = 8;

/// Largest accepted text watermark size, in pixels.
pub const MAX_FONT_SIZE: u32 = 4096;

/// Check a watermark's parameters without touching pixels.
pub fn validate(spec: &WatermarkSpec) -> Result<(), CompositeError> {
    let opacity = spec.opacity();
    if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
        return Err(CompositeError::Opacity(opacity));
    }
    match spec {
        WatermarkSpec::Text(t) => {
            if t.text.trim().is_empty() {
                return Err(CompositeError::EmptyText);
            }
            if !(1..=MAX_FONT_SIZE).contains(&t.font_size) {
                return Err(CompositeError::FontSize(t.font_size));
            }
        }
        WatermarkSpec::Image(i) => {
            if !i.scale.is_finite() || i.scale <= 0.0 || i.scale > 1.0 {
                return Err(CompositeError::Scale(i.scale));
            }
            if i.image.width() == 0 || i.image.height() == 0 {
                return Err(CompositeError::EmptyImage);
            }
        }
    }
    Ok(())
}

/// Blend `spec` onto `canvas` in place. Canvas dimensions never change.
pub fn apply(canvas: &mut RgbImage, spec: &WatermarkSpec) -> Result<(), CompositeError> {
    validate(spec)?;
    if spec.opacity() == 0.0 {
        return Ok(());
    }

    match spec {
        WatermarkSpec::Text(t) => {
            let size = text_size(&t.text, t.font_size);
            let (x, y) = position(canvas.dimensions(), size, t.placement);
            draw_text(canvas, t, x, y);
        }
        WatermarkSpec::Image(i) => {
            let layer = image_layer(i, canvas.width());
            let (x, y) = position(canvas.dimensions(), layer.dimensions(), i.placement);
            blend_over(canvas, &layer, x, y, i.opacity);
        }
    }
    Ok(())
}

/// Nearest-neighbor scale factor for the 8px font at `font_size`.
pub fn glyph_scale(font_size: u32) -> u32 {
    (font_size.saturating_add(GLYPH / 2) / GLYPH).max(1)
}

fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Pixel size of `text` at `font_size`. Glyphs are separated by one font
/// pixel.
pub fn text_size(text: &str, font_size: u32) -> (u32, u32) {
    let scale = glyph_scale(font_size);
    let cell = GLYPH.saturating_mul(scale);
    let count = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    let width = count
        .saturating_mul(cell)
        .saturating_add(count.saturating_sub(1).saturating_mul(scale));
    (width.max(1), cell)
}

/// Blend the glyphs of `t` with their top-left corner at `(x, y)`. Glyphs
/// wholly off the canvas are skipped.
fn draw_text(canvas: &mut RgbImage, t: &TextWatermark, x: i64, y: i64) {
    let scale = glyph_scale(t.font_size) as i64;
    let cell = GLYPH as i64 * scale;
    let cw = canvas.width() as i64;
    let Rgb([r, g, b]) = t.color;
    let px = Rgba([r, g, b, 255]);

    for (i, ch) in t.text.chars().enumerate() {
        let origin_x = x.saturating_add((i as i64).saturating_mul(cell + scale));
        if origin_x >= cw {
            break;
        }
        if origin_x.saturating_add(cell) <= 0 {
            continue;
        }
        for (row, bits) in glyph(ch).iter().enumerate() {
            let y0 = y.saturating_add(row as i64 * scale);
            for col in 0..GLYPH as i64 {
                // bit 0 is the leftmost pixel
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                fill_block(canvas, origin_x + col * scale, y0, scale, px, t.opacity);
            }
        }
    }
}

/// Blend a `size`-square block of `px` at `(x, y)`, clipped to the canvas.
fn fill_block(canvas: &mut RgbImage, x: i64, y: i64, size: i64, px: Rgba<u8>, opacity: f32) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let xs = x.max(0)..x.saturating_add(size).min(cw);
    let ys = y.max(0)..y.saturating_add(size).min(ch);
    for ty in ys {
        for tx in xs.clone() {
            blend_pixel(canvas.get_pixel_mut(tx as u32, ty as u32), px, opacity);
        }
    }
}

/// Resize the watermark image to `scale * canvas_width`, keeping its aspect.
fn image_layer(i: &ImageWatermark, canvas_width: u32) -> RgbaImage {
    let (lw, lh) = i.image.dimensions();
    let width = ((canvas_width as f32 * i.scale) as u32).max(1);
    let height = ((lh as f64 * width as f64 / lw as f64).round() as u32).max(1);
    if (width, height) == (lw, lh) {
        return i.image.clone();
    }
    imageops::resize(&i.image, width, height, FilterType::Lanczos3)
}

/// Distance kept between an anchored watermark and the canvas edges.
pub fn margin(canvas_width: u32) -> i64 {
    (canvas_width as i64 * 2 / 100).max(8)
}

/// Top-left corner of the layer on the canvas. May be negative or past the
/// far edge when the layer is larger than the room available.
pub fn position(canvas: (u32, u32), layer: (u32, u32), placement: Placement) -> (i64, i64) {
    let (cw, ch) = (canvas.0 as i64, canvas.1 as i64);
    let (lw, lh) = (layer.0 as i64, layer.1 as i64);
    let m = margin(canvas.0);

    match placement {
        Placement::At { x, y } => (x, y),
        Placement::Anchor(anchor) => match anchor {
            Anchor::TopLeft => (m, m),
            Anchor::TopRight => (cw - lw - m, m),
            Anchor::BottomLeft => (m, ch - lh - m),
            Anchor::BottomRight => (cw - lw - m, ch - lh - m),
            Anchor::Center => ((cw - lw) / 2, (ch - lh) / 2),
        },
    }
}

/// Straight-alpha "over" of `layer` at `(x, y)`, with each layer pixel's
/// alpha multiplied by `opacity`. Only the overlap with the canvas is visited.
pub fn blend_over(canvas: &mut RgbImage, layer: &RgbaImage, x: i64, y: i64, opacity: f32) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let xs = x.max(0)..x.saturating_add(layer.width() as i64).min(cw);
    let ys = y.max(0)..y.saturating_add(layer.height() as i64).min(ch);

    for ty in ys {
        for tx in xs.clone() {
            // tx - x and ty - y fall inside the layer by construction of the ranges
            let src = *layer.get_pixel((tx - x) as u32, (ty - y) as u32);
            blend_pixel(canvas.get_pixel_mut(tx as u32, ty as u32), src, opacity);
        }
    }
}

fn blend_pixel(dst: &mut image::Rgb<u8>, px: Rgba<u8>, opacity: f32) {
    let alpha = (px[3] as f32 * opacity).round().clamp(0.0, 255.0) as u32;
    if alpha == 0 {
        return;
    }
    let inv = 255 - alpha;
    for c in 0..3 {
        dst[c] = ((dst[c] as u32 * inv + px[c] as u32 * alpha + 127) / 255) as u8;
    }
}
