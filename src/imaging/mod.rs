//! Image processing in pure Rust, statically linked.
//!
//! | Stage | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, TIFF, WebP, BMP) |
//! | **Geometry** | pure integer math in [`calculations`] |
//! | **Resample** | `imageops::resize` with Lanczos3 |
//! | **Background blur** | `imageops::blur` on a downscaled copy |
//! | **Watermark** | `font8x8` glyphs / resized logo, alpha "over" |
//! | **Encode** | `image::codecs::*` (JPEG, PNG, WebP, TIFF, BMP, AVIF) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for canvas and placement math (unit testable)
//! - **Parameters**: Quality and size policy
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Compositor**: Resampling, backgrounds, and watermark blending

pub mod backend;
mod calculations;
pub mod compositor;
mod params;
pub mod rust_backend;
pub mod watermark;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    Geometry, GeometryError, MAX_CANVAS_PIXELS, Mapping, Padding, Rect, calculate_canvas_size,
    dimensions_for_short_edge, resolve, resolve_with_policy,
};
pub use compositor::{CompositeError, render};
pub use params::{Quality, SizePolicy};
pub use rust_backend::{RustBackend, is_supported_input, supported_input_extensions};
