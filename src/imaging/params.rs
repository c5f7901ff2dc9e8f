//! Parameter types for image operations.
//!
//! These describe *what* to produce, not *how*. They sit between the
//! geometry resolver in [`calculations`](super::calculations) and the pixel
//! work in [`compositor`](super::compositor) and the
//! [`backend`](super::backend).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 95). Clamped on construction.
//! - [`SizePolicy`]: Whether the canvas may grow beyond the source.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Canvas sizing policy.
///
/// The canvas is normally the largest rectangle of the target ratio that fits
/// inside the source, so nothing is ever upscaled. `MinShortEdge` raises the
/// canvas so its shorter edge is at least the given size, upscaling small
/// sources to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizePolicy {
    #[default]
    NeverUpscale,
    MinShortEdge(u32),
}
