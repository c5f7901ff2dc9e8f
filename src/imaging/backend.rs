//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the two operations that touch encoded
//! bytes: decode a file into pixels, and encode finished pixels into a
//! container format. Everything between (geometry, resampling, compositing)
//! is backend-agnostic and lives in [`compositor`](super::compositor).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the pure Rust
//! codecs of the `image` crate.

use super::params::Quality;
use crate::types::{ErrorKind, OutputFormat};
use image::{DynamicImage, RgbImage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("{format} encode failed: {message}")]
    Encode {
        format: OutputFormat,
        message: String,
    },
}

impl BackendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::Read { .. } | BackendError::Decode { .. } => ErrorKind::DecodeError,
            BackendError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            BackendError::Encode { .. } => ErrorKind::WriteError,
        }
    }
}

/// Pixel dimensions of a decoded or rendered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image codec backends.
///
/// `Sync` so one backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Read and decode an image file.
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Encode a finished canvas into `format`, returning the file bytes.
    fn encode(
        &self,
        image: &RgbImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}
