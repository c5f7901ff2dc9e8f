//! # framefit
//!
//! Batch photo resizer for fixed aspect ratios. Every input is mapped onto a
//! canvas of the chosen ratio (1:1, 4:5, 9:16, ...) in one of three modes:
//!
//! - **fit**: the whole photo is visible, padded with a solid or blurred backdrop
//! - **fill**: the canvas is covered, the overflow is cropped from the center
//! - **stretch**: the photo is scaled non-uniformly to the canvas
//!
//! An optional text or image watermark is composited on top before encoding.
//!
//! # Pipeline
//!
//! ```text
//! inputs ─► plan output names ─► decode ─► resolve geometry ─► render ─► encode ─► atomic write
//!                                          (pure, integer)     (resample, backdrop, watermark)
//! ```
//!
//! Geometry is a pure function of the source size, ratio and mode, so it is
//! tested without touching pixels. Pixel work sits behind the
//! [`imaging::ImageBackend`] trait for encode/decode, which lets the batch
//! runner be tested with a mock that records operations.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Geometry resolver, compositor, watermark, image backend |
//! | [`batch`] | Runs one job over many inputs: parallel, isolated failures, atomic writes |
//! | [`naming`] | Output filename patterns and collision handling |
//! | [`inputs`] | Expands files and directories into an ordered input list |
//! | [`config`] | Layered `config.toml` loading and validation into a [`types::JobConfig`] |
//! | [`types`] | Ratios, modes, colors, watermark and output specs, error kinds |
//! | [`output`] | CLI progress and report formatting |

pub mod batch;
pub mod config;
pub mod imaging;
pub mod inputs;
pub mod naming;
pub mod output;
pub mod types;
