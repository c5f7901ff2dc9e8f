//! Shared types used by the geometry, rendering, and batch stages.
//!
//! The value types here ([`AspectRatio`], [`Rgb`], [`OutputFormat`], ...) are
//! also the vocabulary of `config.toml`, so each of them round-trips through
//! a plain string in serde (`"4:5"`, `"#ffffff"`, `"jpeg"`). [`JobConfig`]
//! is the typed aggregate handed to every pipeline invocation.

use crate::imaging::{Quality, SizePolicy};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid aspect ratio '{0}': expected W:H with positive integers")]
    AspectRatio(String),
    #[error("invalid color '{0}': expected #RRGGBB or #RGB")]
    Color(String),
    #[error("unsupported output format '{0}'")]
    UnsupportedFormat(String),
}

/// Failure categories reported per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidDimension,
    InvalidRatio,
    DecodeError,
    UnsupportedFormat,
    CompositeError,
    WriteError,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidDimension => "invalid dimension",
            ErrorKind::InvalidRatio => "invalid ratio",
            ErrorKind::DecodeError => "decode error",
            ErrorKind::UnsupportedFormat => "unsupported format",
            ErrorKind::CompositeError => "composite error",
            ErrorKind::WriteError => "write error",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Aspect ratio
// =============================================================================

/// Target canvas aspect ratio as `width:height`.
///
/// Parsing rejects zero components; the fields stay public so the geometry
/// resolver re-checks them and reports `InvalidRatio` for hand-built values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const SQUARE: Self = Self::new(1, 1);
    pub const PORTRAIT: Self = Self::new(4, 5);
    pub const STORY: Self = Self::new(9, 16);
    pub const LANDSCAPE: Self = Self::new(16, 9);
    pub const CLASSIC: Self = Self::new(3, 2);

    /// Social-media presets offered by default.
    pub const PRESETS: [Self; 5] = [
        Self::SQUARE,
        Self::PORTRAIT,
        Self::STORY,
        Self::LANDSCAPE,
        Self::CLASSIC,
    ];

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Filename-safe form used by the `{ratio}` naming token, e.g. `4x5`.
    pub fn slug(self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::SQUARE
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = ParseError;

    /// Accepts `W:H` or `WxH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError::AspectRatio(s.to_string());
        let (w, h) = s.trim().split_once([':', 'x']).ok_or_else(err)?;
        let width: u32 = w.trim().parse().map_err(|_| err())?;
        let height: u32 = h.trim().parse().map_err(|_| err())?;
        if width == 0 || height == 0 {
            return Err(err());
        }
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.to_string()
    }
}

// =============================================================================
// Modes and placement
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Whole source visible, padded to the canvas ratio.
    #[default]
    Fit,
    /// Canvas fully covered, centered crop of the overflow.
    Fill,
    /// Independent horizontal and vertical scale.
    Stretch,
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResizeMode::Fit => "fit",
            ResizeMode::Fill => "fill",
            ResizeMode::Stretch => "stretch",
        })
    }
}

/// Fixed watermark anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

/// Where a watermark goes: an anchor with margin, or an explicit top-left
/// coordinate on the canvas (may be negative or run off the edge; the
/// overflow is clipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Anchor(Anchor),
    At { x: i64, y: i64 },
}

impl Default for Placement {
    fn default() -> Self {
        Placement::Anchor(Anchor::default())
    }
}

// =============================================================================
// Color
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Self = Self([0, 0, 0]);
    pub const WHITE: Self = Self([255, 255, 255]);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for Rgb {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError::Color(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        // from_str_radix alone would also take a leading '+'
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| err());
        match hex.len() {
            6 => Ok(Self([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            ])),
            3 => {
                // #abc is shorthand for #aabbcc
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Self([expand(0)?, expand(1)?, expand(2)?]))
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

// =============================================================================
// Background and watermark
// =============================================================================

/// Fill for the padding Fit mode leaves around the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundSpec {
    SolidColor(Rgb),
    /// Gaussian blur with `radius` as sigma, over the whole source stretched
    /// to the canvas.
    BlurredSource { radius: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextWatermark {
    pub text: String,
    /// Glyph height in pixels. Rounded to a multiple of the 8px bitmap font.
    pub font_size: u32,
    pub color: Rgb,
    pub placement: Placement,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageWatermark {
    pub image: RgbaImage,
    pub placement: Placement,
    pub opacity: f32,
    /// Watermark width as a fraction of the canvas width.
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkSpec {
    Text(TextWatermark),
    Image(ImageWatermark),
}

impl WatermarkSpec {
    pub fn opacity(&self) -> f32 {
        match self {
            WatermarkSpec::Text(t) => t.opacity,
            WatermarkSpec::Image(i) => i.opacity,
        }
    }

    pub fn placement(&self) -> Placement {
        match self {
            WatermarkSpec::Text(t) => t.placement,
            WatermarkSpec::Image(i) => i.placement,
        }
    }
}

// =============================================================================
// Output
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    /// Lossless; quality is ignored.
    WebP,
    Tiff,
    Bmp,
    Avif,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Avif => "avif",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            other => other.extension(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            "bmp" => Ok(OutputFormat::Bmp),
            "avif" => Ok(OutputFormat::Avif),
            _ => Err(ParseError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(value: OutputFormat) -> Self {
        value.name().to_string()
    }
}

/// What to do when a planned output name already exists on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Append `-1`, `-2`, ... until the name is free.
    #[default]
    AutoRename,
    Overwrite,
    /// Leave the existing file and report the item as skipped.
    Skip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub format: OutputFormat,
    pub quality: Quality,
    /// File stem pattern; see [`naming`](crate::naming) for tokens.
    pub pattern: String,
    pub collision: CollisionPolicy,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: Quality::new(95),
            pattern: crate::naming::DEFAULT_PATTERN.to_string(),
            collision: CollisionPolicy::AutoRename,
        }
    }
}

/// Everything one batch run needs, read-only for the run's duration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobConfig {
    pub aspect_ratio: AspectRatio,
    pub mode: ResizeMode,
    pub size_policy: SizePolicy,
    /// Fit-mode padding fill. `None` pads with black.
    pub background: Option<BackgroundSpec>,
    pub watermark: Option<WatermarkSpec>,
    pub output: OutputSpec,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_parses_colon_and_x() {
        assert_eq!("4:5".parse::<AspectRatio>().unwrap(), AspectRatio::PORTRAIT);
        assert_eq!("16x9".parse::<AspectRatio>().unwrap(), AspectRatio::LANDSCAPE);
        assert_eq!(" 3 : 2 ".parse::<AspectRatio>().unwrap(), AspectRatio::CLASSIC);
    }

    #[test]
    fn aspect_ratio_rejects_zero_and_garbage() {
        assert!("0:5".parse::<AspectRatio>().is_err());
        assert!("4:0".parse::<AspectRatio>().is_err());
        assert!("square".parse::<AspectRatio>().is_err());
        assert!("4:-5".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn aspect_ratio_display_and_slug() {
        assert_eq!(AspectRatio::STORY.to_string(), "9:16");
        assert_eq!(AspectRatio::STORY.slug(), "9x16");
    }

    #[test]
    fn presets_match_social_ratios() {
        let names: Vec<String> = AspectRatio::PRESETS.iter().map(|r| r.to_string()).collect();
        assert_eq!(names, vec!["1:1", "4:5", "9:16", "16:9", "3:2"]);
    }

    #[test]
    fn rgb_parses_long_and_short_hex() {
        assert_eq!("#ff8000".parse::<Rgb>().unwrap(), Rgb([255, 128, 0]));
        assert_eq!("FF8000".parse::<Rgb>().unwrap(), Rgb([255, 128, 0]));
        assert_eq!("#fff".parse::<Rgb>().unwrap(), Rgb::WHITE);
    }

    #[test]
    fn rgb_rejects_bad_input() {
        assert!("#ff80".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
        assert!("white".parse::<Rgb>().is_err());
        assert!("#+f+f+f".parse::<Rgb>().is_err());
        assert!("+ff".parse::<Rgb>().is_err());
    }

    #[test]
    fn rgb_display_is_lowercase_hex() {
        assert_eq!(Rgb([171, 205, 239]).to_string(), "#abcdef");
    }

    #[test]
    fn output_format_parses_aliases() {
        assert_eq!("jpg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("JPEG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!(".tif".parse::<OutputFormat>().unwrap(), OutputFormat::Tiff);
        assert_eq!("webp".parse::<OutputFormat>().unwrap(), OutputFormat::WebP);
    }

    #[test]
    fn output_format_rejects_unknown() {
        assert_eq!(
            "gif".parse::<OutputFormat>(),
            Err(ParseError::UnsupportedFormat("gif".into()))
        );
    }

    #[test]
    fn output_format_extension_vs_name() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Jpeg.name(), "jpeg");
        assert_eq!(OutputFormat::Png.name(), "png");
    }

    #[test]
    fn serde_uses_string_forms() {
        let json = serde_json::to_string(&AspectRatio::PORTRAIT).unwrap();
        assert_eq!(json, "\"4:5\"");
        let color: Rgb = serde_json::from_str("\"#000000\"").unwrap();
        assert_eq!(color, Rgb::BLACK);
        let mode: ResizeMode = serde_json::from_str("\"stretch\"").unwrap();
        assert_eq!(mode, ResizeMode::Stretch);
        let anchor: Anchor = serde_json::from_str("\"top-left\"").unwrap();
        assert_eq!(anchor, Anchor::TopLeft);
        let policy: CollisionPolicy = serde_json::from_str("\"auto-rename\"").unwrap();
        assert_eq!(policy, CollisionPolicy::AutoRename);
    }

    #[test]
    fn job_config_defaults() {
        let job = JobConfig::default();
        assert_eq!(job.aspect_ratio, AspectRatio::SQUARE);
        assert_eq!(job.mode, ResizeMode::Fit);
        assert_eq!(job.size_policy, SizePolicy::NeverUpscale);
        assert_eq!(job.output.format, OutputFormat::Jpeg);
        assert_eq!(job.output.quality.value(), 95);
        assert_eq!(job.output.collision, CollisionPolicy::AutoRename);
        assert!(job.watermark.is_none());
    }
}
