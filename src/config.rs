//! Job configuration: loading, merging, validating `config.toml`.
//!
//! Configuration is layered: stock defaults are overridden by an optional
//! config file, which is overridden by command-line flags. Each layer is a
//! sparse TOML table merged key-by-key with [`merge_toml`]; the merged table
//! is deserialized into [`Settings`] and validated once.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resize]
//! aspect_ratio = "1:1"      # W:H, e.g. "4:5", "9:16", "16:9", "3:2"
//! mode = "fit"              # fit | fill | stretch
//! # min_short_edge = 1080   # upscale canvases smaller than this
//!
//! [background]              # Fit-mode padding
//! kind = "color"            # color | blur | none
//! color = "#000000"
//! blur_radius = 25.0
//!
//! [watermark]
//! kind = "none"             # none | text | image
//! text = ""
//! font_size = 32
//! color = "#ffffff"
//! position = "bottom-right" # top-left | top-right | bottom-left | bottom-right | center
//! # x = 10                  # explicit top-left corner (both x and y)
//! # y = 10
//! opacity = 0.8
//! # image = "logo.png"      # relative to the config file
//! scale = 0.15              # image width as a fraction of the canvas width
//!
//! [output]
//! format = "jpeg"           # jpeg | png | webp | tiff | bmp | avif
//! quality = 95
//! pattern = "{stem}_resized"
//! collision = "auto-rename" # auto-rename | overwrite | skip
//!
//! [processing]
//! # max_threads = 4         # omit for auto = CPU cores
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{BackendError, ImageBackend, Quality, SizePolicy, watermark};
use crate::naming::{DEFAULT_PATTERN, validate_pattern};
use crate::types::{
    Anchor, AspectRatio, BackgroundSpec, CollisionPolicy, ImageWatermark, JobConfig,
    OutputFormat, OutputSpec, Placement, ResizeMode, Rgb, TextWatermark, WatermarkSpec,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest accepted `resize.min_short_edge`; the JPEG and WebP dimension limit.
pub const MAX_SHORT_EDGE: u32 = 65_535;

/// Largest accepted `background.blur_radius`, in canvas pixels.
pub const MAX_BLUR_RADIUS: f32 = 1000.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("cannot load watermark image: {0}")]
    WatermarkImage(#[source] BackendError),
}

/// Settings loaded from `config.toml` and flags.
///
/// All fields have defaults; config files need only the values they change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub resize: ResizeSettings,
    pub background: BackgroundSettings,
    pub watermark: WatermarkSettings,
    pub output: OutputSettings,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeSettings {
    pub aspect_ratio: AspectRatio,
    pub mode: ResizeMode,
    /// Upscale the canvas so its short edge reaches this many pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_short_edge: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    #[default]
    Color,
    Blur,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundSettings {
    pub kind: BackgroundKind,
    pub color: Rgb,
    pub blur_radius: f32,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            kind: BackgroundKind::Color,
            color: Rgb::BLACK,
            blur_radius: 25.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkKind {
    #[default]
    None,
    Text,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkSettings {
    pub kind: WatermarkKind,
    pub text: String,
    pub font_size: u32,
    pub color: Rgb,
    pub position: Anchor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
    pub opacity: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    pub scale: f32,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            kind: WatermarkKind::None,
            text: String::new(),
            font_size: 32,
            color: Rgb::WHITE,
            position: Anchor::BottomRight,
            x: None,
            y: None,
            opacity: 0.8,
            image: None,
            scale: 0.15,
        }
    }
}

impl WatermarkSettings {
    fn placement(&self) -> Placement {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Placement::At { x, y },
            _ => Placement::Anchor(self.position),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    pub format: OutputFormat,
    /// Lossy encoding quality (1-100). Ignored by lossless formats.
    pub quality: u32,
    pub pattern: String,
    pub collision: CollisionPolicy,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 95,
            pattern: DEFAULT_PATTERN.to_string(),
            collision: CollisionPolicy::AutoRename,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_threads
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

impl Settings {
    /// Validate values that deserialization alone cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if let Some(edge) = self.resize.min_short_edge {
            if !(1..=MAX_SHORT_EDGE).contains(&edge) {
                return invalid("resize.min_short_edge must be 1-65535");
            }
        }
        let radius = self.background.blur_radius;
        if !radius.is_finite() || !(0.0..=MAX_BLUR_RADIUS).contains(&radius) {
            return invalid("background.blur_radius must be between 0 and 1000");
        }
        if !(1..=100).contains(&self.output.quality) {
            return invalid("output.quality must be 1-100");
        }
        validate_pattern(&self.output.pattern)
            .map_err(|e| ConfigError::Validation(format!("output.pattern: {e}")))?;
        if self.processing.max_threads == Some(0) {
            return invalid("processing.max_threads must be positive");
        }

        let wm = &self.watermark;
        if wm.x.is_some() != wm.y.is_some() {
            return invalid("watermark.x and watermark.y must be given together");
        }
        match wm.kind {
            WatermarkKind::None => {}
            WatermarkKind::Text => {
                watermark::validate(&WatermarkSpec::Text(self.text_watermark()))
                    .map_err(|e| ConfigError::Validation(format!("watermark: {e}")))?;
            }
            WatermarkKind::Image => {
                if wm.image.is_none() {
                    return invalid("watermark.image is required when kind = \"image\"");
                }
                // Pixels are checked once loaded; scale and opacity can be checked now
                if !wm.opacity.is_finite() || !(0.0..=1.0).contains(&wm.opacity) {
                    return invalid("watermark.opacity must be between 0 and 1");
                }
                if !wm.scale.is_finite() || wm.scale <= 0.0 || wm.scale > 1.0 {
                    return invalid("watermark.scale must be in (0, 1]");
                }
            }
        }
        Ok(())
    }

    fn text_watermark(&self) -> TextWatermark {
        let wm = &self.watermark;
        TextWatermark {
            text: wm.text.clone(),
            font_size: wm.font_size,
            color: wm.color,
            placement: wm.placement(),
            opacity: wm.opacity,
        }
    }

    /// Build the typed job. A watermark image is decoded here, once, with
    /// relative paths resolved against `base_dir`.
    pub fn to_job(
        &self,
        backend: &impl ImageBackend,
        base_dir: &Path,
    ) -> Result<JobConfig, ConfigError> {
        self.validate()?;

        let background = match self.background.kind {
            BackgroundKind::Color => Some(BackgroundSpec::SolidColor(self.background.color)),
            BackgroundKind::Blur => Some(BackgroundSpec::BlurredSource {
                radius: self.background.blur_radius,
            }),
            BackgroundKind::None => None,
        };

        let wm = &self.watermark;
        let watermark = match (wm.kind, &wm.image) {
            (WatermarkKind::None, _) => None,
            (WatermarkKind::Text, _) => Some(WatermarkSpec::Text(self.text_watermark())),
            (WatermarkKind::Image, Some(path)) => {
                let image = backend
                    .decode(&base_dir.join(path))
                    .map_err(ConfigError::WatermarkImage)?
                    .to_rgba8();
                let spec = WatermarkSpec::Image(ImageWatermark {
                    image,
                    placement: wm.placement(),
                    opacity: wm.opacity,
                    scale: wm.scale,
                });
                watermark::validate(&spec)
                    .map_err(|e| ConfigError::Validation(format!("watermark: {e}")))?;
                Some(spec)
            }
            (WatermarkKind::Image, None) => {
                return Err(ConfigError::Validation(
                    "watermark.image is required when kind = \"image\"".into(),
                ));
            }
        };

        Ok(JobConfig {
            aspect_ratio: self.resize.aspect_ratio,
            mode: self.resize.mode,
            size_policy: self
                .resize
                .min_short_edge
                .map_or(SizePolicy::NeverUpscale, SizePolicy::MinShortEdge),
            background,
            watermark,
            output: OutputSpec {
                format: self.output.format,
                quality: Quality::new(self.output.quality),
                pattern: self.output.pattern.clone(),
                collision: self.output.collision,
            },
        })
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Settings::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Merge overlays in order onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<Settings, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let settings: Settings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings: stock defaults ← `config_file` (if any) ← `cli_overrides`.
pub fn load_config(
    config_file: Option<&Path>,
    cli_overrides: Option<toml::Value>,
) -> Result<Settings, ConfigError> {
    let file_layer = config_file.map(load_raw_config).transpose()?;
    resolve_config(
        stock_defaults_value()?,
        file_layer.into_iter().chain(cli_overrides),
    )
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# framefit configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override values from this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Canvas
# ---------------------------------------------------------------------------
[resize]
# Target aspect ratio as "W:H".
# Social presets: "1:1" square, "4:5" portrait, "9:16" story,
# "16:9" landscape, "3:2" classic. Any positive W:H works.
aspect_ratio = "1:1"

# fit     - whole photo visible, padded to the ratio
# fill    - canvas fully covered, overflow cropped from the center
# stretch - photo distorted to the ratio
mode = "fit"

# By default the canvas is the largest W:H rectangle inside the photo, so
# nothing is upscaled. Set this to grow smaller canvases to a minimum
# short edge (e.g. 1080 for Instagram).
# min_short_edge = 1080

# ---------------------------------------------------------------------------
# Padding background (fit mode only)
# ---------------------------------------------------------------------------
[background]
# color - solid fill
# blur  - the photo itself, stretched and blurred
# none  - black
kind = "color"
color = "#000000"
# Gaussian blur sigma in canvas pixels (blur only).
blur_radius = 25.0

# ---------------------------------------------------------------------------
# Watermark
# ---------------------------------------------------------------------------
[watermark]
# none | text | image
kind = "none"

# Text watermark.
text = ""
font_size = 32
color = "#ffffff"

# Anchor: top-left, top-right, bottom-left, bottom-right, center.
# Anchored watermarks keep a margin of 2% of the canvas width (min 8px).
position = "bottom-right"
# Explicit top-left corner in canvas pixels; overrides position.
# x = 10
# y = 10

# 0.0 = invisible, 1.0 = opaque.
opacity = 0.8

# Image watermark, relative to this file. Transparency is respected.
# image = "logo.png"
# Watermark width as a fraction of the canvas width.
scale = 0.15

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# jpeg | png | webp | tiff | bmp | avif
format = "jpeg"

# Lossy encoding quality (1 = worst, 100 = best). WebP output is lossless.
quality = 95

# File name without extension. Tokens: {stem}, {ratio} (e.g. 4x5), {mode}.
pattern = "{stem}_resized"

# When the output name exists:
# auto-rename - append -1, -2, ...
# overwrite   - replace it (never an input file)
# skip        - leave it and report the photo as skipped
collision = "auto-rename"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use tempfile::TempDir;

    fn parse(toml: &str) -> Result<Settings, ConfigError> {
        resolve_config(
            stock_defaults_value().unwrap(),
            Some(toml::from_str(toml).unwrap()),
        )
    }

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.resize.aspect_ratio, AspectRatio::SQUARE);
        assert_eq!(s.resize.mode, ResizeMode::Fit);
        assert_eq!(s.background.color, Rgb::BLACK);
        assert_eq!(s.watermark.opacity, 0.8);
        assert_eq!(s.watermark.position, Anchor::BottomRight);
        assert_eq!(s.output.quality, 95);
        assert_eq!(s.output.pattern, "{stem}_resized");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let settings: Settings = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn stock_defaults_round_trip() {
        let settings: Settings = stock_defaults_value().unwrap().try_into().unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn parse_partial_config() {
        let s = parse(
            r#"
[resize]
aspect_ratio = "4:5"
mode = "fill"

[output]
format = "png"
"#,
        )
        .unwrap();
        assert_eq!(s.resize.aspect_ratio, AspectRatio::PORTRAIT);
        assert_eq!(s.resize.mode, ResizeMode::Fill);
        assert_eq!(s.output.format, OutputFormat::Png);
        // Unspecified defaults preserved
        assert_eq!(s.output.quality, 95);
        assert_eq!(s.background.kind, BackgroundKind::Color);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            parse("[resize]\naspect = \"1:1\"\n"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(parse("[colours]\n"), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse("[resize]\naspect_ratio = \"0:1\"\n").is_err());
        assert!(parse("[resize]\nmode = \"squash\"\n").is_err());
        assert!(parse("[output]\nformat = \"gif\"\n").is_err());
        assert!(parse("[background]\ncolor = \"red\"\n").is_err());
    }

    #[test]
    fn validation_catches_ranges() {
        let cases = [
            "[output]\nquality = 0\n",
            "[output]\nquality = 101\n",
            "[output]\npattern = \"resized\"\n",
            "[resize]\nmin_short_edge = 0\n",
            "[resize]\nmin_short_edge = 3000000000\n",
            "[background]\nblur_radius = -2.0\n",
            "[background]\nblur_radius = 1.0e9\n",
            "[processing]\nmax_threads = 0\n",
            "[watermark]\nkind = \"text\"\ntext = \"\"\n",
            "[watermark]\nkind = \"text\"\ntext = \"hi\"\nopacity = 1.5\n",
            "[watermark]\nkind = \"text\"\ntext = \"hi\"\nfont_size = 0\n",
            "[watermark]\nkind = \"text\"\ntext = \"hi\"\nfont_size = 4000000000\n",
            "[watermark]\nkind = \"image\"\n",
            "[watermark]\nkind = \"image\"\nimage = \"logo.png\"\nscale = 0.0\n",
            "[watermark]\nx = 5\n",
        ];
        for case in cases {
            assert!(
                matches!(parse(case), Err(ConfigError::Validation(_))),
                "expected validation error for {case:?}"
            );
        }
    }

    #[test]
    fn merge_overlays_in_order() {
        let base = stock_defaults_value().unwrap();
        let file: toml::Value = toml::from_str("[resize]\naspect_ratio = \"4:5\"\nmode = \"fill\"\n").unwrap();
        let cli: toml::Value = toml::from_str("[resize]\nmode = \"stretch\"\n").unwrap();

        let s = resolve_config(base, [file, cli]).unwrap();
        assert_eq!(s.resize.aspect_ratio, AspectRatio::PORTRAIT);
        assert_eq!(s.resize.mode, ResizeMode::Stretch);
    }

    #[test]
    fn merge_toml_replaces_scalars_and_keeps_siblings() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n[b]\nz = 4\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
        assert_eq!(merged["b"]["z"].as_integer(), Some(4));
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("framefit.toml");
        fs::write(&path, "[resize]\naspect_ratio = \"9:16\"\n").unwrap();

        let s = load_config(Some(path.as_path()), None).unwrap();
        assert_eq!(s.resize.aspect_ratio, AspectRatio::STORY);
    }

    #[test]
    fn load_config_without_file_uses_defaults() {
        assert_eq!(load_config(None, None).unwrap(), Settings::default());
    }

    #[test]
    fn load_config_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/framefit.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn to_job_maps_every_section() {
        let s = parse(
            r##"
[resize]
aspect_ratio = "16:9"
mode = "fit"
min_short_edge = 720

[background]
kind = "blur"
blur_radius = 12.0

[watermark]
kind = "text"
text = "@me"
position = "top-left"
opacity = 0.5

[output]
format = "webp"
quality = 80
collision = "skip"
"##,
        )
        .unwrap();
        let job = s.to_job(&MockBackend::new(), Path::new(".")).unwrap();

        assert_eq!(job.aspect_ratio, AspectRatio::LANDSCAPE);
        assert_eq!(job.size_policy, SizePolicy::MinShortEdge(720));
        assert_eq!(job.background, Some(BackgroundSpec::BlurredSource { radius: 12.0 }));
        match &job.watermark {
            Some(WatermarkSpec::Text(t)) => {
                assert_eq!(t.text, "@me");
                assert_eq!(t.placement, Placement::Anchor(Anchor::TopLeft));
                assert_eq!(t.opacity, 0.5);
            }
            other => panic!("expected text watermark, got {other:?}"),
        }
        assert_eq!(job.output.format, OutputFormat::WebP);
        assert_eq!(job.output.quality.value(), 80);
        assert_eq!(job.output.collision, CollisionPolicy::Skip);
    }

    #[test]
    fn explicit_coordinates_override_anchor() {
        let s = parse("[watermark]\nkind = \"text\"\ntext = \"x\"\nx = -4\ny = 12\n").unwrap();
        let job = s.to_job(&MockBackend::new(), Path::new(".")).unwrap();
        assert_eq!(
            job.watermark.unwrap().placement(),
            Placement::At { x: -4, y: 12 }
        );
    }

    #[test]
    fn background_none_pads_black() {
        let s = parse("[background]\nkind = \"none\"\n").unwrap();
        let job = s.to_job(&MockBackend::new(), Path::new(".")).unwrap();
        assert_eq!(job.background, None);
    }

    #[test]
    fn image_watermark_is_loaded_relative_to_base_dir() {
        let logo = Path::new("/cfg/logo.png");
        let backend = MockBackend::with_images(&[(logo, 40, 20)]);
        let s = parse("[watermark]\nkind = \"image\"\nimage = \"logo.png\"\n").unwrap();

        let job = s.to_job(&backend, Path::new("/cfg")).unwrap();
        match job.watermark {
            Some(WatermarkSpec::Image(i)) => {
                assert_eq!(i.image.dimensions(), (40, 20));
                assert_eq!(i.scale, 0.15);
            }
            other => panic!("expected image watermark, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_watermark_image_is_config_error() {
        let s = parse("[watermark]\nkind = \"image\"\nimage = \"missing.png\"\n").unwrap();
        let err = s.to_job(&MockBackend::new(), Path::new("/cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::WatermarkImage(_)));
    }

    #[test]
    fn effective_threads_clamps_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
        assert_eq!(
            effective_threads(&ProcessingConfig {
                max_threads: Some(1)
            }),
            1
        );
        assert_eq!(
            effective_threads(&ProcessingConfig {
                max_threads: Some(cores + 64)
            }),
            cores
        );
    }
}
