use clap::{Parser, Subcommand};
use framefit::batch::{self, RunOptions};
use framefit::imaging::RustBackend;
use framefit::types::AspectRatio;
use framefit::{config, inputs, naming, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

/// Flags that override `config.toml` values.
///
/// Each flag maps onto one config key; unset flags leave the file value alone.
#[derive(clap::Args, Clone, Debug, Default)]
struct OverrideArgs {
    /// Target aspect ratio, e.g. 1:1, 4:5, 9:16, 16:9, 3:2
    #[arg(short, long)]
    ratio: Option<AspectRatio>,

    /// How the photo is mapped onto the canvas
    #[arg(short, long, value_parser = ["fit", "fill", "stretch"])]
    mode: Option<String>,

    /// Upscale the canvas so its short edge is at least this many pixels
    #[arg(long)]
    min_short_edge: Option<u32>,

    /// Backdrop for fit mode
    #[arg(long, value_parser = ["color", "blur", "none"])]
    background: Option<String>,

    /// Backdrop color for `--background color` (#RRGGBB or #RGB)
    #[arg(long)]
    bg_color: Option<String>,

    /// Gaussian blur radius for `--background blur`
    #[arg(long)]
    blur_radius: Option<f32>,

    /// Stamp this text on every output
    #[arg(long, conflicts_with = "watermark_image")]
    watermark_text: Option<String>,

    /// Stamp this image (PNG with alpha works best) on every output
    #[arg(long)]
    watermark_image: Option<PathBuf>,

    /// Watermark anchor
    #[arg(long, value_parser = ["top-left", "top-right", "bottom-left", "bottom-right", "center"])]
    position: Option<String>,

    /// Watermark opacity, 0.0 to 1.0
    #[arg(long)]
    opacity: Option<f32>,

    /// Text watermark size in pixels
    #[arg(long)]
    font_size: Option<u32>,

    /// Output format
    #[arg(short, long, value_parser = ["jpeg", "jpg", "png", "webp", "tiff", "bmp", "avif"])]
    format: Option<String>,

    /// Lossy encoding quality, 1-100
    #[arg(short, long)]
    quality: Option<u32>,

    /// Output filename pattern; tokens: {stem} {ratio} {mode}
    #[arg(long)]
    pattern: Option<String>,

    /// What to do when an output file already exists
    #[arg(long, value_parser = ["auto-rename", "overwrite", "skip"])]
    collision: Option<String>,

    /// Maximum parallel workers (capped at the number of cores)
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

impl OverrideArgs {
    /// Build the CLI layer of the config merge.
    fn to_toml(&self) -> toml::Value {
        use toml::Value;

        let mut root = toml::Table::new();
        let mut set = |section: &str, key: &str, value: Value| {
            if let Value::Table(t) = root
                .entry(section)
                .or_insert_with(|| Value::Table(toml::Table::new()))
            {
                t.insert(key.to_string(), value);
            }
        };

        if let Some(r) = self.ratio {
            set("resize", "aspect_ratio", Value::String(r.to_string()));
        }
        if let Some(m) = &self.mode {
            set("resize", "mode", Value::String(m.clone()));
        }
        if let Some(n) = self.min_short_edge {
            set("resize", "min_short_edge", Value::Integer(n.into()));
        }
        if let Some(b) = &self.background {
            set("background", "kind", Value::String(b.clone()));
        }
        if let Some(c) = &self.bg_color {
            set("background", "color", Value::String(c.clone()));
        }
        if let Some(r) = self.blur_radius {
            set("background", "blur_radius", Value::Float(r.into()));
        }
        if let Some(text) = &self.watermark_text {
            set("watermark", "kind", Value::String("text".into()));
            set("watermark", "text", Value::String(text.clone()));
        }
        if let Some(path) = &self.watermark_image {
            // Relative to the working directory, not the config file.
            let path = std::path::absolute(path).unwrap_or_else(|_| path.clone());
            set("watermark", "kind", Value::String("image".into()));
            set(
                "watermark",
                "image",
                Value::String(path.to_string_lossy().into_owned()),
            );
        }
        if let Some(p) = &self.position {
            set("watermark", "position", Value::String(p.clone()));
        }
        if let Some(o) = self.opacity {
            set("watermark", "opacity", Value::Float(o.into()));
        }
        if let Some(s) = self.font_size {
            set("watermark", "font_size", Value::Integer(s.into()));
        }
        if let Some(f) = &self.format {
            set("output", "format", Value::String(f.clone()));
        }
        if let Some(q) = self.quality {
            set("output", "quality", Value::Integer(q.into()));
        }
        if let Some(p) = &self.pattern {
            set("output", "pattern", Value::String(p.clone()));
        }
        if let Some(c) = &self.collision {
            set("output", "collision", Value::String(c.clone()));
        }
        if let Some(n) = self.threads {
            let n = i64::try_from(n).unwrap_or(i64::MAX);
            set("processing", "max_threads", Value::Integer(n));
        }

        Value::Table(root)
    }
}

#[derive(clap::Args, Debug)]
struct ResizeArgs {
    /// Image files or directories (directories are searched recursively)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Write a JSON report of every item to this path
    #[arg(long)]
    report: Option<PathBuf>,

    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    /// Inputs to plan output names for (nothing is decoded or written)
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Parser)]
#[command(name = "framefit")]
#[command(about = "Batch-resize photos to fixed aspect ratios")]
#[command(long_about = "\
Batch-resize photos to fixed aspect ratios

Every photo is placed on a canvas of the target ratio, as large as the source
allows without upscaling:

  fit      whole photo visible, padded with a color or a blurred backdrop
  fill     canvas covered, overflow cropped from the center
  stretch  photo scaled to the canvas, proportions not kept

Settings come from stock defaults, then --config FILE, then flags.
Run 'framefit gen-config' to print a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log detail on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'Q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize photos into the output directory
    Resize(ResizeArgs),
    /// Validate config and flags, and show planned output names
    Check(CheckArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Resize(args) => {
            let settings =
                config::load_config(cli.config.as_deref(), Some(args.overrides.to_toml()))?;
            let backend = RustBackend::new();
            let job = settings.to_job(&backend, &config_base_dir(cli.config.as_deref()))?;
            init_thread_pool(&settings.processing);

            let files = inputs::collect_inputs(&args.inputs);
            if files.is_empty() {
                eprintln!("No images found");
                return Ok(ExitCode::FAILURE);
            }

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_batch_event(&event);
                }
            });
            let options = RunOptions {
                events: Some(tx),
                ..RunOptions::default()
            };
            let result =
                batch::run_with_backend(&backend, &files, &job, &args.output, options);
            printer.join().map_err(|_| "progress printer panicked")?;
            let report = result?;

            output::print_report(&report);
            if let Some(path) = &args.report {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(path, json)?;
            }
            if report.has_failures() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Check(args) => {
            let settings =
                config::load_config(cli.config.as_deref(), Some(args.overrides.to_toml()))?;
            let job = settings.to_job(
                &RustBackend::new(),
                &config_base_dir(cli.config.as_deref()),
            )?;
            println!(
                "==> Config is valid: {} {}, {} output",
                job.aspect_ratio, job.mode, job.output.format
            );
            let files = inputs::collect_inputs(&args.inputs);
            for plan in naming::plan_outputs(&files, &args.output, &job)
                .iter()
                .zip(&files)
            {
                match plan {
                    (naming::OutputPlan::Write { path, .. }, input) => {
                        println!("    {} → {}", input.display(), path.display());
                    }
                    (naming::OutputPlan::Skip { existing }, input) => {
                        println!("    {} skipped, {} exists", input.display(), existing.display());
                    }
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Structured logs go to stderr so progress lines on stdout stay clean.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match verbose {
        _ if quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Relative paths inside a config file are resolved against its directory.
fn config_base_dir(config_file: Option<&Path>) -> PathBuf {
    config_file
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
