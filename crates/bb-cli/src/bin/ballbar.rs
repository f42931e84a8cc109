use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ballbar::{
    ClassifiedRotation, ClassifierConfig, DisplayUnit, FitModel, FrameStages, Image, PassReport,
    PipelineConfig, ProfileAxis, RotationTrace, SegmentClassifier, SegmentPolicy, SignConvention,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(name = "ballbar")]
#[command(about = "Measure ballbar deviations from line-sensor frames")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a single frame image
    #[command(name = "frame")]
    Frame(FrameArgs),
    /// Run every frame in a directory and store the offsets as a trace
    #[command(name = "collect")]
    Collect(CollectArgs),
    /// Split a stored trace into clockwise and counterclockwise passes
    #[command(name = "classify")]
    Classify(ClassifyArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Three,
    One,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AxisArg {
    Rows,
    Cols,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    ExactlyTwo,
    FirstTwo,
}

/// Pipeline settings: JSON file first, then any flags given.
#[derive(Args, Debug, Clone)]
struct PipelineArgs {
    /// JSON file with `pipeline` and `classifier` sections
    #[arg(long)]
    config: Option<PathBuf>,
    /// Sensor extent along the profile axis, in millimeters
    #[arg(long)]
    sensor_mm: Option<f64>,
    #[arg(long)]
    smoothing_radius: Option<usize>,
    #[arg(long, value_enum)]
    model: Option<ModelArg>,
    #[arg(long)]
    max_evaluations: Option<usize>,
    #[arg(long, value_enum)]
    axis: Option<AxisArg>,
    /// Report positive offsets toward pixel index 0
    #[arg(long)]
    flip_sign: bool,
}

#[derive(Args, Debug, Clone)]
struct FrameArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[command(flatten)]
    pipeline: PipelineArgs,
    /// um, mm, in4 or in5
    #[arg(long, default_value = "um")]
    unit: DisplayUnit,
    /// Directory for analysis.json, profile.csv and scope.png
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct CollectArgs {
    /// Directory of PNG frames, processed in file-name order
    #[arg(long, required = true)]
    frames: PathBuf,
    /// Output trace file
    #[arg(long, required = true)]
    trace: PathBuf,
    #[command(flatten)]
    pipeline: PipelineArgs,
    /// Also write the offsets as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct ClassifyArgs {
    #[arg(long, required = true)]
    trace: PathBuf,
    /// JSON file with a `classifier` section
    #[arg(long)]
    config: Option<PathBuf>,
    /// Samples above this are gaps between passes
    #[arg(long)]
    threshold: Option<f64>,
    #[arg(long)]
    min_segment_len: Option<usize>,
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
    /// Radius the deviations are plotted around, in microns
    #[arg(long, default_value_t = 0.0)]
    base_radius_um: f64,
    #[arg(long, default_value = "um")]
    unit: DisplayUnit,
    /// Write passes, summaries and polar samples as JSON
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    pipeline: PipelineConfig,
    classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Serialize)]
struct FrameDto {
    input: String,
    width: usize,
    height: usize,
    pixel_position: f64,
    physical_offset_microns: f64,
    peak_found: bool,
    config: PipelineConfig,
}

#[derive(Debug, Clone, Serialize)]
struct CollectDto {
    frames: usize,
    samples: usize,
    peaks_found: usize,
    skipped: Vec<String>,
    config: PipelineConfig,
}

#[derive(Debug, Clone, Serialize)]
struct ClassifyDto {
    classifier: ClassifierConfig,
    rotation: ClassifiedRotation,
    clockwise: PassReport,
    counterclockwise: PassReport,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Frame(args) => run_frame(args),
        Command::Collect(args) => run_collect(args),
        Command::Classify(args) => run_classify(args),
    }
}

fn run_frame(args: FrameArgs) -> Result<()> {
    let cfg = resolve_pipeline(&args.pipeline)?;
    let img = read_frame(&args.input)?;

    let mut stages = FrameStages::new(&cfg);
    let Some(analysis) = stages
        .run(&img.as_view(), &cfg)
        .with_context(|| format!("analyzing {}", args.input.display()))?
    else {
        bail!("frame {} has zero area.", args.input.display());
    };

    let sample = analysis.sample;
    println!(
        "{}: peak {:.3} px, offset {}{}",
        args.input.display(),
        sample.pixel_position,
        args.unit.format(sample.physical_offset_microns),
        if analysis.peak_found { "" } else { " (no peak)" }
    );

    if let Some(out) = &args.out {
        fs::create_dir_all(out)
            .with_context(|| format!("creating output directory {}", out.display()))?;
        write_csv(&out.join("profile.csv"), &analysis.smoothed)?;
        write_png(&out.join("scope.png"), &analysis.scope()?)?;
        write_json(
            &out.join("analysis.json"),
            &FrameDto {
                input: args.input.display().to_string(),
                width: img.width(),
                height: img.height(),
                pixel_position: sample.pixel_position,
                physical_offset_microns: sample.physical_offset_microns,
                peak_found: analysis.peak_found,
                config: cfg,
            },
        )?;
    }

    Ok(())
}

fn run_collect(args: CollectArgs) -> Result<()> {
    let cfg = resolve_pipeline(&args.pipeline)?;
    let paths = list_frames(&args.frames)?;
    if paths.is_empty() {
        bail!("no PNG frames found in {}.", args.frames.display());
    }

    let mut stages = FrameStages::new(&cfg);
    let mut trace = RotationTrace::default();
    let mut peaks_found = 0;
    let mut skipped = Vec::new();

    for path in &paths {
        let img = read_frame(path)?;
        match stages
            .run(&img.as_view(), &cfg)
            .with_context(|| format!("analyzing {}", path.display()))?
        {
            Some(analysis) => {
                peaks_found += usize::from(analysis.peak_found);
                trace.push(analysis.trace_value());
            }
            None => {
                warn!("skipping zero-area frame {}", path.display());
                skipped.push(path.display().to_string());
            }
        }
    }

    trace
        .save(&args.trace)
        .with_context(|| format!("saving trace {}", args.trace.display()))?;
    if let Some(csv) = &args.csv {
        write_csv(csv, trace.values())?;
    }
    info!(
        "collected {} samples ({} peaks) from {} frames",
        trace.len(),
        peaks_found,
        paths.len()
    );

    let summary = CollectDto {
        frames: paths.len(),
        samples: trace.len(),
        peaks_found,
        skipped,
        config: cfg,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("serializing summary")?
    );
    Ok(())
}

fn run_classify(args: ClassifyArgs) -> Result<()> {
    let classifier_cfg = resolve_classifier(&args)?;
    let trace = RotationTrace::load(&args.trace)
        .with_context(|| format!("loading trace {}", args.trace.display()))?;

    let rotation = SegmentClassifier::new(classifier_cfg)
        .classify(trace.values())
        .with_context(|| format!("classifying {}", args.trace.display()))?;

    let clockwise = PassReport::new(&rotation.clockwise, args.base_radius_um);
    let counterclockwise = PassReport::new(&rotation.counterclockwise, args.base_radius_um);

    for (name, span, pass) in [
        ("cw", rotation.clockwise_span, &clockwise),
        ("ccw", rotation.counterclockwise_span, &counterclockwise),
    ] {
        match pass.summary {
            Some(s) => println!(
                "{name:>3} [{}..={}]: {} samples, min {}, max {}, p-v {}",
                span.start,
                span.end,
                span.len(),
                args.unit.format(s.min),
                args.unit.format(s.max),
                args.unit.format(s.peak_to_valley)
            ),
            None => println!(
                "{name:>3} [{}..={}]: no finite samples",
                span.start, span.end
            ),
        }
    }

    if let Some(out) = &args.out {
        write_json(
            out,
            &ClassifyDto {
                classifier: classifier_cfg,
                rotation,
                clockwise,
                counterclockwise,
            },
        )?;
    }

    Ok(())
}

fn resolve_pipeline(args: &PipelineArgs) -> Result<PipelineConfig> {
    let mut cfg = match &args.config {
        Some(path) => read_config(path)?.pipeline,
        None => PipelineConfig::default(),
    };

    if let Some(v) = args.sensor_mm {
        cfg.sensor_size_mm = v;
    }
    if let Some(v) = args.smoothing_radius {
        cfg.smoothing_radius = v;
    }
    if let Some(v) = args.model {
        cfg.fit_model = match v {
            ModelArg::Three => FitModel::ThreeParameter,
            ModelArg::One => FitModel::OneParameter,
        };
    }
    if let Some(v) = args.max_evaluations {
        cfg.max_evaluations = v;
    }
    if let Some(v) = args.axis {
        cfg.axis = match v {
            AxisArg::Rows => ProfileAxis::Rows,
            AxisArg::Cols => ProfileAxis::Cols,
        };
    }
    if args.flip_sign {
        cfg.sign = SignConvention::TowardStart;
    }

    if cfg.sensor_size_mm == 0.0 {
        warn!("sensor size is 0 mm, every offset will read 0");
    }
    Ok(cfg)
}

fn resolve_classifier(args: &ClassifyArgs) -> Result<ClassifierConfig> {
    let mut cfg = match &args.config {
        Some(path) => read_config(path)?.classifier,
        None => ClassifierConfig::default(),
    };

    if let Some(v) = args.threshold {
        cfg.threshold = v;
    }
    if let Some(v) = args.min_segment_len {
        cfg.min_segment_len = v;
    }
    if let Some(v) = args.policy {
        cfg.policy = match v {
            PolicyArg::ExactlyTwo => SegmentPolicy::ExactlyTwo,
            PolicyArg::FirstTwo => SegmentPolicy::FirstTwo,
        };
    }
    Ok(cfg)
}

/// PNG files directly inside `dir`, sorted by file name.
fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("reading frame directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("listing {}", dir.display()))?
            .path();
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_frame(path: &Path) -> Result<Image<u8>> {
    let luma = image::open(path)
        .with_context(|| format!("opening frame {}", path.display()))?
        .into_luma8();
    let (w, h) = luma.dimensions();
    Image::from_vec(w as usize, h as usize, luma.into_raw())
        .with_context(|| format!("frame {} has inconsistent size", path.display()))
}

fn write_png(path: &Path, img: &Image<u8>) -> Result<()> {
    let w = u32::try_from(img.width()).context("image too wide for PNG")?;
    let h = u32::try_from(img.height()).context("image too tall for PNG")?;
    image::save_buffer(path, img.data(), w, h, image::ColorType::L8)
        .with_context(|| format!("writing {}", path.display()))
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, value)
        .with_context(|| format!("serializing {}", path.display()))?;
    out.flush()
        .with_context(|| format!("writing {}", path.display()))
}

fn read_config(path: &Path) -> Result<ConfigFile> {
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing config {}", path.display()))
}

/// `index,value` rows; non-finite samples are written as `NaN` / `inf`.
fn write_csv(path: &Path, values: &[f64]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "index,value")?;
    for (i, v) in values.iter().enumerate() {
        writeln!(out, "{i},{v}")?;
    }
    out.flush()
        .with_context(|| format!("writing {}", path.display()))
}
