//! Example: one simulated ballbar circuit, end to end.
//!
//! Renders the frames of a clockwise and a counterclockwise pass with parked
//! dwells in between, runs every frame through the measurement pipeline,
//! splits the resulting trace into its two passes and prints a roundness
//! summary per direction.
//!
//! Run from the workspace root:
//!   cargo run -p ballbar --example synthetic_rotation -- --help
//!   cargo run -p ballbar --example synthetic_rotation -- --trace /tmp/rot.bbtr

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use ballbar::synth::SyntheticRig;
use ballbar::{
    ClassifiedRotation, DisplayUnit, FrameAnalysisPipeline, PassReport, PipelineConfig,
    RotationTrace, SegmentClassifier, SharedConfig,
};
use clap::Parser;
use serde::Serialize;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Simulate and analyze one ballbar rotation")]
struct Args {
    /// Samples per directional pass
    #[arg(long, default_value_t = 180)]
    samples: usize,

    /// Parked frames before, between and after the passes
    #[arg(long, default_value_t = 12)]
    dwell: usize,

    /// Simulated arm eccentricity, in microns
    #[arg(long, default_value_t = 12.0)]
    eccentricity_um: f64,

    /// Simulated arm ovality, in microns
    #[arg(long, default_value_t = 4.0)]
    ovality_um: f64,

    /// Boxcar half-width applied to every profile
    #[arg(long, default_value_t = 2)]
    smoothing_radius: usize,

    /// Radius the deviations are plotted around, in microns
    #[arg(long, default_value_t = 100.0)]
    base_radius_um: f64,

    /// Display unit: um, mm, in4 or in5
    #[arg(long, default_value = "um")]
    unit: DisplayUnit,

    /// Also store the raw trace at this path
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Write the classified passes as JSON
    #[arg(long)]
    out: Option<PathBuf>,
}

// ── JSON DTOs ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RotationDto {
    samples_per_pass: usize,
    clockwise: PassReport,
    counterclockwise: PassReport,
    rotation: ClassifiedRotation,
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rig = SyntheticRig {
        eccentricity_um: args.eccentricity_um,
        ovality_um: args.ovality_um,
        ..SyntheticRig::default()
    };
    let frames = rig
        .rotation_frames(args.samples, args.dwell)
        .context("rendering rig frames")?;
    println!(
        "rendered {} frames of {}x{} ({:.1} um/row)",
        frames.len(),
        rig.width,
        rig.height,
        rig.microns_per_row()
    );

    let pipeline = FrameAnalysisPipeline::new(SharedConfig::new(PipelineConfig {
        sensor_size_mm: rig.sensor_size_mm,
        smoothing_radius: args.smoothing_radius,
        ..PipelineConfig::default()
    }));

    let t0 = Instant::now();
    let mut trace = RotationTrace::default();
    for frame in &frames {
        if let Some(analysis) = pipeline.submit_frame(&frame.as_view())? {
            trace.push(analysis.trace_value());
        }
    }
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;
    println!(
        "pipeline: {} samples in {elapsed_ms:.1} ms ({:.3} ms/frame)",
        trace.len(),
        elapsed_ms / frames.len().max(1) as f64
    );

    if let Some(path) = &args.trace {
        trace
            .save(path)
            .with_context(|| format!("saving trace {}", path.display()))?;
        println!("trace written to {}", path.display());
    }

    let rotation = SegmentClassifier::default()
        .classify(trace.values())
        .context("classifying rotation")?;

    let clockwise = PassReport::new(&rotation.clockwise, args.base_radius_um);
    let counterclockwise = PassReport::new(&rotation.counterclockwise, args.base_radius_um);
    for (name, pass) in [("cw", &clockwise), ("ccw", &counterclockwise)] {
        match pass.summary {
            Some(s) => println!(
                "  {name:>3}: min {}  max {}  p-v {}",
                args.unit.format(s.min),
                args.unit.format(s.max),
                args.unit.format(s.peak_to_valley)
            ),
            None => println!("  {name:>3}: empty"),
        }
    }

    if let Some(path) = &args.out {
        let dto = RotationDto {
            samples_per_pass: args.samples,
            clockwise,
            counterclockwise,
            rotation,
        };
        let json = serde_json::to_string_pretty(&dto).context("serializing results")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("results written to {}", path.display());
    }

    Ok(())
}
