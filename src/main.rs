use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ledwatch::controls::StdinControls;
use ledwatch::{Override, Pipeline, PipelineSettings, WatchConfig};
use ledwatch_core::actuator::{probe_link, RecordingLink, UdpLink};
use ledwatch_core::control::NoControls;
use ledwatch_core::{
    ActuatorController, ActuatorLink, ControlInput, ControlSession, DetectionStabilizer,
};
use ledwatch_cv::source::{RecordedDetector, ReplayScript, SimulatedFeed};
use ledwatch_cv::{Detector, FrameSource};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive an LED from stabilized camera detections", long_about = None)]
struct Args {
    #[arg(short, long, value_name = "PATH", help = "JSON config file")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "NAME", help = "Detection preset: hat or lavender_disease")]
    preset: Option<String>,

    #[arg(
        long,
        value_name = "NAME",
        help = "Controller preset: default, strict or conservative"
    )]
    controller_preset: Option<String>,

    #[arg(
        long = "set",
        value_name = "KEY=VALUE",
        help = "Override a config value using a dot-separated path"
    )]
    overrides: Vec<Override>,

    #[arg(long, help = "Log actuator commands instead of sending them")]
    dry_run: bool,

    #[arg(long, help = "Read operator keys (q l t d + - s) from stdin")]
    stdin_controls: bool,

    #[arg(short, long, help = "Debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Watch the live camera stream (needs the `camera` feature)
    Live,
    /// Replay a JSON-lines script of recorded detections
    Replay { script: PathBuf },
    /// Run against a seeded random feed
    Simulate {
        #[arg(long)]
        frames: Option<u64>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Switch the actuator on and off once
    TestLink,
    /// Print the effective configuration
    ShowConfig,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("ledwatch failed: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match &args.config {
        Some(path) => WatchConfig::load(path)?,
        None => WatchConfig::default(),
    }
    .with_presets(args.preset.as_deref(), args.controller_preset.as_deref())?
    .with_overrides(&args.overrides)?;
    config.validate()?;

    match &args.command {
        Mode::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Mode::TestLink => {
            let mut link = open_link(&config, args.dry_run)?;
            if !probe_link(&mut link, config.link.test_pause()) {
                bail!("actuator link test failed");
            }
            Ok(())
        }
        Mode::Replay { script } => {
            let script = ReplayScript::load(script)?;
            let (source, scripted) = script.into_parts(Instant::now());
            let controls: Box<dyn ControlInput> = if args.stdin_controls {
                Box::new(StdinControls::spawn())
            } else {
                Box::new(scripted)
            };
            watch(&config, &args, source, RecordedDetector, controls)
        }
        Mode::Simulate { frames, seed } => {
            let mut simulation = config.simulation.clone();
            if let Some(frames) = frames {
                simulation.frames = *frames;
            }
            if let Some(seed) = seed {
                simulation.seed = *seed;
            }
            let feed = SimulatedFeed::new(simulation, config.detection.target_class, Instant::now());
            watch(&config, &args, feed, RecordedDetector, operator_controls(&args))
        }
        Mode::Live => live(&config, &args),
    }
}

#[cfg(feature = "camera")]
fn live(config: &WatchConfig, args: &Args) -> Result<()> {
    use ledwatch_cv::detection::YoloDetector;
    use ledwatch_cv::source::StreamCapture;

    let detector = YoloDetector::new(config.detection.clone()).context("Failed to load model")?;
    let stream = StreamCapture::open(config.stream.clone()).with_context(|| {
        format!(
            "Cannot connect to camera; check that the board is reachable at {} and streaming",
            config.stream.url
        )
    })?;
    watch(config, args, stream, detector, operator_controls(args))
}

#[cfg(not(feature = "camera"))]
fn live(_config: &WatchConfig, _args: &Args) -> Result<()> {
    bail!("built without camera support; rebuild with `--features camera`")
}

fn operator_controls(args: &Args) -> Box<dyn ControlInput> {
    if args.stdin_controls {
        Box::new(StdinControls::spawn())
    } else {
        Box::new(NoControls)
    }
}

fn open_link(config: &WatchConfig, dry_run: bool) -> Result<Box<dyn ActuatorLink>> {
    if dry_run {
        return Ok(Box::new(RecordingLink::new()));
    }
    let link = UdpLink::connect(config.link.clone()).with_context(|| {
        format!(
            "Failed to set up actuator link to {}:{}",
            config.link.host, config.link.port
        )
    })?;
    Ok(Box::new(link))
}

fn watch<S, D>(
    config: &WatchConfig,
    args: &Args,
    source: S,
    detector: D,
    controls: Box<dyn ControlInput>,
) -> Result<()>
where
    S: FrameSource,
    D: Detector<S::Frame>,
{
    let link = open_link(config, args.dry_run)?;
    let mut session = ControlSession::new(ActuatorController::new(&config.controller), link);
    if config.link.test_on_startup && !session.verify_link(config.link.test_pause()) {
        warn!("continuing without actuator control");
    }

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = stop.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })
    .context("Failed to install signal handler")?;

    let pipeline = Pipeline::new(
        source,
        detector,
        session,
        controls,
        DetectionStabilizer::from_config(&config.controller),
        PipelineSettings::from_config(config),
    );
    let summary = pipeline.run(|| stop.load(Ordering::Relaxed))?;

    info!("finished");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
