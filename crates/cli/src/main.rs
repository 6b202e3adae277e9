use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;

use gesture_vision_core::detection::domain::face_detector::FaceDetector;
use gesture_vision_core::detection::infrastructure::cascade_face_detector::CascadeFaceDetector;
use gesture_vision_core::interaction::drag_fsm::DragEvent;
use gesture_vision_core::pipeline::config::DetectionConfig;
use gesture_vision_core::pipeline::events::{channel_sink, DetectionEvent};
use gesture_vision_core::pipeline::orchestrator::{DetectionOrchestrator, FrameDetectionResult};
use gesture_vision_core::pipeline::pipeline_logger::LogPipelineLogger;
use gesture_vision_core::shared::constants::IMAGE_EXTENSIONS;
use gesture_vision_core::shared::frame::Frame;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Hand, face and human detection with gesture and drag recognition over
/// still frames.
#[derive(Parser)]
#[command(name = "gesture-vision")]
struct Cli {
    /// Image file, or a directory of frames processed in name order.
    input: PathBuf,

    /// JSON detection config; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Face cascade model (JSON). Face detection is disabled without one.
    #[arg(long)]
    cascade: Option<PathBuf>,

    /// Simulated capture rate used to timestamp frames.
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Flip frames horizontally, as a webcam preview would.
    #[arg(long)]
    mirror: bool,

    /// Detect faces. Passing any detector flag enables only the flagged ones.
    #[arg(long)]
    faces: bool,

    /// Detect hands.
    #[arg(long)]
    hands: bool,

    /// Classify gestures and run the drag interaction.
    #[arg(long)]
    gestures: bool,

    /// Detect human silhouettes.
    #[arg(long)]
    humans: bool,

    /// Classify facial expressions (implies face detection).
    #[arg(long)]
    expressions: bool,

    /// Print one JSON object per frame instead of a summary line.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn any_detector_flag(&self) -> bool {
        self.faces || self.hands || self.gestures || self.humans || self.expressions
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let frames = collect_frames(&cli.input)?;
    if frames.is_empty() {
        return Err(format!("No images found in {}", cli.input.display()).into());
    }
    log::info!("Processing {} frame(s) from {}", frames.len(), cli.input.display());

    let mut orchestrator = DetectionOrchestrator::new(build_face_detector(&cli, &config))
        .with_logger(Box::new(LogPipelineLogger::default()));
    let (sink, events) = channel_sink(EVENT_CHANNEL_CAPACITY);
    orchestrator.subscribe(Box::new(sink));

    for (index, path) in frames.iter().enumerate() {
        let frame = load_frame(path, index, cli.fps, cli.mirror)?;
        let result = orchestrator.process(&frame, &config);

        if cli.json {
            println!("{}", serde_json::to_string(&result)?);
        } else {
            println!("{}", summary_line(path, &result));
        }
        for event in events.try_iter() {
            log::debug!("Event on frame {index}: {event:?}");
            if !cli.json {
                println!("  {}", describe_event(&event));
            }
        }
    }

    orchestrator.finish();
    Ok(())
}

fn build_config(cli: &Cli) -> Result<DetectionConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => DetectionConfig::from_json_file(path)?,
        None => DetectionConfig::default(),
    };
    if cli.any_detector_flag() {
        config.faces = cli.faces;
        config.hands = cli.hands;
        config.gestures = cli.gestures;
        config.humans = cli.humans;
        config.expressions = cli.expressions;
    }
    Ok(config)
}

fn build_face_detector(cli: &Cli, config: &DetectionConfig) -> Box<dyn FaceDetector> {
    match &cli.cascade {
        Some(path) => Box::new(CascadeFaceDetector::from_file(path, config.face_scan)),
        None => {
            if config.runs_face_detection() {
                log::warn!("No --cascade given, face detection disabled");
            }
            Box::new(CascadeFaceDetector::disabled())
        }
    }
}

fn collect_frames(input: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(input)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    paths.sort();
    Ok(paths)
}

fn load_frame(
    path: &Path,
    index: usize,
    fps: f64,
    mirror: bool,
) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)
        .map_err(|e| format!("Cannot read {}: {e}", path.display()))?
        .to_rgb8();
    let timestamp = Duration::from_secs_f64(index as f64 / fps);
    let frame = Frame::from_rgb_image(img, index, timestamp)?;
    Ok(if mirror { frame.mirrored() } else { frame })
}

fn summary_line(path: &Path, result: &FrameDetectionResult) -> String {
    let counts = result.hand_counts();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut line = format!(
        "[{:>5}] {name} t={:.3}s faces={} hands={} (L{} R{}) humans={}",
        result.frame_index,
        result.timestamp.as_secs_f64(),
        result.faces.len(),
        result.hands.len(),
        counts.left,
        counts.right,
        result.humans.len(),
    );
    if let Some(g) = &result.gesture {
        line.push_str(&format!(" gesture={}/{}", g.gesture.label(), g.side.label()));
    }
    if !result.expressions.is_empty() {
        let labels: Vec<&str> = result
            .expressions
            .iter()
            .map(|e| e.expression.label())
            .collect();
        line.push_str(&format!(" expressions={}", labels.join(",")));
    }
    line
}

fn describe_event(event: &DetectionEvent) -> String {
    match event {
        DetectionEvent::Gesture(g) => format!(
            "gesture {} ({} hand) at ({:.0}, {:.0})",
            g.gesture.label(),
            g.side.label(),
            g.position.0,
            g.position.1
        ),
        DetectionEvent::Drag(DragEvent::Started { at, position }) => format!(
            "drag started at {:.2}s, ({:.0}, {:.0})",
            at.as_secs_f64(),
            position.0,
            position.1
        ),
        DetectionEvent::Drag(DragEvent::Stopped { at, held_for }) => format!(
            "drag stopped at {:.2}s after {:.2}s",
            at.as_secs_f64(),
            held_for.as_secs_f64()
        ),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if cli.input.is_file() && !is_image(&cli.input) {
        return Err(format!("Unsupported image type: {}", cli.input.display()).into());
    }
    if !(cli.fps.is_finite() && cli.fps > 0.0) {
        return Err(format!("FPS must be positive, got {}", cli.fps).into());
    }
    if let Some(path) = &cli.cascade {
        if !path.is_file() {
            return Err(format!("Cascade file not found: {}", path.display()).into());
        }
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
