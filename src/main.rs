use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use posture_sentinel::alert::{AlertSink, BellSink};
use posture_sentinel::camera::Camera;
use posture_sentinel::feed::CameraFeed;
use posture_sentinel::inference::FaceLandmarker;
use posture_sentinel::overlay::Overlay;
use posture_sentinel::{Config, Flow, PostureMonitor, Session};

#[derive(Parser, Debug)]
#[command(name = "posture-sentinel", about = "Beeps when your head pitches away from a calibrated pose")]
struct Args {
    /// TOML config file; missing keys fall back to defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera device index
    #[arg(long)]
    camera: Option<i32>,

    /// Face landmark ONNX model
    #[arg(long)]
    model: Option<String>,

    /// Write the effective config to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(camera) = args.camera {
        config.camera_id = camera;
    }
    if let Some(model) = args.model {
        config.model_path = model;
    }
    config.validate()?;

    if let Some(path) = &args.write_config {
        config.save(path)?;
        info!("wrote config to {}", path.display());
        return Ok(());
    }

    let camera = Camera::new(config.camera_id)?;
    let landmarker = FaceLandmarker::new(&config)?;
    let overlay = Overlay::new(&config.window_title)?;
    let sink = open_sink();

    let monitor = PostureMonitor::new(config.sensitivity(), config.beep_interval());
    let mut session = Session::new(CameraFeed::new(camera, landmarker), &*sink, monitor, &config.tone());

    println!("--- POSTURE ALARM ENABLED ---");
    println!("1. Look straight and press 'c' to calibrate.");
    println!("2. If you look UP or DOWN, it will beep at most once every {} ms.", config.beep_interval_ms);
    println!("3. Press 'q' to quit.");

    let outcome = run_loop(&mut session, &overlay);

    // Release devices before surfacing any loop error.
    let mut feed = session.into_source();
    let released = feed.release();
    let closed = overlay.close();

    outcome?;
    released?;
    closed?;
    Ok(())
}

fn run_loop<A: AlertSink>(session: &mut Session<CameraFeed, A>, overlay: &Overlay) -> Result<()> {
    while session.source().is_open() {
        let report = session.step(Instant::now());

        if let Some(image) = session.source().image() {
            overlay.render(image, session.last_frame(), &report)?;
        }

        if let Some(command) = overlay.poll_command()? {
            if session.handle(command) == Flow::Stop {
                break;
            }
        }
    }
    Ok(())
}

#[cfg(feature = "audio")]
fn open_sink() -> Box<dyn AlertSink> {
    match posture_sentinel::alert::SpeakerSink::open() {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            warn!("{:#}, falling back to terminal bell", e);
            Box::new(BellSink)
        }
    }
}

#[cfg(not(feature = "audio"))]
fn open_sink() -> Box<dyn AlertSink> {
    warn!("built without the audio feature, alerts use the terminal bell");
    Box::new(BellSink)
}
