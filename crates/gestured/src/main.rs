use anyhow::{Context, Result};
use gesture_core::{FaceDetector, HandLandmarker};
use gesture_hw::{Camera, Window};
use tracing_subscriber::EnvFilter;

mod config;
mod frame_loop;
mod overlay;

use config::Config;
use frame_loop::FrameLoop;

const WINDOW_TITLE: &str = "Hand Gesture Recognition with Face Detection";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(
        camera = config.camera_index,
        model_dir = %config.model_dir.display(),
        max_hands = config.max_hands,
        "gestured starting"
    );

    let hand_path = config.hand_model_path();
    let hands = HandLandmarker::load(&hand_path, config.hand_options())
        .with_context(|| format!("failed to load hand landmark model {hand_path}"))?;
    tracing::info!(path = %hand_path, "hand landmark model loaded");

    let face_path = config.face_model_path();
    let faces = FaceDetector::load(&face_path, config.face_options())
        .with_context(|| format!("failed to load face detection model {face_path}"))?;
    tracing::info!(path = %face_path, "face detection model loaded");

    let camera = Camera::open_index(config.camera_index)
        .with_context(|| format!("failed to open camera {}", config.camera_index))?;
    let window =
        Window::open(WINDOW_TITLE, camera.width, camera.height).context("failed to open window")?;

    let reason = FrameLoop::new(camera, window, hands, faces).run();
    if reason.is_fatal() {
        return Err(anyhow::Error::new(reason).context("frame loop aborted"));
    }

    tracing::info!("gestured shutting down");
    Ok(())
}
