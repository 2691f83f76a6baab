//! gesture-core — Hand gesture classification and detection providers.
//!
//! Holds the 21-point hand model, the priority-ordered rule classifier, the
//! provider traits the frame loop drives, and ONNX Runtime backends for hand
//! landmarks (MediaPipe) and face detection (SCRFD).

pub mod classifier;
pub mod detector;
pub mod hand;
pub mod landmark;
pub mod letterbox;
pub mod provider;
pub mod types;

use std::path::PathBuf;

pub use classifier::{classify, Classifier, RuleClassifier};
pub use detector::{FaceDetector, FaceDetectorOptions};
pub use hand::{HandLandmarker, HandLandmarkerOptions};
pub use landmark::{Landmark, LandmarkError, LandmarkSet, HAND_CONNECTIONS, HAND_LANDMARK_COUNT};
pub use provider::{FaceProvider, LandmarkProvider, ProviderError};
pub use types::{FaceBox, FaceDetection, FrameSize, GestureLabel};

/// Directory searched for ONNX models when none is configured.
pub fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}
