use gesture_core::{FaceDetectorOptions, HandLandmarkerOptions};
use std::path::PathBuf;

/// Frame loop configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Camera index; `/dev/video{index}` is opened (default: 0).
    pub camera_index: usize,
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// Hand landmark model file name inside `model_dir`.
    pub hand_model: String,
    /// Face detection model file name inside `model_dir`.
    pub face_model: String,
    /// Maximum number of hands reported per frame.
    pub max_hands: usize,
    /// Hand presence needed to start tracking a hand.
    pub min_detection_confidence: f32,
    /// Hand presence needed to keep tracking a hand across frames.
    pub min_tracking_confidence: f32,
    /// Score needed for a face detection.
    pub face_min_confidence: f32,
}

impl Config {
    /// Load configuration from `GESTURE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            lookup(key).and_then(|v| v.trim().parse().ok())
        }
        let confidence =
            |key: &str| parsed(&lookup, key).map(|v: f32| v.clamp(0.0, 1.0)).unwrap_or(0.5);

        Self {
            camera_index: parsed(&lookup, "GESTURE_CAMERA_INDEX").unwrap_or(0),
            model_dir: lookup("GESTURE_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(gesture_core::default_model_dir),
            hand_model: lookup("GESTURE_HAND_MODEL")
                .unwrap_or_else(|| "hand_landmark.onnx".to_string()),
            face_model: lookup("GESTURE_FACE_MODEL")
                .unwrap_or_else(|| "det_500m.onnx".to_string()),
            max_hands: parsed(&lookup, "GESTURE_MAX_HANDS").unwrap_or(1),
            min_detection_confidence: confidence("GESTURE_MIN_DETECTION_CONFIDENCE"),
            min_tracking_confidence: confidence("GESTURE_MIN_TRACKING_CONFIDENCE"),
            face_min_confidence: confidence("GESTURE_FACE_MIN_CONFIDENCE"),
        }
    }

    /// Path to the hand landmark model.
    pub fn hand_model_path(&self) -> String {
        self.model_dir
            .join(&self.hand_model)
            .to_string_lossy()
            .into_owned()
    }

    /// Path to the face detection model.
    pub fn face_model_path(&self) -> String {
        self.model_dir
            .join(&self.face_model)
            .to_string_lossy()
            .into_owned()
    }

    pub fn hand_options(&self) -> HandLandmarkerOptions {
        HandLandmarkerOptions {
            max_num_hands: self.max_hands,
            min_detection_confidence: self.min_detection_confidence,
            min_tracking_confidence: self.min_tracking_confidence,
        }
    }

    pub fn face_options(&self) -> FaceDetectorOptions {
        FaceDetectorOptions {
            min_detection_confidence: self.face_min_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]);
        assert_eq!(c.camera_index, 0);
        assert_eq!(c.max_hands, 1);
        assert_eq!(c.min_detection_confidence, 0.5);
        assert_eq!(c.min_tracking_confidence, 0.5);
        assert_eq!(c.face_min_confidence, 0.5);
        assert_eq!(c.model_dir, gesture_core::default_model_dir());
        assert!(c.hand_model_path().ends_with("hand_landmark.onnx"));
        assert!(c.face_model_path().ends_with("det_500m.onnx"));
    }

    #[test]
    fn test_overrides() {
        let c = config(&[
            ("GESTURE_CAMERA_INDEX", "2"),
            ("GESTURE_MODEL_DIR", "/opt/models"),
            ("GESTURE_FACE_MODEL", "det_10g.onnx"),
            ("GESTURE_MAX_HANDS", " 2 "),
            ("GESTURE_MIN_TRACKING_CONFIDENCE", "0.7"),
        ]);
        assert_eq!(c.camera_index, 2);
        assert_eq!(c.face_model_path(), "/opt/models/det_10g.onnx");
        assert_eq!(c.hand_options().max_num_hands, 2);
        assert_eq!(c.hand_options().min_tracking_confidence, 0.7);
        assert_eq!(c.hand_options().min_detection_confidence, 0.5);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let c = config(&[
            ("GESTURE_CAMERA_INDEX", "front"),
            ("GESTURE_MIN_DETECTION_CONFIDENCE", "high"),
            ("GESTURE_FACE_MIN_CONFIDENCE", "3.5"),
        ]);
        assert_eq!(c.camera_index, 0);
        assert_eq!(c.min_detection_confidence, 0.5);
        // Out-of-range confidences are clamped.
        assert_eq!(c.face_options().min_detection_confidence, 1.0);
    }
}
