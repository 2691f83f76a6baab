//! Hand landmark provider backed by the MediaPipe hand-landmark ONNX model.
//!
//! The model takes a 224×224 RGB crop (NHWC, values in [0, 1]) and returns 21
//! screen-space landmarks plus a hand-presence score. There is no separate
//! palm detector: while no hand is tracked the whole frame is letterboxed into
//! the model and the presence score must reach the detection confidence. Once
//! a hand is found, the next frame is cropped to a square region around it and
//! only has to reach the tracking confidence. Losing the hand resets to
//! full-frame detection.

use crate::landmark::{Landmark, LandmarkSet, HAND_LANDMARK_COUNT};
use crate::letterbox::Letterbox;
use crate::provider::{LandmarkProvider, ProviderError};
use image::imageops;
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;

const HAND_INPUT_SIZE: usize = 224;
/// Values per landmark in the screen-landmark output (x, y, z).
const HAND_COORDS: usize = 3;
/// Side of the tracking region relative to the larger side of the previous
/// hand's bounding box.
const TRACKING_REGION_SCALE: f32 = 2.0;

/// Hand landmarker settings.
#[derive(Debug, Clone, Copy)]
pub struct HandLandmarkerOptions {
    pub max_num_hands: usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for HandLandmarkerOptions {
    fn default() -> Self {
        Self {
            max_num_hands: 1,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

/// Crop of the frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// MediaPipe hand-landmark model with single-hand region tracking.
pub struct HandLandmarker {
    session: Session,
    options: HandLandmarkerOptions,
    /// Region derived from the previous frame's hand, if one was found.
    tracked: Option<Region>,
}

impl HandLandmarker {
    /// Load the hand-landmark ONNX model from the given path.
    pub fn load(model_path: &str, options: HandLandmarkerOptions) -> Result<Self, ProviderError> {
        if !Path::new(model_path).exists() {
            return Err(ProviderError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let num_outputs = session.outputs().len();
        tracing::info!(
            path = model_path,
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            max_hands = options.max_num_hands,
            min_detection = options.min_detection_confidence,
            min_tracking = options.min_tracking_confidence,
            "loaded hand landmark model"
        );

        if num_outputs < 2 {
            return Err(ProviderError::InferenceFailed(format!(
                "hand landmark model requires landmark and presence outputs, got {num_outputs}"
            )));
        }

        Ok(Self {
            session,
            options,
            tracked: None,
        })
    }

    fn run(&mut self, frame: &RgbImage) -> Result<Vec<LandmarkSet>, ProviderError> {
        let (width, height) = frame.dimensions();
        if self.options.max_num_hands == 0 || width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let (region, threshold) = match self.tracked {
            Some(region) => (region, self.options.min_tracking_confidence),
            None => (Region::full(width, height), self.options.min_detection_confidence),
        };

        let (input, letterbox) = preprocess(frame, region);
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw_landmarks) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ProviderError::InferenceFailed(format!("landmarks: {e}")))?;
        let (_, presence) = outputs[1]
            .try_extract_tensor::<f32>()
            .map_err(|e| ProviderError::InferenceFailed(format!("presence: {e}")))?;

        let presence = presence.first().copied().unwrap_or(0.0);
        if presence < threshold {
            if self.tracked.take().is_some() {
                tracing::debug!(presence, "hand lost, back to full-frame detection");
            }
            return Ok(Vec::new());
        }

        let hand = decode_landmarks(raw_landmarks, &letterbox, region, width, height)?;
        self.tracked = tracking_region(&hand, width, height);
        tracing::trace!(presence, tracked = ?self.tracked, "hand found");

        Ok(vec![hand])
    }
}

impl LandmarkProvider for HandLandmarker {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<LandmarkSet>, ProviderError> {
        self.run(frame)
    }
}

/// Crop `region` out of the frame and letterbox it into an NHWC tensor in [0, 1].
fn preprocess(frame: &RgbImage, region: Region) -> (Array4<f32>, Letterbox) {
    let crop = imageops::crop_imm(frame, region.x, region.y, region.width, region.height).to_image();
    let size = HAND_INPUT_SIZE as u32;
    let letterbox = Letterbox::fit(crop.width(), crop.height(), size, size);
    let resized = letterbox.resize(&crop);
    let (off_x, off_y) = letterbox.offset();

    let mut tensor = Array4::<f32>::zeros((1, HAND_INPUT_SIZE, HAND_INPUT_SIZE, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let tx = (x + off_x) as usize;
        let ty = (y + off_y) as usize;
        if tx >= HAND_INPUT_SIZE || ty >= HAND_INPUT_SIZE {
            continue;
        }
        for c in 0..3 {
            tensor[[0, ty, tx, c]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, letterbox)
}

/// Map raw model output (input-pixel units) back to frame-normalized landmarks.
///
/// A model that does not produce exactly 21 points breaks the provider
/// contract and is reported as [`ProviderError::Landmarks`].
fn decode_landmarks(
    raw: &[f32],
    letterbox: &Letterbox,
    region: Region,
    width: u32,
    height: u32,
) -> Result<LandmarkSet, ProviderError> {
    let points: Vec<Landmark> = raw
        .chunks_exact(HAND_COORDS)
        .map(|c| {
            let (cx, cy) = letterbox.unmap(c[0], c[1]);
            Landmark {
                x: (region.x as f32 + cx) / width as f32,
                y: (region.y as f32 + cy) / height as f32,
                // Depth shares the x scale, normalized by frame width.
                z: c[2] / letterbox.scale / width as f32,
            }
        })
        .collect();

    Ok(LandmarkSet::try_from(points)?)
}

/// Square region around a hand, scaled up and clamped to the frame.
///
/// Returns `None` when the hand collapses to nothing or lies outside the frame.
fn tracking_region(hand: &LandmarkSet, width: u32, height: u32) -> Option<Region> {
    let (x0, y0, x1, y1) = hand.bounds();
    let (w, h) = (width as f32, height as f32);

    let cx = (x0 + x1) / 2.0 * w;
    let cy = (y0 + y1) / 2.0 * h;
    let side = ((x1 - x0) * w).max((y1 - y0) * h) * TRACKING_REGION_SCALE;
    if !side.is_finite() || side < 1.0 {
        return None;
    }

    let left = (cx - side / 2.0).clamp(0.0, w);
    let top = (cy - side / 2.0).clamp(0.0, h);
    let right = (cx + side / 2.0).clamp(0.0, w);
    let bottom = (cy + side / 2.0).clamp(0.0, h);

    let region = Region {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    };
    (region.width > 0 && region.height > 0).then_some(region)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_grid(value: impl Fn(usize) -> (f32, f32, f32)) -> Vec<f32> {
        (0..HAND_LANDMARK_COUNT)
            .flat_map(|i| {
                let (x, y, z) = value(i);
                [x, y, z]
            })
            .collect()
    }

    #[test]
    fn test_decode_landmarks_full_frame() {
        // 448x224 frame letterboxed into 224: scale 0.5, pad_y 56.
        let letterbox = Letterbox::fit(448, 224, 224, 224);
        let raw = raw_grid(|_| (112.0, 112.0, 10.0));
        let hand = decode_landmarks(&raw, &letterbox, Region::full(448, 224), 448, 224).unwrap();
        let p = hand[0];
        assert!((p.x - 0.5).abs() < 1e-6, "x = {}", p.x);
        assert!((p.y - 0.5).abs() < 1e-6, "y = {}", p.y);
        assert!((p.z - 10.0 / 0.5 / 448.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_landmarks_in_region() {
        // 112x112 region at (100, 50) in a 400x300 frame: scale 2.0, no padding.
        let region = Region { x: 100, y: 50, width: 112, height: 112 };
        let letterbox = Letterbox::fit(112, 112, 224, 224);
        let raw = raw_grid(|_| (0.0, 224.0, 0.0));
        let hand = decode_landmarks(&raw, &letterbox, region, 400, 300).unwrap();
        assert!((hand[5].x - 100.0 / 400.0).abs() < 1e-6);
        assert!((hand[5].y - 162.0 / 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_landmarks_rejects_wrong_count() {
        let letterbox = Letterbox::fit(224, 224, 224, 224);
        let raw = vec![0.0f32; 20 * HAND_COORDS];
        let err = decode_landmarks(&raw, &letterbox, Region::full(224, 224), 224, 224).unwrap_err();
        assert!(matches!(err, ProviderError::Landmarks(_)), "got {err}");
    }

    #[test]
    fn test_tracking_region_square_and_clamped() {
        // Hand spans x 0.375..0.625, y 0.5..0.5625 of an 800x800 frame.
        let mut points = [Landmark::new(0.5, 0.53125, 0.0); HAND_LANDMARK_COUNT];
        points[0] = Landmark::new(0.375, 0.5, 0.0);
        points[1] = Landmark::new(0.625, 0.5625, 0.0);
        let hand = LandmarkSet::new(points);

        let region = tracking_region(&hand, 800, 800).unwrap();
        // Box is 200x50 px, side = 400 around (400, 425).
        assert_eq!(region, Region { x: 200, y: 225, width: 400, height: 400 });

        // Near the corner the region is cut at the frame edge.
        let mut points = [Landmark::new(0.0625, 0.125, 0.0); HAND_LANDMARK_COUNT];
        points[0] = Landmark::new(0.0, 0.0, 0.0);
        points[1] = Landmark::new(0.125, 0.25, 0.0);
        let region = tracking_region(&LandmarkSet::new(points), 800, 400).unwrap();
        assert_eq!((region.x, region.y), (0, 0));
        assert_eq!(region.width, 150);
        assert_eq!(region.height, 150);
    }

    #[test]
    fn test_tracking_region_degenerate_hand() {
        let hand = LandmarkSet::new([Landmark::new(0.5, 0.5, 0.0); HAND_LANDMARK_COUNT]);
        assert_eq!(tracking_region(&hand, 640, 480), None);

        let mut points = [Landmark::new(2.1, 2.1, 0.0); HAND_LANDMARK_COUNT];
        points[0] = Landmark::new(2.0, 2.0, 0.0);
        let outside = LandmarkSet::new(points);
        assert_eq!(tracking_region(&outside, 640, 480), None);
    }

    #[test]
    fn test_preprocess_nhwc_layout() {
        let frame = RgbImage::from_pixel(100, 100, image::Rgb([255, 0, 0]));
        let (tensor, lb) = preprocess(&frame, Region { x: 0, y: 0, width: 50, height: 100 });
        assert_eq!(tensor.shape(), &[1, HAND_INPUT_SIZE, HAND_INPUT_SIZE, 3]);
        assert_eq!(lb.pad_x, 56.0);
        // Left padding column is zero.
        assert_eq!(tensor[[0, 112, 0, 0]], 0.0);
        // Content is red.
        assert!((tensor[[0, 112, 112, 0]] - 1.0).abs() < 0.01);
        assert!(tensor[[0, 112, 112, 1]].abs() < 0.01);
    }
}
