//! SCRFD face detector via ONNX Runtime.
//!
//! Letterboxes the RGB frame into a 640×640 input, decodes the three
//! anchor-free stride levels, suppresses overlaps, and reports boxes relative
//! to the frame so the frame loop can turn the first one into a pixel box.

use crate::letterbox::Letterbox;
use crate::provider::{FaceProvider, ProviderError};
use crate::types::FaceDetection;
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;

const SCRFD_INPUT_SIZE: usize = 640;
const SCRFD_MEAN: f32 = 127.5;
const SCRFD_STD: f32 = 128.0;
const SCRFD_NMS_THRESHOLD: f32 = 0.4;
const SCRFD_STRIDES: [usize; 3] = [8, 16, 32];
const SCRFD_ANCHORS_PER_CELL: usize = 2;

/// Output tensor indices for one stride: (score_idx, bbox_idx).
type StrideOutputIndices = (usize, usize);

/// Face detector settings.
#[derive(Debug, Clone, Copy)]
pub struct FaceDetectorOptions {
    pub min_detection_confidence: f32,
}

impl Default for FaceDetectorOptions {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
        }
    }
}

/// Box in original-frame pixels, before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PixelBox {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    confidence: f32,
}

/// SCRFD-based face detector.
pub struct FaceDetector {
    session: Session,
    options: FaceDetectorOptions,
    /// Per-stride output indices for strides [8, 16, 32], discovered by name
    /// at load time with a positional fallback.
    stride_indices: [StrideOutputIndices; 3],
}

impl FaceDetector {
    /// Load the SCRFD ONNX model from the given path.
    pub fn load(model_path: &str, options: FaceDetectorOptions) -> Result<Self, ProviderError> {
        if !Path::new(model_path).exists() {
            return Err(ProviderError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> =
            session.outputs().iter().map(|o| o.name().to_string()).collect();

        tracing::info!(
            path = model_path,
            outputs = ?output_names,
            min_confidence = options.min_detection_confidence,
            "loaded SCRFD model"
        );

        // Models exported without keypoints have 6 outputs, with keypoints 9.
        if output_names.len() < 6 {
            return Err(ProviderError::InferenceFailed(format!(
                "SCRFD model requires at least 6 outputs (3 strides × score/bbox), got {}",
                output_names.len()
            )));
        }

        let stride_indices = discover_output_indices(&output_names);
        tracing::debug!(?stride_indices, "SCRFD output tensor mapping");

        Ok(Self {
            session,
            options,
            stride_indices,
        })
    }

    fn run(&mut self, frame: &RgbImage) -> Result<Vec<FaceDetection>, ProviderError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let (input, letterbox) = preprocess(frame);
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut all = Vec::new();
        for (stride_pos, &stride) in SCRFD_STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx) = self.stride_indices[stride_pos];

            let (_, scores) = outputs[score_idx].try_extract_tensor::<f32>().map_err(|e| {
                ProviderError::InferenceFailed(format!("scores stride {stride}: {e}"))
            })?;
            let (_, bboxes) = outputs[bbox_idx].try_extract_tensor::<f32>().map_err(|e| {
                ProviderError::InferenceFailed(format!("bboxes stride {stride}: {e}"))
            })?;

            all.extend(decode_stride(
                scores,
                bboxes,
                stride,
                &letterbox,
                self.options.min_detection_confidence,
            ));
        }

        let kept = nms(all, SCRFD_NMS_THRESHOLD);
        Ok(kept
            .into_iter()
            .map(|b| to_relative(&b, width, height))
            .collect())
    }
}

impl FaceProvider for FaceDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<FaceDetection>, ProviderError> {
        self.run(frame)
    }
}

/// Letterbox an RGB frame into a normalized NCHW tensor.
///
/// Padding uses the mean value so it normalizes to 0.0.
fn preprocess(frame: &RgbImage) -> (Array4<f32>, Letterbox) {
    let size = SCRFD_INPUT_SIZE as u32;
    let letterbox = Letterbox::fit(frame.width(), frame.height(), size, size);
    let resized = letterbox.resize(frame);
    let (off_x, off_y) = letterbox.offset();

    let mut tensor = Array4::<f32>::zeros((1, 3, SCRFD_INPUT_SIZE, SCRFD_INPUT_SIZE));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let tx = (x + off_x) as usize;
        let ty = (y + off_y) as usize;
        if tx >= SCRFD_INPUT_SIZE || ty >= SCRFD_INPUT_SIZE {
            continue;
        }
        for c in 0..3 {
            tensor[[0, c, ty, tx]] = (pixel[c] as f32 - SCRFD_MEAN) / SCRFD_STD;
        }
    }

    (tensor, letterbox)
}

/// Discover output tensor ordering by name.
///
/// Named exports use "score_8", "bbox_16", ...; generic exports fall back to
/// the positional layout [scores 8/16/32, bboxes 8/16/32, (kps 8/16/32)].
fn discover_output_indices(names: &[String]) -> [StrideOutputIndices; 3] {
    let find = |prefix: &str, stride: usize| -> Option<usize> {
        let target = format!("{prefix}_{stride}");
        names.iter().position(|n| n == &target)
    };

    let mut named = [(0, 0); 3];
    for (slot, &stride) in named.iter_mut().zip(SCRFD_STRIDES.iter()) {
        match (find("score", stride), find("bbox", stride)) {
            (Some(score), Some(bbox)) => *slot = (score, bbox),
            _ => {
                tracing::info!(
                    ?names,
                    "SCRFD: output names not recognized, using positional mapping"
                );
                return [(0, 3), (1, 4), (2, 5)];
            }
        }
    }
    named
}

/// Decode detections for a single stride level into original-frame pixels.
fn decode_stride(
    scores: &[f32],
    bboxes: &[f32],
    stride: usize,
    letterbox: &Letterbox,
    threshold: f32,
) -> Vec<PixelBox> {
    let grid = SCRFD_INPUT_SIZE / stride;
    let num_anchors = grid * grid * SCRFD_ANCHORS_PER_CELL;
    let s = stride as f32;

    let mut detections = Vec::new();
    for idx in 0..num_anchors {
        let score = scores.get(idx).copied().unwrap_or(0.0);
        if score < threshold {
            continue;
        }

        let off = idx * 4;
        let Some(d) = bboxes.get(off..off + 4) else {
            continue;
        };

        let cell = idx / SCRFD_ANCHORS_PER_CELL;
        let anchor_x = (cell % grid) as f32 * s;
        let anchor_y = (cell / grid) as f32 * s;

        let (x1, y1) = letterbox.unmap(anchor_x - d[0] * s, anchor_y - d[1] * s);
        let (x2, y2) = letterbox.unmap(anchor_x + d[2] * s, anchor_y + d[3] * s);

        detections.push(PixelBox {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            confidence: score,
        });
    }

    detections
}

/// Clamp a pixel box to the frame and express it relative to the frame size.
fn to_relative(b: &PixelBox, width: u32, height: u32) -> FaceDetection {
    let w = width as f32;
    let h = height as f32;
    let x1 = b.x.clamp(0.0, w);
    let y1 = b.y.clamp(0.0, h);
    let x2 = (b.x + b.width).clamp(0.0, w);
    let y2 = (b.y + b.height).clamp(0.0, h);
    FaceDetection {
        xmin: x1 / w,
        ymin: y1 / h,
        width: (x2 - x1) / w,
        height: (y2 - y1) / h,
        score: b.confidence,
    }
}

/// Non-Maximum Suppression; the result is sorted by confidence, best first.
fn nms(mut detections: Vec<PixelBox>, iou_threshold: f32) -> Vec<PixelBox> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<PixelBox> = Vec::new();
    for det in detections {
        if keep.iter().all(|k| iou(k, &det) <= iou_threshold) {
            keep.push(det);
        }
    }
    keep
}

/// Intersection-over-Union between two boxes.
fn iou(a: &PixelBox, b: &PixelBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width * a.height + b.width * b.height - inter;

    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}
