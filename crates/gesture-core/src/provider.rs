//! Capability interfaces for the detection backends feeding the frame loop.

use crate::landmark::{LandmarkError, LandmarkSet};
use crate::types::FaceDetection;
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("model file not found: {0} (place the ONNX model in the model directory)")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("landmark provider contract violated: {0}")]
    Landmarks(#[from] LandmarkError),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Finds hands in an RGB frame.
///
/// An empty result means no hand is visible; that is not an error.
pub trait LandmarkProvider {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<LandmarkSet>, ProviderError>;
}

/// Finds faces in an RGB frame, best detection first.
pub trait FaceProvider {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<FaceDetection>, ProviderError>;
}

impl<T: LandmarkProvider + ?Sized> LandmarkProvider for Box<T> {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<LandmarkSet>, ProviderError> {
        (**self).detect(frame)
    }
}

impl<T: FaceProvider + ?Sized> FaceProvider for Box<T> {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<FaceDetection>, ProviderError> {
        (**self).detect(frame)
    }
}
