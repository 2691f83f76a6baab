//! Single-threaded capture → detect → classify → annotate → display loop.

use crate::overlay;
use gesture_core::{
    Classifier, FaceBox, FaceProvider, FrameSize, GestureLabel, LandmarkProvider, ProviderError,
    RuleClassifier,
};
use gesture_hw::{CameraError, DisplayError, DisplaySink, FrameSource};
use thiserror::Error;

/// Lowercase only; `Q` is ignored.
pub const QUIT_KEY: char = 'q';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Why the loop stopped.
#[derive(Error, Debug)]
pub enum StopReason {
    #[error("quit key pressed")]
    QuitKey,
    #[error("display window closed")]
    WindowClosed,
    #[error("failed to grab frame: {0}")]
    CaptureFailed(#[from] CameraError),
    #[error("detection failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("display failed: {0}")]
    Display(#[from] DisplayError),
}

impl StopReason {
    /// `false` for a user-requested stop.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StopReason::QuitKey | StopReason::WindowClosed)
    }
}

/// What one iteration produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub sequence: u32,
    pub frame: FrameSize,
    pub face: Option<FaceBox>,
    /// One label per hand, in provider order.
    pub gestures: Vec<GestureLabel>,
}

/// Owns the camera, the window and both providers for the lifetime of a run.
///
/// Dropping the loop releases the camera and closes the window, whichever
/// way the run ended.
pub struct FrameLoop<S, D, H, F> {
    source: S,
    display: D,
    hands: H,
    faces: F,
    classifier: RuleClassifier,
    state: LoopState,
    stop_reason: Option<StopReason>,
    last_report: Option<FrameReport>,
    last_label: Option<GestureLabel>,
    frames: u64,
}

impl<S, D, H, F> FrameLoop<S, D, H, F>
where
    S: FrameSource,
    D: DisplaySink,
    H: LandmarkProvider,
    F: FaceProvider,
{
    pub fn new(source: S, display: D, hands: H, faces: F) -> Self {
        Self {
            source,
            display,
            hands,
            faces,
            classifier: RuleClassifier,
            state: LoopState::Running,
            stop_reason: None,
            last_report: None,
            last_label: None,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    /// Report of the last frame that reached the display.
    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    /// Frames shown so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one iteration. Once stopped, further calls do nothing.
    pub fn step(&mut self) -> LoopState {
        if self.state == LoopState::Stopped {
            return LoopState::Stopped;
        }
        if let Some(reason) = self.advance() {
            self.finish(reason);
        }
        self.state
    }

    /// Iterate until stopped, then release the camera and the window.
    pub fn run(mut self) -> StopReason {
        tracing::info!("frame loop started");
        while self.step() == LoopState::Running {}

        // `step` only leaves `Running` through `finish`.
        let reason = self.stop_reason.take().unwrap_or(StopReason::QuitKey);
        drop(self);
        reason
    }

    fn advance(&mut self) -> Option<StopReason> {
        match self.iterate() {
            Ok(stop) => stop,
            Err(reason) => Some(reason),
        }
    }

    fn iterate(&mut self) -> Result<Option<StopReason>, StopReason> {
        let frame = self.source.read_frame()?;

        let mut image = match frame.to_rgb() {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!(sequence = frame.sequence, error = %err, "skipping unreadable frame");
                self.display.pump_events();
                return Ok(self.poll_controls());
            }
        };
        let size = FrameSize::new(image.width(), image.height());

        // Both providers see the un-annotated frame.
        let face = self
            .faces
            .detect(&image)?
            .first()
            .map(|det| FaceBox::from_relative(det, size));
        let hands = self.hands.detect(&image)?;

        // With several hands every label lands at the same spot; the last one drawn stays visible.
        let mut gestures = Vec::with_capacity(hands.len());
        for hand in &hands {
            overlay::draw_hand(&mut image, hand);
            let label = self.classifier.classify(hand, size, face.as_ref());
            overlay::draw_label(&mut image, label);
            gestures.push(label);
        }

        self.display.show(&image)?;
        self.frames += 1;

        tracing::debug!(
            sequence = frame.sequence,
            hands = gestures.len(),
            face = face.is_some(),
            gestures = ?gestures,
            "frame processed"
        );
        let first = gestures.first().copied();
        if let Some(label) = first.filter(|&label| self.last_label != Some(label)) {
            tracing::info!(gesture = %label, "gesture changed");
        }
        self.last_label = first;

        self.last_report = Some(FrameReport {
            sequence: frame.sequence,
            frame: size,
            face,
            gestures,
        });

        Ok(self.poll_controls())
    }

    /// Once per frame, shown or skipped.
    fn poll_controls(&mut self) -> Option<StopReason> {
        if !self.display.is_open() {
            return Some(StopReason::WindowClosed);
        }
        if self.display.poll_key() == Some(QUIT_KEY) {
            return Some(StopReason::QuitKey);
        }
        None
    }

    fn finish(&mut self, reason: StopReason) {
        if reason.is_fatal() {
            tracing::error!(error = %reason, frames = self.frames, "frame loop stopped");
        } else {
            tracing::info!(reason = %reason, frames = self.frames, "frame loop stopped");
        }
        self.state = LoopState::Stopped;
        self.stop_reason = Some(reason);
    }
}
