//! Rule-based hand gesture classifier.
//!
//! Each [`GestureLabel`] except `Unknown` has one geometric rule over the
//! landmark y coordinates (smaller y = higher on screen). Rules are checked in
//! [`GestureLabel::ALL`] order and the first one that holds wins. The rules
//! overlap: a fully curled hand satisfies both `Danger` and `Yes`, so `Yes`
//! is only reachable when the thumb is not curled.

use crate::landmark::{
    LandmarkSet, ALL_TIPS, FINGER_TIPS, INDEX_PIP, INDEX_TIP, MIDDLE_TIP, PINKY_TIP, RING_TIP,
    THUMB_IP,
};
use crate::types::{FaceBox, FrameSize, GestureLabel};

/// Maximum horizontal distance between index and thumb tips for `Okay`,
/// in normalized units. The comparison is strict.
pub const OKAY_TIP_DISTANCE: f32 = 0.05;

/// Strategy for turning one hand into a gesture label.
pub trait Classifier {
    fn classify(
        &self,
        landmarks: &LandmarkSet,
        frame: FrameSize,
        face: Option<&FaceBox>,
    ) -> GestureLabel;
}

/// Stateless priority-ordered rule classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

impl Classifier for RuleClassifier {
    fn classify(
        &self,
        landmarks: &LandmarkSet,
        frame: FrameSize,
        face: Option<&FaceBox>,
    ) -> GestureLabel {
        GestureLabel::ALL
            .into_iter()
            .find(|&label| rule_matches(label, landmarks, frame, face))
            .unwrap_or(GestureLabel::Unknown)
    }
}

/// Classify with [`RuleClassifier`].
pub fn classify(landmarks: &LandmarkSet, frame: FrameSize, face: Option<&FaceBox>) -> GestureLabel {
    RuleClassifier.classify(landmarks, frame, face)
}

/// Every label whose rule holds, in priority order. Never contains `Unknown`.
pub fn matching_rules(
    landmarks: &LandmarkSet,
    frame: FrameSize,
    face: Option<&FaceBox>,
) -> Vec<GestureLabel> {
    GestureLabel::ALL
        .into_iter()
        .filter(|&label| rule_matches(label, landmarks, frame, face))
        .collect()
}

/// Evaluate a single rule in isolation. `Unknown` has no rule and never matches.
pub fn rule_matches(
    label: GestureLabel,
    lm: &LandmarkSet,
    frame: FrameSize,
    face: Option<&FaceBox>,
) -> bool {
    match label {
        GestureLabel::ThumbsUp => {
            // Compared in truncated pixel rows.
            let (_, thumb_tip_y) = lm.thumb_tip().to_pixel(frame.width, frame.height);
            let (_, thumb_base_y) = lm.thumb_base().to_pixel(frame.width, frame.height);
            let (_, index_tip_y) = lm.index_tip().to_pixel(frame.width, frame.height);
            thumb_tip_y < thumb_base_y && index_tip_y > thumb_base_y
        }
        GestureLabel::Hi => {
            lm.thumb_tip().y < lm[THUMB_IP].y && lm.index_tip().y < lm[INDEX_PIP].y
        }
        GestureLabel::Danger => ALL_TIPS.iter().all(|&tip| lm.is_curled(tip)),
        GestureLabel::Help => FINGER_TIPS.iter().all(|&tip| lm.is_extended(tip)),
        GestureLabel::Yes => FINGER_TIPS.iter().all(|&tip| lm.is_curled(tip)),
        GestureLabel::Peace => {
            lm.is_extended(INDEX_TIP)
                && lm.is_extended(MIDDLE_TIP)
                && lm.is_curled(RING_TIP)
                && lm.is_curled(PINKY_TIP)
        }
        GestureLabel::Okay => {
            (lm.index_tip().x - lm.thumb_tip().x).abs() < OKAY_TIP_DISTANCE
                && lm.is_extended(MIDDLE_TIP)
                && lm.is_extended(RING_TIP)
                && lm.is_extended(PINKY_TIP)
        }
        GestureLabel::PointingAtFace => face.is_some_and(|face| {
            let (x, y) = lm.index_tip().to_pixel(frame.width, frame.height);
            face.contains(x, y)
        }),
        GestureLabel::Pointing => {
            lm.is_extended(INDEX_TIP)
                && lm.is_curled(MIDDLE_TIP)
                && lm.is_curled(RING_TIP)
                && lm.is_curled(PINKY_TIP)
        }
        GestureLabel::Unknown => false,
    }
}
