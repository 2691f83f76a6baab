use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel dimensions of the frame a landmark set was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A face found by a face provider, relative to the frame size (0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub xmin: f32,
    pub ymin: f32,
    pub width: f32,
    pub height: f32,
    pub score: f32,
}

/// Axis-aligned face rectangle in integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct FaceBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl FaceBox {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Convert a relative detection into pixels.
    ///
    /// The origin and the extent are truncated separately, so `x2` is
    /// `trunc(xmin * W) + trunc(width * W)` rather than `trunc((xmin + width) * W)`.
    pub fn from_relative(det: &FaceDetection, frame: FrameSize) -> Self {
        let w = frame.width as f32;
        let h = frame.height as f32;
        let x1 = (det.xmin * w) as i32;
        let y1 = (det.ymin * h) as i32;
        Self {
            x1,
            y1,
            x2: x1 + (det.width * w) as i32,
            y2: y1 + (det.height * h) as i32,
        }
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.x1 <= x && x <= self.x2 && self.y1 <= y && y <= self.y2
    }
}

impl From<[i32; 4]> for FaceBox {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<FaceBox> for [i32; 4] {
    fn from(b: FaceBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Recognized gesture, in classifier priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureLabel {
    ThumbsUp,
    Hi,
    Danger,
    Help,
    Yes,
    Peace,
    Okay,
    PointingAtFace,
    Pointing,
    Unknown,
}

impl GestureLabel {
    /// Every label, highest priority first.
    pub const ALL: [GestureLabel; 10] = [
        GestureLabel::ThumbsUp,
        GestureLabel::Hi,
        GestureLabel::Danger,
        GestureLabel::Help,
        GestureLabel::Yes,
        GestureLabel::Peace,
        GestureLabel::Okay,
        GestureLabel::PointingAtFace,
        GestureLabel::Pointing,
        GestureLabel::Unknown,
    ];

    /// 1-based evaluation rank; lower wins.
    pub fn priority(self) -> usize {
        self as usize + 1
    }

    /// Text drawn on the frame.
    pub fn text(self) -> &'static str {
        match self {
            GestureLabel::ThumbsUp => "Gesture: Thumbs up",
            GestureLabel::Hi => "Gesture: Hi",
            GestureLabel::Danger => "Gesture: Danger",
            GestureLabel::Help => "Gesture: Help",
            GestureLabel::Yes => "Gesture: Yes",
            GestureLabel::Peace => "Gesture: Peace (V-sign)",
            GestureLabel::Okay => "Gesture: Okay",
            GestureLabel::PointingAtFace => "Gesture: I",
            GestureLabel::Pointing => "Gesture: Pointing",
            GestureLabel::Unknown => "Unknown Gesture",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_box_from_relative_truncates_each_part() {
        let det = FaceDetection { xmin: 0.25, ymin: 0.1, width: 0.3, height: 0.5, score: 0.9 };
        let b = FaceBox::from_relative(&det, FrameSize::new(641, 481));
        // 0.25*641 = 160.25 -> 160, 0.3*641 = 192.3 -> 192
        assert_eq!(b.x1, 160);
        assert_eq!(b.x2, 352);
        // 0.1*481 = 48.1 -> 48, 0.5*481 = 240.5 -> 240
        assert_eq!(b.y1, 48);
        assert_eq!(b.y2, 288);
    }

    #[test]
    fn test_face_box_contains_inclusive() {
        let b = FaceBox::new(10, 20, 30, 40);
        assert!(b.contains(10, 20));
        assert!(b.contains(30, 40));
        assert!(b.contains(20, 30));
        assert!(!b.contains(9, 30));
        assert!(!b.contains(20, 41));
    }

    #[test]
    fn test_priority_matches_all_order() {
        for (i, label) in GestureLabel::ALL.iter().enumerate() {
            assert_eq!(label.priority(), i + 1);
        }
        assert_eq!(GestureLabel::Unknown.priority(), 10);
    }

    #[test]
    fn test_display_text() {
        assert_eq!(GestureLabel::ThumbsUp.to_string(), "Gesture: Thumbs up");
        assert_eq!(GestureLabel::PointingAtFace.to_string(), "Gesture: I");
        assert_eq!(GestureLabel::Unknown.to_string(), "Unknown Gesture");
    }
}
