//! The 21-point hand topology shared by providers, the classifier and
//! the overlay.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of landmarks in one hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_BASE: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

/// Tips of the four non-thumb fingers (index, middle, ring, pinky).
pub const FINGER_TIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// All five tips, thumb first.
pub const ALL_TIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Skeleton edges between landmark indices, used to draw the hand overlay.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    // thumb
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    // index
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    // middle
    (9, 10),
    (10, 11),
    (11, 12),
    // ring
    (13, 14),
    (14, 15),
    (15, 16),
    // pinky
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    // palm
    (5, 9),
    (9, 13),
    (13, 17),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("hand landmark set must have {expected} points, got {actual}")]
    WrongCount { expected: usize, actual: usize },
}

/// A single tracked hand point.
///
/// `x` and `y` are normalized to the frame width/height with the origin at the
/// top-left corner. `z` is relative depth; smaller is closer to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Pixel position in a frame of the given size, truncated toward zero.
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        (
            (self.x * width as f32) as i32,
            (self.y * height as f32) as i32,
        )
    }
}

/// The 21 landmarks of one detected hand.
///
/// Index 0 is the wrist, 1–4 the thumb (base to tip), then four points per
/// finger for index (5–8), middle (9–12), ring (13–16) and pinky (17–20).
/// The length is enforced by the type; the only way in from a variable-length
/// source is [`LandmarkSet::from_slice`] / `TryFrom<Vec<Landmark>>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct LandmarkSet([Landmark; HAND_LANDMARK_COUNT]);

impl LandmarkSet {
    pub fn new(points: [Landmark; HAND_LANDMARK_COUNT]) -> Self {
        Self(points)
    }

    pub fn from_slice(points: &[Landmark]) -> Result<Self, LandmarkError> {
        let points: [Landmark; HAND_LANDMARK_COUNT] =
            points.try_into().map_err(|_| LandmarkError::WrongCount {
                expected: HAND_LANDMARK_COUNT,
                actual: points.len(),
            })?;
        Ok(Self(points))
    }

    pub fn points(&self) -> &[Landmark; HAND_LANDMARK_COUNT] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.0.iter()
    }

    pub fn thumb_tip(&self) -> &Landmark {
        &self.0[THUMB_TIP]
    }

    pub fn thumb_base(&self) -> &Landmark {
        &self.0[THUMB_BASE]
    }

    pub fn index_tip(&self) -> &Landmark {
        &self.0[INDEX_TIP]
    }

    /// A finger is extended when its tip sits higher on screen than the
    /// joint two indices below it.
    ///
    /// `tip` must be one of [`ALL_TIPS`]; for the thumb the reference joint
    /// is the base (index 2).
    pub fn is_extended(&self, tip: usize) -> bool {
        self.0[tip].y < self.0[tip - 2].y
    }

    /// Opposite of [`is_extended`](Self::is_extended); equal heights count as neither.
    pub fn is_curled(&self, tip: usize) -> bool {
        self.0[tip].y > self.0[tip - 2].y
    }

    /// Axis-aligned bounds `(min_x, min_y, max_x, max_y)` in normalized units.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        self.0.iter().fold(
            (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
            |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        )
    }
}

impl std::ops::Index<usize> for LandmarkSet {
    type Output = Landmark;

    fn index(&self, index: usize) -> &Landmark {
        &self.0[index]
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(points: Vec<Landmark>) -> Result<Self, Self::Error> {
        Self::from_slice(&points)
    }
}

impl From<LandmarkSet> for Vec<Landmark> {
    fn from(set: LandmarkSet) -> Self {
        set.0.to_vec()
    }
}
