//! Turns one frame of hand keypoints into a gesture and pointer position.
//!
//! Keypoint indices follow the usual 21-point hand model: 0 is the wrist,
//! 4/8/12/16/20 are the thumb, index, middle, ring and pinky tips.

use crate::signal::{Gesture, HandSignal};

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const FINGERTIPS: [usize; 5] = [4, 8, 12, 16, 20];

/// Pinch is entered below this thumb/index distance.
pub const PINCH_ENTER: f32 = 0.08;
/// Pinch is held until the distance rises above this.
pub const PINCH_EXIT: f32 = 0.15;
/// Mean wrist-to-tip distance below which the hand counts as a fist.
pub const FIST_MAX: f32 = 0.16;
/// Mean wrist-to-tip distance above which the hand counts as open.
pub const OPEN_MIN: f32 = 0.28;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Distance in the image plane; depth is ignored.
    pub fn distance(&self, other: &Landmark) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

pub type HandLandmarks = [Landmark; LANDMARK_COUNT];

pub fn avg_tip_distance(hand: &HandLandmarks) -> f32 {
    let wrist = &hand[WRIST];
    let sum: f32 = FINGERTIPS.iter().map(|&i| hand[i].distance(wrist)).sum();
    sum / FINGERTIPS.len() as f32
}

pub fn pinch_distance(hand: &HandLandmarks) -> f32 {
    hand[THUMB_TIP].distance(&hand[INDEX_TIP])
}

#[derive(Debug, Clone, Default)]
pub struct LandmarkClassifier {
    pinching: bool,
}

impl LandmarkClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pinching(&self) -> bool {
        self.pinching
    }

    pub fn reset(&mut self) {
        self.pinching = false;
    }

    pub fn classify(&mut self, frame: Option<&HandLandmarks>) -> HandSignal {
        let Some(hand) = frame else {
            self.reset();
            return HandSignal::absent();
        };

        let spread = avg_tip_distance(hand);
        let pinch = pinch_distance(hand);

        if self.pinching {
            if pinch > PINCH_EXIT {
                self.pinching = false;
            }
        } else if pinch < PINCH_ENTER {
            self.pinching = true;
        }

        // A fist wins over pinch and open in the same frame.
        let gesture = if spread < FIST_MAX {
            Gesture::Hover
        } else if self.pinching {
            Gesture::Pinch
        } else if spread > OPEN_MIN {
            Gesture::Open
        } else {
            Gesture::Hover
        };

        let tip = &hand[INDEX_TIP];
        HandSignal {
            x: 1.0 - tip.x,
            y: tip.y,
            gesture,
            present: true,
        }
    }
}
