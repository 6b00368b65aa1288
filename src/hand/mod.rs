pub mod classifier;
pub mod pointer;
pub mod tracker;

pub use classifier::{HandLandmarks, Landmark, LandmarkClassifier, LANDMARK_COUNT};
pub use pointer::{select_hand, PointerFallback};
pub use tracker::{FeedEvent, HandTracker, LandmarkError, LandmarkFeed, UdpLandmarkFeed};
