//! # hand_gesture
//!
//! Static hand-gesture recognition from the 21-point hand landmark layout
//! produced by MediaPipe-style hand trackers, plus a hold/cooldown
//! debouncer that turns a noisy per-frame label stream into discrete
//! triggers.
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use hand_gesture::{classify, Debouncer, HoldConfig, Point};
//!
//! let points = vec![Point::new(0.5, 0.5); 21];
//! let label = classify(&points);
//!
//! let mut debouncer = Debouncer::new(HoldConfig::default());
//! let fired = debouncer.update(label, Duration::ZERO);
//! assert!(!fired);
//! ```
//!
//! ## Gesture table
//!
//! | Label | Extended fingers |
//! |---|---|
//! | `open_palm` | all five |
//! | `fist` | none |
//! | `three_fingers` | any three |
//! | `pointing_index` | index only (thumb ignored) |
//! | `victory` | index + middle (thumb ignored) |
//! | `thumbs_up` | thumb only |

pub mod landmarks;
pub mod classify;
pub mod debounce;

pub use landmarks::{Point, LandmarkSet, LandmarkError, LANDMARK_COUNT, HAND_CONNECTIONS};
pub use classify::{classify, classify_set, finger_states, FingerStates, Gesture, ParseGestureError};
pub use debounce::{Debouncer, HoldConfig};
